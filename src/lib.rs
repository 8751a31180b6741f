//! # coinproxy
//!
//! An authenticated proxy in front of blockchain-data (Covalent, BscScan)
//! and price-data (LiveCoinWatch) APIs. Client applications call the proxy;
//! the proxy holds the API keys.
//!
//! The top-coins listing is cached for five minutes and, when a refresh
//! fails, the last good listing is served instead of an error. Every other
//! endpoint forwards exactly one upstream call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coinproxy::{app, config::Config, server::Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = app::state_from_config(&config)?;
//!     let server = Server::bind(&config.bind_addr).await?;
//!     app::serve(server, state, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

// ── HTTP plumbing ────────────────────────────────────────────────────────────
pub mod context;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

// ── Proxy ────────────────────────────────────────────────────────────────────
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod providers;
pub mod upstream;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use error::ProxyError;
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
