//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests to a handler
//! function. Connections are persistent (keep-alive) and requests on one
//! connection are answered in order.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Largest request (head plus body) buffered before answering `413` (1 MiB).
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

const INITIAL_BUF_SIZE: usize = 4096;

/// The HTTP server.
///
/// # Examples
///
/// ```rust,no_run
/// use coinproxy::server::Server;
/// use coinproxy::http::{Request, Response};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(|_req: Request| async { Response::json("{}") }).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections forever, dispatching each request to `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        self.run_until(handler, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but stops accepting new connections once
    /// `shutdown` resolves. Connections already accepted finish on their own
    /// tasks.
    pub async fn run_until<H, F, S>(self, handler: H, shutdown: S) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
        S: Future<Output = ()>,
    {
        let handler = Arc::new(handler);
        info!(address = %self.local_addr, "coinproxy listening");

        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                () = &mut shutdown => {
                    info!(address = %self.local_addr, "shutdown requested, no longer accepting");
                    return Ok(());
                }
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, handler).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Splits one complete request off the front of `buf`.
///
/// `Ok(None)` means more bytes are needed.
fn next_request(buf: &mut BytesMut) -> Result<Option<Request>, RequestError> {
    if buf.is_empty() {
        return Ok(None);
    }

    let (mut request, body_offset) = match Request::parse(buf) {
        Ok(pair) => pair,
        Err(RequestError::Incomplete) => return Ok(None),
        Err(e) => return Err(e),
    };

    let total = body_offset
        .checked_add(request.content_length()?)
        .filter(|&total| total <= MAX_REQUEST_SIZE)
        .ok_or(RequestError::TooLarge {
            max_bytes: MAX_REQUEST_SIZE,
        })?;
    if buf.len() < total {
        return Ok(None);
    }

    let frame = buf.split_to(total).freeze();
    request.set_body(frame.slice(body_offset..));
    Ok(Some(request))
}

fn rejection(error: &RequestError) -> Response {
    let status = match error {
        RequestError::TooLarge { .. } => StatusCode::PayloadTooLarge,
        _ => StatusCode::BadRequest,
    };
    Response::new(status)
        .body(format!("Bad Request: {error}"))
        .keep_alive(false)
}

/// Handles a single TCP connection over its lifetime.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        match next_request(&mut buf) {
            Ok(Some(request)) => {
                let keep_alive = request.is_keep_alive();

                debug!(
                    peer = %peer_addr,
                    method = %request.method(),
                    path = %request.path(),
                    "dispatching request"
                );

                let response = handler(request).await.keep_alive(keep_alive);
                stream.write_all(&response.into_bytes()).await?;
                stream.flush().await?;

                if !keep_alive {
                    debug!(peer = %peer_addr, "Connection: close, shutting down");
                    break;
                }
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "rejecting malformed request");
                stream.write_all(&rejection(&e).into_bytes()).await?;
                break;
            }
        }

        if buf.len() > MAX_REQUEST_SIZE {
            warn!(peer = %peer_addr, "request head too large, sending 413");
            let e = RequestError::TooLarge {
                max_bytes: MAX_REQUEST_SIZE,
            };
            stream.write_all(&rejection(&e).into_bytes()).await?;
            break;
        }

        if stream.read_buf(&mut buf).await? == 0 {
            debug!(peer = %peer_addr, "connection closed by peer");
            break;
        }
    }

    Ok(())
}
