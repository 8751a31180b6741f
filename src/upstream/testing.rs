//! Scripted [`Upstream`] for handler tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{Upstream, UpstreamError, UpstreamRequest};

/// Replays queued outcomes in order and records every request it receives.
/// Panics if called more times than outcomes were queued.
#[derive(Default)]
pub(crate) struct ScriptedUpstream {
    outcomes: Mutex<VecDeque<Result<Bytes, UpstreamError>>>,
    seen: Mutex<Vec<UpstreamRequest>>,
}

impl ScriptedUpstream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, body: &'static str) -> &Self {
        self.push(Ok(Bytes::from_static(body.as_bytes())))
    }

    pub(crate) fn reject(&self, status: u16) -> &Self {
        self.push(Err(UpstreamError::Rejected {
            status,
            body: Bytes::from_static(b"upstream says no"),
        }))
    }

    pub(crate) fn unreachable(&self) -> &Self {
        self.push(Err(UpstreamError::Unreachable("connection refused".into())))
    }

    fn push(&self, outcome: Result<Bytes, UpstreamError>) -> &Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<UpstreamRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn execute(&self, request: UpstreamRequest) -> Result<Bytes, UpstreamError> {
        self.seen.lock().unwrap().push(request);
        // Suspend like a real network call so concurrent callers interleave.
        tokio::task::yield_now().await;
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected upstream call")
    }
}
