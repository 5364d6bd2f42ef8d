//! View Scope
//!
//! Ties in-flight backend calls to the lifetime of the view that issued
//! them. Once the scope is cancelled, pending futures are dropped and their
//! results never reach the security state.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct ViewScope {
    closed: Arc<watch::Sender<bool>>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            closed: Arc::new(closed),
        }
    }

    pub fn cancel(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the scope is cancelled
    pub async fn cancelled(&self) {
        let mut closed = self.closed.subscribe();
        // The sender lives in `self`, so this only returns once cancelled
        let _ = closed.wait_for(|closed| *closed).await;
    }

    /// Run `fut` unless the scope closes first
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = fut => Some(output),
        }
    }
}
