//! Block Countdown
//!
//! Ticks once per configured period while a temporary block with an expiry
//! is in force, publishing `M:SS`. When the block lapses it re-queries the
//! backend. Aborted when dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::device_trust::DeviceTrust;
use crate::domain::entities::BlockState;
use crate::domain::host::BrowserHost;
use crate::domain::repository::LockoutPolicy;
use crate::domain::services::format_countdown;

pub struct BlockCountdown {
    display: watch::Receiver<Option<String>>,
    task: JoinHandle<()>,
}

impl BlockCountdown {
    pub fn spawn<P, H>(trust: Arc<DeviceTrust<P, H>>) -> Self
    where
        P: LockoutPolicy + Sync + 'static,
        H: BrowserHost + 'static,
    {
        let (tx, display) = watch::channel(None);
        let tick = trust.config().countdown_tick;
        let task = tokio::spawn(run(trust, tick, tx));
        Self { display, task }
    }

    /// Current `M:SS` text, `None` when no countdown applies
    pub fn current(&self) -> Option<String> {
        self.display.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.display.clone()
    }
}

impl Drop for BlockCountdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn countdown_target(block: &BlockState) -> Option<chrono::DateTime<Utc>> {
    match block {
        BlockState::Temporary {
            expires_at: Some(at),
            ..
        } => Some(*at),
        _ => None,
    }
}

async fn run<P, H>(
    trust: Arc<DeviceTrust<P, H>>,
    tick: Duration,
    display: watch::Sender<Option<String>>,
) where
    P: LockoutPolicy + Sync,
    H: BrowserHost,
{
    let mut state = trust.subscribe();

    loop {
        let target = countdown_target(&state.borrow_and_update().block);

        let Some(expires_at) = target else {
            display.send_replace(None);
            if state.changed().await.is_err() {
                return;
            }
            continue;
        };

        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let remaining = expires_at - Utc::now();
                    if remaining > chrono::Duration::zero() {
                        display.send_replace(Some(format_countdown(remaining)));
                        continue;
                    }

                    display.send_replace(None);
                    tracing::debug!("Temporary block lapsed, refreshing status");
                    trust.refresh_status().await;
                    // An unchanged reply would otherwise re-trigger the refresh
                    if !state.has_changed().unwrap_or(false) && state.changed().await.is_err() {
                        return;
                    }
                    break;
                }
                changed = state.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}
