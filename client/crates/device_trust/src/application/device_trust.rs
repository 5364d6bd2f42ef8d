//! Device Trust Orchestrator
//!
//! Owns the fingerprint for the session, the published security state and
//! the behavior tracker. Gating operations live in sibling modules.
//!
//! Backend failures never lock a user out on their own: unless the device
//! is already known to be blocked, a failed call resolves permissively
//! (see [`FailurePolicy`]).

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::SecurityCheck;
use super::behavior::{BehaviorTracker, TrackerState, TrackingGuard};
use super::config::{FailurePolicy, TrustConfig};
use super::events::EventTarget;
use super::fingerprint::FingerprintBuilder;
use super::messages;
use super::scope::ViewScope;
use crate::domain::entities::{BlockState, BlockStatus, DeviceFingerprint, DeviceSecurityState};
use crate::domain::host::BrowserHost;
use crate::domain::repository::LockoutPolicy;
use crate::domain::services::format_time_remaining;
use crate::domain::value_objects::{BehaviorScore, FingerprintHash};
use crate::error::{TrustError, TrustResult};

struct ActiveTracker {
    tracker: BehaviorTracker,
    guard: TrackingGuard,
}

pub struct DeviceTrust<P, H>
where
    P: LockoutPolicy + Sync,
    H: BrowserHost,
{
    pub(crate) policy: Arc<P>,
    pub(crate) host: Arc<H>,
    pub(crate) config: Arc<TrustConfig>,
    state: watch::Sender<DeviceSecurityState>,
    fingerprint: OnceLock<DeviceFingerprint>,
    tracker: Mutex<Option<ActiveTracker>>,
    /// Scope of the view currently using the orchestrator
    scope: Mutex<ViewScope>,
}

impl<P, H> DeviceTrust<P, H>
where
    P: LockoutPolicy + Sync,
    H: BrowserHost,
{
    pub fn new(policy: Arc<P>, host: Arc<H>, config: Arc<TrustConfig>) -> Self {
        let (state, _) = watch::channel(DeviceSecurityState::loading(
            config.initial_attempts_remaining,
        ));
        Self {
            policy,
            host,
            config,
            state,
            fingerprint: OnceLock::new(),
            tracker: Mutex::new(None),
            scope: Mutex::new(ViewScope::new()),
        }
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    /// Snapshot of the current security state
    pub fn state(&self) -> DeviceSecurityState {
        self.state.borrow().clone()
    }

    /// Receiver notified whenever the security state changes
    pub fn subscribe(&self) -> watch::Receiver<DeviceSecurityState> {
        self.state.subscribe()
    }

    /// Fingerprint computed by [`initialize`](Self::initialize)
    pub fn fingerprint(&self) -> Option<&DeviceFingerprint> {
        self.fingerprint.get()
    }

    /// Scope backend calls currently run in
    pub fn scope(&self) -> ViewScope {
        self.scope_slot().clone()
    }

    /// Fingerprint the device and load its block status
    ///
    /// Never fails: on any error the state becomes ready and unblocked.
    /// The fingerprint is computed once; later calls reuse it.
    pub async fn initialize(&self) {
        let fingerprint = match self.fingerprint.get() {
            Some(existing) => existing,
            None => {
                let builder = FingerprintBuilder::new(self.host.clone(), self.config.clone());
                match builder.build().await {
                    // A concurrent initialize may have stored one first
                    Ok(built) => self.fingerprint.get_or_init(|| built),
                    Err(e) => {
                        e.log("initialize");
                        tracing::warn!(
                            "Device security initialization failed, continuing unblocked"
                        );
                        self.state.send_if_modified(set_loaded);
                        return;
                    }
                }
            }
        };

        let hash = fingerprint.hash.clone();
        let automation_detected = fingerprint.automation_detected();
        self.state.send_if_modified(|s| {
            s.fingerprint_hash = Some(hash.clone());
            s.is_automation_detected = automation_detected;
            true
        });

        match self.scoped(self.policy.check_device_blocked(&hash)).await {
            Ok(status) => {
                let block = status.to_block_state();
                tracing::info!(
                    fingerprint = %hash.short(),
                    blocked = block.is_blocked(),
                    permanent = block.is_permanent(),
                    "Device block status loaded"
                );
                self.state.send_if_modified(|s| {
                    s.block = block;
                    s.is_loading = false;
                    true
                });
            }
            Err(e @ TrustError::Cancelled) => {
                // The status stays unknown until the next view refreshes it
                e.log("initialize");
                self.state.send_if_modified(set_loaded);
            }
            Err(e) => {
                e.log("initialize");
                tracing::warn!(
                    fingerprint = %hash.short(),
                    "Block status unavailable, continuing unblocked"
                );
                self.state.send_if_modified(set_loaded);
            }
        }
    }

    /// Re-query the block status, keeping the current state on failure
    pub async fn refresh_status(&self) {
        let Some(hash) = self.fingerprint_hash() else {
            return;
        };

        match self.scoped(self.policy.check_device_blocked(&hash)).await {
            Ok(status) => {
                self.apply_block(&status);
            }
            Err(e) => e.log("refresh_status"),
        }
    }

    // ========================================================================
    // Behavior tracking
    // ========================================================================

    /// Attach a behavior tracker to `target`
    ///
    /// No-op while a tracker is running; after a stop a fresh sample begins.
    pub fn start_behavior_tracking(&self, target: &EventTarget) {
        let mut slot = self.tracker_slot();
        if slot
            .as_ref()
            .is_some_and(|active| active.tracker.state() == TrackerState::Running)
        {
            return;
        }

        let tracker = BehaviorTracker::new(self.config.behavior.clone());
        let guard = tracker.start(target);
        *slot = Some(ActiveTracker { tracker, guard });
    }

    /// Detach the tracker; its score stays readable
    pub fn stop_behavior_tracking(&self) {
        if let Some(active) = self.tracker_slot().as_mut() {
            active.guard.stop();
        }
    }

    /// Score of the current tracker, neutral when none was started
    pub fn behavior_score(&self) -> BehaviorScore {
        self.tracker_slot()
            .as_ref()
            .map(|active| active.tracker.score())
            .unwrap_or(BehaviorScore::NEUTRAL)
    }

    /// Tear down the current view: stop tracking and discard its in-flight
    /// results
    ///
    /// Calls made afterwards run in a fresh scope.
    pub fn close(&self) {
        self.stop_behavior_tracking();
        let closed = std::mem::take(&mut *self.scope_slot());
        closed.cancel();
    }

    // ========================================================================
    // Shared helpers for the gating operations
    // ========================================================================

    pub(crate) fn fingerprint_hash(&self) -> Option<FingerprintHash> {
        self.state.borrow().fingerprint_hash.clone()
    }

    /// Run a backend call inside the view scope
    pub(crate) async fn scoped<T>(
        &self,
        call: impl Future<Output = TrustResult<T>>,
    ) -> TrustResult<T> {
        let scope = self.scope();
        scope.run(call).await.unwrap_or(Err(TrustError::Cancelled))
    }

    /// Publish a backend block status, notifying only on change
    pub(crate) fn apply_block(&self, status: &BlockStatus) -> BlockState {
        let block = status.to_block_state();
        self.state.send_if_modified(|s| {
            let changed = s.block != block || s.is_loading;
            s.block = block.clone();
            s.is_loading = false;
            changed
        });
        block
    }

    pub(crate) fn set_attempts_remaining(&self, attempts_remaining: u32) {
        self.state.send_if_modified(|s| {
            let changed = s.attempts_remaining != attempts_remaining;
            s.attempts_remaining = attempts_remaining;
            changed
        });
    }

    /// Message for a block known locally, if it still applies
    pub(crate) fn known_block_message(
        &self,
        block: &BlockState,
        now: DateTime<Utc>,
    ) -> Option<String> {
        match block {
            BlockState::Allowed => None,
            BlockState::Permanent { .. } => Some(messages::DEVICE_PERMANENTLY_BLOCKED.to_string()),
            BlockState::Temporary { expires_at, .. } => Some(messages::temporarily_blocked(
                &format_time_remaining(*expires_at, now),
            )),
        }
    }

    /// Resolve a failed backend call
    pub(crate) fn resolve_backend_failure(
        &self,
        operation: &'static str,
        error: TrustError,
    ) -> SecurityCheck {
        error.log(operation);

        let now = Utc::now();
        let block = self.state.borrow().block.clone();
        if block.is_active_at(now) {
            if let Some(message) = self.known_block_message(&block, now) {
                return SecurityCheck::deny(message);
            }
        }

        if matches!(error, TrustError::Cancelled) {
            return SecurityCheck::allow();
        }

        if !error.is_fail_open() {
            // Not an outage: the request could not even be built
            tracing::error!(
                operation,
                kind = %error.kind(),
                "Device trust check failed locally"
            );
        }

        match self.config.failure_policy {
            FailurePolicy::FailOpen => {
                tracing::warn!(operation, "Lockout backend failed, allowing (fail-open)");
                SecurityCheck::allow()
            }
            FailurePolicy::FailClosed => {
                tracing::warn!(operation, "Lockout backend failed, refusing (fail-closed)");
                SecurityCheck::deny(messages::SECURITY_CHECK_UNAVAILABLE)
            }
        }
    }

    fn tracker_slot(&self) -> MutexGuard<'_, Option<ActiveTracker>> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scope_slot(&self) -> MutexGuard<'_, ViewScope> {
        self.scope.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn set_loaded(state: &mut DeviceSecurityState) -> bool {
    let changed = state.is_loading;
    state.is_loading = false;
    changed
}
