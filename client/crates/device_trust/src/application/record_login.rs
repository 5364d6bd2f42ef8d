//! Record Login Attempt Use Case

use chrono::Utc;

use super::SecurityCheck;
use super::device_trust::DeviceTrust;
use super::messages;
use crate::domain::entities::{BlockState, LoginAttempt};
use crate::domain::host::BrowserHost;
use crate::domain::repository::LockoutPolicy;
use crate::domain::services::format_time_remaining;

/// Input DTO for a login attempt
#[derive(Debug, Clone)]
pub struct LoginAttemptInput {
    pub email: String,
    pub success: bool,
    pub failure_reason: Option<String>,
}

impl LoginAttemptInput {
    pub fn succeeded(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            success: true,
            failure_reason: None,
        }
    }

    pub fn failed(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            success: false,
            failure_reason: Some(reason.into()),
        }
    }
}

impl<P, H> DeviceTrust<P, H>
where
    P: LockoutPolicy + Sync,
    H: BrowserHost,
{
    /// Report a login attempt and apply the backend's verdict
    ///
    /// Always reported, even while blocked; the backend decides whether
    /// the block still holds.
    pub async fn record_login_attempt(&self, input: LoginAttemptInput) -> SecurityCheck {
        let Some(hash) = self.fingerprint_hash() else {
            return SecurityCheck::deny(messages::DEVICE_UNIDENTIFIED);
        };

        let attempt = LoginAttempt {
            fingerprint_hash: hash.clone(),
            email: input.email,
            ip_address: None,
            user_agent: self.host.navigator().user_agent,
            success: input.success,
            failure_reason: input.failure_reason,
            behavior_score: self.behavior_score(),
        };

        let outcome = match self.scoped(self.policy.record_login_attempt(&attempt)).await {
            Ok(outcome) => outcome,
            Err(e) => return self.resolve_backend_failure("record_login_attempt", e),
        };

        if outcome.status.blocked {
            let block = self.apply_block(&outcome.status);
            tracing::info!(
                fingerprint = %hash.short(),
                permanent = block.is_permanent(),
                "Device blocked after login attempt"
            );
            let message = match &block {
                BlockState::Permanent { .. } => {
                    messages::DEVICE_PERMANENTLY_BLOCKED_AFTER_FAILURES.to_string()
                }
                other => messages::temporarily_blocked(&format_time_remaining(
                    other.expires_at(),
                    Utc::now(),
                )),
            };
            return SecurityCheck::deny(message);
        }

        if let Some(remaining) = outcome.attempts_remaining {
            self.set_attempts_remaining(remaining);
        }

        SecurityCheck::allow().with_attempts_remaining(outcome.attempts_remaining)
    }
}
