//! Check Registration Use Case
//!
//! Gate run before a new account is created on this device.

use chrono::Utc;

use super::SecurityCheck;
use super::automation::AutomationDetector;
use super::device_trust::DeviceTrust;
use super::messages;
use crate::domain::host::BrowserHost;
use crate::domain::repository::LockoutPolicy;

impl<P, H> DeviceTrust<P, H>
where
    P: LockoutPolicy + Sync,
    H: BrowserHost,
{
    /// Whether a new account may be registered from this device
    ///
    /// Checks, in order: a fingerprint exists, the device is not blocked,
    /// the environment does not look automated, and the per-device account
    /// cap has not been reached.
    pub async fn check_registration_allowed(&self) -> SecurityCheck {
        let state = self.state();
        let Some(hash) = state.fingerprint_hash else {
            return SecurityCheck::deny(messages::DEVICE_UNIDENTIFIED);
        };

        if let Some(message) = self.known_block_message(&state.block, Utc::now()) {
            return SecurityCheck::deny(message);
        }

        if AutomationDetector::new(self.host.as_ref()).detect().is_bot() {
            return SecurityCheck::deny(messages::AUTOMATION_DETECTED);
        }

        match self.scoped(self.policy.get_device_account_count(&hash)).await {
            Ok(count) if count >= self.config.max_accounts_per_device => {
                tracing::info!(
                    fingerprint = %hash.short(),
                    accounts = count,
                    "Registration refused: device account limit reached"
                );
                SecurityCheck::deny(messages::account_limit_reached(
                    self.config.max_accounts_per_device,
                ))
            }
            Ok(_) => SecurityCheck::allow(),
            Err(e) => self.resolve_backend_failure("check_registration_allowed", e),
        }
    }
}
