//! Register Device Account Use Case

use super::device_trust::DeviceTrust;
use crate::domain::entities::DeviceMetadata;
use crate::domain::host::BrowserHost;
use crate::domain::repository::LockoutPolicy;

impl<P, H> DeviceTrust<P, H>
where
    P: LockoutPolicy + Sync,
    H: BrowserHost,
{
    /// Count a newly created account against this device
    ///
    /// Returns false without a fingerprint or when the backend refuses or
    /// fails.
    pub async fn register_device_account(&self) -> bool {
        let Some(hash) = self.fingerprint_hash() else {
            return false;
        };

        let navigator = self.host.navigator();
        let metadata = DeviceMetadata {
            user_agent: navigator.user_agent,
            platform: navigator.platform,
            language: navigator.language,
        };

        match self
            .scoped(self.policy.register_device_account(&hash, &metadata))
            .await
        {
            Ok(registered) => {
                tracing::info!(
                    fingerprint = %hash.short(),
                    registered,
                    "Device account registration"
                );
                registered
            }
            Err(e) => {
                e.log("register_device_account");
                false
            }
        }
    }
}
