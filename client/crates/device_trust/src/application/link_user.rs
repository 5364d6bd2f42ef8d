//! Link User To Device Use Case

use kernel::id::UserId;

use super::device_trust::DeviceTrust;
use crate::domain::entities::UserDeviceLink;
use crate::domain::host::BrowserHost;
use crate::domain::repository::LockoutPolicy;

impl<P, H> DeviceTrust<P, H>
where
    P: LockoutPolicy + Sync,
    H: BrowserHost,
{
    /// Best effort: failures are logged and swallowed
    pub async fn link_user_to_device(&self, user_id: UserId) {
        let Some(hash) = self.fingerprint_hash() else {
            tracing::debug!(%user_id, "No fingerprint, skipping device link");
            return;
        };

        let link = UserDeviceLink {
            user_id,
            fingerprint_hash: hash,
            ip_address: None,
            user_agent: self.host.navigator().user_agent,
        };

        if let Err(e) = self.scoped(self.policy.link_user_device(&link)).await {
            e.log("link_user_to_device");
        }
    }
}
