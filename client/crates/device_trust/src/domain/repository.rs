//! Repository Traits
//!
//! The lockout backend contract. Implementations live in the infra layer.
//! The backend is authoritative for counting, block decisions and expiry;
//! the client only reports and reads.

use crate::domain::entities::{
    BlockStatus, DeviceMetadata, LoginAttempt, LoginAttemptOutcome, UserDeviceLink,
};
use crate::domain::value_objects::FingerprintHash;
use crate::error::TrustResult;

/// Lockout policy backend
#[trait_variant::make(LockoutPolicy: Send)]
pub trait LocalLockoutPolicy {
    /// Current block status of a device
    async fn check_device_blocked(&self, hash: &FingerprintHash) -> TrustResult<BlockStatus>;

    /// Number of accounts registered from a device
    async fn get_device_account_count(&self, hash: &FingerprintHash) -> TrustResult<u32>;

    /// Record an attempt and return the resulting block status
    async fn record_login_attempt(
        &self,
        attempt: &LoginAttempt,
    ) -> TrustResult<LoginAttemptOutcome>;

    /// Register a new account on a device
    /// Returns false when the backend refuses the registration
    async fn register_device_account(
        &self,
        hash: &FingerprintHash,
        metadata: &DeviceMetadata,
    ) -> TrustResult<bool>;

    /// Link an authenticated user to a device
    async fn link_user_device(&self, link: &UserDeviceLink) -> TrustResult<()>;
}
