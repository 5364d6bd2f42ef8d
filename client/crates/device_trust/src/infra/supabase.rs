//! Supabase RPC Lockout Backend

use platform::rpc::RpcClient;

use super::dto::{
    BlockStatusResponse, FingerprintArgs, LinkUserDeviceArgs, LoginAttemptResponse,
    RecordLoginAttemptArgs, RegisterDeviceArgs, RegisterDeviceResponse, clamp_count,
};
use crate::domain::entities::{
    BlockStatus, DeviceMetadata, LoginAttempt, LoginAttemptOutcome, UserDeviceLink,
};
use crate::domain::repository::LockoutPolicy;
use crate::domain::value_objects::FingerprintHash;
use crate::error::TrustResult;

const CHECK_DEVICE_BLOCKED: &str = "check_device_blocked";
const GET_DEVICE_ACCOUNT_COUNT: &str = "get_device_account_count";
const RECORD_LOGIN_ATTEMPT: &str = "record_login_attempt";
const REGISTER_DEVICE_ACCOUNT: &str = "register_device_account";
const LINK_USER_DEVICE: &str = "link_user_device";

/// Lockout policy enforced by stored procedures
#[derive(Debug, Clone)]
pub struct SupabaseLockoutPolicy {
    rpc: RpcClient,
}

impl SupabaseLockoutPolicy {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

impl LockoutPolicy for SupabaseLockoutPolicy {
    async fn check_device_blocked(&self, hash: &FingerprintHash) -> TrustResult<BlockStatus> {
        let args = FingerprintArgs {
            p_fingerprint_hash: hash.as_str(),
        };
        let reply: BlockStatusResponse = self.rpc.call(CHECK_DEVICE_BLOCKED, &args).await?;
        Ok(reply.into())
    }

    async fn get_device_account_count(&self, hash: &FingerprintHash) -> TrustResult<u32> {
        let args = FingerprintArgs {
            p_fingerprint_hash: hash.as_str(),
        };
        let count: Option<i64> = self.rpc.call(GET_DEVICE_ACCOUNT_COUNT, &args).await?;
        Ok(count.map(clamp_count).unwrap_or(0))
    }

    async fn record_login_attempt(
        &self,
        attempt: &LoginAttempt,
    ) -> TrustResult<LoginAttemptOutcome> {
        let args = RecordLoginAttemptArgs {
            p_fingerprint_hash: attempt.fingerprint_hash.as_str(),
            p_email: &attempt.email,
            p_ip_address: attempt.ip_address.map(|ip| ip.to_string()),
            p_user_agent: &attempt.user_agent,
            p_success: attempt.success,
            p_failure_reason: attempt.failure_reason.as_deref(),
            p_behavior_score: attempt.behavior_score.value(),
        };
        let reply: LoginAttemptResponse = self.rpc.call(RECORD_LOGIN_ATTEMPT, &args).await?;
        let outcome = LoginAttemptOutcome::from(reply);

        tracing::debug!(
            fingerprint = %attempt.fingerprint_hash.short(),
            success = attempt.success,
            blocked = outcome.status.blocked,
            "Login attempt recorded"
        );
        Ok(outcome)
    }

    async fn register_device_account(
        &self,
        hash: &FingerprintHash,
        metadata: &DeviceMetadata,
    ) -> TrustResult<bool> {
        let args = RegisterDeviceArgs {
            p_fingerprint_hash: hash.as_str(),
            p_metadata: metadata,
        };
        let reply: RegisterDeviceResponse = self.rpc.call(REGISTER_DEVICE_ACCOUNT, &args).await?;
        Ok(reply.success)
    }

    async fn link_user_device(&self, link: &UserDeviceLink) -> TrustResult<()> {
        let args = LinkUserDeviceArgs {
            p_user_id: link.user_id,
            p_fingerprint_hash: link.fingerprint_hash.as_str(),
            p_ip_address: link.ip_address.map(|ip| ip.to_string()),
            p_user_agent: &link.user_agent,
        };
        self.rpc.call_void(LINK_USER_DEVICE, &args).await?;
        Ok(())
    }
}
