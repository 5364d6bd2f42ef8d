//! Wire types of the lockout RPC contract
//!
//! Argument objects use the backend's `p_*` parameter names. Replies are
//! decoded leniently: absent fields take their neutral value.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{BlockStatus, DeviceMetadata, LoginAttemptOutcome};

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FingerprintArgs<'a> {
    pub p_fingerprint_hash: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RecordLoginAttemptArgs<'a> {
    pub p_fingerprint_hash: &'a str,
    pub p_email: &'a str,
    pub p_ip_address: Option<String>,
    pub p_user_agent: &'a str,
    pub p_success: bool,
    pub p_failure_reason: Option<&'a str>,
    pub p_behavior_score: i32,
}

#[derive(Debug, Serialize)]
pub struct RegisterDeviceArgs<'a> {
    pub p_fingerprint_hash: &'a str,
    pub p_metadata: &'a DeviceMetadata,
}

#[derive(Debug, Serialize)]
pub struct LinkUserDeviceArgs<'a> {
    pub p_user_id: UserId,
    pub p_fingerprint_hash: &'a str,
    pub p_ip_address: Option<String>,
    pub p_user_agent: &'a str,
}

// ============================================================================
// Replies
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlockStatusResponse {
    pub blocked: bool,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub permanent: Option<bool>,
}

impl From<BlockStatusResponse> for BlockStatus {
    fn from(dto: BlockStatusResponse) -> Self {
        Self {
            blocked: dto.blocked,
            reason: dto.reason,
            expires_at: dto.expires_at,
            permanent: dto.permanent.unwrap_or(false),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginAttemptResponse {
    #[serde(flatten)]
    pub status: BlockStatusResponse,
    pub attempts_remaining: Option<i64>,
}

impl From<LoginAttemptResponse> for LoginAttemptOutcome {
    fn from(dto: LoginAttemptResponse) -> Self {
        Self {
            status: dto.status.into(),
            attempts_remaining: dto.attempts_remaining.map(clamp_count),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterDeviceResponse {
    pub success: bool,
}

/// Negative counts are treated as zero
pub fn clamp_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
