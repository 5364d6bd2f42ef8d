//! Domain Entities
//!
//! Core business objects for the device trust domain.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

use super::value_objects::{AutomationSignal, BehaviorScore, FingerprintHash};

/// Raw signals collected from the host environment
///
/// Every probe is total: unavailable capabilities surface as sentinel
/// strings (`no-webgl`, `audio-timeout`, ...) rather than errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintComponents {
    /// Canvas data URL or sentinel
    pub canvas: String,
    /// `vendor|renderer` or sentinel
    pub webgl: String,
    /// Decimal digest of the audio buffer or sentinel
    pub audio: String,
    /// `WxHxDepth|AvailWxAvailH`
    pub screen: String,
    pub timezone: String,
    pub language: String,
    pub platform: String,
    pub hardware_concurrency: u32,
    pub device_memory: Option<f64>,
    pub user_agent: String,
    pub color_depth: u32,
    pub pixel_ratio: f64,
    pub touch_support: bool,
    pub cookies_enabled: bool,
    pub do_not_track: Option<String>,
    /// Comma-joined plugin names
    pub plugins: String,
    /// Comma-joined detected fonts or `no-fonts`
    pub fonts: String,
}

/// Result of automation detection
///
/// `is_bot` is derived from the reason count and cannot disagree with it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationVerdict {
    is_bot: bool,
    reasons: Vec<AutomationSignal>,
}

impl AutomationVerdict {
    /// More than one signal is required; a single one is common on real browsers.
    pub fn from_reasons(reasons: Vec<AutomationSignal>) -> Self {
        Self {
            is_bot: reasons.len() > 1,
            reasons,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.is_bot
    }

    pub fn reasons(&self) -> &[AutomationSignal] {
        &self.reasons
    }
}

/// Fingerprint computed once per session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFingerprint {
    pub hash: FingerprintHash,
    pub components: FingerprintComponents,
    pub generated_at: DateTime<Utc>,
    pub automation: AutomationVerdict,
}

impl DeviceFingerprint {
    pub fn automation_detected(&self) -> bool {
        self.automation.is_bot()
    }
}

/// Lockout state of the current device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockState {
    #[default]
    Allowed,
    Temporary {
        reason: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    Permanent {
        reason: Option<String>,
    },
}

impl BlockState {
    pub fn is_blocked(&self) -> bool {
        !matches!(self, BlockState::Allowed)
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, BlockState::Permanent { .. })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            BlockState::Temporary { expires_at, .. } => *expires_at,
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            BlockState::Temporary { reason, .. } | BlockState::Permanent { reason } => {
                reason.as_deref()
            }
            BlockState::Allowed => None,
        }
    }

    /// Whether the block still applies at `now`
    ///
    /// A temporary block without an expiry never lapses on its own.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            BlockState::Allowed => false,
            BlockState::Permanent { .. } => true,
            BlockState::Temporary { expires_at, .. } => expires_at.is_none_or(|at| at > now),
        }
    }
}

/// Reply of the backend block check
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockStatus {
    pub blocked: bool,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub permanent: bool,
}

impl BlockStatus {
    pub fn allowed() -> Self {
        Self::default()
    }

    pub fn from_state(state: &BlockState) -> Self {
        Self {
            blocked: state.is_blocked(),
            reason: state.reason().map(str::to_string),
            expires_at: state.expires_at(),
            permanent: state.is_permanent(),
        }
    }

    pub fn to_block_state(&self) -> BlockState {
        if !self.blocked {
            BlockState::Allowed
        } else if self.permanent {
            BlockState::Permanent {
                reason: self.reason.clone(),
            }
        } else {
            BlockState::Temporary {
                reason: self.reason.clone(),
                expires_at: self.expires_at,
            }
        }
    }
}

/// One login attempt, as reported to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct LoginAttempt {
    pub fingerprint_hash: FingerprintHash,
    pub email: String,
    pub ip_address: Option<IpAddr>,
    pub user_agent: String,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub behavior_score: BehaviorScore,
}

/// Backend reply to a recorded attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginAttemptOutcome {
    pub status: BlockStatus,
    pub attempts_remaining: Option<u32>,
}

/// Metadata stored with a newly registered device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
}

/// Association between an authenticated user and a device
#[derive(Debug, Clone, PartialEq)]
pub struct UserDeviceLink {
    pub user_id: UserId,
    pub fingerprint_hash: FingerprintHash,
    pub ip_address: Option<IpAddr>,
    pub user_agent: String,
}

/// Coarse phase of the security state, for views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustPhase {
    Loading,
    Allowed,
    TemporarilyBlocked,
    PermanentlyBlocked,
}

/// Observable security state of the current device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSecurityState {
    pub block: BlockState,
    pub attempts_remaining: u32,
    pub fingerprint_hash: Option<FingerprintHash>,
    pub is_automation_detected: bool,
    pub is_loading: bool,
}

impl DeviceSecurityState {
    /// Initial state before any check has completed
    pub fn loading(attempts_remaining: u32) -> Self {
        Self {
            block: BlockState::Allowed,
            attempts_remaining,
            fingerprint_hash: None,
            is_automation_detected: false,
            is_loading: true,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.block.is_blocked()
    }

    pub fn is_permanent_block(&self) -> bool {
        self.block.is_permanent()
    }

    pub fn block_expires_at(&self) -> Option<DateTime<Utc>> {
        self.block.expires_at()
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.block.reason()
    }

    pub fn phase(&self) -> TrustPhase {
        match (&self.block, self.is_loading) {
            (_, true) => TrustPhase::Loading,
            (BlockState::Allowed, false) => TrustPhase::Allowed,
            (BlockState::Temporary { .. }, false) => TrustPhase::TemporarilyBlocked,
            (BlockState::Permanent { .. }, false) => TrustPhase::PermanentlyBlocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_verdict_requires_two_reasons() {
        let one = AutomationVerdict::from_reasons(vec![AutomationSignal::NoPlugins]);
        assert!(!one.is_bot());
        assert_eq!(one.reasons().len(), 1);

        let two = AutomationVerdict::from_reasons(vec![
            AutomationSignal::Webdriver,
            AutomationSignal::NoPlugins,
        ]);
        assert!(two.is_bot());

        assert!(!AutomationVerdict::default().is_bot());
    }

    #[test]
    fn test_block_status_conversion() {
        assert_eq!(BlockStatus::allowed().to_block_state(), BlockState::Allowed);

        let permanent = BlockStatus {
            blocked: true,
            permanent: true,
            reason: Some("abuse".into()),
            ..Default::default()
        };
        assert!(permanent.to_block_state().is_permanent());
        assert_eq!(permanent.to_block_state().reason(), Some("abuse"));

        let expires = Utc::now() + Duration::minutes(30);
        let temporary = BlockStatus {
            blocked: true,
            expires_at: Some(expires),
            ..Default::default()
        };
        let state = temporary.to_block_state();
        assert_eq!(state.expires_at(), Some(expires));
        assert_eq!(BlockStatus::from_state(&state), temporary);
    }

    #[test]
    fn test_block_activity() {
        let now = Utc::now();
        assert!(!BlockState::Allowed.is_active_at(now));
        assert!(BlockState::Permanent { reason: None }.is_active_at(now));

        let lapsed = BlockState::Temporary {
            reason: None,
            expires_at: Some(now - Duration::seconds(1)),
        };
        assert!(!lapsed.is_active_at(now));

        let open_ended = BlockState::Temporary {
            reason: None,
            expires_at: None,
        };
        assert!(open_ended.is_active_at(now));
    }

    #[test]
    fn test_state_phase() {
        let mut state = DeviceSecurityState::loading(5);
        assert_eq!(state.phase(), TrustPhase::Loading);
        assert!(!state.is_blocked());

        state.is_loading = false;
        assert_eq!(state.phase(), TrustPhase::Allowed);

        state.block = BlockState::Permanent { reason: None };
        assert_eq!(state.phase(), TrustPhase::PermanentlyBlocked);
        assert!(state.is_permanent_block());
        assert!(state.block_expires_at().is_none());
    }
}
