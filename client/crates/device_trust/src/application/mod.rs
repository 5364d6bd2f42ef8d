//! Application Layer - Use Cases
//!
//! The device trust orchestrator and the pieces it composes: fingerprint
//! building, automation detection, behavior tracking and view scoping.

pub mod automation;
pub mod behavior;
pub mod check_registration;
pub mod config;
pub mod device_trust;
pub mod events;
pub mod fingerprint;
pub mod link_user;
pub mod messages;
pub mod record_login;
pub mod register_device;
pub mod scope;

/// Verdict of a gating operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityCheck {
    pub can_proceed: bool,
    /// User-facing reason when refused
    pub error: Option<String>,
    pub attempts_remaining: Option<u32>,
}

impl SecurityCheck {
    pub fn allow() -> Self {
        Self {
            can_proceed: true,
            error: None,
            attempts_remaining: None,
        }
    }

    pub fn deny(error: impl Into<String>) -> Self {
        Self {
            can_proceed: false,
            error: Some(error.into()),
            attempts_remaining: None,
        }
    }

    pub fn with_attempts_remaining(self, attempts_remaining: Option<u32>) -> Self {
        Self {
            attempts_remaining,
            ..self
        }
    }
}
