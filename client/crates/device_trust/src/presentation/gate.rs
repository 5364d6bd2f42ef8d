//! Auth Gate View Model
//!
//! What the authentication page renders and the checks it runs before a
//! submit reaches the auth provider.

use std::sync::Arc;

use super::countdown::BlockCountdown;
use crate::application::SecurityCheck;
use crate::application::device_trust::DeviceTrust;
use crate::application::events::EventTarget;
use crate::application::messages;
use crate::domain::entities::TrustPhase;
use crate::domain::host::BrowserHost;
use crate::domain::repository::LockoutPolicy;

pub const BLOCK_SCREEN_TITLE: &str = "Thiết bị bị khóa";
pub const BLOCK_SCREEN_PERMANENT: &str =
    "Thiết bị này đã bị khóa vĩnh viễn do vi phạm bảo mật nghiêm trọng.";
pub const BLOCK_SCREEN_TEMPORARY: &str = "Đăng nhập sai quá nhiều lần. Vui lòng thử lại sau.";
pub const BLOCK_SCREEN_CONTACT: &str =
    "Nếu bạn cho rằng đây là nhầm lẫn, vui lòng liên hệ quản trị viên.";
pub const COUNTDOWN_LABEL: &str = "Thời gian còn lại";

pub const SUBMIT_PERMANENTLY_BLOCKED: &str = "Thiết bị đã bị khóa vĩnh viễn do vi phạm bảo mật";
pub const SUBMIT_TEMPORARILY_BLOCKED: &str = "Thiết bị tạm thời bị khóa. Vui lòng thử lại sau.";
pub const SUBMIT_AUTOMATION: &str = "Phát hiện hoạt động bất thường. Vui lòng thử lại sau.";
/// Fallback when a refusal carries no message
pub const DEVICE_LOCKED: &str = "Thiết bị đã bị khóa";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateScreen {
    Loading,
    Blocked {
        permanent: bool,
        title: &'static str,
        detail: &'static str,
        contact: &'static str,
        /// `Thời gian còn lại: M:SS`, temporary blocks only
        countdown: Option<String>,
    },
    Open,
}

pub struct AuthGate<P, H>
where
    P: LockoutPolicy + Sync + 'static,
    H: BrowserHost + 'static,
{
    trust: Arc<DeviceTrust<P, H>>,
    countdown: BlockCountdown,
}

impl<P, H> AuthGate<P, H>
where
    P: LockoutPolicy + Sync + 'static,
    H: BrowserHost + 'static,
{
    /// Initialize the device (or re-read its status when a previous view
    /// already did), then start tracking and the countdown
    pub async fn mount(trust: Arc<DeviceTrust<P, H>>, target: &EventTarget) -> Self {
        if trust.state().is_loading {
            trust.initialize().await;
        } else {
            trust.refresh_status().await;
        }
        trust.start_behavior_tracking(target);
        let countdown = BlockCountdown::spawn(trust.clone());
        Self { trust, countdown }
    }

    pub fn trust(&self) -> &DeviceTrust<P, H> {
        &self.trust
    }

    pub fn countdown(&self) -> &BlockCountdown {
        &self.countdown
    }

    pub fn screen(&self) -> GateScreen {
        match self.trust.state().phase() {
            TrustPhase::Loading => GateScreen::Loading,
            TrustPhase::Allowed => GateScreen::Open,
            TrustPhase::PermanentlyBlocked => GateScreen::Blocked {
                permanent: true,
                title: BLOCK_SCREEN_TITLE,
                detail: BLOCK_SCREEN_PERMANENT,
                contact: BLOCK_SCREEN_CONTACT,
                countdown: None,
            },
            TrustPhase::TemporarilyBlocked => GateScreen::Blocked {
                permanent: false,
                title: BLOCK_SCREEN_TITLE,
                detail: BLOCK_SCREEN_TEMPORARY,
                contact: BLOCK_SCREEN_CONTACT,
                countdown: self
                    .countdown
                    .current()
                    .map(|remaining| format!("{COUNTDOWN_LABEL}: {remaining}")),
            },
        }
    }

    /// Local checks before credentials are sent anywhere
    pub fn precheck_submit(&self) -> Result<(), &'static str> {
        let state = self.trust.state();
        if state.is_permanent_block() {
            Err(SUBMIT_PERMANENTLY_BLOCKED)
        } else if state.is_blocked() {
            Err(SUBMIT_TEMPORARILY_BLOCKED)
        } else if state.is_automation_detected {
            Err(SUBMIT_AUTOMATION)
        } else {
            Ok(())
        }
    }

    /// Message to show after a failed login was recorded
    pub fn login_failure_notice(&self, check: &SecurityCheck) -> Option<String> {
        if !check.can_proceed {
            return Some(check.error.clone().unwrap_or_else(|| DEVICE_LOCKED.to_string()));
        }
        check
            .attempts_remaining
            .filter(|remaining| *remaining <= self.trust.config().attempts_warning_threshold)
            .map(messages::attempts_remaining)
    }
}

impl<P, H> Drop for AuthGate<P, H>
where
    P: LockoutPolicy + Sync + 'static,
    H: BrowserHost + 'static,
{
    fn drop(&mut self) {
        self.trust.close();
    }
}
