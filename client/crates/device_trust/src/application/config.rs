//! Application Configuration
//!
//! Tunables for the device trust application layer.

use std::time::Duration;

/// How backend failures resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Allow the action; availability wins over enforcement
    #[default]
    FailOpen,
    /// Refuse the action until the backend answers
    FailClosed,
}

/// Behaviour scoring thresholds
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    /// Submissions faster than this are penalized
    pub fast_submit: Duration,
    pub fast_submit_penalty: i32,
    /// Dwell longer than this earns a bonus
    pub patient_dwell: Duration,
    pub patient_dwell_bonus: i32,
    /// Keystroke intervals needed before timing is judged
    pub min_keystroke_intervals: usize,
    /// Interval variance (ms²) below which typing looks scripted
    pub uniform_typing_variance: f64,
    pub uniform_typing_penalty: i32,
    /// Interval variance (ms²) above which typing looks human
    pub natural_typing_variance: f64,
    pub natural_typing_bonus: i32,
    pub no_pointer_penalty: i32,
    /// Pointer moves above which movement looks human
    pub busy_pointer_moves: u64,
    pub busy_pointer_bonus: i32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            fast_submit: Duration::from_secs(2),
            fast_submit_penalty: 30,
            patient_dwell: Duration::from_secs(5),
            patient_dwell_bonus: 10,
            min_keystroke_intervals: 4,
            uniform_typing_variance: 100.0,
            uniform_typing_penalty: 20,
            natural_typing_variance: 1000.0,
            natural_typing_bonus: 10,
            no_pointer_penalty: 20,
            busy_pointer_moves: 10,
            busy_pointer_bonus: 10,
        }
    }
}

/// Device trust configuration
#[derive(Debug, Clone)]
pub struct TrustConfig {
    /// Accounts allowed per device before registration is refused
    pub max_accounts_per_device: u32,
    /// Upper bound on the audio probe
    pub audio_probe_timeout: Duration,
    /// Canvas characters that enter the hash
    pub canvas_hash_prefix: usize,
    /// Attempts shown before the backend has answered
    pub initial_attempts_remaining: u32,
    /// Remaining attempts at or below which a warning is shown
    pub attempts_warning_threshold: u32,
    /// Block countdown refresh period
    pub countdown_tick: Duration,
    pub failure_policy: FailurePolicy,
    pub behavior: BehaviorConfig,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            max_accounts_per_device: 3,
            audio_probe_timeout: Duration::from_millis(1000),
            canvas_hash_prefix: 100,
            initial_attempts_remaining: 5,
            attempts_warning_threshold: 3,
            countdown_tick: Duration::from_secs(1),
            failure_policy: FailurePolicy::FailOpen,
            behavior: BehaviorConfig::default(),
        }
    }
}

impl TrustConfig {
    /// Refuse actions while the backend is unreachable
    pub fn fail_closed() -> Self {
        Self {
            failure_policy: FailurePolicy::FailClosed,
            ..Default::default()
        }
    }

    pub fn with_failure_policy(self, failure_policy: FailurePolicy) -> Self {
        Self {
            failure_policy,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrustConfig::default();
        assert_eq!(config.max_accounts_per_device, 3);
        assert_eq!(config.audio_probe_timeout, Duration::from_millis(1000));
        assert_eq!(config.initial_attempts_remaining, 5);
        assert_eq!(config.failure_policy, FailurePolicy::FailOpen);
        assert_eq!(config.behavior.min_keystroke_intervals, 4);
    }

    #[test]
    fn test_fail_closed() {
        let config = TrustConfig::fail_closed();
        assert_eq!(config.failure_policy, FailurePolicy::FailClosed);
        assert_eq!(config.canvas_hash_prefix, 100);
    }
}
