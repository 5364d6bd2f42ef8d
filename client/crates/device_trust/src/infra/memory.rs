//! In-Memory Lockout Backend
//!
//! Process-local implementation of the lockout rules the remote backend
//! enforces. Backs the CLI's offline mode and the crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;

use crate::domain::entities::{
    BlockState, BlockStatus, DeviceMetadata, LoginAttempt, LoginAttemptOutcome, UserDeviceLink,
};
use crate::domain::repository::LockoutPolicy;
use crate::domain::value_objects::FingerprintHash;
use crate::error::{TrustError, TrustResult};

pub const REASON_FAILED_ATTEMPTS: &str = "too_many_failed_attempts";
pub const REASON_REPEATED_LOCKOUTS: &str = "repeated_lockouts";

/// Thresholds of the lockout policy
#[derive(Debug, Clone)]
pub struct LockoutRules {
    /// Failures within the window that trigger a block
    pub max_failed_attempts: u32,
    pub failure_window: Duration,
    pub temporary_block: Duration,
    /// Blocks after which the next one is permanent
    pub permanent_after_blocks: u32,
    pub max_accounts_per_device: u32,
}

impl Default for LockoutRules {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            failure_window: Duration::minutes(15),
            temporary_block: Duration::minutes(30),
            permanent_after_blocks: 3,
            max_accounts_per_device: 3,
        }
    }
}

#[derive(Debug, Default)]
struct DeviceRecord {
    accounts_count: u32,
    block_count: u32,
    block: BlockState,
    failures: Vec<DateTime<Utc>>,
    metadata: Option<DeviceMetadata>,
    linked_users: HashSet<UserId>,
    attempts: usize,
}

impl DeviceRecord {
    /// Lift a temporary block whose expiry has passed
    fn lift_expired(&mut self, now: DateTime<Utc>) {
        if self.block.is_blocked() && !self.block.is_active_at(now) {
            self.block = BlockState::Allowed;
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLockoutPolicy {
    rules: LockoutRules,
    devices: Mutex<HashMap<FingerprintHash, DeviceRecord>>,
    offline: AtomicBool,
}

impl InMemoryLockoutPolicy {
    pub fn new(rules: LockoutRules) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    pub fn rules(&self) -> &LockoutRules {
        &self.rules
    }

    /// Make every call fail as if the backend were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Put a device into a given block state
    pub fn block_device(&self, hash: &FingerprintHash, block: BlockState) {
        let mut devices = self.devices();
        let record = devices.entry(hash.clone()).or_default();
        if block.is_blocked() {
            record.block_count += 1;
        }
        record.block = block;
    }

    pub fn account_count(&self, hash: &FingerprintHash) -> u32 {
        self.devices().get(hash).map_or(0, |r| r.accounts_count)
    }

    pub fn linked_users(&self, hash: &FingerprintHash) -> Vec<UserId> {
        self.devices()
            .get(hash)
            .map(|r| r.linked_users.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn recorded_attempts(&self, hash: &FingerprintHash) -> usize {
        self.devices().get(hash).map_or(0, |r| r.attempts)
    }

    pub fn device_metadata(&self, hash: &FingerprintHash) -> Option<DeviceMetadata> {
        self.devices().get(hash).and_then(|r| r.metadata.clone())
    }

    fn devices(&self) -> MutexGuard<'_, HashMap<FingerprintHash, DeviceRecord>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> TrustResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(TrustError::Unavailable("in-memory backend is offline".into()))
        } else {
            Ok(())
        }
    }

    fn apply_failure(&self, record: &mut DeviceRecord, now: DateTime<Utc>) -> LoginAttemptOutcome {
        let window_start = now - self.rules.failure_window;
        record.failures.retain(|at| *at > window_start);
        record.failures.push(now);

        let failures = record.failures.len() as u32;
        if failures < self.rules.max_failed_attempts {
            return LoginAttemptOutcome {
                status: BlockStatus::allowed(),
                attempts_remaining: Some(self.rules.max_failed_attempts - failures),
            };
        }

        record.failures.clear();
        record.block_count += 1;
        record.block = if record.block_count >= self.rules.permanent_after_blocks {
            BlockState::Permanent {
                reason: Some(REASON_REPEATED_LOCKOUTS.to_string()),
            }
        } else {
            BlockState::Temporary {
                reason: Some(REASON_FAILED_ATTEMPTS.to_string()),
                expires_at: Some(now + self.rules.temporary_block),
            }
        };

        tracing::info!(
            block_count = record.block_count,
            permanent = record.block.is_permanent(),
            "Device blocked after repeated failures"
        );

        LoginAttemptOutcome {
            status: BlockStatus::from_state(&record.block),
            attempts_remaining: Some(0),
        }
    }
}

impl LockoutPolicy for InMemoryLockoutPolicy {
    async fn check_device_blocked(&self, hash: &FingerprintHash) -> TrustResult<BlockStatus> {
        self.ensure_online()?;
        let mut devices = self.devices();
        let Some(record) = devices.get_mut(hash) else {
            return Ok(BlockStatus::allowed());
        };
        record.lift_expired(Utc::now());
        Ok(BlockStatus::from_state(&record.block))
    }

    async fn get_device_account_count(&self, hash: &FingerprintHash) -> TrustResult<u32> {
        self.ensure_online()?;
        Ok(self.account_count(hash))
    }

    async fn record_login_attempt(
        &self,
        attempt: &LoginAttempt,
    ) -> TrustResult<LoginAttemptOutcome> {
        self.ensure_online()?;
        let now = Utc::now();
        let mut devices = self.devices();
        let record = devices.entry(attempt.fingerprint_hash.clone()).or_default();
        record.attempts += 1;
        record.lift_expired(now);

        if record.block.is_blocked() {
            return Ok(LoginAttemptOutcome {
                status: BlockStatus::from_state(&record.block),
                attempts_remaining: Some(0),
            });
        }

        if attempt.success {
            record.failures.clear();
            return Ok(LoginAttemptOutcome {
                status: BlockStatus::allowed(),
                attempts_remaining: Some(self.rules.max_failed_attempts),
            });
        }

        Ok(self.apply_failure(record, now))
    }

    async fn register_device_account(
        &self,
        hash: &FingerprintHash,
        metadata: &DeviceMetadata,
    ) -> TrustResult<bool> {
        self.ensure_online()?;
        let mut devices = self.devices();
        let record = devices.entry(hash.clone()).or_default();
        if record.accounts_count >= self.rules.max_accounts_per_device {
            return Ok(false);
        }
        record.accounts_count += 1;
        record.metadata = Some(metadata.clone());
        Ok(true)
    }

    async fn link_user_device(&self, link: &UserDeviceLink) -> TrustResult<()> {
        self.ensure_online()?;
        self.devices()
            .entry(link.fingerprint_hash.clone())
            .or_default()
            .linked_users
            .insert(link.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::BehaviorScore;

    fn hash() -> FingerprintHash {
        FingerprintHash::digest("memory-device")
    }

    fn attempt(success: bool) -> LoginAttempt {
        LoginAttempt {
            fingerprint_hash: hash(),
            email: "user@example.com".into(),
            ip_address: None,
            user_agent: "UA".into(),
            success,
            failure_reason: (!success).then(|| "Invalid login credentials".to_string()),
            behavior_score: BehaviorScore::NEUTRAL,
        }
    }

    #[tokio::test]
    async fn test_unknown_device_is_allowed() {
        let policy = InMemoryLockoutPolicy::default();
        let status = policy.check_device_blocked(&hash()).await.unwrap();
        assert!(!status.blocked);
        assert_eq!(policy.get_device_account_count(&hash()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failures_count_down_then_block() {
        let policy = InMemoryLockoutPolicy::default();

        for expected in (1..=4).rev() {
            let outcome = policy.record_login_attempt(&attempt(false)).await.unwrap();
            assert!(!outcome.status.blocked);
            assert_eq!(outcome.attempts_remaining, Some(expected));
        }

        let outcome = policy.record_login_attempt(&attempt(false)).await.unwrap();
        assert!(outcome.status.blocked);
        assert!(!outcome.status.permanent);
        assert_eq!(outcome.status.reason.as_deref(), Some(REASON_FAILED_ATTEMPTS));
        assert!(outcome.status.expires_at.unwrap() > Utc::now() + Duration::minutes(29));

        let status = policy.check_device_blocked(&hash()).await.unwrap();
        assert!(status.blocked);
        assert_eq!(policy.recorded_attempts(&hash()), 5);
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let policy = InMemoryLockoutPolicy::default();
        policy.record_login_attempt(&attempt(false)).await.unwrap();
        policy.record_login_attempt(&attempt(false)).await.unwrap();

        let outcome = policy.record_login_attempt(&attempt(true)).await.unwrap();
        assert_eq!(outcome.attempts_remaining, Some(5));

        let outcome = policy.record_login_attempt(&attempt(false)).await.unwrap();
        assert_eq!(outcome.attempts_remaining, Some(4));
    }

    #[tokio::test]
    async fn test_repeated_blocks_become_permanent() {
        let policy = InMemoryLockoutPolicy::new(LockoutRules {
            max_failed_attempts: 1,
            temporary_block: Duration::zero(),
            ..Default::default()
        });

        for _ in 0..2 {
            let outcome = policy.record_login_attempt(&attempt(false)).await.unwrap();
            assert!(outcome.status.blocked);
            assert!(!outcome.status.permanent);
        }

        let outcome = policy.record_login_attempt(&attempt(false)).await.unwrap();
        assert!(outcome.status.permanent);
        assert_eq!(
            outcome.status.reason.as_deref(),
            Some(REASON_REPEATED_LOCKOUTS)
        );

        // Successful credentials do not lift a permanent block
        let outcome = policy.record_login_attempt(&attempt(true)).await.unwrap();
        assert!(outcome.status.blocked);
    }

    #[tokio::test]
    async fn test_expired_block_lifts_on_check() {
        let policy = InMemoryLockoutPolicy::default();
        policy.block_device(
            &hash(),
            BlockState::Temporary {
                reason: None,
                expires_at: Some(Utc::now() - Duration::seconds(1)),
            },
        );
        let status = policy.check_device_blocked(&hash()).await.unwrap();
        assert!(!status.blocked);
    }

    #[tokio::test]
    async fn test_registration_cap() {
        let policy = InMemoryLockoutPolicy::default();
        let metadata = DeviceMetadata {
            user_agent: "UA".into(),
            platform: "Linux x86_64".into(),
            language: "vi".into(),
        };

        for _ in 0..3 {
            assert!(policy.register_device_account(&hash(), &metadata).await.unwrap());
        }
        assert!(!policy.register_device_account(&hash(), &metadata).await.unwrap());
        assert_eq!(policy.account_count(&hash()), 3);
        assert_eq!(policy.device_metadata(&hash()), Some(metadata));
    }

    #[tokio::test]
    async fn test_link_user() {
        let policy = InMemoryLockoutPolicy::default();
        let user_id = UserId::new();
        let link = UserDeviceLink {
            user_id,
            fingerprint_hash: hash(),
            ip_address: None,
            user_agent: "UA".into(),
        };
        policy.link_user_device(&link).await.unwrap();
        policy.link_user_device(&link).await.unwrap();
        assert_eq!(policy.linked_users(&hash()), vec![user_id]);
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let policy = InMemoryLockoutPolicy::default();
        policy.set_offline(true);
        assert!(matches!(
            policy.check_device_blocked(&hash()).await,
            Err(TrustError::Unavailable(_))
        ));
        assert!(policy.record_login_attempt(&attempt(false)).await.is_err());
    }
}
