//! Behavior Tracker
//!
//! Records inter-keystroke intervals and pointer movement while the
//! authentication form is on screen, then folds them into a
//! [`BehaviorScore`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use super::config::BehaviorConfig;
use super::events::{EventKind, EventTarget, InteractionEvent, ListenerId};
use crate::domain::value_objects::BehaviorScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    NotStarted,
    Running,
    Stopped,
}

#[derive(Debug, Default)]
struct BehaviorSample {
    started_at: Option<Instant>,
    last_keystroke: Option<Instant>,
    keystroke_intervals_ms: Vec<f64>,
    pointer_moves: u64,
}

impl BehaviorSample {
    fn record_keystroke(&mut self, at: Instant) {
        if let Some(last) = self.last_keystroke {
            let interval = at.saturating_duration_since(last);
            self.keystroke_intervals_ms.push(interval.as_secs_f64() * 1000.0);
        }
        self.last_keystroke = Some(at);
    }

    /// Population variance of the intervals
    fn keystroke_variance(&self) -> Option<f64> {
        let intervals = &self.keystroke_intervals_ms;
        if intervals.is_empty() {
            return None;
        }
        let n = intervals.len() as f64;
        let mean = intervals.iter().sum::<f64>() / n;
        Some(intervals.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / n)
    }
}

#[derive(Debug)]
struct TrackerInner {
    state: TrackerState,
    sample: BehaviorSample,
}

/// One tracker records one sample; restart by creating a new tracker
#[derive(Debug, Clone)]
pub struct BehaviorTracker {
    inner: Arc<Mutex<TrackerInner>>,
    config: Arc<BehaviorConfig>,
}

impl BehaviorTracker {
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerInner {
                state: TrackerState::NotStarted,
                sample: BehaviorSample::default(),
            })),
            config: Arc::new(config),
        }
    }

    /// Attach to `target` and start the dwell clock
    ///
    /// Only the first call attaches; later calls return an inert guard.
    pub fn start(&self, target: &EventTarget) -> TrackingGuard {
        let mut inner = lock(&self.inner);
        if inner.state != TrackerState::NotStarted {
            return TrackingGuard::inert();
        }
        inner.state = TrackerState::Running;
        inner.sample.started_at = Some(Instant::now());
        drop(inner);

        let keys = self.inner.clone();
        let key_down = target.add_listener(
            EventKind::KeyDown,
            Arc::new(move |event: &InteractionEvent| {
                lock(&keys).sample.record_keystroke(event.at)
            }),
        );

        let moves = self.inner.clone();
        let pointer_move = target.add_listener(
            EventKind::PointerMove,
            Arc::new(move |_: &InteractionEvent| lock(&moves).sample.pointer_moves += 1),
        );

        tracing::debug!("Behavior tracking started");

        TrackingGuard {
            registration: Some(Registration {
                target: target.clone(),
                listeners: [key_down, pointer_move],
                tracker: self.inner.clone(),
            }),
        }
    }

    pub fn state(&self) -> TrackerState {
        lock(&self.inner).state
    }

    pub fn score(&self) -> BehaviorScore {
        self.score_at(Instant::now())
    }

    pub fn score_at(&self, now: Instant) -> BehaviorScore {
        let inner = lock(&self.inner);
        let sample = &inner.sample;
        let config = &self.config;
        let mut score = 0;

        let dwell = sample
            .started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();
        if dwell < config.fast_submit {
            score -= config.fast_submit_penalty;
        } else if dwell > config.patient_dwell {
            score += config.patient_dwell_bonus;
        }

        if sample.keystroke_intervals_ms.len() >= config.min_keystroke_intervals {
            if let Some(variance) = sample.keystroke_variance() {
                if variance < config.uniform_typing_variance {
                    score -= config.uniform_typing_penalty;
                } else if variance > config.natural_typing_variance {
                    score += config.natural_typing_bonus;
                }
            }
        }

        if sample.pointer_moves == 0 {
            score -= config.no_pointer_penalty;
        } else if sample.pointer_moves > config.busy_pointer_moves {
            score += config.busy_pointer_bonus;
        }

        BehaviorScore::new(score)
    }
}

fn lock(inner: &Mutex<TrackerInner>) -> MutexGuard<'_, TrackerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct Registration {
    target: EventTarget,
    listeners: [ListenerId; 2],
    tracker: Arc<Mutex<TrackerInner>>,
}

/// Detaches the tracker's listeners when stopped or dropped
#[derive(Debug)]
#[must_use = "dropping the guard stops tracking immediately"]
pub struct TrackingGuard {
    registration: Option<Registration>,
}

impl TrackingGuard {
    fn inert() -> Self {
        Self { registration: None }
    }

    pub fn is_active(&self) -> bool {
        self.registration.is_some()
    }

    /// Idempotent
    pub fn stop(&mut self) {
        let Some(registration) = self.registration.take() else {
            return;
        };
        for id in registration.listeners {
            registration.target.remove_listener(id);
        }
        lock(&registration.tracker).state = TrackerState::Stopped;
        tracing::debug!("Behavior tracking stopped");
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::advance;

    fn tracker() -> BehaviorTracker {
        BehaviorTracker::new(BehaviorConfig::default())
    }

    async fn type_keys(target: &EventTarget, gaps_ms: &[u64]) {
        target.emit(EventKind::KeyDown);
        for gap in gaps_ms {
            advance(Duration::from_millis(*gap)).await;
            target.emit(EventKind::KeyDown);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_submit_without_input() {
        let target = EventTarget::new();
        let tracker = tracker();
        let _guard = tracker.start(&target);

        // -30 (fast) - 20 (no pointer)
        assert_eq!(tracker.score().value(), -50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_started_counts_as_zero_dwell() {
        let tracker = tracker();
        assert_eq!(tracker.state(), TrackerState::NotStarted);
        assert_eq!(tracker.score().value(), -50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_human_like_session() {
        let target = EventTarget::new();
        let tracker = tracker();
        let _guard = tracker.start(&target);

        type_keys(&target, &[120, 340, 90, 410, 200]).await;
        for _ in 0..15 {
            target.emit(EventKind::PointerMove);
        }
        advance(Duration::from_secs(6)).await;

        // +10 dwell, +10 variance, +10 pointer
        assert_eq!(tracker.score().value(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uniform_typing_is_penalized() {
        let target = EventTarget::new();
        let tracker = tracker();
        let _guard = tracker.start(&target);

        type_keys(&target, &[100, 100, 100, 100]).await;
        target.emit(EventKind::PointerMove);
        advance(Duration::from_secs(3)).await;

        // dwell neutral, -20 variance, pointer neutral
        assert_eq!(tracker.score().value(), -20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_too_few_intervals_are_ignored() {
        let target = EventTarget::new();
        let tracker = tracker();
        let _guard = tracker.start(&target);

        type_keys(&target, &[100, 100, 100]).await;
        target.emit(EventKind::PointerMove);
        advance(Duration::from_secs(3)).await;

        assert_eq!(tracker.score().value(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_detaches_listeners() {
        let target = EventTarget::new();
        let tracker = tracker();
        let mut guard = tracker.start(&target);
        assert!(guard.is_active());
        assert_eq!(target.listener_count(), 2);

        guard.stop();
        guard.stop();
        assert_eq!(target.listener_count(), 0);
        assert_eq!(tracker.state(), TrackerState::Stopped);

        for _ in 0..20 {
            target.emit(EventKind::PointerMove);
        }
        advance(Duration::from_secs(3)).await;
        // Pointer events after stop are not counted
        assert_eq!(tracker.score().value(), -20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_tracking() {
        let target = EventTarget::new();
        let tracker = tracker();
        {
            let _guard = tracker.start(&target);
            assert_eq!(target.listener_count(), 2);
        }
        assert_eq!(target.listener_count(), 0);
        assert_eq!(tracker.state(), TrackerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_inert() {
        let target = EventTarget::new();
        let tracker = tracker();
        let _guard = tracker.start(&target);

        let second = tracker.start(&target);
        assert!(!second.is_active());
        drop(second);
        assert_eq!(target.listener_count(), 2);
        assert_eq!(tracker.state(), TrackerState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_score_stays_in_range() {
        let heavy = BehaviorConfig {
            fast_submit_penalty: 500,
            patient_dwell_bonus: 500,
            uniform_typing_penalty: 500,
            natural_typing_bonus: 500,
            no_pointer_penalty: 500,
            busy_pointer_bonus: 500,
            ..Default::default()
        };
        let dwells = [0, 1, 2, 5, 6, 600].map(Duration::from_secs);
        let gap_sets: [&[u64]; 5] = [
            &[],
            &[100, 100, 100],
            &[100, 100, 100, 100],
            &[100, 101, 99, 100, 100],
            &[40, 900, 15, 1400, 300, 5],
        ];
        let move_counts = [0, 1, 10, 11, 500];

        for config in [BehaviorConfig::default(), heavy] {
            for dwell in dwells {
                for gaps in gap_sets {
                    for moves in move_counts {
                        let target = EventTarget::new();
                        let tracker = BehaviorTracker::new(config.clone());
                        let start = Instant::now();
                        let _guard = tracker.start(&target);

                        type_keys(&target, gaps).await;
                        for _ in 0..moves {
                            target.emit(EventKind::PointerMove);
                        }

                        let score = tracker.score_at(start + dwell).value();
                        assert!(
                            (BehaviorScore::MIN..=BehaviorScore::MAX).contains(&score),
                            "dwell={dwell:?} gaps={gaps:?} moves={moves}: {score}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_population_variance() {
        let sample = BehaviorSample {
            keystroke_intervals_ms: vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0],
            ..Default::default()
        };
        assert_eq!(sample.keystroke_variance(), Some(4.0));
        assert_eq!(BehaviorSample::default().keystroke_variance(), None);
    }
}
