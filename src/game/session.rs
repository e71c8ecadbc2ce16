//! Game session: the host-facing facade
//!
//! Owns the gesture machine, round phase machine, target field and scoring
//! for one player. Device events cross from the IO thread through an
//! unbounded FIFO queue; only `tick` observes them, so everything downstream
//! of the queue stays single-threaded.

use tokio::sync::mpsc;
use tracing::warn;

use crate::config::{Config, TargetConfig};
use crate::device::{Button, DeviceEvent, MotionSample};
use crate::input::{AimState, GestureStateMachine, ShootState};
use crate::util::math::Vec3;

use super::events::{AudioCue, GameEvent, GameStats, TargetId, TargetRemoveReason};
use super::round::{RoundOrchestrator, RoundPhase};
use super::scoring::ScoringEngine;
use super::targets::{BoundsError, SpawnBounds, Target, TargetSpawner};

/// One player's simulation, advanced by the host at a fixed tick rate
pub struct GameSession {
    gesture: GestureStateMachine,
    round: RoundOrchestrator,
    spawner: TargetSpawner,
    scoring: ScoringEngine,

    target_config: TargetConfig,
    bounds: SpawnBounds,
    seed: u64,
    rounds_started: u32,

    final_stats: Option<GameStats>,

    device_tx: mpsc::UnboundedSender<DeviceEvent>,
    device_rx: mpsc::UnboundedReceiver<DeviceEvent>,
}

impl GameSession {
    /// Build a session. Bad spawn geometry is the one fatal startup error.
    pub fn new(config: &Config, bounds: SpawnBounds) -> Result<Self, BoundsError> {
        let (device_tx, device_rx) = mpsc::unbounded_channel();
        let spawner = TargetSpawner::new(config.targets.clone(), bounds.clone(), config.sim_seed)?;

        Ok(Self {
            gesture: GestureStateMachine::new(config.gesture.clone()),
            round: RoundOrchestrator::new(config.round.clone()),
            spawner,
            scoring: ScoringEngine::new(),
            target_config: config.targets.clone(),
            bounds,
            seed: config.sim_seed,
            rounds_started: 0,
            final_stats: None,
            device_tx,
            device_rx,
        })
    }

    /// Sender side of the device queue, for the IO thread
    pub fn device_sender(&self) -> mpsc::UnboundedSender<DeviceEvent> {
        self.device_tx.clone()
    }

    /// Enqueue a button edge. Processed on the next tick, in arrival order.
    pub fn on_button_edge(&self, button: Button, pressed: bool) {
        let _ = self.device_tx.send(DeviceEvent::ButtonEdge { button, pressed });
    }

    /// Enqueue a motion sample. Processed on the next tick, in arrival order.
    pub fn on_motion_sample(&self, sample: MotionSample) {
        let _ = self.device_tx.send(DeviceEvent::Motion { sample });
    }

    /// Begin a new round with fresh per-round state
    pub fn start_round(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if self.round.in_progress() {
            // The phase machine owns the complaint
            self.round.start_round(&mut events);
            return events;
        }

        self.rounds_started += 1;
        let seed = self.seed.wrapping_add(self.rounds_started as u64);
        self.scoring = ScoringEngine::new();
        self.spawner = TargetSpawner::new(self.target_config.clone(), self.bounds.clone(), seed)
            .expect("spawn bounds validated at session construction");
        self.final_stats = None;

        self.round.start_round(&mut events);
        events
    }

    /// Advance the simulation by one tick: drain the device queue, then the
    /// gesture machine, then the round and its target field. Returns the
    /// tick's events in occurrence order. Never fails for gameplay
    /// conditions.
    pub fn tick(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();

        self.process_device_events(&mut events);
        self.gesture.tick(dt, &mut events);

        let before = self.round.phase();
        self.round.tick(dt, &mut events);
        let after = self.round.phase();

        if after == RoundPhase::Active {
            let escaped = self.spawner.tick(dt, &mut events);
            for _ in 0..escaped {
                self.scoring.on_escape();
            }
        }

        if before == RoundPhase::Active && after != RoundPhase::Active {
            self.spawner.force_retire_all(&mut events);
        }

        if before != RoundPhase::Ended && after == RoundPhase::Ended {
            let stats = self.scoring.snapshot();
            self.final_stats = Some(stats);
            events.push(GameEvent::RoundEnded { stats });
        }

        events
    }

    /// The host resolved a released arrow against this target
    pub fn on_hit_resolved(&mut self, target_id: TargetId, contact_point: Vec3) -> Vec<GameEvent> {
        let mut events = Vec::new();

        match self
            .spawner
            .remove(target_id, TargetRemoveReason::Hit, &mut events)
        {
            Some(_) => {
                let scored = self.round.phase() == RoundPhase::Active;
                let bonus = self.scoring.on_hit(scored, &mut events);
                events.push(GameEvent::HitFeedback {
                    position: contact_point,
                    bonus,
                });
                events.push(GameEvent::Audio { cue: AudioCue::Hit });
            }
            None => {
                warn!(target_id = %target_id, "Hit resolution for unknown target");
            }
        }

        events
    }

    /// The host resolved a released arrow as a clean miss
    pub fn on_miss_resolved(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.scoring
            .on_miss(self.round.phase() == RoundPhase::Active, &mut events);
        events
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase()
    }

    pub fn time_remaining(&self) -> f32 {
        self.round.time_remaining()
    }

    pub fn aim(&self) -> AimState {
        self.gesture.aim()
    }

    pub fn shoot_state(&self) -> ShootState {
        self.gesture.state()
    }

    /// Targets currently in flight, for the host's rendering and hit tests
    pub fn targets(&self) -> &[Target] {
        self.spawner.targets()
    }

    /// Final statistics, present once the round has ended
    pub fn stats(&self) -> Option<GameStats> {
        self.final_stats
    }

    fn process_device_events(&mut self, events: &mut Vec<GameEvent>) {
        while let Ok(event) = self.device_rx.try_recv() {
            match event {
                DeviceEvent::ButtonEdge { button, pressed } => {
                    let fired = self.gesture.on_button_edge(button, pressed, events);
                    if fired && self.round.in_progress() {
                        events.push(GameEvent::Shot {
                            aim: self.gesture.aim(),
                        });
                        events.push(GameEvent::Audio {
                            cue: AudioCue::Shoot,
                        });
                    }
                }
                DeviceEvent::Motion { sample } => {
                    self.gesture.on_motion_sample(sample, events);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GestureConfig, RoundConfig};

    const DT: f32 = 0.25;

    fn test_config() -> Config {
        Config {
            log_level: "info".to_string(),
            sim_seed: 42,
            discovery: Default::default(),
            gesture: GestureConfig::default(),
            round: RoundConfig {
                duration_secs: 6.0,
                pre_countdown: 3,
                end_countdown: 2,
            },
            targets: TargetConfig::default(),
        }
    }

    fn session() -> GameSession {
        GameSession::new(&test_config(), SpawnBounds::default()).unwrap()
    }

    fn run_for(s: &mut GameSession, seconds: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let steps = (seconds / DT).round() as usize;
        for _ in 0..steps {
            events.extend(s.tick(DT));
        }
        events
    }

    fn quick_shot(s: &mut GameSession, base_ms: u64) -> Vec<GameEvent> {
        s.on_button_edge(Button::Trigger, true);
        s.on_motion_sample(MotionSample {
            roll_rate: 0.0,
            pitch_rate: 0.0,
            vertical_accel: 0.0,
            timestamp_ms: base_ms,
        });
        s.on_motion_sample(MotionSample {
            roll_rate: 0.0,
            pitch_rate: 0.0,
            vertical_accel: 150.0,
            timestamp_ms: base_ms + 10,
        });
        s.on_motion_sample(MotionSample {
            roll_rate: 0.0,
            pitch_rate: 0.0,
            vertical_accel: 100.0,
            timestamp_ms: base_ms + 20,
        });
        s.on_button_edge(Button::Trigger, false);
        s.tick(DT)
    }

    #[test]
    fn round_runs_to_completion_and_reports_once() {
        let mut s = session();
        s.start_round();
        let events = run_for(&mut s, 12.0);

        assert_eq!(s.phase(), RoundPhase::Ended);
        let ended = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RoundEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert!(s.stats().is_some());
    }

    #[test]
    fn targets_appear_only_while_active() {
        let mut s = session();
        assert!(s.targets().is_empty());

        s.start_round();
        run_for(&mut s, 2.0);
        assert_eq!(s.phase(), RoundPhase::PreCountdown);
        assert!(s.targets().is_empty());

        run_for(&mut s, 2.0);
        assert_eq!(s.phase(), RoundPhase::Active);
        assert!(s.targets().len() >= 2);
    }

    #[test]
    fn field_is_swept_when_active_ends() {
        let mut s = session();
        s.start_round();
        // Into the post countdown: 3 s pre + 4 s active
        let events = run_for(&mut s, 7.5);
        assert_eq!(s.phase(), RoundPhase::PostCountdown);
        assert!(s.targets().is_empty());

        let swept = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::TargetRemoved {
                        reason: TargetRemoveReason::RoundEnd,
                        ..
                    }
                )
            })
            .count();
        assert!(swept >= 2);
    }

    #[test]
    fn releases_outside_a_round_do_not_shoot() {
        let mut s = session();
        let events = quick_shot(&mut s, 1000);

        assert!(!events.iter().any(|e| matches!(e, GameEvent::Shot { .. })));
        // The gesture machine itself still ran its course
        assert_eq!(s.shoot_state(), ShootState::NotShooting);
    }

    #[test]
    fn releases_during_a_round_shoot() {
        let mut s = session();
        s.start_round();
        run_for(&mut s, 4.0);
        assert_eq!(s.phase(), RoundPhase::Active);

        let events = quick_shot(&mut s, 1000);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Shot { .. })));
    }

    #[test]
    fn hit_resolution_scores_and_removes_the_target() {
        let mut s = session();
        s.start_round();
        run_for(&mut s, 4.0);
        assert_eq!(s.phase(), RoundPhase::Active);

        let target = s.targets()[0].clone();
        let before = s.targets().len();
        let events = s.on_hit_resolved(target.id, target.position);

        assert_eq!(s.targets().len(), before - 1);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::TargetRemoved {
                reason: TargetRemoveReason::Hit,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::HitFeedback { bonus: 1, .. })));

        run_for(&mut s, 8.0);
        let stats = s.stats().unwrap();
        assert_eq!(stats.shots_hit, 1);
        assert_eq!(stats.targets_hit, 1);
        assert_eq!(stats.score, 1);
    }

    #[test]
    fn unknown_target_hit_is_ignored() {
        let mut s = session();
        s.start_round();
        run_for(&mut s, 4.0);

        let events = s.on_hit_resolved(TargetId(9999), Vec3::ZERO);
        assert!(events.is_empty());
    }

    #[test]
    fn device_queue_preserves_arrival_order() {
        let mut s = session();
        s.start_round();
        run_for(&mut s, 4.0);

        // Press, pull, settle, release all queued before one tick
        let events = quick_shot(&mut s, 1000);
        let states: Vec<ShootState> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CrosshairChanged { state } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                ShootState::Loading,
                ShootState::Drawing,
                ShootState::Ready,
                ShootState::NotShooting,
            ]
        );
    }

    #[test]
    fn second_round_starts_fresh() {
        let mut s = session();
        s.start_round();
        run_for(&mut s, 4.0);
        let target = s.targets()[0].clone();
        s.on_hit_resolved(target.id, target.position);
        run_for(&mut s, 8.0);
        assert!(s.stats().unwrap().score > 0);

        s.start_round();
        assert_eq!(s.phase(), RoundPhase::PreCountdown);
        assert!(s.stats().is_none());
        assert!(s.targets().is_empty());

        let events = run_for(&mut s, 12.0);
        let stats = s.stats().unwrap();
        assert_eq!(stats.score, 0);
        assert_eq!(stats.shots_total, 0);
        let ended = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RoundEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }
}
