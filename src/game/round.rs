//! Round phase machine and countdown handling

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RoundConfig;

use super::events::{AudioCue, GameEvent};

/// Round phase, strictly forward within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// No round running
    Idle,
    /// Counting down to the start
    PreCountdown,
    /// Scored play
    Active,
    /// Final seconds, counting down to the end
    PostCountdown,
    /// Round over, stats frozen
    Ended,
}

/// Which countdown is presenting counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownKind {
    PreRound,
    RoundEnd,
}

/// Whole-second countdown. Presents its initial count immediately, then one
/// count per elapsed second, carrying fractional remainders across ticks.
struct Countdown {
    kind: CountdownKind,
    count: u32,
    acc: f32,
}

impl Countdown {
    fn start(kind: CountdownKind, count: u32, events: &mut Vec<GameEvent>) -> Self {
        events.push(GameEvent::CountdownTick { kind, count });
        events.push(GameEvent::Audio {
            cue: AudioCue::CountdownTick,
        });
        Self {
            kind,
            count,
            acc: 0.0,
        }
    }

    /// Returns true exactly once, when the count reaches zero
    fn tick(&mut self, dt: f32, events: &mut Vec<GameEvent>) -> bool {
        self.acc += dt;
        while self.acc >= 1.0 && self.count > 0 {
            self.acc -= 1.0;
            self.count -= 1;

            if self.count == 0 {
                events.push(GameEvent::CountdownFinished { kind: self.kind });
                events.push(GameEvent::Audio {
                    cue: AudioCue::CountdownEnd,
                });
                return true;
            }

            events.push(GameEvent::CountdownTick {
                kind: self.kind,
                count: self.count,
            });
            events.push(GameEvent::Audio {
                cue: AudioCue::CountdownTick,
            });
        }
        false
    }
}

/// Drives the phase machine for one round at a time
pub struct RoundOrchestrator {
    config: RoundConfig,
    phase: RoundPhase,
    /// Seconds since the active phase began
    elapsed: f32,
    countdown: Option<Countdown>,
    last_whole_seconds: u32,
}

impl RoundOrchestrator {
    pub fn new(config: RoundConfig) -> Self {
        Self {
            config,
            phase: RoundPhase::Idle,
            elapsed: 0.0,
            countdown: None,
            last_whole_seconds: 0,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// A round is running, from the first countdown to the last
    pub fn in_progress(&self) -> bool {
        matches!(
            self.phase,
            RoundPhase::PreCountdown | RoundPhase::Active | RoundPhase::PostCountdown
        )
    }

    /// Seconds left in the scored round
    pub fn time_remaining(&self) -> f32 {
        match self.phase {
            RoundPhase::Idle | RoundPhase::PreCountdown => self.config.duration_secs,
            RoundPhase::Active | RoundPhase::PostCountdown => {
                (self.config.duration_secs - self.elapsed).max(0.0)
            }
            RoundPhase::Ended => 0.0,
        }
    }

    /// Begin a round. Valid from idle or after a finished round; calling it
    /// mid-round is a caller bug.
    pub fn start_round(&mut self, events: &mut Vec<GameEvent>) {
        if !matches!(self.phase, RoundPhase::Idle | RoundPhase::Ended) {
            debug_assert!(false, "start_round while {:?}", self.phase);
            warn!(phase = ?self.phase, "Ignoring start_round mid-round");
            return;
        }

        self.elapsed = 0.0;
        self.countdown = Some(Countdown::start(
            CountdownKind::PreRound,
            self.config.pre_countdown,
            events,
        ));
        self.set_phase(RoundPhase::PreCountdown, events);
        info!("Round starting");
    }

    /// Advance the phase machine by one tick
    pub fn tick(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        match self.phase {
            RoundPhase::Idle | RoundPhase::Ended => {}
            RoundPhase::PreCountdown => {
                let finished = self
                    .countdown
                    .as_mut()
                    .map(|c| c.tick(dt, events))
                    .unwrap_or(false);
                if finished {
                    self.countdown = None;
                    self.elapsed = 0.0;
                    self.set_phase(RoundPhase::Active, events);
                    self.last_whole_seconds = self.config.duration_secs.ceil() as u32;
                    events.push(GameEvent::TimeRemaining {
                        seconds: self.last_whole_seconds,
                    });
                    info!("Round active");
                }
            }
            RoundPhase::Active => {
                self.elapsed += dt;
                self.emit_time_remaining(events);

                let post_at = self.config.duration_secs - self.config.end_countdown as f32;
                if self.elapsed >= post_at {
                    self.countdown = Some(Countdown::start(
                        CountdownKind::RoundEnd,
                        self.config.end_countdown,
                        events,
                    ));
                    self.set_phase(RoundPhase::PostCountdown, events);
                }
            }
            RoundPhase::PostCountdown => {
                self.elapsed += dt;
                self.emit_time_remaining(events);

                let finished = self
                    .countdown
                    .as_mut()
                    .map(|c| c.tick(dt, events))
                    .unwrap_or(false);
                if finished {
                    self.countdown = None;
                    self.set_phase(RoundPhase::Ended, events);
                    events.push(GameEvent::Audio {
                        cue: AudioCue::RoundEnd,
                    });
                    info!("Round ended");
                }
            }
        }
    }

    fn emit_time_remaining(&mut self, events: &mut Vec<GameEvent>) {
        let whole = self.time_remaining().ceil() as u32;
        if whole != self.last_whole_seconds {
            self.last_whole_seconds = whole;
            events.push(GameEvent::TimeRemaining { seconds: whole });
        }
    }

    fn set_phase(&mut self, next: RoundPhase, events: &mut Vec<GameEvent>) {
        self.phase = next;
        events.push(GameEvent::PhaseChanged { phase: next });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> RoundConfig {
        RoundConfig {
            duration_secs: 6.0,
            pre_countdown: 3,
            end_countdown: 2,
        }
    }

    fn run_for(orchestrator: &mut RoundOrchestrator, seconds: f32, events: &mut Vec<GameEvent>) {
        let dt = 0.25;
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            orchestrator.tick(dt, events);
        }
    }

    #[test]
    fn pre_countdown_takes_its_full_count() {
        let mut r = RoundOrchestrator::new(short_config());
        let mut events = Vec::new();

        r.start_round(&mut events);
        assert_eq!(r.phase(), RoundPhase::PreCountdown);

        run_for(&mut r, 2.75, &mut events);
        assert_eq!(r.phase(), RoundPhase::PreCountdown);

        r.tick(0.25, &mut events);
        assert_eq!(r.phase(), RoundPhase::Active);
    }

    #[test]
    fn phases_run_in_order_to_the_end() {
        let mut r = RoundOrchestrator::new(short_config());
        let mut events = Vec::new();

        r.start_round(&mut events);
        // 3 s pre + 4 s active + 2 s post, with slack
        run_for(&mut r, 10.0, &mut events);
        assert_eq!(r.phase(), RoundPhase::Ended);

        let phases: Vec<RoundPhase> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::PhaseChanged { phase } => Some(*phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                RoundPhase::PreCountdown,
                RoundPhase::Active,
                RoundPhase::PostCountdown,
                RoundPhase::Ended,
            ]
        );
    }

    #[test]
    fn countdowns_present_every_count_once() {
        let mut r = RoundOrchestrator::new(short_config());
        let mut events = Vec::new();

        r.start_round(&mut events);
        run_for(&mut r, 10.0, &mut events);

        let pre: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CountdownTick {
                    kind: CountdownKind::PreRound,
                    count,
                } => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(pre, vec![3, 2, 1]);

        let end: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CountdownTick {
                    kind: CountdownKind::RoundEnd,
                    count,
                } => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(end, vec![2, 1]);

        let finished: Vec<CountdownKind> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CountdownFinished { kind } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(finished, vec![CountdownKind::PreRound, CountdownKind::RoundEnd]);
    }

    #[test]
    fn time_remaining_counts_down_whole_seconds() {
        let mut r = RoundOrchestrator::new(short_config());
        let mut events = Vec::new();

        r.start_round(&mut events);
        run_for(&mut r, 10.0, &mut events);

        let seconds: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::TimeRemaining { seconds } => Some(*seconds),
                _ => None,
            })
            .collect();
        assert_eq!(seconds, vec![6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(r.time_remaining(), 0.0);
    }

    #[test]
    fn post_countdown_starts_at_the_final_stretch() {
        let mut r = RoundOrchestrator::new(short_config());
        let mut events = Vec::new();

        r.start_round(&mut events);
        run_for(&mut r, 3.0, &mut events);
        assert_eq!(r.phase(), RoundPhase::Active);

        // duration 6 minus end count 2: the switch lands at 4 s of play
        run_for(&mut r, 3.75, &mut events);
        assert_eq!(r.phase(), RoundPhase::Active);
        r.tick(0.25, &mut events);
        assert_eq!(r.phase(), RoundPhase::PostCountdown);
    }

    #[test]
    fn round_can_restart_after_ending() {
        let mut r = RoundOrchestrator::new(short_config());
        let mut events = Vec::new();

        r.start_round(&mut events);
        run_for(&mut r, 10.0, &mut events);
        assert_eq!(r.phase(), RoundPhase::Ended);

        r.start_round(&mut events);
        assert_eq!(r.phase(), RoundPhase::PreCountdown);
        assert_eq!(r.time_remaining(), short_config().duration_secs);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "start_round while")]
    fn starting_mid_round_is_a_caller_bug() {
        let mut r = RoundOrchestrator::new(short_config());
        let mut events = Vec::new();

        r.start_round(&mut events);
        r.start_round(&mut events);
    }
}
