//! Game event definitions
//! These are the outward-facing types a host (renderer, audio, UI) consumes

use serde::{Deserialize, Serialize};

use crate::input::{AimState, ShootState};
use crate::util::math::Vec3;

use super::round::{CountdownKind, RoundPhase};

/// Stable identifier for a target in the field. Allocated once per spawn,
/// never reused within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u32);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a target left the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRemoveReason {
    /// Struck by an arrow
    Hit,
    /// Flew past the player unharmed
    Escaped,
    /// Cleared when the round left its active phase
    RoundEnd,
}

/// Sound cues for the host's audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Shoot,
    Hit,
    TargetSpawn,
    CountdownTick,
    CountdownEnd,
    RoundEnd,
}

/// Events emitted by the simulation tick, in occurrence order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Round phase transition
    PhaseChanged { phase: RoundPhase },

    /// A countdown presented a new count
    CountdownTick { kind: CountdownKind, count: u32 },

    /// A countdown reached zero
    CountdownFinished { kind: CountdownKind },

    /// Gesture state changed, drives the crosshair visual
    CrosshairChanged { state: ShootState },

    /// Controller should rumble for this many milliseconds
    HapticPulse { millis: u32 },

    /// An arrow was released with this aim
    Shot { aim: AimState },

    /// Target entered the field
    TargetSpawned { id: TargetId, position: Vec3 },

    /// Target left the field
    TargetRemoved {
        id: TargetId,
        reason: TargetRemoveReason,
    },

    /// Visual feedback at the impact point
    HitFeedback { position: Vec3, bonus: u32 },

    /// Score or streak bonus changed
    ScoreChanged { score: u32, bonus: u32 },

    /// Whole seconds left in the scored round
    TimeRemaining { seconds: u32 },

    /// Round is over, final statistics attached
    RoundEnded { stats: GameStats },

    /// Play a sound
    Audio { cue: AudioCue },
}

/// Final statistics for a finished round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub score: u32,
    pub shots_hit: u32,
    pub shots_total: u32,
    pub targets_hit: u32,
    pub targets_total: u32,
}

impl GameStats {
    /// Fraction of shots that connected, 0.0 when no shots were taken
    pub fn accuracy(&self) -> f32 {
        if self.shots_total == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_total as f32
        }
    }

    /// Fraction of presented targets that were hit, 0.0 when none appeared
    pub fn percent_targets_hit(&self) -> f32 {
        if self.targets_total == 0 {
            0.0
        } else {
            self.targets_hit as f32 / self.targets_total as f32
        }
    }

    /// Composite 1-12 rating shown on the end screen
    pub fn training_score(&self) -> u32 {
        ((self.accuracy() * self.percent_targets_hit()).sqrt() * 11.0 + 1.0).round() as u32
    }
}
