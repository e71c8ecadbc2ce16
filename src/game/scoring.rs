//! Streak scoring and round statistics

use tracing::debug;

use super::events::{GameEvent, GameStats};

/// Streak bonus is capped here, a long run of hits keeps paying this much
const BONUS_MAX: u32 = 5;

/// Accumulates score and counters for one round. Built fresh per round.
#[derive(Debug, Default)]
pub struct ScoringEngine {
    score: u32,
    bonus: u32,
    shots_hit: u32,
    shots_total: u32,
    targets_hit: u32,
    targets_total: u32,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn bonus(&self) -> u32 {
        self.bonus
    }

    /// An arrow struck a target. The streak bonus grows before it is paid,
    /// so the first hit of a streak is worth 1. Counters only move while the
    /// round is scored.
    pub fn on_hit(&mut self, scored: bool, events: &mut Vec<GameEvent>) -> u32 {
        self.bonus = (self.bonus + 1).min(BONUS_MAX);
        self.score += self.bonus;

        if scored {
            self.shots_hit += 1;
            self.shots_total += 1;
            self.targets_hit += 1;
            self.targets_total += 1;
        }

        events.push(GameEvent::ScoreChanged {
            score: self.score,
            bonus: self.bonus,
        });
        debug!(score = self.score, bonus = self.bonus, "Hit scored");
        self.bonus
    }

    /// An arrow flew wide. The streak resets.
    pub fn on_miss(&mut self, scored: bool, events: &mut Vec<GameEvent>) {
        self.bonus = 0;
        if scored {
            self.shots_total += 1;
        }
        events.push(GameEvent::ScoreChanged {
            score: self.score,
            bonus: self.bonus,
        });
    }

    /// A target escaped past the player. It still counts as presented.
    pub fn on_escape(&mut self) {
        self.targets_total += 1;
    }

    pub fn snapshot(&self) -> GameStats {
        GameStats {
            score: self.score,
            shots_hit: self.shots_hit,
            shots_total: self.shots_total,
            targets_hit: self.targets_hit,
            targets_total: self.targets_total,
        }
    }
}
