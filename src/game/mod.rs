//! Game simulation modules

pub mod events;
pub mod round;
pub mod scoring;
pub mod session;
pub mod targets;

pub use events::{AudioCue, GameEvent, GameStats, TargetId, TargetRemoveReason};
pub use round::{CountdownKind, RoundOrchestrator, RoundPhase};
pub use scoring::ScoringEngine;
pub use session::GameSession;
pub use targets::{BoundsError, SpawnBounds, Target, TargetSpawner};
