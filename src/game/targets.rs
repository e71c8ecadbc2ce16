//! Target field: spawning, motion, escape
//!
//! Targets fly from a far spawn volume toward a near exit plane. The field
//! keeps its population between a minimum and a maximum while the round is
//! active: a random cadence adds targets up to the maximum, and a per-tick
//! backfill never lets the field drop below the minimum.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::TargetConfig;
use crate::util::math::Vec3;

use super::events::{AudioCue, GameEvent, TargetId, TargetRemoveReason};

/// Spawn and flight geometry supplied by the host's scene
#[derive(Debug, Clone)]
pub struct SpawnBounds {
    /// Spawn volume, far side of the field. Depth must stay behind z = 0.
    pub start_x_min: f32,
    pub start_x_max: f32,
    pub start_y_min: f32,
    pub start_y_max: f32,
    pub start_z_min: f32,
    pub start_z_max: f32,
    /// Flight end plane: targets head for x = ±end_x at z = 0
    pub end_x: f32,
    pub end_y_min: f32,
    pub end_y_max: f32,
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self {
            start_x_min: -15.0,
            start_x_max: 15.0,
            start_y_min: 2.0,
            start_y_max: 10.0,
            start_z_min: -40.0,
            start_z_max: -30.0,
            end_x: 20.0,
            end_y_min: 2.0,
            end_y_max: 8.0,
        }
    }
}

impl SpawnBounds {
    fn validate(&self) -> Result<(), BoundsError> {
        if self.start_x_min > self.start_x_max {
            return Err(BoundsError::EmptyRange("start_x"));
        }
        if self.start_y_min > self.start_y_max {
            return Err(BoundsError::EmptyRange("start_y"));
        }
        if self.start_z_min > self.start_z_max {
            return Err(BoundsError::EmptyRange("start_z"));
        }
        if self.end_y_min > self.end_y_max {
            return Err(BoundsError::EmptyRange("end_y"));
        }
        if self.start_z_max >= 0.0 {
            return Err(BoundsError::SpawnDepthNotBehindExit);
        }
        Ok(())
    }
}

/// Spawn geometry errors, fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum BoundsError {
    #[error("empty spawn range: {0}")]
    EmptyRange(&'static str),

    #[error("spawn depth must lie behind the flight end plane")]
    SpawnDepthNotBehindExit,
}

/// A target in flight
#[derive(Debug, Clone)]
pub struct Target {
    pub id: TargetId,
    pub start: Vec3,
    pub end: Vec3,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Field clock value at spawn
    pub spawn_time: f32,
}

/// Owns the target field for one round
pub struct TargetSpawner {
    config: TargetConfig,
    bounds: SpawnBounds,
    rng: ChaCha8Rng,
    targets: Vec<Target>,
    next_id: u32,
    /// Seconds until the next cadence spawn
    spawn_timer: f32,
    clock: f32,
}

impl TargetSpawner {
    pub fn new(config: TargetConfig, bounds: SpawnBounds, seed: u64) -> Result<Self, BoundsError> {
        bounds.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let spawn_timer = rng.gen_range(config.spawn_wait_min..=config.spawn_wait_max);
        Ok(Self {
            config,
            bounds,
            rng,
            targets: Vec::new(),
            next_id: 0,
            spawn_timer,
            clock: 0.0,
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn count(&self) -> usize {
        self.targets.len()
    }

    /// Advance the field by one tick while the round is active. Returns how
    /// many targets escaped past the exit plane this tick.
    pub fn tick(&mut self, dt: f32, events: &mut Vec<GameEvent>) -> u32 {
        self.clock += dt;

        for target in &mut self.targets {
            target.position = target.position.add(target.velocity.scale(dt));
        }

        // Escapes first, so the backfill below sees the emptied slots
        let escape_depth = self.config.escape_depth;
        let mut escaped = 0u32;
        let mut idx = 0;
        while idx < self.targets.len() {
            if self.targets[idx].position.z >= escape_depth {
                let target = self.targets.remove(idx);
                debug!(target_id = %target.id, "Target escaped");
                events.push(GameEvent::TargetRemoved {
                    id: target.id,
                    reason: TargetRemoveReason::Escaped,
                });
                escaped += 1;
            } else {
                idx += 1;
            }
        }

        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            if self.targets.len() < self.config.max_targets {
                self.spawn(events);
            }
            self.spawn_timer = self
                .rng
                .gen_range(self.config.spawn_wait_min..=self.config.spawn_wait_max);
        }

        while self.targets.len() < self.config.min_targets {
            self.spawn(events);
        }

        escaped
    }

    /// Take a target out of the field, for a hit or the end-of-round sweep
    pub fn remove(
        &mut self,
        id: TargetId,
        reason: TargetRemoveReason,
        events: &mut Vec<GameEvent>,
    ) -> Option<Target> {
        let idx = self.targets.iter().position(|t| t.id == id)?;
        let target = self.targets.remove(idx);
        events.push(GameEvent::TargetRemoved { id, reason });
        Some(target)
    }

    /// Sweep the field when the round leaves its active phase. No counters
    /// move for these.
    pub fn force_retire_all(&mut self, events: &mut Vec<GameEvent>) {
        for target in self.targets.drain(..) {
            events.push(GameEvent::TargetRemoved {
                id: target.id,
                reason: TargetRemoveReason::RoundEnd,
            });
        }
    }

    fn spawn(&mut self, events: &mut Vec<GameEvent>) {
        let b = &self.bounds;
        let start = Vec3::new(
            self.rng.gen_range(b.start_x_min..=b.start_x_max),
            self.rng.gen_range(b.start_y_min..=b.start_y_max),
            self.rng.gen_range(b.start_z_min..=b.start_z_max),
        );

        let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let end = Vec3::new(
            side * b.end_x,
            self.rng.gen_range(b.end_y_min..=b.end_y_max),
            0.0,
        );

        let velocity = end.sub(start).normalized().scale(self.config.speed);

        let id = TargetId(self.next_id);
        self.next_id += 1;

        debug!(target_id = %id, x = start.x, y = start.y, z = start.z, "Target spawned");
        self.targets.push(Target {
            id,
            start,
            end,
            position: start,
            velocity,
            spawn_time: self.clock,
        });

        events.push(GameEvent::TargetSpawned {
            id,
            position: start,
        });
        events.push(GameEvent::Audio {
            cue: AudioCue::TargetSpawn,
        });
    }
}
