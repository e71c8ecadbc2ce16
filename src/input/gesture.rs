//! Draw-and-release gesture recognition
//!
//! Classifies the continuous motion stream into discrete shooting states and
//! integrates angular rates into the aim accumulators. The machine is
//! advanced from the simulation tick and fed button edges and motion samples
//! drained from the device queue.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GestureConfig;
use crate::device::{Button, MotionSample};
use crate::game::events::GameEvent;

/// Discrete shooting state, drives the crosshair visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShootState {
    /// Trigger up, nothing nocked
    NotShooting,
    /// Trigger held, arrow nocked, waiting for the draw pull
    Loading,
    /// Pull recognized, arm still moving
    Drawing,
    /// Draw settled, release will fire
    Ready,
}

/// Accumulated aim angles in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AimState {
    pub roll: f32,
    pub pitch: f32,
}

/// Gesture state machine over trigger edges and motion samples
pub struct GestureStateMachine {
    config: GestureConfig,
    state: ShootState,
    aim: AimState,
    /// Simulation clock, advanced by `tick`
    clock: f32,
    /// Clock value when loading began
    loading_since: Option<f32>,
    /// Timestamp of the last accepted motion sample
    last_sample_ms: Option<u64>,
    recenter_held: bool,
}

impl GestureStateMachine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: ShootState::NotShooting,
            aim: AimState::default(),
            clock: 0.0,
            loading_since: None,
            last_sample_ms: None,
            recenter_held: false,
        }
    }

    pub fn state(&self) -> ShootState {
        self.state
    }

    pub fn aim(&self) -> AimState {
        self.aim
    }

    /// Advance the machine by one tick. Forces the ready state if a draw has
    /// been pending longer than the timeout, so a too-gentle pull still fires.
    pub fn tick(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.clock += dt;

        if matches!(self.state, ShootState::Loading | ShootState::Drawing) {
            if let Some(since) = self.loading_since {
                if self.clock - since >= self.config.ready_timeout_secs {
                    self.set_state(ShootState::Ready, events);
                }
            }
        }
    }

    /// Feed one motion sample: integrate aim, then run threshold transitions.
    /// Samples with non-increasing timestamps are discarded whole.
    pub fn on_motion_sample(&mut self, sample: MotionSample, events: &mut Vec<GameEvent>) {
        match self.last_sample_ms {
            None => {
                // First sample only establishes the time base
                self.last_sample_ms = Some(sample.timestamp_ms);
                return;
            }
            Some(last) => {
                if sample.timestamp_ms <= last {
                    debug!(
                        timestamp_ms = sample.timestamp_ms,
                        last_ms = last,
                        "Discarding non-monotonic motion sample"
                    );
                    return;
                }
                let dt = (sample.timestamp_ms - last) as f32 / 1000.0;
                self.last_sample_ms = Some(sample.timestamp_ms);

                self.aim.roll += sample.roll_rate * dt;
                self.aim.pitch += sample.pitch_rate * dt;
            }
        }

        match self.state {
            ShootState::Loading if sample.vertical_accel > self.config.draw_threshold => {
                self.set_state(ShootState::Drawing, events);
            }
            ShootState::Drawing if sample.vertical_accel < self.config.ready_threshold => {
                self.set_state(ShootState::Ready, events);
            }
            _ => {}
        }
    }

    /// Feed one button edge. Returns true when the edge released an arrow;
    /// the caller owns what happens to the shot.
    pub fn on_button_edge(
        &mut self,
        button: Button,
        pressed: bool,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        match button {
            Button::Trigger => self.on_trigger(pressed, events),
            Button::Recenter => {
                self.on_recenter(pressed, events);
                false
            }
        }
    }

    fn on_trigger(&mut self, pressed: bool, events: &mut Vec<GameEvent>) -> bool {
        if pressed {
            if self.state == ShootState::NotShooting {
                self.loading_since = Some(self.clock);
                self.set_state(ShootState::Loading, events);
            }
            return false;
        }

        match self.state {
            ShootState::Ready => {
                self.set_state(ShootState::NotShooting, events);
                true
            }
            ShootState::Loading | ShootState::Drawing => {
                // Released before the draw settled, the arrow is not loosed
                self.set_state(ShootState::NotShooting, events);
                false
            }
            ShootState::NotShooting => false,
        }
    }

    fn on_recenter(&mut self, pressed: bool, events: &mut Vec<GameEvent>) {
        if !pressed {
            self.recenter_held = false;
            return;
        }
        if self.recenter_held {
            return;
        }
        self.recenter_held = true;
        self.aim = AimState::default();
        events.push(GameEvent::HapticPulse {
            millis: self.config.rumble_millis,
        });
        debug!("Crosshair recentered");
    }

    fn set_state(&mut self, next: ShootState, events: &mut Vec<GameEvent>) {
        if self.state == next {
            return;
        }
        self.state = next;
        if next == ShootState::NotShooting {
            self.loading_since = None;
        }
        events.push(GameEvent::CrosshairChanged { state: next });
    }
}
