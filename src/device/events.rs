//! Device event wire types
//! These cross from the IO thread into the simulation tick

use serde::{Deserialize, Serialize};

/// Physical buttons the simulation reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// Recenter button on the controller body
    Recenter,
    /// Trigger on the grip attachment
    Trigger,
}

/// One motion sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Roll angular rate (degrees per second)
    pub roll_rate: f32,
    /// Pitch angular rate (degrees per second)
    pub pitch_rate: f32,
    /// Vertical acceleration magnitude
    pub vertical_accel: f32,
    /// Sensor timestamp in milliseconds
    pub timestamp_ms: u64,
}

/// Events produced by the device IO thread, drained once per simulation tick
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// Button state changed
    ButtonEdge { button: Button, pressed: bool },

    /// Motion sensor reading
    Motion { sample: MotionSample },
}
