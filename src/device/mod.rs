//! Wireless motion controller: discovery and event types

pub mod discovery;
pub mod events;

pub use discovery::{DeviceDiscovery, DiscoveryError, DiscoveryHandle};
pub use events::{Button, DeviceEvent, MotionSample};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for a discovered controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A discovered motion controller. Owned by discovery until returned,
/// read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Core controller link is up
    pub core_connected: bool,
    /// Grip attachment (trigger) is plugged in
    pub attachment_connected: bool,
    /// Motion extension is reporting
    pub motion_ext_connected: bool,
}

impl Device {
    pub fn connected(id: DeviceId) -> Self {
        Self {
            id,
            core_connected: true,
            attachment_connected: true,
            motion_ext_connected: true,
        }
    }
}

/// Hardware seam for the wireless radio
pub trait Radio: Send + Sync {
    /// Begin advertising/listening for controllers
    fn start_scan(&self);
    /// Stop the current scan
    fn stop_scan(&self);
    /// Light the indicator on a found controller
    fn acknowledge(&self, device: &Device);
}
