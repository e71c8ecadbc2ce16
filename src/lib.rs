//! Archery trainer simulation core
//!
//! Interactive target-shooting driven by a handheld motion controller. The
//! crate covers:
//! - discovery of the wireless controller (bounded, cancellable)
//! - draw-and-release gesture recognition over the motion stream
//! - the round lifecycle: countdowns, target field, streak scoring, stats
//!
//! Rendering, audio and scene geometry belong to the host, which drives
//! [`game::GameSession::tick`] at a fixed rate and consumes the emitted
//! [`game::GameEvent`]s.

pub mod config;
pub mod device;
pub mod game;
pub mod input;
pub mod util;
