//! Player input interpretation

pub mod gesture;

pub use gesture::{AimState, GestureStateMachine, ShootState};
