//! Heightmap Roll - a two-player ball rolling game over heightmap terrain
//!
//! Core modules:
//! - `sim`: Per-frame ball movement and terrain collision
//! - `session`: Menu / level / finish state machine
//! - `levels`: Level descriptors and terrain loading
//! - `settings`: Tunable physics configuration
//! - `input`: Device fusion behind the normalized per-player input
//! - `camera`: Follow camera and split-screen viewports
//! - `ui`: Menu button hit-testing

pub mod camera;
pub mod input;
pub mod levels;
pub mod session;
pub mod settings;
pub mod sim;
pub mod ui;

pub use levels::{LevelError, LevelPack, LevelSource};
pub use session::{FrameInput, GamePhase, MenuTarget, Session, SessionEvent};
pub use settings::{PhysicsPreset, PhysicsSettings, Settings};

/// Default tuning constants
pub mod consts {
    /// Ball radius; keeps the ball above the ground and drives the roll angle
    pub const SPHERE_RADIUS: f32 = 12.0;
    /// Horizontal velocity gained per frame at full forward/strafe input
    pub const MOVE_ACCEL: f32 = 1.0;
    /// Maximum horizontal speed per axis (units/frame)
    pub const MAX_HORIZONTAL_SPEED: f32 = 20.0;
    /// Yaw change per frame at full turn input (radians)
    pub const TURN_SPEED: f32 = 0.025;
    /// Fraction of horizontal velocity removed per frame
    pub const FRICTION: f32 = 0.05;
    /// Velocity components below this snap to zero
    pub const VELOCITY_DEADBAND: f32 = 0.05;
    /// Downward acceleration while falling (units/frame²)
    pub const GRAVITY: f32 = 0.2;
    /// Upward acceleration while jumping (units/frame²)
    pub const JUMP_ACCEL: f32 = 0.2;
    /// Jump ceiling above take-off height, in ball radii
    pub const JUMP_RISE_MULTIPLE: f32 = 4.0;
    /// Steepest climbable slope: angle between surface normal and up (radians)
    pub const WALL_CLIMB_ANGLE: f32 = 0.4;

    /// Seconds a hand cursor must hover over a button to activate it
    pub const HAND_DWELL_SECS: f64 = 3.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Sign of `v` as -1, 0 or 1 (`f32::signum` maps 0.0 to 1.0)
#[inline]
pub fn sign_or_zero(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
