//! Ball simulation module
//!
//! Everything that moves a ball lives here. Frame-stepped and deterministic:
//! - One `tick` per ball per rendered frame
//! - Terrain is read-only and shared between players
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::{Axis, is_climbable, radius_edge_blocked, reflect_velocity};
pub use state::{Ball, FinishZone, Level, grounded_spawn};
pub use terrain::{Heightmap, TerrainError, TerrainSample, TerrainSampler};
pub use tick::{BallInput, apply_friction, clamp_speed, tick};
