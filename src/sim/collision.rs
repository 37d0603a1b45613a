//! Terrain contact tests and velocity response
//!
//! Walls and map edges are resolved one axis at a time: a sample point offset along X
//! only tells us whether the X displacement caused the contact, and the
//! velocity is mirrored on that axis so the ball slides along the obstacle.

use glam::Vec3;

use super::terrain::{TerrainSample, TerrainSampler};
use crate::sign_or_zero;

/// Horizontal axis responsible for a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Z,
}

/// Whether a surface is gentle enough to roll up
#[inline]
pub fn is_climbable(sample: &TerrainSample, wall_angle_threshold: f32) -> bool {
    sample.slope_angle() < wall_angle_threshold
}

/// Mirror the velocity component along `axis`
#[inline]
pub fn reflect_velocity(velocity: Vec3, axis: Axis) -> Vec3 {
    match axis {
        Axis::X => Vec3::new(-velocity.x, velocity.y, velocity.z),
        Axis::Z => Vec3::new(velocity.x, velocity.y, -velocity.z),
    }
}

/// Axis that carried the ball off the terrain
///
/// If moving by the X delta alone already leaves the map, X is to blame.
pub fn edge_exit_axis<T: TerrainSampler + ?Sized>(terrain: &T, position: Vec3, velocity: Vec3) -> Axis {
    let sample_at = position + Vec3::new(velocity.x, 0.0, 0.0);
    if terrain.is_in_bounds(sample_at) {
        Axis::Z
    } else {
        Axis::X
    }
}

/// Axis that drove the ball into a wall
///
/// Samples the terrain after the X delta alone; a steep rise there means the
/// X motion hit the wall, otherwise the Z motion did.
pub fn wall_contact_axis<T: TerrainSampler + ?Sized>(
    terrain: &T,
    position: Vec3,
    ground_height: f32,
    velocity: Vec3,
    wall_angle_threshold: f32,
) -> Axis {
    let sample_at = position + Vec3::new(velocity.x, 0.0, 0.0);
    match terrain.sample(sample_at) {
        None => Axis::X,
        Some(s) if s.height > ground_height && !is_climbable(&s, wall_angle_threshold) => Axis::X,
        Some(_) => Axis::Z,
    }
}

/// Ledge guard for edges narrower than the ball
///
/// Looks one radius ahead of `position` along the sign of the horizontal
/// displacement. Blocked if that point is off the map, or is a steep face
/// rising above `reference_height`.
pub fn radius_edge_blocked<T: TerrainSampler + ?Sized>(
    terrain: &T,
    position: Vec3,
    displacement: Vec3,
    reference_height: f32,
    radius: f32,
    wall_angle_threshold: f32,
) -> bool {
    let sample_at = Vec3::new(
        position.x + radius * sign_or_zero(displacement.x),
        position.y,
        position.z + radius * sign_or_zero(displacement.z),
    );
    match terrain.sample(sample_at) {
        None => true,
        Some(s) => s.height > reference_height && !is_climbable(&s, wall_angle_threshold),
    }
}
