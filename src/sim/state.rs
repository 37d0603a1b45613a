//! Ball and level state
//!
//! One `Ball` per player. Levels are immutable once loaded.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::terrain::TerrainSampler;

/// Kinematic state of one player's ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// World-space center
    pub position: Vec3,
    /// Yaw in radians, accumulated from turn input (unwrapped)
    pub facing: f32,
    /// Accumulated rolling rotation of the visual mesh
    pub roll: Quat,
    /// Horizontal components persist under friction; `y` is the vertical speed
    /// while jumping or falling and zero when grounded
    pub velocity: Vec3,
    pub falling: bool,
    pub jumping: bool,
    /// Target height of the current jump (only meaningful while `jumping`)
    pub jump_ceiling: f32,
}

impl Ball {
    /// Fresh ball at a spawn point: zero velocity, identity roll
    pub fn new(spawn: Vec3) -> Self {
        Self {
            position: spawn,
            facing: 0.0,
            roll: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            falling: false,
            jumping: false,
            jump_ceiling: 0.0,
        }
    }

    /// Snap back to the spawn point and drop all motion state.
    ///
    /// The roll orientation is kept; only a level load resets it.
    pub fn reset(&mut self, spawn: Vec3) {
        self.position = spawn;
        self.facing = 0.0;
        self.velocity = Vec3::ZERO;
        self.falling = false;
        self.jumping = false;
        self.jump_ceiling = 0.0;
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        !self.falling && !self.jumping
    }

    /// Rotation applied to ball-local movement for the current facing
    #[inline]
    pub fn facing_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.facing)
    }

    /// Mesh world transform: roll first, then translate
    pub fn world_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.roll, self.position)
    }
}

/// Spawn point lifted so the ball rests on the ground
///
/// Off-terrain spawns are returned unchanged.
pub fn grounded_spawn<T: TerrainSampler + ?Sized>(terrain: &T, spawn: Vec3, radius: f32) -> Vec3 {
    match terrain.sample(spawn) {
        Some(ground) => Vec3::new(spawn.x, ground.height + radius, spawn.z),
        None => spawn,
    }
}

/// Axis-aligned finish rectangle in world XZ (bounds inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinishZone {
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl FinishZone {
    pub fn new(x_min: f32, x_max: f32, z_min: f32, z_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            z_min,
            z_max,
        }
    }

    /// True if the XZ part of `position` lies inside, edges included
    pub fn contains(&self, position: Vec3) -> bool {
        position.x >= self.x_min
            && position.x <= self.x_max
            && position.z >= self.z_min
            && position.z <= self.z_max
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.x_min + self.x_max) / 2.0,
            0.0,
            (self.z_min + self.z_max) / 2.0,
        )
    }
}

/// A loaded level: terrain, finish zone and spawn point
#[derive(Debug, Clone)]
pub struct Level<T> {
    pub name: String,
    pub terrain: T,
    pub finish: FinishZone,
    pub spawn: Vec3,
}

impl<T: TerrainSampler> Level<T> {
    /// Whether a ball at `position` has reached this level's finish zone
    #[inline]
    pub fn reached_finish(&self, position: Vec3) -> bool {
        self.finish.contains(position)
    }

    /// Where a ball appears on this level, resting on the ground
    pub fn spawn_point(&self, radius: f32) -> Vec3 {
        grounded_spawn(&self.terrain, self.spawn, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_zone_inclusive_bounds() {
        let zone = FinishZone::new(2500.0, 2800.0, 2500.0, 2800.0);
        assert!(zone.contains(Vec3::new(2800.0, 0.0, 2800.0)));
        assert!(zone.contains(Vec3::new(2500.0, -40.0, 2500.0)));
        assert!(zone.contains(Vec3::new(2650.0, 0.0, 2799.9)));
        assert!(!zone.contains(Vec3::new(2800.1, 0.0, 2600.0)));
        assert!(!zone.contains(Vec3::new(2600.0, 0.0, 2499.9)));
    }

    #[test]
    fn test_reset_clears_motion_but_keeps_roll() {
        let mut ball = Ball::new(Vec3::new(1.0, 2.0, 3.0));
        ball.position = Vec3::new(500.0, 80.0, -20.0);
        ball.facing = 2.5;
        ball.velocity = Vec3::new(7.0, -1.5, 3.0);
        ball.falling = true;
        ball.roll = Quat::from_rotation_x(0.7);

        ball.reset(Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(ball.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ball.facing, 0.0);
        assert_eq!(ball.velocity, Vec3::ZERO);
        assert!(ball.is_grounded());
        assert_eq!(ball.roll, Quat::from_rotation_x(0.7));
    }

    #[test]
    fn test_spawn_point_rests_on_ground() {
        let terrain = crate::sim::Heightmap::flat(11, 11, 10.0, 75.0).unwrap();
        let level = Level {
            name: "plateau".into(),
            terrain,
            finish: FinishZone::new(0.0, 1.0, 0.0, 1.0),
            spawn: Vec3::new(5.0, 0.0, -5.0),
        };
        assert_eq!(level.spawn_point(12.0), Vec3::new(5.0, 87.0, -5.0));

        // Off the map: left alone
        let off = Vec3::new(500.0, 3.0, 0.0);
        assert_eq!(grounded_spawn(&level.terrain, off, 12.0), off);
    }

    #[test]
    fn test_world_transform_places_ball() {
        let mut ball = Ball::new(Vec3::new(10.0, 12.0, -4.0));
        ball.roll = Quat::from_rotation_x(1.0);
        let m = ball.world_transform();
        assert!((m.transform_point3(Vec3::ZERO) - ball.position).length() < 1e-5);
    }
}
