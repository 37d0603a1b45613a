//! Follow camera and split-screen viewports
//!
//! The camera trails each ball at a fixed offset rotated by the ball's facing,
//! and is lifted out of the ground when the offset would bury it in a hill.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::session::{PlayerCount, PlayerId};
use crate::sim::{Ball, TerrainSampler};

/// Chase camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowCamera {
    /// Eye offset from the ball in ball-facing space
    pub position_offset: Vec3,
    /// Look-at offset from the ball in ball-facing space
    pub target_offset: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            position_offset: Vec3::new(0.0, 40.0, 150.0),
            target_offset: Vec3::new(0.0, 30.0, 0.0),
            fov_y_degrees: 45.0,
            near: 1.0,
            far: 10000.0,
        }
    }
}

/// Camera placement for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
    pub view: Mat4,
}

impl FollowCamera {
    pub fn view<T: TerrainSampler + ?Sized>(&self, ball: &Ball, terrain: &T) -> CameraView {
        let rotation = ball.facing_rotation();
        let mut eye = ball.position + rotation * self.position_offset;
        if let Some(ground) = terrain.sample(eye) {
            eye.y = eye.y.max(ground.height);
        }
        let target = ball.position + rotation * self.target_offset;
        CameraView {
            eye,
            target,
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
        }
    }

    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect_ratio,
            self.near,
            self.far,
        )
    }
}

/// Screen region in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Left and right halves of the screen
pub fn split_viewports(width: u32, height: u32) -> (Viewport, Viewport) {
    let left_width = width / 2;
    let left = Viewport {
        x: 0,
        y: 0,
        width: left_width,
        height,
    };
    let right = Viewport {
        x: left_width,
        y: 0,
        width: width - left_width,
        height,
    };
    (left, right)
}

/// Viewport for a player; player one gets the right half in two-player games
pub fn player_viewport(player: PlayerId, players: PlayerCount, width: u32, height: u32) -> Viewport {
    match players {
        PlayerCount::One => Viewport {
            x: 0,
            y: 0,
            width,
            height,
        },
        PlayerCount::Two => {
            let (left, right) = split_viewports(width, height);
            match player {
                PlayerId::One => right,
                PlayerId::Two => left,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Heightmap;

    #[test]
    fn test_camera_trails_behind_facing() {
        let terrain = Heightmap::flat(101, 101, 10.0, 0.0).unwrap();
        let ball = Ball::new(Vec3::new(0.0, 12.0, 0.0));
        let view = FollowCamera::default().view(&ball, &terrain);
        assert!((view.eye - Vec3::new(0.0, 52.0, 150.0)).length() < 1e-4);
        assert!((view.target - Vec3::new(0.0, 42.0, 0.0)).length() < 1e-4);

        let mut turned = ball.clone();
        turned.facing = std::f32::consts::FRAC_PI_2;
        let view = FollowCamera::default().view(&turned, &terrain);
        assert!((view.eye - Vec3::new(150.0, 52.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_eye_lifted_above_terrain() {
        // Hill behind the ball
        let terrain =
            Heightmap::from_fn(101, 101, 10.0, |_, z| if z >= 60 { 300.0 } else { 0.0 }).unwrap();
        let ball = Ball::new(Vec3::new(0.0, 12.0, 0.0));
        let view = FollowCamera::default().view(&ball, &terrain);
        assert!(view.eye.y >= 300.0 - 1e-3);
    }

    #[test]
    fn test_eye_off_map_is_not_adjusted() {
        let terrain = Heightmap::flat(11, 11, 10.0, 500.0).unwrap();
        let ball = Ball::new(Vec3::new(0.0, 512.0, 0.0));
        let view = FollowCamera::default().view(&ball, &terrain);
        assert!((view.eye.y - 552.0).abs() < 1e-4);
    }

    #[test]
    fn test_split_viewports() {
        let (left, right) = split_viewports(1281, 720);
        assert_eq!(left.width + right.width, 1281);
        assert_eq!(right.x, left.width);
        assert_eq!(
            player_viewport(PlayerId::One, PlayerCount::Two, 1281, 720),
            right
        );
        assert_eq!(
            player_viewport(PlayerId::One, PlayerCount::One, 1280, 720).width,
            1280
        );
        assert!((player_viewport(PlayerId::Two, PlayerCount::Two, 1280, 720).aspect_ratio() - 640.0 / 720.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_is_finite() {
        let m = FollowCamera::default().projection(16.0 / 9.0);
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
