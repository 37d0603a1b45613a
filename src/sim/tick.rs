//! Per-frame ball update
//!
//! One call advances one ball by one frame: turn, build the desired movement,
//! run the jump/fall machine, integrate horizontal velocity, then resolve the
//! move against the terrain (map edges, walls, ledges, slopes) and roll the
//! mesh by the distance actually travelled.

use glam::{Quat, Vec3};

use super::collision::{
    edge_exit_axis, is_climbable, radius_edge_blocked, reflect_velocity, wall_contact_axis,
};
use super::state::{Ball, grounded_spawn};
use super::terrain::{TerrainSample, TerrainSampler};
use crate::settings::PhysicsSettings;
use crate::sign_or_zero;

/// Normalized per-player controls for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BallInput {
    /// Yaw input in [-1, 1]
    pub turn: f32,
    /// Ball-local Z movement in [-1, 1]
    pub forward: f32,
    /// Ball-local X movement in [-1, 1]
    pub strafe: f32,
    pub jump: bool,
    pub reset: bool,
}

impl BallInput {
    /// Copy with every axis clamped to [-1, 1] (NaN reads as 0)
    pub fn clamped(&self) -> Self {
        let axis = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) };
        Self {
            turn: axis(self.turn),
            forward: axis(self.forward),
            strafe: axis(self.strafe),
            ..*self
        }
    }
}

/// Decay one horizontal velocity component by one frame of friction
#[inline]
pub fn apply_friction(component: f32, settings: &PhysicsSettings) -> f32 {
    if component.abs() < settings.velocity_deadband {
        0.0
    } else {
        component - settings.friction * component
    }
}

/// Cap one horizontal velocity component
#[inline]
pub fn clamp_speed(component: f32, settings: &PhysicsSettings) -> f32 {
    component.clamp(-settings.max_speed, settings.max_speed)
}

/// Advance one ball by one frame
pub fn tick<T: TerrainSampler + ?Sized>(
    ball: &mut Ball,
    input: &BallInput,
    terrain: &T,
    settings: &PhysicsSettings,
    spawn: Vec3,
) {
    let input = input.clamped();
    let old_position = ball.position;

    ball.facing += input.turn * settings.turn_speed;
    let facing = ball.facing_rotation();

    // Ball-local intent rotated into world space
    let movement = facing * Vec3::new(input.strafe, 0.0, input.forward) * settings.move_accel;

    update_vertical(ball, input.jump, settings);

    ball.velocity.x = clamp_speed(apply_friction(ball.velocity.x, settings) + movement.x, settings);
    ball.velocity.z = clamp_speed(apply_friction(ball.velocity.z, settings) + movement.z, settings);

    let tentative = old_position + ball.velocity;

    let new_position = match terrain.sample(tentative) {
        Some(destination) => resolve_on_terrain(ball, terrain, settings, tentative, destination),
        None => {
            // Off the map: stay put and bounce off whichever edge we hit
            let axis = edge_exit_axis(terrain, old_position, ball.velocity);
            ball.velocity = reflect_velocity(ball.velocity, axis);
            log::trace!("map edge at {old_position}, reflecting {axis:?}");
            old_position
        }
    };

    roll(ball, &input, facing, new_position - old_position, settings.sphere_radius);
    ball.position = new_position;

    if input.reset {
        ball.reset(grounded_spawn(terrain, spawn, settings.sphere_radius));
    }
}

/// Jump / fall state machine; drives `velocity.y`
fn update_vertical(ball: &mut Ball, jump: bool, settings: &PhysicsSettings) {
    if jump && !ball.jumping && !ball.falling {
        ball.jumping = true;
        ball.jump_ceiling = ball.position.y + settings.jump_rise();
        ball.velocity.y = 0.0;
    }

    if ball.jumping {
        if ball.position.y < ball.jump_ceiling {
            ball.velocity.y += settings.jump_accel;
        } else {
            ball.jumping = false;
            ball.falling = true;
            ball.velocity.y = 0.0;
        }
    } else if ball.falling {
        ball.velocity.y -= settings.gravity;
    } else {
        ball.velocity.y = 0.0;
    }
}

/// Settle the destination against the ground and pick the committed position
fn resolve_on_terrain<T: TerrainSampler + ?Sized>(
    ball: &mut Ball,
    terrain: &T,
    settings: &PhysicsSettings,
    tentative: Vec3,
    destination: TerrainSample,
) -> Vec3 {
    let old = ball.position;
    let radius = settings.sphere_radius;
    let threshold = settings.wall_angle_threshold;
    let airborne = !ball.is_grounded();

    let old_height = terrain
        .sample(old)
        .map_or(destination.height, |s| s.height);
    let new_height = destination.height;

    // Horizontal move rejected; vertical motion carries on if airborne
    let hold_xz = |ball: &mut Ball| {
        if airborne {
            settle_airborne(ball, Vec3::new(old.x, tentative.y, old.z), old_height, radius)
        } else {
            old
        }
    };

    if new_height > old_height {
        if is_climbable(&destination, threshold) {
            if airborne {
                settle_airborne(ball, tentative, new_height, radius)
            } else {
                Vec3::new(tentative.x, new_height + radius, tentative.z)
            }
        } else if airborne && tentative.y >= new_height + radius {
            // Sailing over the top of the wall
            settle_airborne(ball, tentative, new_height, radius)
        } else {
            let axis = wall_contact_axis(terrain, old, old_height, ball.velocity, threshold);
            ball.velocity = reflect_velocity(ball.velocity, axis);
            log::trace!("wall at {tentative}, reflecting {axis:?}");
            hold_xz(ball)
        }
    } else {
        let reference = if airborne { old.y } else { old_height };
        if radius_edge_blocked(terrain, old, tentative - old, reference, radius, threshold) {
            log::trace!("ledge ahead of {old}, holding position");
            hold_xz(ball)
        } else if airborne {
            settle_airborne(ball, tentative, new_height, radius)
        } else if old_height - new_height > radius {
            // Ground drops away faster than we can follow it
            ball.falling = true;
            ball.velocity.y = 0.0;
            Vec3::new(tentative.x, old.y, tentative.z)
        } else {
            Vec3::new(tentative.x, new_height + radius, tentative.z)
        }
    }
}

/// Vertical limits for an airborne ball over ground at `ground_height`
///
/// Rising balls stop at the jump ceiling and never sink into the ground;
/// falling balls land once they reach it.
fn settle_airborne(ball: &mut Ball, candidate: Vec3, ground_height: f32, radius: f32) -> Vec3 {
    let floor = ground_height + radius;
    let mut position = candidate;
    if ball.jumping {
        position.y = position.y.min(ball.jump_ceiling).max(floor);
    } else if ball.falling && position.y <= floor {
        position.y = floor;
        ball.falling = false;
        ball.velocity.y = 0.0;
    }
    position
}

/// Roll the mesh about the ball's right axis by the distance travelled
fn roll(ball: &mut Ball, input: &BallInput, facing: Quat, moved: Vec3, radius: f32) {
    let distance = moved.length();
    if distance <= 0.0 {
        return;
    }

    // Arc length L = theta * r
    let theta = distance / radius;
    let direction = if input.forward != 0.0 {
        sign_or_zero(input.forward)
    } else if moved.dot(facing * Vec3::Z) < 0.0 {
        -1.0
    } else {
        1.0
    };

    let right = facing * Vec3::X;
    ball.roll = (Quat::from_axis_angle(right, theta * direction) * ball.roll).normalize();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::terrain::Heightmap;
    use proptest::prelude::*;
    use std::cell::Cell;

    const EPS: f32 = 1e-4;

    /// Flat ground at y = -12 spanning [-500, 500) so a ball at y = 0 is grounded
    fn flat() -> Heightmap {
        Heightmap::flat(101, 101, 10.0, -12.0).unwrap()
    }

    /// Same cliff as the collision tests: 200 units high between x = 10 and x = 20
    fn cliff() -> Heightmap {
        Heightmap::from_fn(41, 41, 10.0, |x, _| if x >= 22 { 200.0 } else { 0.0 }).unwrap()
    }

    /// Terrain wrapper that fails the test on any unguarded query
    struct Strict<'a> {
        inner: &'a Heightmap,
        queries: Cell<usize>,
    }

    impl TerrainSampler for Strict<'_> {
        fn is_in_bounds(&self, position: Vec3) -> bool {
            self.inner.is_in_bounds(position)
        }

        fn height_and_normal(&self, position: Vec3) -> TerrainSample {
            assert!(
                self.inner.is_in_bounds(position),
                "unguarded terrain query at {position}"
            );
            self.queries.set(self.queries.get() + 1);
            self.inner.height_and_normal(position)
        }
    }

    #[test]
    fn test_single_forward_frame_on_flat_ground() {
        let terrain = flat();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::ZERO);
        let input = BallInput {
            forward: 1.0,
            ..Default::default()
        };

        tick(&mut ball, &input, &terrain, &settings, Vec3::ZERO);

        let step = settings.move_accel;
        assert!((ball.velocity.z - step).abs() < EPS);
        assert_eq!(ball.velocity.x, 0.0);
        assert!((ball.position - Vec3::new(0.0, 0.0, step)).length() < EPS);

        let (axis, angle) = ball.roll.to_axis_angle();
        assert!((angle - step / settings.sphere_radius).abs() < EPS);
        assert!((axis.abs() - Vec3::X).length() < EPS);
    }

    #[test]
    fn test_turn_accumulates_facing() {
        let terrain = flat();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::ZERO);
        let input = BallInput {
            turn: 1.0,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut ball, &input, &terrain, &settings, Vec3::ZERO);
        }
        assert!((ball.facing - 10.0 * settings.turn_speed).abs() < EPS);
        // Turning in place does not move or roll the ball
        assert_eq!(ball.position, Vec3::ZERO);
        assert_eq!(ball.roll, Quat::IDENTITY);
    }

    #[test]
    fn test_movement_follows_facing() {
        let terrain = flat();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::ZERO);
        ball.facing = std::f32::consts::FRAC_PI_2;
        let input = BallInput {
            forward: 1.0,
            ..Default::default()
        };
        tick(&mut ball, &input, &terrain, &settings, Vec3::ZERO);
        // Facing +90° turns local +Z into world +X
        assert!((ball.velocity.x - settings.move_accel).abs() < EPS);
        assert!(ball.velocity.z.abs() < EPS);
    }

    #[test]
    fn test_friction_zeroes_below_deadband() {
        let settings = PhysicsSettings::default();
        assert_eq!(apply_friction(0.049, &settings), 0.0);
        assert_eq!(apply_friction(-0.03, &settings), 0.0);
        assert!((apply_friction(10.0, &settings) - 9.5).abs() < EPS);
    }

    #[test]
    fn test_coasting_decays_to_rest() {
        let terrain = flat();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::ZERO);
        ball.velocity = Vec3::new(0.0, 0.0, 10.0);

        let mut last = ball.velocity.z;
        for _ in 0..200 {
            tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);
            assert!(ball.velocity.z <= last);
            last = ball.velocity.z;
        }
        assert_eq!(ball.velocity.z, 0.0);
        assert!(ball.position.z > 0.0);
    }

    #[test]
    fn test_speed_clamped_to_max() {
        let terrain = flat();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::ZERO);
        ball.velocity = Vec3::new(-45.0, 0.0, 45.0);
        let input = BallInput {
            forward: 1.0,
            ..Default::default()
        };
        tick(&mut ball, &input, &terrain, &settings, Vec3::ZERO);
        assert_eq!(ball.velocity.x, -settings.max_speed);
        assert_eq!(ball.velocity.z, settings.max_speed);
    }

    #[test]
    fn test_falling_ball_lands_on_flat_ground() {
        let terrain = flat();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::new(0.0, 100.0, 0.0));
        ball.falling = true;

        let mut last_y = ball.position.y;
        let mut frames = 0;
        while ball.falling {
            tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);
            assert!(ball.position.y <= last_y);
            last_y = ball.position.y;
            frames += 1;
            assert!(frames < 1000, "ball never landed");
        }
        assert!((ball.position.y - 0.0).abs() < EPS);
        assert_eq!(ball.velocity.y, 0.0);
    }

    #[test]
    fn test_jump_reaches_ceiling_then_falls_back() {
        let map = flat();
        let terrain = Strict {
            inner: &map,
            queries: Cell::new(0),
        };
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::ZERO);
        let hold_jump = BallInput {
            jump: true,
            ..Default::default()
        };

        tick(&mut ball, &hold_jump, &terrain, &settings, Vec3::ZERO);
        assert!(ball.jumping);
        let ceiling = ball.jump_ceiling;
        assert!((ceiling - settings.jump_rise()).abs() < EPS);

        let mut peak = ball.position.y;
        let mut frames = 0;
        while !ball.falling {
            tick(&mut ball, &hold_jump, &terrain, &settings, Vec3::ZERO);
            peak = peak.max(ball.position.y);
            frames += 1;
            assert!(frames < 1000, "jump never peaked");
        }
        assert!((peak - ceiling).abs() < EPS);
        assert!(!ball.jumping);

        // Holding jump while falling must not start a new jump
        while ball.falling {
            tick(&mut ball, &hold_jump, &terrain, &settings, Vec3::ZERO);
            frames += 1;
            assert!(frames < 2000, "ball never landed");
        }
        assert!(ball.position.y.abs() < EPS);
        assert!(terrain.queries.get() > 0);
    }

    #[test]
    fn test_wall_blocks_and_reflects() {
        let terrain = cliff();
        let settings = PhysicsSettings::default();
        let start = Vec3::new(9.0, 12.0, 0.0);
        let mut ball = Ball::new(start);
        ball.velocity = Vec3::new(5.0, 0.0, 0.0);

        tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);

        assert_eq!(ball.position, start);
        assert!(ball.velocity.x < 0.0);
        assert!((ball.velocity.x + 4.75).abs() < EPS);
        assert_eq!(ball.roll, Quat::IDENTITY);
    }

    #[test]
    fn test_high_jump_clears_wall() {
        let terrain = cliff();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::new(9.0, 260.0, 0.0));
        ball.falling = true;
        ball.velocity = Vec3::new(5.0, 0.0, 0.0);

        tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);

        assert!(ball.position.x > 9.0);
        assert!(ball.velocity.x > 0.0);
    }

    #[test]
    fn test_rising_jump_sails_over_cliff_edge() {
        let terrain = cliff();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::new(0.0, 260.0, 0.0));
        ball.jumping = true;
        ball.jump_ceiling = 300.0;
        ball.velocity = Vec3::new(5.0, 0.0, 0.0);

        for _ in 0..5 {
            tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);
        }

        // Well above the 200-unit cliff top, so neither the ledge guard nor the wall stops it
        assert!(ball.position.x > 15.0, "held at x = {}", ball.position.x);
        assert!(ball.velocity.x > 0.0);
        assert!(ball.position.y > 260.0);
    }

    #[test]
    fn test_ledge_within_radius_holds_position() {
        let terrain = cliff();
        let settings = PhysicsSettings::default();
        // Flat ahead, but one radius ahead is the cliff face
        let start = Vec3::new(2.0, 12.0, 0.0);
        let mut ball = Ball::new(start);
        ball.velocity = Vec3::new(2.0, 0.0, 0.0);

        tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);
        assert_eq!(ball.position, start);
    }

    #[test]
    fn test_climbs_gentle_slope() {
        // Rises 1 unit per 10 along X: well under the wall angle
        let terrain = Heightmap::from_fn(41, 41, 10.0, |x, _| x as f32).unwrap();
        let settings = PhysicsSettings::default();
        let ground = terrain.height_and_normal(Vec3::ZERO).height;
        let mut ball = Ball::new(Vec3::new(0.0, ground + 12.0, 0.0));
        ball.velocity = Vec3::new(5.0, 0.0, 0.0);

        tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);

        let expected_ground = terrain.height_and_normal(ball.position).height;
        assert!(ball.position.x > 0.0);
        assert!((ball.position.y - (expected_ground + 12.0)).abs() < EPS);
        assert!(ball.is_grounded());
    }

    #[test]
    fn test_drop_off_starts_falling() {
        // 100-unit step down at x = 0..10
        let terrain = Heightmap::from_fn(41, 41, 10.0, |x, _| if x <= 20 { 100.0 } else { 0.0 }).unwrap();
        let settings = PhysicsSettings::default();
        let mut ball = Ball::new(Vec3::new(-1.0, 112.0, 0.0));
        ball.velocity = Vec3::new(9.0, 0.0, 0.0);

        tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);

        assert!(ball.falling);
        assert!(ball.position.x > -1.0);
        assert!((ball.position.y - 112.0).abs() < EPS);
    }

    #[test]
    fn test_map_edge_rejects_move_and_bounces() {
        let terrain = flat();
        let settings = PhysicsSettings::default();
        let start = Vec3::new(495.0, 0.0, 0.0);
        let mut ball = Ball::new(start);
        ball.velocity = Vec3::new(10.0, 0.0, 3.0);

        tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);

        assert_eq!(ball.position, start);
        assert!((ball.velocity.x + 9.5).abs() < EPS);
        assert!(ball.velocity.z > 0.0);
    }

    #[test]
    fn test_reset_returns_to_spawn() {
        let terrain = flat();
        let settings = PhysicsSettings::default();
        let spawn = Vec3::new(10.0, 0.0, -20.0);
        let mut ball = Ball::new(Vec3::new(100.0, 50.0, 100.0));
        ball.facing = 1.3;
        ball.velocity = Vec3::new(4.0, -2.0, 4.0);
        ball.falling = true;

        let input = BallInput {
            reset: true,
            forward: 1.0,
            ..Default::default()
        };
        tick(&mut ball, &input, &terrain, &settings, spawn);

        assert_eq!(ball.position, spawn);
        assert_eq!(ball.facing, 0.0);
        assert_eq!(ball.velocity, Vec3::ZERO);
        assert!(ball.is_grounded());
    }

    #[test]
    fn test_reset_lands_on_raised_ground() {
        let terrain = cliff();
        let settings = PhysicsSettings::default();
        // Spawn on the cliff top, authored at y = 0
        let spawn = Vec3::new(100.0, 0.0, 0.0);
        let mut ball = Ball::new(Vec3::new(-50.0, 12.0, 0.0));
        let input = BallInput {
            reset: true,
            ..Default::default()
        };
        tick(&mut ball, &input, &terrain, &settings, spawn);

        assert_eq!(ball.position, Vec3::new(100.0, 212.0, 0.0));
        assert!(ball.is_grounded());

        // A jump right after the reset rises from the cliff top
        let jump = BallInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut ball, &jump, &terrain, &settings, spawn);
        tick(&mut ball, &jump, &terrain, &settings, spawn);
        assert!(ball.jumping);
        assert!(ball.position.y > 212.0);
        assert!((ball.jump_ceiling - (212.0 + settings.jump_rise())).abs() < EPS);
    }

    #[test]
    fn test_input_axes_are_clamped() {
        let input = BallInput {
            turn: 4.0,
            forward: -9.0,
            strafe: f32::NAN,
            ..Default::default()
        }
        .clamped();
        assert_eq!(input.turn, 1.0);
        assert_eq!(input.forward, -1.0);
        assert_eq!(input.strafe, 0.0);
    }

    proptest! {
        #[test]
        fn prop_friction_below_deadband_is_exact_zero(v in -0.0499f32..0.0499) {
            let settings = PhysicsSettings::default();
            prop_assert_eq!(apply_friction(v, &settings), 0.0);
        }

        #[test]
        fn prop_clamp_never_exceeds_max(v in -1000.0f32..1000.0) {
            let settings = PhysicsSettings::default();
            let c = clamp_speed(v, &settings);
            prop_assert!(c.abs() <= settings.max_speed);
            if v.abs() > settings.max_speed {
                prop_assert_eq!(c, settings.max_speed.copysign(v));
            }
        }

        #[test]
        fn prop_falling_converges_to_ground(
            x in -400.0f32..400.0,
            z in -400.0f32..400.0,
            height in 0.0f32..300.0,
        ) {
            let terrain = flat();
            let settings = PhysicsSettings::default();
            let mut ball = Ball::new(Vec3::new(x, height, z));
            ball.falling = true;

            let mut last_y = ball.position.y;
            for _ in 0..500 {
                tick(&mut ball, &BallInput::default(), &terrain, &settings, Vec3::ZERO);
                prop_assert!(ball.position.y <= last_y);
                last_y = ball.position.y;
                if !ball.falling {
                    break;
                }
            }
            prop_assert!(!ball.falling);
            prop_assert!(ball.position.y.abs() < EPS);
        }

        #[test]
        fn prop_reset_ignores_prior_state(
            vx in -20.0f32..20.0,
            vz in -20.0f32..20.0,
            facing in -10.0f32..10.0,
            falling in any::<bool>(),
            jumping in any::<bool>(),
        ) {
            let terrain = flat();
            let settings = PhysicsSettings::default();
            let spawn = Vec3::new(-30.0, 0.0, 40.0);
            let mut ball = Ball::new(Vec3::new(5.0, 30.0, 5.0));
            ball.velocity = Vec3::new(vx, 0.0, vz);
            ball.facing = facing;
            ball.falling = falling;
            ball.jumping = jumping && !falling;
            ball.jump_ceiling = 60.0;

            let input = BallInput { reset: true, ..Default::default() };
            tick(&mut ball, &input, &terrain, &settings, spawn);

            prop_assert_eq!(ball.position, spawn);
            prop_assert_eq!(ball.facing, 0.0);
            prop_assert_eq!(ball.velocity, Vec3::ZERO);
        }
    }
}
