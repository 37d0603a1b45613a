//! Device input fused into per-player `BallInput`
//!
//! Keyboard and gamepad states are fed in by the host each frame; the fusion
//! sums every device's contribution per axis and clamps, so a player can mix
//! devices freely. `Autopilot` drives a ball toward a target for demo play.

use std::collections::HashSet;

use glam::{Vec2, Vec3};

use crate::normalize_angle;
use crate::session::{FrameInput, PlayerId};
use crate::settings::PhysicsSettings;
use crate::sim::{Ball, BallInput};

/// Produces normalized input for the session
pub trait InputSource {
    fn player_input(&self, player: PlayerId) -> BallInput;

    /// Global back/exit signal
    fn exit_requested(&self) -> bool;

    fn frame_input(&self) -> FrameInput {
        FrameInput {
            players: PlayerId::ALL.map(|p| self.player_input(p)),
            exit: self.exit_requested(),
        }
    }
}

/// Keys the game binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    RightShift,
    End,
    Delete,
    PageDown,
    W,
    A,
    S,
    D,
    Q,
    E,
    F,
    R,
    Escape,
}

/// Keys held this frame
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<Key>,
}

impl KeyboardState {
    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    #[inline]
    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// +1 / -1 / 0 for a pair of opposing keys
    fn axis(&self, positive: Key, negative: Key) -> f32 {
        (self.is_down(positive) as i8 - self.is_down(negative) as i8) as f32
    }
}

/// One player's key layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub forward: Key,
    pub back: Key,
    pub turn_left: Key,
    pub turn_right: Key,
    pub strafe_left: Key,
    pub strafe_right: Key,
    pub jump: Key,
    pub reset: Key,
}

impl KeyBindings {
    /// Arrow cluster
    pub fn player_one() -> Self {
        Self {
            forward: Key::Up,
            back: Key::Down,
            turn_left: Key::Left,
            turn_right: Key::Right,
            strafe_left: Key::Delete,
            strafe_right: Key::PageDown,
            jump: Key::RightShift,
            reset: Key::End,
        }
    }

    pub fn player_two() -> Self {
        Self {
            forward: Key::W,
            back: Key::S,
            turn_left: Key::A,
            turn_right: Key::D,
            strafe_left: Key::Q,
            strafe_right: Key::E,
            jump: Key::F,
            reset: Key::R,
        }
    }

    pub fn for_player(player: PlayerId) -> Self {
        match player {
            PlayerId::One => Self::player_one(),
            PlayerId::Two => Self::player_two(),
        }
    }
}

/// Snapshot of one gamepad
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadState {
    pub connected: bool,
    /// Stick up and right are positive
    pub left_stick: Vec2,
    pub right_stick: Vec2,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub a: bool,
    pub y: bool,
}

/// Keyboard plus one gamepad per player
#[derive(Debug, Clone)]
pub struct DeviceFusion {
    pub keyboard: KeyboardState,
    pub gamepads: [GamepadState; 2],
    pub bindings: [KeyBindings; 2],
    pub exit_key: Key,
    /// Stick deflection below this is ignored
    pub stick_deadzone: f32,
}

impl Default for DeviceFusion {
    fn default() -> Self {
        Self {
            keyboard: KeyboardState::default(),
            gamepads: [GamepadState::default(); 2],
            bindings: [KeyBindings::player_one(), KeyBindings::player_two()],
            exit_key: Key::Escape,
            stick_deadzone: 0.15,
        }
    }
}

impl DeviceFusion {
    fn stick(&self, v: f32) -> f32 {
        if v.abs() < self.stick_deadzone { 0.0 } else { v }
    }
}

impl InputSource for DeviceFusion {
    fn player_input(&self, player: PlayerId) -> BallInput {
        let keys = &self.bindings[player.index()];
        let kb = &self.keyboard;

        // Forward motion is ball-local -Z
        let mut input = BallInput {
            turn: kb.axis(keys.turn_left, keys.turn_right),
            forward: kb.axis(keys.back, keys.forward),
            strafe: kb.axis(keys.strafe_right, keys.strafe_left),
            jump: kb.is_down(keys.jump),
            reset: kb.is_down(keys.reset),
        };

        let pad = &self.gamepads[player.index()];
        if pad.connected {
            input.turn += (pad.dpad_left as i8 - pad.dpad_right as i8) as f32
                - self.stick(pad.left_stick.x);
            input.forward += (pad.dpad_down as i8 - pad.dpad_up as i8) as f32
                - self.stick(pad.left_stick.y);
            input.strafe += self.stick(pad.right_stick.x);
            input.jump |= pad.a;
            input.reset |= pad.y;
        }

        input.clamped()
    }

    fn exit_requested(&self) -> bool {
        self.keyboard.is_down(self.exit_key)
    }
}

/// Frames without progress before the autopilot tries a jump
const STUCK_FRAMES: u32 = 45;
/// Heading error (radians) under which the autopilot rolls
const ALIGN_ANGLE: f32 = 0.35;

/// Steers a ball toward a point, for demo and attract play
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    stuck_frames: u32,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drive(&mut self, ball: &Ball, target: Vec3, settings: &PhysicsSettings) -> BallInput {
        let mut input = steer_toward(ball, target, settings);

        let speed = Vec2::new(ball.velocity.x, ball.velocity.z).length();
        if input.forward != 0.0 && ball.is_grounded() && speed < 0.5 {
            self.stuck_frames += 1;
        } else {
            self.stuck_frames = 0;
        }
        if self.stuck_frames >= STUCK_FRAMES {
            log::debug!("Autopilot stuck at {:?}, jumping", ball.position);
            input.jump = true;
            self.stuck_frames = 0;
        }
        input
    }
}

/// Turn toward `target` and roll forward once facing it
pub fn steer_toward(ball: &Ball, target: Vec3, settings: &PhysicsSettings) -> BallInput {
    let to_target = Vec2::new(target.x - ball.position.x, target.z - ball.position.z);
    if to_target.length_squared() < 1e-6 {
        return BallInput::default();
    }

    // Rolling with forward = -1 moves along facing * -Z
    let desired = (-to_target.x).atan2(-to_target.y);
    let delta = normalize_angle(desired - ball.facing);
    let turn = (delta / settings.turn_speed.max(f32::EPSILON)).clamp(-1.0, 1.0);
    let forward = if delta.abs() < ALIGN_ANGLE { -1.0 } else { 0.0 };

    BallInput {
        turn,
        forward,
        ..Default::default()
    }
}
