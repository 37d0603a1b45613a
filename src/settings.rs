//! Game settings and physics tuning
//!
//! Tuning values differ between play styles, so they live in a config struct
//! injected at session start instead of being hardcoded. Persisted as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::FollowCamera;
use crate::consts::*;

/// Physics preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PhysicsPreset {
    #[default]
    Classic,
    Floaty,
    Heavy,
}

impl PhysicsPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicsPreset::Classic => "Classic",
            PhysicsPreset::Floaty => "Floaty",
            PhysicsPreset::Heavy => "Heavy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "default" => Some(PhysicsPreset::Classic),
            "floaty" | "moon" => Some(PhysicsPreset::Floaty),
            "heavy" => Some(PhysicsPreset::Heavy),
            _ => None,
        }
    }

    /// Gravity for this preset (units/frame²)
    pub fn gravity(&self) -> f32 {
        match self {
            PhysicsPreset::Classic => GRAVITY,
            PhysicsPreset::Floaty => 0.08,
            PhysicsPreset::Heavy => 2.0,
        }
    }

    /// Friction for this preset
    pub fn friction(&self) -> f32 {
        match self {
            PhysicsPreset::Classic => FRICTION,
            PhysicsPreset::Floaty => 0.04,
            PhysicsPreset::Heavy => 0.06,
        }
    }

    /// Jump acceleration for this preset
    pub fn jump_accel(&self) -> f32 {
        match self {
            PhysicsPreset::Classic => JUMP_ACCEL,
            PhysicsPreset::Floaty => 0.15,
            PhysicsPreset::Heavy => 0.6,
        }
    }
}

/// Ball movement tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub sphere_radius: f32,
    /// Velocity added per frame at full forward/strafe input
    pub move_accel: f32,
    /// Per-axis horizontal speed cap (units/frame)
    pub max_speed: f32,
    /// Radians per frame at full turn input
    pub turn_speed: f32,
    /// Fraction of horizontal velocity removed each frame
    pub friction: f32,
    /// Components below this magnitude stop dead
    pub velocity_deadband: f32,
    pub gravity: f32,
    pub jump_accel: f32,
    /// Jump ceiling above take-off, in radii
    pub jump_rise_multiple: f32,
    /// Surfaces tilted more than this from up are walls (radians)
    pub wall_angle_threshold: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            sphere_radius: SPHERE_RADIUS,
            move_accel: MOVE_ACCEL,
            max_speed: MAX_HORIZONTAL_SPEED,
            turn_speed: TURN_SPEED,
            friction: FRICTION,
            velocity_deadband: VELOCITY_DEADBAND,
            gravity: GRAVITY,
            jump_accel: JUMP_ACCEL,
            jump_rise_multiple: JUMP_RISE_MULTIPLE,
            wall_angle_threshold: WALL_CLIMB_ANGLE,
        }
    }
}

impl PhysicsSettings {
    /// Create settings from a preset (applies preset defaults)
    pub fn from_preset(preset: PhysicsPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a preset's gravity, friction and jump values
    pub fn apply_preset(&mut self, preset: PhysicsPreset) {
        self.gravity = preset.gravity();
        self.friction = preset.friction();
        self.jump_accel = preset.jump_accel();
    }

    /// Height a jump rises above its take-off point
    #[inline]
    pub fn jump_rise(&self) -> f32 {
        self.sphere_radius * self.jump_rise_multiple
    }

    /// Reject values the ball physics cannot run with
    ///
    /// Everything must be finite and non-negative. The radius, speed cap and
    /// wall threshold must be positive; friction is a fraction of at most 1.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("sphere_radius", self.sphere_radius, true),
            ("move_accel", self.move_accel, false),
            ("max_speed", self.max_speed, true),
            ("turn_speed", self.turn_speed, false),
            ("friction", self.friction, false),
            ("velocity_deadband", self.velocity_deadband, false),
            ("gravity", self.gravity, false),
            ("jump_accel", self.jump_accel, false),
            ("jump_rise_multiple", self.jump_rise_multiple, false),
            ("wall_angle_threshold", self.wall_angle_threshold, true),
        ];
        for (field, value, positive) in fields {
            let floor_ok = if positive { value > 0.0 } else { value >= 0.0 };
            if !value.is_finite() || !floor_ok {
                return Err(SettingsError::InvalidPhysics { field, value });
            }
        }
        if self.friction > 1.0 {
            return Err(SettingsError::InvalidPhysics {
                field: "friction",
                value: self.friction,
            });
        }
        Ok(())
    }
}

/// Errors loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write settings to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("physics setting {field} cannot be {value}")]
    InvalidPhysics { field: &'static str, value: f32 },
}

/// Top-level game settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsSettings,
    pub camera: FollowCamera,
    /// Level pack JSON; the built-in classic pack when absent
    pub level_pack: Option<PathBuf>,
}

impl Settings {
    /// Default settings file name
    pub const FILE_NAME: &'static str = "heightmap_roll.json";

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.physics.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
