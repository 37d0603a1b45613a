//! Level descriptors and loading
//!
//! A level is a terrain, a finish rectangle and a spawn point. Descriptors are
//! plain data (JSON); turning one into a playable `Level` builds its heightmap,
//! which is the one place a level can fail to load.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{FinishZone, Heightmap, Level, TerrainError, TerrainSampler};

/// How to build a level's heightmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainSpec {
    Flat {
        width: usize,
        depth: usize,
        spacing: f32,
        height: f32,
    },
    Generated {
        seed: u64,
        width: usize,
        depth: usize,
        spacing: f32,
        amplitude: f32,
    },
    Grid {
        width: usize,
        depth: usize,
        spacing: f32,
        heights: Vec<f32>,
    },
}

impl TerrainSpec {
    pub fn build(&self) -> Result<Heightmap, TerrainError> {
        match self {
            TerrainSpec::Flat {
                width,
                depth,
                spacing,
                height,
            } => Heightmap::flat(*width, *depth, *spacing, *height),
            TerrainSpec::Generated {
                seed,
                width,
                depth,
                spacing,
                amplitude,
            } => Heightmap::generate(*seed, *width, *depth, *spacing, *amplitude),
            TerrainSpec::Grid {
                width,
                depth,
                spacing,
                heights,
            } => Heightmap::new(*width, *depth, *spacing, heights.clone()),
        }
    }
}

/// Serializable level description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub name: String,
    pub finish: FinishZone,
    pub spawn: Vec3,
    /// Missing terrain is a fatal load error, not a default
    #[serde(default)]
    pub terrain: Option<TerrainSpec>,
}

/// Errors loading levels
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {index} does not exist (pack has {count})")]
    NoSuchLevel { index: usize, count: usize },
    #[error("level '{name}' has no heightmap attached")]
    MissingTerrain { name: String },
    #[error("level '{name}' terrain is invalid: {source}")]
    Terrain {
        name: String,
        #[source]
        source: TerrainError,
    },
    #[error("level pack contains no levels")]
    EmptyPack,
    #[error("failed to read level pack {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid level pack JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything that can hand the session levels by index
pub trait LevelSource {
    type Terrain: TerrainSampler;

    fn level_count(&self) -> usize;

    fn load(&self, index: usize) -> Result<Level<Self::Terrain>, LevelError>;
}

/// Ordered list of level descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPack {
    pub levels: Vec<LevelDescriptor>,
}

impl LevelPack {
    pub fn new(levels: Vec<LevelDescriptor>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::EmptyPack);
        }
        Ok(Self { levels })
    }

    /// The four built-in courses
    pub fn classic() -> Self {
        let terrain = |seed| {
            Some(TerrainSpec::Generated {
                seed,
                width: 257,
                depth: 257,
                spacing: 30.0,
                amplitude: 300.0,
            })
        };
        let levels = vec![
            LevelDescriptor {
                name: "level_1".into(),
                finish: FinishZone::new(2500.0, 2800.0, 2500.0, 2800.0),
                spawn: Vec3::ZERO,
                terrain: terrain(1),
            },
            LevelDescriptor {
                name: "level_2".into(),
                finish: FinishZone::new(-3150.0, -2850.0, 2500.0, 2800.0),
                spawn: Vec3::ZERO,
                terrain: terrain(2),
            },
            LevelDescriptor {
                name: "level_3".into(),
                finish: FinishZone::new(2600.0, 2750.0, 2600.0, 2750.0),
                spawn: Vec3::ZERO,
                terrain: terrain(3),
            },
            LevelDescriptor {
                name: "level_4".into(),
                finish: FinishZone::new(-3220.0, -2601.0, -3812.0, -3193.0),
                spawn: Vec3::new(-3377.0, 0.0, 3647.0),
                terrain: terrain(4),
            },
        ];
        Self { levels }
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let pack: Self = serde_json::from_str(json)?;
        Self::new(pack.levels)
    }

    pub fn load_from(path: &Path) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let pack = Self::from_json(&json)?;
        log::info!("Loaded {} levels from {}", pack.levels.len(), path.display());
        Ok(pack)
    }
}

impl LevelSource for LevelPack {
    type Terrain = Heightmap;

    fn level_count(&self) -> usize {
        self.levels.len()
    }

    fn load(&self, index: usize) -> Result<Level<Heightmap>, LevelError> {
        let descriptor = self.levels.get(index).ok_or(LevelError::NoSuchLevel {
            index,
            count: self.levels.len(),
        })?;
        let spec = descriptor
            .terrain
            .as_ref()
            .ok_or_else(|| LevelError::MissingTerrain {
                name: descriptor.name.clone(),
            })?;
        let terrain = spec.build().map_err(|source| LevelError::Terrain {
            name: descriptor.name.clone(),
            source,
        })?;

        log::info!(
            "Loaded level {} '{}' ({}x{} samples)",
            index + 1,
            descriptor.name,
            terrain.width(),
            terrain.depth()
        );
        Ok(Level {
            name: descriptor.name.clone(),
            terrain,
            finish: descriptor.finish,
            spawn: descriptor.spawn,
        })
    }
}
