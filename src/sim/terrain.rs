//! Terrain height/normal oracle
//!
//! The ball controller only ever asks two questions of the terrain: is this XZ
//! position on the map, and if so how high is the ground there and which way
//! does it face. `TerrainSampler` is that contract; `Heightmap` is the grid
//! implementation used by the level loader.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

/// Ground height and surface normal at one XZ position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    pub height: f32,
    /// Unit length, pointing away from the ground
    pub normal: Vec3,
}

impl TerrainSample {
    /// Angle between the surface normal and world up (radians)
    #[inline]
    pub fn slope_angle(&self) -> f32 {
        self.normal.dot(Vec3::Y).clamp(-1.0, 1.0).acos()
    }
}

/// Read-only terrain query contract
///
/// Implementations must be deterministic for a fixed terrain and position.
pub trait TerrainSampler {
    /// True iff the XZ part of `position` lies within the sampled footprint
    fn is_in_bounds(&self, position: Vec3) -> bool;

    /// Height and normal at the XZ part of `position`
    ///
    /// Only meaningful when `is_in_bounds(position)` holds; callers guard first.
    fn height_and_normal(&self, position: Vec3) -> TerrainSample;

    /// Guarded query: `None` when off the terrain
    fn sample(&self, position: Vec3) -> Option<TerrainSample> {
        if self.is_in_bounds(position) {
            Some(self.height_and_normal(position))
        } else {
            None
        }
    }
}

impl<T: TerrainSampler + ?Sized> TerrainSampler for &T {
    fn is_in_bounds(&self, position: Vec3) -> bool {
        (**self).is_in_bounds(position)
    }

    fn height_and_normal(&self, position: Vec3) -> TerrainSample {
        (**self).height_and_normal(position)
    }
}

/// Errors building a heightmap
#[derive(Debug, Error, PartialEq)]
pub enum TerrainError {
    #[error("heightmap must be at least 2x2 samples, got {width}x{depth}")]
    TooSmall { width: usize, depth: usize },
    #[error("heightmap expects {expected} samples, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("sample spacing {0} must be finite and positive")]
    InvalidSpacing(f32),
    #[error("height sample {index} is not finite")]
    NonFiniteHeight { index: usize },
}

/// Regular grid of height samples centered on the world origin
///
/// Heights are stored row-major (`heights[z * width + x]`). Sample `(0, 0)`
/// sits at the minimum XZ corner.
#[derive(Debug, Clone)]
pub struct Heightmap {
    width: usize,
    depth: usize,
    spacing: f32,
    heights: Vec<f32>,
    normals: Vec<Vec3>,
    /// World XZ of sample (0, 0)
    origin: Vec2,
}

impl Heightmap {
    pub fn new(
        width: usize,
        depth: usize,
        spacing: f32,
        heights: Vec<f32>,
    ) -> Result<Self, TerrainError> {
        if width < 2 || depth < 2 {
            return Err(TerrainError::TooSmall { width, depth });
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(TerrainError::InvalidSpacing(spacing));
        }
        let expected = width * depth;
        if heights.len() != expected {
            return Err(TerrainError::SizeMismatch {
                expected,
                actual: heights.len(),
            });
        }
        if let Some(index) = heights.iter().position(|h| !h.is_finite()) {
            return Err(TerrainError::NonFiniteHeight { index });
        }

        let origin = Vec2::new(
            -((width - 1) as f32) * spacing / 2.0,
            -((depth - 1) as f32) * spacing / 2.0,
        );
        let mut map = Self {
            width,
            depth,
            spacing,
            heights,
            normals: Vec::new(),
            origin,
        };
        map.normals = map.compute_normals();
        Ok(map)
    }

    /// Level terrain at a constant height
    pub fn flat(width: usize, depth: usize, spacing: f32, height: f32) -> Result<Self, TerrainError> {
        Self::new(width, depth, spacing, vec![height; width * depth])
    }

    /// Build from a function of grid indices `(x, z)`
    pub fn from_fn<F>(width: usize, depth: usize, spacing: f32, f: F) -> Result<Self, TerrainError>
    where
        F: Fn(usize, usize) -> f32,
    {
        let mut heights = Vec::with_capacity(width * depth);
        for z in 0..depth {
            for x in 0..width {
                heights.push(f(x, z));
            }
        }
        Self::new(width, depth, spacing, heights)
    }

    /// Seeded rolling hills from a few octaves of value noise
    ///
    /// Heights fall in `[0, amplitude]`. Same seed, same terrain.
    pub fn generate(
        seed: u64,
        width: usize,
        depth: usize,
        spacing: f32,
        amplitude: f32,
    ) -> Result<Self, TerrainError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut heights = vec![0.0f32; width * depth];
        let octaves: [(usize, f32); 3] = [(32, 0.6), (16, 0.3), (8, 0.1)];

        for (cell, weight) in octaves {
            let lattice_w = width / cell + 2;
            let lattice_d = depth / cell + 2;
            let lattice: Vec<f32> = (0..lattice_w * lattice_d)
                .map(|_| rng.random::<f32>())
                .collect();

            for z in 0..depth {
                let lz = z / cell;
                let tz = smoothstep((z % cell) as f32 / cell as f32);
                for x in 0..width {
                    let lx = x / cell;
                    let tx = smoothstep((x % cell) as f32 / cell as f32);
                    let at = |ix: usize, iz: usize| lattice[iz * lattice_w + ix];
                    let top = lerp(at(lx, lz), at(lx + 1, lz), tx);
                    let bottom = lerp(at(lx, lz + 1), at(lx + 1, lz + 1), tx);
                    heights[z * width + x] += lerp(top, bottom, tz) * weight;
                }
            }
        }

        for h in &mut heights {
            *h *= amplitude;
        }
        Self::new(width, depth, spacing, heights)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// World-space size along X and Z
    pub fn extent(&self) -> Vec2 {
        Vec2::new(
            (self.width - 1) as f32 * self.spacing,
            (self.depth - 1) as f32 * self.spacing,
        )
    }

    /// Raw sample at grid indices
    pub fn get(&self, x: usize, z: usize) -> Option<f32> {
        if x < self.width && z < self.depth {
            Some(self.heights[z * self.width + x])
        } else {
            None
        }
    }

    fn height_at_index(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.width + x]
    }

    fn compute_normals(&self) -> Vec<Vec3> {
        let mut normals = Vec::with_capacity(self.width * self.depth);
        for z in 0..self.depth {
            for x in 0..self.width {
                let x0 = x.saturating_sub(1);
                let x1 = (x + 1).min(self.width - 1);
                let z0 = z.saturating_sub(1);
                let z1 = (z + 1).min(self.depth - 1);

                let dhdx = (self.height_at_index(x1, z) - self.height_at_index(x0, z))
                    / ((x1 - x0) as f32 * self.spacing);
                let dhdz = (self.height_at_index(x, z1) - self.height_at_index(x, z0))
                    / ((z1 - z0) as f32 * self.spacing);

                normals.push(Vec3::new(-dhdx, 1.0, -dhdz).normalize());
            }
        }
        normals
    }

    /// Containing cell and fractional offsets, clamped onto the grid
    fn locate(&self, position: Vec3) -> (usize, usize, f32, f32) {
        let extent = self.extent();
        let local = (Vec2::new(position.x, position.z) - self.origin).clamp(Vec2::ZERO, extent);

        let cell_x = ((local.x / self.spacing) as usize).min(self.width - 2);
        let cell_z = ((local.y / self.spacing) as usize).min(self.depth - 2);
        let fx = ((local.x - cell_x as f32 * self.spacing) / self.spacing).clamp(0.0, 1.0);
        let fz = ((local.y - cell_z as f32 * self.spacing) / self.spacing).clamp(0.0, 1.0);
        (cell_x, cell_z, fx, fz)
    }
}

impl TerrainSampler for Heightmap {
    fn is_in_bounds(&self, position: Vec3) -> bool {
        let local = Vec2::new(position.x, position.z) - self.origin;
        let extent = self.extent();
        local.x >= 0.0 && local.x < extent.x && local.y >= 0.0 && local.y < extent.y
    }

    fn height_and_normal(&self, position: Vec3) -> TerrainSample {
        let (x, z, fx, fz) = self.locate(position);

        let top = lerp(self.height_at_index(x, z), self.height_at_index(x + 1, z), fx);
        let bottom = lerp(
            self.height_at_index(x, z + 1),
            self.height_at_index(x + 1, z + 1),
            fx,
        );
        let height = lerp(top, bottom, fz);

        let n = |ix: usize, iz: usize| self.normals[iz * self.width + ix];
        let top_n = n(x, z).lerp(n(x + 1, z), fx);
        let bottom_n = n(x, z + 1).lerp(n(x + 1, z + 1), fx);
        let normal = top_n.lerp(bottom_n, fz).normalize_or(Vec3::Y);

        TerrainSample { height, normal }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}
