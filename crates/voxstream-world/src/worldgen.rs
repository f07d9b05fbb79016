use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use voxstream_blocks::{AtlasConfig, VoxelType};

use crate::coords::ChunkDims;

#[derive(Clone, Debug, Deserialize)]
pub struct WorldGenConfig {
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default)]
    pub chunk: ChunkDims,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub trees: TreesConfig,
    #[serde(default)]
    pub atlas: AtlasConfig,
    #[serde(default)]
    pub biomes: BiomesConfig,
}

fn default_seed() -> i32 {
    1337
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            chunk: ChunkDims::default(),
            streaming: StreamingConfig::default(),
            trees: TreesConfig::default(),
            atlas: AtlasConfig::default(),
            biomes: BiomesConfig::default(),
        }
    }
}

impl WorldGenConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: WorldGenConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if !self.chunk.is_valid() {
            return Err(format!(
                "chunk dimensions must be positive, got {}x{}x{}",
                self.chunk.width, self.chunk.height, self.chunk.depth
            )
            .into());
        }
        if self.streaming.retention_radius < 0 {
            return Err("streaming.retention_radius must be >= 0".into());
        }
        if !(self.streaming.update_interval_secs >= 0.0) {
            return Err("streaming.update_interval_secs must be >= 0".into());
        }
        if self.trees.canopy_radius_even < 0 || self.trees.canopy_radius_odd < 0 {
            return Err("trees canopy radii must be >= 0".into());
        }
        for p in self.biomes.resolved_profiles() {
            if p.min_trunk_height < 1 || p.min_trunk_height > p.max_trunk_height {
                return Err(format!(
                    "biome `{}`: trunk heights must satisfy 1 <= min <= max",
                    p.kind.name()
                )
                .into());
            }
            for v in [p.top_voxel, p.under_ground_voxel, p.stone_voxel, p.trunk_voxel] {
                if v.is_sentinel() || v.is_water() {
                    return Err(
                        format!("biome `{}`: `{v}` cannot be a solid layer", p.kind.name()).into(),
                    );
                }
            }
        }
        if !self
            .biomes
            .resolved_profiles()
            .iter()
            .any(|p| p.kind == self.biomes.default)
        {
            return Err(format!("default biome `{}` has no profile", self.biomes.default.name()).into());
        }
        Ok(())
    }
}

/// Parameters for one fractal noise layer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NoiseSettings {
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    #[serde(default = "default_zoom_offset")]
    pub zoom_offset: f32,
    #[serde(default = "default_noise_offset")]
    pub noise_offset: f32,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_amplitude_multiplier")]
    pub amplitude_multiplier: f32,
    #[serde(default = "default_one")]
    pub redistribution_multiplier: f32,
    #[serde(default = "default_one")]
    pub exponent: f32,
}

fn default_zoom() -> f32 {
    0.01
}
fn default_zoom_offset() -> f32 {
    0.01
}
fn default_noise_offset() -> f32 {
    -100.0
}
fn default_octaves() -> u32 {
    5
}
fn default_amplitude_multiplier() -> f32 {
    0.5
}
fn default_one() -> f32 {
    1.0
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            zoom_offset: default_zoom_offset(),
            noise_offset: default_noise_offset(),
            octaves: default_octaves(),
            amplitude_multiplier: default_amplitude_multiplier(),
            redistribution_multiplier: default_one(),
            exponent: default_one(),
        }
    }
}

impl NoiseSettings {
    fn layer(noise_offset: f32, zoom: f32, redistribution_multiplier: f32, exponent: f32) -> Self {
        Self {
            zoom,
            noise_offset,
            redistribution_multiplier,
            exponent,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiomeKind {
    Desert,
    Forest,
    Mountain,
    Beach,
}

impl BiomeKind {
    pub const ALL: [BiomeKind; 4] = [
        BiomeKind::Desert,
        BiomeKind::Forest,
        BiomeKind::Mountain,
        BiomeKind::Beach,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BiomeKind::Desert => "desert",
            BiomeKind::Forest => "forest",
            BiomeKind::Mountain => "mountain",
            BiomeKind::Beach => "beach",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BiomeProfile {
    pub kind: BiomeKind,
    #[serde(default)]
    pub noise: NoiseSettings,
    #[serde(default = "default_secondary_noise")]
    pub secondary_noise: NoiseSettings,
    #[serde(default = "default_tree_noise")]
    pub tree_noise: NoiseSettings,
    /// Water fills empty cells below `water_level_ratio * height`.
    #[serde(default = "default_water_level_ratio")]
    pub water_level_ratio: f32,
    /// Stone replaces a column when secondary noise exceeds
    /// `(1 - stone_probability) * height`.
    #[serde(default = "default_stone_probability")]
    pub stone_probability: f32,
    #[serde(default = "default_top_voxel")]
    pub top_voxel: VoxelType,
    #[serde(default = "default_under_ground_voxel")]
    pub under_ground_voxel: VoxelType,
    #[serde(default = "default_water_voxel")]
    pub water_voxel: VoxelType,
    #[serde(default = "default_near_water_voxel")]
    pub near_water_voxel: VoxelType,
    #[serde(default = "default_stone_voxel")]
    pub stone_voxel: VoxelType,
    #[serde(default = "default_tree_threshold")]
    pub tree_threshold: f32,
    #[serde(default = "default_trunk_voxel")]
    pub trunk_voxel: VoxelType,
    #[serde(default = "default_leaf_voxel")]
    pub leaf_voxel: VoxelType,
    #[serde(default = "default_min_trunk_height")]
    pub min_trunk_height: i32,
    #[serde(default = "default_max_trunk_height")]
    pub max_trunk_height: i32,
}

fn default_secondary_noise() -> NoiseSettings {
    NoiseSettings::layer(431.3, 0.02, 1.0, 1.0)
}
fn default_tree_noise() -> NoiseSettings {
    NoiseSettings::layer(-812.7, 0.99, 1.0, 8.0)
}
fn default_water_level_ratio() -> f32 {
    0.3
}
fn default_stone_probability() -> f32 {
    0.3
}
fn default_top_voxel() -> VoxelType {
    VoxelType::Grass
}
fn default_under_ground_voxel() -> VoxelType {
    VoxelType::DarkSand
}
fn default_water_voxel() -> VoxelType {
    VoxelType::Water
}
fn default_near_water_voxel() -> VoxelType {
    VoxelType::LightSand
}
fn default_stone_voxel() -> VoxelType {
    VoxelType::LightRocks
}
fn default_tree_threshold() -> f32 {
    15.0
}
fn default_trunk_voxel() -> VoxelType {
    VoxelType::LightTrunk
}
fn default_leaf_voxel() -> VoxelType {
    VoxelType::LightLeaves
}
fn default_min_trunk_height() -> i32 {
    4
}
fn default_max_trunk_height() -> i32 {
    7
}

impl BiomeProfile {
    pub fn forest() -> Self {
        Self {
            kind: BiomeKind::Forest,
            noise: NoiseSettings::layer(-100.0, 0.01, 1.0, 1.5),
            secondary_noise: default_secondary_noise(),
            tree_noise: default_tree_noise(),
            water_level_ratio: default_water_level_ratio(),
            stone_probability: default_stone_probability(),
            top_voxel: default_top_voxel(),
            under_ground_voxel: default_under_ground_voxel(),
            water_voxel: default_water_voxel(),
            near_water_voxel: default_near_water_voxel(),
            stone_voxel: default_stone_voxel(),
            tree_threshold: default_tree_threshold(),
            trunk_voxel: default_trunk_voxel(),
            leaf_voxel: default_leaf_voxel(),
            min_trunk_height: default_min_trunk_height(),
            max_trunk_height: default_max_trunk_height(),
        }
    }

    pub fn desert() -> Self {
        Self {
            kind: BiomeKind::Desert,
            noise: NoiseSettings::layer(-100.0, 0.008, 1.0, 1.2),
            water_level_ratio: 0.2,
            stone_probability: 0.15,
            top_voxel: VoxelType::LightSand,
            under_ground_voxel: VoxelType::DarkSand,
            water_voxel: VoxelType::DarkWater,
            near_water_voxel: VoxelType::DarkSand,
            stone_voxel: VoxelType::DarkRocks,
            tree_threshold: 40.0,
            trunk_voxel: VoxelType::PurpleTrunk,
            leaf_voxel: VoxelType::PinkLeavesA,
            ..Self::forest()
        }
    }

    pub fn mountain() -> Self {
        Self {
            kind: BiomeKind::Mountain,
            noise: NoiseSettings::layer(-100.0, 0.015, 1.25, 1.8),
            stone_probability: 0.6,
            top_voxel: VoxelType::DarkGrass,
            under_ground_voxel: VoxelType::DarkRocks,
            stone_voxel: VoxelType::LightRocks,
            tree_threshold: 25.0,
            trunk_voxel: VoxelType::DarkTrunk,
            leaf_voxel: VoxelType::DarkLeaves,
            ..Self::forest()
        }
    }

    pub fn beach() -> Self {
        Self {
            kind: BiomeKind::Beach,
            noise: NoiseSettings::layer(-100.0, 0.006, 0.9, 1.0),
            water_level_ratio: 0.45,
            stone_probability: 0.05,
            top_voxel: VoxelType::LightSand,
            under_ground_voxel: VoxelType::LightSand,
            near_water_voxel: VoxelType::LightSand,
            tree_threshold: 20.0,
            trunk_voxel: VoxelType::MediumTrunk,
            leaf_voxel: VoxelType::FlowerLeaves,
            ..Self::forest()
        }
    }

    pub fn builtin(kind: BiomeKind) -> Self {
        match kind {
            BiomeKind::Desert => Self::desert(),
            BiomeKind::Forest => Self::forest(),
            BiomeKind::Mountain => Self::mountain(),
            BiomeKind::Beach => Self::beach(),
        }
    }

    #[inline]
    pub fn water_threshold(&self, height: i32) -> f32 {
        self.water_level_ratio * height as f32
    }

    #[inline]
    pub fn stone_threshold(&self, height: i32) -> f32 {
        (1.0 - self.stone_probability) * height as f32
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomesConfig {
    #[serde(default = "default_biome")]
    pub default: BiomeKind,
    /// When set, picks a biome per chunk from this noise layer.
    #[serde(default)]
    pub selector_noise: Option<NoiseSettings>,
    #[serde(default)]
    pub profiles: Vec<BiomeProfile>,
}

fn default_biome() -> BiomeKind {
    BiomeKind::Forest
}

impl Default for BiomesConfig {
    fn default() -> Self {
        Self {
            default: default_biome(),
            selector_noise: None,
            profiles: Vec::new(),
        }
    }
}

impl BiomesConfig {
    /// Configured profiles, or the four built-ins when none are given.
    pub fn resolved_profiles(&self) -> Vec<BiomeProfile> {
        if self.profiles.is_empty() {
            BiomeKind::ALL.iter().map(|k| BiomeProfile::builtin(*k)).collect()
        } else {
            self.profiles.clone()
        }
    }
}

/// How canopy candidates are thinned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanopyThinning {
    /// Keep/drop decided by a hash of the world position and seed.
    Hashed,
    /// Keep/drop drawn from a process-random generator.
    Random,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TreesConfig {
    #[serde(default = "default_canopy_thinning")]
    pub canopy_thinning: CanopyThinning,
    #[serde(default = "default_canopy_radius_even")]
    pub canopy_radius_even: i32,
    #[serde(default = "default_canopy_radius_odd")]
    pub canopy_radius_odd: i32,
}

fn default_canopy_thinning() -> CanopyThinning {
    CanopyThinning::Hashed
}
fn default_canopy_radius_even() -> i32 {
    2
}
fn default_canopy_radius_odd() -> i32 {
    1
}

impl Default for TreesConfig {
    fn default() -> Self {
        Self {
            canopy_thinning: default_canopy_thinning(),
            canopy_radius_even: default_canopy_radius_even(),
            canopy_radius_odd: default_canopy_radius_odd(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "default_retention_radius")]
    pub retention_radius: i32,
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: f32,
    /// Worker threads; `None` uses available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_retention_radius() -> i32 {
    2
}
fn default_update_interval() -> f32 {
    2.0
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            retention_radius: default_retention_radius(),
            update_interval_secs: default_update_interval(),
            workers: None,
        }
    }
}

impl StreamingConfig {
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|w| *w > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }
}
