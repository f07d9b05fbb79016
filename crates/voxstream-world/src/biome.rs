use crate::coords::{ChunkCoord, ChunkDims};
use crate::noise::NoiseField;
use crate::worldgen::{BiomeProfile, BiomesConfig, NoiseSettings};

/// Picks the biome profile a chunk is generated with.
#[derive(Clone, Debug)]
pub struct BiomeSelector {
    profiles: Vec<BiomeProfile>,
    default_idx: usize,
    selector_noise: Option<NoiseSettings>,
}

impl BiomeSelector {
    pub fn new(cfg: &BiomesConfig) -> Self {
        let profiles = cfg.resolved_profiles();
        let default_idx = profiles
            .iter()
            .position(|p| p.kind == cfg.default)
            .unwrap_or(0);
        let names: Vec<&str> = profiles.iter().map(|p| p.kind.name()).collect();
        log::debug!(
            target: "gen",
            "biomes {:?} default={} noise_selected={}",
            names,
            cfg.default.name(),
            cfg.selector_noise.is_some()
        );
        Self {
            profiles,
            default_idx,
            selector_noise: cfg.selector_noise.clone(),
        }
    }

    /// A selector that always returns `profile`.
    pub fn single(profile: BiomeProfile) -> Self {
        Self {
            profiles: vec![profile],
            default_idx: 0,
            selector_noise: None,
        }
    }

    pub fn default_profile(&self) -> &BiomeProfile {
        &self.profiles[self.default_idx]
    }

    /// Maps the selector noise at the chunk origin onto equal-width bands
    /// over the profile list. Without selector noise, the default biome.
    pub fn select(&self, field: &NoiseField, coord: ChunkCoord, dims: ChunkDims) -> &BiomeProfile {
        let Some(s) = self.selector_noise.as_ref() else {
            return self.default_profile();
        };
        let origin = coord.origin(dims);
        let n = field.shaped(origin.x as f32, origin.z as f32, s).clamp(0.0, 1.0);
        let len = self.profiles.len();
        let idx = ((n * len as f32) as usize).min(len - 1);
        &self.profiles[idx]
    }
}
