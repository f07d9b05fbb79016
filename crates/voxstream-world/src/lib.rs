//! Chunk addressing, noise sampling, and worldgen parameters.
#![forbid(unsafe_code)]

pub mod biome;
pub mod coords;
pub mod noise;
pub mod worldgen;

pub use biome::BiomeSelector;
pub use coords::{ChunkCoord, ChunkDims};
pub use noise::NoiseField;
pub use worldgen::{
    BiomeKind, BiomeProfile, BiomesConfig, CanopyThinning, NoiseSettings, StreamingConfig,
    TreesConfig, WorldGenConfig,
};
