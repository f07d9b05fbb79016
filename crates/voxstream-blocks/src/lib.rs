//! Voxel material types and the texture atlas table.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod types;

pub use atlas::{AtlasCell, AtlasError, AtlasConfig, AtlasLayout, TextureAtlas, VoxelTextures};
pub use types::{FaceRole, UnknownVoxelType, VoxelType};
