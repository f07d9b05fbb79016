//! CPU face-culling mesher producing solid and water sub-meshes per chunk.
#![forbid(unsafe_code)]

pub mod build;
pub mod face;
pub mod mesh_build;

pub use build::MeshBuilder;
pub use face::Face;
pub use mesh_build::{MergedMesh, MeshBuffers, SubMesh};
