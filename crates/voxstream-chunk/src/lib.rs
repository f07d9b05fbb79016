//! Chunk storage, terrain fill, and tree rasterization.
#![forbid(unsafe_code)]

pub mod data;
pub mod lookup;
pub mod staging;
pub mod store;
pub mod terrain;
pub mod trees;

pub use data::{ChunkData, TreeDescriptor};
pub use lookup::{ChunkMap, PlaceMode, PlaceOutcome, VoxelLookup, VoxelWriter};
pub use staging::{Amendment, BatchStaging};
pub use store::{ChunkState, ChunkStore, ChunkVersion, CommitReport, GenTicket, StoreCounts};
pub use terrain::TerrainGenerator;
pub use trees::{TreeGenerator, TreeReport};
