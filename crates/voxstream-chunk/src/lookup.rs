use std::sync::Arc;

use hashbrown::HashMap;
use voxstream_blocks::VoxelType;
use voxstream_geom::IVec3;
use voxstream_world::{ChunkCoord, ChunkDims};

use crate::data::ChunkData;

/// Read access to voxels by world position.
///
/// Positions above or below the world's vertical range read as `Empty`;
/// positions whose chunk is not available read as `Unloaded`.
pub trait VoxelLookup {
    fn voxel_at(&self, world: IVec3) -> VoxelType;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaceMode {
    /// Replace whatever is there.
    Overwrite,
    /// Only write into `Empty` cells.
    FillEmpty,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaceOutcome {
    Written,
    Occupied,
    /// The owning chunk is neither in the batch nor loaded.
    NoOwner,
    OutOfRange,
}

/// Write access to voxels by world position.
pub trait VoxelWriter {
    fn place(&mut self, world: IVec3, voxel: VoxelType, mode: PlaceMode) -> PlaceOutcome;
}

/// Immutable set of chunks keyed by coordinate.
#[derive(Clone, Debug)]
pub struct ChunkMap {
    dims: ChunkDims,
    chunks: HashMap<ChunkCoord, Arc<ChunkData>>,
}

impl ChunkMap {
    pub fn new(dims: ChunkDims) -> Self {
        Self {
            dims,
            chunks: HashMap::new(),
        }
    }

    pub fn from_map(dims: ChunkDims, chunks: HashMap<ChunkCoord, Arc<ChunkData>>) -> Self {
        Self { dims, chunks }
    }

    #[inline]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    pub fn insert(&mut self, coord: ChunkCoord, data: Arc<ChunkData>) -> Option<Arc<ChunkData>> {
        self.chunks.insert(coord, data)
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&Arc<ChunkData>> {
        self.chunks.get(&coord)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl VoxelLookup for ChunkMap {
    fn voxel_at(&self, world: IVec3) -> VoxelType {
        if world.y < 0 || world.y >= self.dims.height {
            return VoxelType::Empty;
        }
        let (coord, local) = self.dims.split(world);
        match self.chunks.get(&coord) {
            Some(c) => c.get(local),
            None => VoxelType::Unloaded,
        }
    }
}
