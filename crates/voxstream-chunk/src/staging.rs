use std::sync::Arc;

use hashbrown::HashMap;
use voxstream_blocks::VoxelType;
use voxstream_geom::IVec3;
use voxstream_world::{ChunkCoord, ChunkDims};

use crate::data::{ChunkData, TreeDescriptor};
use crate::lookup::{PlaceMode, PlaceOutcome, VoxelWriter};

/// Edited copy of a chunk that was already `Ready` when the batch started.
/// `base` is the snapshot it was cloned from, so a commit can tell whether
/// the store still holds that version.
#[derive(Clone, Debug)]
pub struct Amendment {
    pub base: Arc<ChunkData>,
    pub data: ChunkData,
}

/// Write set of a generation batch between terrain fill and commit.
///
/// Writes land in the batch's own chunks, or in amended copies of `Ready`
/// neighbors. Anything else has no owner and is rejected.
pub struct BatchStaging {
    dims: ChunkDims,
    staged: HashMap<ChunkCoord, ChunkData>,
    ready: HashMap<ChunkCoord, Arc<ChunkData>>,
    amended: HashMap<ChunkCoord, Amendment>,
}

impl BatchStaging {
    pub fn new(
        dims: ChunkDims,
        staged: HashMap<ChunkCoord, ChunkData>,
        mut ready: HashMap<ChunkCoord, Arc<ChunkData>>,
    ) -> Self {
        ready.retain(|c, _| !staged.contains_key(c));
        Self {
            dims,
            staged,
            ready,
            amended: HashMap::new(),
        }
    }

    #[inline]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    pub fn amended(&self) -> &HashMap<ChunkCoord, Amendment> {
        &self.amended
    }

    /// Drains the pending trees of every staged chunk, ordered by chunk
    /// coordinate and then planting order.
    pub fn take_trees(&mut self) -> Vec<(ChunkCoord, TreeDescriptor)> {
        let mut coords: Vec<ChunkCoord> = self.staged.keys().copied().collect();
        coords.sort_unstable();
        let mut out = Vec::new();
        for c in coords {
            if let Some(chunk) = self.staged.get_mut(&c) {
                out.extend(chunk.take_trees().into_iter().map(|t| (c, t)));
            }
        }
        out
    }

    pub fn into_parts(
        self,
    ) -> (
        HashMap<ChunkCoord, ChunkData>,
        HashMap<ChunkCoord, Amendment>,
    ) {
        (self.staged, self.amended)
    }

    fn write(chunk: &mut ChunkData, local: IVec3, voxel: VoxelType, mode: PlaceMode) -> PlaceOutcome {
        if mode == PlaceMode::FillEmpty && !chunk.get(local).is_empty() {
            return PlaceOutcome::Occupied;
        }
        if chunk.set(local, voxel) {
            PlaceOutcome::Written
        } else {
            PlaceOutcome::OutOfRange
        }
    }
}

impl VoxelWriter for BatchStaging {
    fn place(&mut self, world: IVec3, voxel: VoxelType, mode: PlaceMode) -> PlaceOutcome {
        if world.y < 0 || world.y >= self.dims.height {
            return PlaceOutcome::OutOfRange;
        }
        let (coord, local) = self.dims.split(world);
        if let Some(chunk) = self.staged.get_mut(&coord) {
            return Self::write(chunk, local, voxel, mode);
        }
        if let Some(a) = self.amended.get_mut(&coord) {
            return Self::write(&mut a.data, local, voxel, mode);
        }
        let Some(base) = self.ready.get(&coord) else {
            return PlaceOutcome::NoOwner;
        };
        if mode == PlaceMode::FillEmpty && !base.get(local).is_empty() {
            return PlaceOutcome::Occupied;
        }
        let mut data = (**base).clone();
        let out = Self::write(&mut data, local, voxel, mode);
        self.amended.insert(
            coord,
            Amendment {
                base: Arc::clone(base),
                data,
            },
        );
        out
    }
}
