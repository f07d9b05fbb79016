use hashbrown::HashMap;
use voxstream_blocks::VoxelType;
use voxstream_geom::IVec3;
use voxstream_world::ChunkDims;

/// A tree planted during terrain fill, rasterized once the whole batch has
/// its terrain.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeDescriptor {
    /// Local position of the lowest trunk voxel.
    pub base: IVec3,
    pub trunk_voxel: VoxelType,
    pub leaf_voxel: VoxelType,
    pub trunk_height: i32,
    pub canopy_radius: i32,
}

/// Sparse voxel storage for one chunk. Absent entries read as `Empty`.
#[derive(Clone, Debug)]
pub struct ChunkData {
    dims: ChunkDims,
    voxels: HashMap<IVec3, VoxelType>,
    trees: Vec<TreeDescriptor>,
}

impl ChunkData {
    pub fn new(dims: ChunkDims) -> Self {
        Self {
            dims,
            voxels: HashMap::new(),
            trees: Vec::new(),
        }
    }

    #[inline]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    #[inline]
    pub fn get(&self, local: IVec3) -> VoxelType {
        self.voxels.get(&local).copied().unwrap_or(VoxelType::Empty)
    }

    /// Writes `voxel` at `local`. Writing `Empty` removes the entry.
    /// Out-of-bounds positions and the `Unloaded` sentinel are rejected.
    pub fn set(&mut self, local: IVec3, voxel: VoxelType) -> bool {
        if !self.dims.contains_local(local) || voxel == VoxelType::Unloaded {
            return false;
        }
        if voxel.is_empty() {
            self.voxels.remove(&local);
        } else {
            self.voxels.insert(local, voxel);
        }
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, VoxelType)> + '_ {
        self.voxels.iter().map(|(p, v)| (*p, *v))
    }

    /// Non-empty voxels in ascending `(y, z, x)` order.
    pub fn sorted_voxels(&self) -> Vec<(IVec3, VoxelType)> {
        let mut out: Vec<_> = self.iter().collect();
        out.sort_unstable_by_key(|(p, _)| (p.y, p.z, p.x));
        out
    }

    #[inline]
    pub fn trees(&self) -> &[TreeDescriptor] {
        &self.trees
    }

    #[inline]
    pub fn push_tree(&mut self, tree: TreeDescriptor) {
        self.trees.push(tree);
    }

    /// Removes and returns the pending tree list.
    pub fn take_trees(&mut self) -> Vec<TreeDescriptor> {
        std::mem::take(&mut self.trees)
    }
}
