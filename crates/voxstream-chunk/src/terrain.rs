use std::sync::Arc;

use voxstream_blocks::VoxelType;
use voxstream_geom::IVec3;
use voxstream_world::{BiomeProfile, BiomeSelector, ChunkCoord, ChunkDims, NoiseField};

use crate::data::ChunkData;
use crate::trees::TreeGenerator;

/// Result of shaping one column, before voxels are written.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColumnSample {
    pub ground: i32,
    pub stone: bool,
    /// Tree noise after redistribution, in the same units as the trunk rule.
    pub tree_noise: f32,
}

/// Fills chunks column by column from the biome's noise layers.
pub struct TerrainGenerator {
    dims: ChunkDims,
    field: Arc<NoiseField>,
    biomes: BiomeSelector,
    trees: TreeGenerator,
}

impl TerrainGenerator {
    pub fn new(dims: ChunkDims, field: Arc<NoiseField>, biomes: BiomeSelector, trees: TreeGenerator) -> Self {
        Self {
            dims,
            field,
            biomes,
            trees,
        }
    }

    #[inline]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    pub fn biomes(&self) -> &BiomeSelector {
        &self.biomes
    }

    pub fn trees(&self) -> &TreeGenerator {
        &self.trees
    }

    /// Shapes the column at world `(wx, wz)`. Ground is clamped into the
    /// chunk so the top voxel always exists.
    pub fn sample_column(&self, profile: &BiomeProfile, wx: i32, wz: i32) -> ColumnSample {
        let h = self.dims.height;
        let (x, z) = (wx as f32, wz as f32);
        let ground = self.field.column_height(x, z, &profile.noise, h).clamp(0, h - 1);
        let stone = self.field.shaped(x, z, &profile.secondary_noise) * h as f32
            > profile.stone_threshold(h);
        let tree_noise = self.field.shaped(x, z, &profile.tree_noise);
        ColumnSample {
            ground,
            stone,
            tree_noise,
        }
    }

    /// Voxel at height `y` of a column. Stone replaces everything at or
    /// below ground; cells above ground follow the water rule.
    pub fn voxel_for(profile: &BiomeProfile, col: &ColumnSample, y: i32, height: i32) -> VoxelType {
        if y > col.ground {
            if (y as f32) < profile.water_threshold(height) {
                if y == col.ground + 1 {
                    profile.near_water_voxel
                } else {
                    profile.water_voxel
                }
            } else {
                VoxelType::Empty
            }
        } else if col.stone {
            profile.stone_voxel
        } else if y == col.ground {
            profile.top_voxel
        } else {
            profile.under_ground_voxel
        }
    }

    fn fill_column(&self, chunk: &mut ChunkData, profile: &BiomeProfile, origin: IVec3, x: i32, z: i32) {
        let h = self.dims.height;
        let col = self.sample_column(profile, origin.x + x, origin.z + z);
        let mut has_water = false;
        for y in 0..h {
            let v = Self::voxel_for(profile, &col, y, h);
            has_water |= v.is_water();
            chunk.set(IVec3::new(x, y, z), v);
        }
        if has_water {
            return;
        }
        let base_y = col.ground + 1;
        if base_y < h && col.tree_noise * h as f32 > profile.tree_threshold {
            let tree = self.trees.plan(IVec3::new(x, base_y, z), col.tree_noise, profile);
            chunk.push_tree(tree);
        }
    }

    /// Terrain for one chunk, with its trees planted but not rasterized.
    pub fn generate(&self, coord: ChunkCoord) -> ChunkData {
        let profile = self.biomes.select(&self.field, coord, self.dims);
        let origin = coord.origin(self.dims);
        let mut chunk = ChunkData::new(self.dims);
        for x in 0..self.dims.width {
            for z in 0..self.dims.depth {
                self.fill_column(&mut chunk, profile, origin, x, z);
            }
        }
        log::trace!(
            target: "gen",
            "terrain {coord} biome={} voxels={} trees={}",
            profile.kind.name(),
            chunk.len(),
            chunk.trees().len()
        );
        chunk
    }
}
