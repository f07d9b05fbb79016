use voxstream_blocks::VoxelType;
use voxstream_geom::IVec3;
use voxstream_world::{BiomeProfile, CanopyThinning, ChunkCoord, ChunkDims, TreesConfig};

use crate::data::TreeDescriptor;
use crate::lookup::{PlaceMode, PlaceOutcome, VoxelWriter};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeReport {
    pub written: usize,
    pub occupied: usize,
    pub dropped: usize,
}

/// Turns tree descriptors into trunk and canopy voxels.
#[derive(Clone, Debug)]
pub struct TreeGenerator {
    cfg: TreesConfig,
    seed: u32,
}

impl TreeGenerator {
    pub fn new(cfg: TreesConfig, seed: i32) -> Self {
        Self {
            cfg,
            seed: seed as u32,
        }
    }

    /// Trunk height from the column's tree noise.
    #[inline]
    pub fn trunk_height(noise: f32, profile: &BiomeProfile) -> i32 {
        let max = profile.max_trunk_height;
        ((noise.fract() * max as f32) as i32).clamp(profile.min_trunk_height, max)
    }

    #[inline]
    pub fn canopy_radius(&self, local_x: i32) -> i32 {
        if local_x % 2 == 0 {
            self.cfg.canopy_radius_even
        } else {
            self.cfg.canopy_radius_odd
        }
    }

    pub fn plan(&self, base: IVec3, noise: f32, profile: &BiomeProfile) -> TreeDescriptor {
        TreeDescriptor {
            base,
            trunk_voxel: profile.trunk_voxel,
            leaf_voxel: profile.leaf_voxel,
            trunk_height: Self::trunk_height(noise, profile),
            canopy_radius: self.canopy_radius(base.x),
        }
    }

    /// Keep probability of a canopy candidate at `dist` from the canopy center.
    #[inline]
    pub fn keep_probability(dist: f32) -> f32 {
        (0.8 - 0.05 * dist).clamp(0.0, 1.0)
    }

    fn keep(&self, world: IVec3, dist: f32) -> bool {
        let p = Self::keep_probability(dist);
        let roll = match self.cfg.canopy_thinning {
            CanopyThinning::Hashed => rand01(world, self.seed),
            CanopyThinning::Random => fastrand::f32(),
        };
        roll < p
    }

    /// Writes one tree. Trunks overwrite, leaves only fill `Empty` cells.
    pub fn rasterize<W: VoxelWriter>(
        &self,
        owner: ChunkCoord,
        dims: ChunkDims,
        tree: &TreeDescriptor,
        writer: &mut W,
    ) -> TreeReport {
        let mut report = TreeReport::default();
        let base = owner.to_world(tree.base, dims);
        for i in 0..tree.trunk_height {
            let p = base + IVec3::new(0, i, 0);
            tally(&mut report, writer.place(p, tree.trunk_voxel, PlaceMode::Overwrite));
        }

        let r = tree.canopy_radius;
        let center = base + IVec3::new(0, tree.trunk_height + r, 0);
        for dy in -r..=r {
            for dz in -r..=r {
                for dx in -r..=r {
                    let off = IVec3::new(dx, dy, dz);
                    let p = center + off;
                    if !self.keep(p, off.length_f32()) {
                        continue;
                    }
                    tally(&mut report, writer.place(p, tree.leaf_voxel, PlaceMode::FillEmpty));
                }
            }
        }

        if report.dropped > 0 {
            log::warn!(
                target: "gen",
                "tree at {:?} in {owner}: {} voxels dropped, owning chunk not loaded",
                base,
                report.dropped
            );
        }
        report
    }
}

fn tally(report: &mut TreeReport, outcome: PlaceOutcome) {
    match outcome {
        PlaceOutcome::Written => report.written += 1,
        PlaceOutcome::Occupied => report.occupied += 1,
        PlaceOutcome::NoOwner => report.dropped += 1,
        PlaceOutcome::OutOfRange => {}
    }
}

fn hash3(ix: i32, iy: i32, iz: i32, seed: u32) -> u32 {
    let mut h = (ix as u32).wrapping_mul(0x85eb_ca6b)
        ^ (iy as u32).wrapping_mul(0x9E37_79B9)
        ^ (iz as u32).wrapping_mul(0xc2b2_ae35)
        ^ seed.wrapping_mul(0x27d4_eb2d);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

#[inline]
fn rand01(p: IVec3, seed: u32) -> f32 {
    let h = hash3(p.x, p.y, p.z, seed);
    ((h & 0x00FF_FFFF) as f32) / 16_777_216.0
}
