use std::sync::Arc;

use voxstream_blocks::{TextureAtlas, VoxelType};
use voxstream_chunk::{ChunkData, VoxelLookup};
use voxstream_geom::IVec3;
use voxstream_world::ChunkCoord;

use crate::face::Face;
use crate::mesh_build::MeshBuffers;

/// Builds face-culled meshes for single chunks. Reads neighbors outside the
/// chunk through a `VoxelLookup`.
#[derive(Clone, Debug)]
pub struct MeshBuilder {
    atlas: Arc<TextureAtlas>,
}

impl MeshBuilder {
    pub fn new(atlas: Arc<TextureAtlas>) -> Self {
        Self { atlas }
    }

    #[inline]
    fn neighbor<L: VoxelLookup + ?Sized>(chunk: &ChunkData, coord: ChunkCoord, lookup: &L, p: IVec3) -> VoxelType {
        let dims = chunk.dims();
        if dims.contains_local(p) {
            chunk.get(p)
        } else if p.y < 0 || p.y >= dims.height {
            VoxelType::Empty
        } else {
            lookup.voxel_at(coord.to_world(p, dims))
        }
    }

    /// Mesh for `chunk` at `coord`. Vertex positions are chunk-local.
    /// Voxels are visited in `(y, z, x)` order so the output is stable.
    pub fn build<L: VoxelLookup + ?Sized>(&self, chunk: &ChunkData, coord: ChunkCoord, lookup: &L) -> MeshBuffers {
        let mut out = MeshBuffers::default();
        let tile = self.atlas.layout.tile_uv();
        let voxels = chunk.sorted_voxels();
        out.solid.reserve_faces(voxels.len());
        for (p, v) in voxels {
            if v.is_sentinel() {
                continue;
            }
            let origin = [p.x as f32, p.y as f32, p.z as f32];
            for face in Face::ALL {
                if face == Face::NegY && p.y == 0 {
                    continue;
                }
                let n = Self::neighbor(chunk, coord, lookup, p + face.delta());
                if v.is_water() {
                    if n.is_empty() {
                        out.water.add_face(origin, face, (0.0, 0.0), (1.0, 1.0));
                    }
                } else if !n.occludes_solid_face() {
                    let uv0 = self.atlas.uv_origin(v, face.role());
                    out.solid.add_face(origin, face, uv0, tile);
                }
            }
        }
        let (s, w) = out.face_counts();
        log::trace!(target: "mesh", "mesh {coord}: solid_faces={s} water_faces={w}");
        out
    }
}
