use std::sync::Arc;

use voxstream_blocks::{TextureAtlas, VoxelType};
use voxstream_chunk::{ChunkData, ChunkMap};
use voxstream_geom::IVec3;
use voxstream_mesh::{MeshBuffers, MeshBuilder};
use voxstream_world::{ChunkCoord, ChunkDims};

fn builder() -> MeshBuilder {
    MeshBuilder::new(Arc::new(TextureAtlas::default()))
}

fn single_voxel(dims: ChunkDims, v: VoxelType) -> ChunkData {
    let mut c = ChunkData::new(dims);
    c.set(IVec3::ZERO, v);
    c
}

fn mesh(chunk: &ChunkData, map: &ChunkMap) -> MeshBuffers {
    builder().build(chunk, ChunkCoord::new(0, 0), map)
}

#[test]
fn lone_voxel_with_air_around_has_five_faces() {
    let dims = ChunkDims::new(1, 1, 1);
    let chunk = single_voxel(dims, VoxelType::LightRocks);
    let mut map = ChunkMap::new(dims);
    for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        map.insert(ChunkCoord::new(dx, dz), Arc::new(ChunkData::new(dims)));
    }
    let m = mesh(&chunk, &map);
    assert_eq!(m.solid.face_count(), 5);
    assert_eq!(m.solid.vertex_count(), 20);
    assert_eq!(m.solid.idx.len(), 30);
    assert!(m.water.is_empty());
}

#[test]
fn unloaded_neighbors_cull_lateral_faces() {
    let dims = ChunkDims::new(1, 1, 1);
    let chunk = single_voxel(dims, VoxelType::LightRocks);
    let m = mesh(&chunk, &ChunkMap::new(dims));
    assert_eq!(m.face_counts(), (1, 0));
    // the surviving face is the top one
    assert!(m.solid.pos.chunks(3).all(|p| p[1] == 1.0));
}

#[test]
fn water_surface_only_faces_air() {
    let dims = ChunkDims::new(3, 3, 3);
    let mut c = ChunkData::new(dims);
    for x in 0..3 {
        for y in 0..2 {
            for z in 0..3 {
                c.set(IVec3::new(x, y, z), VoxelType::DarkRocks);
            }
        }
    }
    c.set(IVec3::new(1, 1, 1), VoxelType::Water);
    for x in 0..3 {
        for z in 0..3 {
            if (x, z) != (1, 1) {
                c.set(IVec3::new(x, 2, z), VoxelType::DarkRocks);
            }
        }
    }
    let m = mesh(&c, &ChunkMap::new(dims));
    assert_eq!(m.water.face_count(), 1);
    assert!(m.water.pos.chunks(3).all(|p| p[1] == 2.0));
}

#[test]
fn water_never_faces_water_or_unloaded() {
    let dims = ChunkDims::new(2, 1, 1);
    let mut c = ChunkData::new(dims);
    c.set(IVec3::new(0, 0, 0), VoxelType::Water);
    c.set(IVec3::new(1, 0, 0), VoxelType::Water);
    let m = mesh(&c, &ChunkMap::new(dims));
    // two top faces; shared side and unloaded sides are culled
    assert_eq!(m.face_counts(), (0, 2));
}

#[test]
fn solid_faces_show_through_water() {
    let dims = ChunkDims::new(2, 2, 1);
    let mut c = ChunkData::new(dims);
    c.set(IVec3::new(0, 0, 0), VoxelType::Grass);
    c.set(IVec3::new(1, 0, 0), VoxelType::Water);
    let m = mesh(&c, &ChunkMap::new(dims));
    // grass: top and +x (water neighbor); water: top only
    assert_eq!(m.face_counts(), (2, 1));
}

#[test]
fn bottom_face_at_y_zero_is_always_culled() {
    let dims = ChunkDims::new(1, 3, 1);
    let mut c = ChunkData::new(dims);
    c.set(IVec3::new(0, 0, 0), VoxelType::Grass);
    c.set(IVec3::new(0, 2, 0), VoxelType::Grass);
    let m = mesh(&c, &ChunkMap::new(dims));
    // y=0: top. y=2: top and bottom (air at y=1)
    assert_eq!(m.face_counts(), (3, 0));
}

#[test]
fn water_uvs_cover_whole_texture() {
    let dims = ChunkDims::new(1, 1, 1);
    let chunk = single_voxel(dims, VoxelType::Water);
    let m = mesh(&chunk, &ChunkMap::new(dims));
    assert_eq!(m.water.uv, vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]);
}

#[test]
fn mesh_is_deterministic() {
    let dims = ChunkDims::new(6, 6, 6);
    let mut c = ChunkData::new(dims);
    let mut i = 0;
    for x in 0..6 {
        for y in 0..6 {
            for z in 0..6 {
                i += 1;
                let v = match i % 5 {
                    0 => VoxelType::Water,
                    1 => VoxelType::Grass,
                    2 => VoxelType::LightLeaves,
                    _ => continue,
                };
                c.set(IVec3::new(x, y, z), v);
            }
        }
    }
    let map = ChunkMap::new(dims);
    let a = mesh(&c, &map);
    let b = mesh(&c.clone(), &map);
    assert_eq!(a, b);
}
