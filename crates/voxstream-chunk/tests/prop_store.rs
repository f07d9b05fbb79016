use hashbrown::HashSet;
use proptest::prelude::*;
use voxstream_chunk::{ChunkData, ChunkStore};
use voxstream_blocks::VoxelType;
use voxstream_geom::{IVec3, Vec3};
use voxstream_world::{ChunkCoord, ChunkDims};

fn coord() -> impl Strategy<Value = ChunkCoord> {
    (-6i32..6, -6i32..6).prop_map(|(x, z)| ChunkCoord::new(x, z))
}

proptest! {
    // create/remove partition: created are absent desired, removed are loaded undesired
    #[test]
    fn diff_partitions_desired_and_loaded(
        loaded in prop::collection::vec(coord(), 0..20),
        desired in prop::collection::vec(coord(), 0..20),
        px in -50.0f32..50.0, pz in -50.0f32..50.0,
    ) {
        let store = ChunkStore::new(ChunkDims::default());
        store.mark_generating(&loaded);
        let loaded_set: HashSet<_> = loaded.iter().copied().collect();
        let desired_set: HashSet<_> = desired.iter().copied().collect();

        let create = store.non_existing_chunks(&desired, Vec3::new(px, 0.0, pz));
        let create_set: HashSet<_> = create.iter().copied().collect();
        prop_assert_eq!(create.len(), create_set.len());
        let expect_create: HashSet<_> = desired_set.difference(&loaded_set).copied().collect();
        prop_assert_eq!(create_set, expect_create);

        let remove = store.excess_chunks(&desired);
        let expect_remove: HashSet<_> = loaded_set.difference(&desired_set).copied().collect();
        prop_assert_eq!(remove, expect_remove);

        let d = ChunkDims::default();
        let p = Vec3::new(px, 0.0, pz);
        for w in create.windows(2) {
            prop_assert!(w[0].distance_to(p, d) <= w[1].distance_to(p, d));
        }
    }

    #[test]
    fn chunk_set_get_agree(x in 0i32..15, y in 0i32..100, z in 0i32..15, pick in 0usize..18) {
        let mut c = ChunkData::new(ChunkDims::default());
        let v = VoxelType::MATERIALS[pick];
        prop_assert!(c.set(IVec3::new(x, y, z), v));
        prop_assert_eq!(c.get(IVec3::new(x, y, z)), v);
        prop_assert_eq!(c.len(), 1);
    }
}
