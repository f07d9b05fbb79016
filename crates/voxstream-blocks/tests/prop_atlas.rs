use proptest::prelude::*;
use voxstream_blocks::{AtlasConfig, FaceRole, TextureAtlas, VoxelType};

proptest! {
    #[test]
    fn uv_origins_stay_inside_unit_square(idx in 0usize..VoxelType::MATERIALS.len(), side in any::<bool>()) {
        let atlas = TextureAtlas::default();
        let v = VoxelType::MATERIALS[idx];
        let role = if side { FaceRole::Side } else { FaceRole::Top };
        let (u, w) = atlas.uv_origin(v, role);
        let (tu, tv) = atlas.layout.tile_uv();
        prop_assert!(u >= 0.0 && u + tu <= 1.0 + 1e-6);
        prop_assert!(w >= 0.0 && w + tv <= 1.0 + 1e-6);
    }
}

proptest! {
    // Any accepted layout keeps every material's tiles inside the image.
    #[test]
    fn accepted_layouts_keep_uvs_in_range(tile in 1u32..64, w in 1u32..2048, h in 1u32..2048) {
        let cfg = AtlasConfig { tile_px: tile, width_px: w, height_px: h, ..AtlasConfig::default() };
        if let Ok(atlas) = TextureAtlas::from_config(&cfg) {
            let (tu, tv) = atlas.layout.tile_uv();
            for v in VoxelType::MATERIALS {
                for role in [FaceRole::Top, FaceRole::Side] {
                    let (u, w) = atlas.uv_origin(v, role);
                    prop_assert!(u + tu <= 1.0 + 1e-5, "{v} u={u}");
                    prop_assert!(w + tv <= 1.0 + 1e-5, "{v} v={w}");
                }
            }
        }
    }
}
