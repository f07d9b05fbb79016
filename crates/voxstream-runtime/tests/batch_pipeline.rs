use std::sync::Arc;

use crossbeam_channel::unbounded;
use hashbrown::HashMap;
use voxstream_blocks::{TextureAtlas, VoxelType};
use voxstream_chunk::{ChunkData, ChunkState, ChunkStore, TerrainGenerator, TreeGenerator};
use voxstream_geom::IVec3;
use voxstream_mesh::MeshBuilder;
use voxstream_runtime::{BatchContext, BatchPhase, CancelCheck, CancelToken, GenerationError, run_batch};
use voxstream_world::{BiomeProfile, BiomeSelector, ChunkCoord, ChunkDims, NoiseField, NoiseSettings, TreesConfig};

const SEED: i32 = 77;

fn dims() -> ChunkDims {
    ChunkDims::new(8, 24, 8)
}

fn constant(field: &NoiseField, value: f32) -> NoiseSettings {
    let mut s = NoiseSettings {
        zoom: 0.0,
        zoom_offset: 0.0,
        exponent: 1.0,
        ..NoiseSettings::default()
    };
    let n = field.fractal(0.0, 0.0, &s);
    assert!(n > 0.0);
    s.redistribution_multiplier = value / n;
    s
}

/// Ground at y = 5 everywhere, no stone or water. With `trees` every column
/// plants a tree.
fn flat_profile(field: &NoiseField, trees: bool) -> BiomeProfile {
    let h = dims().height as f32;
    let off = NoiseSettings {
        redistribution_multiplier: 0.0,
        ..NoiseSettings::default()
    };
    BiomeProfile {
        noise: constant(field, 5.5 / h),
        secondary_noise: off.clone(),
        tree_noise: if trees { constant(field, 0.1) } else { off },
        water_level_ratio: 0.0,
        tree_threshold: 0.0,
        ..BiomeProfile::forest()
    }
}

fn context(trees: bool) -> BatchContext {
    let field = Arc::new(NoiseField::new(SEED));
    let profile = flat_profile(&field, trees);
    let terrain = TerrainGenerator::new(
        dims(),
        field,
        BiomeSelector::single(profile),
        TreeGenerator::new(TreesConfig::default(), SEED),
    );
    BatchContext {
        store: Arc::new(ChunkStore::new(dims())),
        terrain: Arc::new(terrain),
        mesher: Arc::new(MeshBuilder::new(Arc::new(TextureAtlas::default()))),
    }
}

struct CancelAt(BatchPhase);

impl CancelCheck for CancelAt {
    fn is_cancelled(&self, phase: BatchPhase) -> bool {
        phase == self.0
    }
}

struct PanicAt(BatchPhase);

impl CancelCheck for PanicAt {
    fn is_cancelled(&self, phase: BatchPhase) -> bool {
        if phase == self.0 {
            panic!("boom in {phase:?}");
        }
        false
    }
}

#[test]
fn completed_batch_commits_and_hands_off_every_mesh() {
    let ctx = context(false);
    let coords = [ChunkCoord::new(0, 0), ChunkCoord::new(1, 0), ChunkCoord::new(0, 1)];
    let tickets = ctx.store.mark_generating(&coords);
    let (tx, rx) = unbounded();
    let out = run_batch(&ctx, &tickets, &CancelToken::new(), &tx).expect("batch");
    let mut committed = out.committed.clone();
    committed.sort_unstable();
    let mut expected = coords.to_vec();
    expected.sort_unstable();
    assert_eq!(committed, expected);
    assert!(out.remeshed.is_empty());
    assert_eq!(out.meshes_sent, 3);
    assert_eq!(rx.len(), 3);
    for c in coords {
        assert_eq!(ctx.store.state(c), Some(ChunkState::Ready));
    }
    for m in rx.try_iter() {
        assert!(!m.buffers.solid.is_empty());
        assert!(m.buffers.water.is_empty());
    }
}

#[test]
fn cancellation_in_any_phase_leaves_store_untouched() {
    for phase in [BatchPhase::Terrain, BatchPhase::Trees, BatchPhase::Mesh, BatchPhase::Commit] {
        let ctx = context(true);
        let tickets = ctx.store.mark_generating(&[ChunkCoord::new(0, 0), ChunkCoord::new(-1, 2)]);
        let (tx, rx) = unbounded();
        let res = run_batch(&ctx, &tickets, &CancelAt(phase), &tx);
        assert_eq!(res.unwrap_err(), GenerationError::Cancelled, "phase {phase:?}");
        let counts = ctx.store.counts();
        assert_eq!((counts.ready, counts.generating), (0, 0), "phase {phase:?}");
        assert!(rx.is_empty(), "phase {phase:?}");
    }
}

#[test]
fn cancelled_batch_does_not_touch_ready_neighbors() {
    let ctx = context(true);
    let t = ctx.store.mark_generating(&[ChunkCoord::new(0, 0)]);
    let mut data = HashMap::new();
    data.insert(ChunkCoord::new(0, 0), Arc::new(ChunkData::new(dims())));
    ctx.store.commit_batch(&t, data, HashMap::new());
    let before = ctx.store.get(ChunkCoord::new(0, 0)).expect("ready");

    let tickets = ctx.store.mark_generating(&[ChunkCoord::new(1, 0)]);
    let (tx, _rx) = unbounded();
    let res = run_batch(&ctx, &tickets, &CancelAt(BatchPhase::Commit), &tx);
    assert_eq!(res.unwrap_err(), GenerationError::Cancelled);
    let after = ctx.store.get(ChunkCoord::new(0, 0)).expect("ready");
    assert!(Arc::ptr_eq(&before, &after));
    assert!(after.is_empty());
    assert_eq!(ctx.store.state(ChunkCoord::new(1, 0)), None);
}

#[test]
fn worker_panic_is_reported_and_rolled_back() {
    for phase in [BatchPhase::Terrain, BatchPhase::Trees, BatchPhase::Mesh] {
        let ctx = context(false);
        let tickets = ctx.store.mark_generating(&[ChunkCoord::new(2, 2)]);
        let (tx, rx) = unbounded();
        match run_batch(&ctx, &tickets, &PanicAt(phase), &tx) {
            Err(GenerationError::WorkerPanicked(msg)) => assert!(msg.contains("boom"), "{msg}"),
            other => panic!("expected panic report for {phase:?}, got {other:?}"),
        }
        assert_eq!(ctx.store.state(ChunkCoord::new(2, 2)), None);
        assert!(rx.is_empty());
    }
}

#[test]
fn tree_spill_amends_and_remeshes_ready_neighbor() {
    let ctx = context(true);
    let left = ChunkCoord::new(0, 0);
    let t = ctx.store.mark_generating(&[left]);
    let mut data = HashMap::new();
    data.insert(left, Arc::new(ChunkData::new(dims())));
    ctx.store.commit_batch(&t, data, HashMap::new());

    let tickets = ctx.store.mark_generating(&[ChunkCoord::new(1, 0)]);
    let (tx, rx) = unbounded();
    let out = run_batch(&ctx, &tickets, &CancelToken::new(), &tx).expect("batch");
    assert_eq!(out.committed, vec![ChunkCoord::new(1, 0)]);
    assert_eq!(out.remeshed, vec![left]);
    assert!(out.trees.written > 0);

    let amended = ctx.store.get(left).expect("ready");
    assert!(!amended.is_empty());
    assert!(amended.iter().all(|(_, v)| v == VoxelType::LightLeaves));
    // Canopy from the x = 0 column reaches two cells into the left chunk.
    assert!(amended.iter().all(|(p, _)| p.x >= dims().width - 2));

    let meshed: Vec<ChunkCoord> = rx.try_iter().map(|m| m.coord).collect();
    assert!(meshed.contains(&left));
    assert!(meshed.contains(&ChunkCoord::new(1, 0)));
    assert_eq!(ctx.store.voxel_at(IVec3::new(8, 5, 0)), VoxelType::Grass);
}
