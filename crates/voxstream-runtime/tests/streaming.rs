use std::time::{Duration, Instant};

use hashbrown::HashMap;
use voxstream_blocks::VoxelType;
use voxstream_geom::{IVec3, Vec3};
use voxstream_mesh::MeshBuffers;
use voxstream_runtime::{ChunkRenderer, InitError, RenderObjectId, SequencingError, StreamingController};
use voxstream_world::{ChunkCoord, ChunkDims, WorldGenConfig};

const WAIT: Duration = Duration::from_secs(60);

#[derive(Default)]
struct RecordingRenderer {
    next: u32,
    created: usize,
    at: HashMap<RenderObjectId, ChunkCoord>,
    uploads: Vec<(RenderObjectId, ChunkCoord)>,
    cleared: Vec<RenderObjectId>,
}

impl ChunkRenderer for RecordingRenderer {
    fn create_object(&mut self) -> RenderObjectId {
        self.next += 1;
        self.created += 1;
        RenderObjectId(self.next)
    }

    fn place_object(&mut self, id: RenderObjectId, coord: ChunkCoord, _origin: IVec3) {
        self.at.insert(id, coord);
    }

    fn upload(&mut self, id: RenderObjectId, _mesh: &MeshBuffers) {
        let coord = self.at[&id];
        self.uploads.push((id, coord));
    }

    fn clear(&mut self, id: RenderObjectId) {
        self.cleared.push(id);
    }
}

fn config() -> WorldGenConfig {
    let mut cfg = WorldGenConfig::default();
    cfg.seed = 99;
    cfg.chunk = ChunkDims::new(8, 32, 8);
    cfg.streaming.retention_radius = 2;
    cfg.streaming.update_interval_secs = 1.0;
    cfg.streaming.workers = Some(2);
    cfg
}

/// Center of chunk `(cx, cz)` in world space.
fn over(cx: i32, cz: i32) -> Vec3 {
    Vec3::new(cx as f32 * 8.0 + 4.0, 20.0, cz as f32 * 8.0 + 4.0)
}

fn drain(ctl: &mut StreamingController, r: &mut RecordingRenderer, at: Vec3) {
    while ctl.stats().queued_meshes > 0 {
        ctl.tick(0.0, at, r);
    }
}

#[test]
fn bootstrap_loads_the_square_around_the_viewpoint() {
    let mut ctl = StreamingController::init(&config()).expect("init");
    let mut r = RecordingRenderer::default();
    ctl.bootstrap(over(0, 0), &mut r);
    assert!(ctl.is_generating());
    assert!(ctl.wait_for_batch(WAIT));

    let stats = ctl.stats();
    assert_eq!(stats.loaded, 25);
    assert_eq!(stats.generating, 0);
    assert_eq!(stats.queued_meshes, 25);
    assert_eq!(stats.batches_completed, 1);
    for c in ctl.store().loaded_coords() {
        assert!(c.chebyshev(ChunkCoord::new(0, 0)) <= 2, "{c}");
    }
}

#[test]
fn at_most_one_mesh_is_uploaded_per_tick() {
    let mut ctl = StreamingController::init(&config()).expect("init");
    let mut r = RecordingRenderer::default();
    ctl.bootstrap(over(0, 0), &mut r);
    assert!(ctl.wait_for_batch(WAIT));

    for i in 1..=25 {
        ctl.tick(0.0, over(0, 0), &mut r);
        assert_eq!(r.uploads.len(), i);
    }
    ctl.tick(0.0, over(0, 0), &mut r);
    assert_eq!(r.uploads.len(), 25);
    assert_eq!(r.created, 25);
    assert_eq!(ctl.stats().live_objects, 25);
}

#[test]
fn evaluation_waits_for_the_update_interval() {
    let mut ctl = StreamingController::init(&config()).expect("init");
    let mut r = RecordingRenderer::default();
    ctl.bootstrap(over(0, 0), &mut r);
    assert!(ctl.wait_for_batch(WAIT));
    drain(&mut ctl, &mut r, over(0, 0));

    ctl.tick(0.4, over(10, 0), &mut r);
    assert!(!ctl.is_generating());
    assert_eq!(ctl.stats().loaded, 25);

    ctl.tick(0.7, over(10, 0), &mut r);
    assert!(ctl.is_generating());
    let s = ctl.stats();
    assert_eq!(s.loaded + s.generating, 25);
    for c in ctl.store().loaded_coords() {
        assert!(c.chebyshev(ChunkCoord::new(10, 0)) <= 2, "{c}");
    }
    assert!(ctl.wait_for_batch(WAIT));
}

#[test]
fn evicted_objects_return_to_the_pool_and_are_reused() {
    let mut ctl = StreamingController::init(&config()).expect("init");
    let mut r = RecordingRenderer::default();
    ctl.bootstrap(over(0, 0), &mut r);
    assert!(ctl.wait_for_batch(WAIT));
    drain(&mut ctl, &mut r, over(0, 0));
    assert_eq!(r.created, 25);

    let far = over(50, 50);
    ctl.tick(1.0, far, &mut r);
    assert_eq!(r.cleared.len(), 25);
    assert!(ctl.wait_for_batch(WAIT));
    let before = r.uploads.len();
    drain(&mut ctl, &mut r, far);

    assert_eq!(r.created, 25);
    let s = ctl.stats();
    assert_eq!(s.live_objects, 25);
    assert_eq!(s.pooled_objects, 0);
    for (_, c) in &r.uploads[before..] {
        assert!(c.chebyshev(ChunkCoord::new(50, 50)) <= 2, "{c}");
    }
}

#[test]
fn meshes_from_an_evicted_generation_are_discarded() {
    let mut ctl = StreamingController::init(&config()).expect("init");
    let mut r = RecordingRenderer::default();
    ctl.bootstrap(over(0, 0), &mut r);
    assert!(ctl.wait_for_batch(WAIT));
    assert_eq!(ctl.stats().queued_meshes, 25);

    // Evict everything while its meshes are still queued, then load the
    // same square again.
    for c in ctl.store().loaded_coords() {
        ctl.evict(c, &mut r);
    }
    ctl.bootstrap(over(0, 0), &mut r);
    assert!(ctl.wait_for_batch(WAIT));
    assert_eq!(ctl.stats().queued_meshes, 50);

    drain(&mut ctl, &mut r, over(0, 0));
    assert_eq!(r.uploads.len(), 25);
    assert_eq!(r.created, 25);
}

#[test]
fn invalid_atlas_is_rejected_at_init() {
    let mut cfg = config();
    cfg.atlas.width_px = 256;
    cfg.atlas.height_px = 256;
    assert!(matches!(StreamingController::init(&cfg), Err(InitError::Atlas(_))));
}

#[test]
fn moving_within_the_same_chunk_schedules_nothing() {
    let mut ctl = StreamingController::init(&config()).expect("init");
    let mut r = RecordingRenderer::default();
    ctl.bootstrap(over(0, 0), &mut r);
    assert!(ctl.wait_for_batch(WAIT));
    ctl.tick(5.0, Vec3::new(1.0, 20.0, 7.0), &mut r);
    assert!(!ctl.is_generating());
    assert_eq!(ctl.stats().batches_completed, 1);
}

#[test]
fn remesh_requires_a_ready_chunk() {
    let mut ctl = StreamingController::init(&config()).expect("init");
    let mut r = RecordingRenderer::default();
    assert_eq!(
        ctl.request_remesh(ChunkCoord::new(0, 0)),
        Err(SequencingError::NotReady(ChunkCoord::new(0, 0)))
    );

    ctl.bootstrap(over(0, 0), &mut r);
    assert!(ctl.wait_for_batch(WAIT));
    drain(&mut ctl, &mut r, over(0, 0));

    let target = ChunkCoord::new(1, 1);
    let origin = target.origin(ctl.dims());
    assert!(ctl.store().set_voxel(origin + IVec3::new(3, 30, 3), VoxelType::DarkRocks));
    ctl.request_remesh(target).expect("ready chunk");

    let t0 = Instant::now();
    while r.uploads.len() < 26 && t0.elapsed() < WAIT {
        ctl.tick(0.0, over(0, 0), &mut r);
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(r.uploads.last().map(|u| u.1), Some(target));
    assert_eq!(r.created, 25);
}

#[test]
fn shutdown_cancels_and_rejects_further_work() {
    let mut ctl = StreamingController::init(&config()).expect("init");
    let mut r = RecordingRenderer::default();
    ctl.bootstrap(over(0, 0), &mut r);
    ctl.shutdown();
    assert!(ctl.wait_for_batch(WAIT));
    let s = ctl.stats();
    assert_eq!(s.generating, 0);
    assert_eq!(s.batches_completed + s.batches_failed, 1);

    ctl.tick(10.0, over(20, 20), &mut r);
    assert!(r.uploads.is_empty());
    assert_eq!(ctl.request_remesh(ChunkCoord::new(0, 0)), Err(SequencingError::ShutDown));
}

#[test]
fn invalid_config_is_rejected_at_init() {
    let mut cfg = config();
    cfg.chunk = ChunkDims::new(0, 10, 8);
    assert!(StreamingController::init(&cfg).is_err());
}
