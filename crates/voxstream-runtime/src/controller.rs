//! Main-thread driver: decides what to load and unload around the viewpoint,
//! runs one generation batch at a time, and hands meshes to the renderer.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use hashbrown::{HashMap, HashSet};
use rayon::{ThreadPool, ThreadPoolBuilder};
use voxstream_blocks::TextureAtlas;
use voxstream_chunk::{ChunkMap, ChunkStore, ChunkVersion, TerrainGenerator, TreeGenerator};
use voxstream_geom::Vec3;
use voxstream_mesh::MeshBuilder;
use voxstream_world::coords::sort_by_distance;
use voxstream_world::{BiomeSelector, ChunkCoord, ChunkDims, NoiseField, WorldGenConfig};

use crate::batch::{BatchContext, BatchOutcome, CancelToken, ReadyMesh, run_batch};
use crate::error::{GenerationError, InitError, SequencingError};
use crate::render::{ChunkRenderer, RenderPool};

/// Coordinates within `radius` of `center` on both axes.
pub fn desired_set(center: ChunkCoord, radius: i32) -> Vec<ChunkCoord> {
    let r = radius.max(0);
    let mut out = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dz in -r..=r {
        for dx in -r..=r {
            out.push(center.offset(dx, dz));
        }
    }
    out
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkDiff {
    /// Nearest to the viewpoint first.
    pub to_create: Vec<ChunkCoord>,
    pub to_remove: HashSet<ChunkCoord>,
}

pub fn diff(desired: &[ChunkCoord], loaded: &[ChunkCoord], viewpoint: Vec3, dims: ChunkDims) -> ChunkDiff {
    let want: HashSet<ChunkCoord> = desired.iter().copied().collect();
    let have: HashSet<ChunkCoord> = loaded.iter().copied().collect();
    let mut to_create: Vec<ChunkCoord> = want.difference(&have).copied().collect();
    sort_by_distance(&mut to_create, viewpoint, dims);
    let to_remove = have.difference(&want).copied().collect();
    ChunkDiff { to_create, to_remove }
}

/// A mesh may be shown only if it was built from the chunk's current slot
/// and is not older than the mesh already on screen.
fn mesh_is_current(current: Option<ChunkVersion>, shown: Option<u64>, mesh: ChunkVersion) -> bool {
    match current {
        Some(v) if v.token == mesh.token => shown.is_none_or(|r| mesh.revision >= r),
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub loaded: usize,
    pub generating: usize,
    pub queued_meshes: usize,
    pub pooled_objects: usize,
    pub live_objects: usize,
    pub batches_completed: u64,
    pub batches_failed: u64,
}

struct BatchDone {
    result: Result<BatchOutcome, GenerationError>,
}

struct InFlight {
    cancel: CancelToken,
    chunks: usize,
}

pub struct StreamingController {
    dims: ChunkDims,
    retention_radius: i32,
    update_interval: f32,
    ctx: BatchContext,
    pool: Arc<ThreadPool>,
    mesh_tx: Sender<ReadyMesh>,
    mesh_rx: Receiver<ReadyMesh>,
    done_tx: Sender<BatchDone>,
    done_rx: Receiver<BatchDone>,
    inflight: Option<InFlight>,
    render: RenderPool,
    /// Revision of the mesh currently shown per chunk.
    uploaded: HashMap<ChunkCoord, u64>,
    since_eval: f32,
    last_center: Option<ChunkCoord>,
    shut_down: bool,
    batches_completed: u64,
    batches_failed: u64,
}

impl StreamingController {
    pub fn init(config: &WorldGenConfig) -> Result<Self, InitError> {
        config.validate().map_err(|e| InitError::Config(e.to_string()))?;
        let atlas = TextureAtlas::from_config(&config.atlas)?;
        let dims = config.chunk;
        let field = Arc::new(NoiseField::new(config.seed));
        let trees = TreeGenerator::new(config.trees.clone(), config.seed);
        let terrain = TerrainGenerator::new(dims, field, BiomeSelector::new(&config.biomes), trees);
        let workers = config.streaming.worker_count();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("voxstream-bg-{i}"))
            .build()?;
        let (mesh_tx, mesh_rx) = unbounded();
        let (done_tx, done_rx) = unbounded();
        log::info!(
            target: "stream",
            "streaming init seed={} chunk={}x{}x{} radius={} interval={}s workers={} canopy_thinning={:?}",
            config.seed,
            dims.width,
            dims.height,
            dims.depth,
            config.streaming.retention_radius,
            config.streaming.update_interval_secs,
            workers,
            config.trees.canopy_thinning
        );
        Ok(Self {
            dims,
            retention_radius: config.streaming.retention_radius,
            update_interval: config.streaming.update_interval_secs,
            ctx: BatchContext {
                store: Arc::new(ChunkStore::new(dims)),
                terrain: Arc::new(terrain),
                mesher: Arc::new(MeshBuilder::new(Arc::new(atlas))),
            },
            pool: Arc::new(pool),
            mesh_tx,
            mesh_rx,
            done_tx,
            done_rx,
            inflight: None,
            render: RenderPool::new(),
            uploaded: HashMap::new(),
            since_eval: 0.0,
            last_center: None,
            shut_down: false,
            batches_completed: 0,
            batches_failed: 0,
        })
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.ctx.store
    }

    #[inline]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    pub fn is_generating(&self) -> bool {
        self.inflight.is_some()
    }

    /// Per-frame entry point. Collects finished batches, re-evaluates the
    /// viewpoint once per interval, and uploads at most one mesh.
    pub fn tick<R: ChunkRenderer + ?Sized>(&mut self, dt: f32, viewpoint: Vec3, renderer: &mut R) {
        if self.shut_down {
            return;
        }
        self.poll_batches();
        self.since_eval += dt.max(0.0);
        if self.since_eval >= self.update_interval {
            self.since_eval = 0.0;
            self.evaluate(viewpoint, renderer);
        }
        self.drain_one(renderer);
    }

    /// Immediate evaluation regardless of the interval and last center.
    pub fn bootstrap<R: ChunkRenderer + ?Sized>(&mut self, viewpoint: Vec3, renderer: &mut R) {
        if self.shut_down {
            return;
        }
        self.poll_batches();
        self.last_center = None;
        self.since_eval = 0.0;
        self.evaluate(viewpoint, renderer);
    }

    fn poll_batches(&mut self) {
        let done: Vec<BatchDone> = self.done_rx.try_iter().collect();
        for d in done {
            self.finish_batch(d);
        }
    }

    fn finish_batch(&mut self, done: BatchDone) {
        let chunks = self.inflight.take().map_or(0, |f| f.chunks);
        match done.result {
            Ok(o) => {
                self.batches_completed += 1;
                log::info!(
                    target: "stream",
                    "batch done chunks={} committed={} remeshed={} meshes={} ms={}",
                    chunks,
                    o.committed.len(),
                    o.remeshed.len(),
                    o.meshes_sent,
                    o.elapsed_ms
                );
            }
            Err(GenerationError::Cancelled) => {
                self.batches_failed += 1;
                self.last_center = None;
                log::info!(target: "stream", "batch of {chunks} chunks cancelled");
            }
            Err(e) => {
                self.batches_failed += 1;
                self.last_center = None;
                log::warn!(target: "stream", "batch of {chunks} chunks failed: {e}; will retry");
            }
        }
    }

    fn evaluate<R: ChunkRenderer + ?Sized>(&mut self, viewpoint: Vec3, renderer: &mut R) {
        if self.inflight.is_some() {
            log::trace!(target: "stream", "skip evaluation: batch in flight");
            return;
        }
        let center = ChunkCoord::containing_point(viewpoint, self.dims);
        if self.last_center == Some(center) {
            return;
        }
        let desired = desired_set(center, self.retention_radius);
        let loaded = self.ctx.store.loaded_coords();
        let ChunkDiff { to_create: create, to_remove } = diff(&desired, &loaded, viewpoint, self.dims);
        let mut removed: Vec<ChunkCoord> = to_remove.into_iter().collect();
        removed.sort_unstable();
        for c in &removed {
            self.evict(*c, renderer);
        }
        self.last_center = Some(center);
        log::debug!(
            target: "stream",
            "evaluate center={center} create={} remove={}",
            create.len(),
            removed.len()
        );
        if !create.is_empty() {
            self.start_batch(&create);
        }
    }

    /// Clears the chunk's render object back into the pool and drops its data.
    pub fn evict<R: ChunkRenderer + ?Sized>(&mut self, coord: ChunkCoord, renderer: &mut R) {
        self.uploaded.remove(&coord);
        self.render.release(coord, renderer);
        self.ctx.store.remove(coord);
        log::trace!(target: "store", "evicted {coord}");
    }

    fn start_batch(&mut self, coords: &[ChunkCoord]) {
        let tickets = self.ctx.store.mark_generating(coords);
        if tickets.is_empty() {
            return;
        }
        let cancel = CancelToken::new();
        self.inflight = Some(InFlight {
            cancel: cancel.clone(),
            chunks: tickets.len(),
        });
        let ctx = self.ctx.clone();
        let mesh_tx = self.mesh_tx.clone();
        let done_tx = self.done_tx.clone();
        self.pool.spawn(move || {
            let result = run_batch(&ctx, &tickets, &cancel, &mesh_tx);
            let _ = done_tx.send(BatchDone { result });
        });
    }

    fn drain_one<R: ChunkRenderer + ?Sized>(&mut self, renderer: &mut R) {
        while let Ok(m) = self.mesh_rx.try_recv() {
            let current = self.ctx.store.version(m.coord);
            let shown = self.uploaded.get(&m.coord).copied();
            if !mesh_is_current(current, shown, m.version) {
                log::trace!(target: "stream", "discard stale mesh for {} ({:?})", m.coord, m.version);
                continue;
            }
            let origin = m.coord.origin(self.dims);
            let id = self.render.acquire(m.coord, origin, renderer);
            renderer.upload(id, &m.buffers);
            self.uploaded.insert(m.coord, m.version.revision);
            let (solid, water) = m.buffers.face_counts();
            log::trace!(target: "mesh", "upload {} solid={solid} water={water}", m.coord);
            return;
        }
    }

    /// Re-meshes a `Ready` chunk after `set_voxel` edits.
    pub fn request_remesh(&self, coord: ChunkCoord) -> Result<(), SequencingError> {
        if self.shut_down {
            return Err(SequencingError::ShutDown);
        }
        if !self.ctx.store.is_ready(coord) {
            log::warn!(target: "stream", "remesh of {coord} rejected: not ready");
            return Err(SequencingError::NotReady(coord));
        }
        let ctx = self.ctx.clone();
        let mesh_tx = self.mesh_tx.clone();
        self.pool.spawn(move || {
            let Some((chunk, version)) = ctx.store.get_versioned(coord) else {
                return;
            };
            let mut view = ChunkMap::from_map(ctx.store.dims(), ctx.store.snapshot());
            view.insert(coord, Arc::clone(&chunk));
            let buffers = ctx.mesher.build(&chunk, coord, &view);
            let _ = mesh_tx.send(ReadyMesh {
                coord,
                version,
                buffers,
            });
        });
        Ok(())
    }

    /// Blocks until the in-flight batch reports, or `timeout` passes.
    /// Returns `true` when no batch is in flight afterwards.
    pub fn wait_for_batch(&mut self, timeout: Duration) -> bool {
        if self.inflight.is_none() {
            return true;
        }
        match self.done_rx.recv_timeout(timeout) {
            Ok(d) => {
                self.finish_batch(d);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                self.inflight = None;
                true
            }
        }
    }

    /// Cancels the in-flight batch. Later ticks do nothing.
    pub fn shutdown(&mut self) {
        if let Some(f) = self.inflight.as_ref() {
            f.cancel.cancel();
        }
        self.shut_down = true;
        log::info!(target: "stream", "streaming shutdown");
    }

    pub fn stats(&self) -> StreamStats {
        let counts = self.ctx.store.counts();
        StreamStats {
            loaded: counts.ready,
            generating: counts.generating,
            queued_meshes: self.mesh_rx.len(),
            pooled_objects: self.render.free_len(),
            live_objects: self.render.live_len(),
            batches_completed: self.batches_completed,
            batches_failed: self.batches_failed,
        }
    }
}

impl Drop for StreamingController {
    fn drop(&mut self) {
        if let Some(f) = self.inflight.as_ref() {
            f.cancel.cancel();
        }
    }
}
