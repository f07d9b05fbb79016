//! Two-phase generation batch: terrain and trees, join, then meshing.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crossbeam_channel::Sender;
use hashbrown::HashMap;
use rayon::prelude::*;
use voxstream_chunk::{
    BatchStaging, ChunkData, ChunkMap, ChunkStore, ChunkVersion, GenTicket, TerrainGenerator, TreeReport,
};
use voxstream_mesh::{MeshBuffers, MeshBuilder};
use voxstream_world::ChunkCoord;

use crate::error::GenerationError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BatchPhase {
    Terrain,
    Trees,
    Mesh,
    Commit,
}

/// Polled between chunks and between phases.
pub trait CancelCheck: Sync {
    fn is_cancelled(&self, phase: BatchPhase) -> bool;
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl CancelCheck for CancelToken {
    fn is_cancelled(&self, _phase: BatchPhase) -> bool {
        self.is_set()
    }
}

/// Shared handles a batch needs. Cloned into each spawned batch.
#[derive(Clone)]
pub struct BatchContext {
    pub store: Arc<ChunkStore>,
    pub terrain: Arc<TerrainGenerator>,
    pub mesher: Arc<MeshBuilder>,
}

/// A finished mesh waiting for the main thread.
#[derive(Clone, Debug)]
pub struct ReadyMesh {
    pub coord: ChunkCoord,
    /// Store version of the data the mesh was built from.
    pub version: ChunkVersion,
    pub buffers: MeshBuffers,
}

#[derive(Clone, Debug, Default)]
pub struct BatchOutcome {
    /// Batch coordinates that became `Ready`.
    pub committed: Vec<ChunkCoord>,
    /// Already-loaded neighbors whose data changed from tree spill.
    pub remeshed: Vec<ChunkCoord>,
    pub trees: TreeReport,
    pub meshes_sent: usize,
    pub elapsed_ms: u32,
}

fn panic_message(p: &(dyn Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn guarded<T>(f: impl FnOnce() -> Result<T, GenerationError>) -> Result<T, GenerationError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => r,
        Err(p) => Err(GenerationError::WorkerPanicked(panic_message(p.as_ref()))),
    }
}

#[inline]
fn ms_since(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

/// Runs one batch to completion and pushes its meshes onto `handoff`.
///
/// On any error every ticket still held is rolled back, so the batch leaves
/// the store exactly as it found it.
pub fn run_batch<C: CancelCheck + ?Sized>(
    ctx: &BatchContext,
    tickets: &[GenTicket],
    cancel: &C,
    handoff: &Sender<ReadyMesh>,
) -> Result<BatchOutcome, GenerationError> {
    let t0 = Instant::now();
    match generate_batch(ctx, tickets, cancel) {
        Ok((mut outcome, meshes)) => {
            for m in meshes {
                if handoff.send(m).is_err() {
                    log::debug!(target: "stream", "handoff receiver gone; dropping meshes");
                    break;
                }
                outcome.meshes_sent += 1;
            }
            outcome.elapsed_ms = ms_since(t0);
            Ok(outcome)
        }
        Err(e) => {
            let n = ctx.store.rollback(tickets);
            log::debug!(target: "gen", "batch failed ({e}); rolled back {n} chunks");
            Err(e)
        }
    }
}

fn generate_batch<C: CancelCheck + ?Sized>(
    ctx: &BatchContext,
    tickets: &[GenTicket],
    cancel: &C,
) -> Result<(BatchOutcome, Vec<ReadyMesh>), GenerationError> {
    let dims = ctx.store.dims();

    // Phase A: terrain per chunk, joined before trees.
    let t_terrain = Instant::now();
    let terrain: Vec<(ChunkCoord, ChunkData)> = tickets
        .par_iter()
        .map(|t| {
            guarded(|| {
                if cancel.is_cancelled(BatchPhase::Terrain) {
                    return Err(GenerationError::Cancelled);
                }
                Ok((t.coord, ctx.terrain.generate(t.coord)))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let terrain_ms = ms_since(t_terrain);

    let t_trees = Instant::now();
    let staged: HashMap<ChunkCoord, ChunkData> = terrain.into_iter().collect();
    let (staged, amendments, tree_report) = guarded(|| {
        if cancel.is_cancelled(BatchPhase::Trees) {
            return Err(GenerationError::Cancelled);
        }
        let mut staging = BatchStaging::new(dims, staged, ctx.store.snapshot());
        let mut report = TreeReport::default();
        for (owner, tree) in staging.take_trees() {
            let r = ctx.terrain.trees().rasterize(owner, dims, &tree, &mut staging);
            report.written += r.written;
            report.occupied += r.occupied;
            report.dropped += r.dropped;
        }
        let (s, a) = staging.into_parts();
        Ok((s, a, report))
    })?;
    let trees_ms = ms_since(t_trees);

    // Phase B: mesh every batch chunk and every amended neighbor against one
    // consistent view.
    let t_mesh = Instant::now();
    let mut view = ChunkMap::from_map(dims, ctx.store.snapshot());
    let mut data = HashMap::with_capacity(staged.len());
    let mut targets = Vec::with_capacity(staged.len() + amendments.len());
    for (c, d) in staged {
        let d = Arc::new(d);
        view.insert(c, Arc::clone(&d));
        targets.push((c, Arc::clone(&d)));
        data.insert(c, d);
    }
    let mut amended = HashMap::with_capacity(amendments.len());
    let mut bases = HashMap::with_capacity(amendments.len());
    for (c, a) in amendments {
        let d = Arc::new(a.data);
        view.insert(c, Arc::clone(&d));
        targets.push((c, Arc::clone(&d)));
        amended.insert(c, d);
        bases.insert(c, a.base);
    }
    targets.sort_unstable_by_key(|(c, _)| *c);

    let view = &view;
    let built: Vec<(ChunkCoord, MeshBuffers)> = targets
        .par_iter()
        .map(|(coord, chunk)| {
            guarded(|| {
                if cancel.is_cancelled(BatchPhase::Mesh) {
                    return Err(GenerationError::Cancelled);
                }
                Ok((*coord, ctx.mesher.build(chunk, *coord, view)))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mesh_ms = ms_since(t_mesh);

    if cancel.is_cancelled(BatchPhase::Commit) {
        return Err(GenerationError::Cancelled);
    }
    let report = ctx.store.commit(tickets, data, amended, &bases);
    let meshes: Vec<ReadyMesh> = built
        .into_iter()
        .filter_map(|(coord, buffers)| {
            report.versions.get(&coord).map(|v| ReadyMesh {
                coord,
                version: *v,
                buffers,
            })
        })
        .collect();
    let (committed, remeshed) = (report.committed, report.replaced);

    log::debug!(
        target: "gen",
        "batch chunks={} committed={} remeshed={} leaves+trunks={} terrain_ms={} trees_ms={} mesh_ms={}",
        tickets.len(),
        committed.len(),
        remeshed.len(),
        tree_report.written,
        terrain_ms,
        trees_ms,
        mesh_ms
    );

    Ok((
        BatchOutcome {
            committed,
            remeshed,
            trees: tree_report,
            meshes_sent: 0,
            elapsed_ms: 0,
        },
        meshes,
    ))
}
