//! Shared chunk table: lifecycle state per coordinate plus the voxel data of
//! `Ready` chunks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::{HashMap, HashSet};
use voxstream_blocks::VoxelType;
use voxstream_geom::{IVec3, Vec3};
use voxstream_world::coords::sort_by_distance;
use voxstream_world::{ChunkCoord, ChunkDims};

use crate::data::ChunkData;
use crate::lookup::VoxelLookup;
use crate::staging::Amendment;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Generating,
    Ready,
}

/// Claim on a coordinate handed out by `mark_generating`. Only the holder of
/// the current ticket may commit or roll back the slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenTicket {
    pub coord: ChunkCoord,
    pub token: u64,
}

/// Identifies the exact data a `Ready` slot holds. `token` changes when the
/// coordinate is evicted and generated again; `revision` grows on every
/// commit, amendment and voxel edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkVersion {
    pub token: u64,
    pub revision: u64,
}

/// Result of `ChunkStore::commit`.
#[derive(Clone, Debug, Default)]
pub struct CommitReport {
    /// Batch coordinates that became `Ready`.
    pub committed: Vec<ChunkCoord>,
    /// Amended neighbors whose data was replaced.
    pub replaced: Vec<ChunkCoord>,
    /// Version of every committed or replaced chunk.
    pub versions: HashMap<ChunkCoord, ChunkVersion>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub ready: usize,
    pub generating: usize,
}

struct Slot {
    state: ChunkState,
    token: u64,
    revision: u64,
    data: Option<Arc<ChunkData>>,
}

impl Slot {
    fn version(&self) -> ChunkVersion {
        ChunkVersion {
            token: self.token,
            revision: self.revision,
        }
    }
}

pub struct ChunkStore {
    dims: ChunkDims,
    slots: RwLock<HashMap<ChunkCoord, Slot>>,
    next_token: AtomicU64,
}

impl ChunkStore {
    pub fn new(dims: ChunkDims) -> Self {
        Self {
            dims,
            slots: RwLock::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ChunkCoord, Slot>> {
        self.slots.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ChunkCoord, Slot>> {
        self.slots.write().unwrap_or_else(|e| e.into_inner())
    }

    /// `None` means the coordinate is absent.
    pub fn state(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.read().get(&coord).map(|s| s.state)
    }

    pub fn is_ready(&self, coord: ChunkCoord) -> bool {
        self.state(coord) == Some(ChunkState::Ready)
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<Arc<ChunkData>> {
        self.read().get(&coord).and_then(|s| s.data.clone())
    }

    /// Version of a `Ready` chunk.
    pub fn version(&self, coord: ChunkCoord) -> Option<ChunkVersion> {
        self.read()
            .get(&coord)
            .filter(|s| s.state == ChunkState::Ready)
            .map(Slot::version)
    }

    /// Data and version of a `Ready` chunk, read together.
    pub fn get_versioned(&self, coord: ChunkCoord) -> Option<(Arc<ChunkData>, ChunkVersion)> {
        let slots = self.read();
        let s = slots.get(&coord).filter(|s| s.state == ChunkState::Ready)?;
        s.data.clone().map(|d| (d, s.version()))
    }

    fn next_id(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    pub fn counts(&self) -> StoreCounts {
        let slots = self.read();
        let mut c = StoreCounts::default();
        for s in slots.values() {
            match s.state {
                ChunkState::Ready => c.ready += 1,
                ChunkState::Generating => c.generating += 1,
            }
        }
        c
    }

    /// Every coordinate with a slot, in either state.
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut v: Vec<_> = self.read().keys().copied().collect();
        v.sort_unstable();
        v
    }

    /// `Empty` outside the vertical range, `Unloaded` unless the owning chunk
    /// is `Ready`.
    pub fn voxel_at(&self, world: IVec3) -> VoxelType {
        if world.y < 0 || world.y >= self.dims.height {
            return VoxelType::Empty;
        }
        let (coord, local) = self.dims.split(world);
        match self.read().get(&coord) {
            Some(Slot {
                state: ChunkState::Ready,
                data: Some(d),
                ..
            }) => d.get(local),
            _ => VoxelType::Unloaded,
        }
    }

    /// Writes a voxel into a `Ready` chunk. Does not re-mesh.
    pub fn set_voxel(&self, world: IVec3, voxel: VoxelType) -> bool {
        if world.y < 0 || world.y >= self.dims.height {
            return false;
        }
        let (coord, local) = self.dims.split(world);
        let mut slots = self.write();
        let Some(slot) = slots.get_mut(&coord) else {
            return false;
        };
        if slot.state != ChunkState::Ready {
            return false;
        }
        let written = match slot.data.as_mut() {
            Some(data) => Arc::make_mut(data).set(local, voxel),
            None => false,
        };
        if written {
            slot.revision = self.next_id();
        }
        written
    }

    /// Candidates with no slot, nearest to `reference` first.
    pub fn non_existing_chunks(&self, candidates: &[ChunkCoord], reference: Vec3) -> Vec<ChunkCoord> {
        let slots = self.read();
        let mut seen = HashSet::new();
        let mut out: Vec<ChunkCoord> = candidates
            .iter()
            .copied()
            .filter(|c| !slots.contains_key(c) && seen.insert(*c))
            .collect();
        drop(slots);
        sort_by_distance(&mut out, reference, self.dims);
        out
    }

    /// Coordinates holding a slot that are not among `candidates`.
    pub fn excess_chunks(&self, candidates: &[ChunkCoord]) -> HashSet<ChunkCoord> {
        let keep: HashSet<ChunkCoord> = candidates.iter().copied().collect();
        self.read()
            .keys()
            .filter(|c| !keep.contains(*c))
            .copied()
            .collect()
    }

    /// Moves every absent coordinate in `coords` to `Generating` and returns
    /// a ticket for each. Coordinates that already have a slot are skipped.
    pub fn mark_generating(&self, coords: &[ChunkCoord]) -> Vec<GenTicket> {
        let mut slots = self.write();
        let mut tickets = Vec::with_capacity(coords.len());
        for c in coords {
            if slots.contains_key(c) {
                continue;
            }
            let token = self.next_id();
            slots.insert(
                *c,
                Slot {
                    state: ChunkState::Generating,
                    token,
                    revision: 0,
                    data: None,
                },
            );
            tickets.push(GenTicket { coord: *c, token });
        }
        tickets
    }

    /// Publishes a finished batch in one step.
    ///
    /// A ticket whose slot was evicted or re-claimed is skipped. An amendment
    /// applies only if the store still holds the exact snapshot it was cloned
    /// from. Every chunk that changes gets a fresh revision.
    pub fn commit(
        &self,
        tickets: &[GenTicket],
        mut data: HashMap<ChunkCoord, Arc<ChunkData>>,
        amended: HashMap<ChunkCoord, Arc<ChunkData>>,
        bases: &HashMap<ChunkCoord, Arc<ChunkData>>,
    ) -> CommitReport {
        let mut slots = self.write();
        let mut versions = HashMap::with_capacity(tickets.len() + amended.len());
        let mut committed = Vec::with_capacity(tickets.len());
        for t in tickets {
            let Some(slot) = slots.get_mut(&t.coord) else {
                log::debug!(target: "store", "skip commit of evicted chunk {}", t.coord);
                continue;
            };
            if slot.token != t.token || slot.state != ChunkState::Generating {
                log::debug!(target: "store", "skip commit of re-claimed chunk {}", t.coord);
                continue;
            }
            let Some(d) = data.remove(&t.coord) else {
                log::warn!(target: "store", "batch produced no data for {}; dropping slot", t.coord);
                slots.remove(&t.coord);
                continue;
            };
            slot.state = ChunkState::Ready;
            slot.data = Some(d);
            slot.revision = self.next_id();
            versions.insert(t.coord, slot.version());
            committed.push(t.coord);
        }
        let mut replaced = Vec::new();
        for (coord, new_data) in amended {
            let Some(slot) = slots.get_mut(&coord) else {
                continue;
            };
            let same_base = match (slot.data.as_ref(), bases.get(&coord)) {
                (Some(cur), Some(base)) => Arc::ptr_eq(cur, base),
                _ => false,
            };
            if slot.state == ChunkState::Ready && same_base {
                slot.data = Some(new_data);
                slot.revision = self.next_id();
                versions.insert(coord, slot.version());
                replaced.push(coord);
            } else {
                log::warn!(target: "store", "neighbor {coord} changed during batch; tree spill dropped");
            }
        }
        CommitReport {
            committed,
            replaced,
            versions,
        }
    }

    /// Convenience over `commit` that takes amendments as produced by staging.
    pub fn commit_batch(
        &self,
        tickets: &[GenTicket],
        data: HashMap<ChunkCoord, Arc<ChunkData>>,
        amendments: HashMap<ChunkCoord, Amendment>,
    ) -> (Vec<ChunkCoord>, Vec<ChunkCoord>) {
        let mut amended = HashMap::with_capacity(amendments.len());
        let mut bases = HashMap::with_capacity(amendments.len());
        for (c, a) in amendments {
            bases.insert(c, a.base);
            amended.insert(c, Arc::new(a.data));
        }
        let r = self.commit(tickets, data, amended, &bases);
        (r.committed, r.replaced)
    }

    /// Returns every ticketed slot that is still `Generating` under the same
    /// token back to absent.
    pub fn rollback(&self, tickets: &[GenTicket]) -> usize {
        let mut slots = self.write();
        let mut n = 0;
        for t in tickets {
            let owned = slots
                .get(&t.coord)
                .is_some_and(|s| s.token == t.token && s.state == ChunkState::Generating);
            if owned {
                slots.remove(&t.coord);
                n += 1;
            }
        }
        n
    }

    /// Drops the slot. In-flight readers keep their own `Arc`.
    pub fn remove(&self, coord: ChunkCoord) -> Option<Arc<ChunkData>> {
        self.write().remove(&coord).and_then(|s| s.data)
    }

    /// Shared handles to every `Ready` chunk.
    pub fn snapshot(&self) -> HashMap<ChunkCoord, Arc<ChunkData>> {
        self.read()
            .iter()
            .filter_map(|(c, s)| match (s.state, s.data.as_ref()) {
                (ChunkState::Ready, Some(d)) => Some((*c, Arc::clone(d))),
                _ => None,
            })
            .collect()
    }
}

impl VoxelLookup for ChunkStore {
    fn voxel_at(&self, world: IVec3) -> VoxelType {
        ChunkStore::voxel_at(self, world)
    }
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.counts();
        f.debug_struct("ChunkStore")
            .field("dims", &self.dims)
            .field("ready", &c.ready)
            .field("generating", &c.generating)
            .finish()
    }
}
