use hashbrown::HashMap;
use voxstream_geom::IVec3;
use voxstream_mesh::MeshBuffers;
use voxstream_world::ChunkCoord;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderObjectId(pub u32);

/// Main-thread consumer of finished meshes. Owns GPU upload and collision
/// baking; the controller decides which object shows which chunk.
pub trait ChunkRenderer {
    fn create_object(&mut self) -> RenderObjectId;
    /// Moves an object to the chunk's world origin.
    fn place_object(&mut self, id: RenderObjectId, coord: ChunkCoord, origin: IVec3);
    fn upload(&mut self, id: RenderObjectId, mesh: &MeshBuffers);
    fn clear(&mut self, id: RenderObjectId);
}

/// Render objects in use per chunk plus a free list of cleared ones.
#[derive(Default, Debug)]
pub struct RenderPool {
    free: Vec<RenderObjectId>,
    assigned: HashMap<ChunkCoord, RenderObjectId>,
}

impl RenderPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<RenderObjectId> {
        self.assigned.get(&coord).copied()
    }

    /// Object for `coord`, reusing a pooled one before creating a new one.
    pub fn acquire<R: ChunkRenderer + ?Sized>(
        &mut self,
        coord: ChunkCoord,
        origin: IVec3,
        renderer: &mut R,
    ) -> RenderObjectId {
        if let Some(id) = self.assigned.get(&coord) {
            return *id;
        }
        let id = match self.free.pop() {
            Some(id) => id,
            None => renderer.create_object(),
        };
        renderer.place_object(id, coord, origin);
        self.assigned.insert(coord, id);
        id
    }

    /// Clears the chunk's object and returns it to the free list.
    pub fn release<R: ChunkRenderer + ?Sized>(&mut self, coord: ChunkCoord, renderer: &mut R) -> Option<RenderObjectId> {
        let id = self.assigned.remove(&coord)?;
        renderer.clear(id);
        self.free.push(id);
        Some(id)
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn live_len(&self) -> usize {
        self.assigned.len()
    }
}
