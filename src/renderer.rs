use hashbrown::HashMap;
use voxstream_geom::IVec3;
use voxstream_mesh::MeshBuffers;
use voxstream_runtime::{ChunkRenderer, RenderObjectId};
use voxstream_world::ChunkCoord;

/// Stand-in renderer for headless runs: tracks objects and logs uploads.
#[derive(Default)]
pub struct LoggingRenderer {
    next_id: u32,
    placed: HashMap<RenderObjectId, ChunkCoord>,
    pub uploads: u64,
    pub faces: u64,
}

impl LoggingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> u32 {
        self.next_id
    }
}

impl ChunkRenderer for LoggingRenderer {
    fn create_object(&mut self) -> RenderObjectId {
        let id = RenderObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    fn place_object(&mut self, id: RenderObjectId, coord: ChunkCoord, origin: IVec3) {
        log::trace!(target: "render", "object {} -> {coord} at {:?}", id.0, origin);
        self.placed.insert(id, coord);
    }

    fn upload(&mut self, id: RenderObjectId, mesh: &MeshBuffers) {
        let (solid, water) = mesh.face_counts();
        self.uploads += 1;
        self.faces += (solid + water) as u64;
        match self.placed.get(&id) {
            Some(c) => log::debug!(target: "render", "upload {c}: solid={solid} water={water}"),
            None => log::warn!(target: "render", "upload to unplaced object {}", id.0),
        }
    }

    fn clear(&mut self, id: RenderObjectId) {
        self.placed.remove(&id);
    }
}
