use crate::face::{Face, QUAD_TRIANGLES};

/// One vertex/uv/index group. Indices are local to the group.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct SubMesh {
    pub pos: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
}

impl SubMesh {
    #[inline]
    pub fn reserve_faces(&mut self, n: usize) {
        self.pos.reserve(n * 4 * 3);
        self.uv.reserve(n * 4 * 2);
        self.idx.reserve(n * 6);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.idx.len() / 6
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    /// Appends one face of the unit cube at `origin`. `uv0` is the tile's
    /// bottom-left UV and `tile` its size.
    pub fn add_face(&mut self, origin: [f32; 3], face: Face, uv0: (f32, f32), tile: (f32, f32)) {
        let base = self.vertex_count() as u32;
        for c in face.corners() {
            self.pos.extend_from_slice(&[origin[0] + c[0], origin[1] + c[1], origin[2] + c[2]]);
        }
        let (u, v) = uv0;
        let (tu, tv) = tile;
        self.uv
            .extend_from_slice(&[u, v, u, v + tv, u + tu, v, u + tu, v + tv]);
        self.idx.extend(QUAD_TRIANGLES.iter().map(|i| base + i));
    }
}

/// Per-chunk mesh output: solid geometry (also used for collision) and
/// water geometry, kept independent.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuffers {
    pub solid: SubMesh,
    pub water: SubMesh,
}

/// Both groups in one vertex stream with two index lists.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MergedMesh {
    pub pos: Vec<f32>,
    pub uv: Vec<f32>,
    pub solid_idx: Vec<u32>,
    pub water_idx: Vec<u32>,
}

impl MeshBuffers {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.solid.is_empty() && self.water.is_empty()
    }

    /// `(solid, water)` face counts.
    #[inline]
    pub fn face_counts(&self) -> (usize, usize) {
        (self.solid.face_count(), self.water.face_count())
    }

    /// Water vertices follow the solid ones, so water indices are shifted by
    /// the solid vertex count.
    pub fn merged(&self) -> MergedMesh {
        let offset = self.solid.vertex_count() as u32;
        let mut pos = Vec::with_capacity(self.solid.pos.len() + self.water.pos.len());
        pos.extend_from_slice(&self.solid.pos);
        pos.extend_from_slice(&self.water.pos);
        let mut uv = Vec::with_capacity(self.solid.uv.len() + self.water.uv.len());
        uv.extend_from_slice(&self.solid.uv);
        uv.extend_from_slice(&self.water.uv);
        MergedMesh {
            pos,
            uv,
            solid_idx: self.solid.idx.clone(),
            water_idx: self.water.idx.iter().map(|i| i + offset).collect(),
        }
    }
}
