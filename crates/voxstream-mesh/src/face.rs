use voxstream_blocks::FaceRole;
use voxstream_geom::IVec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    NegZ = 0,
    PosZ = 1,
    PosY = 2,
    NegY = 3,
    NegX = 4,
    PosX = 5,
}

/// Unit cube corners, indexed by the per-face tables below.
const CUBE: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// Corners of each face in bottom-left, top-left, bottom-right, top-right
/// order, matching `Face::index`.
const FACE_CORNERS: [[usize; 4]; 6] = [
    [0, 3, 1, 2],
    [5, 6, 4, 7],
    [3, 7, 2, 6],
    [1, 5, 0, 4],
    [4, 7, 0, 3],
    [1, 2, 5, 6],
];

/// Two triangles over the four corners of a face.
pub const QUAD_TRIANGLES: [u32; 6] = [0, 1, 2, 2, 1, 3];

impl Face {
    pub const ALL: [Face; 6] = [
        Face::NegZ,
        Face::PosZ,
        Face::PosY,
        Face::NegY,
        Face::NegX,
        Face::PosX,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Integer step out of this face.
    #[inline]
    pub fn delta(self) -> IVec3 {
        match self {
            Face::NegZ => IVec3::new(0, 0, -1),
            Face::PosZ => IVec3::new(0, 0, 1),
            Face::PosY => IVec3::new(0, 1, 0),
            Face::NegY => IVec3::new(0, -1, 0),
            Face::NegX => IVec3::new(-1, 0, 0),
            Face::PosX => IVec3::new(1, 0, 0),
        }
    }

    #[inline]
    pub fn role(self) -> FaceRole {
        match self {
            Face::PosY => FaceRole::Top,
            Face::NegY => FaceRole::Bottom,
            _ => FaceRole::Side,
        }
    }

    #[inline]
    pub fn corners(self) -> [[f32; 3]; 4] {
        FACE_CORNERS[self.index()].map(|i| CUBE[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_lie_on_the_face_plane() {
        for f in Face::ALL {
            let d = f.delta();
            let axis = if d.x != 0 { 0 } else if d.y != 0 { 1 } else { 2 };
            let sign = d.x + d.y + d.z;
            let plane = if sign > 0 { 1.0 } else { 0.0 };
            for c in f.corners() {
                assert_eq!(c[axis], plane, "{f:?}");
            }
        }
    }

    #[test]
    fn corners_are_distinct() {
        for f in Face::ALL {
            let c = f.corners();
            for i in 0..4 {
                for j in (i + 1)..4 {
                    assert_ne!(c[i], c[j], "{f:?}");
                }
            }
        }
    }

    #[test]
    fn index_matches_all_order() {
        for (i, f) in Face::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }
}
