use serde::Deserialize;
use voxstream_geom::{IVec3, Vec3};

/// Size of every chunk in voxels. Chunks span the full world height, so
/// chunk coordinates only address the horizontal plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChunkDims {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default = "default_depth")]
    pub depth: i32,
}

fn default_width() -> i32 {
    15
}
fn default_height() -> i32 {
    100
}
fn default_depth() -> i32 {
    15
}

impl Default for ChunkDims {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            depth: default_depth(),
        }
    }
}

impl ChunkDims {
    #[inline]
    pub const fn new(width: i32, height: i32, depth: i32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    #[inline]
    pub fn contains_local(&self, p: IVec3) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height && p.z >= 0 && p.z < self.depth
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.depth > 0
    }

    /// Split a world voxel position into its owning chunk and local position.
    #[inline]
    pub fn split(&self, world: IVec3) -> (ChunkCoord, IVec3) {
        let coord = ChunkCoord::containing(world.x, world.z, *self);
        let local = IVec3::new(
            world.x.rem_euclid(self.width),
            world.y,
            world.z.rem_euclid(self.depth),
        );
        (coord, local)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    /// World position of the chunk's (0, 0, 0) voxel.
    #[inline]
    pub fn origin(self, dims: ChunkDims) -> IVec3 {
        IVec3::new(self.cx * dims.width, 0, self.cz * dims.depth)
    }

    #[inline]
    pub fn containing(world_x: i32, world_z: i32, dims: ChunkDims) -> Self {
        Self {
            cx: world_x.div_euclid(dims.width),
            cz: world_z.div_euclid(dims.depth),
        }
    }

    #[inline]
    pub fn containing_point(p: Vec3, dims: ChunkDims) -> Self {
        let v = p.floor_to_ivec3();
        Self::containing(v.x, v.z, dims)
    }

    #[inline]
    pub fn to_world(self, local: IVec3, dims: ChunkDims) -> IVec3 {
        self.origin(dims) + local
    }

    /// Euclidean distance from `point` to the chunk's world origin.
    #[inline]
    pub fn distance_to(self, point: Vec3, dims: ChunkDims) -> f32 {
        self.origin(dims).as_vec3().distance(point)
    }

    #[inline]
    pub fn chebyshev(self, other: ChunkCoord) -> i32 {
        (self.cx - other.cx).abs().max((self.cz - other.cz).abs())
    }
}

/// Sort nearest-first by distance to `point`; ties break on the coordinate.
pub fn sort_by_distance(coords: &mut [ChunkCoord], point: Vec3, dims: ChunkDims) {
    coords.sort_by(|a, b| {
        a.distance_to(point, dims)
            .total_cmp(&b.distance_to(point, dims))
            .then_with(|| a.cmp(b))
    });
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.cx, self.cz)
    }
}
