use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Material stored in a voxel cell.
///
/// `Empty` is air. `Unloaded` never lives in chunk storage; lookups return it
/// for positions whose owning chunk has not finished generating, so faces on
/// a chunk edge are not mistaken for faces exposed to air.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VoxelType {
    Grass,
    DarkGrass,
    LightSand,
    DarkSand,
    Water,
    DarkWater,
    LightTrunk,
    LightLeaves,
    DarkTrunk,
    DarkLeaves,
    MediumTrunk,
    PinkTrunk,
    PinkLeavesA,
    PinkLeavesB,
    FlowerLeaves,
    PurpleTrunk,
    LightRocks,
    DarkRocks,
    Empty,
    Unloaded,
}

/// Which atlas cell a face samples.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaceRole {
    Top,
    Bottom,
    Side,
}

impl VoxelType {
    /// Every material, sentinels excluded, in declaration order.
    pub const MATERIALS: [VoxelType; 18] = [
        VoxelType::Grass,
        VoxelType::DarkGrass,
        VoxelType::LightSand,
        VoxelType::DarkSand,
        VoxelType::Water,
        VoxelType::DarkWater,
        VoxelType::LightTrunk,
        VoxelType::LightLeaves,
        VoxelType::DarkTrunk,
        VoxelType::DarkLeaves,
        VoxelType::MediumTrunk,
        VoxelType::PinkTrunk,
        VoxelType::PinkLeavesA,
        VoxelType::PinkLeavesB,
        VoxelType::FlowerLeaves,
        VoxelType::PurpleTrunk,
        VoxelType::LightRocks,
        VoxelType::DarkRocks,
    ];

    /// Types a player may place with the dig/build tool.
    pub const BUILDABLE: [VoxelType; 8] = [
        VoxelType::Grass,
        VoxelType::DarkGrass,
        VoxelType::LightSand,
        VoxelType::DarkSand,
        VoxelType::LightTrunk,
        VoxelType::DarkTrunk,
        VoxelType::LightRocks,
        VoxelType::DarkRocks,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, VoxelType::Empty)
    }

    #[inline]
    pub fn is_water(self) -> bool {
        matches!(self, VoxelType::Water | VoxelType::DarkWater)
    }

    #[inline]
    pub fn is_sentinel(self) -> bool {
        matches!(self, VoxelType::Empty | VoxelType::Unloaded)
    }

    /// True when a solid face against this neighbor must be culled.
    /// Air and water leave the face visible; `Unloaded` hides it.
    #[inline]
    pub fn occludes_solid_face(self) -> bool {
        !(self.is_empty() || self.is_water())
    }

    #[inline]
    pub fn is_buildable(self) -> bool {
        Self::BUILDABLE.contains(&self)
    }

    pub fn name(self) -> &'static str {
        match self {
            VoxelType::Grass => "grass",
            VoxelType::DarkGrass => "dark_grass",
            VoxelType::LightSand => "light_sand",
            VoxelType::DarkSand => "dark_sand",
            VoxelType::Water => "water",
            VoxelType::DarkWater => "dark_water",
            VoxelType::LightTrunk => "light_trunk",
            VoxelType::LightLeaves => "light_leaves",
            VoxelType::DarkTrunk => "dark_trunk",
            VoxelType::DarkLeaves => "dark_leaves",
            VoxelType::MediumTrunk => "medium_trunk",
            VoxelType::PinkTrunk => "pink_trunk",
            VoxelType::PinkLeavesA => "pink_leaves_a",
            VoxelType::PinkLeavesB => "pink_leaves_b",
            VoxelType::FlowerLeaves => "flower_leaves",
            VoxelType::PurpleTrunk => "purple_trunk",
            VoxelType::LightRocks => "light_rocks",
            VoxelType::DarkRocks => "dark_rocks",
            VoxelType::Empty => "empty",
            VoxelType::Unloaded => "unloaded",
        }
    }
}

impl fmt::Display for VoxelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown voxel type `{0}`")]
pub struct UnknownVoxelType(pub String);

impl FromStr for VoxelType {
    type Err = UnknownVoxelType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::MATERIALS
            .iter()
            .chain([VoxelType::Empty, VoxelType::Unloaded].iter())
            .copied()
            .find(|v| v.name() == s)
            .ok_or_else(|| UnknownVoxelType(s.to_string()))
    }
}
