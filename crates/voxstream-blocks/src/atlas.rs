//! Texture atlas table: which atlas cell each voxel face samples.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::types::{FaceRole, UnknownVoxelType, VoxelType};

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("atlas tile_px must be > 0")]
    ZeroTile,
    #[error(transparent)]
    UnknownVoxel(#[from] UnknownVoxelType),
    #[error("atlas entry for sentinel `{0}`")]
    Sentinel(VoxelType),
    #[error("atlas cell ({}, {}) for `{voxel}` lies outside {width_px}x{height_px}", .cell.x, .cell.y)]
    CellOutOfBounds {
        voxel: VoxelType,
        cell: AtlasCell,
        width_px: u32,
        height_px: u32,
    },
    #[error("failed to parse atlas config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Column/row of a tile in the atlas image, counted from the bottom-left.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
pub struct AtlasCell {
    pub x: u16,
    pub y: u16,
}

impl AtlasCell {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VoxelTextures {
    pub top: AtlasCell,
    pub side: AtlasCell,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    pub tile_px: u32,
    pub width_px: u32,
    pub height_px: u32,
}

fn default_tile_px() -> u32 {
    16
}
fn default_width_px() -> u32 {
    576
}
fn default_height_px() -> u32 {
    544
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self {
            tile_px: default_tile_px(),
            width_px: default_width_px(),
            height_px: default_height_px(),
        }
    }
}

impl AtlasLayout {
    /// Size of one tile in UV units `(u, v)`.
    #[inline]
    pub fn tile_uv(&self) -> (f32, f32) {
        (
            self.tile_px as f32 / self.width_px.max(1) as f32,
            self.tile_px as f32 / self.height_px.max(1) as f32,
        )
    }

    #[inline]
    pub fn cell_origin_uv(&self, cell: AtlasCell) -> (f32, f32) {
        let (tu, tv) = self.tile_uv();
        (cell.x as f32 * tu, cell.y as f32 * tv)
    }

    #[inline]
    pub fn contains(&self, cell: AtlasCell) -> bool {
        let tile = self.tile_px.max(1);
        (cell.x as u32 + 1) * tile <= self.width_px && (cell.y as u32 + 1) * tile <= self.height_px
    }
}

/// `[atlas]` config section. `voxels` keys are voxel names (`dark_grass`).
#[derive(Clone, Debug, Deserialize)]
pub struct AtlasConfig {
    #[serde(default = "default_tile_px")]
    pub tile_px: u32,
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
    #[serde(default)]
    pub voxels: BTreeMap<String, VoxelTextures>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            tile_px: default_tile_px(),
            width_px: default_width_px(),
            height_px: default_height_px(),
            voxels: BTreeMap::new(),
        }
    }
}

/// Resolved atlas: layout plus a cell pair for every material.
#[derive(Clone, Debug)]
pub struct TextureAtlas {
    pub layout: AtlasLayout,
    cells: Vec<VoxelTextures>,
}

impl Default for TextureAtlas {
    fn default() -> Self {
        Self {
            layout: AtlasLayout::default(),
            cells: default_cells(),
        }
    }
}

/// Built-in table: one atlas row per material, top tile in column 0, side
/// tile in column 1. Grass and sand tops differ from their sides.
fn default_cells() -> Vec<VoxelTextures> {
    let mut cells = Vec::with_capacity(VoxelType::MATERIALS.len());
    for v in VoxelType::MATERIALS {
        let row = v.index() as u16;
        let side_col = match v {
            VoxelType::Grass | VoxelType::DarkGrass | VoxelType::LightTrunk
            | VoxelType::DarkTrunk | VoxelType::MediumTrunk | VoxelType::PinkTrunk
            | VoxelType::PurpleTrunk => 1,
            _ => 0,
        };
        cells.push(VoxelTextures {
            top: AtlasCell::new(0, row),
            side: AtlasCell::new(side_col, row),
        });
    }
    cells
}

impl TextureAtlas {
    /// Built-in cells with `cfg.voxels` overrides applied. Every resolved
    /// cell must fit inside the configured image.
    pub fn from_config(cfg: &AtlasConfig) -> Result<Self, AtlasError> {
        let mut atlas = TextureAtlas {
            layout: AtlasLayout {
                tile_px: cfg.tile_px,
                width_px: cfg.width_px,
                height_px: cfg.height_px,
            },
            cells: default_cells(),
        };
        if atlas.layout.tile_px == 0 {
            return Err(AtlasError::ZeroTile);
        }
        for (name, tex) in &cfg.voxels {
            let v: VoxelType = name.parse()?;
            if v.is_sentinel() {
                return Err(AtlasError::Sentinel(v));
            }
            atlas.cells[v.index()] = *tex;
        }
        for v in VoxelType::MATERIALS {
            let tex = atlas.cells[v.index()];
            for cell in [tex.top, tex.side] {
                if !atlas.layout.contains(cell) {
                    return Err(AtlasError::CellOutOfBounds {
                        voxel: v,
                        cell,
                        width_px: atlas.layout.width_px,
                        height_px: atlas.layout.height_px,
                    });
                }
            }
        }
        Ok(atlas)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, AtlasError> {
        let cfg: AtlasConfig = toml::from_str(toml_str)?;
        Self::from_config(&cfg)
    }

    pub fn textures(&self, voxel: VoxelType) -> Option<VoxelTextures> {
        self.cells.get(voxel.index()).copied()
    }

    /// UV origin of the tile a face samples. Top and bottom faces use the top
    /// cell. Sentinels have no texture and fall back to grass.
    pub fn uv_origin(&self, voxel: VoxelType, role: FaceRole) -> (f32, f32) {
        let tex = match self.textures(voxel) {
            Some(t) => t,
            None => {
                log::error!(target: "mesh", "no atlas entry for {voxel}, using grass");
                self.cells[VoxelType::Grass.index()]
            }
        };
        let cell = match role {
            FaceRole::Top | FaceRole::Bottom => tex.top,
            FaceRole::Side => tex.side,
        };
        self.layout.cell_origin_uv(cell)
    }
}
