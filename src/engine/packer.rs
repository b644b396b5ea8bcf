//! Grid atlas packing
//!
//! Sprites are placed into a fixed `columns x rows` grid in candidate order.
//! Every column is as wide as its widest sprite and every row as tall as
//! its tallest one. Padding is inserted before the first cell and after
//! every cell, so the atlas is
//! `padding + sum(cells) + count * padding` pixels along each axis.

use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgba, RgbaImage};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{AtlasDocument, AtlasMeta, FrameRecord, GridError, GridSpec, Size};

/// Packing errors
#[derive(Debug, Error)]
pub enum PackerError {
    #[error("Invalid grid: {0}")]
    InvalidGrid(#[from] GridError),
    #[error("Failed to decode {path}: {source}")]
    DecodeFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to encode {path}: {source}")]
    EncodeFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Atlas {axis} exceeds {max} pixels")]
    AtlasTooLarge { axis: &'static str, max: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A loaded source sprite
#[derive(Debug, Clone)]
pub struct Tile {
    pub name: String,
    pub image: RgbaImage,
}

impl Tile {
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Tile {
            name: name.into(),
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Column/row sizes and offsets for one set of slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub column_widths: Vec<u32>,
    pub row_heights: Vec<u32>,
    pub x_offsets: Vec<u32>,
    pub y_offsets: Vec<u32>,
    pub width: u32,
    pub height: u32,
}

impl GridLayout {
    /// Compute the layout for slots already fitted to the grid
    ///
    /// Fails when either atlas side would not fit in a `u32`.
    pub fn compute(grid: &GridSpec, slots: &[Option<Tile>]) -> Result<Self, PackerError> {
        let mut column_widths = vec![0u32; grid.columns as usize];
        let mut row_heights = vec![0u32; grid.rows as usize];

        for (index, slot) in slots.iter().enumerate().take(grid.capacity()) {
            let Some(tile) = slot else {
                continue;
            };
            let (row, column) = grid.slot_position(index);
            column_widths[column] = column_widths[column].max(tile.width());
            row_heights[row] = row_heights[row].max(tile.height());
        }

        let (x_offsets, width) = padded_offsets(&column_widths, grid.padding).ok_or(
            PackerError::AtlasTooLarge {
                axis: "width",
                max: u32::MAX,
            },
        )?;
        let (y_offsets, height) = padded_offsets(&row_heights, grid.padding).ok_or(
            PackerError::AtlasTooLarge {
                axis: "height",
                max: u32::MAX,
            },
        )?;

        Ok(GridLayout {
            column_widths,
            row_heights,
            x_offsets,
            y_offsets,
            width,
            height,
        })
    }
}

/// Running offsets starting at `padding`, advancing by `cell + padding`
///
/// The final accumulator is the side length:
/// `padding + sum(cells) + cells.len() * padding`.
fn padded_offsets(cells: &[u32], padding: u32) -> Option<(Vec<u32>, u32)> {
    let mut offsets = Vec::with_capacity(cells.len());
    let mut acc = padding;
    for cell in cells {
        offsets.push(acc);
        acc = acc.checked_add(*cell)?.checked_add(padding)?;
    }
    Some((offsets, acc))
}

/// Composited atlas held in memory
pub struct PackedAtlas {
    pub image: RgbaImage,
    pub document: AtlasDocument,
}

/// Paths written for one atlas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasOutput {
    pub image_path: PathBuf,
    pub json_path: PathBuf,
    pub placed: usize,
}

/// Packs sprites into a grid atlas and writes it next to its sources
pub struct AtlasPacker {
    grid: GridSpec,
    image_name: String,
    json_name: String,
}

impl AtlasPacker {
    /// Create a packer; rejects grids without columns or rows
    pub fn new(
        grid: GridSpec,
        image_name: impl Into<String>,
        json_name: impl Into<String>,
    ) -> Result<Self, PackerError> {
        grid.validate()?;
        Ok(AtlasPacker {
            grid,
            image_name: image_name.into(),
            json_name: json_name.into(),
        })
    }

    /// Load, pack and write an atlas from candidate filenames in `dir`
    ///
    /// Returns `Ok(None)` without touching the filesystem when there are no
    /// candidates at all.
    pub fn build(&self, dir: &Path, candidates: &[String]) -> Result<Option<AtlasOutput>, PackerError> {
        if candidates.is_empty() {
            info!(dir = %dir.display(), "No atlas candidates, nothing to pack");
            return Ok(None);
        }

        let slots = self.load_slots(dir, candidates)?;
        let atlas = self.pack(slots)?;
        self.write(dir, &atlas).map(Some)
    }

    /// Load candidates in order; missing files become empty slots
    ///
    /// Candidates beyond the grid capacity are not read.
    pub fn load_slots(&self, dir: &Path, candidates: &[String]) -> Result<Vec<Option<Tile>>, PackerError> {
        let capacity = self.grid.capacity();
        if candidates.len() > capacity {
            debug!(
                candidates = candidates.len(),
                capacity = capacity,
                "Dropping candidates beyond grid capacity"
            );
        }

        let mut slots = Vec::with_capacity(capacity);
        for name in candidates.iter().take(capacity) {
            let path = dir.join(name);
            if !path.is_file() {
                warn!(file = %name, "Missing atlas input, leaving slot empty");
                slots.push(None);
                continue;
            }

            let image = image::open(&path)
                .map_err(|source| PackerError::DecodeFailed {
                    path: path.display().to_string(),
                    source,
                })?
                .to_rgba8();
            slots.push(Some(Tile::new(name.as_str(), image)));
        }

        Ok(slots)
    }

    /// Lay out the slots and composite them onto a transparent canvas
    pub fn pack(&self, mut slots: Vec<Option<Tile>>) -> Result<PackedAtlas, PackerError> {
        let capacity = self.grid.capacity();
        slots.truncate(capacity);
        slots.resize_with(capacity, || None);

        let layout = GridLayout::compute(&self.grid, &slots)?;
        let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, Rgba([0, 0, 0, 0]));
        let mut frames = IndexMap::new();

        for (index, slot) in slots.into_iter().enumerate() {
            let Some(tile) = slot else {
                continue;
            };
            let (row, column) = self.grid.slot_position(index);
            let x = layout.x_offsets[column];
            let y = layout.y_offsets[row];

            image::imageops::replace(&mut canvas, &tile.image, x as i64, y as i64);
            frames.insert(tile.name, FrameRecord::placed(x, y, tile.image.width(), tile.image.height()));
        }

        debug!(
            column_widths = ?layout.column_widths,
            row_heights = ?layout.row_heights,
            width = layout.width,
            height = layout.height,
            placed = frames.len(),
            "Packed atlas"
        );

        let size = Size {
            w: layout.width,
            h: layout.height,
        };
        Ok(PackedAtlas {
            image: canvas,
            document: AtlasDocument {
                frames,
                meta: AtlasMeta::new(&self.image_name, size, self.grid.padding, self.grid.dimensions()),
            },
        })
    }

    /// Write the atlas PNG and its JSON metadata into `dir`
    pub fn write(&self, dir: &Path, atlas: &PackedAtlas) -> Result<AtlasOutput, PackerError> {
        let image_path = dir.join(&self.image_name);
        atlas
            .image
            .save_with_format(&image_path, ImageFormat::Png)
            .map_err(|source| PackerError::EncodeFailed {
                path: image_path.display().to_string(),
                source,
            })?;

        let json_path = dir.join(&self.json_name);
        let json = serde_json::to_string_pretty(&atlas.document)?;
        std::fs::write(&json_path, json)?;

        info!(
            image = %self.image_name,
            json = %self.json_name,
            width = atlas.image.width(),
            height = atlas.image.height(),
            placed = atlas.document.frames.len(),
            "Wrote atlas"
        );

        Ok(AtlasOutput {
            image_path,
            json_path,
            placed: atlas.document.frames.len(),
        })
    }
}
