//! Atlas metadata document
//!
//! Serialized next to every atlas image. The layout follows the common
//! "hash" sprite-sheet format so engines that read TexturePacker-style JSON
//! can consume it unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Application name written into `meta.app`
pub const APP_NAME: &str = "Cascade Atlas Builder";

/// Metadata format version written into `meta.version`
pub const FORMAT_VERSION: u32 = 1;

/// Pixel rectangle inside the atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// One placed sprite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    pub frame: Rect,
    pub rotated: bool,
    pub trimmed: bool,
    pub sprite_source_size: Rect,
    pub source_size: Size,
}

impl FrameRecord {
    /// Record for a sprite pasted untrimmed and unrotated at `(x, y)`
    pub fn placed(x: u32, y: u32, w: u32, h: u32) -> Self {
        FrameRecord {
            frame: Rect { x, y, w, h },
            rotated: false,
            trimmed: false,
            sprite_source_size: Rect { x: 0, y: 0, w, h },
            source_size: Size { w, h },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub columns: u32,
    pub rows: u32,
}

/// Global atlas information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasMeta {
    pub app: String,
    pub version: u32,
    pub image: String,
    pub size: Size,
    pub scale: String,
    pub padding: u32,
    pub grid: GridDimensions,
}

impl AtlasMeta {
    pub fn new(image: &str, size: Size, padding: u32, grid: GridDimensions) -> Self {
        AtlasMeta {
            app: APP_NAME.to_string(),
            version: FORMAT_VERSION,
            image: image.to_string(),
            size,
            scale: "1".to_string(),
            padding,
            grid,
        }
    }
}

/// Complete JSON document: frames keyed by source filename, in slot order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasDocument {
    pub frames: IndexMap<String, FrameRecord>,
    pub meta: AtlasMeta,
}
