//! Domain types and models

mod atlas;
mod grid;

pub use atlas::{AtlasDocument, AtlasMeta, FrameRecord, GridDimensions, Size};
#[cfg(test)]
pub use atlas::Rect;
pub use grid::{GridError, GridSpec};
