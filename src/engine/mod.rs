//! Atlas building engine
//!
//! This module contains the offline asset pipeline:
//! - Layer pair discovery
//! - Layer compositing
//! - Grid atlas packing

mod compositor;
mod discovery;
mod packer;

pub use compositor::Compositor;
pub use discovery::{find_pairs, PairPattern};
pub use packer::{AtlasOutput, AtlasPacker};
