//! Layer pair discovery
//!
//! Layered sprites are exported as two files per index,
//! `<Category>_<index>-0.png` (base) and `<Category>_<index>-1.png` (overlay).
//! Only indices with both parts present are returned.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("IO error while scanning {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid pair pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Which layer of a pair a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPart {
    Base,
    Overlay,
}

/// A complete base/overlay pair for one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPair {
    pub index: u32,
    pub base: String,
    pub overlay: String,
}

/// Filename convention for one sprite category
#[derive(Debug, Clone)]
pub struct PairPattern {
    category: String,
    regex: Regex,
}

impl PairPattern {
    /// Build the pattern for a category, e.g. `Gaseous`
    pub fn new(category: &str) -> Result<Self, DiscoveryError> {
        let regex = Regex::new(&format!(r"^{}_(\d+)-(0|1)\.png$", regex::escape(category)))?;
        Ok(PairPattern {
            category: category.to_string(),
            regex,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Parse a filename into its index and layer part
    ///
    /// Returns `None` for names outside the convention and for indices
    /// that do not fit in a `u32`.
    pub fn parse(&self, file_name: &str) -> Option<(u32, LayerPart)> {
        let captures = self.regex.captures(file_name)?;

        let index = match captures[1].parse::<u32>() {
            Ok(index) => index,
            Err(e) => {
                warn!(file = %file_name, error = %e, "Skipping file with out-of-range index");
                return None;
            }
        };

        let part = if &captures[2] == "0" {
            LayerPart::Base
        } else {
            LayerPart::Overlay
        };

        Some((index, part))
    }

    /// Name of the flattened single-layer output for an index
    pub fn flattened_name(&self, index: u32) -> String {
        format!("{}{:02}.png", self.category, index)
    }
}

/// Scan a directory for complete layer pairs, in ascending index order
pub fn find_pairs(dir: &Path, pattern: &PairPattern) -> Result<Vec<LayerPair>, DiscoveryError> {
    let io_err = |source| DiscoveryError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();

    let mut groups: BTreeMap<u32, (Option<String>, Option<String>)> = BTreeMap::new();
    for name in names {
        let Some((index, part)) = pattern.parse(&name) else {
            continue;
        };

        let group = groups.entry(index).or_default();
        let slot = match part {
            LayerPart::Base => &mut group.0,
            LayerPart::Overlay => &mut group.1,
        };

        if let Some(existing) = slot {
            warn!(
                index = index,
                kept = %existing,
                ignored = %name,
                "Duplicate layer file for index"
            );
            continue;
        }
        *slot = Some(name);
    }

    let pairs: Vec<LayerPair> = groups
        .into_iter()
        .filter_map(|(index, parts)| match parts {
            (Some(base), Some(overlay)) => Some(LayerPair { index, base, overlay }),
            (base, overlay) => {
                debug!(
                    index = index,
                    has_base = base.is_some(),
                    has_overlay = overlay.is_some(),
                    "Ignoring incomplete pair"
                );
                None
            }
        })
        .collect();

    debug!(dir = %dir.display(), count = pairs.len(), "Pair discovery complete");

    Ok(pairs)
}
