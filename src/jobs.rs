//! Atlas build jobs
//!
//! Each job reads its inputs from one directory and writes every output
//! back into that same directory.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{ListJobSettings, PairJobSettings};
use crate::engine::{find_pairs, AtlasOutput, AtlasPacker, Compositor, PairPattern};

/// Result of running a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// No inputs matched; nothing was written
    NothingToDo,
    /// The atlas was written
    Built(AtlasOutput),
}

/// Flatten every complete layer pair in `dir`, then pack the results
pub fn run_pair_job(settings: &PairJobSettings, dir: &Path) -> Result<JobOutcome> {
    let packer = AtlasPacker::new(settings.atlas.grid(), &settings.atlas.image, &settings.atlas.json)
        .context("Invalid gaseous atlas settings")?;
    let pattern = PairPattern::new(&settings.category)
        .with_context(|| format!("Invalid category {:?}", settings.category))?;

    let pairs = find_pairs(dir, &pattern)?;
    if pairs.is_empty() {
        info!(
            category = %pattern.category(),
            dir = %dir.display(),
            "No layer pairs found"
        );
        return Ok(JobOutcome::NothingToDo);
    }

    let compositor = Compositor::new();
    let mut flattened = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        let output_name = pattern.flattened_name(pair.index);
        compositor
            .flatten_pair(dir, pair, &output_name)
            .with_context(|| format!("Failed to composite pair {}", pair.index))?;
        flattened.push(output_name);
    }

    build_atlas(&packer, dir, &flattened)
}

/// Pack the configured input list found in `dir`
pub fn run_list_job(settings: &ListJobSettings, dir: &Path) -> Result<JobOutcome> {
    let packer = AtlasPacker::new(settings.atlas.grid(), &settings.atlas.image, &settings.atlas.json)
        .context("Invalid jungle atlas settings")?;

    build_atlas(&packer, dir, &settings.inputs)
}

fn build_atlas(packer: &AtlasPacker, dir: &Path, candidates: &[String]) -> Result<JobOutcome> {
    let outcome = packer
        .build(dir, candidates)
        .with_context(|| format!("Failed to build atlas in {}", dir.display()))?;

    Ok(match outcome {
        Some(output) => JobOutcome::Built(output),
        None => JobOutcome::NothingToDo,
    })
}
