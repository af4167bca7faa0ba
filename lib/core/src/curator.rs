//! Reproducible subset curation
//!
//! A run keeps the best few assets of every indexed term, caps the union with
//! a seeded shuffle, filters the metadata table down to the kept ids, and
//! thins each kept asset's screenshots to every third image.

use crate::engine::Engine;
use crate::images::{id_dir_name, ImageSource};
use crate::store::{Row, TabularStore};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Keep one image out of this many
pub const IMAGE_STRIDE: usize = 3;

pub const DEFAULT_MAX_PER_TERM: usize = 4;
pub const DEFAULT_MAX_ITEMS: usize = 3000;
pub const DEFAULT_SEED: u64 = 6512714;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Ids kept from the head of each term's ranking
    pub max_per_term: usize,
    /// Upper bound on the final keep-set
    pub max_items: usize,
    /// Seed of the shuffle used when the candidates exceed `max_items`
    pub seed: u64,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            max_per_term: DEFAULT_MAX_PER_TERM,
            max_items: DEFAULT_MAX_ITEMS,
            seed: DEFAULT_SEED,
        }
    }
}

impl CurationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_per_term == 0 {
            return Err(Error::InvalidConfig("max_per_term must be at least 1".into()));
        }
        if self.max_items == 0 {
            return Err(Error::InvalidConfig("max_items must be at least 1".into()));
        }
        Ok(())
    }
}

/// Screenshots kept for one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetainedImages {
    pub row_index: usize,
    pub full_id: String,
    pub dir_name: String,
    /// Number of images found before thinning
    pub available: usize,
    pub paths: Vec<PathBuf>,
}

/// A kept asset whose images could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAsset {
    pub full_id: String,
    pub reason: String,
}

/// Images-per-asset statistics over the kept rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ImageStats {
    pub assets: usize,
    pub min: usize,
    pub max: usize,
    pub total: usize,
}

impl ImageStats {
    fn record(&mut self, n: usize) {
        self.min = if self.assets == 0 { n } else { self.min.min(n) };
        self.max = self.max.max(n);
        self.total += n;
        self.assets += 1;
    }

    pub fn mean(&self) -> f64 {
        self.total as f64 / self.assets.max(1) as f64
    }
}

/// Output of a curation run
#[derive(Debug, Clone)]
pub struct Curation {
    /// Size of the per-term union before the cap
    pub candidates: usize,
    pub keep_set: BTreeSet<String>,
    /// Kept rows, original indices preserved
    pub table: TabularStore,
    pub images: Vec<RetainedImages>,
    pub skipped: Vec<SkippedAsset>,
    pub stats: ImageStats,
}

/// Down-select `candidates` to at most `max_items` ids
///
/// Sets within the limit come back untouched. Larger sets are listed in
/// ascending order, shuffled with a generator seeded from `seed`, and
/// truncated.
pub fn cap(candidates: BTreeSet<String>, max_items: usize, seed: u64) -> BTreeSet<String> {
    if candidates.len() <= max_items {
        return candidates;
    }

    let mut ids: Vec<String> = candidates.into_iter().collect();
    let mut rng = StdRng::seed_from_u64(seed);
    ids.shuffle(&mut rng);
    ids.truncate(max_items);
    ids.into_iter().collect()
}

/// Sort paths and keep indices 0, 3, 6, ...
pub fn downsample(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    paths.into_iter().step_by(IMAGE_STRIDE).collect()
}

pub struct Curator<'a, S> {
    engine: &'a Engine<S>,
    config: CurationConfig,
}

impl<'a, S: ImageSource> Curator<'a, S> {
    pub fn new(engine: &'a Engine<S>, config: CurationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    pub fn config(&self) -> &CurationConfig {
        &self.config
    }

    /// Union of the top `max_per_term` ids of every indexed term
    pub fn collect_candidates(&self) -> BTreeSet<String> {
        let terms: Vec<&str> = self.engine.index().terms().collect();
        let max_per_term = self.config.max_per_term;

        terms
            .par_iter()
            .map(|term| {
                let kept: BTreeSet<String> = self
                    .engine
                    .ranked_results(term)
                    .into_iter()
                    .take(max_per_term)
                    .map(|r| r.full_id)
                    .collect();
                tracing::trace!("term '{}' keeps {} ids", term, kept.len());
                kept
            })
            .reduce(BTreeSet::new, |mut acc, mut part| {
                if acc.len() < part.len() {
                    std::mem::swap(&mut acc, &mut part);
                }
                acc.extend(part);
                acc
            })
    }

    /// Kept ids after the per-term pass and the seeded cap
    pub fn keep_set(&self) -> BTreeSet<String> {
        cap(self.collect_candidates(), self.config.max_items, self.config.seed)
    }

    fn retain_images(&self, row: &Row) -> Result<RetainedImages> {
        let dir_name = id_dir_name(&row.full_id)?.to_string();
        let paths = self.engine.images().images_for(&row.full_id)?;
        let available = paths.len();

        Ok(RetainedImages {
            row_index: row.row_index,
            full_id: row.full_id.clone(),
            dir_name,
            available,
            paths: downsample(paths),
        })
    }

    pub fn run(&self) -> Result<Curation> {
        tracing::info!("Original size: {}", self.engine.store().row_count());

        let candidates = self.collect_candidates();
        let candidate_count = candidates.len();
        let keep_set = cap(candidates, self.config.max_items, self.config.seed);
        tracing::info!(
            "Keep set: {} ids ({} candidates, cap {}, seed {})",
            keep_set.len(),
            candidate_count,
            self.config.max_items,
            self.config.seed
        );

        let table = self
            .engine
            .store()
            .filtered(|row| keep_set.contains(&row.full_id));
        tracing::info!("Remaining size: {}", table.row_count());

        let mut images = Vec::with_capacity(table.row_count());
        let mut skipped = Vec::new();
        let mut stats = ImageStats::default();

        for (_, row) in table.rows() {
            match self.retain_images(row) {
                Ok(retained) => {
                    stats.record(retained.available);
                    images.push(retained);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Skipping images of {}: {}", row.full_id, e);
                    skipped.push(SkippedAsset {
                        full_id: row.full_id.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Images per asset: min={} max={} avg={:.2}",
            stats.min,
            stats.max,
            stats.mean()
        );

        Ok(Curation {
            candidates: candidate_count,
            keep_set,
            table,
            images,
            skipped,
            stats,
        })
    }
}
