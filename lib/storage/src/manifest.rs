// Run manifest recorded next to an exported subset
use anyhow::Result;
use assetx_core::{Curation, CurationConfig, ImageStats, SkippedAsset};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

pub const MANIFEST_FILE: &str = "subset.json";

/// What a curation run kept and how it was configured
#[derive(Debug, Clone, Serialize)]
pub struct SubsetManifest {
    pub created_at: DateTime<Utc>,
    pub config: CurationConfig,
    pub source_rows: usize,
    pub candidates: usize,
    pub kept: usize,
    pub stats: ImageStats,
    pub images_copied: usize,
    pub image_failures: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedAsset>,
}

impl SubsetManifest {
    pub fn new(curation: &Curation, config: CurationConfig, source_rows: usize) -> Self {
        Self {
            created_at: Utc::now(),
            config,
            source_rows,
            candidates: curation.candidates,
            kept: curation.keep_set.len(),
            stats: curation.stats,
            images_copied: 0,
            image_failures: 0,
            skipped: curation.skipped.clone(),
        }
    }

    /// Write as pretty JSON, replacing any previous manifest atomically
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let file = atomicwrites::AtomicFile::new(path, atomicwrites::AllowOverwrite);
        file.write(|f| std::io::Write::write_all(f, &json))?;
        Ok(())
    }
}
