//! # assetx
//!
//! Term-indexed retrieval and reproducible subset curation for a multi-modal
//! 3D asset catalog: one metadata row per asset, each linked to a directory of
//! rendered screenshots.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! assetx query ./shapenet chair --limit 5
//! assetx subset ./shapenet ./small_shapenet --seed 6512714 --max-items 3000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use assetx::prelude::*;
//!
//! let engine = Engine::load(ResolverConfig::new("shapenet")).unwrap();
//!
//! // Ranked matches for a term
//! for result in engine.ranked_results("chair").iter().take(5) {
//!     println!("{} {}", result.full_id, result.score);
//! }
//!
//! // Curate a reproducible subset and write it out
//! let config = CurationConfig::default();
//! let curation = Curator::new(&engine, config).unwrap().run().unwrap();
//! export(
//!     &curation,
//!     config,
//!     engine.store().row_count(),
//!     std::path::Path::new("shapenet"),
//!     std::path::Path::new("small_shapenet"),
//! )
//! .unwrap();
//! ```
//!
//! ## Crate Structure
//!
//! - `assetx-core` - Metadata table, term index, scoring, retrieval, curation
//! - `assetx-storage` - Export of curated subsets (table, screenshots, manifest)

// Re-export core types
pub use assetx_core::{
    CategorySummary, ColumnValues, Row, SearchField, TabularStore,
    TermIndex, Scorer, ScoringWeights, FieldWeight, QueryNormalization,
    Engine, ScoredResult, ImageResolver, ImageSource, MemoryImages, ResolverConfig,
    Curator, CurationConfig, Curation, RetainedImages, SkippedAsset, ImageStats,
    Error, Result,
};

// Re-export storage
pub use assetx_storage::{export, Exporter, ExportReport, SubsetManifest};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        TabularStore, Row, SearchField,
        TermIndex, Scorer,
        Engine, ScoredResult, ImageResolver, ImageSource, ResolverConfig,
        Curator, CurationConfig, Curation,
        Error, Result,
        export, Exporter, ExportReport,
    };
}
