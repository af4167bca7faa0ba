//! # assetx Core
//!
//! Core library for assetx, term-indexed retrieval over a 3D asset catalog.
//!
//! This crate provides the data structures and algorithms:
//!
//! - [`TabularStore`] - The metadata table, one [`Row`] per asset
//! - [`TermIndex`] - Inverted index from normalized term to row indices
//! - [`Scorer`] - Weighted multi-field relevance scoring
//! - [`Engine`] - Ranked retrieval and representative image selection
//! - [`ImageResolver`] - Screenshot lookup for an asset id
//! - [`Curator`] - Reproducible subset curation
//!
//! ## Example
//!
//! ```rust
//! use assetx_core::{Engine, MemoryImages, TabularStore};
//!
//! let table = "fullId,category,wnlemmas,name,tags\n\
//!              wss.7170910538470c80738e43095496b061,\"Desk,Furniture\",,desk,\n";
//! let store = TabularStore::from_reader(table.as_bytes()).unwrap();
//! let engine = Engine::new(store, MemoryImages::new());
//!
//! let results = engine.ranked_results("desk");
//! assert_eq!(results[0].score, 110.0);
//! ```

pub mod error;
pub mod store;
pub mod index;
pub mod scoring;
pub mod images;
pub mod engine;
pub mod curator;

pub use error::{Error, Result};
pub use store::{CategorySummary, ColumnValues, Row, SearchField, TabularStore, METADATA_FILE};
pub use index::{TermIndex, SENTINEL_TERM};
pub use scoring::{score, FieldWeight, QueryNormalization, Scorer, ScoringWeights};
pub use images::{id_dir_name, ImageResolver, ImageSource, MemoryImages, ResolverConfig};
pub use engine::{rank, Engine, ScoredResult};
pub use curator::{
    cap, downsample, Curation, CurationConfig, Curator, ImageStats, RetainedImages, SkippedAsset,
    IMAGE_STRIDE,
};
