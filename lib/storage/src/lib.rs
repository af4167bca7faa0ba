//! # assetx Storage
//!
//! Export layer for assetx: writes the outcome of a curation run to a new
//! catalog directory with the same layout as the source.
//!
//! ```text
//! <dst>/metadata.csv
//! <dst>/screenshots/<dir>/<image>.png
//! <dst>/README.txt, <dst>/info.txt
//! <dst>/subset.json
//! ```

pub mod export;
pub mod manifest;

pub use export::{export, CopyFailure, ExportReport, Exporter, AUXILIARY_FILES};
pub use manifest::{SubsetManifest, MANIFEST_FILE};
