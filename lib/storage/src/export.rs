use crate::manifest::{SubsetManifest, MANIFEST_FILE};
use anyhow::{Context, Result};
use assetx_core::{Curation, CurationConfig, RetainedImages, TabularStore, METADATA_FILE};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const SCREENSHOTS_DIR: &str = "screenshots";

/// Catalog files copied alongside the subset when the source has them
pub const AUXILIARY_FILES: [&str; 2] = ["README.txt", "info.txt"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyFailure {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub reason: String,
}

/// Outcome of an export; per-file failures are collected, not fatal
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub table_rows: usize,
    pub images_copied: usize,
    /// Entries of `failures` that are screenshot copies
    pub image_failures: usize,
    pub failures: Vec<CopyFailure>,
    pub auxiliary_copied: Vec<String>,
}

/// Writes a curated subset into a destination catalog directory
pub struct Exporter {
    dst_root: PathBuf,
}

impl Exporter {
    pub fn new<P: AsRef<Path>>(dst_root: P) -> Result<Self> {
        let dst_root = dst_root.as_ref().to_path_buf();
        fs::create_dir_all(&dst_root)
            .with_context(|| format!("creating {}", dst_root.display()))?;
        Ok(Self { dst_root })
    }

    pub fn root(&self) -> &Path {
        &self.dst_root
    }

    /// Write the filtered table as `metadata.csv`, atomically
    pub fn write_table(&self, table: &TabularStore) -> Result<PathBuf> {
        let path = self.dst_root.join(METADATA_FILE);
        let file = atomicwrites::AtomicFile::new(&path, atomicwrites::AllowOverwrite);
        file.write(|f| table.write_csv(std::io::BufWriter::new(f)))
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("Wrote {} rows to {}", table.row_count(), path.display());
        Ok(path)
    }

    fn copy_one(&self, src: &Path, dst: PathBuf, report: &mut ExportReport) -> bool {
        tracing::debug!("copy from {} -> {}", src.display(), dst.display());
        match fs::copy(src, &dst) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    "Error copying file from {} to {}: {}",
                    src.display(),
                    dst.display(),
                    e
                );
                report.failures.push(CopyFailure {
                    src: src.to_path_buf(),
                    dst,
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Copy retained images to `<dst>/screenshots/<dir>/<file name>`
    pub fn copy_images(&self, images: &[RetainedImages], report: &mut ExportReport) {
        let failed_before = report.failures.len();
        for retained in images {
            let dir = self
                .dst_root
                .join(SCREENSHOTS_DIR)
                .join(&retained.dir_name);
            if let Err(e) = fs::create_dir_all(&dir) {
                tracing::warn!("Cannot create {}: {}", dir.display(), e);
                for src in &retained.paths {
                    report.failures.push(CopyFailure {
                        src: src.clone(),
                        dst: dir.clone(),
                        reason: e.to_string(),
                    });
                }
                continue;
            }

            for src in &retained.paths {
                let Some(name) = src.file_name() else {
                    continue;
                };
                if self.copy_one(src, dir.join(name), report) {
                    report.images_copied += 1;
                }
            }
        }
        report.image_failures += report.failures.len() - failed_before;
    }

    /// Copy the catalog's README and info files if present
    pub fn copy_auxiliary(&self, src_root: &Path, report: &mut ExportReport) {
        for name in AUXILIARY_FILES {
            let src = src_root.join(name);
            if self.copy_one(&src, self.dst_root.join(name), report) {
                report.auxiliary_copied.push(name.to_string());
            }
        }
    }

    pub fn write_manifest(&self, manifest: &SubsetManifest) -> Result<PathBuf> {
        let path = self.dst_root.join(MANIFEST_FILE);
        manifest.write_to(&path)?;
        Ok(path)
    }
}

/// Write a curation run out to `dst_root`
///
/// Fails only when the table or manifest cannot be written; missing images
/// and auxiliary files are logged and listed in the report.
pub fn export(
    curation: &Curation,
    config: CurationConfig,
    source_rows: usize,
    src_root: &Path,
    dst_root: &Path,
) -> Result<ExportReport> {
    let exporter = Exporter::new(dst_root)?;
    let mut report = ExportReport {
        table_rows: curation.table.row_count(),
        ..Default::default()
    };

    exporter.write_table(&curation.table)?;
    exporter.copy_images(&curation.images, &mut report);
    exporter.copy_auxiliary(src_root, &mut report);

    let mut manifest = SubsetManifest::new(curation, config, source_rows);
    manifest.images_copied = report.images_copied;
    manifest.image_failures = report.image_failures;
    exporter.write_manifest(&manifest)?;

    tracing::info!(
        "Export finished: {} rows, {} images, {} failures",
        report.table_rows,
        report.images_copied,
        report.failures.len()
    );
    Ok(report)
}
