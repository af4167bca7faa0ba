//! Image resolution for catalog assets
//!
//! Screenshots of an asset live in `<root>/screenshots/<dir>/`, where `<dir>`
//! is the second `.`-separated segment of the asset's `full_id`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of the image files belonging to an asset
pub trait ImageSource: Send + Sync {
    /// Image paths for an asset, sorted
    ///
    /// Fails with [`Error::MalformedId`] when the id has no directory segment
    /// and [`Error::ImageDirNotFound`] when the asset has no image directory.
    fn images_for(&self, full_id: &str) -> Result<Vec<PathBuf>>;
}

/// Directory name of an asset: the segment after the namespace in `<namespace>.<hex-id>`
pub fn id_dir_name(full_id: &str) -> Result<&str> {
    full_id
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| Error::MalformedId(full_id.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub root: PathBuf,
    #[serde(default = "default_screenshots_dir")]
    pub screenshots_dir: String,
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_screenshots_dir() -> String {
    "screenshots".to_string()
}

fn default_extension() -> String {
    "png".to_string()
}

impl ResolverConfig {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            screenshots_dir: default_screenshots_dir(),
            extension: default_extension(),
        }
    }

    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }
}

/// Lists images straight from the catalog's screenshot tree
#[derive(Debug, Clone)]
pub struct ImageResolver {
    config: ResolverConfig,
    suffix: String,
}

impl ImageResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let suffix = format!(".{}", config.extension.trim_start_matches('.'));
        Self { config, suffix }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Directory holding the images of an asset
    pub fn dir_for(&self, full_id: &str) -> Result<PathBuf> {
        let dir_name = id_dir_name(full_id)?;
        Ok(self
            .config
            .root
            .join(&self.config.screenshots_dir)
            .join(dir_name))
    }
}

impl ImageSource for ImageResolver {
    fn images_for(&self, full_id: &str) -> Result<Vec<PathBuf>> {
        let dir = self.dir_for(full_id)?;
        if !dir.is_dir() {
            return Err(Error::ImageDirNotFound(dir));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            // follows symlinks; broken links are skipped
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name();
            if name.to_string_lossy().ends_with(&self.suffix) {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// In-memory image source keyed by directory name
#[derive(Debug, Clone, Default)]
pub struct MemoryImages {
    dirs: HashMap<String, Vec<PathBuf>>,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the images of an asset
    pub fn insert<I, P>(&mut self, full_id: &str, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let dir = id_dir_name(full_id)?.to_string();
        let entry = self.dirs.entry(dir).or_default();
        entry.extend(paths.into_iter().map(Into::into));
        entry.sort();
        Ok(())
    }
}

impl ImageSource for MemoryImages {
    fn images_for(&self, full_id: &str) -> Result<Vec<PathBuf>> {
        let dir = id_dir_name(full_id)?;
        self.dirs
            .get(dir)
            .cloned()
            .ok_or_else(|| Error::ImageDirNotFound(PathBuf::from(dir)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIRROR: &str = "4b3e576378e5571aa9a81fd803d87d3e";

    fn screenshot_tree() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("screenshots").join(MIRROR);
        fs::create_dir_all(dir.join("nested")).unwrap();
        for i in 0..14 {
            fs::write(dir.join(format!("{}-{}.png", MIRROR, i)), b"png").unwrap();
        }
        fs::write(dir.join(format!("{}.gif", MIRROR)), b"gif").unwrap();
        fs::write(dir.join("nested").join("deep.png"), b"png").unwrap();
        root
    }

    #[test]
    fn test_id_dir_name() {
        assert_eq!(id_dir_name("wss.abc123").unwrap(), "abc123");
        assert_eq!(id_dir_name("wss.abc.extra").unwrap(), "abc");
        assert!(matches!(id_dir_name("no-dot-here"), Err(Error::MalformedId(_))));
        assert!(matches!(id_dir_name("wss."), Err(Error::MalformedId(_))));
    }

    #[test]
    fn test_lists_matching_files_only() {
        let root = screenshot_tree();
        let resolver = ImageResolver::new(ResolverConfig::new(root.path()));
        let paths = resolver.images_for(&format!("wss.{}", MIRROR)).unwrap();

        assert_eq!(paths.len(), 14);
        assert!(paths.iter().all(|p| p.extension().unwrap() == "png"));
        assert!(paths.iter().all(|p| !p.ends_with("deep.png")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_image_is_listed() {
        let root = screenshot_tree();
        let dir = root.path().join("screenshots").join(MIRROR);
        let target = root.path().join("elsewhere.png");
        fs::write(&target, b"png").unwrap();
        std::os::unix::fs::symlink(&target, dir.join("linked.png")).unwrap();
        std::os::unix::fs::symlink(root.path().join("gone.png"), dir.join("broken.png")).unwrap();

        let resolver = ImageResolver::new(ResolverConfig::new(root.path()));
        let paths = resolver.images_for(&format!("wss.{}", MIRROR)).unwrap();
        assert_eq!(paths.len(), 15);
        assert!(paths.contains(&dir.join("linked.png")));
        assert!(!paths.contains(&dir.join("broken.png")));
    }

    #[test]
    fn test_configured_extension() {
        let root = screenshot_tree();
        let config = ResolverConfig::new(root.path()).with_extension(".gif");
        let resolver = ImageResolver::new(config);
        let paths = resolver.images_for(&format!("wss.{}", MIRROR)).unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_missing_directory() {
        let root = screenshot_tree();
        let resolver = ImageResolver::new(ResolverConfig::new(root.path()));
        let err = resolver.images_for("wss.ffff").unwrap_err();
        assert!(matches!(err, Error::ImageDirNotFound(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_malformed_id_is_not_empty_set() {
        let root = screenshot_tree();
        let resolver = ImageResolver::new(ResolverConfig::new(root.path()));
        assert!(matches!(
            resolver.images_for("no-dot-here"),
            Err(Error::MalformedId(id)) if id == "no-dot-here"
        ));
    }

    #[test]
    fn test_memory_images() {
        let mut images = MemoryImages::new();
        images.insert("wss.abc", ["b.png", "a.png"]).unwrap();
        assert_eq!(
            images.images_for("wss.abc").unwrap(),
            vec![PathBuf::from("a.png"), PathBuf::from("b.png")]
        );
        assert!(matches!(images.images_for("wss.zzz"), Err(Error::ImageDirNotFound(_))));
        assert!(images.insert("bad", ["x.png"]).is_err());
    }
}
