//! Screenshot storage.
//!
//! The runner hands PNG bytes to an `ArtifactStore` and records whatever
//! reference the store returns. Naming and layout are the store's business.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{HarnessError, HarnessResult};

/// Receives screenshots captured during a run
pub trait ArtifactStore: Send {
    /// Persist `png` and return a reference to it (path, key, ...)
    fn store(&mut self, scenario: &str, label: &str, png: &[u8]) -> HarnessResult<String>;
}

/// Manifest written next to each stored screenshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub scenario: String,
    pub label: String,
    pub image_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub timestamp: String,
}

/// Writes `<scenario>_<label>_<timestamp>.png` plus a JSON manifest into a directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
    include_manifest: bool,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            include_manifest: true,
        }
    }

    pub fn include_manifest(mut self, include: bool) -> Self {
        self.include_manifest = include;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path for this capture; same-second captures get a counter
    fn next_path(&self, scenario: &str, label: &str, timestamp: &str) -> PathBuf {
        let stem = format!("{}_{}_{}", sanitize_name(scenario), sanitize_name(label), timestamp);
        let mut path = self.dir.join(format!("{}.png", stem));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{}_{}.png", stem, n));
            n += 1;
        }
        path
    }
}

impl ArtifactStore for DirectoryStore {
    fn store(&mut self, scenario: &str, label: &str, png: &[u8]) -> HarnessResult<String> {
        fs::create_dir_all(&self.dir)?;

        let timestamp = generate_timestamp();
        let path = self.next_path(scenario, label, &timestamp);
        fs::write(&path, png)?;

        if self.include_manifest {
            let (width, height) = image_dimensions(png)?;
            let record = ArtifactRecord {
                scenario: scenario.to_string(),
                label: label.to_string(),
                image_path: path.clone(),
                width,
                height,
                bytes: png.len(),
                timestamp,
            };
            fs::write(path.with_extension("json"), serde_json::to_string_pretty(&record)?)?;
        }

        tracing::info!(path = %path.display(), scenario, label, "screenshot stored");
        Ok(path.display().to_string())
    }
}

/// A capture held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub scenario: String,
    pub label: String,
    pub png: Vec<u8>,
}

/// Keeps captures in memory; clones share the same list
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    captures: Arc<Mutex<Vec<Capture>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captures(&self) -> Vec<Capture> {
        self.captures
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.captures().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryStore {
    fn store(&mut self, scenario: &str, label: &str, png: &[u8]) -> HarnessResult<String> {
        let mut captures = self
            .captures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        captures.push(Capture {
            scenario: scenario.to_string(),
            label: label.to_string(),
            png: png.to_vec(),
        });
        Ok(format!("memory:{}", captures.len() - 1))
    }
}

/// Drops every capture
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardStore;

impl ArtifactStore for DiscardStore {
    fn store(&mut self, _scenario: &str, _label: &str, _png: &[u8]) -> HarnessResult<String> {
        Ok("discarded".to_string())
    }
}

/// Generate a timestamp string in YYYYMMDD_HHMMSS format
pub fn generate_timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Sanitize a name for use in filenames
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

fn image_dimensions(png: &[u8]) -> HarnessResult<(u32, u32)> {
    let img = image::load_from_memory(png)
        .map_err(|e| HarnessError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    Ok((img.width(), img.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_pixel(width, height, image::Rgb([0, 0, 0]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("add book"), "add_book");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name("login: invalid"), "login__invalid");
    }

    #[test]
    fn test_directory_store_writes_png_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path().join("shots"));

        let first = store.store("add book", "failure", &png(16, 9)).unwrap();
        let second = store.store("add book", "failure", &png(16, 9)).unwrap();
        assert_ne!(first, second);

        let path = PathBuf::from(&first);
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("add_book_failure_"));

        let manifest: ArtifactRecord =
            serde_json::from_str(&fs::read_to_string(path.with_extension("json")).unwrap()).unwrap();
        assert_eq!((manifest.width, manifest.height), (16, 9));
        assert_eq!(manifest.scenario, "add book");
    }

    #[test]
    fn test_directory_store_rejects_garbage_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        assert!(store.store("x", "y", b"not a png").is_err());

        let mut plain = DirectoryStore::new(dir.path()).include_manifest(false);
        assert!(plain.store("x", "y", b"not a png").is_ok());
    }

    #[test]
    fn test_memory_store_shares_captures() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        let reference = writer.store("s", "l", &[1, 2, 3]).unwrap();
        assert_eq!(reference, "memory:0");
        assert_eq!(store.len(), 1);
        assert_eq!(store.captures()[0].png, vec![1, 2, 3]);
    }
}
