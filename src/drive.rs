//! Read-only file stores the pipeline packs from.
//!
//! A drive maps absolute, `/`-separated keys to byte content. Directories are never stored
//! explicitly; they exist whenever some key lives underneath them.

use std::collections::{BTreeMap, BTreeSet};
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::io::ErrorKind;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Component, Path, PathBuf};

use crate::error::DriveError;

/// Key/value file store consulted while packing.
pub trait Drive {
  /// Fetch the bytes stored under `path`.
  fn get(&self, path: &str) -> Result<Vec<u8>, DriveError>;

  /// Returns `true` when `path` names a file.
  fn is_file(&self, path: &str) -> bool;

  /// Returns `true` when `path` names a directory with at least one entry.
  fn is_dir(&self, path: &str) -> bool;

  /// Sorted names of the immediate children of `dir`.
  fn list(&self, dir: &str) -> Vec<String>;

  /// Returns `true` when `path` names either a file or a directory.
  fn exists(&self, path: &str) -> bool {
    self.is_file(path) || self.is_dir(path)
  }
}

impl<D: Drive + ?Sized> Drive for &D {
  fn get(&self, path: &str) -> Result<Vec<u8>, DriveError> {
    (**self).get(path)
  }

  fn is_file(&self, path: &str) -> bool {
    (**self).is_file(path)
  }

  fn is_dir(&self, path: &str) -> bool {
    (**self).is_dir(path)
  }

  fn list(&self, dir: &str) -> Vec<String> {
    (**self).list(dir)
  }
}

/// Drive held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDrive {
  files: BTreeMap<String, Vec<u8>>,
}

impl MemoryDrive {
  /// Create an empty drive.
  pub fn new() -> Self {
    Self::default()
  }

  /// Store `content` under `path`, normalising the key to a leading `/`.
  pub fn insert(&mut self, path: &str, content: impl Into<Vec<u8>>) -> &mut Self {
    self.files.insert(normalise_key(path), content.into());
    self
  }

  /// Builder-style variant of [`MemoryDrive::insert`].
  pub fn with(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
    self.insert(path, content);
    self
  }

  /// Number of files stored.
  pub fn len(&self) -> usize {
    self.files.len()
  }

  /// Returns `true` when no files are stored.
  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

impl Drive for MemoryDrive {
  fn get(&self, path: &str) -> Result<Vec<u8>, DriveError> {
    self
      .files
      .get(path)
      .cloned()
      .ok_or_else(|| DriveError::NotFound {
        path: path.to_string(),
      })
  }

  fn is_file(&self, path: &str) -> bool {
    self.files.contains_key(path)
  }

  fn is_dir(&self, path: &str) -> bool {
    let prefix = dir_prefix(path);
    self
      .files
      .range(prefix.clone()..)
      .next()
      .is_some_and(|(key, _)| key.starts_with(&prefix))
  }

  fn list(&self, dir: &str) -> Vec<String> {
    let prefix = dir_prefix(dir);
    let names: BTreeSet<String> = self
      .files
      .range(prefix.clone()..)
      .take_while(|(key, _)| key.starts_with(&prefix))
      .filter_map(|(key, _)| key[prefix.len()..].split('/').next())
      .filter(|name| !name.is_empty())
      .map(str::to_string)
      .collect();
    names.into_iter().collect()
  }
}

/// Drive backed by a directory on the local filesystem.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct LocalDrive {
  root: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl LocalDrive {
  /// Open a drive rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Directory the drive is rooted at.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Map a drive key onto the filesystem. Keys climbing out of the root map to nothing.
  fn locate(&self, key: &str) -> Option<PathBuf> {
    let relative = Path::new(key.trim_start_matches('/'));
    let escapes = relative
      .components()
      .any(|component| !matches!(component, Component::Normal(_)));
    (!escapes).then(|| self.root.join(relative))
  }
}

#[cfg(not(target_arch = "wasm32"))]
impl Drive for LocalDrive {
  fn get(&self, path: &str) -> Result<Vec<u8>, DriveError> {
    let Some(location) = self.locate(path) else {
      return Err(DriveError::NotFound {
        path: path.to_string(),
      });
    };

    match fs::read(&location) {
      Ok(content) => Ok(content),
      Err(err) if err.kind() == ErrorKind::NotFound => Err(DriveError::NotFound {
        path: path.to_string(),
      }),
      Err(err) => Err(DriveError::Io {
        path: path.to_string(),
        source: err,
      }),
    }
  }

  fn is_file(&self, path: &str) -> bool {
    self.locate(path).is_some_and(|location| location.is_file())
  }

  fn is_dir(&self, path: &str) -> bool {
    self.locate(path).is_some_and(|location| location.is_dir())
  }

  fn list(&self, dir: &str) -> Vec<String> {
    let Some(location) = self.locate(dir) else {
      return Vec::new();
    };
    let mut names: Vec<String> = match fs::read_dir(location) {
      Ok(entries) => entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect(),
      Err(_) => Vec::new(),
    };
    names.sort();
    names
  }
}

fn normalise_key(path: &str) -> String {
  let path = path.replace('\\', "/");
  if path.starts_with('/') {
    path
  } else {
    format!("/{path}")
  }
}

fn dir_prefix(dir: &str) -> String {
  let trimmed = dir.trim_end_matches('/');
  format!("{trimmed}/")
}
