//! Failure values surfaced by the pack pipeline.

use std::path::PathBuf;

/// Result alias used by every fallible pipeline operation.
pub type PackResult<T> = Result<T, PackError>;

/// Errors raised by a [`crate::drive::Drive`] lookup.
#[derive(Debug)]
pub enum DriveError {
  /// The requested key does not exist in the drive.
  NotFound {
    /// Key that was requested.
    path: String,
  },
  /// Reading the backing storage failed.
  Io {
    /// Key that was requested.
    path: String,
    /// Source I/O error.
    source: std::io::Error,
  },
}

impl DriveError {
  /// Key the failed lookup was made for.
  pub fn path(&self) -> &str {
    match self {
      Self::NotFound { path } | Self::Io { path, .. } => path,
    }
  }
}

/// Errors that abort a pack run. No partial output accompanies any of them.
#[derive(Debug)]
pub enum PackError {
  /// Options were rejected before any pack work started.
  InvalidOptions(String),
  /// The designated entry module could not be resolved.
  MissingEntry {
    /// Entry path as supplied by the caller.
    path: String,
  },
  /// A statically referenced dependency could not be resolved.
  MissingDependency {
    /// Specifier as written in the parent module.
    specifier: String,
    /// Module containing the reference.
    parent: String,
  },
  /// A drive read failed during packing or rehashing.
  Drive(DriveError),
  /// A bundle document could not be decoded.
  MalformedBundle(String),
  /// A configuration file could not be read or parsed.
  Config {
    /// Path of the configuration file.
    path: PathBuf,
    /// Human readable cause.
    message: String,
  },
}

impl From<DriveError> for PackError {
  fn from(err: DriveError) -> Self {
    Self::Drive(err)
  }
}

impl std::fmt::Display for DriveError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::NotFound { path } => write!(f, "no such file in drive: {path}"),
      Self::Io { path, source } => write!(f, "failed to read {path}: {source}"),
    }
  }
}

impl std::error::Error for DriveError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::NotFound { .. } => None,
      Self::Io { source, .. } => Some(source),
    }
  }
}

impl std::fmt::Display for PackError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::InvalidOptions(message) => write!(f, "invalid pack options: {message}"),
      Self::MissingEntry { path } => {
        write!(f, "MODULE_NOT_FOUND: cannot find entry module '{path}'")
      }
      Self::MissingDependency { specifier, parent } => write!(
        f,
        "MODULE_NOT_FOUND: cannot find module '{specifier}' imported from '{parent}'"
      ),
      Self::Drive(err) => write!(f, "{err}"),
      Self::MalformedBundle(message) => write!(f, "malformed bundle: {message}"),
      Self::Config { path, message } => {
        write!(f, "failed to load {}: {}", path.display(), message)
      }
    }
  }
}

impl std::error::Error for PackError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Drive(err) => Some(err),
      _ => None,
    }
  }
}
