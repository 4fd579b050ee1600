//! Project configuration loader describing how a directory should be packed.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{PackError, PackResult};
use crate::host::TargetHost;
use crate::options::{OptionalPolicy, PackOptions};

/// File looked up by [`PackConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "pack.config.json";

/// Discoverable configuration mirroring [`PackOptions`] as JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackConfig {
  /// Absolute path of the entry module inside the drive.
  pub entry: String,
  /// Target host identifiers.
  pub hosts: Vec<String>,
  /// Builtin module replacements.
  pub builtins: IndexMap<String, String>,
  /// Import map applied before resolution.
  pub imports: Map<String, Value>,
  /// Prefix for asset map keys.
  pub assets_prefix: String,
  /// Prefix for rewritten prebuild references.
  pub prebuild_prefix: String,
  /// Base condition chain.
  pub conditions: Vec<String>,
  /// Native binary suffixes.
  pub extensions: Vec<String>,
  /// Fail the run when a lazy reference is missing.
  pub strict_optional: bool,
}

impl Default for PackConfig {
  fn default() -> Self {
    let options = PackOptions::default();
    Self {
      entry: options.entry,
      hosts: Vec::new(),
      builtins: options.builtins,
      imports: options.imports,
      assets_prefix: options.assets_prefix,
      prebuild_prefix: options.prebuild_prefix,
      conditions: options.conditions,
      extensions: options.extensions,
      strict_optional: false,
    }
  }
}

impl PackConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// When the configuration file does not exist or fails to parse we fall back to default
  /// values so callers can still pack with flags alone.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Ok(config) => config,
      Err(err) => {
        if candidate.exists() {
          log::warn!("{err}; using defaults");
        }
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> PackResult<Self> {
    let content = fs::read_to_string(path).map_err(|err| PackError::Config {
      path: path.to_path_buf(),
      message: err.to_string(),
    })?;
    let config_error = |message: String| PackError::Config {
      path: path.to_path_buf(),
      message,
    };
    let value: Value = serde_json::from_str(&content).map_err(|err| config_error(err.to_string()))?;
    if !value.is_object() {
      return Err(config_error("expected a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|err| config_error(err.to_string()))
  }

  /// Convert the configuration into run options.
  pub fn into_options(self) -> PackOptions {
    PackOptions {
      entry: self.entry,
      hosts: self.hosts.into_iter().map(TargetHost::from).collect(),
      builtins: self.builtins,
      imports: self.imports,
      assets_prefix: self.assets_prefix,
      prebuild_prefix: self.prebuild_prefix,
      conditions: self.conditions,
      extensions: self.extensions,
      optional: if self.strict_optional {
        OptionalPolicy::Fail
      } else {
        OptionalPolicy::Ignore
      },
    }
  }

  /// Path of the configuration file inside `dir`.
  pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_CONFIG_FILE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn discover_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let config = PackConfig::discover(dir.path());
    assert_eq!(config.entry, "/boot.js");
    assert!(config.hosts.is_empty());
    assert_eq!(config.extensions, vec![".node", ".bare"]);
  }

  #[test]
  fn discover_ignores_malformed_files() {
    let dir = tempdir().unwrap();
    fs::write(PackConfig::config_path(dir.path()), "{ not json").unwrap();
    let config = PackConfig::discover(dir.path());
    assert_eq!(config.entry, "/boot.js");
  }

  #[test]
  fn from_path_reports_parse_errors_with_path() {
    let dir = tempdir().unwrap();
    let path = PackConfig::config_path(dir.path());
    fs::write(&path, "[]").unwrap();
    let err = PackConfig::from_path(&path).unwrap_err();
    assert!(err.to_string().contains(DEFAULT_CONFIG_FILE));
  }

  #[test]
  fn from_path_rejects_non_object_documents() {
    let dir = tempdir().unwrap();
    let path = PackConfig::config_path(dir.path());
    for document in ["[]", "null", "\"/boot.js\"", "3"] {
      fs::write(&path, document).unwrap();
      let err = PackConfig::from_path(&path).unwrap_err();
      assert!(matches!(err, PackError::Config { .. }), "{document} was accepted");
    }

    fs::write(&path, "{}").unwrap();
    assert_eq!(PackConfig::from_path(&path).unwrap().entry, "/boot.js");
  }

  #[test]
  fn reads_camel_case_fields_into_options() {
    let dir = tempdir().unwrap();
    fs::write(
      PackConfig::config_path(dir.path()),
      r#"{
        "entry": "/main.js",
        "hosts": ["linux-x64", "darwin-arm64"],
        "builtins": { "fs": "mock-fs" },
        "assetsPrefix": "/assets",
        "prebuildPrefix": "/..",
        "strictOptional": true
      }"#,
    )
    .unwrap();

    let options = PackConfig::discover(dir.path()).into_options();
    assert_eq!(options.entry, "/main.js");
    assert_eq!(options.hosts, vec![
      TargetHost::from("linux-x64"),
      TargetHost::from("darwin-arm64")
    ]);
    assert_eq!(options.builtins.get("fs").map(String::as_str), Some("mock-fs"));
    assert_eq!(options.assets_prefix, "/assets");
    assert_eq!(options.prebuild_prefix, "/..");
    assert_eq!(options.optional, OptionalPolicy::Fail);
    assert_eq!(options.conditions, vec!["node", "bare"]);
  }
}
