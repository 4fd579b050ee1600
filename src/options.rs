//! Per-run options and the resolution defaults derived from them.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{PackError, PackResult};
use crate::host::TargetHost;

/// Entry module used when the caller does not name one.
pub const DEFAULT_ENTRY: &str = "/boot.js";

/// Base condition chain every host chain starts from.
pub const DEFAULT_CONDITIONS: [&str; 2] = ["node", "bare"];

/// Suffixes marking a file as a native binary.
pub const DEFAULT_NATIVE_EXTENSIONS: [&str; 2] = [".node", ".bare"];

/// Script and data suffixes tried before the native ones for plain modules.
pub const MODULE_EXTENSIONS: [&str; 4] = [".js", ".cjs", ".mjs", ".json"];

/// What to do with a lazily evaluated reference that cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionalPolicy {
  /// Leave the reference unresolved; the runtime decides what happens.
  #[default]
  Ignore,
  /// Treat it like any other missing dependency.
  Fail,
}

/// Options for a single pack run.
#[derive(Debug, Clone)]
pub struct PackOptions {
  /// Absolute path of the entry module.
  pub entry: String,
  /// Hosts the bundle is built for, in the order their chains are tried.
  pub hosts: Vec<TargetHost>,
  /// Builtin module names mapped to the specifier recorded in their place.
  pub builtins: IndexMap<String, String>,
  /// Import map applied before resolution.
  pub imports: Map<String, Value>,
  /// Prefix applied to keys of the returned asset map.
  pub assets_prefix: String,
  /// Prefix applied to rewritten prebuild references and prebuild map keys.
  pub prebuild_prefix: String,
  /// Base condition chain.
  pub conditions: Vec<String>,
  /// Native binary suffixes.
  pub extensions: Vec<String>,
  /// Policy for lazy references that cannot be resolved.
  pub optional: OptionalPolicy,
}

impl Default for PackOptions {
  fn default() -> Self {
    Self {
      entry: DEFAULT_ENTRY.into(),
      hosts: Vec::new(),
      builtins: IndexMap::new(),
      imports: Map::new(),
      assets_prefix: String::new(),
      prebuild_prefix: String::new(),
      conditions: to_strings(&DEFAULT_CONDITIONS),
      extensions: to_strings(&DEFAULT_NATIVE_EXTENSIONS),
      optional: OptionalPolicy::default(),
    }
  }
}

impl PackOptions {
  /// Options for the given hosts with every other field defaulted.
  pub fn for_hosts<I, H>(hosts: I) -> Self
  where
    I: IntoIterator<Item = H>,
    H: Into<TargetHost>,
  {
    Self {
      hosts: hosts.into_iter().map(Into::into).collect(),
      ..Self::default()
    }
  }

  /// Override the entry module.
  pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
    self.entry = entry.into();
    self
  }

  /// Reject options that can never produce a bundle.
  pub fn validate(&self) -> PackResult<()> {
    if self.hosts.is_empty() {
      return Err(PackError::InvalidOptions(
        "at least one target host is required".into(),
      ));
    }
    if let Some(host) = self.hosts.iter().find(|host| !host.is_well_formed()) {
      return Err(PackError::InvalidOptions(format!(
        "malformed target host '{host}'"
      )));
    }
    if !self.entry.starts_with('/') {
      return Err(PackError::InvalidOptions(format!(
        "entry '{}' must be an absolute path",
        self.entry
      )));
    }
    if let Some(ext) = self.extensions.iter().find(|ext| !ext.starts_with('.')) {
      return Err(PackError::InvalidOptions(format!(
        "extension '{ext}' must start with '.'"
      )));
    }
    Ok(())
  }

  /// Resolution defaults for this run.
  pub fn resolve_config(&self) -> ResolveConfig {
    ResolveConfig {
      conditions: self.conditions.clone(),
      native_extensions: self.extensions.clone(),
      module_extensions: to_strings(&MODULE_EXTENSIONS),
    }
  }
}

/// Condition and extension defaults threaded through every resolver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveConfig {
  /// Base condition chain.
  pub conditions: Vec<String>,
  /// Native binary suffixes.
  pub native_extensions: Vec<String>,
  /// Script and data suffixes.
  pub module_extensions: Vec<String>,
}

impl Default for ResolveConfig {
  fn default() -> Self {
    PackOptions::default().resolve_config()
  }
}

fn to_strings(values: &[&str]) -> Vec<String> {
  values.iter().map(|value| value.to_string()).collect()
}
