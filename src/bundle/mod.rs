//! The packed document: an entry, a resolution table, declared addons and assets, and the
//! inline file contents.

mod codec;
mod unpack;

use indexmap::IndexMap;
use serde_json::{Map, Value};

pub use unpack::{Rewrite, UnpackOptions, unpack};

/// A packed module graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
  /// Path of the entry module.
  pub main: Option<String>,
  /// Import map carried through from the pack options.
  pub imports: Map<String, Value>,
  /// `resolutions[parent][specifier]`: a path, `builtin:<name>`, or a host -> path object.
  pub resolutions: IndexMap<String, Map<String, Value>>,
  /// Native binaries referenced by the graph, in discovery order.
  pub addons: Vec<String>,
  /// Assets referenced by the graph, in discovery order.
  pub assets: Vec<String>,
  /// Inline file contents keyed by path, in discovery order.
  pub files: IndexMap<String, Vec<u8>>,
}

impl Bundle {
  /// Create an empty bundle.
  pub fn new() -> Self {
    Self::default()
  }

  /// Store `content` under `path`. The first write for a path wins its position.
  pub fn write(&mut self, path: &str, content: Vec<u8>) {
    self.files.insert(path.to_string(), content);
  }

  /// Inline content stored under `path`.
  pub fn read(&self, path: &str) -> Option<&[u8]> {
    self.files.get(path).map(Vec::as_slice)
  }

  /// Returns `true` when `path` has inline content.
  pub fn contains(&self, path: &str) -> bool {
    self.files.contains_key(path)
  }

  /// Record what `specifier` resolved to on behalf of `parent`.
  pub fn resolve(&mut self, parent: &str, specifier: &str, target: Value) {
    self
      .resolutions
      .entry(parent.to_string())
      .or_default()
      .insert(specifier.to_string(), target);
  }

  /// Declare `path` as a native addon.
  pub fn add_addon(&mut self, path: &str) {
    push_unique(&mut self.addons, path);
  }

  /// Declare `path` as an asset.
  pub fn add_asset(&mut self, path: &str) {
    push_unique(&mut self.assets, path);
  }

  /// Every string target in the resolution table, per-host entries included.
  pub fn resolved_targets(&self) -> Vec<&str> {
    self
      .resolutions
      .values()
      .flat_map(|specifiers| specifiers.values())
      .flat_map(|target| match target {
        Value::String(path) => vec![path.as_str()],
        Value::Object(per_host) => per_host.values().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
      })
      .collect()
  }
}

fn push_unique(list: &mut Vec<String>, path: &str) {
  if !list.iter().any(|existing| existing == path) {
    list.push(path.to_string());
  }
}
