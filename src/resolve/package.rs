//! `package.json` lookups shared by the module and addon primitives.

use serde::Deserialize;
use serde_json::Value;

use super::conditions::ConditionChain;
use crate::drive::Drive;
use crate::paths::join_specifier;

/// The `package.json` fields resolution cares about.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageJson {
  /// Package name, possibly scoped.
  pub name: Option<String>,
  /// Package version.
  pub version: Option<String>,
  /// Legacy entry point.
  pub main: Option<String>,
  /// Conditional export map.
  pub exports: Option<Value>,
  /// Private `#`-prefixed import map.
  pub imports: Option<Value>,
  /// Explicit addon location, plain or conditional.
  pub addon: Option<Value>,
}

impl PackageJson {
  /// Read `<dir>/package.json`. Missing or malformed manifests read as `None`.
  pub fn read<D: Drive + ?Sized>(drive: &D, dir: &str) -> Option<Self> {
    let path = join_specifier(dir, "package.json");
    let content = drive.get(&path).ok()?;
    match serde_json::from_slice(&content) {
      Ok(package) => Some(package),
      Err(err) => {
        log::warn!("ignoring malformed {path}: {err}");
        None
      }
    }
  }

  /// Resolve an export subpath (`.` or `./name`) to a package-relative target.
  pub fn export_target(&self, subpath: &str, chain: &ConditionChain) -> Option<String> {
    let exports = self.exports.as_ref()?;
    let has_subpaths = exports
      .as_object()
      .is_some_and(|map| map.keys().any(|key| key.starts_with('.')));

    if has_subpaths {
      subpath_target(exports, subpath, chain)
    } else if subpath == "." {
      conditional_target(exports, chain)
    } else {
      None
    }
  }

  /// Resolve a `#name` private import to a package-relative target or bare specifier.
  pub fn import_target(&self, specifier: &str, chain: &ConditionChain) -> Option<String> {
    subpath_target(self.imports.as_ref()?, specifier, chain)
  }
}

/// Walk upward from `dir` to the nearest directory holding a `package.json`.
pub fn find_package_root<D: Drive + ?Sized>(drive: &D, dir: &str) -> Option<String> {
  let mut current = join_specifier(dir, ".");
  loop {
    if drive.is_file(&join_specifier(&current, "package.json")) {
      return Some(current);
    }
    if current == "/" {
      return None;
    }
    current = join_specifier(&current, "..");
  }
}

/// Find `node_modules/<name>` in `dir` or the closest ancestor that has it.
pub fn find_node_module<D: Drive + ?Sized>(drive: &D, dir: &str, name: &str) -> Option<String> {
  let mut current = join_specifier(dir, ".");
  loop {
    let candidate = join_specifier(&join_specifier(&current, "node_modules"), name);
    if drive.is_dir(&candidate) {
      return Some(candidate);
    }
    if current == "/" {
      return None;
    }
    current = join_specifier(&current, "..");
  }
}

/// Pick a target out of a conditional value: strings are targets, arrays yield their first
/// matching element, objects are walked in document order against the chain.
pub fn conditional_target(value: &Value, chain: &ConditionChain) -> Option<String> {
  match value {
    Value::String(target) => Some(target.clone()),
    Value::Array(items) => items.iter().find_map(|item| conditional_target(item, chain)),
    Value::Object(map) => map
      .iter()
      .filter(|(key, _)| chain.matches(key))
      .find_map(|(_, value)| conditional_target(value, chain)),
    _ => None,
  }
}

/// Look `key` up in a subpath map, honouring a single `*` wildcard per pattern.
fn subpath_target(map: &Value, key: &str, chain: &ConditionChain) -> Option<String> {
  let map = map.as_object()?;
  if let Some(value) = map.get(key) {
    return conditional_target(value, chain);
  }

  map.iter().find_map(|(pattern, value)| {
    let (prefix, suffix) = pattern.split_once('*')?;
    let matched = key.strip_prefix(prefix)?.strip_suffix(suffix)?;
    let target = conditional_target(value, chain)?;
    Some(target.replace('*', matched))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::drive::MemoryDrive;
  use crate::host::TargetHost;
  use serde_json::json;

  fn chain(tag: &str) -> ConditionChain {
    ConditionChain::base(&["node".into(), "bare".into()], &TargetHost::from("linux-x64"))
      .prefixed(tag)
  }

  fn package(exports: Value) -> PackageJson {
    PackageJson {
      exports: Some(exports),
      ..PackageJson::default()
    }
  }

  #[test]
  fn string_exports_apply_to_the_root_only() {
    let package = package(json!("./index.js"));
    assert_eq!(package.export_target(".", &chain("require")).as_deref(), Some("./index.js"));
    assert_eq!(package.export_target("./other", &chain("require")), None);
  }

  #[test]
  fn conditional_exports_follow_document_order() {
    let package = package(json!({
      "import": "./esm.mjs",
      "require": "./cjs.cjs",
      "default": "./fallback.js"
    }));
    assert_eq!(package.export_target(".", &chain("import")).as_deref(), Some("./esm.mjs"));
    assert_eq!(package.export_target(".", &chain("require")).as_deref(), Some("./cjs.cjs"));
    assert_eq!(package.export_target(".", &chain("asset")).as_deref(), Some("./fallback.js"));
  }

  #[test]
  fn nested_host_conditions_select_platform_files() {
    let package = package(json!({
      ".": { "darwin": "./darwin.js", "linux": { "arm64": "./linux-arm.js", "default": "./linux.js" } },
      "./lib/*": "./src/lib/*.js"
    }));
    assert_eq!(package.export_target(".", &chain("require")).as_deref(), Some("./linux.js"));
    assert_eq!(
      package.export_target("./lib/util", &chain("require")).as_deref(),
      Some("./src/lib/util.js")
    );
    assert_eq!(package.export_target("./missing", &chain("require")), None);
  }

  #[test]
  fn private_imports_resolve_through_conditions() {
    let package = PackageJson {
      imports: Some(json!({ "#fs": { "bare": "bare-fs", "default": "fs" } })),
      ..PackageJson::default()
    };
    assert_eq!(package.import_target("#fs", &chain("require")).as_deref(), Some("bare-fs"));
  }

  #[test]
  fn finds_nearest_package_root() {
    let drive = MemoryDrive::new()
      .with("/package.json", "{}")
      .with("/node_modules/a/package.json", r#"{"name":"a"}"#)
      .with("/node_modules/a/lib/deep/index.js", "");
    assert_eq!(
      find_package_root(&drive, "/node_modules/a/lib/deep/").as_deref(),
      Some("/node_modules/a")
    );
    assert_eq!(find_package_root(&drive, "/src/").as_deref(), Some("/"));
    assert_eq!(find_package_root(&MemoryDrive::new(), "/src/"), None);
  }

  #[test]
  fn finds_closest_node_module() {
    let drive = MemoryDrive::new()
      .with("/node_modules/dep/index.js", "")
      .with("/app/node_modules/dep/index.js", "");
    assert_eq!(
      find_node_module(&drive, "/app/src/", "dep").as_deref(),
      Some("/app/node_modules/dep")
    );
    assert_eq!(find_node_module(&drive, "/lib/", "dep").as_deref(), Some("/node_modules/dep"));
    assert_eq!(find_node_module(&drive, "/lib/", "other"), None);
  }

  #[test]
  fn malformed_manifests_read_as_absent() {
    let drive = MemoryDrive::new().with("/package.json", "{ nope");
    assert!(PackageJson::read(&drive, "/").is_none());
  }
}
