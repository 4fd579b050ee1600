//! Module resolution primitive: locate a script, data file or asset for one condition chain.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::conditions::ConditionChain;
use super::package::{PackageJson, conditional_target, find_node_module, find_package_root};
use crate::drive::Drive;
use crate::paths::{dirname, join_specifier};

const BUILTIN_SCHEMES: [&str; 2] = ["node:", "bare:"];

/// Inputs shared by every module lookup in a run.
#[derive(Debug, Clone, Copy)]
pub struct ModuleResolveOptions<'a> {
  /// Suffixes tried after the exact path. Empty means exact paths only.
  pub extensions: &'a [String],
  /// Builtin module replacements.
  pub builtins: &'a IndexMap<String, String>,
  /// Caller supplied import map.
  pub imports: &'a Map<String, Value>,
}

/// Where a specifier landed for a single chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
  /// A builtin module, recorded under its replacement name.
  Builtin(String),
  /// A file in the drive.
  File(String),
}

/// Resolve `specifier` relative to `parent_url` for one condition chain.
pub fn resolve_module<D: Drive + ?Sized>(
  drive: &D,
  specifier: &str,
  parent_url: &str,
  chain: &ConditionChain,
  options: &ModuleResolveOptions<'_>,
) -> Option<Located> {
  if let Some(mapped) = options
    .imports
    .get(specifier)
    .and_then(|value| conditional_target(value, chain))
  {
    let lookup = ModuleLookup::new(drive, chain, options);
    return lookup.resolve(&mapped, "/");
  }

  ModuleLookup::new(drive, chain, options).resolve(specifier, parent_url)
}

struct ModuleLookup<'a, D: ?Sized> {
  drive: &'a D,
  chain: &'a ConditionChain,
  options: &'a ModuleResolveOptions<'a>,
}

impl<'a, D: Drive + ?Sized> ModuleLookup<'a, D> {
  fn new(drive: &'a D, chain: &'a ConditionChain, options: &'a ModuleResolveOptions<'a>) -> Self {
    Self {
      drive,
      chain,
      options,
    }
  }

  fn resolve(&self, specifier: &str, parent_url: &str) -> Option<Located> {
    if let Some(replacement) = self.builtin(specifier) {
      return Some(Located::Builtin(replacement));
    }

    let parent_dir = dirname(parent_url);

    if specifier.is_empty() {
      let root = find_package_root(self.drive, parent_dir)?;
      return self.resolve_directory(&root).map(Located::File);
    }

    if specifier.starts_with('#') {
      let root = find_package_root(self.drive, parent_dir)?;
      let package = PackageJson::read(self.drive, &root)?;
      let target = package.import_target(specifier, self.chain)?;
      if target.starts_with('#') {
        log::warn!("ignoring import target '{target}' for '{specifier}' in {root}");
        return None;
      }
      return if is_path_like(&target) {
        self.resolve_path(&join_specifier(&root, &target))
      } else {
        self.resolve(&target, &join_specifier(&root, "package.json"))
      };
    }

    if is_path_like(specifier) {
      return self.resolve_path(&join_specifier(parent_dir, specifier));
    }

    self.resolve_package(specifier, parent_dir)
  }

  fn builtin(&self, specifier: &str) -> Option<String> {
    let name = BUILTIN_SCHEMES
      .iter()
      .find_map(|scheme| specifier.strip_prefix(scheme))
      .unwrap_or(specifier);
    self
      .options
      .builtins
      .get(name)
      .map(|replacement| {
        if replacement.is_empty() {
          name.to_string()
        } else {
          replacement.clone()
        }
      })
  }

  fn resolve_path(&self, path: &str) -> Option<Located> {
    self
      .resolve_file(path)
      .or_else(|| self.resolve_directory(path))
      .map(Located::File)
  }

  fn resolve_package(&self, specifier: &str, parent_dir: &str) -> Option<Located> {
    let (name, subpath) = split_package_specifier(specifier);
    let package_dir = find_node_module(self.drive, parent_dir, name)?;
    self.resolve_in_package(&package_dir, subpath).map(Located::File)
  }

  fn resolve_in_package(&self, package_dir: &str, subpath: &str) -> Option<String> {
    let package = PackageJson::read(self.drive, package_dir);
    let export_key = if subpath.is_empty() {
      ".".to_string()
    } else {
      format!("./{subpath}")
    };

    if let Some(package) = package.as_ref().filter(|package| package.exports.is_some()) {
      let target = package.export_target(&export_key, self.chain)?;
      let path = join_specifier(package_dir, &target);
      return self.drive.is_file(&path).then_some(path);
    }

    if subpath.is_empty() {
      self.resolve_directory(package_dir)
    } else {
      let path = join_specifier(package_dir, subpath);
      self
        .resolve_file(&path)
        .or_else(|| self.resolve_directory(&path))
    }
  }

  fn resolve_file(&self, path: &str) -> Option<String> {
    if self.drive.is_file(path) {
      return Some(path.to_string());
    }
    self
      .options
      .extensions
      .iter()
      .map(|ext| format!("{path}{ext}"))
      .find(|candidate| self.drive.is_file(candidate))
  }

  fn resolve_directory(&self, dir: &str) -> Option<String> {
    if !self.drive.is_dir(dir) {
      return None;
    }

    if let Some(package) = PackageJson::read(self.drive, dir) {
      if let Some(target) = package.export_target(".", self.chain) {
        let path = join_specifier(dir, &target);
        if self.drive.is_file(&path) {
          return Some(path);
        }
      }
      if let Some(main) = package.main.as_deref() {
        let path = join_specifier(dir, main);
        if let Some(found) = self.resolve_file(&path).or_else(|| self.resolve_index(&path)) {
          return Some(found);
        }
      }
    }

    self.resolve_index(dir)
  }

  fn resolve_index(&self, dir: &str) -> Option<String> {
    if self.options.extensions.is_empty() {
      return None;
    }
    self.resolve_file(&join_specifier(dir, "index"))
  }
}

fn is_path_like(specifier: &str) -> bool {
  specifier == "."
    || specifier == ".."
    || specifier.starts_with("./")
    || specifier.starts_with("../")
    || specifier.starts_with('/')
}

/// Split `@scope/name/sub/path` into the package name and the remaining subpath.
pub(crate) fn split_package_specifier(specifier: &str) -> (&str, &str) {
  let separators = if specifier.starts_with('@') { 2 } else { 1 };
  let mut split_at = None;
  for (count, (index, _)) in specifier.match_indices('/').enumerate() {
    if count + 1 == separators {
      split_at = Some(index);
      break;
    }
  }
  match split_at {
    Some(index) => (&specifier[..index], &specifier[index + 1..]),
    None => (specifier, ""),
  }
}
