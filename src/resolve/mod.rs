//! Target-aware resolution policy.
//!
//! For every reference found while walking the module graph the resolver decides which file
//! suffixes and which per-host condition chains apply, based on the reference kind and call
//! site, then hands the lookup to the module or addon primitive. The resolver holds no mutable
//! state, so independent references can be resolved concurrently.

mod addon;
mod conditions;
mod module;
mod package;

use indexmap::IndexMap;
use serde_json::{Map, Value};

pub use addon::{AddonResolveOptions, resolve_addon};
pub use conditions::ConditionChain;
pub use module::{Located, ModuleResolveOptions, resolve_module};
pub use package::PackageJson;

use crate::drive::Drive;
use crate::host::TargetHost;
use crate::options::{PackOptions, ResolveConfig};
use crate::reference::{Reference, ReferenceKind, Site};

/// Scheme recorded for builtin modules.
pub const BUILTIN_SCHEME: &str = "builtin:";

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  /// A builtin module, never read from the drive.
  Builtin(String),
  /// The same file for every host.
  File(String),
  /// Host specific targets in host order. Builtins appear as `builtin:<name>`.
  PerHost(IndexMap<TargetHost, String>),
}

impl Resolution {
  /// Collapse per-host results: identical targets become a single value.
  pub fn from_hosts(located: Vec<(TargetHost, Located)>) -> Option<Self> {
    let (_, first) = located.first()?;
    if located.iter().all(|(_, candidate)| candidate == first) {
      return Some(match first.clone() {
        Located::Builtin(name) => Self::Builtin(name),
        Located::File(path) => Self::File(path),
      });
    }

    let per_host = located
      .into_iter()
      .map(|(host, target)| {
        let target = match target {
          Located::Builtin(name) => format!("{BUILTIN_SCHEME}{name}"),
          Located::File(path) => path,
        };
        (host, target)
      })
      .collect();
    Some(Self::PerHost(per_host))
  }

  /// Drive files referenced, in host order and without duplicates.
  pub fn files(&self) -> Vec<&str> {
    match self {
      Self::Builtin(_) => Vec::new(),
      Self::File(path) => vec![path.as_str()],
      Self::PerHost(map) => {
        let mut files: Vec<&str> = Vec::new();
        for target in map.values() {
          if !target.starts_with(BUILTIN_SCHEME) && !files.contains(&target.as_str()) {
            files.push(target);
          }
        }
        files
      }
    }
  }

  /// Representation stored in a bundle's resolution table.
  pub fn to_value(&self) -> Value {
    match self {
      Self::Builtin(name) => Value::String(format!("{BUILTIN_SCHEME}{name}")),
      Self::File(path) => Value::String(path.clone()),
      Self::PerHost(map) => Value::Object(
        map
          .iter()
          .map(|(host, target)| (host.to_string(), Value::String(target.clone())))
          .collect(),
      ),
    }
  }
}

/// Resolution policy for one pack run.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
  config: &'a ResolveConfig,
  hosts: &'a [TargetHost],
  builtins: &'a IndexMap<String, String>,
  imports: &'a Map<String, Value>,
}

impl<'a> Resolver<'a> {
  /// Create a resolver for the hosts and maps carried by `options`.
  pub fn new(config: &'a ResolveConfig, options: &'a PackOptions) -> Self {
    Self {
      config,
      hosts: &options.hosts,
      builtins: &options.builtins,
      imports: &options.imports,
    }
  }

  /// Suffixes tried for a reference of `kind`.
  pub fn extensions_for(&self, kind: ReferenceKind) -> Vec<String> {
    match kind {
      ReferenceKind::Addon(_) => self.config.native_extensions.clone(),
      ReferenceKind::Asset(_) => Vec::new(),
      ReferenceKind::Module(_) => self
        .config
        .module_extensions
        .iter()
        .chain(self.config.native_extensions.iter())
        .cloned()
        .collect(),
    }
  }

  /// One condition chain per host, prefixed with the tag for `kind`.
  ///
  /// Asset chains do not depend on the call site.
  pub fn chains_for(&self, kind: ReferenceKind) -> Vec<ConditionChain> {
    let tag = match kind {
      ReferenceKind::Addon(_) => "addon",
      ReferenceKind::Asset(_) => "asset",
      ReferenceKind::Module(Site::Require) => "require",
      ReferenceKind::Module(Site::Import) => "import",
    };
    self
      .hosts
      .iter()
      .map(|host| ConditionChain::base(&self.config.conditions, host).prefixed(tag))
      .collect()
  }

  /// Locate the file(s) `reference` names on behalf of `parent_url`. `None` means not found.
  pub fn resolve<D: Drive + ?Sized>(
    &self,
    drive: &D,
    reference: &Reference,
    parent_url: &str,
  ) -> Option<Resolution> {
    let extensions = self.extensions_for(reference.kind);
    let chains = self.chains_for(reference.kind);

    match reference.kind {
      ReferenceKind::Addon(_) => {
        let specifier = if reference.specifier.is_empty() {
          "."
        } else {
          reference.specifier.as_str()
        };
        let options = AddonResolveOptions {
          extensions: &extensions,
          chains: &chains,
          hosts: self.hosts,
          linked: false,
        };
        let located = resolve_addon(drive, specifier, parent_url, &options)?
          .into_iter()
          .map(|(host, path)| (host, Located::File(path)))
          .collect();
        Resolution::from_hosts(located)
      }
      ReferenceKind::Asset(_) | ReferenceKind::Module(_) => {
        let options = ModuleResolveOptions {
          extensions: &extensions,
          builtins: self.builtins,
          imports: self.imports,
        };
        let located = chains
          .iter()
          .map(|chain| {
            resolve_module(drive, &reference.specifier, parent_url, chain, &options)
              .map(|target| (chain.host().clone(), target))
          })
          .collect::<Option<Vec<_>>>()?;
        Resolution::from_hosts(located)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::drive::MemoryDrive;

  fn options(hosts: &[&str]) -> PackOptions {
    let mut options = PackOptions::for_hosts(hosts.iter().copied());
    options.builtins.insert("fs".into(), String::new());
    options
  }

  #[test]
  fn extension_sets_depend_on_kind() {
    let options = options(&["linux-x64"]);
    let config = options.resolve_config();
    let resolver = Resolver::new(&config, &options);

    assert_eq!(resolver.extensions_for(ReferenceKind::Addon(Site::Require)), vec![".node", ".bare"]);
    assert!(resolver.extensions_for(ReferenceKind::Asset(Site::Import)).is_empty());
    assert_eq!(resolver.extensions_for(ReferenceKind::Module(Site::Import)), vec![
      ".js", ".cjs", ".mjs", ".json", ".node", ".bare"
    ]);
  }

  #[test]
  fn chains_are_prefixed_per_kind_and_host() {
    let options = options(&["linux-x64", "darwin-arm64"]);
    let config = options.resolve_config();
    let resolver = Resolver::new(&config, &options);

    let addon = resolver.chains_for(ReferenceKind::Addon(Site::Import));
    assert_eq!(addon[0].tags(), ["addon", "node", "bare", "linux", "x64"]);
    assert_eq!(addon[1].tags(), ["addon", "node", "bare", "darwin", "arm64"]);

    let require = resolver.chains_for(ReferenceKind::Module(Site::Require));
    assert_eq!(require[0].tags()[0], "require");
    let import = resolver.chains_for(ReferenceKind::Module(Site::Import));
    assert_eq!(import[0].tags()[0], "import");

    assert_eq!(
      resolver.chains_for(ReferenceKind::Asset(Site::Require)),
      resolver.chains_for(ReferenceKind::Asset(Site::Import))
    );
  }

  #[test]
  fn custom_conditions_replace_the_base_chain() {
    let mut options = options(&["linux-x64"]);
    options.conditions = vec!["electron".into()];
    let config = options.resolve_config();
    let resolver = Resolver::new(&config, &options);
    let chains = resolver.chains_for(ReferenceKind::Module(Site::Require));
    assert_eq!(chains[0].tags(), ["require", "electron", "linux", "x64"]);
  }

  #[test]
  fn resolves_modules_assets_and_builtins() {
    let drive = MemoryDrive::new()
      .with("/boot.js", "")
      .with("/simple-module.js", "")
      .with("/data.txt", "data");
    let options = options(&["linux-x64", "win32-x64"]);
    let config = options.resolve_config();
    let resolver = Resolver::new(&config, &options);

    assert_eq!(
      resolver.resolve(&drive, &Reference::require("./simple-module"), "/boot.js"),
      Some(Resolution::File("/simple-module.js".into()))
    );
    assert_eq!(
      resolver.resolve(&drive, &Reference::asset("./data.txt"), "/boot.js"),
      Some(Resolution::File("/data.txt".into()))
    );
    assert_eq!(resolver.resolve(&drive, &Reference::asset("./data"), "/boot.js"), None);
    assert_eq!(
      resolver.resolve(&drive, &Reference::import("fs"), "/boot.js"),
      Some(Resolution::Builtin("fs".into()))
    );
  }

  #[test]
  fn addon_references_default_to_self_and_split_per_host() {
    let drive = MemoryDrive::new()
      .with("/package.json", r#"{"name":"addon"}"#)
      .with("/boot.js", "")
      .with("/prebuilds/linux-x64/addon.node", [1u8])
      .with("/prebuilds/darwin-x64/addon.node", [2u8]);
    let options = options(&["linux-x64", "darwin-x64"]);
    let config = options.resolve_config();
    let resolver = Resolver::new(&config, &options);

    let resolution = resolver
      .resolve(&drive, &Reference::addon(""), "/boot.js")
      .unwrap();
    assert_eq!(resolution.files(), vec![
      "/prebuilds/linux-x64/addon.node",
      "/prebuilds/darwin-x64/addon.node"
    ]);
    assert_eq!(
      resolution.to_value(),
      serde_json::json!({
        "linux-x64": "/prebuilds/linux-x64/addon.node",
        "darwin-x64": "/prebuilds/darwin-x64/addon.node"
      })
    );
  }

  #[test]
  fn host_specific_exports_produce_per_host_resolutions() {
    let drive = MemoryDrive::new()
      .with("/node_modules/dep/package.json", r#"{"exports":{"linux":"./linux.js","default":"./other.js"}}"#)
      .with("/node_modules/dep/linux.js", "")
      .with("/node_modules/dep/other.js", "");
    let options = options(&["linux-x64", "win32-x64"]);
    let config = options.resolve_config();
    let resolver = Resolver::new(&config, &options);

    let resolution = resolver
      .resolve(&drive, &Reference::require("dep"), "/boot.js")
      .unwrap();
    assert_eq!(resolution.files(), vec![
      "/node_modules/dep/linux.js",
      "/node_modules/dep/other.js"
    ]);
  }

  #[test]
  fn collapses_identical_host_results() {
    let host = TargetHost::from("linux-x64");
    let other = TargetHost::from("win32-x64");
    let resolution = Resolution::from_hosts(vec![
      (host, Located::File("/a.js".into())),
      (other, Located::File("/a.js".into())),
    ]);
    assert_eq!(resolution, Some(Resolution::File("/a.js".into())));
    assert_eq!(Resolution::from_hosts(Vec::new()), None);
  }
}
