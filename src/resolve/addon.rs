//! Addon resolution primitive: locate the shipped prebuilt binary of a package per host.

use super::conditions::ConditionChain;
use super::module::split_package_specifier;
use super::package::{PackageJson, conditional_target, find_node_module, find_package_root};
use crate::drive::Drive;
use crate::host::TargetHost;
use crate::paths::{dirname, has_extension_in, join_specifier};

const LINKED_BUILD_DIRS: [&str; 2] = ["build/Release", "build/Debug"];

/// Inputs for an addon lookup.
#[derive(Debug, Clone, Copy)]
pub struct AddonResolveOptions<'a> {
  /// Native binary suffixes.
  pub extensions: &'a [String],
  /// One addon-prefixed chain per host.
  pub chains: &'a [ConditionChain],
  /// Hosts that must each receive a binary.
  pub hosts: &'a [TargetHost],
  /// Prefer a locally built binary over shipped prebuilds.
  pub linked: bool,
}

/// Resolve the binary `specifier` names for every host, or `None` when any host lacks one.
///
/// `.` (or an empty specifier) names the package containing `parent_url`; a relative path
/// names a package directory; anything else is looked up in `node_modules`.
pub fn resolve_addon<D: Drive + ?Sized>(
  drive: &D,
  specifier: &str,
  parent_url: &str,
  options: &AddonResolveOptions<'_>,
) -> Option<Vec<(TargetHost, String)>> {
  let root = package_root(drive, specifier, parent_url)?;
  let package = PackageJson::read(drive, &root).unwrap_or_default();
  let base_names = base_names(&package);

  options
    .hosts
    .iter()
    .map(|host| {
      let chain = options.chains.iter().find(|chain| chain.host() == host);
      let found = locate_for_host(drive, &root, &package, &base_names, host, chain, options);
      if found.is_none() {
        log::debug!("no {host} binary for addon '{specifier}' in {root}");
      }
      found.map(|path| (host.clone(), path))
    })
    .collect()
}

fn package_root<D: Drive + ?Sized>(drive: &D, specifier: &str, parent_url: &str) -> Option<String> {
  let parent_dir = dirname(parent_url);
  match specifier {
    "" | "." => Some(find_package_root(drive, parent_dir).unwrap_or_else(|| "/".into())),
    s if s.starts_with("./") || s.starts_with("../") || s.starts_with('/') => {
      let dir = join_specifier(parent_dir, s);
      drive.is_dir(&dir).then_some(dir)
    }
    s => {
      let (name, _) = split_package_specifier(s);
      find_node_module(drive, parent_dir, name)
    }
  }
}

/// File stems a prebuild may be published under, most specific first.
fn base_names(package: &PackageJson) -> Vec<String> {
  let Some(name) = package.name.as_deref() else {
    return Vec::new();
  };
  let name = name.replace('/', "+");
  match package.version.as_deref() {
    Some(version) => vec![format!("{name}@{version}"), name],
    None => vec![name],
  }
}

fn locate_for_host<D: Drive + ?Sized>(
  drive: &D,
  root: &str,
  package: &PackageJson,
  base_names: &[String],
  host: &TargetHost,
  chain: Option<&ConditionChain>,
  options: &AddonResolveOptions<'_>,
) -> Option<String> {
  let is_binary = |path: &str| drive.is_file(path) && has_extension_in(path, options.extensions);

  if let (Some(addon), Some(chain)) = (package.addon.as_ref(), chain)
    && let Some(target) = conditional_target(addon, chain)
  {
    let path = join_specifier(root, &target);
    if is_binary(&path) {
      return Some(path);
    }
  }

  let mut dirs: Vec<String> = Vec::new();
  if options.linked {
    dirs.extend(LINKED_BUILD_DIRS.iter().map(|dir| join_specifier(root, dir)));
  }
  dirs.push(join_specifier(root, &format!("prebuilds/{host}")));

  dirs.iter().find_map(|dir| {
    let named = base_names.iter().find_map(|stem| {
      options
        .extensions
        .iter()
        .map(|ext| join_specifier(dir, &format!("{stem}{ext}")))
        .find(|path| is_binary(path))
    });
    named.or_else(|| {
      drive
        .list(dir)
        .into_iter()
        .map(|name| join_specifier(dir, &name))
        .find(|path| is_binary(path))
    })
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::drive::MemoryDrive;

  fn extensions() -> Vec<String> {
    vec![".node".into(), ".bare".into()]
  }

  fn hosts(ids: &[&str]) -> Vec<TargetHost> {
    ids.iter().map(|id| TargetHost::from(*id)).collect()
  }

  fn chains(hosts: &[TargetHost]) -> Vec<ConditionChain> {
    hosts
      .iter()
      .map(|host| ConditionChain::base(&["node".into(), "bare".into()], host).prefixed("addon"))
      .collect()
  }

  fn resolve(
    drive: &MemoryDrive,
    specifier: &str,
    parent: &str,
    ids: &[&str],
    linked: bool,
  ) -> Option<Vec<(TargetHost, String)>> {
    let extensions = extensions();
    let hosts = hosts(ids);
    let chains = chains(&hosts);
    let options = AddonResolveOptions {
      extensions: &extensions,
      chains: &chains,
      hosts: &hosts,
      linked,
    };
    resolve_addon(drive, specifier, parent, &options)
  }

  fn paths(resolved: Option<Vec<(TargetHost, String)>>) -> Vec<String> {
    resolved
      .unwrap_or_default()
      .into_iter()
      .map(|(_, path)| path)
      .collect()
  }

  #[test]
  fn resolves_self_addon_by_package_name() {
    let drive = MemoryDrive::new()
      .with("/package.json", r#"{"name":"addon","version":"1.0.0"}"#)
      .with("/boot.js", "")
      .with("/prebuilds/linux-x64/addon.node", [1u8])
      .with("/prebuilds/linux-x64/other.node", [2u8]);
    assert_eq!(paths(resolve(&drive, ".", "/boot.js", &["linux-x64"], false)), vec![
      "/prebuilds/linux-x64/addon.node"
    ]);
  }

  #[test]
  fn prefers_versioned_binaries() {
    let drive = MemoryDrive::new()
      .with("/package.json", r#"{"name":"@scope/addon","version":"2.1.0"}"#)
      .with("/prebuilds/linux-x64/@scope+addon.bare", [1u8])
      .with("/prebuilds/linux-x64/@scope+addon@2.1.0.bare", [2u8]);
    assert_eq!(paths(resolve(&drive, "", "/index.js", &["linux-x64"], false)), vec![
      "/prebuilds/linux-x64/@scope+addon@2.1.0.bare"
    ]);
  }

  #[test]
  fn falls_back_to_first_binary_in_host_directory() {
    let drive = MemoryDrive::new()
      .with("/boot.js", "")
      .with("/prebuilds/linux-x64/README.md", "")
      .with("/prebuilds/linux-x64/zeta.node", [1u8])
      .with("/prebuilds/linux-x64/alpha.node", [2u8]);
    assert_eq!(paths(resolve(&drive, ".", "/boot.js", &["linux-x64"], false)), vec![
      "/prebuilds/linux-x64/alpha.node"
    ]);
  }

  #[test]
  fn resolves_every_host_or_nothing() {
    let drive = MemoryDrive::new()
      .with("/node_modules/dep/package.json", r#"{"name":"dep"}"#)
      .with("/node_modules/dep/prebuilds/linux-x64/dep.node", [1u8])
      .with("/node_modules/dep/prebuilds/darwin-arm64/dep.node", [2u8]);

    assert_eq!(paths(resolve(&drive, "dep", "/boot.js", &["darwin-arm64", "linux-x64"], false)), vec![
      "/node_modules/dep/prebuilds/darwin-arm64/dep.node",
      "/node_modules/dep/prebuilds/linux-x64/dep.node",
    ]);
    assert!(resolve(&drive, "dep", "/boot.js", &["linux-x64", "win32-x64"], false).is_none());
    assert!(resolve(&drive, "missing", "/boot.js", &["linux-x64"], false).is_none());
  }

  #[test]
  fn linked_builds_are_only_used_when_requested() {
    let drive = MemoryDrive::new()
      .with("/package.json", r#"{"name":"addon"}"#)
      .with("/build/Release/addon.node", [1u8])
      .with("/prebuilds/linux-x64/addon.node", [2u8]);
    assert_eq!(paths(resolve(&drive, ".", "/boot.js", &["linux-x64"], false)), vec![
      "/prebuilds/linux-x64/addon.node"
    ]);
    assert_eq!(paths(resolve(&drive, ".", "/boot.js", &["linux-x64"], true)), vec![
      "/build/Release/addon.node"
    ]);
  }

  #[test]
  fn explicit_addon_field_follows_host_conditions() {
    let drive = MemoryDrive::new()
      .with("/package.json", r#"{"name":"addon","addon":{"darwin":"./bin/mac.node","default":"./bin/generic.node"}}"#)
      .with("/bin/mac.node", [1u8])
      .with("/bin/generic.node", [2u8]);
    assert_eq!(paths(resolve(&drive, ".", "/boot.js", &["darwin-x64", "linux-x64"], false)), vec![
      "/bin/mac.node",
      "/bin/generic.node",
    ]);
  }
}
