//! Extract selected files from a bundle and relink every reference to them.

use indexmap::IndexMap;
use serde_json::Value;

use super::Bundle;
use crate::error::PackResult;

/// Which inline files [`unpack`] visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnpackOptions {
  /// Visit files declared as addons.
  pub addons: bool,
  /// Visit files declared as assets.
  pub assets: bool,
  /// Visit every other file.
  pub files: bool,
}

/// Strategy deciding where an extracted file is referenced from afterwards.
pub trait Rewrite {
  /// Return the path `key` should be referenced by. Called once per visited key.
  fn rewrite(&mut self, key: &str) -> PackResult<String>;
}

impl<F> Rewrite for F
where
  F: FnMut(&str) -> PackResult<String>,
{
  fn rewrite(&mut self, key: &str) -> PackResult<String> {
    self(key)
  }
}

/// Visit the selected files in bundle order, hand each to `strategy`, and return the bundle
/// with every reference rewritten. Files moved to a new path leave the inline table; files the
/// strategy keeps in place stay inline.
///
/// Rewriting several keys to the same path collapses their references; declared lists are
/// deduplicated accordingly. A strategy failure aborts the whole unpack.
pub fn unpack<R: Rewrite + ?Sized>(
  bundle: Bundle,
  options: UnpackOptions,
  strategy: &mut R,
) -> PackResult<Bundle> {
  let mut renamed: IndexMap<String, String> = IndexMap::new();
  for key in bundle.files.keys() {
    let is_addon = bundle.addons.contains(key);
    let is_asset = bundle.assets.contains(key);
    let visit = (options.addons && is_addon)
      || (options.assets && is_asset)
      || (options.files && !is_addon && !is_asset);
    if visit {
      let target = strategy.rewrite(key)?;
      renamed.insert(key.clone(), target);
    }
  }

  let relink = |path: &str| -> String {
    renamed
      .get(path)
      .cloned()
      .unwrap_or_else(|| path.to_string())
  };

  let mut unpacked = Bundle {
    main: bundle.main.as_deref().map(relink),
    imports: bundle.imports,
    ..Bundle::default()
  };

  for (parent, specifiers) in bundle.resolutions {
    for (specifier, target) in specifiers {
      unpacked.resolve(&relink(&parent), &specifier, relink_value(target, &relink));
    }
  }
  for addon in &bundle.addons {
    unpacked.add_addon(&relink(addon));
  }
  for asset in &bundle.assets {
    unpacked.add_asset(&relink(asset));
  }
  for (path, content) in bundle.files {
    let moved = renamed.get(&path).is_some_and(|target| *target != path);
    if !moved {
      unpacked.write(&path, content);
    }
  }

  Ok(unpacked)
}

fn relink_value(value: Value, relink: &impl Fn(&str) -> String) -> Value {
  match value {
    Value::String(path) => Value::String(relink(&path)),
    Value::Object(per_host) => Value::Object(
      per_host
        .into_iter()
        .map(|(host, target)| (host, relink_value(target, relink)))
        .collect(),
    ),
    other => other,
  }
}
