//! Pattern based scanner classifying the references a script makes.
//!
//! This is not a JavaScript parser: it recognises the handful of call shapes the packer cares
//! about and reports them in source order. References inside comments and strings are
//! reported too.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::reference::{Reference, ReferenceKind, Site};

const QUOTED: &str = r#"(?:'([^'\n]*)'|"([^"\n]*)"|`([^`\n$]*)`)"#;

struct Patterns {
  addon: Regex,
  asset: Regex,
  require: Regex,
  import: Regex,
  export: Regex,
  dynamic_import: Regex,
}

fn patterns() -> &'static Patterns {
  static PATTERNS: OnceLock<Patterns> = OnceLock::new();
  PATTERNS.get_or_init(|| Patterns {
    addon: Regex::new(&format!(
      r"\b(require|import\.meta)\.addon\s*\(\s*(?:{QUOTED})?\s*[,)]"
    ))
    .expect("invalid addon regex"),
    asset: Regex::new(&format!(
      r"\b(require|import\.meta)\.asset\s*\(\s*{QUOTED}"
    ))
    .expect("invalid asset regex"),
    require: Regex::new(&format!(r"\brequire\s*\(\s*{QUOTED}\s*\)"))
      .expect("invalid require regex"),
    import: Regex::new(&format!(
      r"\bimport\s*(?:[\w$*{{}}\s,]+?\s*from\s*)?{QUOTED}"
    ))
    .expect("invalid import regex"),
    export: Regex::new(&format!(r"\bexport\s*[\w$*{{}}\s,]+?\s*from\s*{QUOTED}"))
      .expect("invalid export regex"),
    dynamic_import: Regex::new(&format!(r"\bimport\s*\(\s*{QUOTED}\s*[,)]"))
      .expect("invalid dynamic import regex"),
  })
}

/// Returns `true` for files whose text should be scanned for references.
pub fn is_scannable(path: &str) -> bool {
  matches!(
    crate::paths::extension(path),
    Some(".js" | ".cjs" | ".mjs")
  )
}

/// Scan `source` and return its references in source order, without duplicates.
pub fn scan(source: &str) -> Vec<Reference> {
  let patterns = patterns();
  let mut found: Vec<(usize, Reference)> = Vec::new();

  for caps in patterns.addon.captures_iter(source) {
    let site = site_of(&caps);
    let specifier = quoted(&caps, 2).unwrap_or_default();
    found.push((start(&caps), Reference::new(specifier, ReferenceKind::Addon(site))));
  }

  for caps in patterns.asset.captures_iter(source) {
    let site = site_of(&caps);
    if let Some(specifier) = quoted(&caps, 2) {
      found.push((start(&caps), Reference::new(specifier, ReferenceKind::Asset(site))));
    }
  }

  for caps in patterns.require.captures_iter(source) {
    if let Some(specifier) = quoted(&caps, 1) {
      found.push((start(&caps), Reference::require(specifier)));
    }
  }

  for caps in patterns
    .import
    .captures_iter(source)
    .chain(patterns.export.captures_iter(source))
  {
    if let Some(specifier) = quoted(&caps, 1) {
      found.push((start(&caps), Reference::import(specifier)));
    }
  }

  for caps in patterns.dynamic_import.captures_iter(source) {
    if let Some(specifier) = quoted(&caps, 1) {
      found.push((start(&caps), Reference::import(specifier).lazy()));
    }
  }

  found.sort_by_key(|(offset, _)| *offset);

  // An eager occurrence anywhere makes the whole reference eager.
  let mut positions: HashMap<(String, ReferenceKind), usize> = HashMap::new();
  let mut references: Vec<Reference> = Vec::new();
  for (_, reference) in found {
    let key = (reference.specifier.clone(), reference.kind);
    match positions.get(&key) {
      Some(&index) => references[index].lazy &= reference.lazy,
      None => {
        positions.insert(key, references.len());
        references.push(reference);
      }
    }
  }
  references
}

fn start(caps: &Captures<'_>) -> usize {
  caps.get(0).map(|m| m.start()).unwrap_or_default()
}

fn site_of(caps: &Captures<'_>) -> Site {
  match caps.get(1).map(|m| m.as_str()) {
    Some("require") => Site::Require,
    _ => Site::Import,
  }
}

/// First populated quote group starting at `first`.
fn quoted(caps: &Captures<'_>, first: usize) -> Option<String> {
  (first..first + 3)
    .find_map(|index| caps.get(index))
    .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn specifiers(source: &str) -> Vec<(String, ReferenceKind, bool)> {
    scan(source)
      .into_iter()
      .map(|r| (r.specifier, r.kind, r.lazy))
      .collect()
  }

  #[test]
  fn classifies_require_calls() {
    let refs = specifiers("const a = require('./a')\nconst b = require(\"b\")");
    assert_eq!(refs, vec![
      ("./a".into(), ReferenceKind::Module(Site::Require), false),
      ("b".into(), ReferenceKind::Module(Site::Require), false),
    ]);
  }

  #[test]
  fn classifies_static_and_dynamic_imports() {
    let source = r#"
      import fs from 'fs'
      import { a, b } from "./ab.js"
      import * as ns from './ns.js'
      import './side-effect.js'
      export { c } from './c.js'
      export * from './all.js'
      const lazy = await import('./lazy.js')
    "#;
    let refs = specifiers(source);
    let import = ReferenceKind::Module(Site::Import);
    assert_eq!(refs, vec![
      ("fs".into(), import, false),
      ("./ab.js".into(), import, false),
      ("./ns.js".into(), import, false),
      ("./side-effect.js".into(), import, false),
      ("./c.js".into(), import, false),
      ("./all.js".into(), import, false),
      ("./lazy.js".into(), import, true),
    ]);
  }

  #[test]
  fn classifies_addons_with_and_without_specifiers() {
    let source = "const self = require.addon()\nconst other = require.addon('other', __filename)\nconst esm = import.meta.addon()";
    let refs = specifiers(source);
    assert_eq!(refs, vec![
      (String::new(), ReferenceKind::Addon(Site::Require), false),
      ("other".into(), ReferenceKind::Addon(Site::Require), false),
      (String::new(), ReferenceKind::Addon(Site::Import), false),
    ]);
  }

  #[test]
  fn classifies_assets() {
    let source = "const p = require.asset('./data.txt')\nconst q = import.meta.asset(\"./img.png\")";
    let refs = specifiers(source);
    assert_eq!(refs, vec![
      ("./data.txt".into(), ReferenceKind::Asset(Site::Require), false),
      ("./img.png".into(), ReferenceKind::Asset(Site::Import), false),
    ]);
  }

  #[test]
  fn deduplicates_repeated_references() {
    let refs = scan("require('./a'); require('./a'); import './a'");
    assert_eq!(refs.len(), 2);
  }

  #[test]
  fn eager_occurrences_win_over_lazy_ones() {
    let refs = specifiers("const m = import('./x.js')\nimport x from './x.js'");
    assert_eq!(refs, vec![("./x.js".into(), ReferenceKind::Module(Site::Import), false)]);

    let refs = specifiers("import('./y.js'); import('./y.js')");
    assert_eq!(refs, vec![("./y.js".into(), ReferenceKind::Module(Site::Import), true)]);
  }

  #[test]
  fn ignores_identifiers_that_merely_contain_keywords() {
    assert!(scan("myrequire('./a'); reimport('./b')").is_empty());
    assert!(scan("const importMeta = import.meta.url").is_empty());
  }

  #[test]
  fn only_scripts_are_scanned() {
    assert!(is_scannable("/boot.js"));
    assert!(is_scannable("/lib/a.mjs"));
    assert!(!is_scannable("/config.json"));
    assert!(!is_scannable("/prebuilds/linux-x64/addon.node"));
  }
}
