//! Module graph walk producing a raw bundle.

use std::collections::HashSet;

use crate::bundle::Bundle;
use crate::drive::Drive;
use crate::error::{PackError, PackResult};
use crate::lexer;
use crate::options::OptionalPolicy;
use crate::paths::has_extension_in;
use crate::reference::{Reference, ReferenceKind};
use crate::resolve::{Resolution, Resolver};

/// Walks the graph reachable from an entry module and collects it into a [`Bundle`].
pub struct Traversal<'a, D: ?Sized> {
  drive: &'a D,
  resolver: Resolver<'a>,
  native_extensions: &'a [String],
  optional: OptionalPolicy,
  visited: HashSet<String>,
  bundle: Bundle,
}

impl<'a, D: Drive + ?Sized> Traversal<'a, D> {
  /// Create a traversal over `drive` using `resolver` for every reference.
  pub fn new(
    drive: &'a D,
    resolver: Resolver<'a>,
    native_extensions: &'a [String],
    optional: OptionalPolicy,
  ) -> Self {
    Self {
      drive,
      resolver,
      native_extensions,
      optional,
      visited: HashSet::new(),
      bundle: Bundle::new(),
    }
  }

  /// Walk from `entry` and return the packed bundle.
  ///
  /// An entry resolving to different files per host has every one of them packed; the first
  /// host's file becomes `main` and the full resolution is recorded under the `/` parent.
  pub fn pack(mut self, entry: &str) -> PackResult<Bundle> {
    let missing = || PackError::MissingEntry {
      path: entry.to_string(),
    };
    let resolution = self
      .resolver
      .resolve(self.drive, &Reference::import(entry), "/")
      .ok_or_else(missing)?;
    let entries: Vec<String> = resolution.files().into_iter().map(str::to_string).collect();
    let main = entries.first().cloned().ok_or_else(missing)?;

    log::debug!("packing from entry {main}");
    self.bundle.main = Some(main);
    if let Resolution::PerHost(_) = resolution {
      self.bundle.resolve("/", entry, resolution.to_value());
    }
    for file in &entries {
      self.visit(file)?;
    }
    Ok(self.bundle)
  }

  fn visit(&mut self, path: &str) -> PackResult<()> {
    if !self.visited.insert(path.to_string()) {
      return Ok(());
    }

    let content = self.drive.get(path)?;
    let references = if lexer::is_scannable(path) {
      lexer::scan(&String::from_utf8_lossy(&content))
    } else {
      Vec::new()
    };
    log::trace!("visited {path} ({} references)", references.len());
    self.bundle.write(path, content);

    for reference in references {
      self.follow(&reference, path)?;
    }
    Ok(())
  }

  fn follow(&mut self, reference: &Reference, parent: &str) -> PackResult<()> {
    let Some(resolution) = self.resolver.resolve(self.drive, reference, parent) else {
      return self.unresolved(reference, parent);
    };

    let specifier = match reference.kind {
      ReferenceKind::Addon(_) if reference.specifier.is_empty() => ".",
      _ => reference.specifier.as_str(),
    };
    self.bundle.resolve(parent, specifier, resolution.to_value());

    let files: Vec<String> = match &resolution {
      Resolution::Builtin(_) => return Ok(()),
      resolution => resolution.files().into_iter().map(str::to_string).collect(),
    };

    for file in files {
      match reference.kind {
        ReferenceKind::Addon(_) => self.include_addon(&file)?,
        ReferenceKind::Asset(_) => self.include_asset(&file)?,
        ReferenceKind::Module(_) => {
          self.visit(&file)?;
          if has_extension_in(&file, self.native_extensions) {
            self.bundle.add_addon(&file);
          }
        }
      }
    }
    Ok(())
  }

  fn include_addon(&mut self, path: &str) -> PackResult<()> {
    self.bundle.add_addon(path);
    self.include_file(path)
  }

  fn include_asset(&mut self, path: &str) -> PackResult<()> {
    self.bundle.add_asset(path);
    self.include_file(path)
  }

  fn include_file(&mut self, path: &str) -> PackResult<()> {
    if self.visited.insert(path.to_string()) {
      let content = self.drive.get(path)?;
      self.bundle.write(path, content);
    }
    Ok(())
  }

  fn unresolved(&self, reference: &Reference, parent: &str) -> PackResult<()> {
    if reference.lazy && self.optional == OptionalPolicy::Ignore {
      log::debug!(
        "leaving optional reference '{}' from {parent} unresolved",
        reference.specifier
      );
      return Ok(());
    }
    Err(PackError::MissingDependency {
      specifier: reference.specifier.clone(),
      parent: parent.to_string(),
    })
  }
}
