//! Content addressing of native binaries and exposure of assets after packing.

use indexmap::IndexMap;

use crate::bundle::Rewrite;
use crate::drive::Drive;
use crate::error::PackResult;
use crate::paths::{PrebuildPath, extension, prefixed_key};

/// Files pulled out of a bundle during the rehash pass, in the order they were met.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
  /// Canonical prebuild path -> binary content.
  pub prebuilds: IndexMap<String, Vec<u8>>,
  /// Prefixed logical asset path -> content.
  pub assets: IndexMap<String, Vec<u8>>,
}

/// Lowercase hex BLAKE3 digest of `content`.
pub fn content_digest(content: &[u8]) -> String {
  blake3::hash(content).to_hex().to_string()
}

/// Rewrite strategy run over the packed bundle.
///
/// Native binaries are renamed to `<prebuild prefix>/prebuilds/<host>/<digest><ext>` and
/// recorded in [`Extracted::prebuilds`] under that same name; byte-identical binaries
/// therefore share one entry. Declared assets keep their path and are recorded under the
/// asset prefix. Everything else passes through.
pub struct Rehasher<'a, D: ?Sized> {
  drive: &'a D,
  declared_assets: &'a [String],
  native_extensions: &'a [String],
  assets_prefix: &'a str,
  prebuild_prefix: &'a str,
  extracted: &'a mut Extracted,
}

impl<'a, D: Drive + ?Sized> Rehasher<'a, D> {
  /// Create a rehasher accumulating into `extracted`.
  pub fn new(
    drive: &'a D,
    declared_assets: &'a [String],
    native_extensions: &'a [String],
    extracted: &'a mut Extracted,
  ) -> Self {
    Self {
      drive,
      declared_assets,
      native_extensions,
      assets_prefix: "",
      prebuild_prefix: "",
      extracted,
    }
  }

  /// Prefix applied to asset map keys.
  pub fn assets_prefix(mut self, prefix: &'a str) -> Self {
    self.assets_prefix = prefix;
    self
  }

  /// Prefix applied to rewritten prebuild paths.
  pub fn prebuild_prefix(mut self, prefix: &'a str) -> Self {
    self.prebuild_prefix = prefix;
    self
  }

  fn rehash_prebuild(&mut self, key: &str) -> PackResult<String> {
    let content = self.drive.get(key)?;
    let digest = content_digest(&content);
    let canonical = PrebuildPath::parse(key).canonical(&digest);
    let rewritten = prefixed_key(self.prebuild_prefix, &canonical);

    log::debug!("prebuild {key} -> {rewritten}");
    self
      .extracted
      .prebuilds
      .entry(rewritten.clone())
      .or_insert(content);
    Ok(rewritten)
  }

  fn expose_asset(&mut self, key: &str) -> PackResult<String> {
    let content = self.drive.get(key)?;
    let exposed = prefixed_key(self.assets_prefix, key);
    log::debug!("asset {key} -> {exposed}");
    self.extracted.assets.insert(exposed, content);
    Ok(key.to_string())
  }
}

impl<D: Drive + ?Sized> Rewrite for Rehasher<'_, D> {
  fn rewrite(&mut self, key: &str) -> PackResult<String> {
    let Some(ext) = extension(key) else {
      return Ok(key.to_string());
    };

    if self.native_extensions.iter().any(|native| native == ext) {
      self.rehash_prebuild(key)
    } else if self.declared_assets.iter().any(|asset| asset == key) {
      self.expose_asset(key)
    } else {
      Ok(key.to_string())
    }
  }
}
