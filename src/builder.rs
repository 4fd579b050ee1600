//! Pack orchestrator: walk the graph, then rehash addons and expose assets.

use indexmap::IndexMap;

use crate::bundle::{Bundle, UnpackOptions, unpack};
use crate::drive::Drive;
use crate::error::PackResult;
use crate::options::PackOptions;
use crate::rehash::{Extracted, Rehasher};
use crate::resolve::Resolver;
use crate::traverse::Traversal;

/// Everything a pack run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutput {
  /// Encoded bundle.
  pub bundle: Vec<u8>,
  /// Content-addressed prebuild path -> binary, in the order they were met.
  pub prebuilds: IndexMap<String, Vec<u8>>,
  /// Prefixed asset path -> content, in the order they were met.
  pub assets: IndexMap<String, Vec<u8>>,
}

/// High-level helper packing one drive for a set of target hosts.
pub struct PackBuilder<'a, D: ?Sized> {
  drive: &'a D,
  options: PackOptions,
}

impl<'a, D: Drive + ?Sized> PackBuilder<'a, D> {
  /// Create a builder for the provided drive and options.
  pub fn new(drive: &'a D, options: PackOptions) -> Self {
    Self { drive, options }
  }

  /// Options the builder was created with.
  pub fn options(&self) -> &PackOptions {
    &self.options
  }

  /// Walk the module graph and return the raw bundle, before any rehashing.
  pub fn pack_raw(&self) -> PackResult<Bundle> {
    self.options.validate()?;
    let config = self.options.resolve_config();
    let resolver = Resolver::new(&config, &self.options);
    Traversal::new(
      self.drive,
      resolver,
      &config.native_extensions,
      self.options.optional,
    )
    .pack(&self.options.entry)
  }

  /// Pack, content-address native binaries, expose assets, and encode the result.
  pub fn build(&self) -> PackResult<PackOutput> {
    let (bundle, extracted) = self.build_bundle()?;
    Ok(PackOutput {
      bundle: bundle.to_bytes()?,
      prebuilds: extracted.prebuilds,
      assets: extracted.assets,
    })
  }

  /// Like [`PackBuilder::build`] but returns the decoded bundle.
  pub fn build_bundle(&self) -> PackResult<(Bundle, Extracted)> {
    let raw = self.pack_raw()?;
    let declared_assets = raw.assets.clone();
    let mut extracted = Extracted::default();

    let mut rehasher = Rehasher::new(
      self.drive,
      &declared_assets,
      &self.options.extensions,
      &mut extracted,
    )
    .assets_prefix(&self.options.assets_prefix)
    .prebuild_prefix(&self.options.prebuild_prefix);

    let options = UnpackOptions {
      addons: true,
      assets: true,
      files: false,
    };
    let bundle = unpack(raw, options, &mut rehasher)?;

    log::debug!(
      "packed {} files, {} prebuilds, {} assets",
      bundle.files.len(),
      extracted.prebuilds.len(),
      extracted.assets.len()
    );
    Ok((bundle, extracted))
  }
}

/// Pack `drive` with `options`.
pub fn pack<D: Drive + ?Sized>(drive: &D, options: PackOptions) -> PackResult<PackOutput> {
  PackBuilder::new(drive, options).build()
}
