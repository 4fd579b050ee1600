//! Helpers for manipulating the `/`-separated keys used by drives and bundles.
//!
//! The responsibilities are split so that joining specifiers, classifying extensions, and
//! deriving canonical prebuild locations can be tested independently. Resolution, packing and
//! rehashing all share the same helpers so a key means the same thing at every stage.

mod extension;
mod join;
mod prebuild;

pub use extension::{extension, has_extension_in};
pub use join::{basename, dirname, join_specifier, prefixed_key};
pub use prebuild::PrebuildPath;
