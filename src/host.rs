//! Target host identifiers such as `linux-x64` or `darwin-arm64`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform/architecture identifier a bundle is built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHost(String);

impl TargetHost {
  /// Wrap a raw identifier. Validation happens in [`crate::PackOptions::validate`].
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// The identifier as written by the caller.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Dash-separated components, e.g. `["linux", "x64"]`.
  pub fn components(&self) -> impl Iterator<Item = &str> {
    self.0.split('-')
  }

  /// Whether the identifier can be used as a prebuild directory name.
  pub fn is_well_formed(&self) -> bool {
    !self.0.is_empty()
      && !self.0.contains('/')
      && self.components().all(|component| !component.is_empty())
  }
}

impl fmt::Display for TargetHost {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TargetHost {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl From<String> for TargetHost {
  fn from(value: String) -> Self {
    Self(value)
  }
}
