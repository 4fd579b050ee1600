//! Ordered capability tags used to pick the most specific file variant for a host.

use crate::host::TargetHost;

/// Condition tags for one host, most specific reference kind first.
///
/// A chain for an addon built for `linux-x64` reads `[addon, node, bare, linux, x64]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionChain {
  host: TargetHost,
  tags: Vec<String>,
}

impl ConditionChain {
  /// Base chain for `host`: the configured conditions followed by the host components.
  pub fn base(conditions: &[String], host: &TargetHost) -> Self {
    let tags = conditions
      .iter()
      .cloned()
      .chain(host.components().map(str::to_string))
      .collect();
    Self {
      host: host.clone(),
      tags,
    }
  }

  /// Copy of the chain with `tag` placed in front.
  pub fn prefixed(&self, tag: &str) -> Self {
    let mut tags = Vec::with_capacity(self.tags.len() + 1);
    tags.push(tag.to_string());
    tags.extend(self.tags.iter().cloned());
    Self {
      host: self.host.clone(),
      tags,
    }
  }

  /// Host the chain was derived for.
  pub fn host(&self) -> &TargetHost {
    &self.host
  }

  /// Tags in priority order.
  pub fn tags(&self) -> &[String] {
    &self.tags
  }

  /// Whether a conditional key applies to this chain. `default` always applies.
  pub fn matches(&self, key: &str) -> bool {
    key == "default" || self.tags.iter().any(|tag| tag == key)
  }
}
