//! References discovered while walking the module graph.

/// Syntax a reference was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
  /// `require(...)` and friends.
  Require,
  /// `import` statements, `import()` and `import.meta` helpers.
  Import,
}

/// What a reference points at, together with the call site where that matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
  /// A script or data module.
  Module(Site),
  /// A native addon, located through shipped prebuilds.
  Addon(Site),
  /// An opaque file exposed to the application by path.
  Asset(Site),
}

impl ReferenceKind {
  /// The call site the reference was written at.
  pub fn site(self) -> Site {
    match self {
      Self::Module(site) | Self::Addon(site) | Self::Asset(site) => site,
    }
  }
}

/// A request to locate a file on behalf of a parent module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
  /// Specifier as written; empty means the parent's own package.
  pub specifier: String,
  /// Reference classification.
  pub kind: ReferenceKind,
  /// Lazily evaluated references (`import()`) may be absent at runtime.
  pub lazy: bool,
}

impl Reference {
  /// Eagerly evaluated `require` reference.
  pub fn require(specifier: impl Into<String>) -> Self {
    Self::new(specifier, ReferenceKind::Module(Site::Require))
  }

  /// Eagerly evaluated `import` reference.
  pub fn import(specifier: impl Into<String>) -> Self {
    Self::new(specifier, ReferenceKind::Module(Site::Import))
  }

  /// Native addon reference from a `require` site.
  pub fn addon(specifier: impl Into<String>) -> Self {
    Self::new(specifier, ReferenceKind::Addon(Site::Require))
  }

  /// Asset reference from a `require` site.
  pub fn asset(specifier: impl Into<String>) -> Self {
    Self::new(specifier, ReferenceKind::Asset(Site::Require))
  }

  /// Build a reference of the given kind.
  pub fn new(specifier: impl Into<String>, kind: ReferenceKind) -> Self {
    Self {
      specifier: specifier.into(),
      kind,
      lazy: false,
    }
  }

  /// Mark the reference as lazily evaluated.
  pub fn lazy(mut self) -> Self {
    self.lazy = true;
    self
  }
}
