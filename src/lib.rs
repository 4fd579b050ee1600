#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod bundle;
pub mod config;
pub mod drive;
pub mod error;
pub mod host;
pub mod lexer;
pub mod options;
pub mod paths;
pub mod reference;
pub mod rehash;
pub mod resolve;
pub mod traverse;

pub use builder::{PackBuilder, PackOutput, pack};
pub use bundle::Bundle;
pub use config::PackConfig;
#[cfg(not(target_arch = "wasm32"))]
pub use drive::LocalDrive;
pub use drive::{Drive, MemoryDrive};
pub use error::{DriveError, PackError, PackResult};
pub use host::TargetHost;
pub use options::{OptionalPolicy, PackOptions, ResolveConfig};
pub use reference::{Reference, ReferenceKind, Site};
pub use rehash::{Extracted, Rehasher};
pub use resolve::{Resolution, Resolver};
