//! Package descriptors and how they are found on disk.
//!
//! # Submodules
//!
//! - [`header`] - Imports-only scanning of source file headers
//! - [`locate`] - Mapping identities to package directories under search roots

pub mod header;
pub mod locate;

use std::path::PathBuf;
use std::time::SystemTime;

use crate::consts::{MAIN_PACKAGE, UNSAFE_PACKAGE};

pub use locate::{LocateError, Locator};

/// One package as seen by the build.
///
/// Created by the [`Locator`] with its sources and imports; the builder fills
/// in `freshness` and `payload`. A built package is never modified again.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
  /// Unique import path, or `main` for a single-file build.
  pub identity: String,
  /// Declared package name.
  pub name: String,
  pub dir: PathBuf,
  /// Source file names relative to `dir`.
  pub files: Vec<String>,
  /// Imported identities in first-seen order.
  pub imports: Vec<String>,
  /// Where the build output is persisted.
  pub artifact: PathBuf,
  /// Newest modification time among the toolchain, imports and sources.
  pub freshness: Option<SystemTime>,
  /// Compiled output, once produced or loaded.
  pub payload: Option<Vec<u8>>,
}

impl Package {
  /// The built-in `unsafe` package, which has no sources and no artifact.
  pub fn unsafe_package() -> Self {
    Self {
      identity: UNSAFE_PACKAGE.to_string(),
      name: UNSAFE_PACKAGE.to_string(),
      dir: PathBuf::new(),
      files: Vec::new(),
      imports: Vec::new(),
      artifact: PathBuf::new(),
      freshness: None,
      payload: None,
    }
  }

  pub fn is_executable(&self) -> bool {
    self.name == MAIN_PACKAGE
  }

  pub fn is_unsafe(&self) -> bool {
    self.identity == UNSAFE_PACKAGE
  }
}
