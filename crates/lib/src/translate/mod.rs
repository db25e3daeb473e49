//! The boundary to the per-package compiler.
//!
//! The build never parses or type-checks anything itself. It hands one
//! package's sources to a [`Translator`] together with the interfaces of
//! everything already built, and gets back Lua code and the package's own
//! interface, or a list of diagnostics.

mod external;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interface::{TypeInterface, TypeRegistry};

pub use external::ExternalTranslator;

/// One package handed to the translator.
#[derive(Debug, Clone, Copy)]
pub struct Unit<'a> {
  pub identity: &'a str,
  pub dir: &'a Path,
  /// Source file names relative to `dir`, in build order.
  pub files: &'a [String],
}

/// Successful translation of one package.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
  /// Compiled Lua code.
  pub payload: Vec<u8>,
  pub interface: TypeInterface,
}

/// A source-level problem reported by the translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
  /// Human readable location, e.g. `shapes.src:3:7`.
  pub position: String,
  pub message: String,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.position.is_empty() {
      write!(f, "{}", self.message)
    } else {
      write!(f, "{}: {}", self.position, self.message)
    }
  }
}

#[derive(Debug, Error)]
pub enum TranslateError {
  #[error("{}", format_diagnostics(.0))]
  Diagnostics(Vec<Diagnostic>),

  #[error("translating {identity} failed: {message}")]
  Failed { identity: String, message: String },

  #[error("failed to start compiler {}: {source}", program.display())]
  Spawn {
    program: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("compiler I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid compiler response for {identity}: {source}")]
  Protocol {
    identity: String,
    #[source]
    source: serde_json::Error,
  },
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
  diagnostics.iter().map(Diagnostic::to_string).collect::<Vec<_>>().join("\n")
}

/// Turns the sources of one package into Lua code and a type interface.
///
/// `registry` holds the interface of every package the unit imports. An
/// implementation may consult or extend it; the builder registers the
/// returned interface under the unit's identity either way.
pub trait Translator {
  fn translate(&mut self, unit: &Unit<'_>, registry: &mut TypeRegistry) -> Result<Translation, TranslateError>;
}

impl<T: Translator + ?Sized> Translator for Box<T> {
  fn translate(&mut self, unit: &Unit<'_>, registry: &mut TypeRegistry) -> Result<Translation, TranslateError> {
    (**self).translate(unit, registry)
  }
}
