use std::path::PathBuf;

use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::consts::DEFAULT_INTERPRETER;
use crate::package::LocateError;
use crate::translate::{Diagnostic, TranslateError};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Locate(#[from] LocateError),

  #[error(transparent)]
  Translate(#[from] TranslateError),

  #[error(transparent)]
  Artifact(#[from] ArtifactError),

  #[error("failed to stat {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("import cycle not allowed: {chain}")]
  ImportCycle { chain: String },

  #[error("import \"{identity}\" is a program, not an importable package")]
  ImportCommand { identity: String },

  #[error("package {identity} failed to build earlier in this run")]
  PreviouslyFailed { identity: String },

  #[error("no type interface registered for {identity}")]
  MissingInterface { identity: String },

  #[error("package {identity} has no compiled payload")]
  MissingPayload { identity: String },

  #[error("failed to encode type interface of {identity}: {source}")]
  Encode {
    identity: String,
    #[source]
    source: serde_json::Error,
  },
}

impl BuildError {
  /// Source diagnostics, when the failure came from the translator rejecting code.
  pub fn diagnostics(&self) -> Option<&[Diagnostic]> {
    match self {
      BuildError::Translate(TranslateError::Diagnostics(list)) => Some(list),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
  /// File whose modification time every package's freshness starts from.
  /// Normally the running executable, so a new toolchain rebuilds everything.
  pub toolchain: PathBuf,
  /// Interpreter named in the shebang line of executable artifacts.
  pub interpreter: String,
}

impl BuildOptions {
  pub fn new(toolchain: impl Into<PathBuf>, interpreter: impl Into<String>) -> Self {
    Self {
      toolchain: toolchain.into(),
      interpreter: interpreter.into(),
    }
  }

  pub fn for_current_exe(interpreter: impl Into<String>) -> std::io::Result<Self> {
    Ok(Self::new(std::env::current_exe()?, interpreter))
  }
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self::new(PathBuf::new(), DEFAULT_INTERPRETER)
  }
}

/// What one build did, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
  pub translated: Vec<String>,
  pub cached: Vec<String>,
}
