//! Settings taken from the environment.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `LUAPACK_PATH` | search roots, OS path-list syntax | `<data dir>/luapack` |
//! | `LUAPACK_COMPILER` | compiler program used to translate packages | none |
//! | `LUAPACK_INTERPRETER` | Lua interpreter for shebangs and `run` | `lua` |
//!
//! Command-line flags override the environment through the `with_*` methods.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::DEFAULT_INTERPRETER;
use crate::package::Locator;
use crate::platform::paths::search_roots;
use crate::translate::ExternalTranslator;

pub const COMPILER_ENV: &str = "LUAPACK_COMPILER";
pub const INTERPRETER_ENV: &str = "LUAPACK_INTERPRETER";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("no compiler configured: set LUAPACK_COMPILER or pass --compiler")]
  MissingCompiler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub roots: Vec<PathBuf>,
  pub compiler: Option<PathBuf>,
  pub interpreter: String,
}

impl Config {
  pub fn from_env() -> Self {
    let compiler = std::env::var_os(COMPILER_ENV)
      .filter(|v| !v.is_empty())
      .map(PathBuf::from);
    let interpreter = std::env::var(INTERPRETER_ENV)
      .ok()
      .filter(|v| !v.is_empty())
      .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string());

    Self {
      roots: search_roots(),
      compiler,
      interpreter,
    }
  }

  pub fn with_compiler(mut self, compiler: Option<PathBuf>) -> Self {
    if compiler.is_some() {
      self.compiler = compiler;
    }
    self
  }

  pub fn with_interpreter(mut self, interpreter: Option<String>) -> Self {
    if let Some(interpreter) = interpreter {
      self.interpreter = interpreter;
    }
    self
  }

  pub fn compiler(&self) -> Result<&Path, ConfigError> {
    self.compiler.as_deref().ok_or(ConfigError::MissingCompiler)
  }

  pub fn locator(&self) -> Locator {
    Locator::new(self.roots.clone())
  }

  pub fn translator(&self) -> Result<ExternalTranslator, ConfigError> {
    Ok(ExternalTranslator::new(self.compiler()?))
  }
}
