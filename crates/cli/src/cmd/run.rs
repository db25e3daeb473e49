//! Implementation of the `luapack run` command.

use std::path::Path;
use std::process::{ExitCode, ExitStatus};

use anyhow::{Context, Result};

use luapack_lib::config::Config;
use luapack_lib::run::{run_embedded, run_external};

/// Compile a single source file without writing it, then run the bundle.
///
/// The interpreter's output passes through untouched and its exit code
/// becomes ours.
pub fn cmd_run(file: &Path, embedded: bool, config: &Config) -> Result<ExitCode> {
  let out_dir = std::env::current_dir().context("Failed to determine the current directory")?;

  let mut builder = super::builder(config)?;
  let package = builder
    .build_file(file, &out_dir, false)
    .with_context(|| format!("Failed to build {}", file.display()))?;
  let bundle = package.payload.as_deref().context("Build produced no bundle")?;

  if embedded {
    let chunk = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    run_embedded(bundle, &chunk)?;
    return Ok(ExitCode::SUCCESS);
  }

  let status = run_external(&config.interpreter, &["-".to_string()], bundle)?;
  Ok(exit_code(status))
}

fn exit_code(status: ExitStatus) -> ExitCode {
  match status.code() {
    Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
    None => ExitCode::FAILURE,
  }
}
