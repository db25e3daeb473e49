//! Implementation of the `luapack build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use luapack_lib::config::Config;

use crate::output::{format_duration, print_success};

/// Compile a single source file into `<stem>.lua` in the current directory.
pub fn cmd_build(file: &Path, config: &Config) -> Result<()> {
  let start = Instant::now();
  let out_dir = std::env::current_dir().context("Failed to determine the current directory")?;

  let mut builder = super::builder(config)?;
  let package = builder
    .build_file(file, &out_dir, true)
    .with_context(|| format!("Failed to build {}", file.display()))?;

  print_success(&format!(
    "Built {} in {}",
    package.artifact.display(),
    format_duration(start.elapsed())
  ));
  super::print_stats(builder.stats());
  Ok(())
}
