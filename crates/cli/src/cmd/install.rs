//! Implementation of the `luapack install` command.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use luapack_lib::config::Config;

use crate::output::{format_duration, print_success};

/// Compile a package by import path and write its artifact under its search root.
///
/// Programs land in `<root>/bin/<name>.lua`, libraries in `<root>/pkg`.
pub fn cmd_install(identity: &str, config: &Config) -> Result<()> {
  let start = Instant::now();
  let mut builder = super::builder(config)?;
  info!(identity, roots = ?config.roots, "install");

  let package = builder
    .install(identity)
    .with_context(|| format!("Failed to install {}", identity))?;

  print_success(&format!(
    "Installed {} to {} in {}",
    identity,
    package.artifact.display(),
    format_duration(start.elapsed())
  ));
  super::print_stats(builder.stats());
  Ok(())
}
