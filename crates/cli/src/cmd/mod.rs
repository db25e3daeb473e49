mod build;
mod install;
mod run;

pub use build::cmd_build;
pub use install::cmd_install;
pub use run::cmd_run;

use anyhow::{Context, Result};

use luapack_lib::build::{BuildOptions, BuildStats, Builder};
use luapack_lib::config::Config;
use luapack_lib::translate::ExternalTranslator;

use crate::output::print_stat;

/// A builder using the configured compiler, stamped with this executable.
fn builder(config: &Config) -> Result<Builder<ExternalTranslator>> {
  let translator = config.translator()?;
  let options =
    BuildOptions::for_current_exe(config.interpreter.as_str()).context("Failed to locate the luapack executable")?;
  Ok(Builder::new(config.locator(), translator, options))
}

fn print_stats(stats: &BuildStats) {
  print_stat("Packages translated", &stats.translated.len().to_string());
  print_stat("Packages cached", &stats.cached.len().to_string());
}
