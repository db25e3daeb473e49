//! luapack - build driver for packages compiled to Lua.

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use luapack_lib::build::BuildError;
use luapack_lib::config::Config;

use crate::cmd::{cmd_build, cmd_install, cmd_run};
use crate::output::{print_diagnostics, print_error};

/// Build packages of `.src` sources into Lua scripts
#[derive(Parser)]
#[command(name = "luapack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Compiler program translating packages (overrides LUAPACK_COMPILER)
  #[arg(long, global = true, value_name = "PROGRAM")]
  compiler: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a source file into <name>.lua in the current directory
  Build {
    /// Source file to compile as the main package
    file: PathBuf,
  },

  /// Compile a package and install it under its search root
  Install {
    /// Import path of the package, e.g. tools/greet
    identity: String,
  },

  /// Compile a source file and run it without writing anything
  Run {
    /// Source file to compile as the main package
    file: PathBuf,

    /// Lua interpreter to run the bundle with (overrides LUAPACK_INTERPRETER)
    #[arg(long, value_name = "PROGRAM")]
    interpreter: Option<String>,

    /// Run inside the built-in Lua VM instead of an external interpreter
    #[arg(long, conflicts_with = "interpreter")]
    embedded: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let Some(command) = cli.command else {
    // Usage only; nothing is built.
    let _ = Cli::command().print_help();
    return ExitCode::SUCCESS;
  };

  let config = Config::from_env().with_compiler(cli.compiler);
  let result = match command {
    Commands::Build { file } => cmd_build(&file, &config).map(|()| ExitCode::SUCCESS),
    Commands::Install { identity } => cmd_install(&identity, &config).map(|()| ExitCode::SUCCESS),
    Commands::Run {
      file,
      interpreter,
      embedded,
    } => cmd_run(&file, embedded, &config.with_interpreter(interpreter)),
  };

  match result {
    Ok(code) => code,
    Err(err) => {
      match err.downcast_ref::<BuildError>().and_then(BuildError::diagnostics) {
        Some(diagnostics) => print_diagnostics(diagnostics),
        None => print_error(&format!("{:#}", err)),
      }
      ExitCode::FAILURE
    }
  }
}

fn init_logging(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::from_default_env()
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
