//! Running assembled bundles.
//!
//! By default a bundle is piped into an external Lua interpreter whose
//! output goes straight to ours. It can also run inside an embedded Lua 5.4
//! VM, which needs no interpreter on the `PATH`.

use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use mlua::Lua;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RunError {
  #[error("failed to start interpreter {}: {source}", program.display())]
  Spawn {
    program: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("interpreter I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("{message}")]
  Script { message: String },
}

/// Feed `code` to `program` on stdin and wait for it to exit.
///
/// The interpreter inherits stdout and stderr. If it exits before reading
/// all of its input, the rest is dropped.
pub fn run_external(program: &str, args: &[String], code: &[u8]) -> Result<ExitStatus, RunError> {
  info!(program, bytes = code.len(), "starting interpreter");

  let mut child = Command::new(program)
    .args(args)
    .stdin(Stdio::piped())
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .spawn()
    .map_err(|source| RunError::Spawn {
      program: PathBuf::from(program),
      source,
    })?;

  if let Some(mut stdin) = child.stdin.take() {
    match stdin.write_all(code) {
      Ok(()) => {}
      Err(e) if e.kind() == ErrorKind::BrokenPipe => {
        debug!(program, "interpreter stopped reading its input");
      }
      Err(e) => return Err(e.into()),
    }
  }

  let status = child.wait()?;
  debug!(program, status = %status, "interpreter exited");
  Ok(status)
}

/// Execute `code` in a fresh embedded Lua state.
pub fn run_embedded(code: &[u8], chunk_name: &str) -> Result<(), RunError> {
  info!(chunk = chunk_name, bytes = code.len(), "running embedded");

  let lua = Lua::new();
  lua
    .load(strip_shebang(code))
    .set_name(format!("={}", chunk_name))
    .exec()
    .map_err(|e| RunError::Script { message: e.to_string() })
}

/// `code` without a leading `#!` line, which only the standalone interpreter skips.
fn strip_shebang(code: &[u8]) -> &[u8] {
  if !code.starts_with(b"#") {
    return code;
  }
  match code.iter().position(|&b| b == b'\n') {
    Some(pos) => &code[pos..],
    None => &[],
  }
}
