//! A translator that runs a compiler program once per package.
//!
//! The request is a single JSON document written to the compiler's stdin,
//! which is closed afterwards. The compiler answers on stdout with either
//! `{"payload": ..., "interface": ...}` or `{"diagnostics": [...]}`.

use std::collections::BTreeMap;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Diagnostic, TranslateError, Translation, Translator, Unit};
use crate::interface::{TypeInterface, TypeRegistry};

#[derive(Serialize)]
struct Request<'a> {
  identity: &'a str,
  dir: &'a Path,
  files: &'a [String],
  interfaces: BTreeMap<&'a str, &'a TypeInterface>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Response {
  Success { payload: String, interface: TypeInterface },
  Failure { diagnostics: Vec<Diagnostic> },
}

#[derive(Debug, Clone)]
pub struct ExternalTranslator {
  program: PathBuf,
  args: Vec<String>,
}

impl ExternalTranslator {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  /// Arguments passed to the compiler. The request always goes to stdin.
  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args = args.into_iter().map(Into::into).collect();
    self
  }

  pub fn program(&self) -> &Path {
    &self.program
  }
}

impl Translator for ExternalTranslator {
  fn translate(&mut self, unit: &Unit<'_>, registry: &mut TypeRegistry) -> Result<Translation, TranslateError> {
    let request = serde_json::to_vec(&Request {
      identity: unit.identity,
      dir: unit.dir,
      files: unit.files,
      interfaces: registry.sorted(),
    })
    .map_err(|source| TranslateError::Protocol {
      identity: unit.identity.to_string(),
      source,
    })?;

    info!(identity = unit.identity, program = ?self.program, files = unit.files.len(), "invoking compiler");

    let mut child = Command::new(&self.program)
      .args(&self.args)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| TranslateError::Spawn {
        program: self.program.clone(),
        source,
      })?;

    // Feed stdin from its own thread while the output pipes drain.
    let stdin = child.stdin.take();
    let body = request.as_slice();
    let identity = unit.identity;
    let (output, written) = thread::scope(|s| {
      let writer = s.spawn(move || write_request(stdin, body, identity));
      let output = child.wait_with_output();
      let written = writer
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("request writer panicked")));
      (output, written)
    });
    written?;
    let output = output?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
      debug!(identity = unit.identity, stderr = %stderr, "compiler stderr");
    }

    let parsed: Result<Response, _> = serde_json::from_slice(&output.stdout);
    let failed = |message: String| TranslateError::Failed {
      identity: unit.identity.to_string(),
      message,
    };

    match parsed {
      Ok(Response::Failure { diagnostics }) if !diagnostics.is_empty() => {
        debug!(identity = unit.identity, count = diagnostics.len(), "compiler reported diagnostics");
        Err(TranslateError::Diagnostics(diagnostics))
      }
      Ok(Response::Failure { .. }) => Err(failed("compiler reported failure without diagnostics".to_string())),
      Ok(Response::Success { payload, interface }) if output.status.success() => Ok(Translation {
        payload: payload.into_bytes(),
        interface,
      }),
      Err(source) if output.status.success() => Err(TranslateError::Protocol {
        identity: unit.identity.to_string(),
        source,
      }),
      _ if stderr.is_empty() => Err(failed(format!("compiler exited with {}", output.status))),
      _ => Err(failed(stderr)),
    }
  }
}

fn write_request(stdin: Option<ChildStdin>, request: &[u8], identity: &str) -> io::Result<()> {
  let Some(mut stdin) = stdin else {
    return Ok(());
  };
  match stdin.write_all(request) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
      debug!(identity, "compiler closed stdin early");
      Ok(())
    }
    Err(e) => Err(e),
  }
}
