//! On-disk artifact format.
//!
//! A library artifact is the encoded type interface, a sentinel line `$$`, and
//! then the raw compiled payload:
//!
//! ```text
//! {"path":"shapes","name":"shapes",...}
//! $$
//! <payload bytes>
//! ```
//!
//! An executable artifact is an interpreter line followed by the assembled
//! bundle. Executables are never imported, so they carry no interface.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::interface::TypeInterface;

/// The line separating interface metadata from the payload.
pub const SENTINEL: &[u8] = b"$$\n";

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("failed to read artifact: {0}")]
  Io(#[from] io::Error),

  #[error("failed to read artifact {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write artifact {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("malformed type interface in {}: {source}", path.display())]
  Interface {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// What to put into an artifact.
#[derive(Debug, Clone, Copy)]
pub enum Contents<'a> {
  Library { interface: &'a [u8], payload: &'a [u8] },
  Executable { interpreter: &'a str, bundle: &'a [u8] },
}

impl Contents<'_> {
  pub fn is_executable(&self) -> bool {
    matches!(self, Contents::Executable { .. })
  }
}

/// A library artifact split at its sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoded {
  /// Everything before the sentinel line. Holds the whole stream when no
  /// sentinel was found.
  pub metadata: Vec<u8>,
  /// Everything after the sentinel line. Empty for metadata-only artifacts.
  pub payload: Vec<u8>,
}

pub fn write<W: Write>(out: &mut W, contents: &Contents<'_>) -> io::Result<()> {
  match contents {
    Contents::Library { interface, payload } => {
      out.write_all(interface)?;
      if !interface.is_empty() && !interface.ends_with(b"\n") {
        out.write_all(b"\n")?;
      }
      out.write_all(SENTINEL)?;
      out.write_all(payload)?;
    }
    Contents::Executable { interpreter, bundle } => {
      writeln!(out, "#!/usr/bin/env {}", interpreter)?;
      out.write_all(bundle)?;
    }
  }
  out.flush()
}

pub fn read<R: Read>(mut input: R) -> Result<Decoded, ArtifactError> {
  let mut bytes = Vec::new();
  input.read_to_end(&mut bytes)?;

  match find_sentinel(&bytes) {
    Some(pos) => {
      let payload = bytes.split_off(pos + SENTINEL.len());
      bytes.truncate(pos);
      Ok(Decoded {
        metadata: bytes,
        payload,
      })
    }
    None => {
      debug!(len = bytes.len(), "no sentinel in artifact, treating it as metadata only");
      Ok(Decoded {
        metadata: bytes,
        payload: Vec::new(),
      })
    }
  }
}

/// Offset of the first sentinel that starts a line.
///
/// A `$$` run inside the metadata that does not begin a line is skipped.
pub fn find_sentinel(bytes: &[u8]) -> Option<usize> {
  let mut pos = 0;
  while pos + SENTINEL.len() <= bytes.len() {
    let window = &bytes[pos..pos + SENTINEL.len()];
    let at_line_start = pos == 0 || bytes[pos - 1] == b'\n';
    if window == SENTINEL && at_line_start {
      return Some(pos);
    }
    pos += 1;
  }
  None
}

/// Read and split the artifact at `path`.
pub fn read_file(path: &Path) -> Result<Decoded, ArtifactError> {
  let read_err = |source: io::Error| ArtifactError::Read {
    path: path.to_path_buf(),
    source,
  };

  let file = fs::File::open(path).map_err(read_err)?;
  read(io::BufReader::new(file)).map_err(|e| match e {
    ArtifactError::Io(source) => read_err(source),
    other => other,
  })
}

/// Read a library artifact and decode its type interface.
pub fn read_library(path: &Path) -> Result<(TypeInterface, Vec<u8>), ArtifactError> {
  let decoded = read_file(path)?;
  let interface = TypeInterface::decode(&decoded.metadata).map_err(|source| ArtifactError::Interface {
    path: path.to_path_buf(),
    source,
  })?;
  Ok((interface, decoded.payload))
}

/// Atomically write an artifact.
///
/// The contents go to a temporary file next to `path` which is renamed over
/// `path` once complete, so readers never observe a partial artifact.
/// Executables are made executable.
pub fn write_file(path: &Path, contents: &Contents<'_>) -> Result<(), ArtifactError> {
  let write_err = |source: io::Error| ArtifactError::Write {
    path: path.to_path_buf(),
    source,
  };

  let parent = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
    _ => PathBuf::from("."),
  };
  fs::create_dir_all(&parent).map_err(write_err)?;

  let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
  {
    let mut out = io::BufWriter::new(tmp.as_file_mut());
    write(&mut out, contents).map_err(write_err)?;
  }
  set_mode(tmp.as_file(), contents.is_executable()).map_err(write_err)?;
  tmp.persist(path).map_err(|e| write_err(e.error))?;

  debug!(path = ?path, executable = contents.is_executable(), "artifact written");
  Ok(())
}

#[cfg(unix)]
fn set_mode(file: &fs::File, executable: bool) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let mode = if executable { 0o755 } else { 0o644 };
  file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &fs::File, _executable: bool) -> io::Result<()> {
  Ok(())
}
