//! Finding packages under the search roots.
//!
//! Every search root follows the same layout:
//!
//! ```text
//! <root>/src/<identity>/*.src     sources
//! <root>/pkg/<identity>.lpkg      build artifacts
//! <root>/bin/<name>.lua           installed executables
//! ```
//!
//! The first root containing `src/<identity>` wins.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::Package;
use super::header::{self, HeaderError};
use crate::consts::{ARTIFACT_EXTENSION, MAIN_PACKAGE, SCRIPT_EXTENSION, SOURCE_EXTENSION, TEST_FILE_SUFFIX};

#[derive(Debug, Error)]
pub enum LocateError {
  #[error("invalid import path '{identity}': {reason}")]
  InvalidIdentity { identity: String, reason: String },

  #[error("cannot find package '{identity}' in any of: {}", display_roots(roots))]
  NotFound { identity: String, roots: Vec<PathBuf> },

  #[error("no source files in {}", dir.display())]
  NoSources { dir: PathBuf },

  #[error("found packages {first} ({first_file}) and {second} ({second_file}) in {}", dir.display())]
  MultiplePackages {
    dir: PathBuf,
    first: String,
    first_file: String,
    second: String,
    second_file: String,
  },

  #[error("{}: {source}", path.display())]
  Header {
    path: PathBuf,
    #[source]
    source: HeaderError,
  },

  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to list {}: {source}", dir.display())]
  List {
    dir: PathBuf,
    #[source]
    source: walkdir::Error,
  },
}

fn display_roots(roots: &[PathBuf]) -> String {
  roots.iter().map(|r| r.display().to_string()).collect::<Vec<_>>().join(", ")
}

/// Resolves identities against an ordered list of search roots.
#[derive(Debug, Clone)]
pub struct Locator {
  roots: Vec<PathBuf>,
}

impl Locator {
  pub fn new(roots: Vec<PathBuf>) -> Self {
    Self { roots }
  }

  pub fn roots(&self) -> &[PathBuf] {
    &self.roots
  }

  /// Locate an importable package. Its artifact lives under `<root>/pkg`.
  pub fn find(&self, identity: &str) -> Result<Package, LocateError> {
    let (root, dir) = self.lookup(identity)?;
    let artifact = root.join("pkg").join(format!("{}.{}", identity, ARTIFACT_EXTENSION));
    load(identity, dir, artifact)
  }

  /// Locate a package for installation. Its artifact lives under `<root>/bin`.
  pub fn find_installable(&self, identity: &str) -> Result<Package, LocateError> {
    let (root, dir) = self.lookup(identity)?;
    let base = identity.rsplit('/').next().unwrap_or(identity);
    let artifact = root.join("bin").join(format!("{}.{}", base, SCRIPT_EXTENSION));
    load(identity, dir, artifact)
  }

  /// Build the implicit `main` package for a single source file.
  ///
  /// The package is executable whatever its package clause says, and its
  /// artifact is `<out_dir>/<file stem>.lua`.
  pub fn single_file(&self, file: &Path, out_dir: &Path) -> Result<Package, LocateError> {
    let canonical = dunce::canonicalize(file).map_err(|source| LocateError::Read {
      path: file.to_path_buf(),
      source,
    })?;
    let header = scan_file(&canonical)?;

    let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
    let basename = canonical
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    let stem = canonical
      .file_stem()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| MAIN_PACKAGE.to_string());

    debug!(file = ?canonical, imports = header.imports.len(), "single-file package");

    Ok(Package {
      identity: MAIN_PACKAGE.to_string(),
      name: MAIN_PACKAGE.to_string(),
      dir,
      files: vec![basename],
      imports: header.imports,
      artifact: out_dir.join(format!("{}.{}", stem, SCRIPT_EXTENSION)),
      freshness: None,
      payload: None,
    })
  }

  /// The root and source directory holding `identity`.
  fn lookup(&self, identity: &str) -> Result<(&Path, PathBuf), LocateError> {
    validate_identity(identity)?;

    for root in &self.roots {
      let dir = root.join("src").join(identity);
      trace!(dir = ?dir, "probing");
      if dir.is_dir() {
        return Ok((root.as_path(), dir));
      }
    }

    Err(LocateError::NotFound {
      identity: identity.to_string(),
      roots: self.roots.clone(),
    })
  }
}

fn validate_identity(identity: &str) -> Result<(), LocateError> {
  let invalid = |reason: &str| LocateError::InvalidIdentity {
    identity: identity.to_string(),
    reason: reason.to_string(),
  };

  if identity.is_empty() {
    return Err(invalid("empty"));
  }
  if identity.starts_with('/') || identity.contains('\\') {
    return Err(invalid("must be a relative slash-separated path"));
  }
  for segment in identity.split('/') {
    match segment {
      "" => return Err(invalid("empty path segment")),
      "." | ".." => return Err(invalid("relative imports are not supported")),
      _ => {}
    }
  }
  Ok(())
}

/// Read a package directory: its sources, package name and imports.
fn load(identity: &str, dir: PathBuf, artifact: PathBuf) -> Result<Package, LocateError> {
  let files = source_files(&dir)?;
  if files.is_empty() {
    return Err(LocateError::NoSources { dir });
  }

  let mut name: Option<(String, String)> = None;
  let mut imports: Vec<String> = Vec::new();

  for file in &files {
    let header = scan_file(&dir.join(file))?;

    match &name {
      None => name = Some((header.name.clone(), file.clone())),
      Some((first, first_file)) if *first != header.name => {
        return Err(LocateError::MultiplePackages {
          dir,
          first: first.clone(),
          first_file: first_file.clone(),
          second: header.name,
          second_file: file.clone(),
        });
      }
      Some(_) => {}
    }

    for import in header.imports {
      if !imports.contains(&import) {
        imports.push(import);
      }
    }
  }

  let name = name.map(|(n, _)| n).unwrap_or_default();
  debug!(identity, name = %name, files = files.len(), imports = imports.len(), "located package");

  Ok(Package {
    identity: identity.to_string(),
    name,
    dir,
    files,
    imports,
    artifact,
    freshness: None,
    payload: None,
  })
}

/// Compilable source file names directly inside `dir`, sorted.
fn source_files(dir: &Path) -> Result<Vec<String>, LocateError> {
  let mut files = Vec::new();

  for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|source| LocateError::List {
      dir: dir.to_path_buf(),
      source,
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let name = entry.file_name().to_string_lossy();
    let is_source = entry.path().extension().is_some_and(|ext| ext == SOURCE_EXTENSION);
    if !is_source || name.ends_with(TEST_FILE_SUFFIX) || name.starts_with('.') || name.starts_with('_') {
      continue;
    }
    files.push(name.into_owned());
  }

  Ok(files)
}

fn scan_file(path: &Path) -> Result<header::Header, LocateError> {
  let source = fs::read_to_string(path).map_err(|source| LocateError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  header::scan(&source).map_err(|source| LocateError::Header {
    path: path.to_path_buf(),
    source,
  })
}
