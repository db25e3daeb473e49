//! Incremental package builds.
//!
//! A [`Builder`] walks the import graph from an entry package, reusing any
//! artifact newer than everything it was derived from and translating the
//! rest. Executable packages are then bundled with all of their dependencies
//! into one Lua script.
//!
//! # Freshness
//!
//! A package's freshness is the newest modification time among the toolchain
//! file, the freshness of every import, and its own source files. Its
//! artifact is reused only when strictly newer than that.
//!
//! # Submodules
//!
//! - [`bundle`] - Inlining dependencies into an executable script

pub mod bundle;
mod types;

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::rc::Rc;
use std::time::SystemTime;

use tracing::{debug, info, trace};

use crate::artifact::{self, Contents};
use crate::consts::UNSAFE_PACKAGE;
use crate::interface::{TypeInterface, TypeRegistry};
use crate::package::{Locator, Package};
use crate::translate::{Translation, Translator, Unit};

pub use types::*;

enum Slot {
  Building,
  Ready(Rc<Package>),
  Failed,
}

/// One build run: the package cache, the type registry and the translator.
///
/// Every identity is built at most once per `Builder`. Failures are
/// remembered too, so a second request for a failed package fails fast.
pub struct Builder<T> {
  locator: Locator,
  translator: T,
  options: BuildOptions,
  registry: TypeRegistry,
  packages: HashMap<String, Slot>,
  /// Identities currently being built, outermost first.
  stack: Vec<String>,
  stats: BuildStats,
}

impl<T: Translator> Builder<T> {
  pub fn new(locator: Locator, translator: T, options: BuildOptions) -> Self {
    Self {
      locator,
      translator,
      options,
      registry: TypeRegistry::new(),
      packages: HashMap::new(),
      stack: Vec::new(),
      stats: BuildStats::default(),
    }
  }

  pub fn registry(&self) -> &TypeRegistry {
    &self.registry
  }

  pub fn stats(&self) -> &BuildStats {
    &self.stats
  }

  pub fn translator(&self) -> &T {
    &self.translator
  }

  pub fn locator(&self) -> &Locator {
    &self.locator
  }

  pub fn options(&self) -> &BuildOptions {
    &self.options
  }

  /// A package that finished building in this run.
  pub fn package(&self, identity: &str) -> Option<Rc<Package>> {
    match self.packages.get(identity) {
      Some(Slot::Ready(pkg)) => Some(Rc::clone(pkg)),
      _ => None,
    }
  }

  /// Build a single source file as the executable `main` package.
  ///
  /// The script is written to `<out_dir>/<file stem>.lua` when `persist` is
  /// set; otherwise it is only kept in memory, for running it right away.
  pub fn build_file(&mut self, file: &Path, out_dir: &Path, persist: bool) -> Result<Rc<Package>, BuildError> {
    let package = self.locator.single_file(file, out_dir)?;
    if let Some(done) = self.cached(&package.identity) {
      return done;
    }
    self.resolve(package, persist)
  }

  /// Build a package by identity and persist it.
  ///
  /// Programs are written to `<root>/bin`, libraries to their usual
  /// artifact path under `<root>/pkg`.
  pub fn install(&mut self, identity: &str) -> Result<Rc<Package>, BuildError> {
    if let Some(done) = self.cached(identity) {
      return done;
    }

    let package = self.locator.find_installable(identity)?;
    let package = if package.is_executable() {
      package
    } else {
      self.locator.find(identity)?
    };
    info!(identity, artifact = ?package.artifact, "installing");
    self.resolve(package, true)
  }

  /// Resolve an import, building it if this run has not seen it yet.
  ///
  /// `src_dir` is the directory of the importing package. Imports are always
  /// resolved against the search roots.
  pub fn import(&mut self, identity: &str, src_dir: &Path, persist: bool) -> Result<Rc<Package>, BuildError> {
    if let Some(done) = self.cached(identity) {
      return done;
    }
    trace!(identity, importer = ?src_dir, "resolving import");

    let package = if identity == UNSAFE_PACKAGE {
      Package::unsafe_package()
    } else {
      match self.locator.find(identity) {
        Ok(pkg) => pkg,
        Err(e) => {
          self.packages.insert(identity.to_string(), Slot::Failed);
          return Err(e.into());
        }
      }
    };

    if package.is_executable() {
      self.packages.insert(identity.to_string(), Slot::Failed);
      return Err(BuildError::ImportCommand {
        identity: identity.to_string(),
      });
    }

    self.resolve(package, persist)
  }

  /// Bring one package up to date: compute its freshness, then either load
  /// its artifact or translate it and, for programs, bundle it.
  ///
  /// With `persist` unset the artifact is neither consulted nor written.
  pub fn build_package(&mut self, package: &mut Package, persist: bool) -> Result<(), BuildError> {
    if package.is_unsafe() {
      debug!("registering built-in unsafe interface");
      self.registry.insert(UNSAFE_PACKAGE, TypeInterface::unsafe_package());
      package.freshness = Some(SystemTime::UNIX_EPOCH);
      return Ok(());
    }

    let freshness = self.freshness(package)?;
    package.freshness = Some(freshness);

    if persist && is_newer(&package.artifact, freshness)? {
      if package.is_executable() {
        debug!(identity = %package.identity, artifact = ?package.artifact, "program is up to date");
      } else {
        let (interface, payload) = artifact::read_library(&package.artifact)?;
        debug!(identity = %package.identity, artifact = ?package.artifact, "loaded cached artifact");
        self.registry.insert(&package.identity, interface);
        package.payload = Some(payload);
      }
      self.stats.cached.push(package.identity.clone());
      return Ok(());
    }
    debug!(identity = %package.identity, persist, "artifact is stale or not wanted");

    info!(identity = %package.identity, files = package.files.len(), "translating");
    let Translation { payload, interface } = self.translator.translate(
      &Unit {
        identity: &package.identity,
        dir: &package.dir,
        files: &package.files,
      },
      &mut self.registry,
    )?;

    let encoded = if package.is_executable() {
      None
    } else {
      Some(interface.encode().map_err(|source| BuildError::Encode {
        identity: package.identity.clone(),
        source,
      })?)
    };
    debug!(identity = %package.identity, exports = interface.exported_names().len(), "registered interface");
    self.registry.insert(&package.identity, interface);

    let payload = if package.is_executable() {
      self.assemble_bundle(package, &payload)?
    } else {
      payload
    };

    if persist {
      let contents = match &encoded {
        Some(interface) => Contents::Library {
          interface: interface.as_slice(),
          payload: &payload,
        },
        None => Contents::Executable {
          interpreter: &self.options.interpreter,
          bundle: &payload,
        },
      };
      info!(identity = %package.identity, artifact = ?package.artifact, "writing artifact");
      artifact::write_file(&package.artifact, &contents)?;
    }

    package.payload = Some(payload);
    self.stats.translated.push(package.identity.clone());
    Ok(())
  }

  fn freshness(&mut self, package: &Package) -> Result<SystemTime, BuildError> {
    let mut freshness = modified(&self.options.toolchain)?;

    for identity in &package.imports {
      let dep = self.import(identity, &package.dir, true)?;
      if let Some(t) = dep.freshness {
        freshness = freshness.max(t);
      }
    }

    for file in &package.files {
      freshness = freshness.max(modified(&package.dir.join(file))?);
    }

    debug!(identity = %package.identity, freshness = ?freshness, "computed freshness");
    Ok(freshness)
  }

  /// The outcome of an earlier request for `identity`, if there was one.
  fn cached(&self, identity: &str) -> Option<Result<Rc<Package>, BuildError>> {
    match self.packages.get(identity)? {
      Slot::Ready(pkg) => Some(Ok(Rc::clone(pkg))),
      Slot::Building => Some(Err(self.cycle(identity))),
      Slot::Failed => Some(Err(BuildError::PreviouslyFailed {
        identity: identity.to_string(),
      })),
    }
  }

  fn cycle(&self, identity: &str) -> BuildError {
    let start = self.stack.iter().position(|id| id == identity).unwrap_or(0);
    let mut chain: Vec<&str> = self.stack[start..].iter().map(String::as_str).collect();
    chain.push(identity);
    BuildError::ImportCycle {
      chain: chain.join(" -> "),
    }
  }

  fn resolve(&mut self, mut package: Package, persist: bool) -> Result<Rc<Package>, BuildError> {
    let identity = package.identity.clone();
    self.packages.insert(identity.clone(), Slot::Building);
    self.stack.push(identity.clone());

    let result = self.build_package(&mut package, persist);
    self.stack.pop();

    match result {
      Ok(()) => {
        let package = Rc::new(package);
        self.packages.insert(identity, Slot::Ready(Rc::clone(&package)));
        Ok(package)
      }
      Err(e) => {
        debug!(identity = %identity, error = %e, "build failed");
        self.packages.insert(identity, Slot::Failed);
        Err(e)
      }
    }
  }
}

fn modified(path: &Path) -> Result<SystemTime, BuildError> {
  fs::metadata(path)
    .and_then(|m| m.modified())
    .map_err(|source| BuildError::Io {
      path: path.to_path_buf(),
      source,
    })
}

/// Whether `artifact` exists and is strictly newer than `freshness`.
fn is_newer(artifact: &Path, freshness: SystemTime) -> Result<bool, BuildError> {
  match fs::metadata(artifact) {
    Ok(meta) => {
      let mtime = meta.modified().map_err(|source| BuildError::Io {
        path: artifact.to_path_buf(),
        source,
      })?;
      Ok(mtime > freshness)
    }
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
    Err(source) => Err(BuildError::Io {
      path: artifact.to_path_buf(),
      source,
    }),
  }
}
