//! Bundle assembly for executable packages.
//!
//! A bundle is the runtime prelude, one registration block per transitive
//! dependency in post-order, the program's own code, and a call to `main()`.
//! Each registration runs the dependency's code inside a closure and stores
//! a table of its exported names in the `__packages` registry:
//!
//! ```lua
//! __packages["geo/point"] = (function()
//! function Origin() return 0 end
//! return { Origin = Origin }
//! end)()
//! ```

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, info};

use super::{BuildError, Builder};
use crate::consts::{BUNDLE_EXCLUDED, ENTRY_POINT, PACKAGE_REGISTRY};
use crate::package::Package;
use crate::translate::Translator;

pub const PRELUDE: &str = include_str!("prelude.lua");

impl<T: Translator> Builder<T> {
  /// Combine `package`'s translated code with every package it depends on.
  ///
  /// Dependencies are walked through their type interfaces, so every one of
  /// them must already be registered.
  pub(crate) fn assemble_bundle(&mut self, package: &Package, own_payload: &[u8]) -> Result<Vec<u8>, BuildError> {
    let imports = self
      .registry()
      .get(&package.identity)
      .map(|iface| iface.imports.clone())
      .ok_or_else(|| BuildError::MissingInterface {
        identity: package.identity.clone(),
      })?;

    let mut out = PRELUDE.as_bytes().to_vec();
    let mut loaded = HashSet::new();
    for identity in &imports {
      self.emit(identity, &package.dir, &mut loaded, &mut out)?;
    }

    out.extend_from_slice(own_payload);
    if !own_payload.is_empty() && !own_payload.ends_with(b"\n") {
      out.push(b'\n');
    }
    out.extend_from_slice(format!("{}()\n", ENTRY_POINT).as_bytes());

    info!(identity = %package.identity, packages = loaded.len(), bytes = out.len(), "assembled bundle");
    Ok(out)
  }

  fn emit(
    &mut self,
    identity: &str,
    importer_dir: &Path,
    loaded: &mut HashSet<String>,
    out: &mut Vec<u8>,
  ) -> Result<(), BuildError> {
    if BUNDLE_EXCLUDED.contains(&identity) || loaded.contains(identity) {
      return Ok(());
    }
    loaded.insert(identity.to_string());

    let dep = self.import(identity, importer_dir, false)?;
    let interface = self
      .registry()
      .get(identity)
      .cloned()
      .ok_or_else(|| BuildError::MissingInterface {
        identity: identity.to_string(),
      })?;

    for sub in &interface.imports {
      self.emit(sub, &dep.dir, loaded, out)?;
    }

    let payload = dep.payload.as_deref().ok_or_else(|| BuildError::MissingPayload {
      identity: identity.to_string(),
    })?;
    debug!(identity, "inlining package");
    out.extend_from_slice(&registration_block(identity, payload, &interface.exported_names()));
    Ok(())
  }
}

/// The Lua statement registering one package under `identity`.
///
/// The payload is copied byte for byte.
pub fn registration_block(identity: &str, payload: &[u8], exports: &[&str]) -> Vec<u8> {
  let mut block = format!("{}[{}] = (function()\n", PACKAGE_REGISTRY, lua_string_literal(identity)).into_bytes();
  block.extend_from_slice(payload);
  if !payload.is_empty() && !payload.ends_with(b"\n") {
    block.push(b'\n');
  }

  if exports.is_empty() {
    block.extend_from_slice(b"return {}\n");
  } else {
    let fields: Vec<String> = exports.iter().map(|name| format!("{name} = {name}")).collect();
    block.extend_from_slice(format!("return {{ {} }}\n", fields.join(", ")).as_bytes());
  }
  block.extend_from_slice(b"end)()\n");
  block
}

/// `s` as a double-quoted Lua string literal.
pub fn lua_string_literal(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 2);
  out.push('"');
  for c in s.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      c if (c as u32) < 0x20 || c == '\x7f' => {
        let _ = write!(out, "\\{:03}", c as u32);
      }
      c => out.push(c),
    }
  }
  out.push('"');
  out
}
