//! Type interfaces of compiled packages.
//!
//! A [`TypeInterface`] is everything an importer needs from a package without
//! reading its sources again: the identities it depends on, its top-level
//! names, and opaque type data produced by the translator. Interfaces of all
//! packages seen during one build live in a [`TypeRegistry`].
//!
//! The on-disk encoding is a single line of compact JSON, so it never contains
//! a raw newline and the artifact sentinel line can follow it directly.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::consts::UNSAFE_PACKAGE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInterface {
  /// Identity of the package this interface describes.
  pub path: String,

  /// Declared package name.
  pub name: String,

  /// Identities this package depends on, in source order.
  #[serde(default)]
  pub imports: Vec<String>,

  /// Top-level identifiers declared by the package.
  #[serde(default)]
  pub scope: Vec<String>,

  /// Translator-specific type data, passed through untouched.
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub data: serde_json::Value,
}

impl TypeInterface {
  pub fn new(path: &str, name: &str) -> Self {
    Self {
      path: path.to_string(),
      name: name.to_string(),
      imports: Vec::new(),
      scope: Vec::new(),
      data: serde_json::Value::Null,
    }
  }

  /// The fixed interface registered for the built-in `unsafe` package.
  pub fn unsafe_package() -> Self {
    Self {
      scope: ["Alignof", "Offsetof", "Pointer", "Sizeof"]
        .iter()
        .map(|s| s.to_string())
        .collect(),
      ..Self::new(UNSAFE_PACKAGE, UNSAFE_PACKAGE)
    }
  }

  /// Names visible to importers, sorted and without duplicates.
  pub fn exported_names(&self) -> Vec<&str> {
    self
      .scope
      .iter()
      .map(String::as_str)
      .filter(|name| is_exported(name))
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect()
  }

  pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(self)
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
    serde_json::from_slice(bytes)
  }
}

/// Whether an identifier is exported: its first character is an uppercase letter.
pub fn is_exported(name: &str) -> bool {
  name.chars().next().is_some_and(char::is_uppercase)
}

/// Interfaces of every package resolved so far, keyed by identity.
#[derive(Debug, Default)]
pub struct TypeRegistry {
  interfaces: HashMap<String, TypeInterface>,
}

impl TypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, identity: &str) -> Option<&TypeInterface> {
    self.interfaces.get(identity)
  }

  pub fn contains(&self, identity: &str) -> bool {
    self.interfaces.contains_key(identity)
  }

  /// Register an interface, replacing any previous one for the same identity.
  pub fn insert(&mut self, identity: &str, interface: TypeInterface) {
    self.interfaces.insert(identity.to_string(), interface);
  }

  pub fn len(&self) -> usize {
    self.interfaces.len()
  }

  pub fn is_empty(&self) -> bool {
    self.interfaces.is_empty()
  }

  /// All interfaces ordered by identity.
  pub fn sorted(&self) -> BTreeMap<&str, &TypeInterface> {
    self.interfaces.iter().map(|(k, v)| (k.as_str(), v)).collect()
  }
}
