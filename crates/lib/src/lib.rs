//! luapack-lib: build orchestration for packages compiled to Lua
//!
//! This crate provides everything behind the `luapack` command:
//! - `package`: package descriptors, header scanning and lookup under search roots
//! - `interface`: type interfaces shared between packages during a build
//! - `artifact`: the on-disk format of compiled packages and programs
//! - `translate`: the boundary to the per-package compiler
//! - `build`: incremental builds and bundling of executable packages
//! - `run`: executing bundles

pub mod artifact;
pub mod build;
pub mod config;
pub mod consts;
pub mod interface;
pub mod package;
pub mod platform;
pub mod run;
pub mod translate;
pub mod util;
