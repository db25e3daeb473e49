//! CLI integration tests driving `luapack` with a scripted compiler.

mod build_tests;
mod common;
mod install_tests;
