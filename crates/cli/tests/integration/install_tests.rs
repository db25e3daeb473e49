//! Install command integration tests.

use std::fs;

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn install_program_writes_to_bin() {
  let env = TestEnv::new();
  env.package("tools/greeter", "main", &[]);
  env.respond("tools/greeter", "main", "function main() print('hi') end\n", &["main"], &[]);

  env
    .luapack_cmd()
    .args(["install", "tools/greeter"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Installed tools/greeter"));

  let script = fs::read_to_string(env.root_path().join("bin").join("greeter.lua")).unwrap();
  assert!(script.starts_with("#!/usr/bin/env cat\n"));
  assert!(script.ends_with("main()\n"));
}

#[test]
fn install_library_writes_artifact() {
  let env = TestEnv::new();
  env.package("geo/point", "point", &[]);
  env.respond("geo/point", "point", "function Origin() return 0 end\n", &["Origin"], &[]);

  env.luapack_cmd().args(["install", "geo/point"]).assert().success();

  let artifact = fs::read_to_string(env.root_path().join("pkg").join("geo").join("point.lpkg")).unwrap();
  let (interface, payload) = artifact.split_once("\n$$\n").unwrap();
  assert!(interface.contains("\"path\":\"geo/point\""));
  assert_eq!(payload, "function Origin() return 0 end\n");
}

#[test]
fn install_twice_uses_the_cache() {
  let env = TestEnv::new();
  env.package("geo/point", "point", &[]);
  env.respond("geo/point", "point", "function Origin() return 0 end\n", &["Origin"], &[]);

  env.luapack_cmd().args(["install", "geo/point"]).assert().success();
  env
    .luapack_cmd()
    .args(["install", "geo/point"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Packages cached: 1"));

  assert_eq!(env.compiler_calls(), vec!["geo/point"]);
}

#[test]
fn install_unknown_package_fails() {
  let env = TestEnv::new();

  env
    .luapack_cmd()
    .args(["install", "nowhere/at/all"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("cannot find package 'nowhere/at/all'"));
}

#[test]
fn install_rejects_relative_paths() {
  let env = TestEnv::new();

  env
    .luapack_cmd()
    .args(["install", "../escape"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("relative imports are not supported"));
}
