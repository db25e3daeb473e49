//! Build command integration tests.

use std::fs;

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_writes_script_to_current_directory() {
  let env = TestEnv::new();
  env.hello_program();

  env
    .luapack_cmd()
    .args(["build", "hello.src"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Packages translated: 2"))
    .stdout(predicate::str::contains("Packages cached: 0"));

  let script_path = env.work_path().join("hello.lua");
  let script = fs::read_to_string(&script_path).unwrap();
  assert!(script.starts_with("#!/usr/bin/env cat\n"));
  assert!(script.contains("__packages[\"greet\"] = (function()"));
  assert!(script.contains("return { Hello = Hello }"));
  assert!(script.ends_with("main()\n"));

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(&script_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
  }

  assert!(env.root_path().join("pkg").join("greet.lpkg").exists());
  assert_eq!(env.compiler_calls(), vec!["greet", "main"]);
}

#[test]
fn build_is_incremental() {
  let env = TestEnv::new();
  env.hello_program();

  env.luapack_cmd().args(["build", "hello.src"]).assert().success();
  let first = fs::read(env.work_path().join("hello.lua")).unwrap();

  env
    .luapack_cmd()
    .args(["build", "hello.src"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Packages translated: 0"))
    .stdout(predicate::str::contains("Packages cached: 2"));

  assert_eq!(fs::read(env.work_path().join("hello.lua")).unwrap(), first);
  assert_eq!(env.compiler_calls(), vec!["greet", "main"]);
}

#[test]
fn build_prints_diagnostics_once_each() {
  let env = TestEnv::new();
  env.hello_program();
  env.reject(
    "greet",
    &[
      ("greet.src:3:5", "undefined: fmt"),
      ("greet.src:3:5", "undefined: fmt"),
      ("greet.src:7:1", "missing return"),
    ],
  );

  let output = env.luapack_cmd().args(["build", "hello.src"]).output().unwrap();
  assert_eq!(output.status.code(), Some(1));

  let stderr = String::from_utf8(output.stderr).unwrap();
  assert_eq!(stderr.matches("greet.src:3:5: undefined: fmt").count(), 1);
  assert!(stderr.contains("greet.src:7:1: missing return"));
  assert!(!env.work_path().join("hello.lua").exists());
}

#[test]
fn build_missing_file_fails() {
  let env = TestEnv::new();

  env
    .luapack_cmd()
    .args(["build", "absent.src"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Failed to build absent.src"));
}

#[test]
fn build_unknown_import_fails() {
  let env = TestEnv::new();
  env.write_file("work/hello.src", "package main\nimport \"nowhere\"\n");

  env
    .luapack_cmd()
    .args(["build", "hello.src"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("cannot find package 'nowhere'"));
}

#[test]
fn build_import_cycle_fails() {
  let env = TestEnv::new();
  env.package("a", "a", &["b"]);
  env.package("b", "b", &["a"]);
  env.write_file("work/hello.src", "package main\nimport \"a\"\n");

  env
    .luapack_cmd()
    .args(["build", "hello.src"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("import cycle not allowed: a -> b -> a"));
  assert!(env.compiler_calls().is_empty());
}

#[test]
fn compiler_flag_overrides_environment() {
  let env = TestEnv::new();
  env.hello_program();

  env
    .luapack_cmd()
    .env("LUAPACK_COMPILER", env.path().join("no-such-compiler"))
    .arg("--compiler")
    .arg(env.compiler_path())
    .args(["build", "hello.src"])
    .assert()
    .success();
}

#[test]
fn verbose_logs_to_stderr() {
  let env = TestEnv::new();
  env.hello_program();

  env
    .luapack_cmd()
    .args(["-v", "build", "hello.src"])
    .assert()
    .success()
    .stderr(predicate::str::contains("translating"))
    .stdout(predicate::str::contains("translating").not());
}
