//! Shared test helpers for CLI integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Stand-in compiler: answers each request with the canned response stored
/// for the requested identity and records the identity in `calls.log`.
const FAKE_COMPILER: &str = r#"#!/bin/sh
req=$(cat)
here=$(dirname "$0")
id=$(printf '%s' "$req" | sed -n 's/^{"identity":"\([^"]*\)".*/\1/p')
name=$(printf '%s' "$id" | tr '/' '_')
echo "$id" >> "$here/calls.log"
if [ -f "$here/responses/$name.fail" ]; then
  cat "$here/responses/$name.fail"
  exit 1
fi
cat "$here/responses/$name.json"
"#;

/// Isolated test environment.
///
/// Each test gets a temporary directory holding a search root, a working
/// directory and the fake compiler.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let env = Self { temp };
    fs::create_dir_all(env.work_path()).unwrap();
    fs::create_dir_all(env.root_path()).unwrap();
    env.write_script("compiler/srcc", FAKE_COMPILER);
    env
  }

  pub fn path(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  /// Search root (`LUAPACK_PATH`).
  pub fn root_path(&self) -> PathBuf {
    self.path().join("root")
  }

  /// Current directory of the command.
  pub fn work_path(&self) -> PathBuf {
    self.path().join("work")
  }

  pub fn compiler_path(&self) -> PathBuf {
    self.path().join("compiler").join("srcc")
  }

  /// Write a file relative to the temp directory, ten minutes in the past.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    backdate(&path, 600);
    path
  }

  /// Write an executable shell script relative to the temp directory.
  pub fn write_script(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.write_file(relative_path, content);
    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
  }

  /// A package under the search root with a single header-only source file.
  pub fn package(&self, identity: &str, name: &str, imports: &[&str]) {
    let base = identity.rsplit('/').next().unwrap();
    let mut source = format!("package {name}\n");
    for import in imports {
      source.push_str(&format!("import \"{import}\"\n"));
    }
    self.write_file(&format!("root/src/{identity}/{base}.src"), &source);
  }

  /// The compiler's answer for `identity`.
  pub fn respond(&self, identity: &str, name: &str, payload: &str, scope: &[&str], imports: &[&str]) {
    let response = serde_json::json!({
      "payload": payload,
      "interface": { "path": identity, "name": name, "imports": imports, "scope": scope },
    });
    self.write_file(
      &format!("compiler/responses/{}.json", identity.replace('/', "_")),
      &response.to_string(),
    );
  }

  /// Make the compiler reject `identity` with these diagnostics.
  pub fn reject(&self, identity: &str, diagnostics: &[(&str, &str)]) {
    let list: Vec<_> = diagnostics
      .iter()
      .map(|(position, message)| serde_json::json!({ "position": position, "message": message }))
      .collect();
    self.write_file(
      &format!("compiler/responses/{}.fail", identity.replace('/', "_")),
      &serde_json::json!({ "diagnostics": list }).to_string(),
    );
  }

  /// Identities the compiler was asked to translate, in order.
  pub fn compiler_calls(&self) -> Vec<String> {
    fs::read_to_string(self.path().join("compiler").join("calls.log"))
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }

  /// A program importing `greet`, with both packages answered by the compiler.
  pub fn hello_program(&self) -> PathBuf {
    self.package("greet", "greet", &[]);
    self.respond(
      "greet",
      "greet",
      "function Hello() return 'hello from greet' end\nlocal function secret() end\n",
      &["Hello", "secret"],
      &[],
    );
    self.respond(
      "main",
      "main",
      "function main() print(__packages['greet'].Hello()) end\n",
      &["main"],
      &["greet"],
    );
    self.write_file("work/hello.src", "package main\n\nimport \"greet\"\n")
  }

  /// Get a pre-configured Command for the luapack binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `LUAPACK_PATH`: the isolated search root
  /// - `LUAPACK_COMPILER`: the fake compiler
  /// - `LUAPACK_INTERPRETER`: `cat`, so `run` echoes the bundle
  /// - `XDG_DATA_HOME`: isolated data path
  pub fn luapack_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("luapack");
    cmd.current_dir(self.work_path());
    cmd.env("LUAPACK_PATH", self.root_path());
    cmd.env("LUAPACK_COMPILER", self.compiler_path());
    cmd.env("LUAPACK_INTERPRETER", "cat");
    cmd.env("XDG_DATA_HOME", self.path().join("data"));
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

pub fn backdate(path: &Path, secs: u64) {
  let file = fs::File::options().write(true).open(path).unwrap();
  file.set_modified(SystemTime::now() - Duration::from_secs(secs)).unwrap();
}
