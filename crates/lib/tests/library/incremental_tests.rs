//! Rebuild decisions across separate builder runs.

use std::fs;

use mlua::prelude::*;

use super::common::{Workspace, backdate, run_bundle};

const MAIN: &str = "package main\nimport \"c\"\nfunction main() OUTPUT = __packages['c'].Version() end\n";

fn build(ws: &Workspace) -> (Vec<u8>, Vec<String>) {
  let file = ws.write("app/main.src", MAIN, 600);
  let mut builder = ws.builder();
  let pkg = builder.build_file(&file, &ws.temp.path().join("out"), false).unwrap();
  (pkg.payload.clone().unwrap(), builder.translator().translated.clone())
}

#[test]
fn untouched_dependency_is_not_retranslated() {
  let ws = Workspace::new();
  ws.package("c", "package c\nfunction Version() return 'v1' end\n");

  let (_, first) = build(&ws);
  assert_eq!(first, vec!["c", "main"]);

  let (_, second) = build(&ws);
  assert_eq!(second, vec!["main"]);
}

#[test]
fn edited_dependency_is_picked_up() -> LuaResult<()> {
  let ws = Workspace::new();
  ws.package("c", "package c\nfunction Version() return 'v1' end\n");

  let (bundle, _) = build(&ws);
  assert_eq!(run_bundle(&bundle)?, "v1");

  let artifact = ws.root().join("pkg").join("c.lpkg");
  assert!(artifact.exists());
  backdate(&artifact, 450);
  ws.write("root/src/c/c.src", "package c\nfunction Version() return 'v2' end\n", 300);

  let (bundle, translated) = build(&ws);
  assert_eq!(translated, vec!["c", "main"]);
  assert_eq!(run_bundle(&bundle)?, "v2");
  assert!(fs::read_to_string(&artifact).unwrap().contains("'v2'"));
  Ok(())
}
