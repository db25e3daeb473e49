//! Bundles execute correctly in an embedded Lua VM.

use luapack_lib::run::run_embedded;
use mlua::prelude::*;

use super::common::{Workspace, run_bundle};

fn build_program(ws: &Workspace, source: &str) -> Vec<u8> {
  let file = ws.write("app/main.src", source, 600);
  let mut builder = ws.builder();
  let pkg = builder.build_file(&file, &ws.temp.path().join("out"), false).unwrap();
  pkg.payload.clone().unwrap()
}

#[test]
fn transitive_dependencies_are_available() -> LuaResult<()> {
  let ws = Workspace::new();
  ws.package("c", "package c\nfunction C() return 'c' end\n");
  ws.package("b", "package b\nimport \"c\"\nfunction B() return 'b' .. __packages['c'].C() end\n");
  ws.package("lib/a", "package a\nimport \"b\"\nfunction A() return 'a' .. __packages['b'].B() end\n");

  let bundle = build_program(
    &ws,
    "package main\nimport \"lib/a\"\nfunction main() OUTPUT = __packages['lib/a'].A() end\n",
  );
  assert_eq!(run_bundle(&bundle)?, "abc");
  Ok(())
}

#[test]
fn unexported_names_stay_private() -> LuaResult<()> {
  let ws = Workspace::new();
  ws.package(
    "shapes",
    "package shapes\nlocal function helper() return 2 end\nfunction Area() return helper() * 2 end\n",
  );

  let bundle = build_program(
    &ws,
    "package main\nimport \"shapes\"\nfunction main()\n  local s = __packages['shapes']\n  OUTPUT = tostring(s.Area()) .. tostring(s.helper)\nend\n",
  );
  assert_eq!(run_bundle(&bundle)?, "4nil");
  Ok(())
}

#[test]
fn shared_dependency_loads_once() -> LuaResult<()> {
  let ws = Workspace::new();
  ws.package("d", "package d\nLOADS = (LOADS or 0) + 1\nfunction D() return LOADS end\n");
  ws.package("b", "package b\nimport \"d\"\nfunction B() return __packages['d'].D() end\n");
  ws.package("c", "package c\nimport \"d\"\nfunction C() return __packages['d'].D() end\n");

  let bundle = build_program(
    &ws,
    "package main\nimport \"b\"\nimport \"c\"\nfunction main() OUTPUT = tostring(LOADS) end\n",
  );
  assert_eq!(run_bundle(&bundle)?, "1");
  Ok(())
}

#[test]
fn bundle_from_cached_artifacts_is_identical() {
  let ws = Workspace::new();
  ws.package("c", "package c\nfunction C() return 'c' end\n");
  ws.package("b", "package b\nimport \"c\"\nfunction B() return __packages['c'].C() end\n");
  let source = "package main\nimport \"b\"\nfunction main() OUTPUT = __packages['b'].B() end\n";

  let first = build_program(&ws, source);

  let file = ws.write("app/main.src", source, 600);
  let mut builder = ws.builder();
  let pkg = builder.build_file(&file, &ws.temp.path().join("out"), false).unwrap();
  assert_eq!(builder.translator().translated, vec!["main"]);
  assert_eq!(pkg.payload.as_deref(), Some(&first[..]));
}

#[test]
fn bundle_runs_through_the_embedded_runner() {
  let ws = Workspace::new();
  ws.package("greet", "package greet\nfunction Hello() return 'hello' end\n");

  let bundle = build_program(
    &ws,
    "package main\nimport \"greet\"\nfunction main() assert(__packages['greet'].Hello() == 'hello') end\n",
  );
  run_embedded(&bundle, "main.src").unwrap();
}

#[test]
fn failing_main_surfaces_a_script_error() {
  let ws = Workspace::new();
  let bundle = build_program(&ws, "package main\nfunction main() error('exploded') end\n");

  let err = run_embedded(&bundle, "main.src").unwrap_err();
  assert!(err.to_string().contains("exploded"));
}
