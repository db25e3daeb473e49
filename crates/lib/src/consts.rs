//! Names and fixed values shared across the crate.

pub const APP_NAME: &str = "luapack";

/// Extension of package source files.
pub const SOURCE_EXTENSION: &str = "src";

/// Source files with this suffix belong to tests and are never compiled into a package.
pub const TEST_FILE_SUFFIX: &str = "_test.src";

/// Extension of library artifacts under `<root>/pkg`.
pub const ARTIFACT_EXTENSION: &str = "lpkg";

/// Extension of executable artifacts.
pub const SCRIPT_EXTENSION: &str = "lua";

/// Package name (and single-file identity) marking an executable.
pub const MAIN_PACKAGE: &str = "main";

/// Built-in pseudo-package with no sources.
pub const UNSAFE_PACKAGE: &str = "unsafe";

/// Packages never inlined into a bundle. `unsafe` has no runtime form, `reflect`
/// is assumed preloaded by the interpreter, `doc` holds documentation only.
pub const BUNDLE_EXCLUDED: &[&str] = &[UNSAFE_PACKAGE, "reflect", "doc"];

/// Global table holding every package registration in a bundle.
pub const PACKAGE_REGISTRY: &str = "__packages";

/// Function invoked at the end of a bundle.
pub const ENTRY_POINT: &str = "main";

pub const DEFAULT_INTERPRETER: &str = "lua";
