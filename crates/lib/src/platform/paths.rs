use std::path::PathBuf;

use crate::consts::APP_NAME;

/// Environment variable listing package search roots (OS path-list syntax).
pub const PATH_ENV: &str = "LUAPACK_PATH";

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var_os("USERPROFILE").map(PathBuf::from).unwrap_or_default()
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default()
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  std::env::var_os("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(home_dir)
    .join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var_os("XDG_DATA_HOME")
    .filter(|v| !v.is_empty())
    .map(PathBuf::from)
    .unwrap_or_else(|| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Package search roots, in lookup order.
///
/// Taken from `LUAPACK_PATH` when set and non-empty, otherwise the single
/// default root under the data directory.
pub fn search_roots() -> Vec<PathBuf> {
  let roots: Vec<PathBuf> = std::env::var_os(PATH_ENV)
    .map(|value| std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()).collect())
    .unwrap_or_default();

  if roots.is_empty() { vec![data_dir()] } else { roots }
}
