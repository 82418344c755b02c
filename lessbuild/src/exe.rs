//! Locating the compiler executable.
//!
//! Lookup never consults the process environment on its own: callers pass a
//! [`SearchPath`], which is usually [`SearchPath::from_env`].

use camino::{Utf8Path, Utf8PathBuf};
#[allow(unused_imports)]
use tracing::{debug, trace, warn};

/// Ordered list of directories searched for bare executable names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
  dirs: Vec<Utf8PathBuf>,
}

impl SearchPath {
  pub fn new(dirs: impl IntoIterator<Item = Utf8PathBuf>) -> Self {
    Self {
      dirs: dirs.into_iter().collect(),
    }
  }

  /// Snapshot of the `PATH` environment variable.
  /// Entries that are not valid UTF-8 are skipped.
  pub fn from_env() -> Self {
    let Some(path) = std::env::var_os("PATH") else {
      warn!("PATH is not set, only explicit compiler paths will resolve");
      return Self::default();
    };
    let dirs = std::env::split_paths(&path).filter_map(|dir| match Utf8PathBuf::try_from(dir) {
      Ok(dir) => Some(dir),
      Err(err) => {
        debug!(dir = ?err.as_path(), "Skipping non UTF-8 PATH entry");
        None
      }
    });
    Self::new(dirs)
  }

  pub fn dirs(&self) -> &[Utf8PathBuf] {
    &self.dirs
  }
}

/// Resolves `exe` to the path that should be spawned.
///
/// A name with a directory component must itself point at an executable
/// file; a bare name is looked up in each `search_path` directory in order.
pub fn resolve_executable(exe: &Utf8Path, search_path: &SearchPath) -> Option<Utf8PathBuf> {
  let has_dir = exe.parent().is_some_and(|parent| !parent.as_str().is_empty());
  if has_dir {
    return is_executable(exe).then(|| exe.to_path_buf());
  }

  search_path
    .dirs()
    .iter()
    .map(|dir| dir.join(exe))
    .inspect(|candidate| trace!(%candidate, "Trying compiler candidate"))
    .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Utf8Path) -> bool {
  use std::os::unix::fs::PermissionsExt;

  std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Utf8Path) -> bool {
  path.is_file()
}
