use camino::{Utf8Path, Utf8PathBuf};
use glob::{Pattern, glob};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

/// File name endings picked up when no explicit file list is given.
pub const SOURCE_SUFFIXES: [&str; 3] = [".less", ".lss", ".css"];

/// Recursively collects stylesheet sources under `root`,
/// returned relative to `root`.
pub fn find_sources(root: &Utf8Path) -> Vec<Utf8PathBuf> {
  let pattern = format!("{}/**/*", Pattern::escape(root.as_str()));
  info!(search_pattern = %pattern, "Searching for uncompiled LESS files");

  let entries = match glob(&pattern) {
    Ok(entries) => entries,
    Err(err) => {
      warn!(?err, %pattern, "Source dir produced an invalid glob pattern");
      return Vec::new();
    }
  };

  let mut matches = Vec::new();
  for entry in entries {
    let path = match entry {
      Ok(path) => path,
      Err(err) => {
        warn!(?err, %pattern, "Glob matched an entry that can't be read for some reason?");
        continue;
      }
    };
    let path = match Utf8PathBuf::try_from(path) {
      Ok(path) => path,
      Err(err) => {
        warn!(path = ?err.as_path(), "Skipping non UTF-8 path");
        continue;
      }
    };
    if !path.is_file() || !is_source_name(&path) {
      continue;
    }
    match path.strip_prefix(root) {
      Ok(relative) if under_symlinked_dir(root, relative) => {
        trace!(%relative, "Not following symlinked dir");
      }
      Ok(relative) => {
        trace!(%relative, "Found source file");
        matches.push(relative.to_path_buf());
      }
      Err(_) => warn!(%path, %root, "Glob yielded a path outside the source dir"),
    }
  }

  debug!(found = matches.len(), "Finished searching for sources");
  matches
}

/// Whether any directory between `root` and `relative` is a symlink.
/// Symlinked files themselves are still picked up.
fn under_symlinked_dir(root: &Utf8Path, relative: &Utf8Path) -> bool {
  relative
    .ancestors()
    .skip(1)
    .filter(|dir| !dir.as_str().is_empty())
    .any(|dir| {
      root
        .join(dir)
        .symlink_metadata()
        .is_ok_and(|meta| meta.file_type().is_symlink())
    })
}

fn is_source_name(path: &Utf8Path) -> bool {
  path
    .file_name()
    .is_some_and(|name| SOURCE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
}
