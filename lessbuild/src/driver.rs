use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::Section as _;
use color_eyre::eyre::WrapErr as _;

use std::fs;
use std::io;
use std::process::{Command, Stdio};
use std::time::SystemTime;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

use crate::exe::resolve_executable;
use crate::scan::find_sources;
use crate::{CompileParams, Error};

#[cfg(feature = "build-script")]
macro_rules! p {
($($tokens: tt)*) => {
    println!("cargo::warning={}", format!($($tokens)*))
}
}
#[cfg(not(feature = "build-script"))]
macro_rules! p {
  ($($tokens: tt)*) => {};
}

/// Compiles `.less`/`.lss` files through `lessc`, and copies `.css` files,
/// from a source tree into a destination tree with the same layout.
///
/// Outputs whose modification time is not older than their source are left alone.
#[derive(Debug, Clone)]
pub struct Less {
  params: CompileParams,
}

impl Less {
  pub fn new(params: CompileParams) -> Self {
    Self { params }
  }

  /// Compiles a collection of paths relative to the source dir.
  /// Absolute paths are used as is, for both the source and the destination.
  ///
  /// When `files` is `None` the source dir is searched recursively for
  /// `.less`, `.lss` and `.css` files.
  ///
  /// Returns the absolute paths of every written file, in input order.
  pub fn compile(&self, files: Option<&[Utf8PathBuf]>) -> color_eyre::Result<Vec<Utf8PathBuf>> {
    let found;
    let files = match files {
      Some(files) => files,
      None => {
        found = find_sources(&self.params.source_dir);
        &found[..]
      }
    };

    info!(
      source_dir = %self.params.source_dir,
      destination_dir = %self.params.destination_dir,
      files = files.len(),
      "Compiling stylesheets"
    );
    let mut written = Vec::new();
    for file in files {
      let source = self.params.source_dir.join(file);
      let destination = self.destination_for(file);
      if let Some(path) = self
        .compile_one(&source, &destination)
        .wrap_err_with(|| format!("Failed to compile {source}"))?
      {
        written.push(path);
      }
    }

    info!(
      written = written.len(),
      skipped = files.len() - written.len(),
      "Finished compiling stylesheets"
    );
    Ok(written)
  }

  /// Absolute destination of `file`, a path relative to the source dir.
  pub fn destination_for(&self, file: &Utf8Path) -> Utf8PathBuf {
    let destination = self.params.destination_dir.join(file);
    replace_less_suffix(destination.as_str(), &self.params.extension).into()
  }

  fn compile_one(
    &self,
    source: &Utf8Path,
    destination: &Utf8Path,
  ) -> color_eyre::Result<Option<Utf8PathBuf>> {
    if mtime(destination) >= mtime(source) {
      debug!(%source, %destination, "Destination is up to date, skipping");
      return Ok(None);
    }

    let content = if source.extension() == Some("css") {
      p!("Copying {} to {}", source, destination);
      info!(%source, %destination, "Copying");
      fs::read(source).map_err(|source_err| Error::Read {
        path: source.to_path_buf(),
        source: source_err,
      })?
    } else {
      self.run_lessc(source, destination)?
    };

    create_parent_dirs(destination)?;
    fs::write(destination, content).map_err(|source| Error::Write {
      path: destination.to_path_buf(),
      source,
    })?;
    Ok(Some(destination.to_path_buf()))
  }

  /// Output of `lessc <source> [-x]`
  fn run_lessc(&self, source: &Utf8Path, destination: &Utf8Path) -> color_eyre::Result<Vec<u8>> {
    let params = &self.params;
    let Some(lessc) = resolve_executable(&params.lessc, &params.search_path) else {
      error!(compiler = %params.lessc, "Compiler is missing");
      return Err(Error::CompilerMissing {
        compiler: params.lessc.clone(),
      })
      .note(format!("Searched directories: {:?}", params.search_path.dirs()))
      .suggestion("Install it with `npm install -g less`, or point `less_path` at the directory holding `lessc`");
    };

    p!("Compiling {} to {}", source, destination);
    info!(%source, %destination, compiler = %lessc, "Compiling");
    let mut command = Command::new(&lessc);
    command.arg(source);
    if params.compress {
      command.arg(&params.compress_flag);
    }
    let output = command
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::inherit())
      .output()
      .map_err(|err| Error::Spawn {
        compiler: lessc.clone(),
        source: err,
      })?;

    if !output.status.success() {
      if params.fail_on_compiler_error {
        return Err(Error::CompilerFailed {
          compiler: lessc,
          source_file: source.to_path_buf(),
          status: output.status,
        }
        .into());
      }
      // whatever was printed is still written
      warn!(
        %source,
        status = %output.status,
        captured_bytes = output.stdout.len(),
        "Compiler exited unsuccessfully, writing its output anyway"
      );
    }
    Ok(output.stdout)
  }
}

/// Replaces a trailing `less` or `lss` (any case) with `extension`.
/// Anything else is returned unchanged.
pub fn replace_less_suffix(path: &str, extension: &str) -> String {
  let lower = path.to_ascii_lowercase();
  for suffix in ["less", "lss"] {
    if lower.ends_with(suffix) {
      let stem = &path[..path.len() - suffix.len()];
      return format!("{stem}{extension}");
    }
  }
  path.to_owned()
}

/// Missing paths, and anything that isn't a file, count as infinitely old.
fn mtime(path: &Utf8Path) -> Option<SystemTime> {
  fs::metadata(path)
    .ok()
    .filter(|meta| meta.is_file())
    .and_then(|meta| meta.modified().ok())
}

fn create_parent_dirs(path: &Utf8Path) -> Result<(), Error> {
  let Some(parent) = path.parent() else {
    return Ok(());
  };
  match fs::create_dir_all(parent) {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
    Err(source) => Err(Error::CreateDir {
      path: parent.to_path_buf(),
      source,
    }),
  }
}

/// Will search the source dir and compile every stylesheet that is out of date.
/// See [`Less::compile`]
pub fn compile(params: CompileParams) -> color_eyre::Result<Vec<Utf8PathBuf>> {
  Less::new(params).compile(None)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[test]
  fn suffixes() {
    assert_eq!(replace_less_suffix("/out/a/b/style.less", "css"), "/out/a/b/style.css");
    assert_eq!(replace_less_suffix("/out/style.lss", "css"), "/out/style.css");
    assert_eq!(replace_less_suffix("/out/STYLE.LESS", "css"), "/out/STYLE.css");
    assert_eq!(replace_less_suffix("/out/style.Lss", "min.css"), "/out/style.min.css");
    assert_eq!(replace_less_suffix("/out/style.css", "txt"), "/out/style.css");
    assert_eq!(replace_less_suffix("/out/style.scss", "css"), "/out/style.scss");
    // only the trailing suffix is touched
    assert_eq!(replace_less_suffix("/less/style.less", "css"), "/less/style.css");
  }

  #[test]
  fn missing_files_are_older_than_anything() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    let file = root.join("style.less");
    fs::write(&file, "").unwrap();

    assert!(mtime(&root.join("nope")) < mtime(&file));
    assert_eq!(mtime(&root), None);
    assert_eq!(mtime(&root.join("nope")), mtime(&root.join("other")));
  }

  #[test]
  fn newer_file_compares_greater() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    let old = root.join("old.less");
    let new = root.join("new.css");
    fs::write(&old, "").unwrap();
    fs::write(&new, "").unwrap();
    let now = SystemTime::now();
    fs::File::options()
      .write(true)
      .open(&old)
      .unwrap()
      .set_modified(now - Duration::from_secs(60))
      .unwrap();
    fs::File::options()
      .write(true)
      .open(&new)
      .unwrap()
      .set_modified(now)
      .unwrap();

    assert!(mtime(&new) > mtime(&old));
  }

  #[test]
  fn existing_parent_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    let destination = root.join("a/b/style.css");

    create_parent_dirs(&destination).unwrap();
    assert!(root.join("a/b").is_dir());
    create_parent_dirs(&destination).unwrap();
  }

  #[test]
  fn parent_blocked_by_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    fs::write(root.join("a"), "").unwrap();

    let err = create_parent_dirs(&root.join("a/b/style.css")).unwrap_err();
    assert!(matches!(err, Error::CreateDir { .. }));
  }
}
