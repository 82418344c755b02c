use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use color_eyre::eyre::WrapErr as _;
use std::env::current_dir;
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

use crate::Error;
use crate::exe::SearchPath;

/// Name of the compiler executable, looked up inside `less_path`
/// or on the search path.
pub const LESSC: &str = "lessc";
pub const DEFAULT_EXTENSION: &str = "css";
/// Minification switch understood by `lessc`.
pub const DEFAULT_COMPRESS_FLAG: &str = "-x";

/// Finished, immutable driver configuration.
/// Build one with [`CompileParams::builder`].
#[derive(Debug, Clone)]
pub struct CompileParams {
  pub(crate) source_dir: Utf8PathBuf,
  pub(crate) destination_dir: Utf8PathBuf,
  pub(crate) compress: bool,
  pub(crate) compress_flag: String,
  pub(crate) extension: String,
  pub(crate) lessc: Utf8PathBuf,
  pub(crate) search_path: SearchPath,
  pub(crate) fail_on_compiler_error: bool,
}

impl CompileParams {
  pub fn builder() -> CompileParamsBuilder {
    CompileParamsBuilder::default()
  }

  pub fn source_dir(&self) -> &Utf8Path {
    &self.source_dir
  }

  pub fn destination_dir(&self) -> &Utf8Path {
    &self.destination_dir
  }

  pub fn compress(&self) -> bool {
    self.compress
  }

  /// Appended to the compiler invocation when [`Self::compress`] is set
  pub fn compress_flag(&self) -> &str {
    &self.compress_flag
  }

  pub fn extension(&self) -> &str {
    &self.extension
  }

  /// `lessc`, joined onto the configured `less_path`
  pub fn lessc(&self) -> &Utf8Path {
    &self.lessc
  }

  pub fn search_path(&self) -> &SearchPath {
    &self.search_path
  }

  pub fn fail_on_compiler_error(&self) -> bool {
    self.fail_on_compiler_error
  }
}

#[derive(Default, Clone, Debug)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct CompileParamsBuilder {
  /// Directory recursively searched for .less, .lss and .css files
  #[cfg_attr(feature = "cli", arg(long))]
  source_dir: Option<Utf8PathBuf>,
  /// Directory compiled files are written to,
  /// mirroring the layout of the source dir
  #[cfg_attr(feature = "cli", arg(long))]
  destination_dir: Option<Utf8PathBuf>,
  /// Ask the compiler to minify its output [default: true]
  #[cfg_attr(feature = "cli", arg(long))]
  compress: Option<bool>,
  /// Flag appended to the compiler invocation when compressing [default: -x]
  #[cfg_attr(feature = "cli", arg(long, allow_hyphen_values = true))]
  compress_flag: Option<String>,
  /// Extension of written files [default: css]
  #[cfg_attr(feature = "cli", arg(long))]
  extension: Option<String>,
  /// Directory containing the `lessc` executable.
  /// When unset, `lessc` is looked up on the PATH
  #[cfg_attr(feature = "cli", arg(long))]
  less_path: Option<Utf8PathBuf>,
  /// Fail the run when the compiler exits unsuccessfully,
  /// instead of writing whatever it printed
  #[cfg_attr(feature = "cli", arg(long))]
  fail_on_compiler_error: bool,
  #[cfg_attr(feature = "cli", arg(skip))]
  search_path: Option<SearchPath>,
}

impl CompileParamsBuilder {
  /// Directory path to search stylesheets in
  pub fn with_source_dir(self, path: Utf8PathBuf) -> color_eyre::Result<Self> {
    if !path.is_dir() {
      return Err(Error::SourceDirMissing(path).into());
    }
    Ok(Self {
      source_dir: Some(path),
      ..self
    })
  }

  /// Directory path to write compiled files into.
  /// Doesn't need to exist yet
  pub fn with_destination_dir(self, path: Utf8PathBuf) -> Self {
    Self {
      destination_dir: Some(path),
      ..self
    }
  }

  pub fn with_compress(self, compress: bool) -> Self {
    Self {
      compress: Some(compress),
      ..self
    }
  }

  pub fn with_compress_flag(self, flag: impl Into<String>) -> Self {
    Self {
      compress_flag: Some(flag.into()),
      ..self
    }
  }

  /// Extension without the leading dot, e.g. `css`
  pub fn with_extension(self, extension: impl Into<String>) -> Self {
    Self {
      extension: Some(extension.into()),
      ..self
    }
  }

  /// Directory holding `lessc`, e.g. `/usr/local/lib/node_modules/less/bin`
  pub fn with_less_path(self, path: Utf8PathBuf) -> Self {
    Self {
      less_path: Some(path),
      ..self
    }
  }

  /// Directories consulted for `lessc` when no `less_path` is set.
  /// Defaults to the `PATH` at the time [`Self::finish`] is called
  pub fn with_search_path(self, search_path: SearchPath) -> Self {
    Self {
      search_path: Some(search_path),
      ..self
    }
  }

  pub fn with_fail_on_compiler_error(self, fail: bool) -> Self {
    Self {
      fail_on_compiler_error: fail,
      ..self
    }
  }

  /// Will error if the source or destination dir were not provided,
  /// or the current directory is needed but not utf8 encoded
  pub fn finish(self) -> color_eyre::Result<CompileParams> {
    let source_dir = self.source_dir.ok_or(Error::MissingParam("source dir"))?;
    if !source_dir.is_dir() {
      return Err(Error::SourceDirMissing(source_dir).into());
    }
    let destination_dir = self
      .destination_dir
      .ok_or(Error::MissingParam("destination dir"))?;

    let source_dir = absolute(source_dir).wrap_err("Couldn't resolve source dir")?;
    let destination_dir = absolute(destination_dir).wrap_err("Couldn't resolve destination dir")?;
    let lessc = self.less_path.unwrap_or_default().join(LESSC);
    let search_path = self.search_path.unwrap_or_else(SearchPath::from_env);

    let params = CompileParams {
      source_dir,
      destination_dir,
      compress: self.compress.unwrap_or(true),
      compress_flag: self
        .compress_flag
        .unwrap_or_else(|| DEFAULT_COMPRESS_FLAG.to_owned()),
      extension: self
        .extension
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_owned()),
      lessc,
      search_path,
      fail_on_compiler_error: self.fail_on_compiler_error,
    };
    debug!(?params, "Finished compile params");
    Ok(params)
  }
}

/// Absolute form of `path` with `.` and `..` collapsed lexically
fn absolute(path: Utf8PathBuf) -> color_eyre::Result<Utf8PathBuf> {
  let path = if path.is_absolute() {
    path
  } else {
    let cwd = current_dir()?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|err| Error::NonUtf8Path(err.into_path_buf()))?;
    cwd.join(path)
  };
  Ok(normalize(&path))
}

fn normalize(path: &Utf8Path) -> Utf8PathBuf {
  let mut normalized = Utf8PathBuf::new();
  for component in path.components() {
    match component {
      Utf8Component::CurDir => {}
      Utf8Component::ParentDir => {
        // `..` at the root stays at the root
        normalized.pop();
      }
      other => normalized.push(other),
    }
  }
  normalized
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tmp() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    (dir, path)
  }

  #[test]
  fn defaults() {
    let (_guard, root) = tmp();
    let params = CompileParams::builder()
      .with_source_dir(root.clone())
      .unwrap()
      .with_destination_dir(root.join("out"))
      .with_search_path(SearchPath::default())
      .finish()
      .unwrap();

    assert_eq!(params.source_dir(), root);
    assert_eq!(params.destination_dir(), root.join("out"));
    assert!(params.compress());
    assert_eq!(params.compress_flag(), "-x");
    assert_eq!(params.extension(), "css");
    assert_eq!(params.lessc(), Utf8Path::new("lessc"));
    assert!(!params.fail_on_compiler_error());
    assert_eq!(params.search_path(), &SearchPath::default());
  }

  #[test]
  fn less_path_is_joined_with_lessc() {
    let (_guard, root) = tmp();
    let params = CompileParams::builder()
      .with_source_dir(root.clone())
      .unwrap()
      .with_destination_dir(root.clone())
      .with_less_path("/opt/less/bin".into())
      .finish()
      .unwrap();
    assert_eq!(params.lessc(), Utf8Path::new("/opt/less/bin/lessc"));
  }

  #[test]
  fn relative_destination_becomes_absolute() {
    let (_guard, root) = tmp();
    let params = CompileParams::builder()
      .with_source_dir(root)
      .unwrap()
      .with_destination_dir("compiled".into())
      .finish()
      .unwrap();
    assert!(params.destination_dir().is_absolute());
    assert!(params.destination_dir().ends_with("compiled"));
  }

  #[test]
  fn dot_segments_are_collapsed() {
    let (_guard, root) = tmp();
    let params = CompileParams::builder()
      .with_source_dir(root.join("./."))
      .unwrap()
      .with_destination_dir(root.join("./out/../target/./css"))
      .finish()
      .unwrap();
    assert_eq!(params.source_dir(), root);
    assert_eq!(params.destination_dir(), root.join("target/css"));
  }

  #[test]
  fn relative_dot_segments_are_collapsed() {
    let (_guard, root) = tmp();
    let params = CompileParams::builder()
      .with_source_dir(root)
      .unwrap()
      .with_destination_dir("./out/../compiled".into())
      .finish()
      .unwrap();
    let destination = params.destination_dir();
    assert!(destination.is_absolute());
    assert!(destination.ends_with("compiled"));
    assert!(
      destination
        .components()
        .all(|c| !matches!(c, Utf8Component::CurDir | Utf8Component::ParentDir))
    );
  }

  #[test]
  fn normalize_stops_at_root() {
    assert_eq!(normalize(Utf8Path::new("/../a/./b/../c")), Utf8Path::new("/a/c"));
  }

  #[test]
  fn missing_source_dir_is_rejected() {
    let (_guard, root) = tmp();
    let err = CompileParams::builder()
      .with_source_dir(root.join("missing"))
      .unwrap_err();
    assert!(matches!(
      err.downcast_ref::<Error>(),
      Some(Error::SourceDirMissing(_))
    ));
  }

  #[test]
  fn finish_requires_both_dirs() {
    let (_guard, root) = tmp();
    let err = CompileParams::builder()
      .with_source_dir(root)
      .unwrap()
      .finish()
      .unwrap_err();
    assert!(matches!(
      err.downcast_ref::<Error>(),
      Some(Error::MissingParam("destination dir"))
    ));

    let err = CompileParams::builder().finish().unwrap_err();
    assert!(matches!(
      err.downcast_ref::<Error>(),
      Some(Error::MissingParam("source dir"))
    ));
  }
}
