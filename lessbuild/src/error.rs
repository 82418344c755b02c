use std::io;
use std::process::ExitStatus;

use camino::Utf8PathBuf;

/// Failures raised while configuring or running the driver.
///
/// These are wrapped into [`color_eyre::Report`]s at the public API,
/// use [`color_eyre::Report::downcast_ref`] to inspect the kind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error(
    "`{compiler}` could not be found on the system path. \
     Please ensure that you've properly installed the LESS compiler (http://lesscss.org/)."
  )]
  CompilerMissing { compiler: Utf8PathBuf },

  #[error("couldn't create destination directory {path}")]
  CreateDir {
    path: Utf8PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("couldn't read {path}")]
  Read {
    path: Utf8PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("couldn't write {path}")]
  Write {
    path: Utf8PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("couldn't run `{compiler}`")]
  Spawn {
    compiler: Utf8PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("`{compiler}` exited with {status} while compiling {source_file}")]
  CompilerFailed {
    compiler: Utf8PathBuf,
    source_file: Utf8PathBuf,
    status: ExitStatus,
  },

  #[error("source dir {0:?} does not exist, or is not a directory path")]
  SourceDirMissing(Utf8PathBuf),

  #[error("no {0} was provided")]
  MissingParam(&'static str),

  #[error("path {0:?} is not valid UTF-8")]
  NonUtf8Path(std::path::PathBuf),
}
