//! Compiles trees of [LESS](https://lesscss.org/) stylesheets by shelling out to `lessc`.
//!
//! * Recursively looks for `.less` / `.lss` files in the source dir,
//!   and compiles them into the destination dir using the same directory structure.
//! * Plain `.css` files found alongside are copied verbatim.
//! * Outputs that are at least as new as their source are skipped.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
//!
//! ## Usage
//! An example build.rs
//! ```rust,no_run
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/examples/build.rs"))]
//! ```

pub use driver::{Less, compile, replace_less_suffix};
pub use error::Error;
pub use exe::{SearchPath, resolve_executable};
pub use params::*;
pub use scan::{SOURCE_SUFFIXES, find_sources};

mod driver;
mod error;
mod exe;
mod params;
mod scan;
