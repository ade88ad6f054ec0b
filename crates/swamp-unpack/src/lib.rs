//! swamp-unpack — loader and linker for Swamp packages (spk3)
//!
//! Format (all integers big-endian):
//! ```text
//! RAFF header (9 bytes)
//! chunk "spk3"
//!   chunk "sti0"  type information, handed to a TypeInfoDecoder
//!   chunk "scd0"  code: seven marker-delimited sections, fixed order
//!     externals → declarations → booleans → integers → strings
//!     → resource names → bodies
//! ```
//!
//! Every decoded value is appended to one [`ConstantTable`]; bodies refer
//! to constants by table position. Functions are declared before any body
//! is read and defined in place afterwards, so a body may reference a
//! function whose own body comes later.
//!
//! API :
//! - [`load`] / [`load_file`] for the common case
//! - [`Session`] to plug in a custom [`TypeInfoDecoder`]
//! - [`listing`] for inspection output
//!
//! ```no_run
//! use swamp_runtime::Runtime;
//! use swamp_unpack::{load_file, UnpackOptions};
//!
//! let package = load_file("game.spk", Runtime::with_defaults(), UnpackOptions::default())?;
//! match package.entry_function() {
//!     Some(main) => println!("entry: {}", main.name),
//!     None => println!("no entry point"),
//! }
//! # Ok::<(), swamp_unpack::UnpackError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

use std::fs;
use std::path::Path;

use swamp_runtime::Binder;

pub mod constants;
mod decode;
pub mod error;
pub mod format;
pub mod listing;
pub mod package;
pub mod session;
pub mod type_info;

pub use constants::ConstantTable;
pub use error::{UnpackError, UnpackResult};
pub use format::Section;
pub use listing::PackageSummary;
pub use package::Package;
pub use session::{DeclarationWindow, Session, UnpackOptions};
pub use type_info::{RawTypeInfo, TypeInfoChunk, TypeInfoDecoder, TypeInfoError};

/// Loads a package from memory.
pub fn load<B: Binder>(bytes: &[u8], binder: B, options: UnpackOptions) -> UnpackResult<Package> {
    Session::new(binder, options).unpack(bytes)
}

/// Reads `path` whole, then [`load`]s it.
pub fn load_file<B: Binder>(path: impl AsRef<Path>, binder: B, options: UnpackOptions) -> UnpackResult<Package> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| UnpackError::Io { path: path.to_path_buf(), source })?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    load(&bytes, binder, options)
}

/* ─────────────────────────── Prelude ─────────────────────────── */

/// Import everything at once.
pub mod prelude {
    pub use crate::{
        load, load_file, ConstantTable, DeclarationWindow, Package, PackageSummary, RawTypeInfo, Section, Session,
        TypeInfoChunk, TypeInfoDecoder, TypeInfoError, UnpackError, UnpackOptions, UnpackResult,
    };
}
