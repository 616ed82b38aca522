//! Distribution archives and the metadata derived from them.
//!
//! A [`LocalDistribution`] is an artifact downloaded to disk. [`Metadata::from_distribution`]
//! reads its embedded `PKG-INFO` when possible and otherwise falls back to what the file
//! name says. Either way the result yields the registration and upload payloads of the
//! legacy upload protocol.
//!
//! # Example
//!
//! ```no_run
//! use pkgsync_package::{LocalDistribution, Metadata, PackageError};
//!
//! fn describe(path: &str) -> Result<(), PackageError> {
//!     let dist = LocalDistribution::new(path);
//!     let meta = Metadata::from_distribution(&dist)?;
//!     println!("{} {}", meta.name(), meta.version());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod distribution;
pub mod error;
pub mod metadata;
pub mod payload;
pub mod pkginfo;

pub use archive::{ArchiveKind, ContainerFormat};
pub use distribution::LocalDistribution;
pub use error::{ErrorContext, PackageError, Result};
pub use metadata::Metadata;
pub use payload::{FieldValue, Payload};
pub use pkginfo::PkgInfo;
