//! Repository access for pkgsync.
//!
//! A [`Repository`] reads the simple index of a package repository and talks the legacy
//! form-based registration and upload protocol. Index pages are reduced to anchors
//! ([`links`]), anchors to [`RemoteDistribution`]s, and those are filtered with
//! [`ReleaseSpecifier`]s under the ordering of [`Version`].
//!
//! # Example
//!
//! ```no_run
//! use pkgsync_registry::{ReleaseSpecifier, Repository};
//!
//! fn newest(spec: &str) -> pkgsync_registry::Result<()> {
//!     let repo = Repository::new("https://pypi.org", None);
//!     let spec = ReleaseSpecifier::parse(spec)?;
//!     for dist in repo.distributions(&spec, &[], true)? {
//!         println!("{} {}", dist.basename(), dist.url());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod links;
pub mod remote;
pub mod repository;
pub mod specifier;
pub mod upload;
pub mod version;

pub use error::{RegistryError, Result};
pub use remote::{diff, ContentDigest, RemoteDistribution};
pub use repository::Repository;
pub use specifier::ReleaseSpecifier;
pub use version::Version;
