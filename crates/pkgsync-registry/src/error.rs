//! Error types for the registry crate.

use std::path::PathBuf;

use miette::Diagnostic;
use pkgsync_utils::error::DigestError;
use thiserror::Error;

/// Errors raised while talking to a repository or handling its distributions.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("`{basename}` is not a distribution of `{package}`")]
    #[diagnostic(code(pkgsync_registry::invalid_remote_distribution))]
    InvalidRemoteDistribution { package: String, basename: String },

    #[error("Digest mismatch for {}: expected {expected}, got {actual}", .path.display())]
    #[diagnostic(
        code(pkgsync_registry::digest_mismatch),
        help("The file may have been corrupted in transit or replaced on the server")
    )]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Authentication failed for {url} (HTTP {status})")]
    #[diagnostic(
        code(pkgsync_registry::unauthorized),
        help("Check the username and password for this repository\n{body}")
    )]
    Unauthorized {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected HTTP {status} from {url}")]
    #[diagnostic(code(pkgsync_registry::unexpected_status))]
    UnexpectedStatus { url: String, status: u16 },

    #[error("{action} rejected by {url} (HTTP {status})")]
    #[diagnostic(code(pkgsync_registry::upload_rejected), help("{body}"))]
    UploadRejected {
        action: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid release specifier `{0}`")]
    #[diagnostic(
        code(pkgsync_registry::invalid_specifier),
        help("Use forms like `name`, `name==1.0` or `name>=1.0,<2.0`")
    )]
    InvalidSpecifier(String),

    #[error("Invalid repository URL: {0}")]
    #[diagnostic(code(pkgsync_registry::invalid_url))]
    InvalidUrl(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] pkgsync_dl::error::DownloadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] pkgsync_package::PackageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Digest(#[from] DigestError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    /// Authentication failures surface the same way whichever layer noticed them.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            RegistryError::Unauthorized { .. }
                | RegistryError::Download(pkgsync_dl::error::DownloadError::Unauthorized { .. })
        )
    }
}
