//! Error types for pkgsync-core.

use miette::Diagnostic;
use pkgsync_config::error::ConfigError;
use pkgsync_utils::error::{DigestError, FileSystemError, PathError};
use thiserror::Error;

/// Umbrella error for everything a sync run can fail with.
#[derive(Error, Diagnostic, Debug)]
pub enum PkgsyncError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] pkgsync_registry::RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] pkgsync_dl::error::DownloadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] pkgsync_package::PackageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Digest(#[from] DigestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error("Error while {action}")]
    #[diagnostic(code(pkgsync::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Nothing to sync")]
    #[diagnostic(
        code(pkgsync::no_specifications),
        help("Pass package specifiers, --all-packages or --versions-file")
    )]
    NoSpecifications,

    #[error("Conflicting package selection: {0}")]
    #[diagnostic(
        code(pkgsync::conflicting_selection),
        help("Use only one of package specifiers, --all-packages or --versions-file")
    )]
    ConflictingSelection(String),

    #[error("Interrupted")]
    #[diagnostic(code(pkgsync::interrupted))]
    Interrupted,

    #[error("{0}")]
    #[diagnostic(code(pkgsync::error))]
    Custom(String),
}

impl PkgsyncError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Registry(err) => err.is_unauthorized(),
            Self::Download(pkgsync_dl::error::DownloadError::Unauthorized { .. }) => true,
            _ => false,
        }
    }
}

pub type PkgsyncResult<T> = std::result::Result<T, PkgsyncError>;

pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> PkgsyncResult<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> PkgsyncResult<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            PkgsyncError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
