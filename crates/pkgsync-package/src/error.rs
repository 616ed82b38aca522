//! Error types for the package crate.

use std::path::PathBuf;

use miette::Diagnostic;
use pkgsync_utils::error::FileSystemError;
use thiserror::Error;

/// Errors that can occur while inspecting a distribution.
#[derive(Error, Diagnostic, Debug)]
pub enum PackageError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(pkgsync_package::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error("Invalid distribution {}: {reason}", .path.display())]
    #[diagnostic(
        code(pkgsync_package::invalid_distribution),
        help("Distribution files must be named `<name>-<version>.<ext>` or `<name>-<version>-pyX.Y.egg`")
    )]
    InvalidDistribution { path: PathBuf, reason: String },

    #[error("Invalid PKG-INFO: {0}")]
    #[diagnostic(code(pkgsync_package::invalid_pkg_info))]
    InvalidPkgInfo(String),

    #[error(transparent)]
    #[diagnostic(code(pkgsync_package::zip))]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),
}

/// A specialized Result type for package operations.
pub type Result<T> = std::result::Result<T, PackageError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            PackageError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
