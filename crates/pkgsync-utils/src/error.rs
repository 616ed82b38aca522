//! Low-level failures raised while handling artifacts on local disk.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Failures computing or verifying the digest of a downloaded artifact.
#[derive(Error, Diagnostic, Debug)]
pub enum DigestError {
    #[error("Cannot digest `{}`", .path.display())]
    #[diagnostic(code(pkgsync_utils::digest::unreadable))]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported digest algorithm `{name}`")]
    #[diagnostic(
        code(pkgsync_utils::digest::unknown_algorithm),
        help("Index links may carry #md5=, #sha256= or #sha512= fragments")
    )]
    UnknownAlgorithm { name: String },
}

/// Failures managing the scratch directory and the artifacts inside it.
#[derive(Error, Diagnostic, Debug)]
pub enum FileSystemError {
    #[error("Cannot remove `{}`", .path.display())]
    #[diagnostic(code(pkgsync_utils::fs::remove))]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read artifact `{}`", .path.display())]
    #[diagnostic(code(pkgsync_utils::fs::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create scratch directory `{}`", .path.display())]
    #[diagnostic(
        code(pkgsync_utils::fs::create_dir),
        help("Point tmp_dir at a writable location")
    )]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scratch path `{}` exists and is not a directory", .path.display())]
    #[diagnostic(code(pkgsync_utils::fs::not_a_directory))]
    NotADirectory { path: PathBuf },
}

/// Failures resolving paths taken from the command line or config file.
#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("Empty path")]
    #[diagnostic(code(pkgsync_utils::path::empty))]
    Empty,

    #[error("`${var}` is not set (while expanding `{input}`)")]
    #[diagnostic(code(pkgsync_utils::path::unset_variable))]
    UnsetVariable { var: String, input: String },

    #[error("Cannot determine the working directory")]
    #[diagnostic(code(pkgsync_utils::path::working_directory))]
    WorkingDirectory {
        #[source]
        source: std::io::Error,
    },
}

pub type DigestResult<T> = std::result::Result<T, DigestError>;
pub type FileSystemResult<T> = std::result::Result<T, FileSystemError>;
pub type PathResult<T> = std::result::Result<T, PathError>;
