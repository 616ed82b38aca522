use miette::Diagnostic;
use pkgsync_utils::error::{FileSystemError, PathError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(pkgsync_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Invalid repository URL: {0}")]
    #[diagnostic(
        code(pkgsync_config::invalid_repository_url),
        help("Repository URLs must be absolute http:// or https:// URLs")
    )]
    InvalidRepositoryUrl(String),

    #[error("No destination repository configured")]
    #[diagnostic(
        code(pkgsync_config::missing_destination),
        help("Pass --destination-url or add a [destination] table to config.toml")
    )]
    MissingDestination,

    #[error("Invalid timeout: {0}")]
    #[diagnostic(
        code(pkgsync_config::invalid_timeout),
        help("Use a duration such as `30s`, `2m` or `1m30s`")
    )]
    InvalidTimeout(String),

    #[error("Failed to parse versions file: {0}")]
    #[diagnostic(
        code(pkgsync_config::versions_parse),
        help("Versions files use buildout INI syntax: `[versions]` followed by `name = version` lines")
    )]
    VersionsParse(String),

    #[error("No versions section `[{0}]` found")]
    #[diagnostic(
        code(pkgsync_config::no_versions_section),
        help("Add a [versions] section or point `[buildout] versions` at an existing section")
    )]
    NoVersionsSection(String),

    #[error("Invalid pin `{name} = {version}`")]
    #[diagnostic(
        code(pkgsync_config::invalid_pin),
        help("Each pin needs a project name and a version, e.g. `zc.buildout = 1.4.3`")
    )]
    InvalidPin { name: String, version: String },

    #[error("Unrecognised versions file location: {0}")]
    #[diagnostic(
        code(pkgsync_config::unrecognized_versions_uri),
        help("Use a local path, a file:// URI or an http(s):// URL")
    )]
    UnrecognizedVersionsUri(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(pkgsync_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::NoVersionsSection("versions".into()).to_string(),
            "No versions section `[versions]` found"
        );
        assert_eq!(
            ConfigError::UnrecognizedVersionsUri("ftp://x".into()).to_string(),
            "Unrecognised versions file location: ftp://x"
        );
    }
}
