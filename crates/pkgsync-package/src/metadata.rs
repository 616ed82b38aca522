use tracing::debug;

use crate::{
    archive::{parse_filename, ArchiveKind, FilenameParts},
    distribution::LocalDistribution,
    error::{PackageError, Result},
    payload::Payload,
    pkginfo::{read_pkg_info, PkgInfo},
};

pub const UNKNOWN: &str = "UNKNOWN";

/// Descriptive metadata of a distribution, ready to be turned into protocol payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    /// Read from the `PKG-INFO` embedded in the archive.
    Structured {
        info: PkgInfo,
        kind: ArchiveKind,
        pyversion: Option<String>,
    },
    /// Recovered from the file name when no usable `PKG-INFO` exists.
    FilenameDerived(FilenameParts),
}

fn or_unknown(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| UNKNOWN.to_string())
}

impl Metadata {
    /// Reads structured metadata, falling back to the file name.
    ///
    /// # Errors
    ///
    /// [`PackageError::InvalidDistribution`] when neither source yields a name and version.
    pub fn from_distribution(dist: &LocalDistribution) -> Result<Self> {
        match Self::structured(dist) {
            Ok(metadata) => Ok(metadata),
            Err(err) => {
                debug!(
                    "no structured metadata in {}: {err}; using file name",
                    dist.basename()
                );
                Self::from_filename(&dist.basename())
            }
        }
    }

    fn structured(dist: &LocalDistribution) -> Result<Self> {
        let basename = dist.basename();
        let (_, kind) = ArchiveKind::split_basename(&basename).ok_or_else(|| {
            PackageError::InvalidDistribution {
                path: dist.path().to_path_buf(),
                reason: "unknown archive extension".into(),
            }
        })?;

        let content = read_pkg_info(dist.path())?.ok_or_else(|| {
            PackageError::InvalidDistribution {
                path: dist.path().to_path_buf(),
                reason: "no PKG-INFO found".into(),
            }
        })?;
        let info = PkgInfo::parse(&content)?;

        let pyversion = match kind {
            ArchiveKind::Egg => parse_filename(&basename).ok().and_then(|p| p.pyversion),
            _ => None,
        };

        Ok(Metadata::Structured {
            info,
            kind,
            pyversion,
        })
    }

    pub fn from_filename(basename: &str) -> Result<Self> {
        parse_filename(basename).map(Metadata::FilenameDerived)
    }

    pub fn name(&self) -> &str {
        match self {
            Metadata::Structured { info, .. } => &info.name,
            Metadata::FilenameDerived(parts) => &parts.name,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Metadata::Structured { info, .. } => &info.version,
            Metadata::FilenameDerived(parts) => &parts.version,
        }
    }

    pub fn kind(&self) -> ArchiveKind {
        match self {
            Metadata::Structured { kind, .. } => *kind,
            Metadata::FilenameDerived(parts) => parts.kind,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Metadata::Structured { .. })
    }

    fn pyversion(&self) -> &str {
        match self {
            Metadata::Structured { pyversion, .. } => pyversion.as_deref().unwrap_or_default(),
            Metadata::FilenameDerived(parts) => parts.pyversion.as_deref().unwrap_or_default(),
        }
    }

    /// Fields for `:action=submit`.
    pub fn register_payload(&self) -> Payload {
        let payload = Payload::new().text(":action", "submit");

        match self {
            Metadata::Structured { info, .. } => {
                payload
                    .text(
                        "metadata_version",
                        info.metadata_version.as_deref().unwrap_or("1.0"),
                    )
                    .text("name", info.name.as_str())
                    .text("version", info.version.as_str())
                    .text("summary", or_unknown(&info.summary))
                    .text("home_page", or_unknown(&info.home_page))
                    .text("author", or_unknown(&info.author))
                    .text("author_email", or_unknown(&info.author_email))
                    .text("license", or_unknown(&info.license))
                    .text("description", or_unknown(&info.description))
                    .multi("keywords", info.keywords.clone())
                    .multi("platform", info.platforms.clone())
                    .multi("classifiers", info.classifiers.clone())
                    .text("download_url", or_unknown(&info.download_url))
                    .multi("provides", info.provides.clone())
                    .multi("requires", info.requires.clone())
                    .multi("obsoletes", info.obsoletes.clone())
            }
            Metadata::FilenameDerived(parts) => {
                payload
                    .text("metadata_version", "1.0")
                    .text("name", parts.name.as_str())
                    .text("version", parts.version.as_str())
                    .text("summary", UNKNOWN)
                    .text("home_page", UNKNOWN)
                    .text("author", UNKNOWN)
                    .text("author_email", UNKNOWN)
                    .text("license", UNKNOWN)
                    .text("description", UNKNOWN)
                    .multi("keywords", Vec::new())
                    .multi("platform", vec![UNKNOWN.to_string()])
                    .multi("classifiers", Vec::new())
                    .text("download_url", UNKNOWN)
                    .multi("provides", Vec::new())
                    .multi("requires", Vec::new())
                    .multi("obsoletes", Vec::new())
            }
        }
    }

    /// Fields for `:action=file_upload`, including the file itself.
    pub fn upload_payload(&self, dist: &LocalDistribution) -> Result<Payload> {
        let content = dist.content()?.to_vec();
        let md5_digest = dist.md5_digest()?.to_string();

        Ok(Payload::new()
            .text(":action", "file_upload")
            .text("protocol_version", "1")
            .text("name", self.name())
            .text("version", self.version())
            .text("filetype", self.kind().filetype())
            .text("pyversion", self.pyversion())
            .text("md5_digest", md5_digest)
            .file("content", dist.basename(), content))
    }
}
