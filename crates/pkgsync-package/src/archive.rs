//! Archive kinds and container detection.

use std::{
    fmt,
    fs::File,
    io::Read,
    path::Path,
    sync::LazyLock,
};

use regex::Regex;

use crate::error::{ErrorContext, PackageError, Result};

/// Magic bytes for gzip streams.
pub const GZIP_MAGIC_BYTES: [u8; 2] = [0x1f, 0x8b];

/// Magic bytes for zip archives (local file header).
pub const ZIP_MAGIC_BYTES: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// Magic bytes for bzip2 streams.
pub const BZIP2_MAGIC_BYTES: [u8; 3] = [0x42, 0x5a, 0x68];

/// Source archive extensions, longest first so `.tar.gz` wins over `.gz`-like suffixes.
pub const SDIST_EXTENSIONS: [&str; 4] = [".tar.bz2", ".tar.gz", ".tgz", ".zip"];

pub const EGG_EXTENSION: &str = ".egg";

/// What kind of distribution an artifact is, judged by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// `.tar.gz` or `.tgz` source archive.
    TarGz,
    /// `.tar.bz2` source archive.
    TarBz2,
    /// `.zip` source archive.
    Zip,
    /// Platform-tagged binary egg.
    Egg,
}

impl ArchiveKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            ".tar.gz" | ".tgz" => Some(ArchiveKind::TarGz),
            ".tar.bz2" => Some(ArchiveKind::TarBz2),
            ".zip" => Some(ArchiveKind::Zip),
            ".egg" => Some(ArchiveKind::Egg),
            _ => None,
        }
    }

    /// Splits a basename into its stem and archive kind.
    pub fn split_basename(basename: &str) -> Option<(&str, Self)> {
        let lower = basename.to_ascii_lowercase();
        SDIST_EXTENSIONS
            .iter()
            .chain(std::iter::once(&EGG_EXTENSION))
            .find(|ext| lower.ends_with(*ext))
            .and_then(|ext| {
                let stem = &basename[..basename.len() - ext.len()];
                Self::from_extension(ext).map(|kind| (stem, kind))
            })
    }

    /// `filetype` value sent on upload.
    pub fn filetype(&self) -> &'static str {
        match self {
            ArchiveKind::Egg => "bdist_egg",
            _ => "sdist",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::TarBz2 => "tar.bz2",
            ArchiveKind::Zip => "zip",
            ArchiveKind::Egg => "egg",
        };
        f.write_str(s)
    }
}

/// Container format detected from the first bytes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Gzip,
    Zip,
    Bzip2,
    Unknown,
}

/// Detects the container format by reading magic bytes.
pub fn detect_container<R: Read>(reader: &mut R) -> Result<ContainerFormat> {
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        let n = reader
            .read(&mut magic[filled..])
            .with_context(|| "reading magic bytes".to_string())?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    let magic = &magic[..filled];

    let format = if magic.starts_with(&ZIP_MAGIC_BYTES) {
        ContainerFormat::Zip
    } else if magic.starts_with(&GZIP_MAGIC_BYTES) {
        ContainerFormat::Gzip
    } else if magic.starts_with(&BZIP2_MAGIC_BYTES) {
        ContainerFormat::Bzip2
    } else {
        ContainerFormat::Unknown
    };

    Ok(format)
}

pub fn detect_container_at(path: &Path) -> Result<ContainerFormat> {
    let mut file =
        File::open(path).with_context(|| format!("opening {}", path.display()))?;
    detect_container(&mut file)
}

/// Name, version and tags recovered from a distribution file name alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameParts {
    pub name: String,
    pub version: String,
    pub kind: ArchiveKind,
    /// Python version tag of an egg, e.g. `2.7` for `-py2.7.egg`.
    pub pyversion: Option<String>,
    pub platform: Option<String>,
}

static SDIST_STEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+?)-(?P<version>\d.*)$").expect("unable to compile sdist name regex")
});

static EGG_STEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>.+?)-(?P<version>\d[^-]*)-py(?P<pyversion>[\d.]+)(?:-(?P<platform>.+))?$",
    )
    .expect("unable to compile egg name regex")
});

/// Parses `name-version.ext` or `name-version-pyX.Y[-platform].egg` without knowing the
/// package name in advance. The name ends at the first `-` followed by a digit.
pub fn parse_filename(basename: &str) -> Result<FilenameParts> {
    let invalid = |reason: &str| {
        PackageError::InvalidDistribution {
            path: basename.into(),
            reason: reason.to_string(),
        }
    };

    let (stem, kind) =
        ArchiveKind::split_basename(basename).ok_or_else(|| invalid("unknown archive extension"))?;

    let regex = match kind {
        ArchiveKind::Egg => &*EGG_STEM_RE,
        _ => &*SDIST_STEM_RE,
    };
    let caps = regex
        .captures(stem)
        .ok_or_else(|| invalid("cannot split name and version"))?;

    Ok(FilenameParts {
        name: caps["name"].to_string(),
        version: caps["version"].to_string(),
        kind,
        pyversion: caps.name("pyversion").map(|m| m.as_str().to_string()),
        platform: caps.name("platform").map(|m| m.as_str().to_string()),
    })
}
