//! Distributions as listed on a repository's index page.

use std::{collections::HashSet, fmt, path::Path, sync::Arc};

use pkgsync_dl::{
    auth::Credentials,
    download::Download,
    transport::Transport,
    utils::{basename_from_href, join_url, split_fragment},
};
use pkgsync_package::{ArchiveKind, LocalDistribution};
use pkgsync_utils::hash::{verify_checksum, DigestAlgorithm};
use regex::Regex;
use tracing::{debug, warn};

use crate::{
    error::{RegistryError, Result},
    version::Version,
};

/// Digest advertised in a link fragment such as `#md5=...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    pub algorithm: DigestAlgorithm,
    pub hex: String,
}

impl ContentDigest {
    /// Reads `algo=hex`. Unknown algorithms are logged and ignored.
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let (algorithm, hex) = fragment.split_once('=')?;
        let hex = hex.trim();
        if hex.is_empty() {
            return None;
        }
        match algorithm.parse::<DigestAlgorithm>() {
            Ok(algorithm) => {
                Some(Self {
                    algorithm,
                    hex: hex.to_ascii_lowercase(),
                })
            }
            Err(err) => {
                warn!("ignoring link digest: {err}");
                None
            }
        }
    }
}

/// What a distribution's basename says about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub version: String,
    pub kind: ArchiveKind,
    /// The `pyX.Y[-platform]` tag of an egg.
    pub platform: Option<String>,
}

fn name_pattern(package_name: &str) -> String {
    package_name
        .chars()
        .map(|c| {
            match c {
                '-' | '_' | '.' => "[-_.]".to_string(),
                c => regex::escape(&c.to_string()),
            }
        })
        .collect()
}

/// Splits `basename` into version and archive kind, given the package it should belong to.
///
/// The package name matches case-insensitively, with `-`, `_` and `.` interchangeable.
///
/// # Errors
///
/// [`RegistryError::InvalidRemoteDistribution`] when the basename is not a supported
/// archive of `package_name`.
pub fn parse_identity(package_name: &str, basename: &str) -> Result<Identity> {
    let invalid = || {
        RegistryError::InvalidRemoteDistribution {
            package: package_name.to_string(),
            basename: basename.to_string(),
        }
    };

    // Versions start with a digit, so `pkgsync-extra-1.0` is not a `pkgsync` release.
    let name = name_pattern(package_name);
    let is_egg = basename.to_ascii_lowercase().ends_with(".egg");
    let pattern = if is_egg {
        format!(r"(?i)^{name}-(?P<version>\d[^-]*)-(?P<platform>py[\d.]+(?:-.+)?)\.egg$")
    } else {
        format!(r"(?i)^{name}-(?P<version>\d.*)(?P<ext>\.zip|\.tgz|\.tar\.gz|\.tar\.bz2)$")
    };
    let parser = Regex::new(&pattern).map_err(|_| invalid())?;
    let caps = parser.captures(basename).ok_or_else(invalid)?;

    let kind = match caps.name("ext") {
        Some(ext) => ArchiveKind::from_extension(ext.as_str()).ok_or_else(invalid)?,
        None => ArchiveKind::Egg,
    };

    Ok(Identity {
        version: caps["version"].to_string(),
        kind,
        platform: caps.name("platform").map(|m| m.as_str().to_string()),
    })
}

/// A downloadable artifact of one package on a remote repository.
#[derive(Clone)]
pub struct RemoteDistribution {
    package_name: String,
    basename: String,
    version: Version,
    kind: ArchiveKind,
    platform: Option<String>,
    url: String,
    digest: Option<ContentDigest>,
    credentials: Option<Credentials>,
    transport: Arc<dyn Transport>,
}

impl RemoteDistribution {
    /// Builds a distribution from an `href` found on `index_url`.
    ///
    /// The basename is the percent-decoded last path segment of the href. The digest comes
    /// from its fragment, and the download URL is the href resolved against the index page.
    pub fn from_href(
        package_name: &str,
        index_url: &str,
        href: &str,
        credentials: Option<Credentials>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let basename = basename_from_href(href);
        let identity = parse_identity(package_name, &basename)?;

        let (location, fragment) = split_fragment(href);
        let digest = fragment.and_then(ContentDigest::from_fragment);
        let url = join_url(index_url, location)
            .ok_or_else(|| RegistryError::InvalidUrl(format!("{href} on {index_url}")))?;

        Ok(Self {
            package_name: package_name.to_string(),
            basename,
            version: Version::parse(&identity.version),
            kind: identity.kind,
            platform: identity.platform,
            url,
            digest,
            credentials,
            transport,
        })
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn digest(&self) -> Option<&ContentDigest> {
        self.digest.as_ref()
    }

    /// Downloads into `destination_dir/<basename>` and verifies the advertised digest.
    ///
    /// The file is left in place on a mismatch; removing it is up to the caller.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::Download`] on transport failures and non-2xx responses.
    /// * [`RegistryError::DigestMismatch`] if the content does not match the link digest.
    pub fn download(&self, destination_dir: &Path) -> Result<LocalDistribution> {
        let path = destination_dir.join(&self.basename);
        debug!("fetching {} to {}", self.url, path.display());

        Download::new(self.url.as_str(), &path)
            .credentials(self.credentials.clone())
            .execute(self.transport.as_ref())?;

        match &self.digest {
            Some(digest) => {
                let (valid, actual) = verify_checksum(&path, digest.algorithm, &digest.hex)?;
                if !valid {
                    return Err(RegistryError::DigestMismatch {
                        path,
                        expected: digest.hex.clone(),
                        actual,
                    });
                }
                debug!("verified {} digest of {}", digest.algorithm, self.basename);
            }
            None => debug!("no digest advertised for {}", self.basename),
        }

        Ok(LocalDistribution::new(path))
    }
}

impl fmt::Debug for RemoteDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDistribution")
            .field("package_name", &self.package_name)
            .field("basename", &self.basename)
            .field("version", &self.version.as_str())
            .field("url", &self.url)
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RemoteDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.basename)
    }
}

/// Distributions in `a` whose basename does not appear in `b`.
pub fn diff(a: &[RemoteDistribution], b: &[RemoteDistribution]) -> Vec<RemoteDistribution> {
    let present: HashSet<&str> = b.iter().map(|d| d.basename()).collect();
    a.iter()
        .filter(|d| !present.contains(d.basename()))
        .cloned()
        .collect()
}
