//! Buildout-style version pin files.
//!
//! ```ini
//! [buildout]
//! versions = pinned
//!
//! [pinned]
//! iw.fss = 2.7.1
//! zc.buildout = 1.4.3
//! ```

use std::collections::BTreeMap;

use ini::Ini;
use tracing::debug;

use crate::error::{ConfigError, Result};

pub const DEFAULT_VERSIONS_SECTION: &str = "versions";

/// Parses a pin file into a package name to version mapping.
///
/// The section read is the one named by `[buildout] versions`, or `[versions]` when that
/// option is absent. Package names keep their case.
///
/// # Errors
///
/// * [`ConfigError::VersionsParse`] if the content is not valid INI.
/// * [`ConfigError::NoVersionsSection`] if the selected section does not exist.
pub fn parse_versions(content: &str) -> Result<BTreeMap<String, String>> {
    let ini =
        Ini::load_from_str(content).map_err(|err| ConfigError::VersionsParse(err.to_string()))?;

    let section_name = ini
        .section(Some("buildout"))
        .and_then(|buildout| buildout.get("versions"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_VERSIONS_SECTION)
        .to_string();

    let section = ini
        .section(Some(section_name.as_str()))
        .ok_or_else(|| ConfigError::NoVersionsSection(section_name.clone()))?;

    let versions: BTreeMap<String, String> = section
        .iter()
        .map(|(name, version)| (name.trim().to_string(), version.trim().to_string()))
        .filter(|(name, version)| !name.is_empty() && !version.is_empty())
        .collect();

    debug!(
        "read {} pinned versions from section [{}]",
        versions.len(),
        section_name
    );

    Ok(versions)
}
