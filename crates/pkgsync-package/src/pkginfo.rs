//! `PKG-INFO` parsing and extraction from distribution archives.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Component, Path},
};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::{
    archive::{detect_container_at, ContainerFormat},
    error::{ErrorContext, PackageError, Result},
};

pub const PKG_INFO: &str = "PKG-INFO";

/// Core metadata fields as written by distutils/setuptools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgInfo {
    pub metadata_version: Option<String>,
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub home_page: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub license: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub platforms: Vec<String>,
    pub classifiers: Vec<String>,
    pub download_url: Option<String>,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub obsoletes: Vec<String>,
}

/// Splits a keywords header on commas, or on whitespace when there is a single item.
pub fn split_keywords(raw: &str) -> Vec<String> {
    let mut parts: Vec<&str> = raw.split(',').collect();
    if parts.len() == 1 {
        parts = raw.split_whitespace().collect();
    }
    parts
        .into_iter()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

fn unfold(line: &str) -> &str {
    line.strip_prefix("        ")
        .or_else(|| line.strip_prefix("       |"))
        .unwrap_or_else(|| line.trim_start())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "UNKNOWN" {
        None
    } else {
        Some(value)
    }
}

impl PkgInfo {
    /// Parses RFC 822 style metadata.
    ///
    /// Continuation lines extend the previous header. Anything after the first blank line
    /// is the description, unless a `Description` header was already present.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut body = None;

        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            if line.trim().is_empty() {
                let rest: Vec<&str> = lines.by_ref().collect();
                body = Some(rest.join("\n"));
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                let (_, value) = headers.last_mut().ok_or_else(|| {
                    PackageError::InvalidPkgInfo("continuation line before any header".into())
                })?;
                value.push('\n');
                value.push_str(unfold(line));
                continue;
            }

            let (key, value) = line.split_once(':').ok_or_else(|| {
                PackageError::InvalidPkgInfo(format!("malformed header line `{line}`"))
            })?;
            headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
        }

        let mut info = PkgInfo::default();
        for (key, value) in headers {
            match key.as_str() {
                "metadata-version" => info.metadata_version = Some(value),
                "name" => info.name = value,
                "version" => info.version = value,
                "summary" => info.summary = non_empty(value),
                "home-page" => info.home_page = non_empty(value),
                "author" => info.author = non_empty(value),
                "author-email" => info.author_email = non_empty(value),
                "license" => info.license = non_empty(value),
                "description" => info.description = non_empty(value),
                "keywords" => info.keywords.extend(split_keywords(&value)),
                "platform" => info.platforms.push(value),
                "classifier" => info.classifiers.push(value),
                "download-url" => info.download_url = non_empty(value),
                "provides" => info.provides.push(value),
                "requires" => info.requires.push(value),
                "obsoletes" => info.obsoletes.push(value),
                _ => {}
            }
        }

        if info.description.is_none() {
            info.description = body.and_then(non_empty);
        }

        if info.name.is_empty() || info.version.is_empty() {
            return Err(PackageError::InvalidPkgInfo(
                "missing Name or Version".into(),
            ));
        }

        Ok(info)
    }
}

fn depth(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

fn is_pkg_info(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == PKG_INFO)
}

/// Keeps the shallowest `PKG-INFO` seen so far.
fn consider(best: &mut Option<(usize, String)>, path: &Path, content: String) {
    let d = depth(path);
    if best.as_ref().map_or(true, |(best_depth, _)| d < *best_depth) {
        *best = Some((d, content));
    }
}

fn read_from_tar_gz(path: &Path) -> Result<Option<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let mut best = None;

    let entries = archive
        .entries()
        .with_context(|| format!("reading tar entries of {}", path.display()))?;
    for entry in entries {
        let mut entry = entry.with_context(|| format!("reading tar entry of {}", path.display()))?;
        let entry_path = entry
            .path()
            .with_context(|| "decoding tar entry path".to_string())?
            .into_owned();
        if !is_pkg_info(&entry_path) {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .with_context(|| format!("reading {}", entry_path.display()))?;
        consider(&mut best, &entry_path, content);
    }

    Ok(best.map(|(_, content)| content))
}

fn read_from_zip(path: &Path) -> Result<Option<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    let mut best = None;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let entry_path = Path::new(entry.name()).to_path_buf();
        if !is_pkg_info(&entry_path) {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .with_context(|| format!("reading {}", entry_path.display()))?;
        consider(&mut best, &entry_path, content);
    }

    Ok(best.map(|(_, content)| content))
}

/// Reads the top-most `PKG-INFO` from a gzip tarball, zip or egg.
///
/// Returns `Ok(None)` when the archive has no `PKG-INFO` or is a container we cannot
/// read (bzip2).
pub fn read_pkg_info(path: &Path) -> Result<Option<String>> {
    match detect_container_at(path)? {
        ContainerFormat::Gzip => read_from_tar_gz(path),
        ContainerFormat::Zip => read_from_zip(path),
        format => {
            debug!("no structured metadata reader for {:?} ({})", format, path.display());
            Ok(None)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};
    use zip::write::SimpleFileOptions;

    use super::*;

    pub const SAMPLE: &str = "Metadata-Version: 1.1
Name: pkgsync
Version: 0.1.0
Summary: Synchronise packages between two python software repositories
Home-page: UNKNOWN
Author: Alex Holmes
Author-email: alex@example.com
License: BSD
Description: Line one
        Line two
Keywords: sync mirror pypi
Platform: UNKNOWN
Classifier: Development Status :: 3 - Alpha
Classifier: License :: OSI Approved :: BSD License
Requires: requests
";

    pub fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_parse_sample() {
        let info = PkgInfo::parse(SAMPLE).unwrap();

        assert_eq!(info.metadata_version.as_deref(), Some("1.1"));
        assert_eq!(info.name, "pkgsync");
        assert_eq!(info.version, "0.1.0");
        assert_eq!(info.home_page, None);
        assert_eq!(info.author.as_deref(), Some("Alex Holmes"));
        assert_eq!(info.description.as_deref(), Some("Line one\nLine two"));
        assert_eq!(info.keywords, vec!["sync", "mirror", "pypi"]);
        assert_eq!(info.platforms, vec!["UNKNOWN"]);
        assert_eq!(info.classifiers.len(), 2);
        assert_eq!(info.requires, vec!["requests"]);
        assert!(info.provides.is_empty());
    }

    #[test]
    fn test_parse_body_description() {
        let info =
            PkgInfo::parse("Metadata-Version: 2.1\nName: a\nVersion: 1\n\nLong\ntext\n").unwrap();
        assert_eq!(info.description.as_deref(), Some("Long\ntext"));
    }

    #[test]
    fn test_parse_requires_name_and_version() {
        assert!(PkgInfo::parse("Metadata-Version: 1.0\nName: a\n").is_err());
        assert!(PkgInfo::parse("not a header\n").is_err());
        assert!(PkgInfo::parse("  leading continuation\n").is_err());
    }

    #[test]
    fn test_split_keywords() {
        assert_eq!(split_keywords("a, b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_keywords("a b  c"), vec!["a", "b", "c"]);
        assert!(split_keywords("").is_empty());
    }

    #[test]
    fn test_read_pkg_info_tar_gz_prefers_top_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pkgsync-0.1.0.tar.gz");
        write_tar_gz(
            &path,
            &[
                ("pkgsync-0.1.0/pkgsync.egg-info/PKG-INFO", "Name: nested\nVersion: 9\n"),
                ("pkgsync-0.1.0/PKG-INFO", SAMPLE),
                ("pkgsync-0.1.0/setup.py", "from setuptools import setup\n"),
            ],
        );

        let content = read_pkg_info(&path).unwrap().unwrap();
        assert_eq!(PkgInfo::parse(&content).unwrap().name, "pkgsync");
    }

    #[test]
    fn test_read_pkg_info_egg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pkgsync-0.1.0-py2.7.egg");
        write_zip(
            &path,
            &[("pkgsync/__init__.py", ""), ("EGG-INFO/PKG-INFO", SAMPLE)],
        );

        let content = read_pkg_info(&path).unwrap().unwrap();
        assert_eq!(PkgInfo::parse(&content).unwrap().version, "0.1.0");
    }

    #[test]
    fn test_read_pkg_info_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pkg-1.0.zip");
        write_zip(&path, &[("pkg-1.0/setup.py", "")]);
        assert_eq!(read_pkg_info(&path).unwrap(), None);

        let plain = dir.path().join("pkg-1.0.tgz");
        std::fs::write(&plain, b"loldongs\n").unwrap();
        assert_eq!(read_pkg_info(&plain).unwrap(), None);
    }
}
