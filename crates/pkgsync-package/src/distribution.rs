use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use pkgsync_utils::{
    fs::read_file,
    hash::{digest_bytes, DigestAlgorithm},
};

use crate::error::Result;

/// A distribution file on local disk.
///
/// Content and MD5 digest are read on first use and then kept for the lifetime of the
/// value, since the upload needs both.
#[derive(Debug)]
pub struct LocalDistribution {
    path: PathBuf,
    content: OnceLock<Vec<u8>>,
    md5_digest: OnceLock<String>,
}

impl LocalDistribution {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: OnceLock::new(),
            md5_digest: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn content(&self) -> Result<&[u8]> {
        if let Some(content) = self.content.get() {
            return Ok(content.as_slice());
        }
        let data = read_file(&self.path)?;
        Ok(self.content.get_or_init(|| data).as_slice())
    }

    pub fn md5_digest(&self) -> Result<&str> {
        if let Some(digest) = self.md5_digest.get() {
            return Ok(digest.as_str());
        }
        let digest = digest_bytes(DigestAlgorithm::Md5, self.content()?);
        Ok(self.md5_digest.get_or_init(|| digest).as_str())
    }
}
