use std::{fmt, fs::File, io::Read, path::Path, str::FromStr};

use md5::{Digest, Md5};
use sha2::{Sha256, Sha512};

use crate::error::{DigestError, DigestResult};

/// Read size used when streaming a file through a digest: 128 MD5 blocks.
pub const CHUNK_SIZE: usize = 128 * 64;

/// Digest algorithms that can appear in an index link fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => {
                Err(DigestError::UnknownAlgorithm {
                    name: s.to_string(),
                })
            }
        }
    }
}

fn stream_digest<D: Digest, R: Read>(mut reader: R) -> std::io::Result<String>
where
    md5::digest::Output<D>: fmt::LowerHex,
{
    let mut hasher = D::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hex digest of an in-memory buffer.
pub fn digest_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    match algorithm {
        DigestAlgorithm::Md5 => format!("{:x}", Md5::digest(data)),
        DigestAlgorithm::Sha256 => format!("{:x}", Sha256::digest(data)),
        DigestAlgorithm::Sha512 => format!("{:x}", Sha512::digest(data)),
    }
}

/// Calculates the checksum of a file.
///
/// The file is read in [`CHUNK_SIZE`] pieces so that large artifacts are never held in
/// memory as a whole. The result is a lowercase hex string.
///
/// # Errors
///
/// * [`DigestError::Unreadable`] if the file cannot be opened or read.
///
/// # Example
///
/// ```no_run
/// use pkgsync_utils::error::DigestResult;
/// use pkgsync_utils::hash::{calculate_checksum, DigestAlgorithm};
///
/// fn main() -> DigestResult<()> {
///     let checksum = calculate_checksum("/tmp/pkg-1.0.tar.gz", DigestAlgorithm::Md5)?;
///     println!("Checksum is {}", checksum);
///     Ok(())
/// }
/// ```
pub fn calculate_checksum<P: AsRef<Path>>(
    file_path: P,
    algorithm: DigestAlgorithm,
) -> DigestResult<String> {
    let file_path = file_path.as_ref();
    let read_failed = |err| {
        DigestError::Unreadable {
            path: file_path.to_path_buf(),
            source: err,
        }
    };

    let file = File::open(file_path).map_err(read_failed)?;
    let digest = match algorithm {
        DigestAlgorithm::Md5 => stream_digest::<Md5, _>(file),
        DigestAlgorithm::Sha256 => stream_digest::<Sha256, _>(file),
        DigestAlgorithm::Sha512 => stream_digest::<Sha512, _>(file),
    };
    digest.map_err(read_failed)
}

/// Verifies the checksum of a file against an expected value.
///
/// The comparison is case-insensitive. Returns the computed digest alongside the result so
/// callers can report both values on mismatch.
pub fn verify_checksum<P: AsRef<Path>>(
    file_path: P,
    algorithm: DigestAlgorithm,
    expected: &str,
) -> DigestResult<(bool, String)> {
    let actual = calculate_checksum(file_path, algorithm)?;
    Ok((actual.eq_ignore_ascii_case(expected), actual))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_calculate_checksum_md5() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"loldongs\n").unwrap();

        let checksum = calculate_checksum(file.path(), DigestAlgorithm::Md5).unwrap();
        assert_eq!(checksum, "9f8d067fdb2373a64b4c3e420f31f4cc");
    }

    #[test]
    fn test_calculate_checksum_sha256() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world\n").unwrap();

        let checksum = calculate_checksum(file.path(), DigestAlgorithm::Sha256).unwrap();
        assert_eq!(
            checksum,
            "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447"
        );
    }

    #[test]
    fn test_streaming_matches_in_memory() {
        let data: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        for algorithm in [
            DigestAlgorithm::Md5,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha512,
        ] {
            assert_eq!(
                calculate_checksum(file.path(), algorithm).unwrap(),
                digest_bytes(algorithm, &data)
            );
        }
    }

    #[test]
    fn test_verify_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"loldongs\n").unwrap();

        let (ok, _) = verify_checksum(
            file.path(),
            DigestAlgorithm::Md5,
            "9F8D067FDB2373A64B4C3E420F31F4CC",
        )
        .unwrap();
        assert!(ok);

        let (ok, actual) =
            verify_checksum(file.path(), DigestAlgorithm::Md5, "not-the-digest").unwrap();
        assert!(!ok);
        assert_eq!(actual, "9f8d067fdb2373a64b4c3e420f31f4cc");
    }

    #[test]
    fn test_calculate_checksum_file_not_found() {
        let result = calculate_checksum("/path/to/nonexistent/file", DigestAlgorithm::Md5);
        assert!(matches!(result, Err(DigestError::Unreadable { .. })));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("MD5".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Md5);
        assert_eq!(
            "sha256".parse::<DigestAlgorithm>().unwrap(),
            DigestAlgorithm::Sha256
        );
        assert!("crc32".parse::<DigestAlgorithm>().is_err());
    }
}
