use std::{fs, path::Path};

use crate::error::{FileSystemError, FileSystemResult};

/// Removes the specified file or directory.
///
/// A path that does not exist is not an error. Directories are removed recursively.
///
/// # Errors
///
/// Returns a [`FileSystemError::Remove`] if the removal fails for any reason other than
/// the path not existing.
pub fn safe_remove<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(());
    }

    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    result.map_err(|err| {
        FileSystemError::Remove {
            path: path.to_path_buf(),
            source: err,
        }
    })
}

/// Creates a directory structure if it doesn't exist.
///
/// # Errors
///
/// * [`FileSystemError::CreateDir`] if the directory could not be created.
/// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path).map_err(|err| {
            FileSystemError::CreateDir {
                path: path.to_path_buf(),
                source: err,
            }
        })?;
    } else if !path.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Reads a whole file into memory.
pub fn read_file<P: AsRef<Path>>(path: P) -> FileSystemResult<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|err| {
        FileSystemError::Read {
            path: path.to_path_buf(),
            source: err,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_safe_remove_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("pkg-1.0.tar.gz");
        fs::write(&file, b"data").unwrap();

        safe_remove(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_safe_remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        assert!(safe_remove(dir.path().join("missing")).is_ok());
    }

    #[test]
    fn test_safe_remove_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("f"), b"x").unwrap();

        safe_remove(dir.path().join("a")).unwrap();
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn test_ensure_dir_exists() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("tmp/downloads");

        ensure_dir_exists(&target).unwrap();
        assert!(target.is_dir());
        ensure_dir_exists(&target).unwrap();
    }

    #[test]
    fn test_ensure_dir_exists_on_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();

        let result = ensure_dir_exists(&file);
        assert!(matches!(result, Err(FileSystemError::NotADirectory { .. })));
    }

    #[test]
    fn test_read_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"loldongs\n").unwrap();

        assert_eq!(read_file(&file).unwrap(), b"loldongs\n");
        assert!(matches!(
            read_file(dir.path().join("missing")),
            Err(FileSystemError::Read { .. })
        ));
    }
}
