//! Content hashing for duplicate detection.
//!
//! Two files are the same document iff their SHA-256 digests of the full byte
//! stream are equal. Files are read in fixed-size chunks so memory stays
//! bounded for large scans.

use crate::error::{JdexError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files (1MB).
const CHUNK_SIZE: usize = 1024 * 1024;

/// SHA-256 of a file's full contents as lowercase hex.
pub fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            JdexError::FileNotFound(path.to_path_buf())
        } else {
            JdexError::io_with_path(e, path)
        }
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| JdexError::io_with_path(e, path))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// [`hash_file`] on the blocking pool.
pub async fn hash_file_async(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || hash_file(&path))
        .await
        .map_err(|e| JdexError::Other(format!("Hash computation task failed: {}", e)))?
}

/// SHA-256 of an in-memory buffer as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digest() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        assert_eq!(
            hash_file(file.path()).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_multi_chunk_matches_in_memory() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        assert_eq!(hash_file(file.path()).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn test_missing_file() {
        let err = hash_file("/nonexistent/jdex/file.pdf").unwrap_err();
        assert!(matches!(err, JdexError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"receipt").unwrap();
        file.flush().unwrap();

        assert_eq!(
            hash_file_async(file.path()).await.unwrap(),
            hash_file(file.path()).unwrap()
        );
    }
}
