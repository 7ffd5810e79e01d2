//! Download checksum calculation and comparison.
//!
//! The digest algorithm is chosen from the expected value: 32 hex digits
//! means MD5, 64 means SHA-256. Comparison ignores case and separator
//! punctuation, so `D4:1D:8C...` matches `d41d8c...`.

use crate::error::{Error, ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Supported digest algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChecksumKind {
    Md5,
    Sha256,
}

impl ChecksumKind {
    /// Infers the algorithm from an expected digest.
    pub fn detect(expected: &str) -> Result<Self> {
        let normalized = normalize(expected);
        if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Config(format!(
                "checksum {expected:?} is not a hex digest"
            )));
        }
        match normalized.len() {
            32 => Ok(Self::Md5),
            64 => Ok(Self::Sha256),
            n => Err(Error::Config(format!(
                "checksum {expected:?} has {n} hex digits, expected 32 (MD5) or 64 (SHA-256)"
            ))),
        }
    }
}

/// Lowercases a digest and drops separator punctuation.
pub fn normalize(digest: &str) -> String {
    digest
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '_' | ' ' | '\t' | '\r' | '\n'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// True when both digests are equal after normalization.
pub fn digests_match(computed: &str, expected: &str) -> bool {
    normalize(computed) == normalize(expected)
}

/// Computes the hex digest of a file's full contents, streamed in 8KB chunks.
pub async fn file_digest(path: &Path, kind: ChecksumKind) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening download for hashing", path)?;
    let mut md5 = md5::Context::new();
    let mut sha256 = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading download for hashing", path)?;
        if n == 0 {
            break;
        }
        match kind {
            ChecksumKind::Md5 => md5.consume(&buffer[..n]),
            ChecksumKind::Sha256 => sha256.update(&buffer[..n]),
        }
    }

    Ok(match kind {
        ChecksumKind::Md5 => format!("{:x}", md5.finalize()),
        ChecksumKind::Sha256 => hex::encode(sha256.finalize()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn detects_algorithm_from_length() {
        assert_eq!(ChecksumKind::detect(EMPTY_MD5).unwrap(), ChecksumKind::Md5);
        assert_eq!(ChecksumKind::detect(EMPTY_SHA256).unwrap(), ChecksumKind::Sha256);
        assert!(ChecksumKind::detect("abc").is_err());
        assert!(ChecksumKind::detect("zz1d8cd98f00b204e9800998ecf8427e").is_err());
    }

    #[test]
    fn comparison_ignores_case_and_separators() {
        assert!(digests_match(
            EMPTY_MD5,
            "D4:1D:8C:D9:8F:00:B2:04:E9:80:09:98:EC:F8:42:7E"
        ));
        assert!(digests_match(EMPTY_MD5, "d41d8cd9-8f00b204-e9800998-ecf8427e"));
        assert!(!digests_match(EMPTY_MD5, EMPTY_SHA256));
    }

    #[tokio::test]
    async fn digests_span_multiple_read_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.msi");
        let content = vec![0x5au8; 20_000];
        std::fs::write(&path, &content).unwrap();

        assert_eq!(
            file_digest(&path, ChecksumKind::Md5).await.unwrap(),
            format!("{:x}", md5::compute(&content))
        );
        assert_eq!(
            file_digest(&path, ChecksumKind::Sha256).await.unwrap(),
            hex::encode(Sha256::digest(&content))
        );
    }

    #[tokio::test]
    async fn empty_file_digests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.msi");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(file_digest(&path, ChecksumKind::Md5).await.unwrap(), EMPTY_MD5);
        assert_eq!(
            file_digest(&path, ChecksumKind::Sha256).await.unwrap(),
            EMPTY_SHA256
        );
    }
}
