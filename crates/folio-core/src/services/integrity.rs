//! Streaming content hashing.

use sha2::{Digest, Sha256};

/// Incremental SHA-256 over bytes as they are written.
#[derive(Debug, Clone, Default)]
pub struct StreamingDigest {
    hasher: Sha256,
    bytes: u64,
}

impl StreamingDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Bytes hashed so far.
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Finish and return the lowercase hex digest.
    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

/// Outcome of comparing a computed digest with the expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityCheck {
    Match,
    Mismatch { expected: String, actual: String },
    /// No expected digest recorded.
    Unverified,
}

impl IntegrityCheck {
    /// Compare `actual` against `expected`, ignoring hex case.
    pub fn compare(expected: Option<&str>, actual: &str) -> Self {
        match expected {
            None => Self::Unverified,
            Some(expected) if expected.eq_ignore_ascii_case(actual) => Self::Match,
            Some(expected) => Self::Mismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_chunked_digest_matches_whole() {
        let mut digest = StreamingDigest::new();
        digest.update(b"hello");
        digest.update(b" ");
        digest.update(b"world");
        assert_eq!(digest.bytes(), 11);
        assert_eq!(digest.finish(), HELLO_SHA256);
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            IntegrityCheck::compare(Some(&HELLO_SHA256.to_uppercase()), HELLO_SHA256),
            IntegrityCheck::Match
        );
        assert_eq!(
            IntegrityCheck::compare(None, HELLO_SHA256),
            IntegrityCheck::Unverified
        );
        assert!(matches!(
            IntegrityCheck::compare(Some("00"), HELLO_SHA256),
            IntegrityCheck::Mismatch { .. }
        ));
    }
}
