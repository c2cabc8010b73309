//! Storage locator model: the (bucket, key) pair naming an object in durable storage.
//!
//! Persisted records carry the locator as a single comma-delimited string
//! (`"<bucket>,<key>"`). That text is an encoding, not a URL: it must be decoded
//! before any network use and is never handed to clients.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between bucket and key in the persisted form.
pub const LOCATOR_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("storage locator is missing the ',' delimiter")]
    MissingDelimiter,

    #[error("storage locator has an empty bucket")]
    EmptyBucket,

    #[error("storage locator has an empty key")]
    EmptyKey,

    #[error("bucket name must not contain ','")]
    DelimiterInBucket,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageLocator {
    bucket: String,
    key: String,
}

impl StorageLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self, LocatorError> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.is_empty() {
            return Err(LocatorError::EmptyBucket);
        }
        if bucket.contains(LOCATOR_DELIMITER) {
            return Err(LocatorError::DelimiterInBucket);
        }
        if key.is_empty() {
            return Err(LocatorError::EmptyKey);
        }
        Ok(Self { bucket, key })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persisted form: `"<bucket>,<key>"`.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.bucket, LOCATOR_DELIMITER, self.key)
    }

    /// Parse the persisted form, splitting on the first delimiter only.
    pub fn decode(encoded: &str) -> Result<Self, LocatorError> {
        let (bucket, key) = encoded
            .split_once(LOCATOR_DELIMITER)
            .ok_or(LocatorError::MissingDelimiter)?;
        Self::new(bucket, key)
    }
}

impl Display for StorageLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}{}", self.bucket, LOCATOR_DELIMITER, self.key)
    }
}

impl FromStr for StorageLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_matches_persisted_format() {
        let locator = StorageLocator::new("videos", "landscape/abc.mp4").unwrap();
        assert_eq!(locator.encode(), "videos,landscape/abc.mp4");
        assert_eq!(locator.to_string(), locator.encode());
    }

    #[test]
    fn test_decode_splits_on_first_delimiter() {
        let locator = StorageLocator::decode("videos,weird,key.mp4").unwrap();
        assert_eq!(locator.bucket(), "videos");
        assert_eq!(locator.key(), "weird,key.mp4");
    }

    #[test]
    fn test_decode_rejects_malformed_values() {
        assert_eq!(
            StorageLocator::decode("https://example.com/video.mp4"),
            Err(LocatorError::MissingDelimiter)
        );
        assert_eq!(StorageLocator::decode(",key"), Err(LocatorError::EmptyBucket));
        assert_eq!(StorageLocator::decode("bucket,"), Err(LocatorError::EmptyKey));
    }

    #[test]
    fn test_new_rejects_delimiter_in_bucket() {
        assert_eq!(
            StorageLocator::new("a,b", "key"),
            Err(LocatorError::DelimiterInBucket)
        );
    }

    #[test]
    fn test_from_str() {
        let locator: StorageLocator = "videos,portrait/x.mp4".parse().unwrap();
        assert_eq!(locator.key(), "portrait/x.mp4");
    }
}
