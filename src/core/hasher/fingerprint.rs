//! The fingerprint value type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A CRC-32 content fingerprint.
///
/// Displayed and persisted as exactly 8 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u32);

/// Rejected fingerprint text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid fingerprint {0:?}: expected 8 hex digits")]
pub struct ParseFingerprintError(pub String);

impl Fingerprint {
    /// Algorithm tag stored alongside every cached fingerprint
    pub const ALGORITHM: &'static str = "crc32";

    /// Wrap a raw checksum value
    pub fn from_value(value: u32) -> Self {
        Self(value)
    }

    /// The raw 32-bit checksum
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Case-insensitive comparison against a hex string.
    ///
    /// Surrounding whitespace is ignored; anything that is not 8 hex digits
    /// never matches.
    pub fn matches_hex(&self, expected: &str) -> bool {
        expected
            .trim()
            .parse::<Fingerprint>()
            .map(|other| other == *self)
            .unwrap_or(false)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseFingerprintError(s.to_string()));
        }
        u32::from_str_radix(s, 16)
            .map(Fingerprint)
            .map_err(|_| ParseFingerprintError(s.to_string()))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
