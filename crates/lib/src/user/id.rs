//! Identifier type for persisted users.
//!
//! The `UserId` type wraps the document store's native 12-byte identifier
//! (the ObjectId layout) and is exchanged with clients as 24 lowercase hex
//! characters.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of raw bytes in an identifier.
pub const ID_BYTES: usize = 12;

/// Length of the external hex form of an identifier.
pub const ID_HEX_LEN: usize = ID_BYTES * 2;

const COUNTER_MASK: u32 = 0x00ff_ffff;

/// Errors produced when decoding the external form of an identifier.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input does not have exactly [`ID_HEX_LEN`] characters.
    #[error("invalid identifier length {length}, expected {ID_HEX_LEN} hex characters")]
    InvalidLength {
        /// Length of the rejected input
        length: usize,
    },

    /// The input contains characters outside `[0-9a-fA-F]`.
    #[error("invalid identifier {input:?}: not a hex string")]
    InvalidHex {
        /// The rejected input
        input: String,
    },
}

impl IdError {
    /// The input that was rejected, when it is recorded.
    pub fn input(&self) -> Option<&str> {
        match self {
            IdError::InvalidHex { input } => Some(input.as_str()),
            IdError::InvalidLength { .. } => None,
        }
    }
}

/// Store-assigned identifier of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId([u8; ID_BYTES]);

impl UserId {
    /// Builds an identifier from its raw bytes.
    pub const fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub const fn bytes(&self) -> [u8; ID_BYTES] {
        self.0
    }

    /// Decodes the external hex form.
    ///
    /// Accepts upper or lower case digits. Anything other than exactly
    /// 24 hex characters is rejected, so a malformed identifier never reaches
    /// the store.
    pub fn decode(external: &str) -> Result<Self, IdError> {
        if external.len() != ID_HEX_LEN {
            return Err(IdError::InvalidLength {
                length: external.len(),
            });
        }
        let mut bytes = [0u8; ID_BYTES];
        hex::decode_to_slice(external, &mut bytes).map_err(|_| IdError::InvalidHex {
            input: external.to_string(),
        })?;
        Ok(Self(bytes))
    }

    /// Encodes the identifier as 24 lowercase hex characters.
    pub fn encode(&self) -> String {
        hex::encode(self.0)
    }

    /// Decodes an identifier in the store's marshalled form.
    ///
    /// Stores that marshal identifiers as JSON strings hand them back wrapped
    /// in quotes, sometimes with trailing whitespace. Both are stripped before
    /// decoding.
    pub fn from_marshalled(raw: &str) -> Result<Self, IdError> {
        Self::decode(raw.trim_matches(|c: char| c == '"' || c.is_whitespace()))
    }

    /// Generates a fresh identifier.
    ///
    /// Layout: 4-byte big-endian seconds since the epoch, 5 bytes fixed for the
    /// lifetime of the process, and a 3-byte big-endian counter.
    pub fn generate() -> Self {
        static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
        static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

        let process = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().r#gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..=COUNTER_MASK)))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();

        let mut bytes = [0u8; ID_BYTES];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Seconds since the epoch recorded in the identifier.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let external = String::deserialize(deserializer)?;
        Self::decode(&external).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::bson::oid::ObjectId> for UserId {
    fn from(oid: mongodb::bson::oid::ObjectId) -> Self {
        Self(oid.bytes())
    }
}

#[cfg(feature = "mongodb")]
impl From<UserId> for mongodb::bson::oid::ObjectId {
    fn from(id: UserId) -> Self {
        mongodb::bson::oid::ObjectId::from_bytes(id.0)
    }
}
