//! User records and the pen-stroke signatures attached to them.
//!
//! These are plain data shapes. Field names here are the external JSON names;
//! stores that use different native names translate at their own boundary.

pub mod id;

pub use id::{IdError, UserId};

use serde::{Deserialize, Serialize};

/// Name of the identifying field in stored documents and filters.
pub const EMAIL_FIELD: &str = "email";

/// Name of the opaque token field in stored documents and filters.
pub const TOKEN_FIELD: &str = "token";

/// One sampled pen stroke.
///
/// `abs`, `ord` and `time` are parallel sequences of x positions,
/// y positions and timestamps. Their lengths are not checked here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub abs: Vec<i64>,
    #[serde(default)]
    pub ord: Vec<i64>,
    #[serde(default)]
    pub time: Vec<i64>,
}

/// A persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<Signature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl User {
    /// Attaches a store-assigned identifier to a new user.
    pub fn from_new(id: UserId, new: NewUser) -> Self {
        Self {
            id,
            email: new.email,
            signatures: new.signatures,
            token: new.token,
        }
    }

    /// Value of a string field by its stored name.
    ///
    /// Only `email` and `token` are string fields; any other name yields `None`.
    pub fn string_field(&self, field: &str) -> Option<&str> {
        match field {
            EMAIL_FIELD => Some(&self.email),
            TOKEN_FIELD => self.token.as_deref(),
            _ => None,
        }
    }
}

/// Attributes supplied by a client when creating a user.
///
/// This is also the body accepted by `POST /user`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewUser {
    /// Stored as empty when the body omits it.
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<Signature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.signatures = Some(signatures);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
