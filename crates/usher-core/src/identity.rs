//! Identity records owned by the external auth provider.
//!
//! Users and sessions are created by the auth provider and *read* by this
//! service; the only identity field it ever writes is `User::email_verified`,
//! flipped by the email-verification token flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identity record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    #[serde(rename = "emailVerified")]
    pub email_verified: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Session issued by the auth provider.
///
/// `user_id`, the user's email, and `email_verified` read through a session
/// are the sole authorization inputs this service trusts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Session {
    pub id: String,
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Single-use, time-boxed email-proof token.
///
/// Created at sign-up, consumed exactly once to flip `User::email_verified`,
/// and deleted whether used successfully, already-verified, or expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Verification {
    pub id: String,
    /// Email address the token proves ownership of.
    pub identifier: String,
    pub value: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Verification {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// User creation data.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

impl CreateUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            email: email.into(),
            name: None,
            email_verified: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
        self
    }
}

/// Session creation data.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Verification token creation data.
#[derive(Debug, Clone)]
pub struct CreateVerification {
    pub identifier: String,
    pub value: String,
    pub expires_at: DateTime<Utc>,
}
