//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` with `camelCase` field names so it can be
//! handed directly to the HTTP layer; the stored password hash is explicitly
//! skipped so it can never cross the response boundary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role. Closed set, resolved once when a user record or token is
/// read; every authorization check switches on this enum rather than on raw
/// strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    /// Canonical lowercase form stored in the database and in token claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
        }
    }

    /// Parse a role from user input or a stored value, case-insensitively.
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account (patient or doctor).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned row id.
    pub id: i64,
    /// Unique, always stored lowercase.
    pub email: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "userType")]
    pub role: Role,
    /// Server-relative path under `/uploads`, if an image was uploaded.
    pub profile_image: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Fields required to create a [`User`]. The id and timestamp are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub role: Role,
    pub profile_image: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

// ---------------------------------------------------------------------------
// Blog
// ---------------------------------------------------------------------------

/// Read-only projection of a blog's author, embedded in every blog read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image: Option<String>,
}

/// A blog post. `is_draft = true` restricts visibility to the owning doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    /// Server-assigned row id.
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Plain text, at most 50 whitespace-delimited words.
    pub summary: String,
    /// Canonical category token (e.g. `MENTAL_HEALTH`), or a best-effort
    /// derived token for inputs that match no canonical category.
    pub category: String,
    pub image_url: Option<String>,
    pub is_draft: bool,
    pub doctor_id: i64,
    pub created_at: DateTime<Utc>,
    /// Author projection, joined from the `users` table.
    pub doctor: Author,
}

/// Fields required to create a [`Blog`].
#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: String,
    pub image_url: Option<String>,
    pub is_draft: bool,
    pub doctor_id: i64,
}

/// Partial update of a [`Blog`]. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_draft: Option<bool>,
}
