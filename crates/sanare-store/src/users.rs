//! CRUD operations for [`User`] records.
//!
//! Email uniqueness is case-insensitive: every write and lookup lowercases
//! the address before touching the database, so the `UNIQUE` constraint on
//! `users.email` enforces the invariant for all spellings.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUser, Role, User};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, username, role, \
     profile_image, address_line1, city, state, pincode, saved_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user and return the stored record.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] if the (lowercased) email is
    /// already registered.
    pub fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let email = new_user.email.trim().to_lowercase();
        let saved_at = Utc::now();

        self.conn()
            .execute(
                "INSERT INTO users (email, password_hash, first_name, last_name, username, role,
                                    profile_image, address_line1, city, state, pincode, saved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    email,
                    new_user.password_hash,
                    new_user.first_name,
                    new_user.last_name,
                    new_user.username,
                    new_user.role.as_str(),
                    new_user.profile_image,
                    new_user.address_line1,
                    new_user.city,
                    new_user.state,
                    new_user.pincode,
                    saved_at.to_rfc3339(),
                ],
            )
            .map_err(map_unique_email)?;

        self.get_user(self.conn().last_insert_rowid())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single user by row id.
    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Look up a user by email, case-insensitively. Returns `None` when no
    /// account matches.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let normalized = email.trim().to_lowercase();
        match self.conn().query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![normalized],
            row_to_user,
        ) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// List all users, oldest first.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Record the uploaded profile image path for a user and return the
    /// updated record.
    pub fn set_profile_image(&self, id: i64, path: &str) -> Result<User> {
        let affected = self.conn().execute(
            "UPDATE users SET profile_image = ?2 WHERE id = ?1",
            params![id, path],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_user(id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Translate a unique-constraint violation on `users.email` into
/// [`StoreError::DuplicateEmail`].
fn map_unique_email(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ffi_err, Some(msg)) = &e {
        if ffi_err.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("users.email") {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Sqlite(e)
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role_str: String = row.get(6)?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown role: {role_str}").into(),
        )
    })?;

    let saved_str: String = row.get(12)?;
    let saved_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&saved_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        username: row.get(5)?,
        role,
        profile_image: row.get(7)?,
        address_line1: row.get(8)?,
        city: row.get(9)?,
        state: row.get(10)?,
        pincode: row.get(11)?,
        saved_at,
    })
}
