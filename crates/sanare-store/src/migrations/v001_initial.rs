//! v001 -- Initial schema creation.
//!
//! Creates the two core tables: `users` and `blogs`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT NOT NULL UNIQUE,         -- stored lowercase
    password_hash TEXT NOT NULL,                -- Argon2id PHC string
    first_name    TEXT,
    last_name     TEXT,
    username      TEXT,
    role          TEXT NOT NULL,                -- 'patient' | 'doctor'
    profile_image TEXT,                         -- /uploads/profiles/<file>
    address_line1 TEXT,
    city          TEXT,
    state         TEXT,
    pincode       TEXT,
    saved_at      TEXT NOT NULL                 -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Blogs
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS blogs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    summary    TEXT NOT NULL,
    category   TEXT NOT NULL,                   -- canonical token, e.g. MENTAL_HEALTH
    image_url  TEXT,                            -- /uploads/blogs/<file>
    is_draft   INTEGER NOT NULL DEFAULT 0,      -- boolean 0/1
    doctor_id  INTEGER NOT NULL,                -- FK -> users(id)
    created_at TEXT NOT NULL,

    FOREIGN KEY (doctor_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_blogs_doctor_id ON blogs(doctor_id);

CREATE INDEX IF NOT EXISTS idx_blogs_published
    ON blogs(is_draft, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
