//! CRUD operations for [`Blog`] records.
//!
//! Every read joins the author projection from `users` so the HTTP layer can
//! return blogs with their embedded `doctor` object in a single query.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Author, Blog, BlogChanges, NewBlog};

const BLOG_SELECT: &str = "SELECT b.id, b.title, b.content, b.summary, b.category, b.image_url,
            b.is_draft, b.doctor_id, b.created_at,
            u.first_name, u.last_name, u.profile_image
     FROM blogs b
     JOIN users u ON u.id = b.doctor_id";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new blog and return the stored record with its author.
    pub fn create_blog(&self, new_blog: &NewBlog) -> Result<Blog> {
        let created_at = Utc::now();

        self.conn().execute(
            "INSERT INTO blogs (title, content, summary, category, image_url, is_draft,
                                doctor_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new_blog.title,
                new_blog.content,
                new_blog.summary,
                new_blog.category,
                new_blog.image_url,
                new_blog.is_draft,
                new_blog.doctor_id,
                created_at.to_rfc3339(),
            ],
        )?;

        self.get_blog(self.conn().last_insert_rowid())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single blog by row id, with its author projection.
    pub fn get_blog(&self, id: i64) -> Result<Blog> {
        self.conn()
            .query_row(
                &format!("{BLOG_SELECT} WHERE b.id = ?1"),
                params![id],
                row_to_blog,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List published blogs (drafts are never included), newest first,
    /// optionally restricted to a single category token.
    pub fn list_published(&self, category: Option<&str>) -> Result<Vec<Blog>> {
        let mut blogs = Vec::new();
        match category {
            Some(token) => {
                let mut stmt = self.conn().prepare(&format!(
                    "{BLOG_SELECT} WHERE b.is_draft = 0 AND b.category = ?1
                     ORDER BY b.created_at DESC, b.id DESC"
                ))?;
                let rows = stmt.query_map(params![token], row_to_blog)?;
                for row in rows {
                    blogs.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn().prepare(&format!(
                    "{BLOG_SELECT} WHERE b.is_draft = 0
                     ORDER BY b.created_at DESC, b.id DESC"
                ))?;
                let rows = stmt.query_map([], row_to_blog)?;
                for row in rows {
                    blogs.push(row?);
                }
            }
        }
        Ok(blogs)
    }

    /// List all blogs owned by a doctor, drafts included, newest first.
    pub fn list_blogs_for_doctor(&self, doctor_id: i64) -> Result<Vec<Blog>> {
        let mut stmt = self.conn().prepare(&format!(
            "{BLOG_SELECT} WHERE b.doctor_id = ?1
             ORDER BY b.created_at DESC, b.id DESC"
        ))?;
        let rows = stmt.query_map(params![doctor_id], row_to_blog)?;

        let mut blogs = Vec::new();
        for row in rows {
            blogs.push(row?);
        }
        Ok(blogs)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update. Fields left as `None` keep their stored value.
    pub fn update_blog(&self, id: i64, changes: &BlogChanges) -> Result<Blog> {
        let affected = self.conn().execute(
            "UPDATE blogs SET
                 title     = COALESCE(?2, title),
                 content   = COALESCE(?3, content),
                 summary   = COALESCE(?4, summary),
                 category  = COALESCE(?5, category),
                 image_url = COALESCE(?6, image_url),
                 is_draft  = COALESCE(?7, is_draft)
             WHERE id = ?1",
            params![
                id,
                changes.title,
                changes.content,
                changes.summary,
                changes.category,
                changes.image_url,
                changes.is_draft,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_blog(id)
    }

    /// Record the uploaded image path for a blog and return the updated
    /// record.
    pub fn set_blog_image(&self, id: i64, path: &str) -> Result<Blog> {
        let affected = self.conn().execute(
            "UPDATE blogs SET image_url = ?2 WHERE id = ?1",
            params![id, path],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_blog(id)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a blog by row id.  Returns `true` if a row was deleted.
    /// Any stored image file is left untouched.
    pub fn delete_blog(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM blogs WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a joined `rusqlite::Row` to a [`Blog`] with its [`Author`].
fn row_to_blog(row: &rusqlite::Row<'_>) -> rusqlite::Result<Blog> {
    let created_str: String = row.get(8)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let doctor_id: i64 = row.get(7)?;

    Ok(Blog {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        summary: row.get(3)?,
        category: row.get(4)?,
        image_url: row.get(5)?,
        is_draft: row.get(6)?,
        doctor_id,
        created_at,
        doctor: Author {
            id: doctor_id,
            first_name: row.get(9)?,
            last_name: row.get(10)?,
            profile_image: row.get(11)?,
        },
    })
}
