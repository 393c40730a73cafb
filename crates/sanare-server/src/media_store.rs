//! On-disk storage for uploaded images.
//!
//! Files live under a type-partitioned namespace (`uploads/profiles/`,
//! `uploads/blogs/`) and are served back verbatim at `/uploads/...`. The
//! store only accepts image content types and enforces a per-kind size cap:
//! 2 MiB for profile pictures, 8 MiB for blog images.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

/// Accepted image content types.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

const PROFILE_MAX_BYTES: usize = 2 * 1024 * 1024;
const BLOG_MAX_BYTES: usize = 8 * 1024 * 1024;

/// The two upload namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Profiles,
    Blogs,
}

impl MediaKind {
    /// Parse the `type` form field. Unknown values are rejected so a typo
    /// cannot create a stray namespace on disk.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "profiles" => Some(MediaKind::Profiles),
            "blogs" => Some(MediaKind::Blogs),
            _ => None,
        }
    }

    /// Subdirectory name under the uploads root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Profiles => "profiles",
            MediaKind::Blogs => "blogs",
        }
    }

    /// Per-kind size cap in bytes.
    pub fn max_size(&self) -> usize {
        match self {
            MediaKind::Profiles => PROFILE_MAX_BYTES,
            MediaKind::Blogs => BLOG_MAX_BYTES,
        }
    }
}

/// Result of a successful store: the generated file name and the
/// server-relative URL recorded in the database.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub file_name: String,
    pub url: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
}

impl MediaStore {
    /// Create the uploads root and both kind subdirectories if missing.
    pub async fn new(base_path: PathBuf) -> Result<Self, ApiError> {
        for kind in [MediaKind::Profiles, MediaKind::Blogs] {
            let dir = base_path.join(kind.dir_name());
            fs::create_dir_all(&dir).await.map_err(|e| {
                ApiError::Internal(format!(
                    "Failed to create uploads directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        info!(path = %base_path.display(), "Media store initialized");

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Validate and persist an uploaded image.
    ///
    /// The stored file name is a generated UUID plus a sanitized extension
    /// taken from the client-supplied name, so client input can never steer
    /// the write path.
    pub async fn store_image(
        &self,
        kind: MediaKind,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredImage, ApiError> {
        if data.is_empty() {
            return Err(ApiError::Validation("No file uploaded".to_string()));
        }
        if data.len() > kind.max_size() {
            return Err(ApiError::FileTooLarge {
                size: data.len(),
                max: kind.max_size(),
            });
        }
        if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
            return Err(ApiError::Validation(
                "Unsupported file type. Allowed: jpeg, png, webp".to_string(),
            ));
        }

        let file_name = format!("{}.{}", Uuid::new_v4(), sanitize_extension(original_name));
        let path = self.base_path.join(kind.dir_name()).join(&file_name);

        fs::write(&path, data).await.map_err(|e| {
            ApiError::Internal(format!("Failed to write upload {}: {}", file_name, e))
        })?;

        debug!(kind = kind.dir_name(), file = %file_name, size = data.len(), "Stored upload");

        Ok(StoredImage {
            url: format!("/uploads/{}/{}", kind.dir_name(), file_name),
            file_name,
            size: data.len(),
        })
    }
}

/// Extract a safe lowercase extension from a client-supplied file name.
/// Anything missing, oversized, or containing non-alphanumeric characters
/// falls back to `png`.
fn sanitize_extension(original_name: &str) -> String {
    let ext = match original_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "png".to_string(),
    };
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return "png".to_string();
    }
    ext
}
