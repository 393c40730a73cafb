//! Response shaping applied at the boundary, just before records leave the
//! API: stored server-relative image paths are rewritten to absolute URLs so
//! responses render directly wherever the client is hosted.
//!
//! Password hashes never reach this layer in serialized form (the model
//! skips them), so shaping is only concerned with image paths.

use axum::http::{header, HeaderMap};
use sanare_store::{Blog, User};

use crate::config::ServerConfig;

/// The origin image URLs are rooted at: the configured `PUBLIC_ORIGIN` when
/// set, otherwise derived from the request's `Host` header.
pub fn request_origin(config: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(origin) = &config.public_origin {
        return origin.clone();
    }

    match headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) if !host.is_empty() => format!("http://{host}"),
        _ => format!("http://localhost:{}", config.http_addr.port()),
    }
}

/// Rewrite a stored image path to an absolute URL. Paths that are not
/// server-relative upload paths (e.g. already absolute) pass through
/// unchanged.
pub fn absolutize(origin: &str, path: &str) -> String {
    if path.starts_with("/uploads") {
        format!("{origin}{path}")
    } else {
        path.to_string()
    }
}

/// Absolutize a user's profile image.
pub fn absolutize_user(mut user: User, origin: &str) -> User {
    if let Some(path) = user.profile_image.take() {
        user.profile_image = Some(absolutize(origin, &path));
    }
    user
}

/// Absolutize a blog's own image and its embedded author projection.
pub fn absolutize_blog(mut blog: Blog, origin: &str) -> Blog {
    if let Some(path) = blog.image_url.take() {
        blog.image_url = Some(absolutize(origin, &path));
    }
    if let Some(path) = blog.doctor.profile_image.take() {
        blog.doctor.profile_image = Some(absolutize(origin, &path));
    }
    blog
}
