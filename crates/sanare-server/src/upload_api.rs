//! Standalone media upload endpoint.
//!
//! `POST /upload` takes a multipart form with a `profileImage` file, a
//! `type` namespace (`profiles` or `blogs`), and the id of the record the
//! resulting path should be attached to (`userId` or `blogId`). The file
//! write and the database update are deliberately not atomic: if recording
//! the path fails, the caller gets a 500 and the file stays on disk.

use std::collections::HashMap;

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::error::ApiError;
use crate::media_store::MediaKind;
use crate::shape::{absolutize_blog, absolutize_user, request_origin};

/// POST /upload — store a file and attach its path to a user or blog row.
pub async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "profileImage" {
            let original_name = field.file_name().unwrap_or("").to_string();
            let content_type = field.content_type().unwrap_or("").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read file: {e}")))?;
            file = Some((original_name, content_type, data.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read field: {e}")))?;
            fields.insert(name, value);
        }
    }

    let Some((original_name, content_type, data)) = file else {
        return Err(ApiError::Validation("No file uploaded".to_string()));
    };

    let kind = fields
        .get("type")
        .and_then(|t| MediaKind::parse(t))
        .unwrap_or(MediaKind::Profiles);

    let stored = state
        .media
        .store_image(kind, &original_name, &content_type, &data)
        .await?;

    tracing::info!(kind = kind.dir_name(), url = %stored.url, size = stored.size, "file uploaded");

    // Attach the path to the named record. The file is already on disk, so
    // any failure from here on is reported as a metadata error, and the
    // write is not rolled back.
    let origin = request_origin(&state.config, &headers);
    let db_record = match kind {
        MediaKind::Profiles => match parse_id(&fields, "userId") {
            Some(user_id) => {
                let user = {
                    let db = state.db.lock().await;
                    db.set_profile_image(user_id, &stored.url)
                        .map_err(metadata_error)?
                };
                Some(serde_json::to_value(absolutize_user(user, &origin)).map_err(json_error)?)
            }
            None => None,
        },
        MediaKind::Blogs => match parse_id(&fields, "blogId") {
            Some(blog_id) => {
                let blog = {
                    let db = state.db.lock().await;
                    db.set_blog_image(blog_id, &stored.url)
                        .map_err(metadata_error)?
                };
                Some(serde_json::to_value(absolutize_blog(blog, &origin)).map_err(json_error)?)
            }
            None => None,
        },
    };

    Ok(Json(json!({
        "ok": true,
        "file": {
            "filename": stored.file_name,
            "originalname": original_name,
            "size": stored.size,
            "mimetype": content_type,
            "url": stored.url,
        },
        "db": db_record,
    })))
}

fn parse_id(fields: &HashMap<String, String>, key: &str) -> Option<i64> {
    fields.get(key).and_then(|v| v.trim().parse::<i64>().ok())
}

fn metadata_error(e: sanare_store::StoreError) -> ApiError {
    tracing::error!(error = %e, "failed to record upload path");
    ApiError::MetadataSave
}

fn json_error(e: serde_json::Error) -> ApiError {
    ApiError::Internal(format!("Failed to serialize record: {e}"))
}
