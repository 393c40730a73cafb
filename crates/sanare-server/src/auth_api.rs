//! Account endpoints: signup, login, current user, and the account listing.
//!
//! Signup arrives as a multipart form so the profile picture can ride along
//! with the text fields. The image is written to disk before the account row
//! is inserted; if the insert then fails the file is left behind (accepted,
//! never retried).

use std::collections::HashMap;

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use sanare_store::{NewUser, Role, StoreError, User};

use crate::api::AppState;
use crate::auth::{hash_password, issue_token, verify_password, Identity};
use crate::error::ApiError;
use crate::media_store::MediaKind;
use crate::shape::{absolutize_user, request_origin};

const PASSWORD_MIN_CHARS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A buffered multipart submission: text fields by name, plus the single
/// `profileImage` file if one was sent.
struct SignupForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

struct UploadedFile {
    original_name: String,
    content_type: String,
    data: Vec<u8>,
}

/// Drain a multipart stream into memory. Fields may arrive in any order, so
/// everything is buffered before any of it is interpreted.
async fn read_form(mut multipart: Multipart) -> Result<SignupForm, ApiError> {
    let mut fields = HashMap::new();
    let mut file = None;

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
            if !data.is_empty() {
                file = Some(UploadedFile {
                    original_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read field: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok(SignupForm { fields, file })
}

/// Just enough of an email check to catch obviously broken input; real
/// verification would need a confirmation mail.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !email.contains(char::is_whitespace)
}

fn owned(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/signup — create an account and sign the caller straight in.
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = read_form(multipart).await?;

    let email = owned(&form.fields, "email")
        .map(|e| e.to_lowercase())
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))?;
    if !looks_like_email(&email) {
        return Err(ApiError::Validation("Invalid email".to_string()));
    }

    let password = form
        .fields
        .get("password")
        .cloned()
        .unwrap_or_default();
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(ApiError::Validation(
            "Password must be at least 6 chars".to_string(),
        ));
    }
    // confirmPassword is a frontend concern; it is dropped here and never
    // stored.

    let role = form
        .fields
        .get("userType")
        .and_then(|v| Role::parse(v))
        .unwrap_or(Role::Patient);

    // Write the image first; a duplicate email below leaves the file
    // orphaned, which is accepted.
    let profile_image = match &form.file {
        Some(file) => Some(
            state
                .media
                .store_image(
                    MediaKind::Profiles,
                    &file.original_name,
                    &file.content_type,
                    &file.data,
                )
                .await?
                .url,
        ),
        None => None,
    };

    let new_user = NewUser {
        email,
        password_hash: hash_password(&password)?,
        first_name: owned(&form.fields, "firstName"),
        last_name: owned(&form.fields, "lastName"),
        username: owned(&form.fields, "username"),
        role,
        profile_image,
        address_line1: owned(&form.fields, "addressLine1"),
        city: owned(&form.fields, "city"),
        state: owned(&form.fields, "state"),
        pincode: owned(&form.fields, "pincode"),
    };

    let user = {
        let db = state.db.lock().await;
        db.create_user(&new_user)?
    };

    tracing::info!(id = user.id, role = %user.role, "account created");

    respond_with_token(&state, &headers, user)
}

/// POST /auth/login — verify credentials and issue a fresh token.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    };
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = {
        let db = state.db.lock().await;
        db.find_user_by_email(&email)?
    };

    let Some(user) = user else {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };
    if !verify_password(&password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    respond_with_token(&state, &headers, user)
}

/// GET /auth/me — the account behind the presented token. Looked up by id
/// first, then by email.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
    identity: Identity,
) -> Result<Json<Value>, ApiError> {
    let user = {
        let db = state.db.lock().await;
        match db.get_user(identity.id) {
            Ok(user) => Some(user),
            Err(StoreError::NotFound) => db.find_user_by_email(&identity.email)?,
            Err(e) => return Err(e.into()),
        }
    };

    let Some(user) = user else {
        return Err(ApiError::NotFound);
    };

    let origin = request_origin(&state.config, &headers);
    Ok(Json(json!({ "ok": true, "user": absolutize_user(user, &origin) })))
}

/// GET /auth/signups — public account listing, kept for compatibility with
/// older clients. Password hashes are skipped at serialization.
pub async fn list_signups(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let users = {
        let db = state.db.lock().await;
        db.list_users()?
    };

    let origin = request_origin(&state.config, &headers);
    let users: Vec<User> = users
        .into_iter()
        .map(|u| absolutize_user(u, &origin))
        .collect();

    Ok(Json(json!({ "ok": true, "data": users })))
}

fn respond_with_token(
    state: &AppState,
    headers: &HeaderMap,
    user: User,
) -> Result<Json<Value>, ApiError> {
    let token = issue_token(&user, &state.config.jwt_secret)?;
    let origin = request_origin(&state.config, headers);
    Ok(Json(json!({
        "ok": true,
        "user": absolutize_user(user, &origin),
        "token": token,
    })))
}
