//! Blog endpoints: the visibility and ownership policy.
//!
//! Who may see or mutate a blog:
//! - published blogs are readable by anyone, including anonymous callers;
//! - drafts are readable only by their owning doctor — for everyone else a
//!   draft is indistinguishable from a blog that does not exist;
//! - only doctors create blogs, and only the owning doctor updates or
//!   deletes one. Ownership is checked against the blog row; the owner's
//!   current role is not re-derived.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use sanare_store::{Blog, BlogChanges, NewBlog, Role};

use crate::api::AppState;
use crate::auth::{Identity, OptionalIdentity};
use crate::category::normalize_category;
use crate::error::ApiError;
use crate::shape::{absolutize_blog, request_origin};

/// Maximum summary length in words.
const SUMMARY_WORD_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// Create/update payload. The frontend historically sent both `draft` and
/// `isDraft` for the same flag, so both are accepted as separate optional
/// fields and merged, `isDraft` winning.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPayload {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_draft: Option<bool>,
    pub draft: Option<bool>,
}

impl BlogPayload {
    fn draft_flag(&self) -> Option<bool> {
        self.is_draft.or(self.draft)
    }
}

// ---------------------------------------------------------------------------
// Policy helpers
// ---------------------------------------------------------------------------

/// Number of nonempty whitespace-delimited tokens.
fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn validate_summary(summary: &str) -> Result<(), ApiError> {
    if word_count(summary) > SUMMARY_WORD_LIMIT {
        return Err(ApiError::Validation(
            "Summary must be 50 words or less".to_string(),
        ));
    }
    Ok(())
}

/// Draft visibility: a draft is visible to its owner only.
fn visible_to(blog: &Blog, viewer: Option<&Identity>) -> bool {
    !blog.is_draft || viewer.map(|v| v.id == blog.doctor_id).unwrap_or(false)
}

/// Ownership gate for mutations. The blog was necessarily created by a
/// doctor, so ownership implies the doctor role and no role re-check is
/// performed here.
fn authorize_owner(blog: &Blog, identity: &Identity) -> Result<(), ApiError> {
    if blog.doctor_id != identity.id {
        return Err(ApiError::Forbidden(
            "Only the owner can modify this blog".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /blogs — the public feed. Drafts are never included, regardless of
/// who is asking; "my drafts" is a separate endpoint.
pub async fn list_published(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let category = query
        .category
        .as_deref()
        .and_then(normalize_category);

    let blogs = {
        let db = state.db.lock().await;
        db.list_published(category.as_deref())?
    };

    let origin = request_origin(&state.config, &headers);
    let blogs: Vec<Blog> = blogs
        .into_iter()
        .map(|b| absolutize_blog(b, &origin))
        .collect();

    Ok(Json(json!({ "ok": true, "data": blogs })))
}

/// GET /blogs/mine — a doctor's own blogs, drafts included.
pub async fn list_mine(
    State(state): State<AppState>,
    headers: HeaderMap,
    identity: Identity,
) -> Result<Json<Value>, ApiError> {
    if identity.role != Role::Doctor {
        return Err(ApiError::Forbidden(
            "Only doctors can list their blogs".to_string(),
        ));
    }

    let blogs = {
        let db = state.db.lock().await;
        db.list_blogs_for_doctor(identity.id)?
    };

    let origin = request_origin(&state.config, &headers);
    let blogs: Vec<Blog> = blogs
        .into_iter()
        .map(|b| absolutize_blog(b, &origin))
        .collect();

    Ok(Json(json!({ "ok": true, "data": blogs })))
}

/// GET /blogs/:id — published blogs for anyone; drafts for their owner,
/// 404 for everyone else.
pub async fn get_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    OptionalIdentity(viewer): OptionalIdentity,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let blog = {
        let db = state.db.lock().await;
        db.get_blog(id)?
    };

    if !visible_to(&blog, viewer.as_ref()) {
        return Err(ApiError::NotFound);
    }

    let origin = request_origin(&state.config, &headers);
    Ok(Json(json!({ "ok": true, "data": absolutize_blog(blog, &origin) })))
}

/// POST /blogs — doctors only. The owning author is forced to the caller;
/// any client-supplied author id is ignored.
pub async fn create_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    identity: Identity,
    Json(payload): Json<BlogPayload>,
) -> Result<Json<Value>, ApiError> {
    if identity.role != Role::Doctor {
        return Err(ApiError::Forbidden(
            "Only doctors can create blogs".to_string(),
        ));
    }

    let title = payload.title.clone().unwrap_or_default();
    let content = payload.content.clone().unwrap_or_default();
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(ApiError::Validation(
            "Title and content required".to_string(),
        ));
    }

    let summary = payload.summary.clone().unwrap_or_default();
    if summary.trim().is_empty() {
        return Err(ApiError::Validation("Summary is required".to_string()));
    }
    validate_summary(&summary)?;

    let category = payload
        .category
        .as_deref()
        .and_then(normalize_category)
        .ok_or_else(|| ApiError::Validation("Please choose a category".to_string()))?;

    let new_blog = NewBlog {
        title,
        content,
        summary,
        category,
        image_url: payload.image_url.clone(),
        is_draft: payload.draft_flag().unwrap_or(false),
        doctor_id: identity.id,
    };

    let blog = {
        let db = state.db.lock().await;
        db.create_blog(&new_blog)?
    };

    tracing::info!(id = blog.id, doctor = identity.id, draft = blog.is_draft, "blog created");

    let origin = request_origin(&state.config, &headers);
    Ok(Json(json!({ "ok": true, "data": absolutize_blog(blog, &origin) })))
}

/// PUT /blogs/:id — owner only; fields absent from the payload keep their
/// stored values.
pub async fn update_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    identity: Identity,
    Path(id): Path<i64>,
    Json(payload): Json<BlogPayload>,
) -> Result<Json<Value>, ApiError> {
    let mut changes = BlogChanges {
        title: payload.title.clone(),
        content: payload.content.clone(),
        image_url: payload.image_url.clone(),
        is_draft: payload.draft_flag(),
        ..BlogChanges::default()
    };

    if let Some(summary) = &payload.summary {
        validate_summary(summary)?;
        changes.summary = Some(summary.clone());
    }

    if let Some(raw) = &payload.category {
        let category = normalize_category(raw)
            .ok_or_else(|| ApiError::Validation("Please choose a category".to_string()))?;
        changes.category = Some(category);
    }

    let updated = {
        let db = state.db.lock().await;
        let existing = db.get_blog(id)?;
        authorize_owner(&existing, &identity)?;
        db.update_blog(id, &changes)?
    };

    let origin = request_origin(&state.config, &headers);
    Ok(Json(json!({ "ok": true, "data": absolutize_blog(updated, &origin) })))
}

/// DELETE /blogs/:id — owner only. The blog row goes away permanently; any
/// stored image file is left untouched.
pub async fn delete_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let deleted = {
        let db = state.db.lock().await;
        let existing = db.get_blog(id)?;
        authorize_owner(&existing, &identity)?;
        db.delete_blog(id)?;
        existing
    };

    tracing::info!(id = deleted.id, doctor = identity.id, "blog deleted");

    let origin = request_origin(&state.config, &headers);
    Ok(Json(json!({ "ok": true, "data": absolutize_blog(deleted, &origin) })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tempfile::TempDir;
    use tokio::sync::Mutex;

    use sanare_store::{Database, NewUser};

    use crate::config::ServerConfig;
    use crate::media_store::MediaStore;

    async fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let media = MediaStore::new(dir.path().join("uploads")).await.unwrap();
        let state = AppState {
            db: Arc::new(Mutex::new(db)),
            media: Arc::new(media),
            config: Arc::new(ServerConfig::default()),
        };
        (state, dir)
    }

    async fn seed_user(state: &AppState, email: &str, role: Role) -> Identity {
        let user = state
            .db
            .lock()
            .await
            .create_user(&NewUser {
                email: email.to_string(),
                password_hash: "$argon2id$test".to_string(),
                first_name: Some("Dev".to_string()),
                last_name: None,
                username: None,
                role,
                profile_image: None,
                address_line1: None,
                city: None,
                state: None,
                pincode: None,
            })
            .unwrap();
        Identity {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }

    fn payload(title: &str, category: &str, draft: bool) -> BlogPayload {
        BlogPayload {
            title: Some(title.to_string()),
            content: Some("content".to_string()),
            summary: Some("short summary".to_string()),
            category: Some(category.to_string()),
            is_draft: Some(draft),
            ..BlogPayload::default()
        }
    }

    async fn create(state: &AppState, identity: &Identity, p: BlogPayload) -> Result<Value, ApiError> {
        create_blog(
            State(state.clone()),
            HeaderMap::new(),
            identity.clone(),
            Json(p),
        )
        .await
        .map(|json| json.0)
    }

    #[test]
    fn word_count_splits_on_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  a\tb\nc  "), 3);
    }

    #[test]
    fn summary_limit_is_exactly_fifty_words() {
        let fifty = vec!["word"; 50].join(" ");
        assert!(validate_summary(&fifty).is_ok());

        let fifty_one = vec!["word"; 51].join(" ");
        assert!(matches!(
            validate_summary(&fifty_one),
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn patient_cannot_create() {
        let (state, _dir) = test_state().await;
        let patient = seed_user(&state, "pat@x.com", Role::Patient).await;

        let err = create(&state, &patient, payload("T", "Covid19", false))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn create_normalizes_category_and_echoes_draft_flag() {
        let (state, _dir) = test_state().await;
        let doctor = seed_user(&state, "doc@x.com", Role::Doctor).await;

        let body = create(&state, &doctor, payload("T", "Heart Disease", true))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["data"]["isDraft"], true);
        assert_eq!(body["data"]["category"], "HEART_DISEASE");
        assert_eq!(body["data"]["doctorId"], doctor.id);
    }

    #[tokio::test]
    async fn create_rejects_missing_fields_and_long_summary() {
        let (state, _dir) = test_state().await;
        let doctor = seed_user(&state, "doc@x.com", Role::Doctor).await;

        let mut no_title = payload("", "Covid19", false);
        no_title.title = None;
        assert!(matches!(
            create(&state, &doctor, no_title).await.unwrap_err(),
            ApiError::Validation(_)
        ));

        let mut long_summary = payload("T", "Covid19", false);
        long_summary.summary = Some(vec!["w"; 51].join(" "));
        assert!(matches!(
            create(&state, &doctor, long_summary).await.unwrap_err(),
            ApiError::Validation(_)
        ));

        let bad_category = payload("T", "!!!", false);
        assert!(matches!(
            create(&state, &doctor, bad_category).await.unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn draft_is_hidden_from_everyone_but_its_owner() {
        let (state, _dir) = test_state().await;
        let owner = seed_user(&state, "owner@x.com", Role::Doctor).await;
        let other = seed_user(&state, "other@x.com", Role::Doctor).await;

        let body = create(&state, &owner, payload("T", "Heart Disease", true))
            .await
            .unwrap();
        let id = body["data"]["id"].as_i64().unwrap();

        // Anonymous caller: not found.
        let err = get_blog(
            State(state.clone()),
            HeaderMap::new(),
            OptionalIdentity(None),
            Path(id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));

        // Another authenticated doctor: still not found.
        let err = get_blog(
            State(state.clone()),
            HeaderMap::new(),
            OptionalIdentity(Some(other)),
            Path(id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));

        // The owner sees the same data back.
        let ok = get_blog(
            State(state.clone()),
            HeaderMap::new(),
            OptionalIdentity(Some(owner)),
            Path(id),
        )
        .await
        .unwrap();
        assert_eq!(ok.0["data"]["id"].as_i64(), Some(id));
        assert_eq!(ok.0["data"]["isDraft"], true);
    }

    #[tokio::test]
    async fn published_blog_is_visible_to_anonymous() {
        let (state, _dir) = test_state().await;
        let owner = seed_user(&state, "owner@x.com", Role::Doctor).await;

        let body = create(&state, &owner, payload("T", "Covid19", false))
            .await
            .unwrap();
        let id = body["data"]["id"].as_i64().unwrap();

        let ok = get_blog(
            State(state.clone()),
            HeaderMap::new(),
            OptionalIdentity(None),
            Path(id),
        )
        .await
        .unwrap();
        assert_eq!(ok.0["data"]["id"].as_i64(), Some(id));
    }

    #[tokio::test]
    async fn public_feed_never_contains_drafts() {
        let (state, _dir) = test_state().await;
        let owner = seed_user(&state, "owner@x.com", Role::Doctor).await;

        create(&state, &owner, payload("live", "Covid19", false)).await.unwrap();
        create(&state, &owner, payload("hidden", "Covid19", true)).await.unwrap();

        let body = list_published(
            State(state.clone()),
            HeaderMap::new(),
            Query(ListQuery { category: None }),
        )
        .await
        .unwrap();
        let data = body.0["data"].as_array().unwrap().clone();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["title"], "live");

        // Category filter accepts the display form of the token.
        let filtered = list_published(
            State(state.clone()),
            HeaderMap::new(),
            Query(ListQuery {
                category: Some("Covid-19".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(filtered.0["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_mine_requires_doctor_and_includes_drafts() {
        let (state, _dir) = test_state().await;
        let owner = seed_user(&state, "owner@x.com", Role::Doctor).await;
        let patient = seed_user(&state, "pat@x.com", Role::Patient).await;

        create(&state, &owner, payload("live", "Covid19", false)).await.unwrap();
        create(&state, &owner, payload("draft", "Covid19", true)).await.unwrap();

        let err = list_mine(State(state.clone()), HeaderMap::new(), patient)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let mine = list_mine(State(state.clone()), HeaderMap::new(), owner)
            .await
            .unwrap();
        assert_eq!(mine.0["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let (state, _dir) = test_state().await;
        let owner = seed_user(&state, "owner@x.com", Role::Doctor).await;
        let rival = seed_user(&state, "rival@x.com", Role::Doctor).await;

        let body = create(&state, &owner, payload("T", "Covid19", false))
            .await
            .unwrap();
        let id = body["data"]["id"].as_i64().unwrap();

        let err = update_blog(
            State(state.clone()),
            HeaderMap::new(),
            rival.clone(),
            Path(id),
            Json(BlogPayload {
                title: Some("stolen".to_string()),
                ..BlogPayload::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = delete_blog(State(state.clone()), HeaderMap::new(), rival, Path(id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn owner_partial_update_and_delete() {
        let (state, _dir) = test_state().await;
        let owner = seed_user(&state, "owner@x.com", Role::Doctor).await;

        let body = create(&state, &owner, payload("before", "Covid19", true))
            .await
            .unwrap();
        let id = body["data"]["id"].as_i64().unwrap();

        // Publish with a title change; other fields stay.
        let updated = update_blog(
            State(state.clone()),
            HeaderMap::new(),
            owner.clone(),
            Path(id),
            Json(BlogPayload {
                title: Some("after".to_string()),
                is_draft: Some(false),
                ..BlogPayload::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.0["data"]["title"], "after");
        assert_eq!(updated.0["data"]["isDraft"], false);
        assert_eq!(updated.0["data"]["content"], "content");

        // A supplied category is re-normalized.
        let recategorized = update_blog(
            State(state.clone()),
            HeaderMap::new(),
            owner.clone(),
            Path(id),
            Json(BlogPayload {
                category: Some("mentalhealth".to_string()),
                ..BlogPayload::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(recategorized.0["data"]["category"], "MENTAL_HEALTH");

        let deleted = delete_blog(
            State(state.clone()),
            HeaderMap::new(),
            owner.clone(),
            Path(id),
        )
        .await
        .unwrap();
        assert_eq!(deleted.0["data"]["id"].as_i64(), Some(id));

        let err = delete_blog(State(state.clone()), HeaderMap::new(), owner, Path(id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn update_missing_blog_is_not_found() {
        let (state, _dir) = test_state().await;
        let doctor = seed_user(&state, "doc@x.com", Role::Doctor).await;

        let err = update_blog(
            State(state.clone()),
            HeaderMap::new(),
            doctor,
            Path(404),
            Json(BlogPayload::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
