use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use sanare_store::Database;

use crate::auth_api;
use crate::blogs_api;
use crate::config::ServerConfig;
use crate::media_store::MediaStore;
use crate::upload_api;

/// Shared state handed to every handler. The database handle is constructed
/// by `main` and injected here; no module opens its own connection.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub media: Arc<MediaStore>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(auth_api::signup))
        .route("/auth/login", post(auth_api::login))
        .route("/auth/me", get(auth_api::me))
        .route("/auth/signups", get(auth_api::list_signups))
        .route(
            "/blogs",
            get(blogs_api::list_published).post(blogs_api::create_blog),
        )
        .route("/blogs/mine", get(blogs_api::list_mine))
        .route(
            "/blogs/:id",
            get(blogs_api::get_blog)
                .put(blogs_api::update_blog)
                .delete(blogs_api::delete_blog),
        )
        .route("/upload", post(upload_api::handle_upload))
        .nest_service("/uploads", ServeDir::new(state.media.base_path()))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn test_router() -> (Router, AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let media = MediaStore::new(dir.path().join("uploads")).await.unwrap();
        let state = AppState {
            db: Arc::new(Mutex::new(db)),
            media: Arc::new(media),
            config: Arc::new(ServerConfig::default()),
        };
        (build_router(state.clone()), state, dir)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (router, _state, _dir) = test_router().await;
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn public_feed_is_reachable_anonymously() {
        let (router, _state, _dir) = test_router().await;
        let response = router
            .oneshot(Request::builder().uri("/blogs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn write_routes_require_a_token() {
        let (router, _state, _dir) = test_router().await;

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/blogs/mine")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/blogs")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    /// Assemble a multipart/form-data body from text fields plus an optional
    /// `profileImage` file part.
    fn multipart_request(
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Request<Body> {
        const BOUNDARY: &str = "sanare-test-boundary";

        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"profileImage\"; \
                     filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn signup_conflicts_on_duplicate_email_ignoring_case() {
        let (router, state, _dir) = test_router().await;

        let signup = |email: &str| {
            multipart_request(
                "/auth/signup",
                &[
                    ("email", email),
                    ("password", "hunter42"),
                    ("userType", "doctor"),
                    ("firstName", "Asha"),
                ],
                None,
            )
        };

        let response = router.clone().oneshot(signup("doc@x.com")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router.oneshot(signup("DOC@X.com")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // The conflicting attempt created no second account.
        assert_eq!(state.db.lock().await.list_users().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upload_attaches_profile_image_to_the_named_user() {
        let (router, state, _dir) = test_router().await;

        let user = state
            .db
            .lock()
            .await
            .create_user(&sanare_store::NewUser {
                email: "pic@x.com".to_string(),
                password_hash: "$argon2id$test".to_string(),
                first_name: None,
                last_name: None,
                username: None,
                role: sanare_store::Role::Patient,
                profile_image: None,
                address_line1: None,
                city: None,
                state: None,
                pincode: None,
            })
            .unwrap();

        let user_id = user.id.to_string();
        let request = multipart_request(
            "/upload",
            &[("type", "profiles"), ("userId", &user_id)],
            Some(("me.png", "image/png", b"png-bytes")),
        );

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let updated = state.db.lock().await.get_user(user.id).unwrap();
        let path = updated.profile_image.expect("image path recorded");
        assert!(path.starts_with("/uploads/profiles/"));
        assert!(path.ends_with(".png"));
    }

    #[tokio::test]
    async fn invalid_token_on_optional_route_degrades_to_anonymous() {
        let (router, _state, _dir) = test_router().await;

        // A garbage bearer token must not produce a 401 here; the missing
        // blog id resolves to a plain 404.
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/blogs/9999")
                    .header("authorization", "Bearer garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
