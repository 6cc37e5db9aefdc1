use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{DummyLoginRequest, LoginRequest, RegisterRequest, RegisteredUser, TokenResponse},
        extractors::ValidJson,
        role::{Role, RoleError},
        services::{AuthError, Registration},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/dummyLogin", post(dummy_login))
        .route("/register", post(register))
        .route("/login", post(login))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(message)),
    }
}

fn parse_role(raw: Option<&str>) -> Result<Role, ApiError> {
    Role::parse(raw).map_err(|e| {
        match &e {
            RoleError::Invalid(raw) => warn!(role = %raw, "unknown role rejected"),
            RoleError::Missing => warn!("role missing"),
        }
        ApiError::bad_request(e.to_string())
    })
}

fn checked_email(raw: String) -> Result<String, ApiError> {
    let email = raw.trim().to_string();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::bad_request("Email must be correct"));
    }
    Ok(email)
}

fn token_failed(e: AuthError) -> ApiError {
    error!(error = %e, "token generation failed");
    ApiError::internal("Failed to generate token")
}

#[instrument(skip(state, payload))]
pub async fn dummy_login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<DummyLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let role = parse_role(payload.role.as_deref())?;

    let token = state.auth.create_token(role).map_err(token_failed)?;

    info!(%role, "dummy token issued");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUser>), ApiError> {
    let email = required(payload.email, "Email is required")?;
    let password = required(payload.password, "Password is required")?;
    let role = parse_role(payload.role.as_deref())?;
    let email = checked_email(email)?;

    match state.auth.register(&email, &password, role).await {
        Ok(Registration::Created(user)) => Ok((
            StatusCode::CREATED,
            Json(RegisteredUser {
                email: user.email,
                role: user.role,
            }),
        )),
        Ok(Registration::AlreadyExists) => {
            warn!(email = %email, "email already registered");
            Err(ApiError::bad_request("User with this email already exists"))
        }
        Err(e) => {
            error!(error = %e, "register failed");
            Err(ApiError::internal("Failed to create user"))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = required(payload.email, "Email is required")?;
    let password = required(payload.password, "Password is required")?;
    let email = checked_email(email)?;

    match state.auth.login(&email, &password).await {
        Ok(token) => Ok(Json(TokenResponse { token })),
        Err(AuthError::InvalidCredentials) => Err(ApiError::unauthorized("Failed login")),
        Err(e @ AuthError::TokenGeneration(_)) => Err(token_failed(e)),
        Err(e) => {
            error!(error = %e, "login failed");
            Err(ApiError::internal("Failed login"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{
        app::build_app,
        auth::{memory::MemoryUserStore, repo::UserStore, role::Role},
        state::AppState,
    };

    const ROLE_MESSAGE: &str = "Role must be 'employee' or 'moderator'";

    fn app_with(store: Arc<MemoryUserStore>) -> Router {
        build_app(AppState::fake_with(store))
    }

    async fn post_raw(app: &Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        post_raw(app, uri, body.to_string()).await
    }

    #[tokio::test]
    async fn register_requires_each_field_before_touching_store() {
        let cases = [
            (json!({"password": "pw", "role": "moderator"}), "Email is required"),
            (json!({"email": "", "password": "pw", "role": "moderator"}), "Email is required"),
            (json!({"email": "t@test.com", "role": "moderator"}), "Password is required"),
            (json!({"email": "t@test.com", "password": "", "role": "moderator"}), "Password is required"),
            (json!({"email": "t@test.com", "password": "pw"}), "Role is required"),
            (json!({"email": "t@test.com", "password": "pw", "role": ""}), "Role is required"),
            (json!({"email": "t@test.com", "password": "pw", "role": "admin"}), ROLE_MESSAGE),
            (json!({"email": "test", "password": "pw", "role": "moderator"}), "Email must be correct"),
        ];

        let store = Arc::new(MemoryUserStore::new());
        let app = app_with(store.clone());
        for (body, message) in cases {
            let (status, value) = post_json(&app, "/register", body.clone()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(value["message"], message, "body: {body}");
        }
        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test]
    async fn malformed_bodies_are_rejected() {
        let app = app_with(Arc::new(MemoryUserStore::new()));
        for uri in ["/register", "/login", "/dummyLogin"] {
            let (status, value) = post_raw(&app, uri, "invalid_json_string").await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(value["message"], "Invalid request format");
        }

        let (status, value) = post_json(&app, "/dummyLogin", json!({"role": 7})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["message"], "Invalid request format");
    }

    #[tokio::test]
    async fn register_then_duplicate() {
        let store = Arc::new(MemoryUserStore::new());
        let app = app_with(store.clone());
        let body = json!({"email": "test@test.com", "password": "test", "role": "moderator"});

        let (status, value) = post_json(&app, "/register", body.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(value, json!({"email": "test@test.com", "role": "moderator"}));

        let (status, value) = post_json(&app, "/register", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["message"], "User with this email already exists");
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn register_keeps_email_case() {
        let store = Arc::new(MemoryUserStore::new());
        let app = app_with(store.clone());

        let (status, value) = post_json(
            &app,
            "/register",
            json!({"email": "Test@Test.com", "password": "pw", "role": "employee"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(value, json!({"email": "Test@Test.com", "role": "employee"}));
        assert!(store.stored("Test@Test.com").is_some());
        assert!(store.stored("test@test.com").is_none());

        let (status, value) = post_json(
            &app,
            "/register",
            json!({"email": " Test@Test.com ", "password": "pw", "role": "employee"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["message"], "User with this email already exists");
    }

    #[tokio::test]
    async fn register_store_failure_is_reported_not_fatal() {
        let app = app_with(Arc::new(MemoryUserStore::unavailable()));
        let (status, value) = post_json(
            &app,
            "/register",
            json!({"email": "t@test.com", "password": "pw", "role": "employee"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["message"], "Failed to create user");
    }

    #[tokio::test]
    async fn login_store_failure_is_reported_not_fatal() {
        let app = app_with(Arc::new(MemoryUserStore::unavailable()));
        let (status, value) = post_json(
            &app,
            "/login",
            json!({"email": "t@test.com", "password": "pw"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["message"], "Failed login");
    }

    #[tokio::test]
    async fn login_with_unreadable_stored_hash_is_a_server_error() {
        let store = Arc::new(MemoryUserStore::new());
        store
            .create_user("bad@test.com", "not-a-valid-hash", Role::Employee)
            .await
            .unwrap();
        let app = app_with(store);

        let (status, value) = post_json(
            &app,
            "/login",
            json!({"email": "bad@test.com", "password": "pw"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["message"], "Failed login");
        assert!(value.get("token").is_none());
    }

    #[tokio::test]
    async fn dummy_login_issues_role_tokens() {
        let app = app_with(Arc::new(MemoryUserStore::new()));

        let (status, employee) = post_json(&app, "/dummyLogin", json!({"role": "employee"})).await;
        assert_eq!(status, StatusCode::OK);
        let (status, moderator) = post_json(&app, "/dummyLogin", json!({"role": "moderator"})).await;
        assert_eq!(status, StatusCode::OK);

        let employee = employee["token"].as_str().unwrap();
        let moderator = moderator["token"].as_str().unwrap();
        assert!(!employee.is_empty());
        assert_ne!(employee, moderator);
    }

    #[tokio::test]
    async fn dummy_login_validates_role() {
        let app = app_with(Arc::new(MemoryUserStore::new()));
        let cases = [
            (json!({"role": "admin"}), ROLE_MESSAGE),
            (json!({"role": ""}), "Role is required"),
            (json!({"wrong_field": "employee"}), "Role is required"),
        ];
        for (body, message) in cases {
            let (status, value) = post_json(&app, "/dummyLogin", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(value["message"], message);
        }

        let (status, value) = post_raw(&app, "/dummyLogin", Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["message"], "Role is required");
    }

    #[tokio::test]
    async fn login_validates_fields() {
        let app = app_with(Arc::new(MemoryUserStore::new()));
        let cases = [
            (json!({"password": ""}), "Email is required"),
            (json!({"email": "test@test.com"}), "Password is required"),
            (json!({"email": "test@test.com", "password": ""}), "Password is required"),
            (json!({"email": "test", "password": "test"}), "Email must be correct"),
        ];
        for (body, message) in cases {
            let (status, value) = post_json(&app, "/login", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(value["message"], message);
        }
    }

    #[tokio::test]
    async fn login_round_trip_and_generic_failures() {
        let app = app_with(Arc::new(MemoryUserStore::new()));
        post_json(
            &app,
            "/register",
            json!({"email": "user@test.com", "password": "s3cret", "role": "employee"}),
        )
        .await;

        let (status, value) = post_json(
            &app,
            "/login",
            json!({"email": "user@test.com", "password": "s3cret"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!value["token"].as_str().unwrap().is_empty());

        let wrong = post_json(
            &app,
            "/login",
            json!({"email": "user@test.com", "password": "wrong"}),
        )
        .await;
        let unknown = post_json(
            &app,
            "/login",
            json!({"email": "ghost@test.com", "password": "s3cret"}),
        )
        .await;
        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
        assert_eq!(wrong.1["message"], "Failed login");
    }

    #[tokio::test]
    async fn responses_never_carry_password_or_hash() {
        let store = Arc::new(MemoryUserStore::new());
        let app = app_with(store.clone());

        let (_, registered) = post_json(
            &app,
            "/register",
            json!({"email": "leak@test.com", "password": "plain-pass", "role": "moderator"}),
        )
        .await;
        let (_, logged_in) = post_json(
            &app,
            "/login",
            json!({"email": "leak@test.com", "password": "plain-pass"}),
        )
        .await;

        let hash = store.stored("leak@test.com").unwrap().password_hash;
        assert_ne!(hash, "plain-pass");
        for body in [registered.to_string(), logged_in.to_string()] {
            assert!(!body.contains("plain-pass"));
            assert!(!body.contains(&hash));
        }
    }

    #[test]
    fn email_format() {
        assert!(super::is_valid_email("a@b.co"));
        assert!(!super::is_valid_email("test"));
        assert!(!super::is_valid_email("a@b"));
        assert!(!super::is_valid_email("a b@c.de"));
    }
}
