//! Authentication middleware and extractors for axum.
//!
//! - `auth_middleware` - validates the session token and injects the user
//! - `RequireAuth` - extractor that rejects anonymous requests
//! - `OptionalAuth` - extractor for routes that also serve guests
//!
//! ```text
//! Request → auth_middleware → injects AuthenticatedUser into extensions
//!                                      ↓
//!                              Handler → RequireAuth / OptionalAuth
//! ```
//!
//! The token is read from `Authorization: Bearer <token>` first, then from
//! the session cookie set by the storefront login page.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{AuthError, AuthenticatedUser, ErrorCode};
use crate::ports::SessionValidator;

/// Cookie carrying the session token when no Authorization header is sent.
pub const DEFAULT_SESSION_COOKIE: &str = "auth_token";

/// Auth middleware state.
#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<dyn SessionValidator>,
    pub cookie_name: String,
}

impl AuthState {
    pub fn new(validator: Arc<dyn SessionValidator>) -> Self {
        Self {
            validator,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }
}

/// Validates the session token when one is present.
///
/// - No token: the request continues anonymously
/// - Valid token: `AuthenticatedUser` is added to the extensions
/// - Invalid or expired token: the request continues anonymously with the
///   failure recorded, so `RequireAuth` answers 401 while `OptionalAuth`
///   routes still serve guests
/// - Auth backend down: 503
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(request.headers(), &auth.cookie_name) else {
        return next.run(request).await;
    };

    match auth.validator.validate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
        }
        Err(AuthError::ServiceUnavailable(msg)) => {
            tracing::error!(error = %msg, "Auth service unavailable");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error_code": ErrorCode::ServiceUnavailable.to_string(),
                    "message": "Authentication service unavailable",
                })),
            )
                .into_response();
        }
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unusable session token");
            request.extensions_mut().insert(RejectedToken(e));
        }
    }

    next.run(request).await
}

/// Marker left by `auth_middleware` when a token was sent but rejected.
#[derive(Debug, Clone)]
struct RejectedToken(AuthError);

/// Bearer header first, then the session cookie.
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Extractor that requires authentication.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
                return Ok(RequireAuth(user.clone()));
            }
            Err(match parts.extensions.get::<RejectedToken>() {
                Some(RejectedToken(AuthError::TokenExpired)) => AuthRejection::TokenExpired,
                Some(_) => AuthRejection::InvalidToken,
                None => AuthRejection::Unauthenticated,
            })
        })
    }
}

/// Extractor for optional authentication. `None` for guests.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user = parts.extensions.get::<AuthenticatedUser>().cloned();
            Ok(OptionalAuth(user))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No session token was sent.
    Unauthenticated,
    TokenExpired,
    InvalidToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::Unauthenticated => "Authentication required",
            AuthRejection::TokenExpired => "Token expired",
            AuthRejection::InvalidToken => "Invalid token",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error_code": ErrorCode::Unauthorized.to_string(),
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::domain::foundation::UserId;
    use axum::body::Body;
    use axum::extract::FromRequestParts;
    use axum::http::{HeaderValue, Request as HttpRequest};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn test_user() -> AuthenticatedUser {
        AuthenticatedUser::new(
            UserId::new("user-123").unwrap(),
            "test@example.com",
            Some("Test User".to_string()),
        )
    }

    fn app() -> Router {
        let validator = MockSessionValidator::new().with_user("valid-token", test_user());
        let state = AuthState::new(Arc::new(validator));

        async fn whoami(OptionalAuth(user): OptionalAuth) -> String {
            user.map(|u| u.id.to_string()).unwrap_or_else(|| "guest".to_string())
        }

        Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(state, auth_middleware))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Token Extraction
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("auth_token=from-cookie"));

        assert_eq!(
            session_token(&headers, DEFAULT_SESSION_COOKIE).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=abc.def.ghi; lang=id"),
        );

        assert_eq!(
            session_token(&headers, DEFAULT_SESSION_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn non_bearer_scheme_and_empty_cookie_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        headers.insert(header::COOKIE, HeaderValue::from_static("auth_token="));

        assert!(session_token(&headers, DEFAULT_SESSION_COOKIE).is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Middleware
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn anonymous_request_passes_through() {
        let response = app()
            .oneshot(HttpRequest::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "guest");
    }

    #[tokio::test]
    async fn cookie_session_injects_user() {
        let response = app()
            .oneshot(
                HttpRequest::get("/whoami")
                    .header(header::COOKIE, "auth_token=valid-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_text(response).await, "user-123");
    }

    #[tokio::test]
    async fn invalid_token_is_served_as_guest_on_optional_routes() {
        let response = app()
            .oneshot(
                HttpRequest::get("/whoami")
                    .header(header::AUTHORIZATION, "Bearer forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "guest");
    }

    #[tokio::test]
    async fn invalid_token_is_401_on_required_routes() {
        let validator = MockSessionValidator::new();
        let state = AuthState::new(Arc::new(validator));
        let app = Router::new()
            .route("/me", get(|RequireAuth(user): RequireAuth| async move { user.email }))
            .layer(axum::middleware::from_fn_with_state(state, auth_middleware));

        let response = app
            .oneshot(
                HttpRequest::get("/me")
                    .header(header::COOKIE, "auth_token=forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Invalid token"));
    }

    #[tokio::test]
    async fn unavailable_validator_is_503() {
        let validator =
            MockSessionValidator::new().with_error(AuthError::service_unavailable("down"));
        let state = AuthState::new(Arc::new(validator));
        let app = Router::new()
            .route("/me", get(|| async { "unreachable" }))
            .layer(axum::middleware::from_fn_with_state(state, auth_middleware));

        let response = app
            .oneshot(
                HttpRequest::get("/me")
                    .header(header::AUTHORIZATION, "Bearer anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Extractors
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn require_auth_extracts_user_from_extensions() {
        let mut request: HttpRequest<()> = HttpRequest::builder().uri("/test").body(()).unwrap();
        request.extensions_mut().insert(test_user());
        let (mut parts, _body) = request.into_parts();

        let RequireAuth(user) = RequireAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.email, "test@example.com");
    }

    #[tokio::test]
    async fn require_auth_fails_without_user() {
        let request: HttpRequest<()> = HttpRequest::builder().uri("/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthRejection::Unauthenticated)));
    }

    #[tokio::test]
    async fn require_auth_reports_expired_token() {
        let mut request: HttpRequest<()> = HttpRequest::builder().uri("/test").body(()).unwrap();
        request
            .extensions_mut()
            .insert(RejectedToken(AuthError::TokenExpired));
        let (mut parts, _body) = request.into_parts();

        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.unwrap_err(), AuthRejection::TokenExpired);
    }

    #[test]
    fn auth_rejection_returns_401() {
        let response = AuthRejection::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn auth_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuthState>();
    }
}
