//! Session gate, page guard and other cross-cutting concerns

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};
use tutorhub_access::{evaluate, AuthState, GuardDecision};
use tutorhub_auth::AuthError;
use tutorhub_database::User;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

pub const SESSION_COOKIE: &str = "tutorhub_session";

/// Served without looking at the session store.
const CRAWLER_PATHS: &[&str] = &["/robots.txt", "/sitemap.xml", "/favicon.ico"];

/// Who is making the request, as resolved by [`session_middleware`].
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    /// Valid session whose profile could not be read yet.
    Loading { token: String },
    Authenticated { user: User, token: String },
}

impl Caller {
    pub fn auth_state(&self) -> AuthState<'_> {
        match self {
            Caller::Anonymous => AuthState::Unauthenticated,
            Caller::Loading { .. } => AuthState::Loading,
            Caller::Authenticated { user, .. } => AuthState::Authenticated(user.viewer()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Caller::Anonymous => None,
            Caller::Loading { token } | Caller::Authenticated { token, .. } => Some(token),
        }
    }

    pub fn user(&self) -> GatewayResult<&User> {
        match self {
            Caller::Authenticated { user, .. } => Ok(user),
            Caller::Loading { .. } => Err(GatewayError::AuthenticationFailed(
                "profile is not available yet".to_string(),
            )),
            Caller::Anonymous => Err(GatewayError::unauthenticated()),
        }
    }

    pub fn admin(&self) -> GatewayResult<&User> {
        let user = self.user()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(GatewayError::forbidden())
        }
    }
}

pub fn is_crawler_path(path: &str) -> bool {
    CRAWLER_PATHS.contains(&path)
}

/// Bearer token first, then the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolve the caller for every request except the crawler files.
pub async fn session_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if is_crawler_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let caller = match session_token(request.headers()) {
        Some(token) => resolve_caller(&state, token).await?,
        None => Caller::Anonymous,
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

async fn resolve_caller(state: &GatewayState, token: String) -> GatewayResult<Caller> {
    match state.authenticator().authenticate_token(&token).await {
        Ok((user, _session)) => Ok(Caller::Authenticated { user, token }),
        Err(AuthError::ProfileUnavailable(reason)) => {
            warn!(%reason, "session profile unavailable");
            Ok(Caller::Loading { token })
        }
        Err(
            error @ (AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession),
        ) => {
            debug!(%error, "ignoring stale session token");
            Ok(Caller::Anonymous)
        }
        Err(error) => Err(error.into()),
    }
}

/// Apply the access guard to page routes.
pub async fn page_guard(
    Extension(caller): Extension<Caller>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    match evaluate(&caller.auth_state(), &path) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Placeholder => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "loading", "path": path })),
        )
            .into_response(),
        GuardDecision::Redirect(target) => {
            debug!(from = %path, to = %target, "page guard redirect");
            Redirect::to(&target).into_response()
        }
    }
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// CORS layer. Origins are mirrored so the session cookie can travel.
pub fn create_cors_middleware() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .allow_credentials(true)
}
