//! Guard decisions for front ends that route on their own.

use std::sync::Arc;

use axum::{extract::Query, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tutorhub_access::{evaluate, GuardDecision};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::Caller;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct GuardQuery {
    /// Page path to check, e.g. `/dashboard`.
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GuardResponse {
    pub path: String,
    /// `allow`, `placeholder` or `redirect`.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl GuardResponse {
    fn new(path: String, decision: GuardDecision) -> Self {
        let (action, location) = match decision {
            GuardDecision::Allow => ("allow", None),
            GuardDecision::Placeholder => ("placeholder", None),
            GuardDecision::Redirect(target) => ("redirect", Some(target)),
        };
        Self {
            path,
            action: action.to_string(),
            location,
        }
    }
}

pub fn create_guard_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/api/guard", get(check_path))
}

#[utoipa::path(
    get,
    path = "/api/guard",
    tag = "Guard",
    params(GuardQuery),
    responses(
        (status = 200, description = "Decision for the caller and path", body = GuardResponse),
        (status = 400, description = "Path is not absolute", body = ErrorResponse)
    )
)]
pub async fn check_path(
    Extension(caller): Extension<Caller>,
    Query(query): Query<GuardQuery>,
) -> GatewayResult<Json<GuardResponse>> {
    if !query.path.starts_with('/') {
        return Err(GatewayError::InvalidRequest(
            "path must start with '/'".to_string(),
        ));
    }

    let decision = evaluate(&caller.auth_state(), &query.path);
    Ok(Json(GuardResponse::new(query.path, decision)))
}
