//! Public pages and crawler files.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::GatewayState;

/// Pages listed in the sitemap.
const PUBLIC_PAGES: &[&str] = &["/", "/login", "/register"];

#[derive(Debug, Serialize, ToSchema)]
pub struct LandingResponse {
    pub name: String,
    pub sign_in: String,
    pub register: String,
    pub waitlist: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

pub fn create_public_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/", get(landing))
        .route("/robots.txt", get(robots))
        .route("/sitemap.xml", get(sitemap))
        .route("/favicon.ico", get(favicon))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Pages",
    responses((status = 200, description = "Landing page summary", body = LandingResponse))
)]
pub async fn landing(State(state): State<Arc<GatewayState>>) -> Json<LandingResponse> {
    let site = state.site();
    Json(LandingResponse {
        name: site.name.clone(),
        sign_in: tutorhub_access::SIGN_IN_PATH.to_string(),
        register: "/register".to_string(),
        waitlist: "/api/waitlist".to_string(),
        contact: "/api/contact".to_string(),
        contact_email: site.contact_email.clone(),
    })
}

pub async fn robots(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let base = state.site().public_url.trim_end_matches('/').to_string();
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\nDisallow: /dashboard\nDisallow: /pending\nDisallow: /courses/\n\nSitemap: {base}/sitemap.xml\n"
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

pub async fn sitemap(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let base = state.site().public_url.trim_end_matches('/').to_string();
    let urls: String = PUBLIC_PAGES
        .iter()
        .map(|page| format!("  <url><loc>{base}{page}</loc></url>\n"))
        .collect();
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{urls}</urlset>\n"
    );
    ([(header::CONTENT_TYPE, "application/xml")], body)
}

/// No icon is bundled; answer without a body so browsers stop asking.
pub async fn favicon() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::CACHE_CONTROL, "public, max-age=86400")],
    )
}
