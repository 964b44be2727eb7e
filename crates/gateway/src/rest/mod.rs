//! REST API endpoints and page handlers for the gateway

pub mod auth;
pub mod courses;
pub mod guard;
pub mod health;
pub mod pages;
pub mod public;
pub mod users;
pub mod waitlist;

use axum::Router;
use crate::state::GatewayState;
use std::sync::Arc;

/// Create all REST API routes
pub fn create_rest_routes(upload_limit: usize) -> Router<Arc<GatewayState>> {
    Router::new()
        // Public pages, crawler files and health
        .merge(public::create_public_routes())
        .merge(health::create_health_routes())
        // Guarded pages
        .merge(pages::create_page_routes())
        // Authentication routes
        .merge(auth::create_auth_routes())
        .merge(guard::create_guard_routes())
        // Admin user management
        .merge(users::create_user_routes())
        // Courses and files
        .merge(courses::create_course_routes(upload_limit))
        // Waitlist and contact intake
        .merge(waitlist::create_waitlist_routes())
}
