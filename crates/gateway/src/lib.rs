//! # TutorHub Gateway Crate
//!
//! The HTTP surface of TutorHub. Routes requests to the user, course,
//! waitlist and mail services.
//!
//! ## Architecture
//!
//! - **Session gate**: resolves the caller from the session cookie or bearer
//!   token for every path except the crawler files
//! - **Page guard**: applies the access guard to `/dashboard`, `/pending`
//!   and `/courses/:id`
//! - **REST**: JSON API with OpenAPI documentation in debug builds
//! - **State**: shared services behind an `Arc`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tutorhub_gateway::{create_router, GatewayState};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = tutorhub_config::load()?;
//! let state = GatewayState::from_config(config).await?;
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7070").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;

pub use error::{ErrorResponse, GatewayError, GatewayResult};
pub use middleware::{Caller, SESSION_COOKIE};
pub use state::GatewayState;

use axum::{middleware as axum_middleware, Router};
use std::sync::Arc;

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let upload_limit = state.upload_limit();
    let arc_state = Arc::new(state);

    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(rest::create_rest_routes(upload_limit))
        .layer(axum_middleware::from_fn_with_state(
            arc_state.clone(),
            middleware::session_middleware,
        ))
        .with_state(arc_state);

    // Add Swagger UI if in debug mode
    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    router
        .layer(middleware::create_cors_middleware())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

#[cfg(debug_assertions)]
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        rest::health::health_check,
        rest::public::landing,
        rest::pages::dashboard,
        rest::pages::pending,
        rest::pages::course_page,
        rest::auth::register,
        rest::auth::login,
        rest::auth::logout,
        rest::auth::me,
        rest::guard::check_path,
        rest::users::list_users,
        rest::users::approve_user,
        rest::users::decline_user,
        rest::users::update_user,
        rest::courses::list_courses,
        rest::courses::get_course,
        rest::courses::upload_file,
        rest::courses::update_permissions,
        rest::courses::delete_file,
        rest::courses::download_file,
        rest::waitlist::join_waitlist,
        rest::waitlist::contact,
        rest::waitlist::list_entries,
        rest::waitlist::update_entry,
        rest::waitlist::delete_entry,
    ),
    components(
        schemas(
            ErrorResponse,
            rest::health::HealthResponse,
            rest::public::LandingResponse,
            rest::pages::DashboardResponse,
            rest::pages::CourseSummary,
            rest::pages::PendingResponse,
            rest::auth::RegisterRequest,
            rest::auth::LoginRequest,
            rest::auth::SessionResponse,
            rest::auth::UserResponse,
            rest::guard::GuardResponse,
            rest::users::ApproveUserRequest,
            rest::users::UpdateUserBody,
            rest::courses::CourseResponse,
            rest::courses::CourseFileResponse,
            rest::courses::UpdatePermissionsRequest,
            rest::waitlist::JoinWaitlistRequest,
            rest::waitlist::ContactRequest,
            rest::waitlist::UpdateWaitlistRequest,
            rest::waitlist::WaitlistEntryResponse,
            rest::waitlist::ContactResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Pages", description = "Guarded and public pages"),
        (name = "Auth", description = "Sign-up, sign-in and sessions"),
        (name = "Guard", description = "Access guard decisions"),
        (name = "Users", description = "Admin user management"),
        (name = "Courses", description = "Courses and course files"),
        (name = "Waitlist", description = "Waitlist and contact intake"),
    )
)]
struct ApiDoc;
