//! # TutorHub Access Crate
//!
//! Roles and the page guard. The guard is a pure function of the caller's
//! authentication state and the requested path. It either lets the page
//! render, asks for a placeholder while the profile is still resolving, or
//! names the page to navigate to instead.
//!
//! ```
//! use tutorhub_access::{evaluate, AuthState, GuardDecision, Role, Viewer};
//!
//! let courses = vec!["algebra-1".to_string()];
//! let viewer = Viewer::new(&Role::Student, &courses);
//!
//! let decision = evaluate(&AuthState::Authenticated(viewer), "/");
//! assert_eq!(decision, GuardDecision::Redirect("/courses/algebra-1".into()));
//! ```

pub mod guard;
pub mod role;

pub use guard::{
    course_path, evaluate, AuthState, GuardDecision, Viewer, COURSE_PATH_PREFIX,
    DASHBOARD_PATH, SIGN_IN_PATH, WAITING_PATH,
};
pub use role::Role;
