//! Page guard

use serde::Serialize;

use crate::role::Role;

pub const SIGN_IN_PATH: &str = "/login";
pub const WAITING_PATH: &str = "/pending";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const COURSE_PATH_PREFIX: &str = "/courses/";

/// Authenticated caller as seen by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer<'a> {
    pub role: &'a Role,
    /// Assigned course ids in the order they were stored.
    pub assigned_courses: &'a [String],
}

impl<'a> Viewer<'a> {
    pub fn new(role: &'a Role, assigned_courses: &'a [String]) -> Self {
        Self {
            role,
            assigned_courses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState<'a> {
    /// Session known but the profile has not resolved yet.
    Loading,
    Unauthenticated,
    Authenticated(Viewer<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "location", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    Placeholder,
    Redirect(String),
}

pub fn course_path(course_id: &str) -> String {
    format!("{COURSE_PATH_PREFIX}{course_id}")
}

/// Decide whether `path` may render for the given caller.
pub fn evaluate(state: &AuthState<'_>, path: &str) -> GuardDecision {
    let viewer = match state {
        AuthState::Loading => return GuardDecision::Placeholder,
        AuthState::Unauthenticated => return redirect(SIGN_IN_PATH),
        AuthState::Authenticated(viewer) => viewer,
    };

    match viewer.role {
        Role::Pending => {
            if path == WAITING_PATH {
                GuardDecision::Allow
            } else {
                redirect(WAITING_PATH)
            }
        }
        Role::Student => match viewer.assigned_courses.first() {
            Some(first) => {
                if path.starts_with(COURSE_PATH_PREFIX) || path == DASHBOARD_PATH {
                    GuardDecision::Allow
                } else {
                    GuardDecision::Redirect(course_path(first))
                }
            }
            None => {
                if path == DASHBOARD_PATH {
                    GuardDecision::Allow
                } else {
                    redirect(DASHBOARD_PATH)
                }
            }
        },
        Role::Admin => GuardDecision::Allow,
        Role::Other(_) => redirect(SIGN_IN_PATH),
    }
}

fn redirect(target: &str) -> GuardDecision {
    GuardDecision::Redirect(target.to_string())
}
