//! User entity definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tutorhub_access::{Role, Viewer};

/// A registered account together with its role and course assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing, default)]
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    /// Course ids in assignment order.
    pub assigned_courses: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn viewer(&self) -> Viewer<'_> {
        Viewer::new(&self.role, &self.assigned_courses)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_assigned_to(&self, course_id: &str) -> bool {
        self.assigned_courses.iter().any(|id| id == course_id)
    }
}

/// Admin edit of an existing user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub assigned_courses: Option<Vec<String>>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.status.is_none() && self.assigned_courses.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Pending,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Pending => "pending",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            "pending" => Ok(UserStatus::Pending),
            other => Err(format!("unknown user status '{other}'")),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
