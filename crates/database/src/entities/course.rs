//! Course and course file entity definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub description: String,
    /// File entries in upload order.
    pub files: Vec<CourseFile>,
    pub created_at: String,
    pub updated_at: String,
}

impl Course {
    pub fn find_file(&self, file_id: &str) -> Option<&CourseFile> {
        self.files.iter().find(|file| file.id == file_id)
    }
}

/// Metadata for one uploaded course material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseFile {
    pub id: String,
    pub name: String,
    pub url: String,
    pub size: i64,
    pub uploaded_at: String,
    /// Public id of the uploading admin.
    pub uploaded_by: String,
    /// Student public ids allowed to see the file. Absent or empty means
    /// only admins can see it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_users: Option<Vec<String>>,
}

impl CourseFile {
    /// Whether a non-admin user is named on the allow-list.
    pub fn is_visible_to(&self, user_public_id: &str) -> bool {
        self.allowed_users
            .as_deref()
            .is_some_and(|allowed| allowed.iter().any(|id| id == user_public_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CreateCourseRequest {
    pub fn validate(&self) -> Result<(), String> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err("Course id cannot be empty".to_string());
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(
                "Course id may only contain letters, digits, '-' and '_'".to_string(),
            );
        }
        if self.name.trim().is_empty() {
            return Err("Course name cannot be empty".to_string());
        }
        Ok(())
    }
}
