//! In-memory user repository for exercising the service rules

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tutorhub_database::{Role, UpdateUserRequest, User, UserError, UserResult, UserStatus};

/// Mock user repository keyed by public id
#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
    next_id: Arc<RwLock<i64>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a user fixture. The email is derived from the public id.
    pub fn user(public_id: &str, role: Role, status: UserStatus, courses: &[&str]) -> User {
        let now = chrono::Utc::now().to_rfc3339();
        User {
            id: 0,
            public_id: public_id.to_string(),
            name: format!("User {public_id}"),
            email: format!("{public_id}@example.com"),
            role,
            status,
            assigned_courses: courses.iter().map(|c| c.to_string()).collect(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub async fn insert(&self, mut user: User) -> User {
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        user.id = *next_id;

        let mut users = self.users.write().await;
        users.insert(user.public_id.clone(), user.clone());
        user
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(public_id).cloned())
    }

    pub async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    pub async fn list_by_status(&self, status: Option<UserStatus>) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut matching: Vec<User> = users
            .values()
            .filter(|u| status.map_or(true, |s| u.status == s))
            .cloned()
            .collect();
        matching.sort_by_key(|u| u.id);
        Ok(matching)
    }

    pub async fn approve(&self, public_id: &str, courses: &[String]) -> UserResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(public_id).ok_or(UserError::UserNotFound)?;

        if user.status != UserStatus::Pending {
            return Err(UserError::NotPending);
        }

        user.role = Role::Student;
        user.status = UserStatus::Active;
        user.assigned_courses = courses.to_vec();
        user.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(user.clone())
    }

    pub async fn update(&self, public_id: &str, request: &UpdateUserRequest) -> UserResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(public_id).ok_or(UserError::UserNotFound)?;

        if let Some(role) = &request.role {
            user.role = role.clone();
        }
        if let Some(status) = request.status {
            user.status = status;
        }
        if let Some(courses) = &request.assigned_courses {
            user.assigned_courses = courses.clone();
        }

        user.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(user.clone())
    }

    pub async fn delete(&self, public_id: &str) -> UserResult<()> {
        let mut users = self.users.write().await;
        users
            .remove(public_id)
            .map(|_| ())
            .ok_or(UserError::UserNotFound)
    }
}
