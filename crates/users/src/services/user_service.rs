//! User service for admin account management.

use std::future::Future;

use super::mock_repositories::MockUserRepository;
use tracing::{info, warn};
use tutorhub_database::{
    Role, SqlitePool, UpdateUserRequest, User, UserError, UserRepository, UserResult, UserStatus,
};

/// Service applying the approval and edit rules on top of a repository
#[derive(Clone)]
pub struct UserService<R> {
    user_repository: R,
}

impl UserService<UserRepository> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            user_repository: UserRepository::new(pool),
        }
    }
}

impl UserService<MockUserRepository> {
    /// Create a user service backed by the in-memory repository
    pub fn new_for_testing() -> Self {
        Self {
            user_repository: MockUserRepository::new(),
        }
    }
}

impl<R> UserService<R>
where
    R: UserRepo,
{
    pub fn with_repository(user_repository: R) -> Self {
        Self { user_repository }
    }

    pub fn repository(&self) -> &R {
        &self.user_repository
    }

    /// Get a user by public ID
    pub async fn get_user(&self, public_id: &str) -> UserResult<User> {
        self.user_repository
            .find_by_public_id(public_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    pub async fn list_users(&self, status: Option<UserStatus>) -> UserResult<Vec<User>> {
        self.user_repository.list_by_status(status).await
    }

    /// Approve a pending sign-up as a student with at least one course.
    pub async fn approve_user(&self, public_id: &str, courses: Vec<String>) -> UserResult<User> {
        let courses = normalize_courses(courses);
        if courses.is_empty() {
            return Err(UserError::InvalidRequest(
                "at least one course must be assigned".to_string(),
            ));
        }

        let user = self.user_repository.approve(public_id, &courses).await?;
        info!(user = %user.public_id, courses = ?user.assigned_courses, "approved user");
        Ok(user)
    }

    /// Permanently delete a pending sign-up.
    pub async fn decline_user(&self, public_id: &str) -> UserResult<()> {
        let user = self.get_user(public_id).await?;
        if user.status != UserStatus::Pending {
            return Err(UserError::NotPending);
        }

        self.user_repository.delete(public_id).await?;
        warn!(user = %public_id, email = %user.email, "declined and deleted user");
        Ok(())
    }

    /// Edit the role, status or course list of an approved account.
    pub async fn update_user(&self, public_id: &str, mut request: UpdateUserRequest) -> UserResult<User> {
        if request.is_empty() {
            return Err(UserError::InvalidRequest("no fields to update".to_string()));
        }

        match &request.role {
            Some(Role::Pending) => {
                return Err(UserError::InvalidRequest(
                    "role cannot be set back to pending".to_string(),
                ))
            }
            Some(Role::Other(value)) => {
                return Err(UserError::InvalidRequest(format!("unknown role '{value}'")))
            }
            _ => {}
        }

        if request.status == Some(UserStatus::Pending) {
            return Err(UserError::InvalidRequest(
                "status cannot be set back to pending".to_string(),
            ));
        }

        let existing = self.get_user(public_id).await?;
        if existing.status == UserStatus::Pending || existing.role == Role::Pending {
            return Err(UserError::StillPending);
        }

        request.assigned_courses = request.assigned_courses.map(normalize_courses);

        let updated = self.user_repository.update(public_id, &request).await?;
        info!(user = %public_id, role = %updated.role, status = %updated.status, "updated user");
        Ok(updated)
    }

    /// Make an existing account an active admin. Used by the console.
    pub async fn promote_admin(&self, email: &str) -> UserResult<User> {
        let user = self
            .user_repository
            .find_by_email(email.trim())
            .await?
            .ok_or(UserError::UserNotFound)?;

        let request = UpdateUserRequest {
            role: Some(Role::Admin),
            status: Some(UserStatus::Active),
            assigned_courses: None,
        };

        let updated = self.user_repository.update(&user.public_id, &request).await?;
        info!(user = %updated.public_id, "promoted user to admin");
        Ok(updated)
    }
}

/// Trims ids, drops blanks and repeats, keeps first-seen order.
fn normalize_courses(courses: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(courses.len());
    for course in courses {
        let course = course.trim();
        if !course.is_empty() && !normalized.iter().any(|existing| existing == course) {
            normalized.push(course.to_string());
        }
    }
    normalized
}

/// Trait for user repositories to allow generic usage
pub trait UserRepo: Send + Sync {
    fn find_by_public_id(&self, public_id: &str)
        -> impl Future<Output = UserResult<Option<User>>> + Send;
    fn find_by_email(&self, email: &str) -> impl Future<Output = UserResult<Option<User>>> + Send;
    fn list_by_status(
        &self,
        status: Option<UserStatus>,
    ) -> impl Future<Output = UserResult<Vec<User>>> + Send;
    fn approve(&self, public_id: &str, courses: &[String])
        -> impl Future<Output = UserResult<User>> + Send;
    fn update(
        &self,
        public_id: &str,
        request: &UpdateUserRequest,
    ) -> impl Future<Output = UserResult<User>> + Send;
    fn delete(&self, public_id: &str) -> impl Future<Output = UserResult<()>> + Send;
}

impl UserRepo for UserRepository {
    async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        UserRepository::find_by_public_id(self, public_id).await
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        UserRepository::find_by_email(self, email).await
    }

    async fn list_by_status(&self, status: Option<UserStatus>) -> UserResult<Vec<User>> {
        UserRepository::list_by_status(self, status).await
    }

    async fn approve(&self, public_id: &str, courses: &[String]) -> UserResult<User> {
        UserRepository::approve(self, public_id, courses).await
    }

    async fn update(&self, public_id: &str, request: &UpdateUserRequest) -> UserResult<User> {
        UserRepository::update(self, public_id, request).await
    }

    async fn delete(&self, public_id: &str) -> UserResult<()> {
        UserRepository::delete(self, public_id).await
    }
}

impl UserRepo for MockUserRepository {
    async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        MockUserRepository::find_by_public_id(self, public_id).await
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        MockUserRepository::find_by_email(self, email).await
    }

    async fn list_by_status(&self, status: Option<UserStatus>) -> UserResult<Vec<User>> {
        MockUserRepository::list_by_status(self, status).await
    }

    async fn approve(&self, public_id: &str, courses: &[String]) -> UserResult<User> {
        MockUserRepository::approve(self, public_id, courses).await
    }

    async fn update(&self, public_id: &str, request: &UpdateUserRequest) -> UserResult<User> {
        MockUserRepository::update(self, public_id, request).await
    }

    async fn delete(&self, public_id: &str) -> UserResult<()> {
        MockUserRepository::delete(self, public_id).await
    }
}
