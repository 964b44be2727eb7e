//! User repository for database operations.

use crate::entities::{UpdateUserRequest, User, UserStatus};
use crate::types::{UserError, UserResult};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tutorhub_access::Role;

const USER_COLUMNS: &str =
    "id, public_id, name, email, role, status, assigned_courses, created_at, updated_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Find user by internal ID
    pub async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Find user by public ID
    pub async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// List users with the given status, oldest first. `None` lists everyone.
    pub async fn list_by_status(&self, status: Option<UserStatus>) -> UserResult<Vec<User>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE status = ? ORDER BY created_at, id"
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(user_from_row).collect()
    }

    /// Promote a pending user to an active student with the given courses.
    ///
    /// The status check lives in the WHERE clause so two concurrent approvals
    /// cannot both succeed.
    pub async fn approve(&self, public_id: &str, courses: &[String]) -> UserResult<User> {
        let now = Utc::now().to_rfc3339();
        let assigned = serde_json::to_string(courses)?;

        let result = sqlx::query(
            "UPDATE users SET role = ?, status = ?, assigned_courses = ?, updated_at = ? WHERE public_id = ? AND status = 'pending'",
        )
        .bind(Role::Student.as_str())
        .bind(UserStatus::Active.as_str())
        .bind(&assigned)
        .bind(&now)
        .bind(public_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_by_public_id(public_id).await? {
                Some(_) => Err(UserError::NotPending),
                None => Err(UserError::UserNotFound),
            };
        }

        self.find_by_public_id(public_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    /// Apply an admin edit. Fields left as `None` are untouched.
    pub async fn update(&self, public_id: &str, request: &UpdateUserRequest) -> UserResult<User> {
        let mut set_parts = Vec::new();
        let mut values = Vec::new();

        if let Some(role) = &request.role {
            set_parts.push("role = ?");
            values.push(role.as_str().to_string());
        }

        if let Some(status) = request.status {
            set_parts.push("status = ?");
            values.push(status.as_str().to_string());
        }

        if let Some(courses) = &request.assigned_courses {
            set_parts.push("assigned_courses = ?");
            values.push(serde_json::to_string(courses)?);
        }

        if set_parts.is_empty() {
            return self
                .find_by_public_id(public_id)
                .await?
                .ok_or(UserError::UserNotFound);
        }

        set_parts.push("updated_at = ?");
        values.push(Utc::now().to_rfc3339());

        let statement = format!(
            "UPDATE users SET {} WHERE public_id = ?",
            set_parts.join(", ")
        );

        let mut query = sqlx::query(&statement);
        for value in values {
            query = query.bind(value);
        }

        let result = query.bind(public_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        self.find_by_public_id(public_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    /// Permanently remove a user. Sessions and identities cascade.
    pub async fn delete(&self, public_id: &str) -> UserResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        Ok(())
    }
}

pub(crate) fn user_from_row(row: &SqliteRow) -> UserResult<User> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    let assigned: String = row.try_get("assigned_courses")?;

    Ok(User {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: Role::from(role),
        status: status.parse().map_err(UserError::SerializationError)?,
        assigned_courses: serde_json::from_str(&assigned)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialize_database;
    use tempfile::TempDir;
    use tutorhub_config::DatabaseConfig;

    async fn setup() -> (UserRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("users.db").display()),
            max_connections: 1,
        };
        let pool = initialize_database(&config).await.unwrap();
        (UserRepository::new(pool), temp_dir)
    }

    async fn insert_user(repo: &UserRepository, public_id: &str, email: &str, role: &str, status: &str) {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (public_id, name, email, role, status, assigned_courses, created_at, updated_at) VALUES (?, ?, ?, ?, ?, '[]', ?, ?)",
        )
        .bind(public_id)
        .bind("Test User")
        .bind(email)
        .bind(role)
        .bind(status)
        .bind(&now)
        .bind(&now)
        .execute(repo.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn approve_promotes_pending_user() {
        let (repo, _dir) = setup().await;
        insert_user(&repo, "u1", "ada@example.com", "pending", "pending").await;

        let user = repo
            .approve("u1", &["algebra".to_string(), "geometry".to_string()])
            .await
            .unwrap();

        assert_eq!(user.role, Role::Student);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.assigned_courses, vec!["algebra", "geometry"]);
    }

    #[tokio::test]
    async fn approve_twice_reports_not_pending() {
        let (repo, _dir) = setup().await;
        insert_user(&repo, "u1", "ada@example.com", "pending", "pending").await;

        repo.approve("u1", &["algebra".to_string()]).await.unwrap();
        let err = repo.approve("u1", &["geometry".to_string()]).await.unwrap_err();

        assert_eq!(err, UserError::NotPending);
        let user = repo.find_by_public_id("u1").await.unwrap().unwrap();
        assert_eq!(user.assigned_courses, vec!["algebra"]);
    }

    #[tokio::test]
    async fn approve_unknown_user_is_not_found() {
        let (repo, _dir) = setup().await;
        let err = repo.approve("missing", &["algebra".to_string()]).await.unwrap_err();
        assert_eq!(err, UserError::UserNotFound);
    }

    #[tokio::test]
    async fn list_by_status_filters() {
        let (repo, _dir) = setup().await;
        insert_user(&repo, "p1", "p1@example.com", "pending", "pending").await;
        insert_user(&repo, "s1", "s1@example.com", "student", "active").await;
        insert_user(&repo, "p2", "p2@example.com", "pending", "pending").await;

        let pending = repo.list_by_status(Some(UserStatus::Pending)).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|u| u.public_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        let everyone = repo.list_by_status(None).await.unwrap();
        assert_eq!(everyone.len(), 3);
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let (repo, _dir) = setup().await;
        insert_user(&repo, "s1", "s1@example.com", "student", "active").await;

        let request = UpdateUserRequest {
            assigned_courses: Some(vec!["chemistry".to_string()]),
            ..Default::default()
        };
        let user = repo.update("s1", &request).await.unwrap();

        assert_eq!(user.role, Role::Student);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.assigned_courses, vec!["chemistry"]);
    }

    #[tokio::test]
    async fn unknown_role_strings_survive_a_round_trip() {
        let (repo, _dir) = setup().await;
        insert_user(&repo, "g1", "g1@example.com", "guest", "active").await;

        let user = repo.find_by_public_id("g1").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Other("guest".to_string()));
    }

    #[tokio::test]
    async fn delete_removes_user() {
        let (repo, _dir) = setup().await;
        insert_user(&repo, "p1", "p1@example.com", "pending", "pending").await;

        repo.delete("p1").await.unwrap();
        assert!(repo.find_by_public_id("p1").await.unwrap().is_none());
        assert_eq!(repo.delete("p1").await.unwrap_err(), UserError::UserNotFound);
    }

    #[tokio::test]
    async fn find_by_email_ignores_case() {
        let (repo, _dir) = setup().await;
        insert_user(&repo, "u1", "Ada@Example.com", "student", "active").await;

        let user = repo.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(user.map(|u| u.public_id), Some("u1".to_string()));
    }
}
