//! User service tests against a real SQLite database

use chrono::Utc;
use tempfile::TempDir;
use tutorhub_config::DatabaseConfig;
use tutorhub_database::{initialize_database, SqlitePool};
use tutorhub_users::{Role, UpdateUserRequest, UserError, UserRepository, UserService, UserStatus};

async fn create_test_database() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", temp_dir.path().join("users.db").display()),
        max_connections: 2,
    };
    let pool = initialize_database(&config).await.unwrap();
    (pool, temp_dir)
}

async fn insert_user(pool: &SqlitePool, public_id: &str, role: &str, status: &str) {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (public_id, name, email, role, status, assigned_courses, created_at, updated_at) VALUES (?, ?, ?, ?, ?, '[]', ?, ?)",
    )
    .bind(public_id)
    .bind(format!("User {public_id}"))
    .bind(format!("{public_id}@example.com"))
    .bind(role)
    .bind(status)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();
}

fn service(pool: &SqlitePool) -> UserService<UserRepository> {
    UserService::new(pool.clone())
}

#[tokio::test]
async fn approval_flow_persists() {
    let (pool, _temp_dir) = create_test_database().await;
    insert_user(&pool, "p1", "pending", "pending").await;
    let service = service(&pool);

    let approved = service
        .approve_user("p1", vec!["algebra".into(), "geometry".into()])
        .await
        .unwrap();
    assert_eq!(approved.role, Role::Student);

    let reloaded = service.get_user("p1").await.unwrap();
    assert_eq!(reloaded.status, UserStatus::Active);
    assert_eq!(reloaded.assigned_courses, vec!["algebra", "geometry"]);

    let again = service.approve_user("p1", vec!["biology".into()]).await;
    assert_eq!(again.unwrap_err(), UserError::NotPending);
}

#[tokio::test]
async fn decline_deletes_user_and_sessions() {
    let (pool, _temp_dir) = create_test_database().await;
    insert_user(&pool, "p1", "pending", "pending").await;

    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO sessions (user_id, token, created_at, expires_at) SELECT id, 'tok', ?, ? FROM users WHERE public_id = 'p1'",
    )
    .bind(&now)
    .bind(&now)
    .execute(&pool)
    .await
    .unwrap();

    service(&pool).decline_user("p1").await.unwrap();

    let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(sessions, 0);
}

#[tokio::test]
async fn edit_of_approved_user_keeps_untouched_fields() {
    let (pool, _temp_dir) = create_test_database().await;
    insert_user(&pool, "s1", "student", "active").await;
    let service = service(&pool);

    let updated = service
        .update_user(
            "s1",
            UpdateUserRequest {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.status, UserStatus::Active);
}

#[tokio::test]
async fn pending_list_excludes_approved_users() {
    let (pool, _temp_dir) = create_test_database().await;
    insert_user(&pool, "p1", "pending", "pending").await;
    insert_user(&pool, "s1", "student", "active").await;
    insert_user(&pool, "i1", "student", "inactive").await;

    let pending = service(&pool)
        .list_users(Some(UserStatus::Pending))
        .await
        .unwrap();

    let ids: Vec<_> = pending.into_iter().map(|u| u.public_id).collect();
    assert_eq!(ids, vec!["p1"]);
}
