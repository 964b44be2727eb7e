//! TutorHub Database Crate
//!
//! Connection management, migrations, entities and repositories for the
//! users, courses and waitlist collections.

use tutorhub_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{CourseRepository, UserRepository, WaitlistRepository};

pub use entities::{
    course::{Course, CourseFile, CreateCourseRequest},
    user::{UpdateUserRequest, User, UserStatus},
    waitlist::{CreateWaitlistEntryRequest, WaitlistEntry, WaitlistStatus},
};

pub use types::{
    errors::{CourseError, DatabaseError, UserError, WaitlistError},
    CourseResult, DatabaseResult, UserResult, WaitlistResult,
};

pub use sqlx::SqlitePool;
pub use tutorhub_access::Role;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
