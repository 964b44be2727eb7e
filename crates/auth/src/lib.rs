use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use rand::RngCore;
use sqlx::{Row, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, info, warn};
use tutorhub_config::AuthConfig;
use tutorhub_database::{Role, User, UserError, UserRepository, UserStatus};

const PASSWORD_PROVIDER: &str = "password";

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    users: UserRepository,
    session_ttl: Duration,
    min_password_length: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidInput(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
    /// The session is valid but its user profile could not be read.
    #[error("user profile unavailable: {0}")]
    ProfileUnavailable(String),
    #[error("invalid auth configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Sign-up form after trimming.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Result<Self, AuthError> {
        let session_ttl = session_ttl_from_seconds(config.session_ttl_seconds)?;

        Ok(Self {
            users: UserRepository::new(pool.clone()),
            pool,
            session_ttl,
            min_password_length: config.min_password_length,
        })
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Create a pending account with a password identity.
    pub async fn register_with_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let registration = self.validate_registration(name, email, password)?;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM users WHERE email = ? COLLATE NOCASE")
            .bind(&registration.email)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        let now = Utc::now().to_rfc3339();
        let password_hash = self.hash_password(&registration.password)?;
        let user_id = insert_pending_user(&mut tx, &registration).await?;

        sqlx::query(
            "INSERT INTO user_identities (user_id, provider, provider_uid, secret, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(PASSWORD_PROVIDER)
        .bind(&registration.email)
        .bind(password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let user = self.fetch_user(user_id).await?;
        info!(user = %user.public_id, "registered pending user");
        Ok(user)
    }

    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let identity = sqlx::query(
            "SELECT user_id, secret FROM user_identities WHERE provider = ? AND provider_uid = ?",
        )
        .bind(PASSWORD_PROVIDER)
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = identity else {
            return Err(AuthError::InvalidCredentials);
        };

        let secret: String = row.try_get("secret")?;
        let stored_hash = PasswordHash::new(&secret)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &stored_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let user_id: i64 = row.try_get("user_id")?;
        self.issue_session(user_id).await
    }

    /// Resolve a session token to its user. Expired sessions are deleted.
    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::SessionNotFound);
        };

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            debug!(user_id, "purged expired session");
            return Err(AuthError::SessionExpired);
        }

        let user = self.fetch_user(user_id).await?;
        let session = AuthSession {
            token: token.to_owned(),
            user_id,
            expires_at,
        };

        Ok((user, session))
    }

    pub async fn revoke_session(&self, token: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete every expired session. Returns how many were removed.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<User, AuthError> {
        self.fetch_user(user_id).await
    }

    pub async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let token = generate_session_token();
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.session_ttl).ok_or_else(|| {
            AuthError::InvalidConfig("session expiry is out of range".to_string())
        })?;

        sqlx::query(
            "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&token)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            token,
            user_id,
            expires_at,
        })
    }

    fn validate_registration(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::InvalidInput("name is required".into()));
        }

        let email = normalize_email(email);
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(AuthError::InvalidInput("a valid email is required".into()));
        }

        if password.chars().count() < self.min_password_length {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {} characters",
                self.min_password_length
            )));
        }

        Ok(Registration {
            name: name.to_owned(),
            email,
            password: password.to_owned(),
        })
    }

    async fn fetch_user(&self, id: i64) -> Result<User, AuthError> {
        match self.users.find_by_id(id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthError::ProfileUnavailable(format!("user {id} not found"))),
            Err(UserError::DatabaseError(message)) | Err(UserError::SerializationError(message)) => {
                warn!(user_id = id, error = %message, "failed to load user profile");
                Err(AuthError::ProfileUnavailable(message))
            }
            Err(other) => Err(AuthError::ProfileUnavailable(other.to_string())),
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }
}

async fn insert_pending_user(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    registration: &Registration,
) -> Result<i64, AuthError> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO users (public_id, name, email, role, status, assigned_courses, created_at, updated_at) VALUES (?, ?, ?, ?, ?, '[]', ?, ?)",
    )
    .bind(new_public_id())
    .bind(&registration.name)
    .bind(&registration.email)
    .bind(Role::Pending.as_str())
    .bind(UserStatus::Pending.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn new_public_id() -> String {
    CUID.create_id()
}

fn session_ttl_from_seconds(seconds: u64) -> Result<Duration, AuthError> {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .filter(|ttl| *ttl > Duration::zero())
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| {
            AuthError::InvalidConfig(format!(
                "auth.session_ttl_seconds must be positive and keep expiry dates representable, got {seconds}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_must_fit_a_duration() {
        assert_eq!(session_ttl_from_seconds(3_600).unwrap(), Duration::hours(1));
        assert!(matches!(
            session_ttl_from_seconds(0),
            Err(AuthError::InvalidConfig(_))
        ));
        assert!(matches!(
            session_ttl_from_seconds(u64::MAX),
            Err(AuthError::InvalidConfig(_))
        ));
        assert!(matches!(
            session_ttl_from_seconds(i64::MAX as u64),
            Err(AuthError::InvalidConfig(_))
        ));
        assert!(matches!(
            session_ttl_from_seconds((i64::MAX / 1000) as u64),
            Err(AuthError::InvalidConfig(_))
        ));
    }

    #[test]
    fn session_tokens_are_url_safe_and_unique() {
        let a = generate_session_token();
        let b = generate_session_token();

        assert_ne!(a, b);
        assert_eq!(URL_SAFE_NO_PAD.decode(&a).unwrap().len(), 32);
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
