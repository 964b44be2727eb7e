use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tutorhub_auth::Authenticator;
use tutorhub_config::AppConfig;
use tutorhub_courses::{CourseService, LocalBlobStore};
use tutorhub_database::{initialize_database, CourseRepository, WaitlistRepository};
use tutorhub_mailer::Mailer;
use tutorhub_users::{UserRepository, UserService};
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::TRACE)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything the HTTP layer and the console commands need.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub users: UserService<UserRepository>,
    pub courses: CourseService<LocalBlobStore>,
    pub waitlist: WaitlistRepository,
    pub mailer: Mailer,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let authenticator = Authenticator::new(db_pool.clone(), config.auth.clone())
            .context("failed to configure authenticator")?;
        let users = UserService::new(db_pool.clone());

        let blob_store = LocalBlobStore::new(&config.storage.root);
        let courses = CourseService::new(
            CourseRepository::new(db_pool.clone()),
            blob_store,
            config.storage.max_upload_bytes,
        );

        let waitlist = WaitlistRepository::new(db_pool.clone());
        let mailer = Mailer::new(config.mail.clone()).context("failed to build mail client")?;

        match authenticator.purge_expired_sessions().await {
            Ok(purged) if purged > 0 => info!(purged, "removed expired sessions"),
            Ok(_) => {}
            Err(error) => tracing::warn!(%error, "failed to purge expired sessions"),
        }

        info!(
            database = %config.database.url,
            blobs = %config.storage.root,
            mail = mailer.is_enabled(),
            "backend services ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            users,
            courses,
            waitlist,
            mailer,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
