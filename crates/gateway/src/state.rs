//! Shared application state for the gateway

use tutorhub_auth::Authenticator;
use tutorhub_config::{AppConfig, AuthConfig, SiteConfig};
use tutorhub_courses::{CourseService, LocalBlobStore};
use tutorhub_database::WaitlistRepository;
use tutorhub_mailer::Mailer;
use tutorhub_runtime::BackendServices;
use tutorhub_users::{UserRepository, UserService};

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    services: BackendServices,
    config: AppConfig,
}

impl GatewayState {
    pub fn new(services: BackendServices, config: AppConfig) -> Self {
        Self { services, config }
    }

    /// Bootstrap every backend service from configuration.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let services = BackendServices::initialise(&config).await?;
        Ok(Self::new(services, config))
    }

    pub fn services(&self) -> &BackendServices {
        &self.services
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.services.authenticator
    }

    pub fn user_service(&self) -> &UserService<UserRepository> {
        &self.services.users
    }

    pub fn course_service(&self) -> &CourseService<LocalBlobStore> {
        &self.services.courses
    }

    pub fn waitlist(&self) -> &WaitlistRepository {
        &self.services.waitlist
    }

    pub fn mailer(&self) -> &Mailer {
        &self.services.mailer
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.config.auth
    }

    pub fn upload_limit(&self) -> usize {
        usize::try_from(self.config.storage.max_upload_bytes).unwrap_or(usize::MAX)
    }

    pub fn site(&self) -> &SiteConfig {
        &self.config.site
    }
}
