use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "tutorhub.toml",
    "config/tutorhub.toml",
    "crates/config/tutorhub.toml",
    "../tutorhub.toml",
    "../config/tutorhub.toml",
    "../crates/config/tutorhub.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://tutorhub.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_min_password_length")]
    pub min_password_length: usize,
    /// Mark the session cookie `Secure`. Leave off for plain-http development.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
            min_password_length: Self::default_min_password_length(),
            secure_cookies: false,
        }
    }
}

impl AuthConfig {
    fn default_session_ttl() -> u64 {
        86_400
    }

    const fn default_min_password_length() -> usize {
        6
    }
}

/// Where uploaded course materials are written.
///
/// ```
/// use tutorhub_config::StorageConfig;
///
/// let storage = StorageConfig::default();
/// assert_eq!(storage.root, "data/blobs");
/// assert_eq!(storage.max_upload_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root: String,
    #[serde(default = "StorageConfig::default_max_upload")]
    pub max_upload_bytes: u64,
}

impl StorageConfig {
    const fn default_max_upload() -> u64 {
        50 * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "data/blobs".to_string(),
            max_upload_bytes: Self::default_max_upload(),
        }
    }
}

/// Transactional e-mail settings (EmailJS).
///
/// Sending is disabled unless `service_id` and `public_key` are both set.
///
/// ```
/// use tutorhub_config::MailConfig;
///
/// let mail = MailConfig::default();
/// assert_eq!(mail.base_url, "https://api.emailjs.com");
/// assert!(!mail.is_configured());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "MailConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub registration_template_id: Option<String>,
    #[serde(default)]
    pub contact_template_id: Option<String>,
    #[serde(default = "MailConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl MailConfig {
    fn default_base_url() -> String {
        "https://api.emailjs.com".to_string()
    }

    const fn default_request_timeout() -> u64 {
        15
    }

    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.service_id) && present(&self.public_key)
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            service_id: None,
            public_key: None,
            access_token: None,
            registration_template_id: None,
            contact_template_id: None,
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Public-facing site details used by the landing page and crawler files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "SiteConfig::default_name")]
    pub name: String,
    #[serde(default = "SiteConfig::default_public_url")]
    pub public_url: String,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl SiteConfig {
    fn default_name() -> String {
        "TutorHub".to_string()
    }

    fn default_public_url() -> String {
        "http://localhost:7070".to_string()
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            public_url: Self::default_public_url(),
            contact_email: None,
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use tutorhub_config::load;
///
/// std::env::remove_var("TUTORHUB_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let session_ttl = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);
    let max_upload = i64::try_from(defaults.storage.max_upload_bytes).unwrap_or(i64::MAX);
    let min_password = i64::try_from(defaults.auth.min_password_length).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.session_ttl_seconds", session_ttl)?
        .set_default("auth.min_password_length", min_password)?
        .set_default("auth.secure_cookies", defaults.auth.secure_cookies)?
        .set_default("storage.root", defaults.storage.root.clone())?
        .set_default("storage.max_upload_bytes", max_upload)?;

    let environment_overrides = config::Environment::with_prefix("TUTORHUB").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("TUTORHUB_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via TUTORHUB_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    if config.database.max_connections == 0 {
        anyhow::bail!("database.max_connections must be at least 1");
    }

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
