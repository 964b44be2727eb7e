//! Transactional e-mail through the EmailJS REST API.
//!
//! Two messages exist: the admin alert fired when someone signs up, and the
//! message relayed from the public contact form. When the `mail` section is
//! not configured every send is skipped and logged instead.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use tutorhub_config::MailConfig;

const SEND_PATH: &str = "/api/v1.0/email/send";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail service rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// What happened to a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailOutcome {
    Sent,
    Skipped,
}

/// Alert sent to the admins when a new account is registered.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationAlert {
    #[serde(rename = "user_name")]
    pub name: String,
    #[serde(rename = "user_email")]
    pub email: String,
    #[serde(rename = "user_id")]
    pub user_id: String,
}

/// Message relayed from the contact form.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    #[serde(rename = "from_name")]
    pub name: String,
    #[serde(rename = "from_email")]
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Serialize)]
struct SendRequest<'a, P: Serialize> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a P,
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        if !config.is_configured() {
            info!("mail is not configured; outgoing e-mail will be skipped");
        }

        Ok(Self { client, config })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    pub async fn send_registration_alert(
        &self,
        alert: &RegistrationAlert,
    ) -> Result<MailOutcome, MailError> {
        let template = self.config.registration_template_id.as_deref();
        self.send("registration", template, alert).await
    }

    pub async fn send_contact_message(
        &self,
        message: &ContactMessage,
    ) -> Result<MailOutcome, MailError> {
        let template = self.config.contact_template_id.as_deref();
        self.send("contact", template, message).await
    }

    async fn send<P: Serialize>(
        &self,
        kind: &str,
        template_id: Option<&str>,
        params: &P,
    ) -> Result<MailOutcome, MailError> {
        let (Some(service_id), Some(public_key)) = (
            self.config.service_id.as_deref().filter(|v| !v.trim().is_empty()),
            self.config.public_key.as_deref().filter(|v| !v.trim().is_empty()),
        ) else {
            debug!(kind, "mail disabled, skipping send");
            return Ok(MailOutcome::Skipped);
        };

        let Some(template_id) = template_id.filter(|v| !v.trim().is_empty()) else {
            warn!(kind, "no template configured, skipping send");
            return Ok(MailOutcome::Skipped);
        };

        let body = SendRequest {
            service_id,
            template_id,
            user_id: public_key,
            access_token: self.config.access_token.as_deref(),
            template_params: params,
        };

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), SEND_PATH);
        let response = self.client.post(url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(kind, status = status.as_u16(), body = %body, "mail send rejected");
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(kind, template = template_id, "sent mail");
        Ok(MailOutcome::Sent)
    }
}
