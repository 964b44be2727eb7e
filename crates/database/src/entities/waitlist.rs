//! Waitlist entity definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A contact-form or waitlist submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
    pub source: String,
    pub status: WaitlistStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWaitlistEntryRequest {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    New,
    Contacted,
    Closed,
}

impl WaitlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::New => "new",
            WaitlistStatus::Contacted => "contacted",
            WaitlistStatus::Closed => "closed",
        }
    }
}

impl FromStr for WaitlistStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(WaitlistStatus::New),
            "contacted" => Ok(WaitlistStatus::Contacted),
            "closed" => Ok(WaitlistStatus::Closed),
            other => Err(format!("unknown waitlist status '{other}'")),
        }
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
