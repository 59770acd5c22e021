use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Limit applied when a profile has no daily limit recorded.
pub const DEFAULT_DAILY_LIMIT: i32 = 5;

pub const MIN_TIMEOUT_SECONDS: i32 = 5;
pub const MAX_TIMEOUT_SECONDS: i32 = 120;
pub const DEFAULT_TIMEOUT_SECONDS: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    /// `None` means unset, `Some(0)` means unlimited.
    pub daily_limit: Option<i32>,
}

impl Profile {
    pub fn effective_limit(&self) -> i32 {
        effective_limit(self.daily_limit)
    }
}

pub fn effective_limit(daily_limit: Option<i32>) -> i32 {
    daily_limit.unwrap_or(DEFAULT_DAILY_LIMIT)
}

/// Whether a user at `used` requests today may make another one.
pub fn within_quota(limit: i32, used: i32) -> bool {
    limit == 0 || used < limit
}

/// Requests left today, `None` when the limit is 0 (unlimited).
pub fn remaining(limit: i32, used: i32) -> Option<i32> {
    (limit != 0).then(|| (limit - used).max(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaStatus {
    Unlimited,
    Reached,
    /// At least 80% of the limit used.
    NearLimit,
    Available,
}

impl QuotaStatus {
    pub fn of(limit: i32, used: i32) -> Self {
        if limit == 0 {
            QuotaStatus::Unlimited
        } else if used >= limit {
            QuotaStatus::Reached
        } else if used * 100 >= limit * 80 {
            QuotaStatus::NearLimit
        } else {
            QuotaStatus::Available
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consultation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiConfiguration {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout_seconds: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReportRow {
    pub user_id: Uuid,
    pub name: String,
    pub username: String,
    pub phone: Option<String>,
    pub used_today: i32,
    pub daily_limit: Option<i32>,
}

/// Everything needed to create an identity together with its profile and role.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub username: String,
    pub phone: Option<String>,
    pub daily_limit: i32,
    pub role: Role,
}

/// Credentials and profile of the bootstrap administrator, read from
/// configuration by both the server and the `provision` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSettings {
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// Empty means no administrator is provisioned.
    #[serde(default)]
    pub admin_password: String,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    #[serde(default = "default_admin_name")]
    pub admin_username: String,
    #[serde(default = "default_admin_phone")]
    pub admin_phone: String,
}

fn default_admin_email() -> String {
    "contato@webcontato.com.br".to_string()
}

fn default_admin_name() -> String {
    "administrador".to_string()
}

fn default_admin_phone() -> String {
    "5511985840220".to_string()
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            admin_email: default_admin_email(),
            admin_password: String::new(),
            admin_name: default_admin_name(),
            admin_username: default_admin_name(),
            admin_phone: default_admin_phone(),
        }
    }
}

impl AdminSettings {
    /// An unlimited admin account, or `None` without a password.
    pub fn account(&self) -> Option<NewAccount> {
        if self.admin_password.is_empty() {
            return None;
        }
        Some(NewAccount {
            email: self.admin_email.clone(),
            password: self.admin_password.clone(),
            name: self.admin_name.clone(),
            username: self.admin_username.clone(),
            phone: Some(self.admin_phone.clone()).filter(|p| !p.is_empty()),
            daily_limit: 0,
            role: Role::Admin,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: Option<String>,
    pub daily_limit: i32,
}
