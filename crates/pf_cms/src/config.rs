//! Credential lookup and validation.
//!
//! Two credential pairs exist: the server-side pair used by this client and
//! the client-side pair the browser build consumes. Only the server-side
//! pair is required here; the other is reported so a misconfigured deploy
//! is visible early.

use crate::error::{CmsError, Result};

pub const SERVER_DOMAIN_VAR: &str = "MICROCMS_SERVICE_DOMAIN";
pub const SERVER_KEY_VAR: &str = "MICROCMS_API_KEY";
pub const CLIENT_DOMAIN_VAR: &str = "VITE_MICROCMS_SERVICE_DOMAIN";
pub const CLIENT_KEY_VAR: &str = "VITE_MICROCMS_API_KEY";

pub const MISSING_CONFIG_MESSAGE: &str =
    "microCMSの設定が不足しています。.envファイルを確認してください。 \
     (microCMS configuration is missing. Check your .env file.)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCheck {
    pub server_side: bool,
    pub client_side: bool,
    pub errors: Vec<String>,
}

impl EnvCheck {
    pub fn log(&self) {
        log::info!(
            "CMS environment: server-side {}, client-side {}",
            if self.server_side { "ok" } else { "missing" },
            if self.client_side { "ok" } else { "missing" }
        );
        for e in &self.errors {
            log::warn!("{e}");
        }
    }
}

fn present(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> bool {
    lookup(name).is_some_and(|v| !v.trim().is_empty())
}

/// Check both credential pairs. `lookup` resolves a variable name, usually
/// to `std::env::var(name).ok()`.
pub fn check_environment(lookup: impl Fn(&str) -> Option<String>) -> EnvCheck {
    let mut errors = Vec::new();

    let server_side = present(&lookup, SERVER_DOMAIN_VAR) && present(&lookup, SERVER_KEY_VAR);
    if !server_side {
        errors.push(format!(
            "Server-side variables ({SERVER_DOMAIN_VAR}, {SERVER_KEY_VAR}) are not set"
        ));
    }

    let client_side = present(&lookup, CLIENT_DOMAIN_VAR) && present(&lookup, CLIENT_KEY_VAR);
    if !client_side {
        errors.push(format!(
            "Client-side variables ({CLIENT_DOMAIN_VAR}, {CLIENT_KEY_VAR}) are not set"
        ));
    }

    EnvCheck {
        server_side,
        client_side,
        errors,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmsConfig {
    pub service_domain: String,
    pub api_key: String,
    /// API root, normally derived from the service domain.
    pub base_url: String,
}

impl CmsConfig {
    pub fn new(service_domain: &str, api_key: &str) -> Self {
        Self {
            service_domain: service_domain.to_string(),
            api_key: api_key.to_string(),
            base_url: format!("https://{service_domain}.microcms.io/api/v1"),
        }
    }

    /// Read the server-side pair. Fails before any client exists.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let domain = lookup(SERVER_DOMAIN_VAR).filter(|v| !v.trim().is_empty());
        let key = lookup(SERVER_KEY_VAR).filter(|v| !v.trim().is_empty());
        match (domain, key) {
            (Some(domain), Some(key)) => Ok(Self::new(domain.trim(), key.trim())),
            _ => Err(CmsError::MissingConfig(MISSING_CONFIG_MESSAGE.to_string())),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}
