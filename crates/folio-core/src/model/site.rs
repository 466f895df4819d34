use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host name that marks a site as a wildcard fallback
pub const LOCALHOST: &str = "localhost";

/// Site - one logical website served by the engine
///
/// Several sites may share a host; they are told apart by path prefix
/// (`relative_path`) or by locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,

    /// Host name, or `localhost` for a site that answers any host
    pub host: String,

    /// Path prefix such as `/shop`; `None`, empty and `/` all mean root
    #[serde(default)]
    pub relative_path: Option<String>,

    /// Locale code such as `en` or `fr_FR`
    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub enabled_from: Option<DateTime<Utc>>,

    #[serde(default)]
    pub enabled_to: Option<DateTime<Utc>>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub meta_description: Option<String>,

    #[serde(default)]
    pub meta_keywords: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Site {
    /// Create an enabled, non-default root site
    pub fn new(id: impl Into<String>, name: impl Into<String>, host: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            host: host.into(),
            relative_path: None,
            locale: None,
            enabled: true,
            is_default: false,
            enabled_from: None,
            enabled_to: None,
            title: None,
            meta_description: None,
            meta_keywords: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = Some(path.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn is_localhost(&self) -> bool {
        self.host == LOCALHOST
    }

    /// Check the enabled flag and the optional activity window
    pub fn is_enabled_at(&self, at: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(from) = self.enabled_from {
            if from > at {
                return false;
            }
        }
        if let Some(to) = self.enabled_to {
            if at > to {
                return false;
            }
        }
        true
    }

    /// Path prefix without trailing slash; the root site yields ""
    pub fn normalized_relative_path(&self) -> String {
        match self.relative_path.as_deref() {
            None => String::new(),
            Some(path) => {
                let trimmed = path.trim().trim_end_matches('/');
                if trimmed.is_empty() {
                    String::new()
                } else if trimmed.starts_with('/') {
                    trimmed.to_string()
                } else {
                    format!("/{}", trimmed)
                }
            }
        }
    }

    /// Canonical URL: network path for real hosts, bare prefix for localhost
    pub fn url(&self) -> String {
        let prefix = self.normalized_relative_path();
        if self.is_localhost() {
            if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix
            }
        } else {
            format!("//{}{}", self.host, prefix)
        }
    }
}
