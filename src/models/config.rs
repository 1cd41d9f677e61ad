//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Paper database location
    #[serde(default)]
    pub store: StoreConfig,

    /// Search API client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Digest delivery settings
    #[serde(default)]
    pub mail: MailConfig,

    /// Filter terms and author normalization
    #[serde(default)]
    pub filters: FilterConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.store.db_path.trim().is_empty() {
            return Err(AppError::config("store.db_path is empty"));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::config("api.base_url is empty"));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::config("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::config("api.timeout_secs must be > 0"));
        }
        if self.filters.terms.is_empty() {
            return Err(AppError::config("filters.terms is empty"));
        }
        Ok(())
    }
}

/// Paper database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON database file
    #[serde(default = "defaults::db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::db_path(),
        }
    }
}

/// Search API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Query endpoint of the search API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Digest delivery settings.
///
/// The SMTP password is never stored here; `password_env` names the
/// environment variable it is read from at send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host
    #[serde(default = "defaults::smtp_host")]
    pub smtp_host: String,

    /// Sender address (also the SMTP username)
    #[serde(default)]
    pub from: String,

    /// Recipient address
    #[serde(default)]
    pub to: String,

    /// Environment variable holding the SMTP password
    #[serde(default = "defaults::password_env")]
    pub password_env: String,

    /// Opening line of the digest body
    #[serde(default = "defaults::greeting")]
    pub greeting: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: defaults::smtp_host(),
            from: String::new(),
            to: String::new(),
            password_env: defaults::password_env(),
            greeting: defaults::greeting(),
        }
    }
}

/// Filter terms and author normalization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Literal terms matched against the rendered entry (case-sensitive)
    #[serde(default = "defaults::filter_terms")]
    pub terms: Vec<String>,

    /// Collaboration names that replace the full author list when present
    #[serde(default = "defaults::collapse_authors")]
    pub collapse_authors: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            terms: defaults::filter_terms(),
            collapse_authors: defaults::collapse_authors(),
        }
    }
}

mod defaults {
    // Store defaults
    pub fn db_path() -> String {
        "db.json".into()
    }

    // API defaults
    pub fn base_url() -> String {
        "http://export.arxiv.org/api/query".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; arxiv-digest/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Mail defaults
    pub fn smtp_host() -> String {
        "smtp.gmail.com".into()
    }
    pub fn password_env() -> String {
        "ARXIV_DIGEST_SMTP_PASSWORD".into()
    }
    pub fn greeting() -> String {
        "Here is your daily arXiv update:".into()
    }

    // Filter defaults: topics first, then people
    pub fn filter_terms() -> Vec<String> {
        [
            // Higgs
            "Higgs",
            "Yukawa",
            "yukawa",
            r"t\bar{t}H",
            // Top quark
            "Top quark",
            "top quark",
            r"t$\bar{t}$",
            r"t\bar{t}W",
            r"t\bar{t}Z",
            "tWZ",
            // Four tops
            r"t\bar{t}t\bar{t}",
            "4 top",
            "four top",
            "Four top",
            // EFT
            "EFT",
            "Effective Field Theory",
            "Effective field theory",
            "effective field theory",
            // Flavour
            "LFU",
            "Lepton Flavour Universality",
            "Lepton flavour universality",
            "anomaly",
            "anomalies",
            "heavy flavour",
            "Heavy flavour",
            "heavy flavor",
            "Heavy flavor",
            // Monte Carlo generators
            "MC",
            "Monte Carlo",
            "Sherpa",
            "SHERPA",
            "MadGraph",
            "aMC@NLO",
            "Pythia",
            "Herwig",
            "powheg",
            "Powheg",
            "POWHEG",
            // People
            "Frixione",
            "Mattelaer",
            "Maltoni",
            "Frederix",
            "Siegert",
            "Bothmann",
            "Napoletano",
            "Schönherr",
            "Schumann",
            "Plaetzer",
            "Preuss",
            "Siodmok",
            "Ilten",
            "Lonnblad",
            "Mrenna",
            "Skands",
            "Buckley",
            "Gutschow",
            "Amoroso",
            "Mimasu",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    pub fn collapse_authors() -> Vec<String> {
        vec!["LHCb collaboration".into()]
    }
}
