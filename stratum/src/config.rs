//! Connection configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stratum_core::{Error, Result};

/// Database connection configuration
///
/// Usually read from the application's JSON configuration:
///
/// ```
/// use stratum::Config;
///
/// let config = Config::from_json(r#"{"db": "blog", "user": "app", "pass": "secret"}"#).unwrap();
/// assert_eq!(config.kind, "mysql");
/// assert_eq!(config.port, 3306);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dialect identifier
    #[serde(rename = "type")]
    pub kind: String,
    pub host: String,
    pub db: String,
    pub user: String,
    pub pass: String,
    pub port: u16,
    /// Free-form options handed to the driver
    pub options: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: "mysql".to_string(),
            host: "localhost".to_string(),
            db: String::new(),
            user: String::new(),
            pass: String::new(),
            port: 3306,
            options: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid connection config: {}", e)))
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn db(mut self, db: impl Into<String>) -> Self {
        self.db = db.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = pass.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn get_option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}
