//! Connection settings for an Odoo server.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ENV_URL: &str = "ODOO_URL";
pub const ENV_DB: &str = "ODOO_DB";
pub const ENV_USER: &str = "ODOO_USER";
pub const ENV_PASSWORD: &str = "ODOO_PASSWORD";
pub const ENV_ALT_USER: &str = "ODOO_ALT_USER";
pub const ENV_ALT_PASSWORD: &str = "ODOO_ALT_PASSWORD";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Server address, database and credentials. Owned by the caller and handed to
/// [`Odoo::login`](crate::odoo::Odoo::login).
///
/// ```toml
/// url = "http://localhost:8069"
/// database = "prod"
/// username = "admin"
/// password = "admin"
///
/// [alternate]
/// username = "integration"
/// password = "secret"
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdooConfig {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Secondary account, see [`OdooConfig::as_alternate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<Credentials>,
}

impl OdooConfig {
    pub fn new(
        url: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        OdooConfig {
            url: url.into(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
            alternate: None,
        }
    }

    pub fn with_alternate(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.alternate = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reads `ODOO_URL`, `ODOO_DB`, `ODOO_USER`, `ODOO_PASSWORD` and, when both are set,
    /// `ODOO_ALT_USER` / `ODOO_ALT_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| Error::Config(format!("{key} is not set")))
        };

        let mut config = OdooConfig::new(
            required(ENV_URL)?,
            required(ENV_DB)?,
            required(ENV_USER)?,
            required(ENV_PASSWORD)?,
        );
        if let (Some(username), Some(password)) = (lookup(ENV_ALT_USER), lookup(ENV_ALT_PASSWORD)) {
            config = config.with_alternate(username, password);
        }

        Ok(config)
    }

    /// Same server and database, logged in as the secondary account.
    pub fn as_alternate(&self) -> Result<Self> {
        let alternate = self
            .alternate
            .clone()
            .ok_or_else(|| Error::Config("no alternate credentials configured".into()))?;

        Ok(OdooConfig {
            url: self.url.clone(),
            database: self.database.clone(),
            username: alternate.username,
            password: alternate.password,
            alternate: None,
        })
    }
}

impl fmt::Debug for OdooConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdooConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("alternate", &self.alternate)
            .finish()
    }
}
