//! XAuth configuration
//!
//! ```toml
//! skip_auth = false
//!
//! [[accounts]]
//! user = "alice"
//! host = "%"
//! password = "*2470C0C06DEE42FD1618BB99005ADCA2EC9D1E19"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{XAuthError, XAuthResult};
use crate::verifier::ANY_HOST;

/// Main authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XAuthConfig {
    /// Accept every syntactically valid login without checking credentials
    #[serde(default)]
    pub skip_auth: bool,

    /// Known accounts
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// One `user@host` account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub user: String,

    /// Client host, or `%` for any
    #[serde(default = "default_host")]
    pub host: String,

    /// Stored hash in `*HEX` form; empty for no password
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    ANY_HOST.to_string()
}

impl XAuthConfig {
    /// Create a new configuration builder
    pub fn builder() -> XAuthConfigBuilder {
        XAuthConfigBuilder::default()
    }

    /// `<config dir>/qail/xauth.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("qail").join("xauth.toml"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> XAuthResult<Self> {
        let config: XAuthConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> XAuthResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(XAuthError::config(format!("{} not found", path.display())));
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn validate(&self) -> XAuthResult<()> {
        for account in &self.accounts {
            if account.user.is_empty() {
                return Err(XAuthError::config("account with empty user name"));
            }
            if account.host.is_empty() {
                return Err(XAuthError::config(format!(
                    "account '{}' has an empty host (use '%' for any)",
                    account.user
                )));
            }
            crate::scramble::decode_password_hash(&account.password)?;
        }
        Ok(())
    }
}

/// Builder for XAuthConfig
#[derive(Debug, Default)]
pub struct XAuthConfigBuilder {
    config: XAuthConfig,
}

impl XAuthConfigBuilder {
    /// Enable or disable skip-auth
    pub fn skip_auth(mut self, skip: bool) -> Self {
        self.config.skip_auth = skip;
        self
    }

    /// Add an account with a plaintext password (hashed here)
    pub fn account(mut self, user: impl Into<String>, host: impl Into<String>, password: &str) -> Self {
        let password = if password.is_empty() {
            String::new()
        } else {
            crate::scramble::encode_password_hash(&crate::scramble::password_hash(password.as_bytes()))
        };
        self.config.accounts.push(AccountConfig {
            user: user.into(),
            host: host.into(),
            password,
        });
        self
    }

    /// Build the configuration
    pub fn build(self) -> XAuthConfig {
        self.config
    }
}
