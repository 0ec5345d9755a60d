//! Credential verification.
//!
//! The handshake only asks a [`CredentialVerifier`] yes or no. The
//! [`CredentialStore`] here is a small in-memory account table for embedded
//! servers, tests and the CLI; a real server plugs in its privilege system.

use std::collections::HashMap;

use tracing::debug;

use crate::challenge::Challenge;
use crate::config::{AccountConfig, XAuthConfig};
use crate::error::XAuthResult;
use crate::scramble::{self, PasswordHash};

/// Host pattern matching any client host.
pub const ANY_HOST: &str = "%";

/// Who is trying to log in, and from where.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    pub username: String,
    pub hostname: String,
}

impl UserIdentity {
    pub fn new(username: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            hostname: hostname.into(),
        }
    }
}

impl std::fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'@'{}'", self.username, self.hostname)
    }
}

/// Checks a submitted secret against stored credentials.
///
/// `secret` is exactly what the client sent; `challenge` is the salt the
/// client scrambled it with.
pub trait CredentialVerifier {
    fn authenticate(&self, identity: &UserIdentity, secret: &[u8], challenge: &Challenge) -> bool;
}

impl<V: CredentialVerifier + ?Sized> CredentialVerifier for &V {
    fn authenticate(&self, identity: &UserIdentity, secret: &[u8], challenge: &Challenge) -> bool {
        (**self).authenticate(identity, secret, challenge)
    }
}

impl<V: CredentialVerifier + ?Sized> CredentialVerifier for std::sync::Arc<V> {
    fn authenticate(&self, identity: &UserIdentity, secret: &[u8], challenge: &Challenge) -> bool {
        (**self).authenticate(identity, secret, challenge)
    }
}

/// In-memory account table: user, then host pattern.
#[derive(Debug, Default, Clone)]
pub struct CredentialStore {
    accounts: HashMap<String, HashMap<String, Option<PasswordHash>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from configured accounts.
    pub fn from_config(config: &XAuthConfig) -> XAuthResult<Self> {
        let mut store = Self::new();
        for account in &config.accounts {
            store.insert_account(account)?;
        }
        Ok(store)
    }

    fn insert_account(&mut self, account: &AccountConfig) -> XAuthResult<()> {
        let hash = scramble::decode_password_hash(&account.password)?;
        self.insert_hash(&account.user, &account.host, hash);
        Ok(())
    }

    /// Add or replace an account with a plaintext password. Empty means none.
    pub fn insert_password(&mut self, user: &str, host: &str, password: &str) {
        let hash = if password.is_empty() {
            None
        } else {
            Some(scramble::password_hash(password.as_bytes()))
        };
        self.insert_hash(user, host, hash);
    }

    /// Add or replace an account with a precomputed stored hash.
    pub fn insert_hash(&mut self, user: &str, host: &str, hash: Option<PasswordHash>) {
        self.accounts
            .entry(user.to_string())
            .or_default()
            .insert(host.to_string(), hash);
    }

    /// Number of `user@host` accounts.
    pub fn len(&self) -> usize {
        self.accounts.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Find the account for `identity`. An exact host entry wins over `%`.
    fn lookup(&self, identity: &UserIdentity) -> Option<&Option<PasswordHash>> {
        let hosts = self.accounts.get(identity.username.as_str())?;
        hosts
            .get(identity.hostname.as_str())
            .or_else(|| hosts.get(ANY_HOST))
    }
}

impl CredentialVerifier for CredentialStore {
    fn authenticate(&self, identity: &UserIdentity, secret: &[u8], challenge: &Challenge) -> bool {
        let Some(stored) = self.lookup(identity) else {
            debug!("No account for {}", identity);
            return false;
        };

        match stored {
            None => secret.is_empty(),
            Some(hash) => match scramble::decode_secret(secret) {
                Some(response) => {
                    scramble::check_scrambled_password(challenge.as_bytes(), hash, &response)
                }
                None => false,
            },
        }
    }
}
