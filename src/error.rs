//! Error types for QAIL XAuth.

use thiserror::Error;

/// The main error type for fallible XAuth operations outside the handshake
/// itself (address parsing, password hashes, configuration).
#[derive(Debug, Error)]
pub enum XAuthError {
    /// The peer address could not be split into host and port.
    #[error("Cannot resolve host from address '{0}'")]
    HostResolution(String),

    /// A stored password hash is not in `*HEX` form.
    #[error("Invalid password hash: {0}")]
    InvalidPasswordHash(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML decoding error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl XAuthError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for XAuth operations.
pub type XAuthResult<T> = Result<T, XAuthError>;

/// Failure codes surfaced to the protocol dispatcher.
///
/// The dispatcher turns these into an X protocol `Error` frame using
/// [`AuthErrorCode::code`] and [`AuthErrorCode::message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    /// An operation was invoked in the wrong handshake state.
    OutOfOrder,
    /// The continue payload is not `db\0user\0secret`.
    BadMessage,
    /// Unknown account, wrong password, or unresolvable peer.
    AccessDenied,
}

/// `ER_NET_PACKETS_OUT_OF_ORDER`
pub const ER_NET_PACKETS_OUT_OF_ORDER: u16 = 1156;
/// `ER_X_BAD_MESSAGE`
pub const ER_X_BAD_MESSAGE: u16 = 5000;
/// `ER_ACCESS_DENIED_ERROR`
pub const ER_ACCESS_DENIED_ERROR: u16 = 1045;

impl AuthErrorCode {
    /// MySQL error number.
    pub fn code(self) -> u16 {
        match self {
            AuthErrorCode::OutOfOrder => ER_NET_PACKETS_OUT_OF_ORDER,
            AuthErrorCode::BadMessage => ER_X_BAD_MESSAGE,
            AuthErrorCode::AccessDenied => ER_ACCESS_DENIED_ERROR,
        }
    }

    /// Client-facing message. Never mentions which field or check failed.
    pub fn message(self) -> &'static str {
        match self {
            AuthErrorCode::OutOfOrder => "Got packets out of order",
            AuthErrorCode::BadMessage => "Invalid message",
            AuthErrorCode::AccessDenied => "Invalid user or password",
        }
    }

    /// SQLSTATE reported alongside the error number.
    pub fn sql_state(self) -> &'static str {
        match self {
            AuthErrorCode::OutOfOrder => "08S01",
            AuthErrorCode::BadMessage => "HY000",
            AuthErrorCode::AccessDenied => "28000",
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ERROR {} ({}): {}", self.code(), self.sql_state(), self.message())
    }
}
