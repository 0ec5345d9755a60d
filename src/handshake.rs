//! MYSQL41 authentication state machine.
//!
//! ```text
//!  Starting ──start──▶ WaitingResponse ──continue──▶ Done
//!     │                       │
//!     └──continue──▶ Error ◀──start──  (and any call after Done)
//! ```
//!
//! One [`Mysql41Auth`] per connection attempt. It is never reset: once it is
//! `Done` or `Error` every further call is out of order.

use tracing::{debug, warn};

use crate::challenge::{Challenge, ChallengeSource};
use crate::connection::{ConnectionContext, SessionBinding, split_host_port};
use crate::error::AuthErrorCode;
use crate::parser::split_three;
use crate::verifier::{CredentialVerifier, UserIdentity};

/// SASL mechanism name used by X protocol clients.
pub const MECHANISM_NAME: &str = "MYSQL41";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Starting,
    WaitingResponse,
    Done,
    Error,
}

impl HandshakeState {
    /// `Done` or `Error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, HandshakeState::Done | HandshakeState::Error)
    }
}

/// Result of a single handshake call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Send these challenge bytes to the client and wait for its answer.
    Ongoing(Vec<u8>),
    /// Client authenticated; apply the binding to the session.
    Succeeded(SessionBinding),
    /// Login refused. `binding` is set once the payload parsed.
    Failed {
        code: AuthErrorCode,
        binding: Option<SessionBinding>,
    },
    /// Call made in the wrong state. The handshake is dead.
    ProtocolError(AuthErrorCode),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Succeeded(_))
    }

    /// Error code to report, if this outcome is a failure.
    pub fn error_code(&self) -> Option<AuthErrorCode> {
        match self {
            AuthOutcome::Failed { code, .. } | AuthOutcome::ProtocolError(code) => Some(*code),
            AuthOutcome::Ongoing(_) | AuthOutcome::Succeeded(_) => None,
        }
    }

    /// Database and user the client asked for, when known.
    pub fn binding(&self) -> Option<&SessionBinding> {
        match self {
            AuthOutcome::Succeeded(binding) => Some(binding),
            AuthOutcome::Failed { binding, .. } => binding.as_ref(),
            AuthOutcome::Ongoing(_) | AuthOutcome::ProtocolError(_) => None,
        }
    }
}

/// MySQL 4.1 challenge-response authenticator for one connection.
pub struct Mysql41Auth<S, V> {
    state: HandshakeState,
    challenge: Option<Challenge>,
    source: S,
    verifier: V,
}

impl<S: ChallengeSource, V: CredentialVerifier> Mysql41Auth<S, V> {
    pub fn new(source: S, verifier: V) -> Self {
        Self {
            state: HandshakeState::Starting,
            challenge: None,
            source,
            verifier,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn mechanism_name(&self) -> &'static str {
        MECHANISM_NAME
    }

    /// First step: issue the challenge.
    ///
    /// `mechanism` and `initial_response` come from `AuthenticateStart`; the
    /// mechanism has already been selected by the caller and MYSQL41 carries
    /// no initial response, so both are ignored.
    pub fn handle_start(&mut self, mechanism: &str, initial_response: &[u8]) -> AuthOutcome {
        if self.state != HandshakeState::Starting {
            return self.out_of_order("start");
        }

        debug!(
            mechanism,
            initial_response_len = initial_response.len(),
            "Issuing MYSQL41 challenge"
        );
        let challenge = Challenge::generate(&mut self.source);
        let bytes = challenge.as_bytes().to_vec();
        self.challenge = Some(challenge);
        self.state = HandshakeState::WaitingResponse;

        AuthOutcome::Ongoing(bytes)
    }

    /// Second step: check the client's `db\0user\0secret` answer.
    ///
    /// Every outcome except out-of-order leaves the machine `Done`, including
    /// a malformed payload.
    pub fn handle_continue<C: ConnectionContext + ?Sized>(&mut self, ctx: &C, payload: &[u8]) -> AuthOutcome {
        let (HandshakeState::WaitingResponse, Some(challenge)) = (self.state, self.challenge.take()) else {
            return self.out_of_order("continue");
        };
        self.state = HandshakeState::Done;

        let Some(fields) = split_three(payload) else {
            debug!(payload_len = payload.len(), "Malformed MYSQL41 response");
            return AuthOutcome::Failed {
                code: AuthErrorCode::BadMessage,
                binding: None,
            };
        };
        let binding = SessionBinding::from_wire(fields.dbname, fields.user);

        if ctx.skip_auth() {
            debug!(user = %binding.user, "Skipping authentication");
            return AuthOutcome::Succeeded(binding);
        }

        let addr = ctx.remote_addr();
        let host = match split_host_port(&addr) {
            Ok((host, _)) => host.to_string(),
            Err(e) => {
                warn!(user = %binding.user, "Access denied: {}", e);
                return access_denied(binding);
            }
        };

        // The binding's user is lossy; accounts are matched on the exact name.
        let Ok(username) = std::str::from_utf8(fields.user) else {
            warn!(user = %binding.user, "Access denied: user name is not UTF-8");
            return access_denied(binding);
        };
        let identity = UserIdentity {
            username: username.to_string(),
            hostname: host,
        };
        if !self.verifier.authenticate(&identity, fields.secret, &challenge) {
            warn!("Access denied for {}", identity);
            return access_denied(binding);
        }

        debug!("Authenticated {}", identity);
        AuthOutcome::Succeeded(binding)
    }

    fn out_of_order(&mut self, step: &str) -> AuthOutcome {
        warn!(step, state = ?self.state, "MYSQL41 packets out of order");
        self.state = HandshakeState::Error;
        AuthOutcome::ProtocolError(AuthErrorCode::OutOfOrder)
    }
}

fn access_denied(binding: SessionBinding) -> AuthOutcome {
    AuthOutcome::Failed {
        code: AuthErrorCode::AccessDenied,
        binding: Some(binding),
    }
}

impl<S, V> std::fmt::Debug for Mysql41Auth<S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mysql41Auth")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
