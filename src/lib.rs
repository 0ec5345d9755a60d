//! # QAIL XAuth — MYSQL41 authentication
//!
//! Server side of the X protocol `MYSQL41` SASL mechanism: a two-step
//! challenge-response handshake over MySQL 4.1 native password hashes.
//!
//! ## Quick Example
//!
//! ```
//! use qail_xauth::prelude::*;
//!
//! let mut store = CredentialStore::new();
//! store.insert_password("alice", "%", "secret");
//!
//! let mut auth = qail_xauth::authenticator(store);
//! let AuthOutcome::Ongoing(salt) = auth.handle_start("MYSQL41", b"") else {
//!     unreachable!()
//! };
//!
//! // What a client would send back
//! let mut reply = b"sales\0alice\0".to_vec();
//! reply.extend_from_slice(encode_secret(b"secret", &salt).as_bytes());
//!
//! let peer = PeerContext::new("10.0.0.7:51234");
//! let outcome = auth.handle_continue(&peer, &reply);
//! assert_eq!(outcome, AuthOutcome::Succeeded(SessionBinding::new("sales", "alice")));
//! ```
//!
//! ## Message Flow
//!
//! | Step | Client sends               | Server answers                 |
//! |------|----------------------------|--------------------------------|
//! | 1    | `AuthenticateStart`        | `AuthenticateContinue(salt)`   |
//! | 2    | `db \0 user \0 *HEX`       | `AuthenticateOk` or `Error`    |

pub mod challenge;
pub mod config;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod parser;
pub mod scramble;
pub mod verifier;

pub mod prelude {
    pub use crate::challenge::{Challenge, ChallengeSource, RandomChallengeSource, SCRAMBLE_LENGTH};
    pub use crate::config::XAuthConfig;
    pub use crate::connection::{ConnectionContext, PeerContext, SessionBinding};
    pub use crate::error::*;
    pub use crate::handshake::{AuthOutcome, HandshakeState, Mysql41Auth, MECHANISM_NAME};
    pub use crate::scramble::{encode_secret, scramble_password};
    pub use crate::verifier::{CredentialStore, CredentialVerifier, UserIdentity};
}

/// Create a handshake for one connection using the thread-local RNG.
pub fn authenticator<V: verifier::CredentialVerifier>(
    verifier: V,
) -> handshake::Mysql41Auth<challenge::RandomChallengeSource, V> {
    handshake::Mysql41Auth::new(challenge::RandomChallengeSource, verifier)
}
