//! MYSQL41 continue-payload parser using nom.
//!
//! The client answers the challenge with three fields joined by NUL:
//!
//! ```text
//! sales\0alice\0*2470C0C06DEE42FD1618BB99005ADCA2EC9D1E19
//! ──┬── ──┬── ────────────────────┬──────────────────────
//!   │     │                       └── secret (scrambled password)
//!   │     └── username
//!   └── database (may be empty)
//! ```
//!
//! There are no length prefixes. Any field may be empty, but there must be
//! exactly two separators.

use nom::{
    bytes::complete::{tag, take_till},
    combinator::all_consuming,
    sequence::{terminated, tuple},
    IResult,
};

/// Fields of a continue payload, borrowed from the wire buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPayload<'a> {
    pub dbname: &'a [u8],
    pub user: &'a [u8],
    pub secret: &'a [u8],
}

fn is_nul(b: u8) -> bool {
    b == 0
}

/// One field followed by its separator.
fn field(input: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_till(is_nul), tag(&b"\0"[..]))(input)
}

/// The trailing field: everything left, which must contain no separator.
fn last_field(input: &[u8]) -> IResult<&[u8], &[u8]> {
    all_consuming(take_till(is_nul))(input)
}

/// Split a payload into exactly three NUL-separated fields.
///
/// Returns `None` for anything else: empty input, fewer than two separators,
/// or more than two.
pub fn split_three(payload: &[u8]) -> Option<CredentialPayload<'_>> {
    let (_, (dbname, user, secret)) = tuple((field, field, last_field))(payload).ok()?;
    Some(CredentialPayload {
        dbname,
        user,
        secret,
    })
}
