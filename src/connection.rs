//! What the handshake needs from the owning connection.

use crate::error::{XAuthError, XAuthResult};

/// Read-only view of the connection that owns a handshake.
pub trait ConnectionContext {
    /// Peer address as `host:port` or `[v6host]:port`.
    fn remote_addr(&self) -> String;

    /// Server-wide policy: accept logins without checking credentials.
    fn skip_auth(&self) -> bool;
}

impl<C: ConnectionContext + ?Sized> ConnectionContext for &C {
    fn remote_addr(&self) -> String {
        (**self).remote_addr()
    }

    fn skip_auth(&self) -> bool {
        (**self).skip_auth()
    }
}

/// Database and user named by the client, for the dispatcher to apply to its
/// session once the handshake returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionBinding {
    pub dbname: String,
    pub user: String,
}

impl SessionBinding {
    pub fn new(dbname: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            dbname: dbname.into(),
            user: user.into(),
        }
    }

    pub(crate) fn from_wire(dbname: &[u8], user: &[u8]) -> Self {
        Self {
            dbname: String::from_utf8_lossy(dbname).into_owned(),
            user: String::from_utf8_lossy(user).into_owned(),
        }
    }
}

/// Plain owned [`ConnectionContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerContext {
    pub remote_addr: String,
    pub skip_auth: bool,
}

impl PeerContext {
    pub fn new(remote_addr: impl Into<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            skip_auth: false,
        }
    }

    pub fn with_skip_auth(mut self, skip: bool) -> Self {
        self.skip_auth = skip;
        self
    }
}

impl From<std::net::SocketAddr> for PeerContext {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self::new(addr.to_string())
    }
}

impl ConnectionContext for PeerContext {
    fn remote_addr(&self) -> String {
        self.remote_addr.clone()
    }

    fn skip_auth(&self) -> bool {
        self.skip_auth
    }
}

/// Split `host:port` or `[host]:port` into host and port.
///
/// A bare host, an IPv6 address without brackets, or a unix socket path is
/// rejected.
pub fn split_host_port(addr: &str) -> XAuthResult<(&str, &str)> {
    let fail = || XAuthError::HostResolution(addr.to_string());

    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or_else(fail)?;
        let port = after.strip_prefix(':').ok_or_else(fail)?;
        (host, port)
    } else {
        let (host, port) = addr.rsplit_once(':').ok_or_else(fail)?;
        if host.contains(':') {
            return Err(fail());
        }
        (host, port)
    };

    if host.contains(['[', ']']) || port.contains(['[', ']', ':']) {
        return Err(fail());
    }
    Ok((host, port))
}
