//! # session
//!
//! Transport session: one connection to one host, from connect to logoff

use std::time::Duration;

use crate::error::{AttachError, AuthError, ConnectError};
use crate::share::ShareHandle;
use crate::transport::{NtStatus, Transport};

/// Lifecycle state of a [`TransportSession`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Authenticated,
    Closed,
}

/// A connection to a file server.
///
/// The session exclusively owns its transport. Once connected it is released exactly
/// once, by [`TransportSession::logoff`] or, failing that, when dropped.
pub struct TransportSession<T: Transport> {
    transport: T,
    host: String,
    state: SessionState,
}

impl<T: Transport> TransportSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            host: String::new(),
            state: SessionState::Disconnected,
        }
    }

    /// Connect a new session to `host:port`
    pub fn connect(
        transport: T,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, ConnectError> {
        let mut session = Self::new(transport);
        session.open(host, port, timeout)?;
        Ok(session)
    }

    /// Open the network connection. On failure the session stays `Disconnected`.
    pub fn open(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), ConnectError> {
        if self.state != SessionState::Disconnected {
            return Err(ConnectError::InvalidState);
        }
        debug!("connecting to {}:{} (timeout {:?})", host, port, timeout);
        match self.transport.connect(host, port, timeout) {
            Ok(()) => {
                self.host = host.to_string();
                self.state = SessionState::Connected;
                debug!("connected to {}", host);
                Ok(())
            }
            Err(status) => {
                let status = status.failure();
                error!("could not connect to {}:{}: {}", host, port, status);
                Err(ConnectError::Unreachable {
                    host: host.to_string(),
                    port,
                    status,
                })
            }
        }
    }

    /// Log in. On failure the session stays `Connected`.
    pub fn authenticate(
        &mut self,
        domain: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<(), AuthError> {
        if self.state != SessionState::Connected {
            return Err(AuthError::NotConnected);
        }
        debug!("logging in to {} as {}", self.host, username);
        match self.transport.login(domain, username, password, timeout) {
            Ok(()) => {
                self.state = SessionState::Authenticated;
                debug!("logged in to {} as {}", self.host, username);
                Ok(())
            }
            Err(NtStatus::IoTimeout) => {
                error!("login to {} timed out", self.host);
                Err(AuthError::TimedOut {
                    username: username.to_string(),
                })
            }
            Err(status) => {
                let status = status.failure();
                error!("login to {} rejected: {}", self.host, status);
                Err(AuthError::Rejected {
                    username: username.to_string(),
                    status,
                })
            }
        }
    }

    /// Connect to a share. The returned handle borrows the session, so the session
    /// cannot log off while the share is attached.
    pub fn attach_share(&mut self, share: &str) -> Result<ShareHandle<'_, T>, AttachError> {
        if self.state != SessionState::Authenticated {
            return Err(AttachError::NotAuthenticated);
        }
        debug!("connecting to share {} on {}", share, self.host);
        match self.transport.tree_connect(share) {
            Ok(tree) => {
                debug!("share {} attached as {:?}", share, tree);
                Ok(ShareHandle::new(&mut self.transport, tree, share))
            }
            Err(status) => {
                let status = status.failure();
                error!("could not connect to share {}: {}", share, status);
                Err(AttachError::NotFound {
                    share: share.to_string(),
                    status,
                })
            }
        }
    }

    /// Log off and close the connection.
    ///
    /// Runs at most once: later calls, and calls on a session that never connected, do
    /// nothing. Failures are logged.
    pub fn logoff(&mut self) {
        match self.state {
            SessionState::Disconnected | SessionState::Closed => {
                trace!("session already released");
                return;
            }
            SessionState::Authenticated => {
                debug!("logging off from {}", self.host);
                if let Err(status) = self.transport.logoff() {
                    warn!("logoff from {} failed: {}", self.host, status.failure());
                }
            }
            SessionState::Connected => {}
        }
        self.state = SessionState::Closed;
        self.transport.disconnect();
        debug!("disconnected from {}", self.host);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl<T: Transport> Drop for TransportSession<T> {
    fn drop(&mut self) {
        if matches!(
            self.state,
            SessionState::Connected | SessionState::Authenticated
        ) {
            debug!("session to {} dropped while open; logging off", self.host);
            self.logoff();
        }
    }
}
