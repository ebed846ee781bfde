//! # share
//!
//! Share handle: a tree connection scoped to one share

use crate::error::DetachError;
use crate::transport::{Transport, TreeId};

/// Lifecycle state of a [`ShareHandle`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShareState {
    Attached,
    Detached,
}

/// A share attached on a [`crate::TransportSession`].
///
/// Detached exactly once, by [`ShareHandle::disconnect`] or when dropped. File handles
/// opened on the share borrow it, so they are always closed before it detaches.
pub struct ShareHandle<'s, T: Transport> {
    pub(crate) transport: &'s mut T,
    pub(crate) tree: TreeId,
    name: String,
    state: ShareState,
}

impl<'s, T: Transport> ShareHandle<'s, T> {
    pub(crate) fn new(transport: &'s mut T, tree: TreeId, name: &str) -> Self {
        Self {
            transport,
            tree,
            name: name.to_string(),
            state: ShareState::Attached,
        }
    }

    /// Disconnect from the share.
    ///
    /// The handle is detached afterwards whatever the server replies; calling this again
    /// is a no-op.
    pub fn disconnect(&mut self) -> Result<(), DetachError> {
        if self.state == ShareState::Detached {
            trace!("share {} already detached", self.name);
            return Ok(());
        }
        self.state = ShareState::Detached;
        debug!("disconnecting from share {}", self.name);
        self.transport
            .tree_disconnect(self.tree)
            .map_err(|status| DetachError::Failed {
                share: self.name.clone(),
                status: status.failure(),
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ShareState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == ShareState::Attached
    }
}

impl<T: Transport> Drop for ShareHandle<'_, T> {
    fn drop(&mut self) {
        if self.is_attached() {
            debug!("share {} dropped while attached; disconnecting", self.name);
            if let Err(err) = self.disconnect() {
                warn!("{}", err);
            }
        }
    }
}
