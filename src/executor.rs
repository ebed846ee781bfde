//! # executor
//!
//! File operations on an attached share: open/create, write, directory query and close.
//!
//! Every [`FileHandle`] is closed exactly once, either explicitly through
//! [`FileHandle::close`] or when it goes out of scope.

use crate::error::{CloseError, ListError, OpenError, WriteError};
use crate::share::ShareHandle;
use crate::transport::{
    AccessMask, CreateDisposition, CreateOptions, CreateRequest, DirectoryInfo, FileAttributes,
    FileId, NtStatus, ShareAccess, Transport, TreeId,
};

/// How an object is opened
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenMode {
    /// Open an existing directory for enumeration, read only, shared
    ReadDirectory,
    /// Create a new file for writing, exclusive, with synchronous I/O; fails if the file
    /// already exists
    WriteCreateFile,
}

impl OpenMode {
    /// The create request for `path` in this mode
    pub fn request(self, path: &str) -> CreateRequest {
        match self {
            Self::ReadDirectory => CreateRequest {
                path: path.to_string(),
                desired_access: AccessMask::GENERIC_READ,
                file_attributes: FileAttributes::DIRECTORY,
                share_access: ShareAccess::READ | ShareAccess::WRITE,
                disposition: CreateDisposition::Open,
                options: CreateOptions::DIRECTORY_FILE,
            },
            Self::WriteCreateFile => CreateRequest {
                path: path.to_string(),
                desired_access: AccessMask::GENERIC_WRITE | AccessMask::SYNCHRONIZE,
                file_attributes: FileAttributes::NORMAL,
                share_access: ShareAccess::NONE,
                disposition: CreateDisposition::Create,
                options: CreateOptions::NON_DIRECTORY_FILE | CreateOptions::SYNCHRONOUS_IO_ALERT,
            },
        }
    }
}

/// Kind of a directory entry
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// An entry returned by a directory query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

impl From<DirectoryInfo> for DirectoryEntry {
    fn from(info: DirectoryInfo) -> Self {
        let kind = if info.file_attributes.contains(FileAttributes::DIRECTORY) {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Self {
            name: info.file_name,
            kind,
            size: info.end_of_file,
        }
    }
}

impl DirectoryEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Entries of one directory query, in server order. Consumed once.
#[derive(Debug)]
pub struct DirectoryListing {
    entries: std::vec::IntoIter<DirectoryInfo>,
}

impl Iterator for DirectoryListing {
    type Item = DirectoryEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(DirectoryEntry::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for DirectoryListing {}

impl<'s, T: Transport> ShareHandle<'s, T> {
    /// Open or create the object at `path` (share relative; empty for the root).
    ///
    /// The returned handle borrows the share until it is dropped.
    pub fn open_or_create(
        &mut self,
        path: &str,
        mode: OpenMode,
    ) -> Result<FileHandle<'_, T>, OpenError> {
        if !self.is_attached() {
            return Err(OpenError::HandleInvalid);
        }
        let request = mode.request(path);
        trace!("create {:?} on share {}", request, self.name());
        match self.transport.create_file(self.tree, &request) {
            Ok(id) => {
                debug!("opened {} ({:?}) as {:?}", display_path(path), mode, id);
                Ok(FileHandle {
                    transport: &mut *self.transport,
                    tree: self.tree,
                    id,
                    path: path.to_string(),
                    open: true,
                })
            }
            Err(status) => {
                let status = status.failure();
                error!("could not open {}: {}", display_path(path), status);
                Err(OpenError::Denied {
                    path: path.to_string(),
                    status,
                })
            }
        }
    }
}

/// An open file or directory on a share
pub struct FileHandle<'f, T: Transport> {
    transport: &'f mut T,
    tree: TreeId,
    id: FileId,
    path: String,
    open: bool,
}

impl<T: Transport> FileHandle<'_, T> {
    /// Write `bytes` at `offset`. Anything less than a full write is an error.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<usize, WriteError> {
        if !self.open {
            return Err(WriteError::HandleClosed {
                path: self.path.clone(),
            });
        }
        trace!("writing {} bytes to {} at {}", bytes.len(), self.path, offset);
        match self.transport.write_file(self.tree, self.id, offset, bytes) {
            Ok(written) if written >= bytes.len() => {
                if written > bytes.len() {
                    warn!(
                        "server reported {} bytes written to {}, {} were sent",
                        written,
                        self.path,
                        bytes.len()
                    );
                }
                debug!("wrote {} bytes to {}", bytes.len(), self.path);
                Ok(bytes.len())
            }
            Ok(written) => {
                error!(
                    "short write to {}: {} of {} bytes",
                    self.path,
                    written,
                    bytes.len()
                );
                Err(WriteError::ShortOrFailedWrite {
                    path: self.path.clone(),
                    requested: bytes.len(),
                    written,
                    status: NtStatus::Success,
                })
            }
            Err(status) => {
                let status = status.failure();
                error!("write to {} failed: {}", self.path, status);
                Err(WriteError::ShortOrFailedWrite {
                    path: self.path.clone(),
                    requested: bytes.len(),
                    written: 0,
                    status,
                })
            }
        }
    }

    /// Enumerate the directory behind this handle. An empty directory is not an error.
    pub fn list_directory(&mut self, pattern: &str) -> Result<DirectoryListing, ListError> {
        if !self.open {
            return Err(ListError::HandleClosed {
                path: self.path.clone(),
            });
        }
        trace!("querying {} with pattern {}", display_path(&self.path), pattern);
        let entries = match self.transport.query_directory(self.tree, self.id, pattern) {
            Ok(entries) => entries,
            Err(NtStatus::NoMoreFiles) => Vec::new(),
            Err(status) => {
                let status = status.failure();
                error!("query on {} failed: {}", display_path(&self.path), status);
                return Err(ListError::QueryFailed {
                    path: self.path.clone(),
                    status,
                });
            }
        };
        debug!("{} entries in {}", entries.len(), display_path(&self.path));
        Ok(DirectoryListing {
            entries: entries.into_iter(),
        })
    }

    /// Close the handle.
    ///
    /// The handle counts as released afterwards whatever the server replies; calling
    /// this again is a no-op.
    pub fn close(&mut self) -> Result<(), CloseError> {
        if !self.open {
            trace!("{} already closed", display_path(&self.path));
            return Ok(());
        }
        self.open = false;
        trace!("closing {:?}", self.id);
        self.transport
            .close_file(self.tree, self.id)
            .map_err(|status| CloseError::Failed {
                path: self.path.clone(),
                status: status.failure(),
            })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl<T: Transport> Drop for FileHandle<'_, T> {
    fn drop(&mut self) {
        if self.open {
            debug!("{} dropped while open; closing", display_path(&self.path));
            if let Err(err) = self.close() {
                warn!("{}", err);
            }
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<share root>"
    } else {
        path
    }
}
