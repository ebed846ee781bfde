//! ## remote
//!
//! Transport over any [`remotefs::RemoteFs`] client.
//!
//! `RemoteFs` connects and authenticates in one step and writes whole files at once, so
//! the SMB primitives are mapped as follows:
//!
//! - `connect` runs `RemoteFs::connect`; an authentication failure is kept and reported by
//!   the following `login`
//! - `tree_connect` enters `/<share>`
//! - a create-new open only checks that the file does not exist; the file is created by the
//!   first write, which must start at offset 0
//! - `logoff` runs `RemoteFs::disconnect`

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use remotefs::fs::Metadata;
use remotefs::{RemoteError, RemoteErrorType, RemoteFs};

use super::{
    CreateDisposition, CreateRequest, DirectoryInfo, FileAttributes, FileId, NtStatus, Reply,
    Transport, TreeId,
};
use crate::utils::{path as path_utils, pattern};

#[derive(Debug)]
struct OpenObject {
    path: PathBuf,
    directory: bool,
    written: bool,
}

/// SMB primitives on top of a [`RemoteFs`] client.
///
/// `RemoteFs` has no per-call timeout, so the `timeout` given to `connect` and `login` is
/// not applied here: the limits are whatever the wrapped client was built with.
pub struct RemoteFsTransport<F: RemoteFs> {
    fs: F,
    connected: bool,
    logged_in: bool,
    /// Authentication failure seen by `connect`, reported by `login`
    pending_login: Option<NtStatus>,
    trees: HashMap<TreeId, PathBuf>,
    open: HashMap<FileId, OpenObject>,
    next_tree: u32,
    next_file: u64,
}

impl<F: RemoteFs> RemoteFsTransport<F> {
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            connected: false,
            logged_in: false,
            pending_login: None,
            trees: HashMap::new(),
            open: HashMap::new(),
            next_tree: 1,
            next_file: 1,
        }
    }

    /// Return a reference to the inner client
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Return a mutable reference to the inner client
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    fn tree_root(&self, tree: TreeId) -> Reply<&Path> {
        if !self.logged_in {
            return Err(NtStatus::UserSessionDeleted);
        }
        self.trees
            .get(&tree)
            .map(PathBuf::as_path)
            .ok_or(NtStatus::NetworkNameDeleted)
    }

    fn object(&self, file: FileId) -> Reply<&OpenObject> {
        self.open.get(&file).ok_or(NtStatus::InvalidHandle)
    }
}

/// Map a remotefs error to the closest status
fn status_of(err: &RemoteError) -> NtStatus {
    match err.kind {
        RemoteErrorType::AuthenticationFailed => NtStatus::LogonFailure,
        RemoteErrorType::BadAddress => NtStatus::HostUnreachable,
        RemoteErrorType::ConnectionError => NtStatus::ConnectionRefused,
        RemoteErrorType::NotConnected => NtStatus::UserSessionDeleted,
        RemoteErrorType::NoSuchFileOrDirectory => NtStatus::ObjectNameNotFound,
        RemoteErrorType::DirectoryAlreadyExists => NtStatus::ObjectNameCollision,
        RemoteErrorType::FileCreateDenied | RemoteErrorType::CouldNotOpenFile => {
            NtStatus::AccessDenied
        }
        RemoteErrorType::UnsupportedFeature => NtStatus::NotSupported,
        _ => NtStatus::Unsuccessful,
    }
}

impl<F: RemoteFs> Transport for RemoteFsTransport<F> {
    fn connect(&mut self, host: &str, port: u16, _timeout: Duration) -> Reply<()> {
        trace!("connecting remote fs client to {}:{}", host, port);
        match self.fs.connect() {
            Ok(_) => {}
            Err(err) if err.kind == RemoteErrorType::AuthenticationFailed => {
                debug!("remote fs authentication failed: {}", err);
                self.pending_login = Some(NtStatus::LogonFailure);
            }
            Err(err) => {
                error!("remote fs connection failed: {}", err);
                return Err(status_of(&err));
            }
        }
        self.connected = true;
        Ok(())
    }

    fn login(
        &mut self,
        _domain: &str,
        username: &str,
        _password: &str,
        _timeout: Duration,
    ) -> Reply<()> {
        if !self.connected {
            return Err(NtStatus::InvalidParameter);
        }
        trace!("remote fs client authenticated at connect (user {})", username);
        if let Some(status) = self.pending_login.take() {
            return Err(status);
        }
        self.logged_in = true;
        Ok(())
    }

    fn tree_connect(&mut self, share: &str) -> Reply<TreeId> {
        if !self.logged_in {
            return Err(NtStatus::UserSessionDeleted);
        }
        let root = PathBuf::from(path_utils::to_slash(share));
        trace!("entering share directory {}", root.display());
        match self.fs.stat(&root) {
            Ok(file) if file.is_dir() => {}
            Ok(_) => return Err(NtStatus::BadNetworkName),
            Err(err) => {
                debug!("share {} not found: {}", share, err);
                return Err(NtStatus::BadNetworkName);
            }
        }
        let tree = TreeId(self.next_tree);
        self.next_tree += 1;
        self.trees.insert(tree, root);
        Ok(tree)
    }

    fn create_file(&mut self, tree: TreeId, request: &CreateRequest) -> Reply<FileId> {
        let path = self
            .tree_root(tree)?
            .join(path_utils::to_slash(&request.path).trim_start_matches('/'));
        trace!("create {} ({:?})", path.display(), request.disposition);
        let exists = self.fs.exists(&path).map_err(|e| status_of(&e))?;
        match (request.disposition, request.is_directory()) {
            (CreateDisposition::Open, true) => {
                if !exists {
                    return Err(NtStatus::ObjectNameNotFound);
                }
                let file = self.fs.stat(&path).map_err(|e| status_of(&e))?;
                if !file.is_dir() {
                    return Err(NtStatus::NotADirectory);
                }
            }
            (CreateDisposition::Create, false) => {
                if exists {
                    return Err(NtStatus::ObjectNameCollision);
                }
            }
            (disposition, directory) => {
                debug!(
                    "unsupported create: {:?} (directory: {})",
                    disposition, directory
                );
                return Err(NtStatus::NotSupported);
            }
        }
        let id = FileId(self.next_file);
        self.next_file += 1;
        self.open.insert(
            id,
            OpenObject {
                path,
                directory: request.is_directory(),
                written: false,
            },
        );
        Ok(id)
    }

    fn write_file(
        &mut self,
        tree: TreeId,
        file: FileId,
        offset: u64,
        data: &[u8],
    ) -> Reply<usize> {
        self.tree_root(tree)?;
        let object = self.object(file)?;
        if object.directory {
            return Err(NtStatus::FileIsADirectory);
        }
        if offset != 0 || object.written {
            return Err(NtStatus::NotSupported);
        }
        let path = object.path.clone();
        trace!("writing {} bytes to {}", data.len(), path.display());
        let reader = Cursor::new(data.to_vec());
        let written = self
            .fs
            .create_file(
                &path,
                &Metadata::default().size(data.len() as u64),
                Box::new(reader),
            )
            .map_err(|e| {
                error!("could not write {}: {}", path.display(), e);
                status_of(&e)
            })?;
        if let Some(object) = self.open.get_mut(&file) {
            object.written = true;
        }
        Ok(written as usize)
    }

    fn query_directory(
        &mut self,
        tree: TreeId,
        file: FileId,
        search: &str,
    ) -> Reply<Vec<DirectoryInfo>> {
        self.tree_root(tree)?;
        let object = self.object(file)?;
        if !object.directory {
            return Err(NtStatus::NotADirectory);
        }
        let path = object.path.clone();
        let entries: Vec<DirectoryInfo> = self
            .fs
            .list_dir(&path)
            .map_err(|e| status_of(&e))?
            .into_iter()
            .filter(|f| pattern::matches(search, &f.name()))
            .map(|f| DirectoryInfo {
                file_name: f.name(),
                file_attributes: if f.is_dir() {
                    FileAttributes::DIRECTORY
                } else {
                    FileAttributes::NORMAL
                },
                end_of_file: f.metadata().size,
            })
            .collect();
        if entries.is_empty() {
            return Err(NtStatus::NoMoreFiles);
        }
        Ok(entries)
    }

    fn close_file(&mut self, tree: TreeId, file: FileId) -> Reply<()> {
        self.tree_root(tree)?;
        self.open
            .remove(&file)
            .map(|_| ())
            .ok_or(NtStatus::InvalidHandle)
    }

    fn tree_disconnect(&mut self, tree: TreeId) -> Reply<()> {
        self.trees
            .remove(&tree)
            .map(|_| ())
            .ok_or(NtStatus::NetworkNameDeleted)
    }

    fn logoff(&mut self) -> Reply<()> {
        if !self.logged_in {
            return Err(NtStatus::UserSessionDeleted);
        }
        self.logged_in = false;
        self.fs.disconnect().map_err(|e| status_of(&e))
    }

    fn disconnect(&mut self) {
        if self.logged_in {
            if let Err(err) = self.fs.disconnect() {
                warn!("remote fs disconnect failed: {}", err);
            }
        }
        self.connected = false;
        self.logged_in = false;
        self.pending_login = None;
        self.trees.clear();
        self.open.clear();
    }
}
