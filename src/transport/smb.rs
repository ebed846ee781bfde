//! ## smb
//!
//! Transport backed by libsmbclient through `pavao`.
//!
//! libsmbclient opens connections lazily, so each primitive is checked by a request that
//! forces the server round trip: `connect` opens a TCP connection to the SMB port,
//! `login` lists the server's shares and `tree_connect` lists the share root. Every
//! context is bounded by the login timeout.
//!
//! pavao keeps a single libsmbclient context per process and applies [`SmbOptions`] only
//! when that context is created. The login context is dropped before the tree context is
//! built, and the tree context denies sharing to every file it opens. A create-new request
//! only reserves the path: the file is created exclusively by the first write, which runs
//! through that same open, so no other client can open it between create and write.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use libc::mode_t;
use pavao::{
    SmbClient, SmbCredentials, SmbDirentType, SmbError, SmbOpenOptions, SmbOptions, SmbShareMode,
};

use super::{
    CreateDisposition, CreateRequest, DirectoryInfo, FileAttributes, FileId, NtStatus, Reply,
    ShareAccess, Transport, TreeId,
};
use crate::utils::{path as path_utils, pattern};

/// Share mode of every file opened on a tree
const TREE_SHARE_MODE: SmbShareMode = SmbShareMode::DenyAll;

#[derive(Debug)]
struct OpenObject {
    tree: TreeId,
    uri: String,
    directory: bool,
    written: bool,
}

/// SMB primitives over libsmbclient
pub struct SmbClientTransport {
    server: Option<String>,
    credentials: Option<(String, String, String)>,
    timeout: Option<Duration>,
    options: fn() -> SmbOptions,
    trees: HashMap<TreeId, SmbClient>,
    open: HashMap<FileId, OpenObject>,
    next_tree: u32,
    next_file: u64,
}

impl Default for SmbClientTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SmbClientTransport {
    pub fn new() -> Self {
        Self {
            server: None,
            credentials: None,
            timeout: None,
            options: default_options,
            trees: HashMap::new(),
            open: HashMap::new(),
            next_tree: 1,
            next_file: 1,
        }
    }

    /// Use `options` to build the libsmbclient contexts. The share mode of tree contexts
    /// is always exclusive.
    pub fn with_options(mut self, options: fn() -> SmbOptions) -> Self {
        self.options = options;
        self
    }

    fn tree_options(&self) -> SmbOptions {
        (self.options)().open_share_mode(TREE_SHARE_MODE)
    }

    fn client(&self, share: &str, options: SmbOptions) -> Reply<SmbClient> {
        let server = self.server.as_deref().ok_or(NtStatus::InvalidParameter)?;
        let (workgroup, username, password) = self
            .credentials
            .as_ref()
            .ok_or(NtStatus::UserSessionDeleted)?;
        let client = SmbClient::new(
            SmbCredentials::default()
                .server(server)
                .share(share)
                .username(username)
                .password(password)
                .workgroup(workgroup),
            options,
        )
        .map_err(|e| {
            error!("could not create smb context: {}", e);
            NtStatus::Unsuccessful
        })?;
        if let Some(timeout) = self.timeout {
            client.set_timeout(timeout).map_err(|e| {
                error!("could not set smb timeout: {}", e);
                NtStatus::Unsuccessful
            })?;
        }
        Ok(client)
    }

    fn tree(&self, tree: TreeId) -> Reply<&SmbClient> {
        self.trees.get(&tree).ok_or(NtStatus::NetworkNameDeleted)
    }

    fn object(&self, tree: TreeId, file: FileId) -> Reply<(&SmbClient, &OpenObject)> {
        let client = self.tree(tree)?;
        match self.open.get(&file) {
            Some(object) if object.tree == tree => Ok((client, object)),
            _ => Err(NtStatus::InvalidHandle),
        }
    }
}

fn default_options() -> SmbOptions {
    SmbOptions::default()
        .case_sensitive(false)
        .one_share_per_server(true)
}

fn create_new() -> SmbOpenOptions {
    SmbOpenOptions::default()
        .create(true)
        .exclusive(true)
        .write(true)
        .mode(0o644 as mode_t)
}

/// Share mode honouring the sharing a create request grants to other opens
fn share_mode(access: ShareAccess) -> SmbShareMode {
    match (
        access.contains(ShareAccess::READ),
        access.contains(ShareAccess::WRITE),
    ) {
        (false, false) => SmbShareMode::DenyAll,
        (true, false) => SmbShareMode::DenyWrite,
        (false, true) => SmbShareMode::DenyRead,
        (true, true) => SmbShareMode::DenyNone,
    }
}

/// Map a pavao error to a status, using `fallback` for anything without a closer match
fn status_of(err: &SmbError, fallback: NtStatus) -> NtStatus {
    match err {
        SmbError::Io(e) => match e.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => NtStatus::IoTimeout,
            ErrorKind::AlreadyExists => NtStatus::ObjectNameCollision,
            ErrorKind::NotFound => NtStatus::ObjectNameNotFound,
            ErrorKind::PermissionDenied => NtStatus::AccessDenied,
            _ => fallback,
        },
        _ => fallback,
    }
}

/// Write `data` through `writer`, returning how many bytes were accepted before the
/// writer stopped. Fails only when nothing was written.
fn write_counted<W: Write>(writer: &mut W, data: &[u8], uri: &str) -> Reply<usize> {
    let mut written = 0;
    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if written == 0 => {
                error!("write ERROR for {}: {}", uri, e);
                return Err(NtStatus::Unsuccessful);
            }
            Err(e) => {
                warn!("write to {} stopped after {} bytes: {}", uri, written, e);
                break;
            }
        }
    }
    Ok(written)
}

impl Transport for SmbClientTransport {
    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Reply<()> {
        trace!("resolving {}:{}", host, port);
        let addrs = (host, port).to_socket_addrs().map_err(|e| {
            error!("could not resolve {}: {}", host, e);
            NtStatus::HostUnreachable
        })?;
        let mut status = NtStatus::HostUnreachable;
        for addr in addrs {
            trace!("connecting to {} (timeout {:?})", addr, timeout);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(_) => {
                    self.server = Some(format!("smb://{host}:{port}"));
                    return Ok(());
                }
                Err(e) => {
                    debug!("could not connect to {}: {}", addr, e);
                    status = match e.kind() {
                        ErrorKind::TimedOut | ErrorKind::WouldBlock => NtStatus::IoTimeout,
                        ErrorKind::ConnectionRefused => NtStatus::ConnectionRefused,
                        _ => NtStatus::HostUnreachable,
                    };
                }
            }
        }
        Err(status)
    }

    fn login(
        &mut self,
        domain: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Reply<()> {
        if self.server.is_none() {
            return Err(NtStatus::InvalidParameter);
        }
        self.credentials = Some((
            domain.to_string(),
            username.to_string(),
            password.to_string(),
        ));
        self.timeout = Some(timeout);
        let client = self.client("", (self.options)())?;
        trace!("checking login by listing shares (timeout {:?})", timeout);
        let listed = client.list_dir("");
        drop(client);
        match listed {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("login ERROR: {}", e);
                self.credentials = None;
                match status_of(&e, NtStatus::LogonFailure) {
                    NtStatus::IoTimeout => Err(NtStatus::IoTimeout),
                    _ => Err(NtStatus::LogonFailure),
                }
            }
        }
    }

    fn tree_connect(&mut self, share: &str) -> Reply<TreeId> {
        let client = self.client(&path_utils::to_slash(share), self.tree_options())?;
        trace!("checking share {}", share);
        if let Err(e) = client.list_dir("/") {
            error!("share ERROR: {}", e);
            return Err(match status_of(&e, NtStatus::BadNetworkName) {
                NtStatus::IoTimeout => NtStatus::IoTimeout,
                _ => NtStatus::BadNetworkName,
            });
        }
        let tree = TreeId(self.next_tree);
        self.next_tree += 1;
        self.trees.insert(tree, client);
        Ok(tree)
    }

    fn create_file(&mut self, tree: TreeId, request: &CreateRequest) -> Reply<FileId> {
        let client = self.tree(tree)?;
        let uri = path_utils::to_slash(&request.path);
        match (request.disposition, request.is_directory()) {
            (CreateDisposition::Open, true) => {
                let stat = client.stat(uri.as_str()).map_err(|e| {
                    debug!("stat ERROR for {}: {}", uri, e);
                    status_of(&e, NtStatus::ObjectNameNotFound)
                })?;
                if !stat.mode.is_dir() {
                    return Err(NtStatus::NotADirectory);
                }
            }
            (CreateDisposition::Create, false) => {
                let mode = share_mode(request.share_access);
                if mode != TREE_SHARE_MODE {
                    debug!("share mode {:?} not available on this tree", mode);
                    return Err(NtStatus::NotSupported);
                }
                if client.stat(uri.as_str()).is_ok() {
                    return Err(NtStatus::ObjectNameCollision);
                }
                trace!("reserved {}; created by the first write", uri);
            }
            _ => return Err(NtStatus::NotSupported),
        }
        let id = FileId(self.next_file);
        self.next_file += 1;
        self.open.insert(
            id,
            OpenObject {
                tree,
                uri,
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
        let (client, object) = self.object(tree, file)?;
        if object.directory {
            return Err(NtStatus::FileIsADirectory);
        }
        if offset != 0 || object.written {
            return Err(NtStatus::NotSupported);
        }
        trace!("creating file at {}", object.uri);
        let result = match client.open_with(object.uri.as_str(), create_new()) {
            Ok(mut handle) => write_counted(&mut handle, data, &object.uri),
            Err(e) => {
                error!("create ERROR for {}: {}", object.uri, e);
                Err(status_of(&e, NtStatus::AccessDenied))
            }
        };
        // the create is attempted once, close does not retry it
        if let Some(object) = self.open.get_mut(&file) {
            object.written = true;
        }
        result
    }

    fn query_directory(
        &mut self,
        tree: TreeId,
        file: FileId,
        search: &str,
    ) -> Reply<Vec<DirectoryInfo>> {
        let (client, object) = self.object(tree, file)?;
        if !object.directory {
            return Err(NtStatus::NotADirectory);
        }
        trace!("listing files at {}", object.uri);
        let dirents = client.list_dir(object.uri.as_str()).map_err(|e| {
            error!("list ERROR for {}: {}", object.uri, e);
            status_of(&e, NtStatus::AccessDenied)
        })?;
        let entries: Vec<DirectoryInfo> = dirents
            .into_iter()
            .filter(|d| d.get_type() == SmbDirentType::File || d.get_type() == SmbDirentType::Dir)
            .filter(|d| pattern::matches(search, d.name()))
            .map(|d| {
                let directory = d.get_type() == SmbDirentType::Dir;
                let size = if directory {
                    0
                } else {
                    let uri = format!("{}/{}", object.uri.trim_end_matches('/'), d.name());
                    match client.stat(uri.as_str()) {
                        Ok(stat) => stat.size,
                        Err(e) => {
                            debug!("stat ERROR for {}: {}; size unknown", uri, e);
                            0
                        }
                    }
                };
                DirectoryInfo {
                    file_name: d.name().to_string(),
                    file_attributes: if directory {
                        FileAttributes::DIRECTORY
                    } else {
                        FileAttributes::NORMAL
                    },
                    end_of_file: size,
                }
            })
            .collect();
        if entries.is_empty() {
            return Err(NtStatus::NoMoreFiles);
        }
        Ok(entries)
    }

    fn close_file(&mut self, tree: TreeId, file: FileId) -> Reply<()> {
        self.object(tree, file)?;
        let object = self.open.remove(&file).ok_or(NtStatus::InvalidHandle)?;
        if object.directory || object.written {
            return Ok(());
        }
        // a created file nothing was written to is left empty
        trace!("creating empty file at {}", object.uri);
        let client = self.tree(tree)?;
        client
            .open_with(object.uri.as_str(), create_new())
            .map(|_| ())
            .map_err(|e| {
                error!("create ERROR for {}: {}", object.uri, e);
                status_of(&e, NtStatus::AccessDenied)
            })
    }

    fn tree_disconnect(&mut self, tree: TreeId) -> Reply<()> {
        self.open.retain(|_, object| object.tree != tree);
        self.trees
            .remove(&tree)
            .map(|_| ())
            .ok_or(NtStatus::NetworkNameDeleted)
    }

    fn logoff(&mut self) -> Reply<()> {
        if self.credentials.take().is_none() {
            return Err(NtStatus::UserSessionDeleted);
        }
        self.open.clear();
        self.trees.clear();
        Ok(())
    }

    fn disconnect(&mut self) {
        self.open.clear();
        self.trees.clear();
        self.credentials = None;
        self.timeout = None;
        self.server = None;
    }
}
