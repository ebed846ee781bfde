//! ## Mock
//!
//! Contains mock for test units

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::transport::{
    CreateDisposition, CreateRequest, DirectoryInfo, FileAttributes, FileId, NtStatus, Reply,
    Transport, TreeId,
};
use crate::utils::{path as path_utils, pattern};

pub const HOST: &str = "10.0.0.10";
pub const USERNAME: &str = "probe";
pub const PASSWORD: &str = "s3cr3t";
pub const SHARE: &str = "data";

// -- logger

#[allow(dead_code)]
pub fn logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Credentials secret matching the default [`FakeServer`]
pub fn secret() -> String {
    format!(r#"{{"username":"{USERNAME}","password":"{PASSWORD}","host":"{HOST}","share":"{SHARE}"}}"#)
}

pub type SharedServer = Arc<Mutex<FakeServer>>;

/// Status forced on the next calls of a primitive
#[derive(Debug, Default, Clone)]
pub struct Faults {
    pub connect: Option<NtStatus>,
    pub login: Option<NtStatus>,
    pub create_file: Option<NtStatus>,
    pub write_file: Option<NtStatus>,
    /// Bytes the server silently drops from every write
    pub short_write: Option<usize>,
    pub query_directory: Option<NtStatus>,
    pub close_file: Option<NtStatus>,
    pub tree_disconnect: Option<NtStatus>,
    pub logoff: Option<NtStatus>,
}

/// Primitive calls received by the server
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub connect: usize,
    pub login: usize,
    pub tree_connect: usize,
    pub create_file: usize,
    pub write_file: usize,
    pub query_directory: usize,
    pub close_file: usize,
    pub tree_disconnect: usize,
    pub logoff: usize,
    pub disconnect: usize,
    /// Every primitive call, in order
    pub order: Vec<&'static str>,
    /// Handles returned by successful creates
    pub created: Vec<FileId>,
    /// Handles passed to close
    pub closed: Vec<FileId>,
}

#[derive(Debug, Clone)]
struct FakeEntry {
    path: String,
    directory: bool,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct OpenObject {
    share: String,
    path: String,
}

/// In-memory file server shared by every [`FakeTransport`] connected to it
#[derive(Debug)]
pub struct FakeServer {
    pub host: String,
    pub username: String,
    pub password: String,
    pub faults: Faults,
    pub calls: Calls,
    shares: HashMap<String, Vec<FakeEntry>>,
    open: HashMap<FileId, OpenObject>,
    next_id: u64,
}

impl Default for FakeServer {
    /// Server at [`HOST`] with share [`SHARE`] holding `readme.txt` and an empty
    /// `reports` directory
    fn default() -> Self {
        let mut shares = HashMap::new();
        shares.insert(
            SHARE.to_string(),
            vec![
                FakeEntry {
                    path: "readme.txt".to_string(),
                    directory: false,
                    data: b"hello\n".to_vec(),
                },
                FakeEntry {
                    path: "reports".to_string(),
                    directory: true,
                    data: Vec::new(),
                },
            ],
        );
        Self {
            host: HOST.to_string(),
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            faults: Faults::default(),
            calls: Calls::default(),
            shares,
            open: HashMap::new(),
            next_id: 1,
        }
    }
}

impl FakeServer {
    pub fn shared(self) -> SharedServer {
        Arc::new(Mutex::new(self))
    }

    fn record(&mut self, call: &'static str) {
        self.calls.order.push(call);
    }

    fn entry_mut(&mut self, share: &str, path: &str) -> Option<&mut FakeEntry> {
        self.shares
            .get_mut(share)?
            .iter_mut()
            .find(|e| e.path == path)
    }

    fn is_directory(&self, share: &str, path: &str) -> Option<bool> {
        if path.is_empty() {
            return Some(true);
        }
        self.shares
            .get(share)?
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.directory)
    }
}

/// Snapshot of the calls received by `server`; handle lists are sorted
pub fn calls(server: &SharedServer) -> Calls {
    let mut calls = server.lock().unwrap().calls.clone();
    calls.created.sort_by_key(|id| id.0);
    calls.closed.sort_by_key(|id| id.0);
    calls
}

/// Content of the file at `path` on `share`
pub fn file_content(server: &SharedServer, share: &str, path: &str) -> Option<Vec<u8>> {
    server
        .lock()
        .unwrap()
        .shares
        .get(share)?
        .iter()
        .find(|e| e.path == path && !e.directory)
        .map(|e| e.data.clone())
}

fn parent(path: &str) -> &str {
    path.rsplit_once('\\').map(|(dir, _)| dir).unwrap_or("")
}

fn file_name(path: &str) -> &str {
    path.rsplit_once('\\').map(|(_, name)| name).unwrap_or(path)
}

/// One connection to a [`FakeServer`]
pub struct FakeTransport {
    server: SharedServer,
    connected: bool,
    logged_in: bool,
    trees: HashMap<TreeId, String>,
    next_tree: u32,
}

impl FakeTransport {
    pub fn new(server: &SharedServer) -> Self {
        Self {
            server: server.clone(),
            connected: false,
            logged_in: false,
            trees: HashMap::new(),
            next_tree: 1,
        }
    }

    fn share(&self, tree: TreeId) -> Reply<String> {
        if !self.logged_in {
            return Err(NtStatus::UserSessionDeleted);
        }
        self.trees
            .get(&tree)
            .cloned()
            .ok_or(NtStatus::NetworkNameDeleted)
    }
}

impl Transport for FakeTransport {
    fn connect(&mut self, host: &str, _port: u16, _timeout: Duration) -> Reply<()> {
        let mut server = self.server.lock().unwrap();
        server.calls.connect += 1;
        server.record("connect");
        if let Some(status) = server.faults.connect {
            return Err(status);
        }
        if host != server.host {
            return Err(NtStatus::HostUnreachable);
        }
        self.connected = true;
        Ok(())
    }

    fn login(
        &mut self,
        _domain: &str,
        username: &str,
        password: &str,
        _timeout: Duration,
    ) -> Reply<()> {
        let mut server = self.server.lock().unwrap();
        server.calls.login += 1;
        server.record("login");
        if !self.connected {
            return Err(NtStatus::InvalidParameter);
        }
        if let Some(status) = server.faults.login {
            return Err(status);
        }
        if username != server.username || password != server.password {
            return Err(NtStatus::LogonFailure);
        }
        self.logged_in = true;
        Ok(())
    }

    fn tree_connect(&mut self, share: &str) -> Reply<TreeId> {
        let mut server = self.server.lock().unwrap();
        server.calls.tree_connect += 1;
        server.record("tree_connect");
        if !self.logged_in {
            return Err(NtStatus::UserSessionDeleted);
        }
        if !server.shares.contains_key(share) {
            return Err(NtStatus::BadNetworkName);
        }
        let tree = TreeId(self.next_tree);
        self.next_tree += 1;
        self.trees.insert(tree, share.to_string());
        Ok(tree)
    }

    fn create_file(&mut self, tree: TreeId, request: &CreateRequest) -> Reply<FileId> {
        let share = self.share(tree);
        let mut server = self.server.lock().unwrap();
        server.calls.create_file += 1;
        server.record("create_file");
        let share = share?;
        if let Some(status) = server.faults.create_file {
            return Err(status);
        }
        let existing = server.is_directory(&share, &request.path);
        match (existing, request.disposition, request.is_directory()) {
            (Some(true), CreateDisposition::Open, true) => {}
            (Some(false), CreateDisposition::Open, true) => return Err(NtStatus::NotADirectory),
            (None, CreateDisposition::Open, _) => return Err(NtStatus::ObjectNameNotFound),
            (Some(_), CreateDisposition::Create, _) => {
                return Err(NtStatus::ObjectNameCollision)
            }
            (None, CreateDisposition::Create, directory) => {
                if server.is_directory(&share, parent(&request.path)) != Some(true) {
                    return Err(NtStatus::ObjectPathNotFound);
                }
                if let Some(entries) = server.shares.get_mut(&share) {
                    entries.push(FakeEntry {
                        path: request.path.clone(),
                        directory,
                        data: Vec::new(),
                    });
                }
            }
            _ => return Err(NtStatus::NotSupported),
        }
        let id = FileId(server.next_id);
        server.next_id += 1;
        server.open.insert(
            id,
            OpenObject {
                share,
                path: request.path.clone(),
            },
        );
        server.calls.created.push(id);
        Ok(id)
    }

    fn write_file(
        &mut self,
        tree: TreeId,
        file: FileId,
        offset: u64,
        data: &[u8],
    ) -> Reply<usize> {
        let share = self.share(tree);
        let mut server = self.server.lock().unwrap();
        server.calls.write_file += 1;
        server.record("write_file");
        share?;
        if let Some(status) = server.faults.write_file {
            return Err(status);
        }
        let object = server.open.get(&file).cloned().ok_or(NtStatus::InvalidHandle)?;
        let accepted = data.len() - server.faults.short_write.unwrap_or(0).min(data.len());
        let entry = server
            .entry_mut(&object.share, &object.path)
            .filter(|e| !e.directory)
            .ok_or(NtStatus::FileIsADirectory)?;
        let offset = offset as usize;
        if entry.data.len() < offset + accepted {
            entry.data.resize(offset + accepted, 0);
        }
        entry.data[offset..offset + accepted].copy_from_slice(&data[..accepted]);
        Ok(accepted)
    }

    fn query_directory(
        &mut self,
        tree: TreeId,
        file: FileId,
        search: &str,
    ) -> Reply<Vec<DirectoryInfo>> {
        let share = self.share(tree);
        let mut server = self.server.lock().unwrap();
        server.calls.query_directory += 1;
        server.record("query_directory");
        share?;
        if let Some(status) = server.faults.query_directory {
            return Err(status);
        }
        let object = server.open.get(&file).cloned().ok_or(NtStatus::InvalidHandle)?;
        let dir = path_utils::join_smb([object.path.as_str()]);
        let entries: Vec<DirectoryInfo> = server
            .shares
            .get(&object.share)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| parent(&e.path) == dir)
                    .filter(|e| pattern::matches(search, file_name(&e.path)))
                    .map(|e| DirectoryInfo {
                        file_name: file_name(&e.path).to_string(),
                        file_attributes: if e.directory {
                            FileAttributes::DIRECTORY
                        } else {
                            FileAttributes::NORMAL
                        },
                        end_of_file: e.data.len() as u64,
                    })
                    .collect()
            })
            .unwrap_or_default();
        if entries.is_empty() {
            return Err(NtStatus::NoMoreFiles);
        }
        Ok(entries)
    }

    fn close_file(&mut self, tree: TreeId, file: FileId) -> Reply<()> {
        let share = self.share(tree);
        let mut server = self.server.lock().unwrap();
        server.calls.close_file += 1;
        server.record("close_file");
        server.calls.closed.push(file);
        share?;
        if server.open.remove(&file).is_none() {
            return Err(NtStatus::InvalidHandle);
        }
        match server.faults.close_file {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn tree_disconnect(&mut self, tree: TreeId) -> Reply<()> {
        let mut server = self.server.lock().unwrap();
        server.calls.tree_disconnect += 1;
        server.record("tree_disconnect");
        if self.trees.remove(&tree).is_none() {
            return Err(NtStatus::NetworkNameDeleted);
        }
        match server.faults.tree_disconnect {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn logoff(&mut self) -> Reply<()> {
        let mut server = self.server.lock().unwrap();
        server.calls.logoff += 1;
        server.record("logoff");
        if !self.logged_in {
            return Err(NtStatus::UserSessionDeleted);
        }
        self.logged_in = false;
        match server.faults.logoff {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn disconnect(&mut self) {
        let mut server = self.server.lock().unwrap();
        server.calls.disconnect += 1;
        server.record("disconnect");
        self.connected = false;
        self.logged_in = false;
        self.trees.clear();
    }
}
