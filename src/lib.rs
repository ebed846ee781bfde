#![crate_name = "smb_probe"]
#![crate_type = "lib"]

//! # smb-probe
//!
//! smb-probe checks that a file share is usable: it connects to the file server,
//! authenticates, attaches to a share, writes a uniquely named probe file, lists the
//! share and tears the session down, releasing every resource it acquired whatever
//! happens along the way.
//!
//! ## Get started
//!
//! ```toml
//! smb-probe = "^0.1"
//! ```
//!
//! these features are supported:
//!
//! - `smbclient`: enable the libsmbclient transport (`SmbClientTransport`, UNIX only).
//! - `no-log`: disable logging. By default, this library will log via the `log` crate.
//!
//! ### Probe run
//!
//! A run needs a [`CredentialSource`] providing the `{username, password, host, share}`
//! record and a [`Connector`] creating a fresh [`Transport`] for each run.
//!
//! ```rust,ignore
//! use smb_probe::{EnvSource, ProbeConfig, SessionOrchestrator, SmbClientTransport};
//!
//! let orchestrator = SessionOrchestrator::new(
//!     ProbeConfig::default().secret_id("FScredentials"),
//!     EnvSource::default(),
//!     |_host: &str| SmbClientTransport::new(),
//! );
//! // the run id makes the probe file name unique across concurrent runs
//! let report = orchestrator.run("c0ffee-42");
//! println!("{}", report.message());
//! ```
//!
//! ### Step by step
//!
//! Sessions, shares and file handles release themselves when dropped, in reverse order of
//! acquisition. The borrow checker keeps a session from logging off while a share is
//! attached, and a share from detaching while a file is open.
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use smb_probe::{OpenMode, TransportSession};
//!
//! let timeout = Duration::from_secs(10);
//! let mut session = TransportSession::connect(transport, "10.0.0.10", 445, timeout)?;
//! session.authenticate("", "probe", "s3cr3t", timeout)?;
//! let mut share = session.attach_share("data")?;
//! let mut file = share.open_or_create("hello.txt", OpenMode::WriteCreateFile)?;
//! file.write(0, b"hello")?;
//! file.close()?;
//! ```
//!

// -- crates
#[macro_use]
extern crate log;

mod config;
mod credentials;
mod error;
mod executor;
mod orchestrator;
mod session;
mod share;
pub mod transport;

pub use config::ProbeConfig;
pub use credentials::{
    ConnectionCredentials, CredentialSource, EnvSource, FileSource, SecretValue, StaticSource,
};
pub use error::{
    AttachError, AuthError, CloseError, ConnectError, CredentialsError, DetachError, ListError,
    OpenError, ProbeError, WriteError,
};
pub use executor::{DirectoryEntry, DirectoryListing, EntryKind, FileHandle, OpenMode};
pub use orchestrator::{Connector, Outcome, RunReport, SessionOrchestrator};
pub use session::{SessionState, TransportSession};
pub use share::{ShareHandle, ShareState};
pub use transport::remote::RemoteFsTransport;
#[cfg(all(target_family = "unix", feature = "smbclient"))]
pub use transport::smb::SmbClientTransport;
pub use transport::{NtStatus, Transport};

// -- utils
pub(crate) mod utils;
// -- mock
#[cfg(test)]
pub(crate) mod mock;
