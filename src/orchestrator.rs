//! # orchestrator
//!
//! The end-to-end probe run:
//!
//! ```text
//! load credentials -> connect -> authenticate -> attach share
//!     -> write probe file -> list directory -> detach share -> logoff
//! ```
//!
//! The first failure among credentials, connect, authenticate, attach, open-for-write and
//! write decides the reported outcome. Every resource acquired up to that point is
//! released in reverse order of acquisition; resources never acquired are not touched.

use std::fmt;

use crate::config::ProbeConfig;
use crate::credentials::{ConnectionCredentials, CredentialSource};
use crate::error::{AttachError, AuthError, ConnectError, CredentialsError, ProbeError};
use crate::executor::{DirectoryEntry, OpenMode};
use crate::session::TransportSession;
use crate::share::ShareHandle;
use crate::transport::Transport;

/// Creates a fresh transport for each run
pub trait Connector {
    type Transport: Transport;

    fn transport(&self, host: &str) -> Self::Transport;
}

impl<F, T> Connector for F
where
    F: Fn(&str) -> T,
    T: Transport,
{
    type Transport = T;

    fn transport(&self, host: &str) -> T {
        self(host)
    }
}

/// How a run ended
#[derive(Debug)]
pub enum Outcome {
    /// The probe file was written
    Success { share: String },
    CredentialsUnavailable(CredentialsError),
    ConnectFailed(ConnectError),
    LoginFailed(AuthError),
    AttachFailed(AttachError),
    /// The probe file could not be created or fully written
    WriteFailed { share: String, error: ProbeError },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { share } => {
                write!(f, "Successfully written test file to share: {share}")
            }
            Self::CredentialsUnavailable(err) => {
                write!(f, "Couldn't load file share credentials: {err}")
            }
            Self::ConnectFailed(_) => write!(
                f,
                "Couldn't connect to file share, please check host address and security groups!"
            ),
            Self::LoginFailed(_) => write!(
                f,
                "Couldn't login to file share, please check username and password!"
            ),
            Self::AttachFailed(AttachError::NotFound { share, .. }) => write!(
                f,
                "Couldn't access share {share}, please check share name and permissions!"
            ),
            Self::AttachFailed(err) => write!(f, "Couldn't access share: {err}"),
            Self::WriteFailed { share, error } => {
                write!(f, "Couldn't write test file to share {share}: {error}")
            }
        }
    }
}

/// Result of a run
#[derive(Debug)]
pub struct RunReport {
    /// Share relative path of the probe file
    pub probe_file: String,
    pub outcome: Outcome,
    /// Entries of the listed directory; empty unless the listing succeeded
    pub entries: Vec<DirectoryEntry>,
    /// Why the listing failed, if it was attempted and failed
    pub listing_error: Option<ProbeError>,
}

impl RunReport {
    /// The human-readable outcome handed back to the caller
    pub fn message(&self) -> String {
        self.outcome.to_string()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.outcome, f)
    }
}

/// Runs probes. Each run owns its own session end to end, so one orchestrator can be
/// shared by concurrent runs as long as their run ids differ.
pub struct SessionOrchestrator<S: CredentialSource, C: Connector> {
    config: ProbeConfig,
    source: S,
    connector: C,
}

impl<S: CredentialSource, C: Connector> SessionOrchestrator<S, C> {
    pub fn new(config: ProbeConfig, source: S, connector: C) -> Self {
        Self {
            config,
            source,
            connector,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run the probe for the invocation identified by `run_id`
    pub fn run(&self, run_id: &str) -> RunReport {
        let mut report = RunReport {
            probe_file: self.config.probe_file_path(run_id),
            outcome: Outcome::Success {
                share: String::new(),
            },
            entries: Vec::new(),
            listing_error: None,
        };
        info!("starting probe run {} ({})", run_id, report.probe_file);
        let outcome = match self.source.load(&self.config.secret_id) {
            Ok(credentials) => self.probe(&credentials, &mut report),
            Err(err) => {
                error!("could not load credentials {}: {}", self.config.secret_id, err);
                Outcome::CredentialsUnavailable(err)
            }
        };
        report.outcome = outcome;
        info!("probe run {} finished: {}", run_id, report.outcome);
        report
    }

    fn probe(&self, credentials: &ConnectionCredentials, report: &mut RunReport) -> Outcome {
        let transport = self.connector.transport(credentials.host());
        let mut session = match TransportSession::connect(
            transport,
            credentials.host(),
            self.config.port,
            self.config.connect_timeout,
        ) {
            Ok(session) => session,
            Err(err) => return Outcome::ConnectFailed(err),
        };
        let outcome = match session.authenticate(
            &self.config.domain,
            credentials.get_username(),
            credentials.get_password(),
            self.config.auth_timeout,
        ) {
            Ok(()) => match session.attach_share(credentials.share()) {
                Ok(mut share) => {
                    let outcome = self.exercise_share(&mut share, report);
                    if let Err(err) = share.disconnect() {
                        warn!("{}", err);
                    }
                    outcome
                }
                Err(err) => Outcome::AttachFailed(err),
            },
            Err(err) => Outcome::LoginFailed(err),
        };
        session.logoff();
        outcome
    }

    /// Write the probe file, then list the directory. Only the write decides the outcome.
    fn exercise_share<T: Transport>(
        &self,
        share: &mut ShareHandle<'_, T>,
        report: &mut RunReport,
    ) -> Outcome {
        if let Err(error) = self.write_probe(share, &report.probe_file) {
            error!("probe write failed: {}", error);
            return Outcome::WriteFailed {
                share: share.name().to_string(),
                error,
            };
        }
        info!("written probe file {} to {}", report.probe_file, share.name());
        match self.list_directory(share) {
            Ok(entries) => {
                for entry in entries.iter() {
                    if entry.is_dir() {
                        info!("Dir: {}", entry.name);
                    } else {
                        info!("File: {}", entry.name);
                    }
                }
                report.entries = entries;
            }
            Err(err) => {
                warn!("could not list {}: {}", share.name(), err);
                report.listing_error = Some(err);
            }
        }
        Outcome::Success {
            share: share.name().to_string(),
        }
    }

    fn write_probe<T: Transport>(
        &self,
        share: &mut ShareHandle<'_, T>,
        path: &str,
    ) -> Result<(), ProbeError> {
        let mut file = share.open_or_create(path, OpenMode::WriteCreateFile)?;
        let written = file.write(0, self.config.content.as_bytes());
        if let Err(err) = file.close() {
            warn!("{}", err);
        }
        written?;
        Ok(())
    }

    fn list_directory<T: Transport>(
        &self,
        share: &mut ShareHandle<'_, T>,
    ) -> Result<Vec<DirectoryEntry>, ProbeError> {
        let mut dir = share.open_or_create(self.config.listing_path(), OpenMode::ReadDirectory)?;
        let listing = dir
            .list_directory(&self.config.pattern)
            .map(|listing| listing.collect::<Vec<DirectoryEntry>>());
        if let Err(err) = dir.close() {
            warn!("{}", err);
        }
        Ok(listing?)
    }
}
