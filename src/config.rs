//! ## config
//!
//! Probe run configuration

use std::time::Duration;

use crate::utils::path as path_utils;

/// Characters not allowed in an SMB file name
const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Configuration of a probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub(crate) secret_id: String,
    pub(crate) domain: String,
    pub(crate) port: u16,
    pub(crate) connect_timeout: Duration,
    pub(crate) auth_timeout: Duration,
    pub(crate) file_prefix: String,
    pub(crate) content: String,
    pub(crate) directory: Option<String>,
    pub(crate) pattern: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            secret_id: "FScredentials".to_string(),
            domain: String::new(),
            port: 445,
            connect_timeout: Duration::from_secs(10),
            auth_timeout: Duration::from_secs(10),
            file_prefix: "AWSLambdaRequestId_".to_string(),
            content: "This file is written by smb-probe!".to_string(),
            directory: None,
            pattern: "*".to_string(),
        }
    }
}

impl ProbeConfig {
    /// Set the identifier the credentials are stored under
    pub fn secret_id<S: AsRef<str>>(mut self, secret_id: S) -> Self {
        self.secret_id = secret_id.as_ref().to_string();
        self
    }

    /// Set the login domain (workgroup)
    pub fn domain<S: AsRef<str>>(mut self, domain: S) -> Self {
        self.domain = domain.as_ref().to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Set the prefix of the probe file name
    pub fn file_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.file_prefix = prefix.as_ref().to_string();
        self
    }

    /// Set the text written to the probe file
    pub fn content<S: AsRef<str>>(mut self, content: S) -> Self {
        self.content = content.as_ref().to_string();
        self
    }

    /// Write and list inside an existing directory instead of the share root
    pub fn directory<S: AsRef<str>>(mut self, directory: S) -> Self {
        let directory = path_utils::join_smb([directory.as_ref()]);
        self.directory = (!directory.is_empty()).then_some(directory);
        self
    }

    /// Set the directory query pattern
    pub fn pattern<S: AsRef<str>>(mut self, pattern: S) -> Self {
        self.pattern = pattern.as_ref().to_string();
        self
    }

    pub fn get_secret_id(&self) -> &str {
        &self.secret_id
    }

    /// Name of the probe file for the run identified by `run_id`.
    ///
    /// Distinct run ids give distinct names, except for ids differing only in characters
    /// that are reserved in SMB file names, which are replaced with `_`.
    pub fn probe_file_name(&self, run_id: &str) -> String {
        let run_id: String = run_id
            .chars()
            .map(|c| {
                if RESERVED_CHARS.contains(&c) || c.is_control() {
                    '_'
                } else {
                    c
                }
            })
            .collect();
        format!("{}{}.txt", self.file_prefix, run_id)
    }

    /// Share-relative path of the probe file
    pub fn probe_file_path(&self, run_id: &str) -> String {
        let name = self.probe_file_name(run_id);
        path_utils::join_smb([self.listing_path(), name.as_str()])
    }

    /// Share-relative path of the listed directory; empty for the share root
    pub fn listing_path(&self) -> &str {
        self.directory.as_deref().unwrap_or("")
    }
}
