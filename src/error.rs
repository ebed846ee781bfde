//! ## error
//!
//! Error types, one per operation category

use thiserror::Error;

use crate::transport::NtStatus;

/// Network level connection failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("could not reach {host}:{port}: {status}")]
    Unreachable {
        host: String,
        port: u16,
        status: NtStatus,
    },
    #[error("session is already connected")]
    InvalidState,
}

/// Login failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("login rejected for user {username}: {status}")]
    Rejected { username: String, status: NtStatus },
    #[error("login timed out for user {username}")]
    TimedOut { username: String },
    #[error("session is not connected")]
    NotConnected,
}

/// Tree connect failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("share {share} not found or access denied: {status}")]
    NotFound { share: String, status: NtStatus },
    #[error("session is not authenticated")]
    NotAuthenticated,
}

/// Tree disconnect failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetachError {
    #[error("could not disconnect from share {share}: {status}")]
    Failed { share: String, status: NtStatus },
}

/// Create/open failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpenError {
    #[error("could not open {path}: {status}")]
    Denied { path: String, status: NtStatus },
    #[error("share handle is detached")]
    HandleInvalid,
}

/// Write failure. Writes are all or nothing: a short write is a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("write to {path} failed: {written} of {requested} bytes written ({status})")]
    ShortOrFailedWrite {
        path: String,
        requested: usize,
        written: usize,
        status: NtStatus,
    },
    #[error("file handle for {path} is closed")]
    HandleClosed { path: String },
}

/// Directory query failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("directory query on {path} failed: {status}")]
    QueryFailed { path: String, status: NtStatus },
    #[error("file handle for {path} is closed")]
    HandleClosed { path: String },
}

/// Close failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CloseError {
    #[error("could not close {path}: {status}")]
    Failed { path: String, status: NtStatus },
}

/// Credential retrieval or parsing failure
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("secret {secret_id} is unavailable: {reason}")]
    Unavailable { secret_id: String, reason: String },
    #[error("could not read secret: {0}")]
    Io(#[from] std::io::Error),
    #[error("binary secret is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("secret is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("malformed secret: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("secret field `{0}` is empty")]
    MissingField(&'static str),
}

/// Failure of one of the file phases of a probe run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    List(#[from] ListError),
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_format_errors() {
        let err = WriteError::ShortOrFailedWrite {
            path: "probe.txt".to_string(),
            requested: 10,
            written: 4,
            status: NtStatus::Success,
        };
        assert_eq!(
            err.to_string(),
            "write to probe.txt failed: 4 of 10 bytes written (STATUS_SUCCESS (0x00000000))"
        );
        let err = ProbeError::from(OpenError::Denied {
            path: "probe.txt".to_string(),
            status: NtStatus::ObjectNameCollision,
        });
        assert_eq!(
            err.to_string(),
            "could not open probe.txt: STATUS_OBJECT_NAME_COLLISION (0xC0000035)"
        );
    }

    #[test]
    fn should_convert_credentials_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            CredentialsError::from(err),
            CredentialsError::Malformed(_)
        ));
        assert_eq!(
            CredentialsError::MissingField("host").to_string(),
            "secret field `host` is empty"
        );
    }
}
