//! ## credentials
//!
//! Connection credentials and the sources they are loaded from

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use base64::{engine::general_purpose, Engine};
use serde::Deserialize;

use crate::error::CredentialsError;

/// Credentials for one probe run. Never persisted.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ConnectionCredentials {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) host: String,
    pub(crate) share: String,
}

impl ConnectionCredentials {
    pub fn new<S: AsRef<str>>(host: S, share: S) -> Self {
        Self {
            host: host.as_ref().to_string(),
            share: share.as_ref().to_string(),
            username: String::new(),
            password: String::new(),
        }
    }

    /// Construct ConnectionCredentials with the provided username
    pub fn username<S: AsRef<str>>(mut self, username: S) -> Self {
        self.username = username.as_ref().to_string();
        self
    }

    /// Construct ConnectionCredentials with the provided password
    pub fn password<S: AsRef<str>>(mut self, password: S) -> Self {
        self.password = password.as_ref().to_string();
        self
    }

    /// Parse the JSON record `{username, password, host, share}`.
    ///
    /// Unknown keys are ignored. Missing keys and empty `username`, `host` or `share`
    /// are errors.
    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let mut credentials: Self = serde_json::from_str(json)?;
        credentials.share = credentials
            .share
            .trim_start_matches(['\\', '/'])
            .to_string();
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn share(&self) -> &str {
        &self.share
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub(crate) fn get_password(&self) -> &str {
        &self.password
    }

    fn validate(&self) -> Result<(), CredentialsError> {
        if self.username.trim().is_empty() {
            return Err(CredentialsError::MissingField("username"));
        }
        if self.host.trim().is_empty() {
            return Err(CredentialsError::MissingField("host"));
        }
        if self.share.trim().is_empty() {
            return Err(CredentialsError::MissingField("share"));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("share", &self.share)
            .finish()
    }
}

/// Raw secret as stored by a secret store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretValue {
    /// JSON text
    Text(String),
    /// Base64 encoded JSON text
    Binary(Vec<u8>),
}

impl SecretValue {
    /// Decode the secret to its JSON text
    pub fn into_text(self) -> Result<String, CredentialsError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Binary(encoded) => {
                let encoded: Vec<u8> = encoded
                    .into_iter()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                let decoded = general_purpose::STANDARD.decode(encoded)?;
                Ok(String::from_utf8(decoded)?)
            }
        }
    }
}

/// Provider of connection credentials.
///
/// A source is called synchronously once per run and may fail.
pub trait CredentialSource {
    /// Fetch the raw secret stored under `secret_id`
    fn fetch(&self, secret_id: &str) -> Result<SecretValue, CredentialsError>;

    /// Fetch and parse the credentials stored under `secret_id`
    fn load(&self, secret_id: &str) -> Result<ConnectionCredentials, CredentialsError> {
        let text = self.fetch(secret_id)?.into_text()?;
        ConnectionCredentials::from_json(&text)
    }
}

/// In-memory secrets
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    secrets: HashMap<String, SecretValue>,
}

impl StaticSource {
    /// Construct StaticSource with the provided secret
    pub fn secret<S: AsRef<str>>(mut self, secret_id: S, value: SecretValue) -> Self {
        self.secrets.insert(secret_id.as_ref().to_string(), value);
        self
    }
}

impl CredentialSource for StaticSource {
    fn fetch(&self, secret_id: &str) -> Result<SecretValue, CredentialsError> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| CredentialsError::Unavailable {
                secret_id: secret_id.to_string(),
                reason: "no such secret".to_string(),
            })
    }
}

/// Secrets stored in environment variables named `<prefix><secret_id>`
#[derive(Debug, Default, Clone)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    pub fn new<S: AsRef<str>>(prefix: S) -> Self {
        Self {
            prefix: prefix.as_ref().to_string(),
        }
    }
}

impl CredentialSource for EnvSource {
    fn fetch(&self, secret_id: &str) -> Result<SecretValue, CredentialsError> {
        let var = format!("{}{}", self.prefix, secret_id);
        trace!("reading secret from environment variable {}", var);
        std::env::var(&var)
            .map(SecretValue::Text)
            .map_err(|e| CredentialsError::Unavailable {
                secret_id: secret_id.to_string(),
                reason: format!("{var}: {e}"),
            })
    }
}

/// Secrets stored as `<dir>/<secret_id>.json`
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl CredentialSource for FileSource {
    fn fetch(&self, secret_id: &str) -> Result<SecretValue, CredentialsError> {
        let path = self.dir.join(format!("{secret_id}.json"));
        trace!("reading secret from {}", path.display());
        Ok(SecretValue::Text(std::fs::read_to_string(path)?))
    }
}

#[cfg(test)]
mod test {

    use std::io::Write;

    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    const SECRET: &str =
        r#"{"username":"probe","password":"secret","host":"10.0.0.10","share":"data"}"#;

    #[test]
    fn should_construct_credentials() {
        let credentials = ConnectionCredentials::new("10.0.0.10", "data")
            .username("test")
            .password("foobar");
        assert_eq!(credentials.host(), "10.0.0.10");
        assert_eq!(credentials.share(), "data");
        assert_eq!(credentials.get_username(), "test");
        assert_eq!(credentials.get_password(), "foobar");
    }

    #[test]
    fn should_parse_credentials() {
        let credentials = ConnectionCredentials::from_json(
            r#"{"username":"probe","password":"secret","host":"fs.local","share":"\\data","engine":"fsx"}"#,
        )
        .unwrap();
        assert_eq!(credentials.get_username(), "probe");
        assert_eq!(credentials.get_password(), "secret");
        assert_eq!(credentials.host(), "fs.local");
        assert_eq!(credentials.share(), "data");
    }

    #[test]
    fn should_not_parse_incomplete_credentials() {
        assert!(matches!(
            ConnectionCredentials::from_json(r#"{"username":"probe","host":"h","share":"s"}"#),
            Err(CredentialsError::Malformed(_))
        ));
        assert!(matches!(
            ConnectionCredentials::from_json("not json"),
            Err(CredentialsError::Malformed(_))
        ));
        assert!(matches!(
            ConnectionCredentials::from_json(
                r#"{"username":"probe","password":"x","host":" ","share":"s"}"#
            ),
            Err(CredentialsError::MissingField("host"))
        ));
        assert!(matches!(
            ConnectionCredentials::from_json(
                r#"{"username":"probe","password":"x","host":"h","share":"/"}"#
            ),
            Err(CredentialsError::MissingField("share"))
        ));
    }

    #[test]
    fn should_redact_password() {
        let credentials = ConnectionCredentials::from_json(SECRET).unwrap();
        let debug = format!("{credentials:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn should_decode_binary_secret() {
        let encoded = general_purpose::STANDARD.encode(SECRET);
        let source = StaticSource::default().secret(
            "FScredentials",
            SecretValue::Binary(format!("{encoded}\n").into_bytes()),
        );
        let credentials = source.load("FScredentials").unwrap();
        assert_eq!(credentials.share(), "data");
        let source = StaticSource::default()
            .secret("FScredentials", SecretValue::Binary(b"%%%".to_vec()));
        assert!(matches!(
            source.load("FScredentials"),
            Err(CredentialsError::Encoding(_))
        ));
    }

    #[test]
    fn should_fail_on_unknown_secret() {
        let source = StaticSource::default();
        assert!(matches!(
            source.load("FScredentials"),
            Err(CredentialsError::Unavailable { .. })
        ));
    }

    #[test]
    #[serial]
    fn should_load_secret_from_env() {
        std::env::set_var("SMB_PROBE_TEST_FScredentials", SECRET);
        let credentials = EnvSource::new("SMB_PROBE_TEST_")
            .load("FScredentials")
            .unwrap();
        assert_eq!(credentials.host(), "10.0.0.10");
        std::env::remove_var("SMB_PROBE_TEST_FScredentials");
        assert!(matches!(
            EnvSource::new("SMB_PROBE_TEST_").load("FScredentials"),
            Err(CredentialsError::Unavailable { .. })
        ));
    }

    #[test]
    fn should_load_secret_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("FScredentials.json")).unwrap();
        file.write_all(SECRET.as_bytes()).unwrap();
        let source = FileSource::new(dir.path());
        assert_eq!(source.load("FScredentials").unwrap().share(), "data");
        assert!(matches!(
            source.load("missing"),
            Err(CredentialsError::Io(_))
        ));
    }
}
