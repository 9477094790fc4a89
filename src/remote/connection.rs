//! SSH connection manager
//!
//! Owns at most one authenticated `russh` session. The session handle lives
//! behind an async `RwLock`: command execution clones the handle under a read
//! lock and runs on its own channel, while connect and disconnect take the
//! write lock so they cannot interleave.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine as _;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::PublicKeyBase64;
use russh_keys::key::{KeyPair, PublicKey};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::{CommandResult, RemoteCommand, RemoteShell};
use crate::config::{AuthMethod, ConnectionConfig, HostKeyPolicy};
use crate::error::{ConnectionError, ExecError, Result};

/// Extended data stream number of stderr (RFC 4254)
const STDERR_STREAM: u32 = 1;

/// Compute the SHA-256 fingerprint of an SSH public key in the format
/// `ssh-keygen -l` prints (`SHA256:<base64, no padding>`).
pub fn fingerprint_of(key: &PublicKey) -> String {
    let blob = base64::engine::general_purpose::STANDARD
        .decode(key.public_key_base64().as_bytes())
        .unwrap_or_default();
    let hash = Sha256::digest(&blob);
    let encoded = base64::engine::general_purpose::STANDARD_NO_PAD.encode(hash);
    format!("SHA256:{encoded}")
}

/// Client-side `russh` handler applying the configured host key policy
pub struct HostKeyVerifier {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    /// Fingerprint of a key the policy refused, read back after a failed connect
    rejected: Arc<Mutex<Option<String>>>,
}

impl HostKeyVerifier {
    fn trusts(&self, key: &PublicKey, fingerprint: &str) -> bool {
        match &self.policy {
            HostKeyPolicy::AcceptAny => {
                warn!(
                    host = %self.host,
                    fingerprint = %fingerprint,
                    "accepting host key without verification (host_key.mode = accept_any)"
                );
                true
            }
            HostKeyPolicy::Fingerprint { sha256 } => sha256 == fingerprint,
            HostKeyPolicy::KnownHosts { path } => {
                let checked = match path {
                    Some(path) => {
                        russh_keys::check_known_hosts_path(&self.host, self.port, key, path)
                    }
                    None => russh_keys::check_known_hosts(&self.host, self.port, key),
                };
                match checked {
                    Ok(known) => known,
                    Err(e) => {
                        warn!(host = %self.host, "known_hosts check failed: {}", e);
                        false
                    }
                }
            }
        }
    }
}

#[async_trait]
impl client::Handler for HostKeyVerifier {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let fingerprint = fingerprint_of(server_public_key);
        let trusted = self.trusts(server_public_key, &fingerprint);

        if trusted {
            debug!(fingerprint = %fingerprint, "host key accepted");
        } else {
            warn!(host = %self.host, fingerprint = %fingerprint, "host key rejected");
            if let Ok(mut slot) = self.rejected.lock() {
                *slot = Some(fingerprint);
            }
        }
        Ok(trusted)
    }
}

/// Credential resolved before dialing, so key problems never cost a round trip
enum Credential {
    Password(String),
    Key(KeyPair),
}

/// Manages the single SSH session to the configured host
pub struct ConnectionManager {
    config: ConnectionConfig,
    session: RwLock<Option<Arc<Handle<HostKeyVerifier>>>>,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Establish a new session, replacing any existing one
    #[instrument(skip(self), fields(address = %self.config.address()))]
    pub async fn connect(&self) -> Result<()> {
        let mut slot = self.session.write().await;
        if let Some(old) = slot.take() {
            close(&old).await;
        }
        *slot = Some(Arc::new(self.establish().await?));
        info!("SSH session established");
        Ok(())
    }

    /// Drop the current session and open a fresh one
    pub async fn reconnect(&self) -> Result<()> {
        self.connect().await
    }

    /// Release the session. No-op when none exists.
    #[instrument(skip(self), fields(address = %self.config.address()))]
    pub async fn disconnect(&self) {
        let old = self.session.write().await.take();
        if let Some(handle) = old {
            close(&handle).await;
            info!("SSH session closed");
        }
    }

    /// Run a no-op remote command to prove the session still works
    pub async fn health_check(&self) -> Result<()> {
        self.execute(&RemoteCommand::new("true")).await.map(|_| ())
    }

    /// Run an operator-supplied shell line, returning its output or an
    /// error carrying that output
    pub async fn execute_command(&self, script: &str) -> Result<String> {
        self.execute(&RemoteCommand::script(script)).await
    }

    async fn establish(&self) -> Result<Handle<HostKeyVerifier>> {
        self.config.validate()?;

        let timeout = self.config.connect_timeout();
        match tokio::time::timeout(timeout, self.handshake()).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout(timeout).into()),
        }
    }

    async fn handshake(&self) -> Result<Handle<HostKeyVerifier>> {
        let credential = match &self.config.auth {
            AuthMethod::Password { password } => Credential::Password(password.clone()),
            AuthMethod::Key {
                key_path,
                passphrase,
            } => Credential::Key(load_key(key_path, passphrase.as_deref()).await?),
        };

        let rejected = Arc::new(Mutex::new(None));
        let handler = HostKeyVerifier {
            host: self.config.host.clone(),
            port: self.config.port,
            policy: self.config.host_key.clone(),
            rejected: Arc::clone(&rejected),
        };

        let ssh_config = Arc::new(client::Config::default());
        let mut handle = client::connect(
            ssh_config,
            (self.config.host.as_str(), self.config.port),
            handler,
        )
        .await
        .map_err(|e| {
            let refused = rejected.lock().ok().and_then(|slot| slot.clone());
            match refused {
                Some(fingerprint) => ConnectionError::HostKeyRejected { fingerprint },
                None => ConnectionError::Transport {
                    address: self.config.address(),
                    reason: e.to_string(),
                },
            }
        })?;

        let user = self.config.user.clone();
        let authenticated = match credential {
            Credential::Password(password) => {
                handle.authenticate_password(user.clone(), password).await
            }
            Credential::Key(key) => handle.authenticate_publickey(user.clone(), Arc::new(key)).await,
        }
        .map_err(|e| ConnectionError::Transport {
            address: self.config.address(),
            reason: e.to_string(),
        })?;

        if !authenticated {
            return Err(ConnectionError::AuthRejected(user).into());
        }

        Ok(handle)
    }

    /// Hide the configured token from anything written to the log
    fn redact(&self, line: &str) -> String {
        match self.config.token() {
            Some(token) => line.replace(token, "***"),
            None => line.to_string(),
        }
    }
}

#[async_trait]
impl RemoteShell for ConnectionManager {
    async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn ensure_connected(&self) -> Result<()> {
        let mut slot = self.session.write().await;
        if slot.is_none() {
            info!(address = %self.config.address(), "no SSH session, connecting");
            *slot = Some(Arc::new(self.establish().await?));
        }
        Ok(())
    }

    async fn run(&self, command: &RemoteCommand) -> Result<CommandResult> {
        let handle = self
            .session
            .read()
            .await
            .clone()
            .ok_or(ConnectionError::NotConnected)?;

        let line = command.render();
        debug!(command = %self.redact(&line), "running remote command");

        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(|e| ExecError::Channel(e.to_string()))?;
        channel
            .exec(true, line.as_str())
            .await
            .map_err(|e| ExecError::Channel(e.to_string()))?;

        let mut output = Vec::new();
        let mut exit_status = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == STDERR_STREAM => {
                    output.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status: status } => exit_status = Some(status),
                _ => {}
            }
        }

        // Error messages embed the command, so it is stored redacted
        let result = CommandResult {
            command: self.redact(&line),
            output: String::from_utf8_lossy(&output).into_owned(),
            exit_status,
        };

        if result.success() {
            debug!(command = %result.command, "remote command succeeded");
        } else {
            warn!(
                command = %result.command,
                exit_status = ?result.exit_status,
                "remote command failed"
            );
        }
        Ok(result)
    }
}

async fn load_key(path: &Path, passphrase: Option<&str>) -> Result<KeyPair> {
    let pem = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConnectionError::KeyRead {
            path: path.to_path_buf(),
            source,
        })?;

    russh_keys::decode_secret_key(&pem, passphrase).map_err(|e| {
        ConnectionError::KeyParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

async fn close(handle: &Handle<HostKeyVerifier>) {
    if let Err(e) = handle
        .disconnect(Disconnect::ByApplication, "", "en")
        .await
    {
        debug!("SSH disconnect failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn key_config(key_path: PathBuf) -> ConnectionConfig {
        ConnectionConfig {
            host: "127.0.0.1".to_string(),
            auth: AuthMethod::Key {
                key_path,
                passphrase: None,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_without_session_is_not_connected() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        assert!(!manager.is_connected().await);

        let err = manager.run(&RemoteCommand::new("true")).await.unwrap_err();
        assert!(matches!(err, Error::Connection(ConnectionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_disconnect_without_session_is_noop() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        manager.disconnect().await;
        manager.disconnect().await;
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_connect_reports_unreadable_key() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConnectionManager::new(key_config(temp_dir.path().join("missing")));

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, Error::Connection(ConnectionError::KeyRead { .. })));
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_health_check_without_session() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        let err = manager.health_check().await.unwrap_err();
        assert!(matches!(err, Error::Connection(ConnectionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_reconnect_reports_unreadable_key() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConnectionManager::new(key_config(temp_dir.path().join("missing")));

        let err = manager.reconnect().await.unwrap_err();
        assert!(matches!(err, Error::Connection(ConnectionError::KeyRead { .. })));
    }

    #[tokio::test]
    async fn test_connect_reports_unparsable_key() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("id_ed25519");
        std::fs::write(&key_path, "not a private key").unwrap();
        let manager = ConnectionManager::new(key_config(key_path));

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, Error::Connection(ConnectionError::KeyParse { .. })));
    }

    #[tokio::test]
    async fn test_connect_requires_host() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        let err = manager.ensure_connected().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_redact_hides_token() {
        let manager = ConnectionManager::new(ConnectionConfig {
            github_token: Some("abc123".to_string()),
            ..Default::default()
        });
        assert_eq!(
            manager.redact("git clone https://abc123@github.com/acme/widget.git"),
            "git clone https://***@github.com/acme/widget.git"
        );
    }
}
