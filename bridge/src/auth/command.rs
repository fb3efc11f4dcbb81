//! Token provider backed by the node's own CLI.
//!
//! Runs `<binary> bridge auth admin --p2p.network <network>` and uses its
//! trimmed standard output as the token.

use async_trait::async_trait;
use tokio::process::Command;

use super::{AuthError, AuthToken, TokenProvider};
use crate::config::AuthConfig;

/// Fetches an admin token by shelling out to the node CLI.
#[derive(Clone, Debug)]
pub struct CommandTokenProvider {
    binary: String,
    p2p_network: String,
}

impl CommandTokenProvider {
    pub fn new(binary: impl Into<String>, p2p_network: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            p2p_network: p2p_network.into(),
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.binary.clone(), cfg.p2p_network.clone())
    }

    /// Arguments passed to the binary.
    pub fn args(&self) -> [&str; 5] {
        ["bridge", "auth", "admin", "--p2p.network", self.p2p_network.as_str()]
    }
}

#[async_trait]
impl TokenProvider for CommandTokenProvider {
    async fn fetch_token(&self) -> Result<AuthToken, AuthError> {
        tracing::debug!(binary = %self.binary, network = %self.p2p_network, "fetching auth token");

        let output = Command::new(&self.binary)
            .args(self.args())
            .output()
            .await
            .map_err(|source| AuthError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(AuthError::Exit {
                binary: self.binary.clone(),
                status: output.status,
                output: format!("{}{}", stdout, stderr).trim().to_string(),
            });
        }

        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %stderr.trim(), "auth token command wrote to stderr");
        }

        Ok(AuthToken::new(stdout.trim()))
    }
}
