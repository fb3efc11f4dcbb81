//! Admin token acquisition for the bridge node RPC.
//!
//! The bridge node only serves `header.*` methods to callers presenting a
//! bearer token. The exporter obtains one exactly once at startup through a
//! [`TokenProvider`] and keeps it for the rest of the process lifetime.

pub mod command;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use command::CommandTokenProvider;

/// Opaque bearer token.
///
/// May be empty when the token could not be obtained; requests then go out
/// with an empty bearer and fail at the node, which keeps the failure
/// visible in the logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("AuthToken(<empty>)")
        } else {
            f.write_str("AuthToken(<redacted>)")
        }
    }
}

/// Errors that can occur while fetching the auth token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token command could not be started at all.
    #[error("failed to run `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    /// The token command ran but exited unsuccessfully.
    #[error("`{binary}` exited with {status}, output: {output}")]
    Exit {
        binary: String,
        status: std::process::ExitStatus,
        output: String,
    },
}

/// Source of the bearer token used for every RPC call.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<AuthToken, AuthError>;
}

/// Fetches a token from `provider`, logging and falling back to an empty
/// token on failure. There is no retry.
pub async fn token_or_empty<P>(provider: &P) -> AuthToken
where
    P: TokenProvider + ?Sized,
{
    match provider.fetch_token().await {
        Ok(token) => {
            if token.is_empty() {
                tracing::warn!("auth token command returned an empty token");
            }
            token
        }
        Err(e) => {
            tracing::error!(error = %e, "error getting auth token, continuing without one");
            AuthToken::default()
        }
    }
}
