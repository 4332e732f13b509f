//! Bearer credential acquisition with silent refresh and interactive fallback.
//!
//! The provider keeps the active credential in memory, tries a silent
//! refresh-token grant when it is missing or near expiry, and only then
//! falls back to an interactive browser sign-in.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::auth::callback_server::{self, CallbackResult};
use crate::auth::oauth::{parse_callback_url, OAuth2Client, PkceChallenge, TokenResponse};
use crate::auth::token_store;
use crate::config::Config;
use crate::error::{AppError, AuthError};

/// How long to wait for the operator to complete the browser sign-in.
const INTERACTIVE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// A bearer credential for the signed-in principal.
#[derive(Clone)]
pub struct Credential {
    /// The access token, cleared from memory on drop.
    pub access_token: Zeroizing<String>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// Scopes granted with the token.
    pub scopes: Vec<String>,
}

impl Credential {
    /// True if the token expires within the given margin.
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_at - Utc::now() <= margin
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Acquires and caches bearer credentials for the directory API.
pub struct TokenProvider {
    oauth_client: Arc<OAuth2Client>,
    /// Refresh this long before the token actually expires.
    refresh_margin: Duration,
    /// The active credential used by subsequent calls.
    active: Mutex<Option<Credential>>,
}

impl TokenProvider {
    /// Create a new token provider.
    pub fn new(oauth_client: Arc<OAuth2Client>, config: &Config) -> Self {
        Self {
            oauth_client,
            refresh_margin: Duration::seconds(config.token.refresh_before_expiry_seconds as i64),
            active: Mutex::new(None),
        }
    }

    /// Acquire a credential for the configured scopes.
    ///
    /// Tries, in order: the in-memory active credential (if not near expiry),
    /// a silent refresh-token grant, and finally an interactive browser
    /// sign-in. The returned credential is also installed as the active one.
    pub async fn acquire_token(&self) -> Result<Credential, AppError> {
        {
            let active = self.active.lock().await;
            if let Some(credential) = active.as_ref() {
                if !credential.expires_within(self.refresh_margin) {
                    return Ok(credential.clone());
                }
            }
        }

        match self.acquire_silent().await {
            Ok(credential) => return Ok(credential),
            Err(e) => {
                info!("Silent token acquisition failed, falling back to interactive: {}", e);
            }
        }

        self.acquire_interactive().await
    }

    /// Acquire a credential using the stored refresh token.
    async fn acquire_silent(&self) -> Result<Credential, AppError> {
        let refresh_token = token_store::get_refresh_token()?;

        let token_response = self.oauth_client.refresh_token(&refresh_token).await?;
        let credential = self.install(token_response).await?;

        info!("Token refreshed silently, expires at {}", credential.expires_at);
        Ok(credential)
    }

    /// Acquire a credential through an interactive browser sign-in.
    pub async fn acquire_interactive(&self) -> Result<Credential, AppError> {
        let pkce = PkceChallenge::new();
        let (auth_url, expected_state) = self.oauth_client.generate_auth_url(&pkce);

        // Callback server runs on its own thread; bridge the result into the
        // async flow and keep a cancel handle for timeout/browser failure.
        let (cancel_tx, cancel_rx) = std::sync::mpsc::channel();
        let (callback_tx, mut callback_rx) = mpsc::channel::<CallbackResult>(1);

        std::thread::spawn(move || {
            let result = callback_server::start_callback_server(cancel_rx);
            let _ = callback_tx.blocking_send(result);
        });

        info!("Opening browser for interactive sign-in");
        if let Err(e) = open::that(auth_url.as_str()) {
            let _ = cancel_tx.send(());
            return Err(AuthError::BrowserLaunchFailed(e.to_string()).into());
        }

        let callback = match tokio::time::timeout(INTERACTIVE_TIMEOUT, callback_rx.recv()).await {
            Ok(Some(result)) => result,
            Ok(None) => {
                return Err(AuthError::CallbackServerFailed("channel closed".into()).into());
            }
            Err(_) => {
                let _ = cancel_tx.send(());
                return Err(AuthError::CallbackTimeout.into());
            }
        };

        let url_string = match callback {
            CallbackResult::Success(url) => url,
            CallbackResult::Cancelled => return Err(AuthError::SignInRequired.into()),
            CallbackResult::Error(e) => return Err(AuthError::CallbackServerFailed(e).into()),
        };

        let (code, state) = parse_callback_url(&url_string)?;
        if state != expected_state {
            return Err(AuthError::StateValidationFailed.into());
        }

        let token_response = self.oauth_client.exchange_code(&code, &pkce.verifier).await?;
        let credential = self.install(token_response).await?;

        info!("Interactive sign-in successful, token expires at {}", credential.expires_at);
        Ok(credential)
    }

    /// Persist a token response and install it as the active credential.
    async fn install(&self, token_response: TokenResponse) -> Result<Credential, AppError> {
        token_store::store_access_token(&token_response.access_token)?;
        if let Some(refresh_token) = &token_response.refresh_token {
            token_store::store_refresh_token(refresh_token)?;
        }

        let expires_at = Utc::now() + Duration::seconds(token_response.expires_in as i64);
        token_store::store_token_expiry(&expires_at.to_rfc3339())?;

        let scopes = if token_response.scope.is_empty() {
            self.oauth_client.scopes().to_vec()
        } else {
            token_response
                .scope
                .split_whitespace()
                .map(str::to_string)
                .collect()
        };

        let credential = Credential {
            access_token: Zeroizing::new(token_response.access_token),
            expires_at,
            scopes,
        };

        *self.active.lock().await = Some(credential.clone());

        Ok(credential)
    }

    /// Discard the active credential and all stored tokens.
    ///
    /// Store deletion failures are logged, not surfaced; sign-out always
    /// clears the in-memory credential.
    pub async fn sign_out(&self) {
        *self.active.lock().await = None;

        if let Err(e) = token_store::delete_all() {
            warn!("Failed to clear token store during sign-out: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential_expiring_in(seconds: i64) -> Credential {
        Credential {
            access_token: Zeroizing::new("super-secret-value".into()),
            expires_at: Utc::now() + Duration::seconds(seconds),
            scopes: vec!["https://graph.microsoft.com/User.Read.All".into()],
        }
    }

    #[test]
    fn test_expires_within() {
        let soon = credential_expiring_in(60);
        assert!(soon.expires_within(Duration::seconds(300)));

        let later = credential_expiring_in(3600);
        assert!(!later.expires_within(Duration::seconds(300)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = credential_expiring_in(3600);
        let debug = format!("{:?}", credential);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-value"));
    }
}
