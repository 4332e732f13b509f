//! Error types for the orgreport application.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.

use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Authentication-related errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No valid session; interactive sign-in required")]
    SignInRequired,

    #[error("Sign-in was declined: {0}")]
    SignInDeclined(String),

    #[error("Sign-in timed out waiting for the browser callback")]
    CallbackTimeout,

    #[error("Invalid authorization code")]
    InvalidAuthCode,

    #[error("State validation failed (possible CSRF attack)")]
    StateValidationFailed,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Failed to open the system browser: {0}")]
    BrowserLaunchFailed(String),

    #[error("Sign-in callback server failed: {0}")]
    CallbackServerFailed(String),

    #[error("Sign-in already in progress")]
    SignInInProgress,
}

/// Token store errors.
#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Failed to store token: {0}")]
    StoreFailed(String),

    #[error("Failed to retrieve token: {0}")]
    RetrieveFailed(String),

    #[error("Failed to delete token: {0}")]
    DeleteFailed(String),

    #[error("Token not found in store")]
    NotFound,
}

/// Directory API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized (401): Token may be expired")]
    Unauthorized,

    #[error("Forbidden (403): Insufficient permissions")]
    Forbidden,

    #[error("Directory request failed: HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Failed to send directory request: {0}")]
    RequestSendFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseFailed(String),
}

/// Report input validation errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No recipient email address provided")]
    MissingRecipient,

    #[error("Invalid recipient email address: {0}")]
    InvalidRecipient(String),

    #[error("Report contains no rows")]
    EmptyReport,
}

impl AppError {
    /// Returns a user-friendly message for display to the operator.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Auth(AuthError::SignInRequired) => "Please sign in first.",
            Self::Auth(AuthError::SignInDeclined(_)) => "Sign-in was cancelled or declined.",
            Self::Auth(AuthError::CallbackTimeout) => "Sign-in timed out. Please try again.",
            Self::Auth(AuthError::StateValidationFailed) => {
                "Security error. Please try signing in again."
            }
            Self::Auth(AuthError::TokenRefreshFailed(_)) => {
                "Session expired. Please sign in again."
            }
            Self::Auth(AuthError::TokenExchangeFailed(_)) => "Sign-in failed. Please try again.",
            Self::Auth(AuthError::SignInInProgress) => "A sign-in is already in progress.",
            Self::TokenStore(TokenStoreError::NotFound) => "No saved session found.",
            Self::TokenStore(_) => "Failed to access saved credentials.",
            Self::Api(ApiError::Unauthorized) => "Authentication expired. Sign in again.",
            Self::Api(ApiError::Forbidden) => "Insufficient permissions for this operation.",
            Self::Api(ApiError::ParseFailed(_)) => "Unexpected response from the directory.",
            Self::Api(_) => "Directory request failed. Please try again.",
            Self::Report(ReportError::MissingRecipient) => "Please provide a recipient email.",
            Self::Report(ReportError::InvalidRecipient(_)) => {
                "The recipient email address is not valid."
            }
            Self::Report(ReportError::EmptyReport) => "No data available to export or send.",
            Self::Network(_) => "Network error. Check your connection.",
            Self::Config(_) => "Configuration error. Please check settings.",
            _ => "An error occurred. Please try again.",
        }
    }

    /// Returns true if this error means the operator must sign in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::SignInRequired)
                | Self::Auth(AuthError::TokenRefreshFailed(_))
                | Self::Api(ApiError::Unauthorized)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = AppError::Auth(AuthError::TokenExchangeFailed("test".into()));
        assert_eq!(err.user_message(), "Sign-in failed. Please try again.");

        let err = AppError::TokenStore(TokenStoreError::NotFound);
        assert_eq!(err.user_message(), "No saved session found.");

        let err = AppError::Report(ReportError::MissingRecipient);
        assert_eq!(err.user_message(), "Please provide a recipient email.");
    }

    #[test]
    fn test_requires_sign_in() {
        let err = AppError::Api(ApiError::Unauthorized);
        assert!(err.requires_sign_in());

        let err = AppError::Api(ApiError::Forbidden);
        assert!(!err.requires_sign_in());

        let err = AppError::Auth(AuthError::SignInRequired);
        assert!(err.requires_sign_in());
    }

    #[test]
    fn test_remote_error_carries_status_and_body() {
        let err = ApiError::RequestFailed {
            status: 503,
            body: "upstream down".into(),
        };
        let text = err.to_string();
        assert!(text.contains("503"));
        assert!(text.contains("upstream down"));
    }
}
