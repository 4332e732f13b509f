//! Azure AD authentication module.
//!
//! Provides OAuth2 with PKCE authentication, file-backed token storage,
//! and a token provider with silent refresh and interactive fallback.

pub mod callback_server;
pub mod oauth;
pub mod token_provider;
pub mod token_store;
