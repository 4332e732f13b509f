//! File-backed storage for OAuth tokens.
//!
//! Stores the access token, refresh token, and expiry timestamp as
//! owner-readable files under the user's configuration directory. Secrets
//! are returned wrapped in `Zeroizing` so they are cleared from memory on
//! drop.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use zeroize::Zeroizing;

use crate::error::TokenStoreError;

/// File names for the stored items.
const FILE_ACCESS_TOKEN: &str = "access_token";
const FILE_REFRESH_TOKEN: &str = "refresh_token";
const FILE_TOKEN_EXPIRY: &str = "token_expiry";

/// Directory holding the token files.
///
/// Prefers the platform config directory, falling back to `~/.orgreport`.
fn store_dir() -> Option<PathBuf> {
    ProjectDirs::from("io", "orgreport", "orgreport")
        .map(|dirs| dirs.config_dir().join("tokens"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".orgreport").join("tokens")))
}

fn item_path(name: &str) -> Result<PathBuf, TokenStoreError> {
    store_dir()
        .map(|dir| dir.join(name))
        .ok_or_else(|| TokenStoreError::StoreFailed("No config directory available".into()))
}

fn write_item(name: &str, value: &str) -> Result<(), TokenStoreError> {
    let path = item_path(name)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TokenStoreError::StoreFailed(e.to_string()))?;
    }

    fs::write(&path, value.as_bytes()).map_err(|e| TokenStoreError::StoreFailed(e.to_string()))?;

    // Token files must not be readable by other users.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .map_err(|e| TokenStoreError::StoreFailed(e.to_string()))?;
    }

    Ok(())
}

fn read_item(name: &str) -> Result<Zeroizing<String>, TokenStoreError> {
    let path = item_path(name).map_err(|_| TokenStoreError::NotFound)?;

    if !path.exists() {
        return Err(TokenStoreError::NotFound);
    }

    let bytes = fs::read(&path).map_err(|e| TokenStoreError::RetrieveFailed(e.to_string()))?;
    let value =
        String::from_utf8(bytes).map_err(|e| TokenStoreError::RetrieveFailed(e.to_string()))?;

    Ok(Zeroizing::new(value))
}

fn delete_item(name: &str) -> Result<(), TokenStoreError> {
    let path = item_path(name)?;

    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TokenStoreError::DeleteFailed(e.to_string())),
    }
}

/// Store the access token.
pub fn store_access_token(token: &str) -> Result<(), TokenStoreError> {
    write_item(FILE_ACCESS_TOKEN, token)
}

/// Retrieve the access token.
///
/// Returns a `Zeroizing<String>` that will be securely cleared when dropped.
#[allow(dead_code)]
pub fn get_access_token() -> Result<Zeroizing<String>, TokenStoreError> {
    read_item(FILE_ACCESS_TOKEN)
}

/// Store the refresh token.
pub fn store_refresh_token(token: &str) -> Result<(), TokenStoreError> {
    write_item(FILE_REFRESH_TOKEN, token)
}

/// Retrieve the refresh token.
///
/// Returns a `Zeroizing<String>` that will be securely cleared when dropped.
pub fn get_refresh_token() -> Result<Zeroizing<String>, TokenStoreError> {
    read_item(FILE_REFRESH_TOKEN)
}

/// Store the token expiry timestamp (ISO 8601 format).
pub fn store_token_expiry(expiry: &str) -> Result<(), TokenStoreError> {
    write_item(FILE_TOKEN_EXPIRY, expiry)
}

/// Retrieve the token expiry timestamp.
#[allow(dead_code)]
pub fn get_token_expiry() -> Result<String, TokenStoreError> {
    read_item(FILE_TOKEN_EXPIRY).map(|z| z.to_string())
}

/// Delete all stored tokens.
///
/// This is used during sign-out to clear all credentials.
pub fn delete_all() -> Result<(), TokenStoreError> {
    let results = [
        delete_item(FILE_ACCESS_TOKEN),
        delete_item(FILE_REFRESH_TOKEN),
        delete_item(FILE_TOKEN_EXPIRY),
    ];

    for result in results {
        result?;
    }

    Ok(())
}

/// Check if any tokens exist in the store.
#[allow(dead_code)]
pub fn has_tokens() -> bool {
    get_access_token().is_ok() || get_refresh_token().is_ok()
}
