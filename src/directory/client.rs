//! HTTP client for the directory users and mail endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{SendMailRequest, UserPage, UserRecord};
use crate::config::Config;
use crate::error::ApiError;

/// Fields selected on each user record.
const USER_SELECT_FIELDS: &str =
    "displayName,userPrincipalName,mail,accountEnabled,department,jobTitle";

/// Upper bound on continuation pages, against a misbehaving server that
/// keeps returning next links.
const MAX_PAGES: u32 = 500;

/// HTTP request timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// HTTP connection timeout.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Directory/mail API client.
pub struct DirectoryClient {
    http_client: Client,
    base_url: String,
    page_size: u32,
}

impl DirectoryClient {
    /// Create a new directory client.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.api.graph_base_url.trim_end_matches('/').to_string(),
            page_size: config.api.page_size,
        })
    }

    /// Fetch all users that have no manager assigned.
    ///
    /// Follows the server-driven continuation link until the listing is
    /// exhausted, concatenates the pages, and only then applies the
    /// "no manager" predicate, so a partially fetched directory is never
    /// returned.
    pub async fn list_users_without_manager(
        &self,
        access_token: &str,
    ) -> Result<Vec<UserRecord>, ApiError> {
        let first_url = format!(
            "{}/users?$expand=manager($select=id)&$select={}&$top={}",
            self.base_url, USER_SELECT_FIELDS, self.page_size
        );

        let mut users: Vec<UserRecord> = Vec::new();
        let mut next_url = Some(first_url);
        let mut page_count = 0u32;

        while let Some(url) = next_url {
            if page_count >= MAX_PAGES {
                return Err(ApiError::ParseFailed(format!(
                    "Users listing did not terminate after {} pages",
                    MAX_PAGES
                )));
            }

            debug!("Fetching users page {}", page_count + 1);
            let page = self.get_user_page(access_token, &url).await?;
            page_count += 1;

            users.extend(page.value);
            next_url = page.next_link;
        }

        let total = users.len();
        users.retain(|user| !user.has_manager());

        info!(
            "Fetched {} users in {} pages, {} without a manager",
            total,
            page_count,
            users.len()
        );

        Ok(users)
    }

    /// Fetch a single page of the users listing.
    async fn get_user_page(&self, access_token: &str, url: &str) -> Result<UserPage, ApiError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .header("client-request-id", Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(|e| ApiError::RequestSendFailed(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            200 => response
                .json()
                .await
                .map_err(|e| ApiError::ParseFailed(e.to_string())),
            401 => Err(ApiError::Unauthorized),
            403 => Err(ApiError::Forbidden),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::RequestFailed {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Send a single HTML message to one recipient.
    ///
    /// Mail is not safe to blindly retry, so any failure is propagated
    /// verbatim to the caller.
    pub async fn send_mail(
        &self,
        access_token: &str,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), ApiError> {
        let url = format!("{}/me/sendMail", self.base_url);
        let request = SendMailRequest::html(recipient, subject, html_body);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .header("client-request-id", Uuid::new_v4().to_string())
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::RequestSendFailed(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            // Graph replies 202 Accepted on success
            200 | 202 => {
                info!("Report mail accepted for {}", recipient);
                Ok(())
            }
            401 => Err(ApiError::Unauthorized),
            403 => Err(ApiError::Forbidden),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::RequestFailed {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
