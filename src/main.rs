//! orgreport - Users Without Manager reporting tool
//!
//! Signs in to Azure AD, fetches the directory users that have no manager
//! assigned, applies the configured filters, writes the result as CSV, and
//! optionally mails it as an HTML table.
//!
//! Run with `orgreport` to produce a report, or `orgreport logout` to
//! discard the saved session.

#![deny(clippy::all)]

mod auth;
mod config;
mod directory;
mod error;
mod report;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use auth::oauth::OAuth2Client;
use auth::token_provider::TokenProvider;
use config::{Config, ReportConfig};
use directory::DirectoryClient;
use report::settings::{self, ReportSettings};
use report::{export, FilterCriteria, SignInStatus};
use session::SessionController;

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    if let Err(e) = dotenvy::dotenv() {
        // .env file is optional - only log if it's not a "file not found" error
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("\nPlease set the following environment variables:");
            eprintln!("  AZURE_CLIENT_ID=<your-azure-ad-client-id>");
            eprintln!("  AZURE_TENANT_ID=<your-tenant-id>");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!("Starting orgreport v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Run failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

/// Run the report workflow (or sign out, if requested).
async fn run(config: Config) -> Result<()> {
    let oauth_client = Arc::new(OAuth2Client::new(&config)?);
    let token_provider = Arc::new(TokenProvider::new(Arc::clone(&oauth_client), &config));
    let directory = Arc::new(DirectoryClient::new(&config)?);
    let mut session = SessionController::new(token_provider, directory);

    if std::env::args().nth(1).as_deref() == Some("logout") {
        session.logout().await;
        println!("Signed out.");
        return Ok(());
    }

    let criteria = build_criteria(&config.report)?;
    if criteria.is_unconstrained() {
        info!("No filters configured; reporting all users without a manager");
    }

    if let Err(e) = session.login().await {
        error!("Sign-in or directory fetch failed: {}", e);
        if e.requires_sign_in() {
            eprintln!("Hint: run `orgreport logout` to discard the saved session, then try again.");
        }
        anyhow::bail!("{}", e.user_message());
    }
    tracing::debug!("Session state: {:?}", session.state());

    let index = session.index();
    if index.is_empty() {
        info!("Working set has no departments or job titles to filter on");
    } else {
        info!(
            "Filter domains: departments [{}], job titles [{}]",
            index.departments.join(", "),
            index.job_titles.join(", ")
        );
    }

    let rows = session.search(&criteria);
    info!("{} of {} users match the filters", rows.len(), session.users().len());

    if rows.is_empty() {
        warn!("No matching results found; nothing to export or send");
        return Ok(());
    }

    let saved = settings::load_report_settings();

    // CSV export
    let output_dir = config
        .report
        .output_dir
        .clone()
        .map(PathBuf::from)
        .or_else(|| saved.last_output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let csv_path = output_dir.join(export::REPORT_FILE_NAME);
    std::fs::write(&csv_path, export::to_csv(&rows))
        .with_context(|| format!("Failed to write report to {}", csv_path.display()))?;
    info!("Report written to {}", csv_path.display());

    // Optional mail delivery
    let recipient = config.report.recipient.clone();
    if let Some(recipient) = recipient {
        let subject = config
            .report
            .subject
            .as_deref()
            .unwrap_or("Users Without Manager Report");

        session
            .send_report(&recipient, subject, &rows)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send the report: {}", e))?;
        info!("Report sent to {}", recipient);

        let new_settings = ReportSettings {
            last_recipient: Some(recipient),
            last_output_dir: Some(output_dir),
        };
        if let Err(e) = settings::save_report_settings(&new_settings) {
            warn!("Failed to persist report settings: {}", e);
        }
    }

    Ok(())
}

/// Build filter criteria from the report configuration.
fn build_criteria(report: &ReportConfig) -> Result<FilterCriteria, error::AppError> {
    let sign_in_status = report
        .sign_in_status
        .as_deref()
        .map(|s| s.parse::<SignInStatus>())
        .transpose()
        .map_err(|e| error::AppError::Config(format!("Invalid report.sign_in_status: {}", e)))?;

    Ok(FilterCriteria {
        search_text: report.search.clone(),
        sign_in_status,
        department: report.department.clone(),
        job_title: report.job_title.clone(),
    })
}
