//! Session lifecycle and orchestration.
//!
//! The session object owns the working user set and its derived index, and
//! sequences credential acquisition, directory fetch, filtering, and report
//! delivery. It replaces the hidden shared state a UI would keep: construct
//! at login, dispose at logout.

use std::sync::Arc;

use tracing::info;

use crate::auth::token_provider::TokenProvider;
use crate::directory::{DirectoryClient, UserRecord};
use crate::error::{AppError, AuthError, ReportError};
use crate::report::{export, filter, DatasetIndex, FilterCriteria, ReportRow};

/// Authentication state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not signed in; working set is empty.
    SignedOut,
    /// Sign-in and initial fetch in progress.
    Authenticating,
    /// Signed in with a loaded working set.
    SignedIn,
}

/// Orchestrates login/logout and the report pipeline.
pub struct SessionController {
    token_provider: Arc<TokenProvider>,
    directory: Arc<DirectoryClient>,
    state: SessionState,
    /// Users without a manager, loaded by the last successful fetch.
    working_set: Vec<UserRecord>,
    /// Filter domains derived from the working set.
    index: DatasetIndex,
}

impl SessionController {
    /// Create a signed-out session.
    pub fn new(token_provider: Arc<TokenProvider>, directory: Arc<DirectoryClient>) -> Self {
        Self {
            token_provider,
            directory,
            state: SessionState::SignedOut,
            working_set: Vec::new(),
            index: DatasetIndex::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The loaded working set.
    pub fn users(&self) -> &[UserRecord] {
        &self.working_set
    }

    /// The derived filter domains.
    pub fn index(&self) -> &DatasetIndex {
        &self.index
    }

    /// Sign in and load the working set.
    ///
    /// Re-entrant calls while a sign-in is in progress are rejected. On any
    /// failure the previous state and the previously loaded working set are
    /// left untouched.
    pub async fn login(&mut self) -> Result<(), AppError> {
        if self.state == SessionState::Authenticating {
            return Err(AuthError::SignInInProgress.into());
        }

        let prior = self.state;
        self.state = SessionState::Authenticating;

        let outcome = self.fetch_working_set().await;
        self.complete_login(outcome, prior)
    }

    /// Acquire a credential and fetch the full user set.
    async fn fetch_working_set(&self) -> Result<Vec<UserRecord>, AppError> {
        let credential = self.token_provider.acquire_token().await?;
        let users = self
            .directory
            .list_users_without_manager(&credential.access_token)
            .await?;
        Ok(users)
    }

    /// Apply the outcome of a fetch to the session.
    ///
    /// The working set is only replaced after a fully successful fetch; on
    /// error the session reverts to its prior state with the old data still
    /// loaded.
    fn complete_login(
        &mut self,
        outcome: Result<Vec<UserRecord>, AppError>,
        prior: SessionState,
    ) -> Result<(), AppError> {
        match outcome {
            Ok(users) => {
                self.index = DatasetIndex::build(&users);
                self.working_set = users;
                self.state = SessionState::SignedIn;
                info!(
                    "Session established: {} users without a manager, {} departments, {} job titles",
                    self.working_set.len(),
                    self.index.departments.len(),
                    self.index.job_titles.len()
                );
                Ok(())
            }
            Err(e) => {
                self.state = prior;
                Err(e)
            }
        }
    }

    /// Apply filter criteria over the working set.
    pub fn search(&self, criteria: &FilterCriteria) -> Vec<ReportRow> {
        filter::apply(&self.working_set, criteria)
    }

    /// Render the rows as an HTML table and mail them to the recipient.
    pub async fn send_report(
        &self,
        recipient: &str,
        subject: &str,
        rows: &[ReportRow],
    ) -> Result<(), AppError> {
        if recipient.trim().is_empty() {
            return Err(ReportError::MissingRecipient.into());
        }
        if !recipient.contains('@') {
            return Err(ReportError::InvalidRecipient(recipient.to_string()).into());
        }
        if rows.is_empty() {
            return Err(ReportError::EmptyReport.into());
        }

        let html = export::to_email_html(rows);

        let credential = self.token_provider.acquire_token().await?;
        self.directory
            .send_mail(&credential.access_token, recipient, subject, &html)
            .await?;

        Ok(())
    }

    /// Sign out unconditionally.
    ///
    /// Clears the credential and the working set regardless of whether the
    /// token store could be wiped.
    pub async fn logout(&mut self) {
        self.token_provider.sign_out().await;
        self.working_set.clear();
        self.index = DatasetIndex::default();
        self.state = SessionState::SignedOut;
        info!("Signed out; session state cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::OAuth2Client;
    use crate::config::{
        ApiConfig, AppConfig, Config, LoggingConfig, OAuthConfig, ReportConfig, ScopesConfig,
        TokenConfig,
    };
    use crate::error::ApiError;

    fn test_config() -> Config {
        Config {
            app: AppConfig {
                name: "orgreport".into(),
                version: "0.1.0".into(),
            },
            oauth: OAuthConfig {
                client_id: "client".into(),
                tenant: "tenant".into(),
                redirect_uri: "http://localhost:29167/callback".into(),
                scopes: ScopesConfig { scopes: vec![] },
            },
            api: ApiConfig {
                graph_base_url: "https://graph.microsoft.com/v1.0".into(),
                page_size: 100,
            },
            token: TokenConfig {
                refresh_before_expiry_seconds: 300,
            },
            logging: LoggingConfig {
                level: "info".into(),
            },
            report: ReportConfig::default(),
        }
    }

    fn test_session() -> SessionController {
        let config = test_config();
        let oauth = Arc::new(OAuth2Client::new(&config).unwrap());
        let provider = Arc::new(TokenProvider::new(oauth, &config));
        let directory = Arc::new(DirectoryClient::new(&config).unwrap());
        SessionController::new(provider, directory)
    }

    fn user(name: &str, enabled: bool, has_manager: bool) -> UserRecord {
        UserRecord {
            display_name: Some(name.into()),
            user_principal_name: Some(format!("{}@x.com", name.to_lowercase())),
            mail: Some(format!("{}@x.com", name.to_lowercase())),
            account_enabled: enabled,
            department: Some("Eng".into()),
            job_title: Some("SWE".into()),
            manager: has_manager.then(|| crate::directory::models::ManagerRef {
                id: Some("1".into()),
            }),
        }
    }

    #[test]
    fn test_initial_state() {
        let session = test_session();
        assert_eq!(session.state(), SessionState::SignedOut);
        assert!(session.users().is_empty());
        assert!(session.index().is_empty());
    }

    #[test]
    fn test_successful_fetch_installs_working_set() {
        let mut session = test_session();

        let users = vec![user("Ann", true, false)];
        session
            .complete_login(Ok(users), SessionState::SignedOut)
            .unwrap();

        assert_eq!(session.state(), SessionState::SignedIn);
        assert_eq!(session.users().len(), 1);
        assert_eq!(session.index().departments, vec!["Eng"]);
        assert_eq!(session.index().job_titles, vec!["SWE"]);
    }

    #[test]
    fn test_manager_prefilter_then_index() {
        // Directory-level pre-filter: only users with no manager reference
        // are retained, and the index is derived from the kept set.
        let fetched = vec![user("Ann", true, false), user("Bob", true, true)];
        let kept: Vec<UserRecord> = fetched.into_iter().filter(|u| !u.has_manager()).collect();

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].display_name.as_deref(), Some("Ann"));

        let mut session = test_session();
        session
            .complete_login(Ok(kept), SessionState::SignedOut)
            .unwrap();
        assert_eq!(session.index().departments, vec!["Eng"]);
        assert_eq!(session.index().job_titles, vec!["SWE"]);
    }

    #[test]
    fn test_failed_fetch_leaves_working_set_untouched() {
        let mut session = test_session();
        session
            .complete_login(Ok(vec![user("Ann", true, false)]), SessionState::SignedOut)
            .unwrap();

        // A later fetch fails with Unauthorized; the old data must still be
        // loaded and the session must remain signed in.
        let result = session.complete_login(
            Err(AppError::Api(ApiError::Unauthorized)),
            SessionState::SignedIn,
        );

        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::SignedIn);
        assert_eq!(session.users().len(), 1);
        assert_eq!(session.users()[0].display_name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_failed_first_login_returns_to_signed_out() {
        let mut session = test_session();

        let result = session.complete_login(
            Err(AppError::Auth(AuthError::SignInRequired)),
            SessionState::SignedOut,
        );

        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::SignedOut);
        assert!(session.users().is_empty());
    }

    #[tokio::test]
    async fn test_login_guarded_against_reentry() {
        let mut session = test_session();
        session.state = SessionState::Authenticating;

        let result = session.login().await;
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::SignInInProgress))
        ));
    }

    #[tokio::test]
    async fn test_send_report_validates_input() {
        let session = test_session();
        let rows = vec![crate::report::ReportRow {
            display_name: "Ann".into(),
            user_principal_name: "ann@x.com".into(),
            mail: "ann@x.com".into(),
            sign_in_status: "Allowed".into(),
            department: "Eng".into(),
            job_title: "SWE".into(),
        }];

        let result = session.send_report("", "Report", &rows).await;
        assert!(matches!(
            result,
            Err(AppError::Report(ReportError::MissingRecipient))
        ));

        let result = session.send_report("not-an-email", "Report", &rows).await;
        assert!(matches!(
            result,
            Err(AppError::Report(ReportError::InvalidRecipient(_)))
        ));

        let result = session.send_report("admin@x.com", "Report", &[]).await;
        assert!(matches!(
            result,
            Err(AppError::Report(ReportError::EmptyReport))
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let mut session = test_session();
        session
            .complete_login(
                Ok(vec![user("Ann", true, false), user("Bea", false, false)]),
                SessionState::SignedOut,
            )
            .unwrap();
        assert_eq!(session.users().len(), 2);

        session.logout().await;

        assert_eq!(session.state(), SessionState::SignedOut);
        assert!(session.users().is_empty());
        assert!(session.index().is_empty());
    }

    #[test]
    fn test_search_over_working_set() {
        let mut session = test_session();
        session
            .complete_login(
                Ok(vec![user("Ann", true, false), user("Bea", false, false)]),
                SessionState::SignedOut,
            )
            .unwrap();

        let all = session.search(&FilterCriteria::default());
        assert_eq!(all.len(), 2);

        let denied = session.search(&FilterCriteria {
            sign_in_status: Some(crate::report::SignInStatus::Denied),
            ..Default::default()
        });
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0].display_name, "Bea");
    }
}
