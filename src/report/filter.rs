//! Multi-criteria filtering over the working user set.

use std::fmt;
use std::str::FromStr;

use crate::directory::UserRecord;

/// Placeholder rendered for missing optional display fields.
pub const MISSING_FIELD_PLACEHOLDER: &str = "N/A";

/// Whether an account is allowed to sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStatus {
    Allowed,
    Denied,
}

impl SignInStatus {
    /// The status of a given user record.
    pub fn of(user: &UserRecord) -> Self {
        if user.account_enabled {
            Self::Allowed
        } else {
            Self::Denied
        }
    }
}

impl fmt::Display for SignInStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => f.write_str("Allowed"),
            Self::Denied => f.write_str("Denied"),
        }
    }
}

impl FromStr for SignInStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allowed" => Ok(Self::Allowed),
            "denied" => Ok(Self::Denied),
            other => Err(format!(
                "invalid sign-in status '{}' (expected 'Allowed' or 'Denied')",
                other
            )),
        }
    }
}

/// Operator-supplied filter criteria.
///
/// Every criterion is optional; an absent criterion always matches.
/// Criteria are combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Case-insensitive substring match against display name, UPN, or mail.
    pub search_text: Option<String>,
    /// Match on account sign-in status.
    pub sign_in_status: Option<SignInStatus>,
    /// Exact department match.
    pub department: Option<String>,
    /// Exact job title match.
    pub job_title: Option<String>,
}

impl FilterCriteria {
    /// True if no criterion is set.
    pub fn is_unconstrained(&self) -> bool {
        self.search_text.is_none()
            && self.sign_in_status.is_none()
            && self.department.is_none()
            && self.job_title.is_none()
    }

    fn matches(&self, user: &UserRecord) -> bool {
        self.matches_search(user)
            && self.matches_status(user)
            && self.matches_department(user)
            && self.matches_job_title(user)
    }

    fn matches_search(&self, user: &UserRecord) -> bool {
        let Some(search) = &self.search_text else {
            return true;
        };
        let needle = search.to_lowercase();

        // A missing field never matches, but is not an error.
        [
            user.display_name.as_deref(),
            user.user_principal_name.as_deref(),
            user.mail.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_status(&self, user: &UserRecord) -> bool {
        match self.sign_in_status {
            Some(status) => SignInStatus::of(user) == status,
            None => true,
        }
    }

    fn matches_department(&self, user: &UserRecord) -> bool {
        match &self.department {
            Some(department) => user.department.as_deref() == Some(department.as_str()),
            None => true,
        }
    }

    fn matches_job_title(&self, user: &UserRecord) -> bool {
        match &self.job_title {
            Some(job_title) => user.job_title.as_deref() == Some(job_title.as_str()),
            None => true,
        }
    }
}

/// One row of the report, derived 1:1 from a matching user record.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub display_name: String,
    pub user_principal_name: String,
    pub mail: String,
    pub sign_in_status: String,
    pub department: String,
    pub job_title: String,
}

impl ReportRow {
    /// Derive a row from a user record, substituting the placeholder for
    /// missing optional fields.
    pub fn from_user(user: &UserRecord) -> Self {
        let or_placeholder = |value: &Option<String>| {
            value
                .clone()
                .unwrap_or_else(|| MISSING_FIELD_PLACEHOLDER.to_string())
        };

        Self {
            display_name: or_placeholder(&user.display_name),
            user_principal_name: or_placeholder(&user.user_principal_name),
            mail: or_placeholder(&user.mail),
            sign_in_status: SignInStatus::of(user).to_string(),
            department: or_placeholder(&user.department),
            job_title: or_placeholder(&user.job_title),
        }
    }

    /// The six cells in display order.
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.display_name,
            &self.user_principal_name,
            &self.mail,
            &self.sign_in_status,
            &self.department,
            &self.job_title,
        ]
    }
}

/// Apply the criteria over the user set, producing report rows.
///
/// The filter is stable: rows keep the relative order of the input. An
/// empty result is a normal value, not an error.
pub fn apply(users: &[UserRecord], criteria: &FilterCriteria) -> Vec<ReportRow> {
    users
        .iter()
        .filter(|user| criteria.matches(user))
        .map(ReportRow::from_user)
        .collect()
}
