//! Derivation of filter domains from the working user set.

use crate::directory::UserRecord;

/// The distinct departments and job titles present in the working set.
///
/// Rebuilt whole whenever the working set changes; never mutated
/// incrementally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetIndex {
    /// Distinct non-empty departments, sorted ascending.
    pub departments: Vec<String>,
    /// Distinct non-empty job titles, sorted ascending.
    pub job_titles: Vec<String>,
}

impl DatasetIndex {
    /// Derive the index from a user set.
    pub fn build(users: &[UserRecord]) -> Self {
        Self {
            departments: distinct_values(users, |u| u.department.as_deref()),
            job_titles: distinct_values(users, |u| u.job_title.as_deref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty() && self.job_titles.is_empty()
    }
}

/// Collect the distinct non-empty values of one field, sorted for
/// deterministic output.
fn distinct_values<F>(users: &[UserRecord], field: F) -> Vec<String>
where
    F: Fn(&UserRecord) -> Option<&str>,
{
    let mut values: Vec<String> = users
        .iter()
        .filter_map(&field)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    values.sort();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(department: Option<&str>, job_title: Option<&str>) -> UserRecord {
        UserRecord {
            display_name: Some("User".into()),
            user_principal_name: Some("user@x.com".into()),
            mail: Some("user@x.com".into()),
            account_enabled: true,
            department: department.map(str::to_string),
            job_title: job_title.map(str::to_string),
            manager: None,
        }
    }

    #[test]
    fn test_empty_input() {
        let index = DatasetIndex::build(&[]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_distinct_sorted_no_empties() {
        let users = vec![
            user(Some("Sales"), Some("Rep")),
            user(Some("Eng"), None),
            user(Some("Eng"), Some("SWE")),
            user(Some(""), Some("")),
            user(None, Some("SWE")),
        ];

        let index = DatasetIndex::build(&users);

        assert_eq!(index.departments, vec!["Eng", "Sales"]);
        assert_eq!(index.job_titles, vec!["Rep", "SWE"]);
    }

    #[test]
    fn test_each_value_appears_once() {
        let users = vec![
            user(Some("Eng"), Some("SWE")),
            user(Some("Eng"), Some("SWE")),
            user(Some("Eng"), Some("SWE")),
        ];

        let index = DatasetIndex::build(&users);
        assert_eq!(index.departments.len(), 1);
        assert_eq!(index.job_titles.len(), 1);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let users = vec![
            user(Some("Ops"), Some("SRE")),
            user(Some("Eng"), Some("SWE")),
        ];

        assert_eq!(DatasetIndex::build(&users), DatasetIndex::build(&users));
    }
}
