//! Wire models for the directory and mail endpoints.

use serde::{Deserialize, Serialize};

/// A user record from the directory users endpoint.
///
/// Only the six display fields plus the expanded manager reference are
/// requested; everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// User's display name.
    pub display_name: Option<String>,

    /// User Principal Name (typically email-like format).
    pub user_principal_name: Option<String>,

    /// User's email address.
    pub mail: Option<String>,

    /// Whether the account is allowed to sign in. Absent means disabled.
    #[serde(default)]
    pub account_enabled: bool,

    /// User's department.
    pub department: Option<String>,

    /// User's job title.
    pub job_title: Option<String>,

    /// Expanded manager relationship; absent means no manager assigned.
    pub manager: Option<ManagerRef>,
}

impl UserRecord {
    /// True if the record has a manager assigned.
    pub fn has_manager(&self) -> bool {
        self.manager.is_some()
    }
}

/// The expanded manager reference on a user record.
///
/// Only the id is selected; the presence of the object is what matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerRef {
    pub id: Option<String>,
}

/// One page of the users listing, with the server-driven continuation link.
#[derive(Debug, Deserialize)]
pub struct UserPage {
    pub value: Vec<UserRecord>,

    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

// --- sendMail request body ---

#[derive(Debug, Serialize)]
pub struct SendMailRequest {
    pub message: MailMessage,
    #[serde(rename = "saveToSentItems")]
    pub save_to_sent_items: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    pub subject: String,
    pub body: MailBody,
    pub to_recipients: Vec<Recipient>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailBody {
    pub content_type: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: EmailAddress,
}

#[derive(Debug, Serialize)]
pub struct EmailAddress {
    pub address: String,
}

impl SendMailRequest {
    /// Build a single-recipient HTML message.
    pub fn html(recipient: &str, subject: &str, html_body: &str) -> Self {
        Self {
            message: MailMessage {
                subject: subject.to_string(),
                body: MailBody {
                    content_type: "HTML".to_string(),
                    content: html_body.to_string(),
                },
                to_recipients: vec![Recipient {
                    email_address: EmailAddress {
                        address: recipient.to_string(),
                    },
                }],
            },
            save_to_sent_items: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_deserialization() {
        let json = r#"{
            "displayName": "Ann",
            "userPrincipalName": "ann@x.com",
            "mail": "ann@x.com",
            "accountEnabled": true,
            "department": "Eng",
            "jobTitle": "SWE",
            "manager": null
        }"#;

        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Ann"));
        assert!(user.account_enabled);
        assert!(!user.has_manager());
    }

    #[test]
    fn test_user_record_with_manager() {
        let json = r#"{
            "displayName": "Bob",
            "accountEnabled": false,
            "manager": {"id": "1"}
        }"#;

        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert!(user.has_manager());
        assert!(!user.account_enabled);
        assert!(user.mail.is_none());
    }

    #[test]
    fn test_user_page_next_link() {
        let json = r#"{
            "value": [],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/users?$skiptoken=abc"
        }"#;

        let page: UserPage = serde_json::from_str(json).unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.as_deref().unwrap().contains("skiptoken"));
    }

    #[test]
    fn test_send_mail_request_shape() {
        let request = SendMailRequest::html("admin@x.com", "Report", "<table></table>");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["message"]["subject"], "Report");
        assert_eq!(json["message"]["body"]["contentType"], "HTML");
        assert_eq!(
            json["message"]["toRecipients"][0]["emailAddress"]["address"],
            "admin@x.com"
        );
        assert_eq!(json["saveToSentItems"], true);
    }
}
