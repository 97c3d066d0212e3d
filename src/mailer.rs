//! Outbound email through an HTTP mail API.

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Mentor, MentorEmailFailure, MentorEmailResponse};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mailbox {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    /// Base64 payload, as the mail API expects it.
    pub content: String,
    pub content_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEmail {
    pub from: Mailbox,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Sends a single email. Implemented by [`HttpMailer`] and by test doubles.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), AppError>;
}

fn inline_image_regex() -> &'static Regex {
    static INLINE: OnceLock<Regex> = OnceLock::new();
    INLINE.get_or_init(|| {
        Regex::new(r#"src=["']data:image/(png|jpe?g|gif|webp);base64,([A-Za-z0-9+/=\s]+)["']"#)
            .expect("inline image regex is valid")
    })
}

/// Moves inline `data:image/...;base64,` sources into attachments.
///
/// Each image is replaced with a `cid:` reference to its attachment. Images
/// whose payload does not decode are left in place.
pub fn extract_inline_images(html: &str) -> (String, Vec<Attachment>) {
    let mut attachments = Vec::new();

    let rewritten = inline_image_regex().replace_all(html, |caps: &regex::Captures| {
        let subtype = caps[1].to_ascii_lowercase();
        let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();

        if STANDARD.decode(&payload).is_err() {
            tracing::warn!("Skipping inline {} image with invalid base64", subtype);
            return caps[0].to_string();
        }

        let content_id = uuid::Uuid::new_v4().simple().to_string();
        let extension = if subtype == "jpeg" { "jpg" } else { subtype.as_str() };
        attachments.push(Attachment {
            filename: format!("image-{}.{}", attachments.len() + 1, extension),
            content_type: format!("image/{}", subtype),
            content: payload,
            content_id: content_id.clone(),
        });

        format!("src=\"cid:{}\"", content_id)
    });

    (rewritten.into_owned(), attachments)
}

/// Splits a comma or semicolon separated CC field into addresses.
pub fn parse_cc(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds the email for one mentor.
///
/// `{first_name}` and `{last_name}` in the body are replaced with the
/// mentor's names.
pub fn compose_mentor_email(
    from: &Mailbox,
    mentor: &Mentor,
    subject: &str,
    body: &str,
    cc: &[String],
) -> OutboundEmail {
    let personalized = body
        .replace("{first_name}", &mentor.first_name)
        .replace("{last_name}", &mentor.last_name);
    let (html, attachments) = extract_inline_images(&personalized);

    OutboundEmail {
        from: from.clone(),
        to: vec![mentor.email.clone()],
        cc: cc.to_vec(),
        subject: subject.to_string(),
        html,
        attachments,
    }
}

/// Emails each mentor in `mentor_ids`, in order.
///
/// Unknown ids, blank addresses and failed sends land in `failed`; the rest of
/// the batch still goes out.
pub async fn send_mentor_emails(
    mailer: &dyn EmailSender,
    from: &Mailbox,
    mentors: &HashMap<i64, Mentor>,
    mentor_ids: &[i64],
    subject: &str,
    body: &str,
    cc: &[String],
) -> MentorEmailResponse {
    let mut sent = 0;
    let mut failed = Vec::new();

    for &mentor_id in mentor_ids {
        let Some(mentor) = mentors.get(&mentor_id) else {
            failed.push(MentorEmailFailure {
                mentor_id,
                reason: "Mentor not found".to_string(),
            });
            continue;
        };

        if mentor.email.trim().is_empty() {
            failed.push(MentorEmailFailure {
                mentor_id,
                reason: "Mentor has no email address".to_string(),
            });
            continue;
        }

        let email = compose_mentor_email(from, mentor, subject, body, cc);
        match mailer.send(&email).await {
            Ok(()) => sent += 1,
            Err(e) => {
                tracing::error!("Email to mentor {} failed: {}", mentor_id, e);
                failed.push(MentorEmailFailure {
                    mentor_id,
                    reason: e.public_message(),
                });
            }
        }
    }

    MentorEmailResponse { sent, failed }
}

/// [`EmailSender`] backed by a JSON mail API (`POST` with a bearer key).
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create mail client: {}", e))
            })?;

        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(config.mail_api_url.clone(), config.mail_api_key.clone())
    }
}

#[async_trait]
impl EmailSender for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), AppError> {
        tracing::info!(
            "Sending email '{}' to {} recipient(s)",
            email.subject,
            email.to.len()
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Mail API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Mail API returned {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "Mail API returned {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Records what it sends and rejects one address.
    struct FlakyMailer {
        reject: &'static str,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmailSender for FlakyMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), AppError> {
            if email.to.iter().any(|to| to == self.reject) {
                return Err(AppError::ExternalApiError("550 mailbox unavailable".to_string()));
            }
            self.delivered.lock().unwrap().extend(email.to.iter().cloned());
            Ok(())
        }
    }

    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    fn mentor() -> Mentor {
        mentor_with(7, "pat@example.org")
    }

    fn mentor_with(id: i64, email: &str) -> Mentor {
        Mentor {
            id,
            first_name: "Pat".to_string(),
            last_name: "Ng".to_string(),
            email: email.to_string(),
            phone: String::new(),
            address: String::new(),
            notes: String::new(),
            team_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_extracts_inline_images() {
        let html = format!(r#"<p>Hi</p><img src="data:image/png;base64,{}">"#, PIXEL);
        let (rewritten, attachments) = extract_inline_images(&html);

        assert_eq!(attachments.len(), 1);
        let attachment = &attachments[0];
        assert_eq!(attachment.content_type, "image/png");
        assert_eq!(attachment.filename, "image-1.png");
        assert_eq!(attachment.content, PIXEL);
        assert!(rewritten.contains(&format!("src=\"cid:{}\"", attachment.content_id)));
        assert!(!rewritten.contains("base64"));
    }

    #[test]
    fn test_leaves_plain_html_alone() {
        let html = r#"<img src="https://example.org/logo.png">"#;
        let (rewritten, attachments) = extract_inline_images(html);
        assert_eq!(rewritten, html);
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_invalid_base64_is_kept() {
        let html = r#"<img src="data:image/gif;base64,abc">"#;
        let (rewritten, attachments) = extract_inline_images(html);
        assert_eq!(rewritten, html);
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_parse_cc() {
        assert_eq!(
            parse_cc(Some(" a@example.org; b@example.org ,,")),
            vec!["a@example.org".to_string(), "b@example.org".to_string()]
        );
        assert!(parse_cc(None).is_empty());
    }

    #[test]
    fn test_compose_mentor_email() {
        let from = Mailbox {
            name: "GEARS Dashboard".to_string(),
            email: "noreply@example.org".to_string(),
        };
        let email = compose_mentor_email(&from, &mentor(), "Practice", "Hi {first_name}!", &[]);

        assert_eq!(email.to, vec!["pat@example.org".to_string()]);
        assert_eq!(email.html, "Hi Pat!");
        assert!(email.cc.is_empty());

        let json = serde_json::to_value(&email).unwrap();
        assert_eq!(json["from"]["name"], "GEARS Dashboard");
        assert!(json.get("cc").is_none());
    }

    #[tokio::test]
    async fn test_batch_reports_each_failure_and_keeps_going() {
        let mailer = FlakyMailer {
            reject: "bounce@example.org",
            delivered: Mutex::new(Vec::new()),
        };
        let from = Mailbox {
            name: "GEARS Dashboard".to_string(),
            email: "noreply@example.org".to_string(),
        };
        let mentors: HashMap<i64, Mentor> = [
            mentor_with(1, "pat@example.org"),
            mentor_with(2, "bounce@example.org"),
            mentor_with(3, "  "),
            mentor_with(4, "kim@example.org"),
        ]
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

        let result = send_mentor_emails(
            &mailer,
            &from,
            &mentors,
            &[1, 2, 3, 99, 4],
            "Practice",
            "Hi {first_name}",
            &[],
        )
        .await;

        assert_eq!(result.sent, 2);
        assert_eq!(
            *mailer.delivered.lock().unwrap(),
            vec!["pat@example.org".to_string(), "kim@example.org".to_string()]
        );

        let failures: Vec<(i64, &str)> = result
            .failed
            .iter()
            .map(|f| (f.mentor_id, f.reason.as_str()))
            .collect();
        assert_eq!(
            failures,
            vec![
                (2, "External service error"),
                (3, "Mentor has no email address"),
                (99, "Mentor not found"),
            ]
        );
    }
}
