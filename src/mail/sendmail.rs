use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("mail task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Substitutes `{{key}}` placeholders. Values are HTML-escaped.
pub fn render_template(template: &str, placeholders: &[(&str, String)]) -> String {
    placeholders
        .iter()
        .fold(template.to_string(), |html, (key, value)| {
            html.replace(&format!("{{{{{}}}}}", key), &ammonia::clean_text(value))
        })
}

/// SMTP sender. Without credentials every message is logged and dropped.
#[derive(Debug, Clone)]
pub struct Mailer {
    smtp: Option<SmtpConfig>,
}

impl Mailer {
    pub fn new(smtp: Option<SmtpConfig>) -> Self {
        Self { smtp }
    }

    pub fn is_configured(&self) -> bool {
        self.smtp.is_some()
    }

    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        template: &str,
        placeholders: &[(&str, String)],
    ) -> Result<(), MailError> {
        let Some(smtp) = self.smtp.clone() else {
            tracing::info!("email not configured, would send \"{}\" to {}", subject, to_email);
            return Ok(());
        };

        let html_body = render_template(template, placeholders);
        let email = Message::builder()
            .from(smtp.from_email.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .multipart(
                MultiPart::alternative().singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body),
                ),
            )?;

        let to = to_email.to_string();
        // lettre's SmtpTransport blocks, keep it off the async workers.
        tokio::task::spawn_blocking(move || -> Result<(), MailError> {
            let creds = Credentials::new(smtp.username, smtp.password);
            let builder = if smtp.port == 465 {
                SmtpTransport::relay(&smtp.host)?
            } else {
                SmtpTransport::starttls_relay(&smtp.host)?
            };
            let mailer = builder.port(smtp.port).credentials(creds).build();
            mailer.send(&email)?;
            Ok(())
        })
        .await??;

        tracing::info!("email sent to {}", to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_replaced_and_escaped() {
        let html = render_template(
            "<p>Hello {{name}}, {{title}}</p>",
            &[
                ("name", "Ada".to_string()),
                ("title", "<script>alert(1)</script>".to_string()),
            ],
        );
        assert!(html.starts_with("<p>Hello Ada, "));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("{{"));
    }

    #[tokio::test]
    async fn unconfigured_mailer_only_logs() {
        let mailer = Mailer::new(None);
        assert!(!mailer.is_configured());
        let result = mailer
            .send_email("someone@helpdesk.test", "Subject", "<p>{{name}}</p>", &[])
            .await;
        assert!(result.is_ok());
    }
}
