/// Email delivery for verification messages
/// Uses lettre with an async SMTP transport
use crate::config::Config;
use crate::error::{AppError, Result};
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Async email transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    base_url: String,
}

impl EmailService {
    /// Build the email service from configuration.
    ///
    /// If the SMTP host is empty, operates in no-op mode (logs only).
    /// Useful for development and testing without email infrastructure.
    pub fn new(config: &Config) -> Result<Self> {
        let from = config
            .email
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.email.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.email.smtp_host)
                    .port(config.email.smtp_port);

            if !config.email.smtp_username.is_empty() {
                builder = builder.credentials(Credentials::new(
                    config.email.smtp_username.clone(),
                    config.email.smtp_password.clone(),
                ));
            }

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            base_url: config.app.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if an SMTP transport is configured
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the verification email carrying the activation link.
    pub async fn send_verification_email(&self, recipient: &str, token: &str) -> Result<()> {
        let link = format!("{}/users/verify/{}", self.base_url, token);
        let subject = "Verify your email";

        let html_body = format!(
            r#"<p>Welcome!</p>
<p><a target="_blank" href="{link}">Click to verify your email</a></p>
<p>If the link does not work, copy this address into your browser:<br>{link}</p>
<p>If you did not sign up, you can safely ignore this message.</p>"#
        );

        let text_body = format!(
            "Welcome!\n\nOpen the following link to verify your email:\n{link}\n\nIf you did not sign up, you can safely ignore this message."
        );

        self.send_mail(recipient, subject, &text_body, &html_body)
            .await
    }

    async fn send_mail(
        &self,
        recipient: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(
                subject,
                recipient, "Email service running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Invalid recipient email address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        transport.send(email).await?;
        info!(subject, "email sent successfully");

        Ok(())
    }
}
