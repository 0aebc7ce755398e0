use std::str::FromStr;

use async_trait::async_trait;
use chrono::Duration;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::message::Message;
use lettre::message::MultiPart;
use lettre::message::SinglePart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::SmtpTransport;
use lettre::Transport;

use crate::config::MailConfig;
use crate::domain::user::models::User;
use crate::domain::user::ports::Mailer;
use crate::user::errors::MailerError;

/// Account mail delivered over SMTP.
#[derive(Clone)]
pub struct SmtpMailer {
    config: MailConfig,
    reset_expiry: Duration,
}

impl SmtpMailer {
    /// `reset_expiry` is quoted in the reset mail.
    pub fn new(config: MailConfig, reset_expiry: Duration) -> Self {
        Self {
            config,
            reset_expiry,
        }
    }

    /// `{base_url}/account_activations/{token}/edit?user_id={id}`
    pub fn activation_link(&self, user: &User, token: &str) -> String {
        format!(
            "{}/account_activations/{}/edit?user_id={}",
            self.config.base_url.trim_end_matches('/'),
            token,
            user.id
        )
    }

    pub fn password_reset_link(&self, user: &User, token: &str) -> String {
        format!(
            "{}/password_resets/{}/edit?user_id={}",
            self.config.base_url.trim_end_matches('/'),
            token,
            user.id
        )
    }

    fn build_message(&self, user: &User, subject: &str, body: &str) -> Result<Message, MailerError> {
        let from = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_address
        ))
        .map_err(|e| MailerError::InvalidMessage(format!("Invalid from address: {}", e)))?;

        let to = Mailbox::from_str(user.email.as_str())
            .map_err(|e| MailerError::InvalidMessage(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                "<html><body><p>{}</p></body></html>",
                                body.trim().replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| MailerError::InvalidMessage(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, MailerError> {
        let builder = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| MailerError::DeliveryFailed(e.to_string()))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }

    fn password_reset_body(&self, user: &User, token: &str) -> String {
        format!(
            r#"
Hi {name},

To reset your password click the link below:

{link}

This link will expire in {expiry}.

If you did not request your password to be reset, please ignore this email and
your password will stay as it is.
"#,
            name = user.name.as_str(),
            link = self.password_reset_link(user, token),
            expiry = describe_duration(self.reset_expiry)
        )
    }

    async fn send(&self, message: Message) -> Result<(), MailerError> {
        let transport = self.transport()?;

        // SmtpTransport blocks on network I/O.
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailerError::DeliveryFailed(e.to_string()))?
            .map_err(|e| MailerError::DeliveryFailed(e.to_string()))?;

        Ok(())
    }
}

/// "2 hours", "90 minutes", "1 minute".
fn describe_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    let (amount, unit) = if minutes > 0 && minutes % 60 == 0 {
        (minutes / 60, "hour")
    } else {
        (minutes, "minute")
    };
    if amount == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", amount, unit)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_activation_email(&self, user: &User, token: &str) -> Result<(), MailerError> {
        let body = format!(
            r#"
Hi {name},

Welcome to the library! Click on the link below to activate your account:

{link}
"#,
            name = user.name.as_str(),
            link = self.activation_link(user, token)
        );

        let message = self.build_message(user, "Account activation", &body)?;
        self.send(message).await?;

        tracing::info!(user_id = %user.id, "Activation email sent");
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        user: &User,
        token: &str,
    ) -> Result<(), MailerError> {
        let body = self.password_reset_body(user, token);

        let message = self.build_message(user, "Password reset", &body)?;
        self.send(message).await?;

        tracing::info!(user_id = %user.id, "Password reset email sent");
        Ok(())
    }
}
