// ============================================================================
// SERVICE : MAIL (relais SMTP Mailtrap)
// ============================================================================
//
// Description:
//   Trois emails: bienvenue + OTP, lien de reset, confirmation de reset.
//   Notifier::send() lance l'envoi dans une tâche tokio détachée: la réponse
//   HTTP part sans attendre, un échec d'envoi est seulement loggé.
//
// ============================================================================

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use thiserror::Error;

use crate::config::MailConfig;
use crate::utils::templates::{self, TemplateData};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| MailError::Address(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e| MailError::Address(e.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum MailKind {
    /// Bienvenue + OTP de vérification
    Verification { otp: String },
    /// Lien vers la page de reset
    ForgotPassword { link: String },
    ResetConfirmed,
}

#[derive(Debug, Clone)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    sign_in_url: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, sign_in_url: impl Into<String>) -> Self {
        Self {
            mailer,
            sign_in_url: sign_in_url.into(),
        }
    }

    pub fn compose(&self, kind: &MailKind, recipient: &Recipient) -> OutgoingMail {
        let (subject, html) = match kind {
            MailKind::Verification { otp } => {
                let message = format!(
                    "Hi {}, welcome to PanMusic! There are so many things that we do for verified users. Use the given OTP to verify your email.",
                    recipient.name
                );
                (
                    "Welcome to PanMusic",
                    templates::render(&TemplateData {
                        title: "Welcome to PanMusic",
                        message: &message,
                        link: "#",
                        btn_title: otp,
                    }),
                )
            }
            MailKind::ForgotPassword { link } => (
                "Reset your PanMusic password",
                templates::render(&TemplateData {
                    title: "Reset Password",
                    message: "We just received a request that you forgot your password. Please use the link below to reset your password.",
                    link,
                    btn_title: "Reset Password",
                }),
            ),
            MailKind::ResetConfirmed => {
                let message = format!(
                    "Dear {}, we just updated your password. You can now sign in with your new password.",
                    recipient.name
                );
                (
                    "PanMusic Password Reset Successfully",
                    templates::render(&TemplateData {
                        title: "Password Reset Successfully",
                        message: &message,
                        link: &self.sign_in_url,
                        btn_title: "Sign In",
                    }),
                )
            }
        };

        OutgoingMail {
            to: recipient.email.clone(),
            subject: subject.to_string(),
            html,
        }
    }

    /// Fire-and-forget: rien n'est renvoyé à l'appelant
    pub fn send(&self, kind: MailKind, recipient: Recipient) {
        let mail = self.compose(&kind, &recipient);
        let mailer = self.mailer.clone();

        tokio::spawn(async move {
            let to = mail.to.clone();
            match mailer.send(mail).await {
                Ok(()) => tracing::info!(to = %to, "mail sent"),
                Err(e) => tracing::error!(to = %to, error = %e, "failed to send mail"),
            }
        });
    }
}
