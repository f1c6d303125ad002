use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, error};

use crate::config::MailConfig;

/// Outbound mail seam. The core only ever asks for a reset link to be
/// delivered; what transport sits behind this is a deployment concern.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_reset_link(&self, recipient: &str, link: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)?
            .credentials(Credentials::new(
                cfg.smtp_username.clone(),
                cfg.smtp_password.clone(),
            ))
            .build();
        let from = cfg
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| anyhow::anyhow!("invalid MAIL_FROM address: {e}"))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send_reset_link(&self, recipient: &str, link: &str) -> anyhow::Result<()> {
        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| anyhow::anyhow!("invalid recipient address: {e}"))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Password Reset Request")
            .body(format!(
                "You requested a password reset.\n\n\
                 Open the link below to choose a new password:\n{link}\n\n\
                 The link expires in one hour. If you did not request this, ignore this email."
            ))?;
        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "smtp send failed");
            anyhow::anyhow!(e.to_string())
        })?;
        debug!(%recipient, "reset email dispatched");
        Ok(())
    }
}
