//! SMTP delivery through lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};

use super::{Notification, NotificationError, NotificationSender};
use crate::config::NotificationConfig;

pub struct SmtpNotificationSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotificationSender {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let host = config.smtp_host.as_str();
        let port = config.smtp_port;

        let mut builder = if config.use_tls {
            let tls_params = TlsParameters::new(host.to_string()).map_err(|e| {
                NotificationError::InvalidConfig(format!("TLS configuration error: {e}"))
            })?;

            // 465 is implicit TLS, everything else negotiates STARTTLS
            if port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .map_err(|e| NotificationError::InvalidConfig(format!("SMTP relay error: {e}")))?
                    .port(port)
                    .tls(Tls::Wrapper(tls_params))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| NotificationError::InvalidConfig(format!("SMTP relay error: {e}")))?
                    .port(port)
                    .tls(Tls::Required(tls_params))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = format!("{} <{}>", config.app_name, config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidConfig(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(notification.subject);

        for recipient in &notification.recipients {
            let mailbox = recipient.parse::<Mailbox>().map_err(|e| {
                NotificationError::SendFailed(format!("Invalid recipient '{recipient}': {e}"))
            })?;
            builder = builder.to(mailbox);
        }

        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body)
            .map_err(|e| NotificationError::SendFailed(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        Ok(())
    }
}
