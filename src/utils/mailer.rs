use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, warn};

use crate::config::SmtpConfig;
use crate::service::dispatcher::{DeliveryError, Notifier};

struct Relay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// Plain-text mail over an authenticated STARTTLS relay.
///
/// Incomplete credentials are not a startup error: the notifier is built
/// anyway and every send fails with [`DeliveryError::NotConfigured`].
pub struct SmtpNotifier {
    relay: Option<Relay>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let (username, password, from) = match (&config.username, &config.password, &config.from) {
            (Some(u), Some(p), Some(f)) if !config.host.is_empty() => (u, p, f),
            _ => {
                warn!(host = %config.host, "SMTP credentials incomplete, notifications will not be delivered");
                return Ok(Self { relay: None });
            }
        };

        let from: Mailbox = from
            .parse()
            .map_err(|_| DeliveryError::Address(from.clone()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(username.clone(), password.clone()))
            .build();

        debug!(host = %config.host, port = config.port, "SMTP relay configured");
        Ok(Self {
            relay: Some(Relay { transport, from }),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let relay = self
            .relay
            .as_ref()
            .ok_or_else(|| DeliveryError::NotConfigured("smtp credentials not configured".into()))?;

        let to: Mailbox = address
            .parse()
            .map_err(|_| DeliveryError::Address(address.to_string()))?;

        let message = Message::builder()
            .from(relay.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Message(e.to_string()))?;

        relay
            .transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(())
    }
}
