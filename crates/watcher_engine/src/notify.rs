//! Outbound alerts over SMTP.

use std::time::Duration;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::{Credentials, Mechanism},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use watcher_logging::{watch_info, watch_warn};

pub const ALERT_SUBJECT: &str = "Web Scraper Alert: Item in Stock!";

/// Body of the alert for the monitored `url`.
pub fn alert_body(url: &str) -> String {
    format!("Item is in stock at: {url}\n\nThis email was generated automatically.")
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address {address:?}: {message}")]
    Address { address: String, message: String },

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Delivers an alert about `context` (the monitored URL) to `recipient`.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, context: &str) -> Result<(), NotifyError>;
}

/// Relay and account used to send alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEndpoint {
    pub sender: String,
    pub credential: String,
    pub relay_host: String,
    pub relay_port: u16,
}

#[derive(Debug, Clone)]
pub struct NotifySettings {
    /// Upper bound for one SMTP session.
    pub send_timeout: Duration,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(30),
        }
    }
}

/// Sends alerts through an authenticated SMTP relay.
///
/// Port 465 uses implicit TLS, every other port STARTTLS. The sender address
/// doubles as the PLAIN login; an empty credential skips authentication and
/// is logged as a warning.
#[derive(Debug)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    authenticated: bool,
}

impl SmtpNotifier {
    pub fn new(endpoint: &NotificationEndpoint, settings: NotifySettings) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&endpoint.sender)?;
        if endpoint.relay_host.trim().is_empty() {
            return Err(NotifyError::Config("relay host is empty".to_string()));
        }

        let builder = if endpoint.relay_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&endpoint.relay_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&endpoint.relay_host)
        };
        let mut builder = builder
            .map_err(|e| NotifyError::Config(e.to_string()))?
            .port(endpoint.relay_port)
            .timeout(Some(settings.send_timeout));

        let authenticated = !endpoint.credential.is_empty();
        if authenticated {
            builder = builder
                .credentials(Credentials::new(
                    endpoint.sender.clone(),
                    endpoint.credential.clone(),
                ))
                .authentication(vec![Mechanism::Plain]);
        } else {
            watch_warn!(
                "No SMTP credential for {}; sending to {}:{} without authentication",
                endpoint.sender,
                endpoint.relay_host,
                endpoint.relay_port
            );
        }

        Ok(Self {
            transport: builder.build(),
            from,
            authenticated,
        })
    }

    /// Whether the relay will be asked for a PLAIN login.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Builds the alert message without sending it.
    pub fn compose(&self, recipient: &str, context: &str) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(recipient)?)
            .subject(ALERT_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(alert_body(context))
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, recipient: &str, context: &str) -> Result<(), NotifyError> {
        let message = self.compose(recipient, context)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        watch_info!("Alert for {} delivered to {}", context, recipient);
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        message: e.to_string(),
    })
}
