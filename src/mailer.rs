use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::config::EmailConfig;

const ACTIVATION_SUBJECT: &str = "User Verification";
const ACTIVATION_TEMPLATE: &str = include_str!("../templates/verify_email.html");
const QUEUE_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct ActivationEmail {
    pub to: String,
    pub username: String,
    pub code: String,
}

/// Handle to the background delivery worker. Queueing never blocks a request:
/// a full or closed queue drops the job with a warning, and a failed send is
/// logged by the worker and not retried.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<ActivationEmail>,
}

impl Mailer {
    pub fn spawn(config: EmailConfig) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(deliver_queued(rx, config));
        Self { tx }
    }

    /// Queue with no worker behind it; every job is dropped. For tests.
    pub fn disconnected() -> Self {
        let (tx, _) = mpsc::channel(QUEUE_CAPACITY);
        Self { tx }
    }

    pub fn queue_activation(&self, email: ActivationEmail) {
        if let Err(e) = self.tx.try_send(email) {
            warn!(error = %e, "activation email dropped");
        }
    }
}

async fn deliver_queued(mut rx: mpsc::Receiver<ActivationEmail>, config: EmailConfig) {
    let transport = match build_transport(&config) {
        Ok(transport) => transport,
        Err(e) => {
            error!(error = %e, "smtp transport setup failed, activation emails disabled");
            return;
        }
    };

    while let Some(job) = rx.recv().await {
        let to = job.to.clone();
        match send_activation(&transport, &config, job).await {
            Ok(()) => debug!(%to, "activation email sent"),
            Err(e) => error!(error = %e, %to, "activation email failed"),
        }
    }
}

fn build_transport(config: &EmailConfig) -> anyhow::Result<AsyncSmtpTransport<Tokio1Executor>> {
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        .port(config.port)
        .credentials(Credentials::new(
            config.addr.clone(),
            config.password.clone(),
        ))
        .build();
    Ok(transport)
}

async fn send_activation(
    transport: &AsyncSmtpTransport<Tokio1Executor>,
    config: &EmailConfig,
    job: ActivationEmail,
) -> anyhow::Result<()> {
    let message = Message::builder()
        .from(config.addr.parse::<Mailbox>()?)
        .to(job.to.parse::<Mailbox>()?)
        .subject(ACTIVATION_SUBJECT)
        .header(ContentType::TEXT_HTML)
        .body(render_activation(&job.username, &job.code))?;
    transport.send(message).await?;
    Ok(())
}

fn render_activation(username: &str, code: &str) -> String {
    ACTIVATION_TEMPLATE
        .replace("{{name}}", username)
        .replace("{{code}}", code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_interpolates_name_and_code() {
        let body = render_activation("anna", "1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed");
        assert!(body.contains("anna"));
        assert!(body.contains("1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed"));
        assert!(!body.contains("{{name}}"));
        assert!(!body.contains("{{code}}"));
    }

    #[tokio::test]
    async fn disconnected_mailer_drops_jobs_quietly() {
        let mailer = Mailer::disconnected();
        // Receiver is gone; queueing must neither block nor panic.
        mailer.queue_activation(ActivationEmail {
            to: "a@b.com".into(),
            username: "a".into(),
            code: "code".into(),
        });
    }
}
