//! Mail Transports
//!
//! The seam between rendered mails and whatever delivers them.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::{DomainError, DomainResult};
use super::templates::TemplateKind;

/// A rendered mail ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub kind: TemplateKind,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> DomainResult<()>;
}

/// Logs mails instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &MailMessage) -> DomainResult<()> {
        tracing::info!(
            kind = message.kind.name(),
            to = %message.to,
            subject = %message.subject,
            "Mail (log transport)"
        );
        Ok(())
    }
}

/// Spools every mail as an HTML file for an external sender to pick up
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
}

impl OutboxTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(message: &MailMessage) -> String {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.6f");
        let mut hasher = blake3::Hasher::new();
        hasher.update(message.to.as_bytes());
        hasher.update(message.subject.as_bytes());
        hasher.update(message.html.as_bytes());
        hasher.update(&rand::random::<u64>().to_le_bytes());
        let hash = hasher.finalize().to_hex();
        format!("{}-{}-{}.html", stamp, message.kind.name(), &hash.as_str()[..8])
    }
}

#[async_trait]
impl MailTransport for OutboxTransport {
    async fn send(&self, message: &MailMessage) -> DomainResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::Mail(format!("outbox {}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(Self::file_name(message));
        let document = format!(
            "<!-- From: {} -->\n<!-- To: {} -->\n<!-- Subject: {} -->\n{}\n",
            message.from, message.to, message.subject, message.html
        );
        tokio::fs::write(&path, document)
            .await
            .map_err(|e| DomainError::Mail(format!("writing {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), to = %message.to, "Mail spooled");
        Ok(())
    }
}
