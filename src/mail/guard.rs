use crate::smtp::{Address, SmtpSession};

/// A policy decision about an envelope address.
///
/// Rejections carry the wire code and message verbatim, the engine does not
/// second-guess them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailVerdict {
    Accepted,
    Rejected { code: u16, message: String },
}

impl MailVerdict {
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        MailVerdict::Rejected {
            code,
            message: message.into(),
        }
    }
}

/// Decides whether to accept the sender and each recipient of an envelope.
#[async_trait::async_trait]
pub trait MailGuard: Send + Sync {
    async fn start_mail(&self, mail: &Address, session: &SmtpSession) -> MailVerdict;
    async fn add_recipient(&self, rcpt: &Address, session: &SmtpSession) -> MailVerdict;
}

/// Observes session lifecycle. Handy for connection logging or metrics.
#[async_trait::async_trait]
pub trait SessionHook: Send + Sync {
    async fn on_connect(&self, _session: &mut SmtpSession) {}
    async fn on_close(&self, _session: &SmtpSession) {}
}

/// Default guard accepting any sender and recipient.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait::async_trait]
impl MailGuard for AcceptAll {
    async fn start_mail(&self, _mail: &Address, _session: &SmtpSession) -> MailVerdict {
        MailVerdict::Accepted
    }
    async fn add_recipient(&self, _rcpt: &Address, _session: &SmtpSession) -> MailVerdict {
        MailVerdict::Accepted
    }
}

#[async_trait::async_trait]
impl SessionHook for AcceptAll {}
