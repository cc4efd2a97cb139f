use super::{authenticate, decode_utf8, say_malformed_credentials};
use crate::mail::{Credentials, MailService, Mechanism};
use crate::smtp::SmtpSession;

/// One base64 blob of `user=<u>^Aauth=Bearer <token>^A^A`.
pub async fn respond(service: &MailService, session: &mut SmtpSession, b64: &str) {
    match decode(b64) {
        Some(credentials) => authenticate(service, session, credentials).await,
        None => say_malformed_credentials(session),
    }
}

fn decode(b64: &str) -> Option<Credentials> {
    let text = decode_utf8(b64)?;
    let mut username = None;
    let mut token = None;
    for field in text.split('\u{1}') {
        if let Some(user) = field.strip_prefix("user=") {
            username = Some(user.to_owned());
        } else if let Some(bearer) = field.strip_prefix("auth=Bearer ") {
            token = Some(bearer.to_owned());
        }
    }
    Some(Credentials {
        mechanism: Mechanism::Xoauth2,
        username: username?,
        secret: token?,
    })
}
