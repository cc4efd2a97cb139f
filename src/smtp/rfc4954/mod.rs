//! AUTH - RFC 4954 - SMTP Service Extension for Authentication.
//!
//! PLAIN and XOAUTH2 take their credentials inline or in one continuation,
//! LOGIN runs a two-step username/password exchange. The decoded credentials
//! go to the consumer's [`Authenticator`]; its verdict decides the reply.

mod login;
mod plain;
mod xoauth2;

use crate::mail::{AuthVerdict, Credentials, MailService, Mechanism};
use crate::smtp::{SessionMode, SmtpReply, SmtpSession};
use base64::prelude::*;

/// First reaction to the AUTH command itself.
pub async fn apply_auth(
    service: &MailService,
    session: &mut SmtpSession,
    mechanism: &str,
    initial: Option<String>,
) {
    if service.authenticator().is_none() {
        session.say_reply(SmtpReply::CommandNotImplementedFailure);
        return;
    }
    if session.peer_name.is_none() || session.user.is_some() || session.envelope.mail.is_some() {
        session.say_command_sequence_fail();
        return;
    }
    if !session.secure && !service.config().allow_insecure_auth {
        session.say_command_sequence_fail();
        return;
    }
    let mechanism = match Mechanism::from_word(mechanism) {
        Some(m) if service.config().auth_mechanisms.contains(&m) => m,
        _ => {
            session.say_reply(SmtpReply::UnknownAuthMechanismFailure);
            return;
        }
    };

    match (mechanism, initial) {
        (Mechanism::Plain, Some(b64)) => plain::respond(service, session, &b64).await,
        (Mechanism::Plain, None) => {
            session.say_auth_challenge(String::new(), SessionMode::AuthPlain)
        }
        (Mechanism::Login, Some(b64)) => login::respond_username(session, &b64),
        (Mechanism::Login, None) => {
            session.say_auth_challenge(login::USERNAME_CHALLENGE.to_owned(), SessionMode::AuthLoginUser)
        }
        (Mechanism::Xoauth2, Some(b64)) => xoauth2::respond(service, session, &b64).await,
        (Mechanism::Xoauth2, None) => session.say_auth_challenge(
            String::new(),
            SessionMode::AuthXoauth2 { challenged: false },
        ),
    }
}

/// One client line while an AUTH exchange is in progress.
pub async fn apply_auth_continuation(
    service: &MailService,
    session: &mut SmtpSession,
    line: &str,
) {
    let mode = session.mode.take();
    let line = line.trim();

    // RFC 4954: a lone "*" cancels the exchange
    if line == "*" {
        session.say_reply(SmtpReply::AuthAbortedFailure);
        return;
    }

    match mode {
        Some(SessionMode::AuthPlain) => plain::respond(service, session, line).await,
        Some(SessionMode::AuthLoginUser) => login::respond_username(session, line),
        Some(SessionMode::AuthLoginPass { username }) => {
            login::respond_password(service, session, username, line).await
        }
        Some(SessionMode::AuthXoauth2 { challenged: false }) => {
            xoauth2::respond(service, session, line).await
        }
        // the client acknowledged the error document, now make it final
        Some(SessionMode::AuthXoauth2 { challenged: true }) => {
            session.say_reply(SmtpReply::AuthenticationFailedFailure(None))
        }
        other => {
            session.mode = other;
            session.say_command_sequence_fail()
        }
    }
}

/// Decodes a base64 continuation into text.
pub(crate) fn decode_utf8(b64: &str) -> Option<String> {
    let bytes = BASE64_STANDARD.decode(b64.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

pub(crate) fn say_malformed_credentials(session: &mut SmtpSession) {
    session.say_reply(SmtpReply::AuthCredentialsMalformedFailure);
}

/// Runs the consumer callback and translates the verdict to the wire.
pub(crate) async fn authenticate(
    service: &MailService,
    session: &mut SmtpSession,
    credentials: Credentials,
) {
    let authenticator = match service.authenticator() {
        Some(authenticator) => authenticator,
        None => {
            session.say_shutdown_processing_err("authenticator disappeared mid-session".to_owned());
            return;
        }
    };
    match authenticator.authenticate(&credentials, session).await {
        Ok(AuthVerdict::Granted(user)) => {
            info!("{}: authenticated as {}", session.id(), user);
            session.user = Some(user);
            session.say_reply(SmtpReply::AuthenticationSucceededInfo);
        }
        Ok(AuthVerdict::Denied { message, challenge }) => {
            if credentials.mechanism == Mechanism::Xoauth2 {
                if let Some(challenge) = challenge {
                    // one round of the structured error document, then 535
                    let doc = serde_json::to_string(&challenge).unwrap_or_default();
                    session.say_auth_challenge(
                        BASE64_STANDARD.encode(doc),
                        SessionMode::AuthXoauth2 { challenged: true },
                    );
                    return;
                }
            }
            warn!("{}: authentication denied", session.id());
            session.say_reply(SmtpReply::AuthenticationFailedFailure(message));
        }
        Err(e) => {
            error!("{}: authenticator failed: {}", session.id(), e);
            session.say_shutdown_processing_err(format!("authenticator failed: {}", e));
        }
    }
}
