use super::{authenticate, say_malformed_credentials};
use crate::mail::{Credentials, MailService, Mechanism};
use crate::smtp::SmtpSession;
use base64::prelude::*;

/// One base64 blob carrying `authzid NUL username NUL password`.
/// An empty authzid is the common case and permitted.
pub async fn respond(service: &MailService, session: &mut SmtpSession, b64: &str) {
    match decode(b64) {
        Some(credentials) => authenticate(service, session, credentials).await,
        None => say_malformed_credentials(session),
    }
}

fn decode(b64: &str) -> Option<Credentials> {
    let bytes = BASE64_STANDARD.decode(b64.trim()).ok()?;
    let mut parts = bytes.split(|b| *b == 0);
    let _authzid = parts.next()?;
    let username = String::from_utf8(parts.next()?.to_vec()).ok()?;
    let secret = String::from_utf8(parts.next()?.to_vec()).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Credentials {
        mechanism: Mechanism::Plain,
        username,
        secret,
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{apply_auth, apply_auth_continuation};
    use super::*;
    use crate::smtp::rfc5321::testing::{expect_code, greeted_session};
    use crate::smtp::SessionMode;

    fn b64(plain: &str) -> String {
        BASE64_STANDARD.encode(plain)
    }

    #[test]
    fn decodes_the_three_nul_parts() {
        let sut = decode(&b64("\u{0}kaja\u{0}sesame")).expect("decodes");
        assert_eq!(sut.username, "kaja");
        assert_eq!(sut.secret, "sesame");
    }

    #[test]
    fn authzid_may_be_present() {
        let sut = decode(&b64("admin\u{0}kaja\u{0}sesame")).expect("decodes");
        assert_eq!(sut.username, "kaja");
    }

    #[test]
    fn garbage_and_short_payloads_fail() {
        assert!(decode("!!!not-base64!!!").is_none());
        assert!(decode(&b64("onlyuser")).is_none());
        assert!(decode(&b64("a\u{0}b\u{0}c\u{0}d")).is_none());
    }

    #[test]
    fn inline_auth_plain_succeeds() {
        async_std::task::block_on(async move {
            let service = auth_service();
            let mut session = greeted_session();
            apply_auth(
                &service,
                &mut session,
                "PLAIN",
                Some(b64("\u{0}kaja\u{0}sesame")),
            )
            .await;
            expect_code(&mut session, b"235 ");
            assert_eq!(session.user.as_deref(), Some("kaja"));
        })
    }

    #[test]
    fn continuation_auth_plain_succeeds() {
        async_std::task::block_on(async move {
            let service = auth_service();
            let mut session = greeted_session();
            apply_auth(&service, &mut session, "PLAIN", None).await;
            expect_code(&mut session, b"334");
            assert_eq!(session.mode, Some(SessionMode::AuthPlain));
            apply_auth_continuation(&service, &mut session, &b64("\u{0}kaja\u{0}sesame")).await;
            expect_code(&mut session, b"235 ");
            assert_eq!(session.user.as_deref(), Some("kaja"));
        })
    }

    #[test]
    fn wrong_password_is_denied_with_the_consumer_message() {
        async_std::task::block_on(async move {
            let service = auth_service();
            let mut session = greeted_session();
            apply_auth(
                &service,
                &mut session,
                "PLAIN",
                Some(b64("\u{0}kaja\u{0}wrong")),
            )
            .await;
            expect_code(&mut session, b"535 Bad username or password");
            assert!(session.user.is_none());
        })
    }

    #[test]
    fn broken_base64_is_a_parameter_error() {
        async_std::task::block_on(async move {
            let service = auth_service();
            let mut session = greeted_session();
            apply_auth(&service, &mut session, "PLAIN", Some("!!!".to_owned())).await;
            expect_code(&mut session, b"501 ");
            assert!(session.is_command_mode());
        })
    }
}
