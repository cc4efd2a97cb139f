use super::{authenticate, decode_utf8, say_malformed_credentials};
use crate::mail::{Credentials, MailService, Mechanism};
use crate::smtp::{SessionMode, SmtpSession};

/// base64 of "Username:"
pub const USERNAME_CHALLENGE: &str = "VXNlcm5hbWU6";
/// base64 of "Password:"
pub const PASSWORD_CHALLENGE: &str = "UGFzc3dvcmQ6";

/// The username arrived, ask for the password.
pub fn respond_username(session: &mut SmtpSession, b64: &str) {
    match decode_utf8(b64) {
        Some(username) => session.say_auth_challenge(
            PASSWORD_CHALLENGE.to_owned(),
            SessionMode::AuthLoginPass { username },
        ),
        None => say_malformed_credentials(session),
    }
}

/// The password closes the exchange.
pub async fn respond_password(
    service: &MailService,
    session: &mut SmtpSession,
    username: String,
    b64: &str,
) {
    match decode_utf8(b64) {
        Some(secret) => {
            authenticate(
                service,
                session,
                Credentials {
                    mechanism: Mechanism::Login,
                    username,
                    secret,
                },
            )
            .await
        }
        None => say_malformed_credentials(session),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{apply_auth, apply_auth_continuation};
    use super::*;
    use crate::smtp::rfc5321::testing::{expect_code, greeted_session};
    use base64::prelude::*;

    #[test]
    fn login_walks_username_then_password() {
        async_std::task::block_on(async move {
            let service = auth_service();
            let mut session = greeted_session();
            apply_auth(&service, &mut session, "LOGIN", None).await;
            expect_code(&mut session, b"334 VXNlcm5hbWU6");
            apply_auth_continuation(&service, &mut session, &BASE64_STANDARD.encode("kaja")).await;
            expect_code(&mut session, b"334 UGFzc3dvcmQ6");
            assert_eq!(
                session.mode,
                Some(SessionMode::AuthLoginPass {
                    username: "kaja".to_owned()
                })
            );
            apply_auth_continuation(&service, &mut session, &BASE64_STANDARD.encode("sesame"))
                .await;
            expect_code(&mut session, b"235 ");
            assert_eq!(session.user.as_deref(), Some("kaja"));
        })
    }

    #[test]
    fn login_accepts_the_username_inline() {
        async_std::task::block_on(async move {
            let service = auth_service();
            let mut session = greeted_session();
            apply_auth(
                &service,
                &mut session,
                "LOGIN",
                Some(BASE64_STANDARD.encode("kaja")),
            )
            .await;
            expect_code(&mut session, b"334 UGFzc3dvcmQ6");
        })
    }

    #[test]
    fn undecodable_username_fails_early() {
        async_std::task::block_on(async move {
            let service = auth_service();
            let mut session = greeted_session();
            apply_auth(&service, &mut session, "LOGIN", None).await;
            expect_code(&mut session, b"334 ");
            apply_auth_continuation(&service, &mut session, "???").await;
            expect_code(&mut session, b"501 ");
            assert!(session.is_command_mode());
        })
    }

    #[test]
    fn wrong_login_password_is_denied() {
        async_std::task::block_on(async move {
            let service = auth_service();
            let mut session = greeted_session();
            apply_auth(&service, &mut session, "LOGIN", None).await;
            expect_code(&mut session, b"334 ");
            apply_auth_continuation(&service, &mut session, &BASE64_STANDARD.encode("kaja")).await;
            expect_code(&mut session, b"334 ");
            apply_auth_continuation(&service, &mut session, &BASE64_STANDARD.encode("wrong"))
                .await;
            expect_code(&mut session, b"535 ");
            assert!(session.user.is_none());
        })
    }
}
