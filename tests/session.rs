//! Scripted conversations through the session driver over an in-memory
//! stream: the client side is a canned byte script, every server reply is
//! captured through a channel.

use async_std::channel::{Sender, TrySendError};
use async_std::io::Cursor;
use base64::prelude::*;
use mailhatch::common::*;
use mailhatch::config::ServerConfig;
use mailhatch::io::tls::TlsCapable;
use mailhatch::io::{ConnectionInfo, Io};
use mailhatch::mail::{
    AuthVerdict, Authenticator, Builder, Credentials, DispatchError, MailDataSink, MailDispatch,
    MailService, Mechanism,
};
use mailhatch::smtp::{SmtpDriver, SmtpSession};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug)]
struct TestIo<R> {
    read: R,
    write: Sender<Vec<u8>>,
}

impl<R: Read + Unpin> Read for TestIo<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.read).poll_read(cx, buf)
    }
}

impl<R> Write for TestIo<R> {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.write.try_send(buf.to_vec()) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(TrySendError::Closed(_)) => {
                Poll::Ready(Err(io::Error::from(io::ErrorKind::NotConnected)))
            }
            Err(TrySendError::Full(_)) => Poll::Pending,
        }
    }
    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Runs the whole scripted conversation, returns the replies as one string.
fn converse(service: MailService, script: &str) -> String {
    converse_bytes(service, script.as_bytes().to_vec())
}

fn converse_bytes(service: MailService, script: Vec<u8>) -> String {
    async_std::task::block_on(async move {
        let (tx, rx) = async_std::channel::unbounded();
        let io: Box<dyn Io> = Box::new(TestIo {
            read: Cursor::new(script),
            write: tx,
        });
        let mut driver = SmtpDriver::new(TlsCapable::plaintext(io), Duration::from_secs(5));
        let mut session =
            SmtpSession::new(ConnectionInfo::default(), service.config().service_name.clone());
        session.say_service_ready();
        driver
            .drive(&service, &mut session, || false)
            .await
            .expect("conversation runs");
        drop(driver);
        let mut replies = String::new();
        while let Ok(bytes) = rx.try_recv() {
            replies.push_str(&String::from_utf8_lossy(&bytes));
        }
        replies
    })
}

fn plain_service() -> MailService {
    Builder::default()
        .config(ServerConfig::new("mx.example.org"))
        .build()
}

struct TestUsers;
#[async_trait::async_trait]
impl Authenticator for TestUsers {
    async fn authenticate(
        &self,
        credentials: &Credentials,
        _session: &SmtpSession,
    ) -> Result<AuthVerdict> {
        Ok(
            if credentials.username == "testuser" && credentials.secret == "testpass" {
                AuthVerdict::Granted(credentials.username.clone())
            } else {
                AuthVerdict::denied()
            },
        )
    }
}

fn auth_service() -> MailService {
    Builder::default()
        .config(
            ServerConfig::new("mx.example.org")
                .with_insecure_auth()
                .with_auth_mechanisms(vec![Mechanism::Plain, Mechanism::Login]),
        )
        .auth(TestUsers)
        .build()
}

#[test]
fn ehlo_advertises_and_quit_closes() {
    let replies = converse(plain_service(), "EHLO client.example.org\r\nQUIT\r\n");
    insta::assert_display_snapshot!(replies.replace("\r\n", "\n"), @r###"
    220 mx.example.org ESMTP service ready
    250-mx.example.org greets client.example.org
    250-PIPELINING
    250-8BITMIME
    250 SMTPUTF8
    221 mx.example.org Bye
    "###);
}

#[test]
fn helo_gets_a_single_line_greeting() {
    let replies = converse(plain_service(), "HELO client.example.org\r\nQUIT\r\n");
    insta::assert_display_snapshot!(replies.replace("\r\n", "\n"), @r###"
    220 mx.example.org ESMTP service ready
    250 mx.example.org greets client.example.org
    221 mx.example.org Bye
    "###);
}

#[test]
fn full_transaction_delivers_the_unstuffed_payload() {
    let collected = std::sync::Arc::new(Mutex::new(Vec::new()));

    struct Collect(std::sync::Arc<Mutex<Vec<u8>>>);
    struct CollectSink(std::sync::Arc<Mutex<Vec<u8>>>);
    #[async_trait::async_trait]
    impl MailDispatch for Collect {
        async fn open_mail_body(
            &self,
            _session: &SmtpSession,
        ) -> std::result::Result<Pin<Box<dyn MailDataSink>>, DispatchError> {
            Ok(Box::pin(CollectSink(self.0.clone())))
        }
    }
    impl Write for CollectSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.0.lock().expect("sink mutex").extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }
        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    let service = Builder::default()
        .config(ServerConfig::new("mx.example.org"))
        .dispatch(Collect(collected.clone()))
        .build();

    let replies = converse(
        service,
        concat!(
            "EHLO client.example.org\r\n",
            "MAIL FROM:<kaja@example.org>\r\n",
            "RCPT TO:<pepa@example.org>\r\n",
            "DATA\r\n",
            "Subject: Hi\r\n",
            "\r\n",
            "..starts with a dot\r\n",
            "regular line\r\n",
            ".\r\n",
            "QUIT\r\n"
        ),
    );

    let body = collected.lock().expect("collected mutex").clone();
    assert_eq!(
        String::from_utf8_lossy(&body),
        "Subject: Hi\r\n\r\n.starts with a dot\r\nregular line\r\n"
    );
    assert!(replies.contains("354 "), "got: {}", replies);
    assert!(replies.contains("250 Ok: message queued as "), "got: {}", replies);
    assert!(replies.ends_with("221 mx.example.org Bye\r\n"), "got: {}", replies);
}

#[test]
fn auth_plain_unlocks_mail() {
    let blob = BASE64_STANDARD.encode("\u{0}testuser\u{0}testpass");
    let script = format!(
        "EHLO client.example.org\r\nAUTH PLAIN {}\r\nMAIL FROM:<sender@example.com>\r\nQUIT\r\n",
        blob
    );
    let replies = converse(auth_service(), &script);
    assert!(replies.contains("235 Authentication successful"), "got: {}", replies);
    assert!(replies.contains("250 Ok\r\n"), "got: {}", replies);
}

#[test]
fn mail_without_auth_is_refused_when_auth_is_required() {
    let replies = converse(
        auth_service(),
        "EHLO client.example.org\r\nMAIL FROM:<kaja@example.org>\r\nQUIT\r\n",
    );
    assert!(replies.contains("530 Authentication required"), "got: {}", replies);
}

#[test]
fn auth_login_walks_the_challenges() {
    let script = format!(
        "EHLO c\r\nAUTH LOGIN\r\n{}\r\n{}\r\nQUIT\r\n",
        BASE64_STANDARD.encode("testuser"),
        BASE64_STANDARD.encode("testpass")
    );
    let replies = converse(auth_service(), &script);
    assert!(replies.contains("334 VXNlcm5hbWU6"), "got: {}", replies);
    assert!(replies.contains("334 UGFzc3dvcmQ6"), "got: {}", replies);
    assert!(replies.contains("235 "), "got: {}", replies);
}

#[test]
fn consumer_rejection_resets_the_session_for_another_try() {
    struct DenySink;
    struct Deny;
    #[async_trait::async_trait]
    impl MailDispatch for Deny {
        async fn open_mail_body(
            &self,
            _session: &SmtpSession,
        ) -> std::result::Result<Pin<Box<dyn MailDataSink>>, DispatchError> {
            Ok(Box::pin(DenySink))
        }
    }
    impl Write for DenySink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }
        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(
                DispatchError::new(450, "Message content denied").into_io_error()
            ))
        }
    }

    let service = Builder::default()
        .config(ServerConfig::new("mx.example.org"))
        .dispatch(Deny)
        .build();

    let replies = converse(
        service,
        concat!(
            "EHLO c\r\n",
            "MAIL FROM:<kaja@example.org>\r\n",
            "RCPT TO:<pepa@example.org>\r\n",
            "DATA\r\n",
            "deny this\r\n",
            ".\r\n",
            "MAIL FROM:<kaja@example.org>\r\n",
            "RCPT TO:<pepa@example.org>\r\n",
            "QUIT\r\n"
        ),
    );
    assert!(replies.contains("450 Message content denied"), "got: {}", replies);
    // the envelope was reset, a fresh transaction is welcome
    let after = replies.split("450 Message content denied\r\n").nth(1).expect("tail");
    assert!(after.starts_with("250 Ok\r\n250 Ok\r\n"), "got: {}", after);
}

#[test]
fn early_consumer_completion_drains_a_large_body() {
    struct OneLookSink {
        seen: bool,
    }
    struct OneLook;
    #[async_trait::async_trait]
    impl MailDispatch for OneLook {
        async fn open_mail_body(
            &self,
            _session: &SmtpSession,
        ) -> std::result::Result<Pin<Box<dyn MailDataSink>>, DispatchError> {
            Ok(Box::pin(OneLookSink { seen: false }))
        }
    }
    impl Write for OneLookSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.seen {
                // seen enough of this message
                Poll::Ready(Err(io::Error::from(io::ErrorKind::NotConnected)))
            } else {
                self.seen = true;
                Poll::Ready(Ok(buf.len()))
            }
        }
        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    let mut script = Vec::new();
    script.extend_from_slice(
        b"EHLO c\r\nMAIL FROM:<kaja@example.org>\r\nRCPT TO:<pepa@example.org>\r\nDATA\r\n",
    );
    // a megabyte of payload the consumer will not read
    for _ in 0..16_384 {
        script.extend_from_slice(b"all work and no mail makes a dull relay boy against all odds\r\n");
    }
    script.extend_from_slice(b".\r\nNOOP\r\nQUIT\r\n");

    let service = Builder::default()
        .config(ServerConfig::new("mx.example.org"))
        .dispatch(OneLook)
        .build();
    let replies = converse_bytes(service, script);
    assert!(replies.contains("250 Ok: message queued as "), "got: {}", replies);
    // the session stays usable after the drain
    assert!(replies.contains("250 Ok\r\n221 "), "got: {}", replies);
}

#[test]
fn command_over_512_octets_is_rejected() {
    let long_arg = "x".repeat(600);
    let script = format!("EHLO c\r\nNOOP {}\r\nNOOP\r\nQUIT\r\n", long_arg);
    let replies = converse(plain_service(), &script);
    assert!(replies.contains("500 Line too long"), "got: {}", replies);
    // the overlong line was discarded through its CRLF, the next one works
    assert!(replies.contains("250 Ok\r\n221 "), "got: {}", replies);
}

#[test]
fn the_line_limit_sits_between_512_and_513_octets() {
    // "NOOP " + padding + CRLF == 512 octets, just inside the limit
    let at_limit = format!("NOOP {}\r\n", "x".repeat(512 - 7));
    let over_limit = format!("NOOP {}\r\n", "x".repeat(513 - 7));
    let replies = converse(plain_service(), &format!("{}{}", at_limit, over_limit));
    let replies = replies.replace("\r\n", "\n");
    insta::assert_display_snapshot!(replies, @r###"
    220 mx.example.org ESMTP service ready
    250 Ok
    500 Line too long
    "###);
}

#[test]
fn http_request_gets_554_and_the_door() {
    let replies = converse(plain_service(), "GET / HTTP/1.0\r\nHost: x\r\n\r\n");
    insta::assert_display_snapshot!(replies.replace("\r\n", "\n"), @r###"
    220 mx.example.org ESMTP service ready
    554 Go ahead
    "###);
}

#[test]
fn unknown_commands_trip_the_cap() {
    let mut script = String::from("EHLO c\r\n");
    for _ in 0..11 {
        script.push_str("FROB\r\n");
    }
    let replies = converse(plain_service(), &script);
    assert_eq!(replies.matches("500 ").count(), 10, "got: {}", replies);
    assert!(
        replies.contains("421 Too many unrecognized commands"),
        "got: {}",
        replies
    );
}

#[test]
fn unauthenticated_chatter_trips_the_cap() {
    let mut script = String::from("EHLO c\r\n");
    for _ in 0..11 {
        script.push_str("NOOP\r\n");
    }
    let replies = converse(auth_service(), &script);
    assert!(
        replies.contains("421 Too many unauthenticated commands"),
        "got: {}",
        replies
    );
}

#[test]
fn rset_clears_a_half_built_envelope() {
    let replies = converse(
        plain_service(),
        concat!(
            "EHLO c\r\n",
            "MAIL FROM:<kaja@example.org>\r\n",
            "RSET\r\n",
            "DATA\r\n",
            "QUIT\r\n"
        ),
    );
    // DATA right after RSET is out of sequence again
    assert!(replies.contains("503 "), "got: {}", replies);
}

#[test]
fn smtputf8_addresses_pass_through() {
    let replies = converse(
        plain_service(),
        concat!(
            "EHLO c\r\n",
            "MAIL FROM:<odesílatel@example.org> SMTPUTF8\r\n",
            "RCPT TO:<příjemce@example.org>\r\n",
            "QUIT\r\n"
        ),
    );
    assert_eq!(replies.matches("250 Ok\r\n").count(), 2, "got: {}", replies);
}

#[test]
fn vrfy_and_help_answer_without_state_change() {
    let replies = converse(
        plain_service(),
        "EHLO c\r\nVRFY kaja\r\nHELP\r\nQUIT\r\n",
    );
    assert!(replies.contains("252 "), "got: {}", replies);
    assert!(replies.contains("214 "), "got: {}", replies);
}

#[test]
fn disabled_commands_answer_as_unknown() {
    let service = Builder::default()
        .config(ServerConfig::new("mx.example.org").with_disabled_command("VRFY"))
        .build();
    let replies = converse(service, "EHLO c\r\nVRFY kaja\r\nQUIT\r\n");
    assert!(replies.contains("500 "), "got: {}", replies);
    assert!(!replies.contains("252 "), "got: {}", replies);
}
