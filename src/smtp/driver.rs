use crate::common::{Pin, Result};
use crate::io::tls::MayBeTls;
use crate::mail::{DispatchError, MailService};
use crate::smtp::{
    apply_auth_continuation, apply_command, apply_unknown, DataCodec, DriverControl, SessionMode,
    SmtpParser, SmtpReply, SmtpSession,
};
use async_std::future::timeout;
use bytes::{Buf, BytesMut};
use futures_util::io::{AsyncReadExt, AsyncWriteExt};
use smol_timeout::TimeoutExt;
use std::io::ErrorKind;
use std::time::Duration;

/// Command line limit of RFC 5321, CRLF included.
const MAX_COMMAND_LINE: usize = 512;
/// SASL continuations carry tokens well beyond the command line limit.
const MAX_AUTH_LINE: usize = 8 * 1024;

/// Moves bytes between the transport and the session state machine.
///
/// The driver owns the inbound buffer and the DATA codec. One `drive()` call
/// runs the whole conversation: it flushes queued responses, reads input
/// according to the session mode (commands, SASL continuation or payload)
/// and applies the per-command actions until the session shuts down or the
/// peer goes away.
pub struct SmtpDriver<IO> {
    io: IO,
    buffer: BytesMut,
    parser: SmtpParser,
    codec: DataCodec,
    read_timeout: Duration,
}

enum LineEvent {
    Line(Vec<u8>),
    TooLong,
    Closed,
    TimedOut,
}

enum ReadEvent {
    Data,
    Closed,
    TimedOut,
}

impl<IO> SmtpDriver<IO>
where
    IO: MayBeTls,
{
    pub fn new(io: IO, read_timeout: Duration) -> Self {
        SmtpDriver {
            io,
            buffer: BytesMut::new(),
            parser: SmtpParser::new(),
            codec: DataCodec::new(),
            read_timeout,
        }
    }

    /// Kick off the TLS handshake right away (implicit TLS on accept).
    pub fn encrypt(&mut self) -> std::io::Result<()> {
        Pin::new(&mut self.io).encrypt()
    }

    pub fn can_encrypt(&self) -> bool {
        self.io.can_encrypt()
    }

    /// Watch the wire briefly before the banner goes out. A client talking
    /// already is not speaking SMTP. Returns true when bytes showed up.
    pub async fn check_early_talker(&mut self, delay: Duration) -> Result<bool> {
        let mut chunk = [0u8; 512];
        match self.io.read(&mut chunk).timeout(delay).await {
            None => Ok(false),
            Some(Ok(0)) => {
                // the client gave up and left before the banner
                Ok(false)
            }
            Some(Ok(len)) => {
                self.buffer.extend_from_slice(&chunk[..len]);
                Ok(true)
            }
            Some(Err(e)) => Err(format!("early talker check failed: {}", e).into()),
        }
    }

    /// Runs the conversation until shutdown, peer close or transport error.
    pub async fn drive(
        &mut self,
        service: &MailService,
        session: &mut SmtpSession,
        draining: impl Fn() -> bool,
    ) -> Result<()> {
        loop {
            // write out everything the state machine queued up
            while let Some(control) = session.pop_control() {
                trace!("{}: processing driver control {:?}", session.id(), control);
                match control {
                    DriverControl::Response(bytes) => {
                        if let Err(e) = self.io.write_all(bytes.as_ref()).await {
                            return Err(format!("write failed: {}", e).into());
                        }
                    }
                    DriverControl::StartTls => {
                        self.io.flush().await?;
                        self.encrypt()?;
                        // plaintext pipelined past STARTTLS must not leak into
                        // the encrypted session
                        self.buffer.clear();
                        session.reset_tls();
                    }
                    DriverControl::Shutdown => {
                        let _ = self.io.flush().await;
                        let _ = self.io.close().await;
                        return Ok(());
                    }
                }
            }
            self.io.flush().await?;

            match session.mode.clone() {
                Some(SessionMode::Data) => self.pump_data(session).await?,
                Some(_) => match self.next_line(MAX_AUTH_LINE).await? {
                    LineEvent::Line(line) => {
                        let line = String::from_utf8_lossy(line.as_slice()).to_string();
                        apply_auth_continuation(service, session, &line).await;
                    }
                    LineEvent::TooLong => {
                        session.mode = None;
                        session.say_reply(SmtpReply::LineTooLongFailure);
                    }
                    LineEvent::Closed => return Ok(()),
                    LineEvent::TimedOut => session.say_shutdown_timeout(),
                },
                None => match self.next_line(MAX_COMMAND_LINE).await? {
                    LineEvent::Line(line) => {
                        self.apply_line(service, session, line, &draining).await
                    }
                    LineEvent::TooLong => session.say_reply(SmtpReply::LineTooLongFailure),
                    LineEvent::Closed => {
                        debug!("{}: client went silent, done", session.id());
                        return Ok(());
                    }
                    LineEvent::TimedOut => session.say_shutdown_timeout(),
                },
            }
        }
    }

    async fn apply_line(
        &mut self,
        service: &MailService,
        session: &mut SmtpSession,
        line: Vec<u8>,
        draining: &impl Fn() -> bool,
    ) {
        let line = String::from_utf8_lossy(line.as_slice()).to_string();
        trace!("{}: C: {}", session.id(), line.trim_end());

        let verb = SmtpParser::verb(&line);

        // a client saying goodbye still gets its 221 while draining
        if draining() && verb != "QUIT" {
            session.say_shutdown_service_err("Server shutting down".to_owned());
            return;
        }
        if session.commands == 0 && SmtpParser::is_http_verb(&verb) {
            warn!("{}: HTTP {} on the submission port", session.id(), verb);
            session.say_shutdown(SmtpReply::TransactionFailure("Go ahead".to_owned()));
            return;
        }
        session.commands += 1;

        if service.authenticator().is_some() && session.user.is_none() {
            session.unauthenticated_commands += 1;
            if session.unauthenticated_commands > service.config().max_unauthenticated_commands {
                warn!("{}: too many unauthenticated commands", session.id());
                session.say_shutdown_service_err("Too many unauthenticated commands".to_owned());
                return;
            }
        }

        if service.config().disabled_commands.contains(&verb) {
            apply_unknown(service, session, &verb);
            return;
        }

        match self.parser.parse_command(&line) {
            Ok(cmd) => apply_command(service, session, cmd).await,
            Err(e) => {
                debug!("{}: {}", session.id(), e);
                session.say_invalid_arguments();
            }
        }
    }

    /// Streams the DATA payload into the consumer sink until the terminator.
    ///
    /// A sink bailing out early does not interrupt the wire protocol: the
    /// outcome is remembered, the rest of the payload is drained and
    /// discarded, and the reply goes out when the terminating dot arrives.
    async fn pump_data(&mut self, session: &mut SmtpSession) -> Result<()> {
        let mut sink = session.envelope.sink.take();
        let mailid = session.envelope.id.clone();
        let mut early: Option<std::result::Result<(), DispatchError>> = None;
        let mut out = Vec::with_capacity(4096);
        self.codec.reset();

        loop {
            if self.buffer.is_empty() {
                match self.read_more().await? {
                    ReadEvent::Data => {}
                    ReadEvent::Closed => {
                        // transport gone mid-payload, close without a reply
                        warn!("{}: connection lost during mail data", session.id());
                        session.reset();
                        session.say(DriverControl::Shutdown);
                        return Ok(());
                    }
                    ReadEvent::TimedOut => {
                        session.say_shutdown_timeout();
                        return Ok(());
                    }
                }
            }

            out.clear();
            let consumed = self.codec.feed(self.buffer.as_ref(), &mut out);
            self.buffer.advance(consumed);

            if !out.is_empty() && early.is_none() {
                if let Some(open) = sink.as_mut() {
                    if let Err(e) = open.write_all(out.as_slice()).await {
                        early = Some(sink_outcome(e));
                        sink = None;
                    }
                }
            }

            if self.codec.is_done() {
                let outcome = match early {
                    Some(outcome) => outcome,
                    None => match sink {
                        Some(mut open) => match open.close().await {
                            Ok(()) => Ok(()),
                            Err(e) => sink_outcome(e),
                        },
                        None => Err(DispatchError::default()),
                    },
                };
                session.reset();
                match outcome {
                    Ok(()) => {
                        info!("{}: message {} queued", session.id(), mailid);
                        session.say_mail_queued(&mailid);
                    }
                    Err(e) => {
                        warn!("{}: message {} refused: {}", session.id(), mailid, e);
                        session.say_reply(SmtpReply::Custom(e.code, e.message));
                    }
                }
                return Ok(());
            }
        }
    }

    /// The next LF-terminated line within `cap` octets. Overlong input is
    /// discarded through the next LF so the conversation can resume.
    async fn next_line(&mut self, cap: usize) -> Result<LineEvent> {
        loop {
            if let Some(pos) = find_lf(self.buffer.as_ref()) {
                let line = self.buffer.split_to(pos + 1);
                if line.len() > cap {
                    return Ok(LineEvent::TooLong);
                }
                return Ok(LineEvent::Line(line.to_vec()));
            }
            if self.buffer.len() > cap {
                return self.discard_until_lf().await;
            }
            match self.read_more().await? {
                ReadEvent::Data => continue,
                ReadEvent::Closed => return Ok(LineEvent::Closed),
                ReadEvent::TimedOut => return Ok(LineEvent::TimedOut),
            }
        }
    }

    async fn discard_until_lf(&mut self) -> Result<LineEvent> {
        loop {
            if let Some(pos) = find_lf(self.buffer.as_ref()) {
                self.buffer.advance(pos + 1);
                return Ok(LineEvent::TooLong);
            }
            self.buffer.clear();
            match self.read_more().await? {
                ReadEvent::Data => continue,
                ReadEvent::Closed => return Ok(LineEvent::Closed),
                ReadEvent::TimedOut => return Ok(LineEvent::TimedOut),
            }
        }
    }

    async fn read_more(&mut self) -> Result<ReadEvent> {
        let mut chunk = [0u8; 4096];
        match timeout(self.read_timeout, self.io.read(&mut chunk)).await {
            Err(_elapsed) => Ok(ReadEvent::TimedOut),
            Ok(Ok(0)) => Ok(ReadEvent::Closed),
            Ok(Ok(len)) => {
                self.buffer.extend_from_slice(&chunk[..len]);
                Ok(ReadEvent::Data)
            }
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionReset => Ok(ReadEvent::Closed),
            Ok(Err(e)) => Err(format!("read failed: {}", e).into()),
        }
    }
}

/// Early sink completion: `NotConnected` means "seen enough, all good",
/// anything else fails the message with the consumer's code if one rode
/// along on the error.
fn sink_outcome(e: std::io::Error) -> std::result::Result<(), DispatchError> {
    if e.kind() == ErrorKind::NotConnected {
        Ok(())
    } else {
        Err(DispatchError::from_io_error(&e).unwrap_or_default())
    }
}

fn find_lf(haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|b| *b == b'\n')
}
