use crate::io::ConnectionInfo;
use crate::smtp::{DriverControl, Envelope, ExtensionSet, SmtpReply};
use std::collections::VecDeque;

/// Sub-protocol the next input line belongs to.
///
/// `None` means plain command mode. `Data` hands the input over to the
/// payload codec, the `Auth*` modes treat lines as SASL continuations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Data,
    AuthPlain,
    AuthLoginUser,
    AuthLoginPass { username: String },
    AuthXoauth2 { challenged: bool },
}

/// Conversation state of one SMTP session.
///
/// Command legality is derived from the fields: `peer_name` tells whether a
/// greeting happened, `envelope.mail`/`envelope.rcpts` track the envelope
/// path, `mode` tracks DATA and AUTH sub-protocols.
#[derive(Debug, Default)]
pub struct SmtpSession {
    pub connection: ConnectionInfo,
    /// Name this server announces
    pub service_name: String,
    /// The name of the peer as introduced by the HELO/EHLO command
    pub peer_name: Option<String>,
    /// True after EHLO - the session speaks ESMTP
    pub extended: bool,
    /// True once the transport is encrypted
    pub secure: bool,
    /// The transport could still be upgraded with STARTTLS
    pub starttls_available: bool,
    /// Authenticated identity, set by a successful AUTH exchange
    pub user: Option<String>,
    /// Extensions advertised on the last EHLO
    pub extensions: ExtensionSet,
    pub envelope: Envelope,
    pub mode: Option<SessionMode>,
    /// Commands dispatched on this session so far
    pub commands: usize,
    pub unauthenticated_commands: usize,
    pub unrecognized_commands: usize,
    /// Output to be processed by the driver - responses and IO controls
    pub output: VecDeque<DriverControl>,
}

impl SmtpSession {
    pub fn new(connection: ConnectionInfo, service_name: impl Into<String>) -> Self {
        SmtpSession {
            connection,
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    /// Opaque session identifier, stable for the life of the connection.
    pub fn id(&self) -> &str {
        &self.connection.id
    }

    /// SMTP or ESMTP, depending on the greeting the client chose.
    pub fn transmission(&self) -> &'static str {
        if self.extended {
            "ESMTP"
        } else {
            "SMTP"
        }
    }

    pub fn is_command_mode(&self) -> bool {
        self.mode.is_none()
    }

    /// Drops the mail transaction in progress. HELO state stays.
    pub fn reset(&mut self) {
        self.envelope.reset();
        self.mode = None;
    }

    /// A fresh or re-issued greeting: new envelope, new peer name.
    pub fn reset_helo(&mut self, peer_name: String, extended: bool) {
        self.reset();
        self.peer_name = Some(peer_name);
        self.extended = extended;
    }

    /// Full wipe after the STARTTLS upgrade - the client must greet again.
    pub fn reset_tls(&mut self) {
        self.reset();
        self.peer_name = None;
        self.extended = false;
        self.extensions.clear();
        self.secure = true;
        self.starttls_available = false;
    }

    pub fn pop_control(&mut self) -> Option<DriverControl> {
        self.output.pop_front()
    }

    pub fn say(&mut self, what: DriverControl) {
        self.output.push_back(what);
    }
    pub fn say_reply(&mut self, reply: SmtpReply) {
        self.say(DriverControl::Response(reply.to_string().into_bytes()))
    }
    /// Reply "250 Ok"
    pub fn say_ok(&mut self) {
        self.say_reply(SmtpReply::OkInfo)
    }
    /// Reply "250 @info"
    pub fn say_ok_info(&mut self, info: String) {
        self.say_reply(SmtpReply::OkMessageInfo(info))
    }
    /// Reply "500 Syntax error"
    pub fn say_invalid_syntax(&mut self) {
        self.say_reply(SmtpReply::CommandSyntaxFailure)
    }
    /// Reply "501 Syntax error in parameters"
    pub fn say_invalid_arguments(&mut self) {
        self.say_reply(SmtpReply::ParameterSyntaxFailure)
    }
    /// Reply "503 Bad sequence of commands"
    pub fn say_command_sequence_fail(&mut self) {
        self.say_reply(SmtpReply::CommandSequenceFailure)
    }
    /// Reply "220 @name ESMTP service ready"
    pub fn say_service_ready(&mut self) {
        self.say_reply(SmtpReply::ServiceReadyInfo(self.service_name.clone()))
    }
    /// Greet after HELO, no extension lines
    pub fn say_helo(&mut self) {
        self.say_reply(SmtpReply::OkHeloInfo {
            local: self.service_name.clone(),
            remote: self
                .peer_name
                .clone()
                .unwrap_or_else(|| self.connection.peer_addr.clone()),
            extensions: vec![],
        })
    }
    /// Greet after EHLO with the currently advertised extensions
    pub fn say_ehlo(&mut self) {
        self.say_reply(SmtpReply::OkHeloInfo {
            local: self.service_name.clone(),
            remote: self
                .peer_name
                .clone()
                .unwrap_or_else(|| self.connection.peer_addr.clone()),
            extensions: self.extensions.iter().map(String::from).collect(),
        })
    }
    /// Reply and shut the session down
    pub fn say_shutdown(&mut self, reply: SmtpReply) {
        self.say_reply(reply);
        self.reset();
        self.say(DriverControl::Shutdown)
    }
    /// Reply "421 Timeout" and shut the session down
    pub fn say_shutdown_timeout(&mut self) {
        warn!("{}: idle timeout expired", self.id());
        self.say_shutdown(SmtpReply::ServiceNotAvailableError("Timeout".to_owned()))
    }
    /// Reply "421 @why" and shut the session down
    pub fn say_shutdown_service_err(&mut self, why: String) {
        self.say_shutdown(SmtpReply::ServiceNotAvailableError(why))
    }
    /// Internal failure: reply 421 and shut the session down
    pub fn say_shutdown_processing_err(&mut self, description: String) {
        error!("{}: processing error: {}", self.id(), description);
        self.say_shutdown(SmtpReply::ServiceNotAvailableError(
            "Internal server error".to_owned(),
        ))
    }
    /// Normal response to the QUIT command
    pub fn say_shutdown_ok(&mut self) {
        self.say_shutdown(SmtpReply::ClosingConnectionInfo(self.service_name.clone()))
    }
    /// Reply "354 ..." and switch the input to payload mode
    pub fn say_start_data_challenge(&mut self) {
        self.say_reply(SmtpReply::StartMailInputChallenge);
        self.mode = Some(SessionMode::Data);
    }
    /// Reply "220 Ready to start TLS" and order the transport swap
    pub fn say_start_tls(&mut self) {
        self.say_reply(SmtpReply::ReadyToStartTlsInfo);
        self.say(DriverControl::StartTls);
    }
    /// Reply "334 @challenge" and expect a SASL continuation
    pub fn say_auth_challenge(&mut self, challenge: String, mode: SessionMode) {
        self.say_reply(SmtpReply::AuthChallenge(challenge));
        self.mode = Some(mode);
    }
    pub fn say_mail_queued(&mut self, id: &str) {
        self.say_ok_info(format!("Ok: message queued as {}", id))
    }
}
