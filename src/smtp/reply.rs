/* Codes are arranged according to rfc5321 + rfc4954:

   2yz  positive completion, 3yz  positive intermediate,
   4yz  transient negative, 5yz  permanent negative.

   The variant suffix tells the class apart in english:
   2xx => ...Info, 3xx => ...Challenge, 4xx => ...Error, 5xx => ...Failure
*/

use crate::common::*;

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SmtpReply {
    /// Reply with a consumer-supplied code, e.g. a policy verdict from a callback
    Custom(u16, String),

    /// 214 help text
    HelpInfo(String),
    /// 220 <domain> Service ready
    ServiceReadyInfo(String),
    /// 220 Ready to start TLS
    ReadyToStartTlsInfo,
    /// 221 <domain> Service closing transmission channel
    ClosingConnectionInfo(String),
    /// 235 Authentication successful
    AuthenticationSucceededInfo,
    /// 250 Ok
    OkInfo,
    /// 250 <message>
    OkMessageInfo(String),
    /// 250 first line greets the peer, extension items follow
    OkHeloInfo {
        local: String,
        remote: String,
        extensions: Vec<String>,
    },
    /// 252 but will accept message and attempt delivery
    CannotVerifyUserInfo,

    /// 334 <base64 challenge>
    AuthChallenge(String),
    /// 354 end with <CRLF>.<CRLF>
    StartMailInputChallenge,

    /// 421 <message>, the session is being shut down
    ServiceNotAvailableError(String),
    /// 450 mailbox busy or temporarily blocked for policy reasons
    MailboxNotAvailableError,
    /// 451 requested action aborted
    ProcessingError,
    /// 452 too many recipients in this transaction
    TooManyRecipientsError,

    /// 500 syntax error, command unrecognized
    CommandSyntaxFailure,
    /// 500 command line longer than the 512 octet limit
    LineTooLongFailure,
    /// 501 syntax error in parameters or arguments
    ParameterSyntaxFailure,
    /// 501 credentials could not be decoded
    AuthCredentialsMalformedFailure,
    /// 501 the client cancelled the authentication exchange
    AuthAbortedFailure,
    /// 502 command not implemented
    CommandNotImplementedFailure,
    /// 503 bad sequence of commands
    CommandSequenceFailure,
    /// 504 unrecognized authentication type
    UnknownAuthMechanismFailure,
    /// 535 authentication credentials invalid
    AuthenticationFailedFailure(Option<String>),
    /// 550 mailbox unavailable or rejected for policy reasons
    MailboxNotAvailableFailure,
    /// 552 message exceeds fixed maximum message size
    StorageFailure,
    /// 554 transaction failed / no service here
    TransactionFailure(String),
}

impl SmtpReply {
    pub fn code(&self) -> u16 {
        use SmtpReply as R;
        match self {
            R::Custom(code, _) => *code,
            R::HelpInfo(_) => 214,
            R::ServiceReadyInfo(_) | R::ReadyToStartTlsInfo => 220,
            R::ClosingConnectionInfo(_) => 221,
            R::AuthenticationSucceededInfo => 235,
            R::OkInfo | R::OkMessageInfo(_) | R::OkHeloInfo { .. } => 250,
            R::CannotVerifyUserInfo => 252,
            R::AuthChallenge(_) => 334,
            R::StartMailInputChallenge => 354,
            R::ServiceNotAvailableError(_) => 421,
            R::MailboxNotAvailableError => 450,
            R::ProcessingError => 451,
            R::TooManyRecipientsError => 452,
            R::CommandSyntaxFailure | R::LineTooLongFailure => 500,
            R::ParameterSyntaxFailure
            | R::AuthCredentialsMalformedFailure
            | R::AuthAbortedFailure => 501,
            R::CommandNotImplementedFailure => 502,
            R::CommandSequenceFailure => 503,
            R::UnknownAuthMechanismFailure => 504,
            R::AuthenticationFailedFailure(_) => 535,
            R::MailboxNotAvailableFailure => 550,
            R::StorageFailure => 552,
            R::TransactionFailure(_) => 554,
        }
    }

    /// Text of the first (possibly only) reply line, without code or CRLF.
    pub fn text(&self) -> String {
        use SmtpReply as R;
        match self {
            R::Custom(_, text) => text.clone(),
            R::HelpInfo(text) => text.clone(),
            R::ServiceReadyInfo(name) => format!("{} ESMTP service ready", name),
            R::ReadyToStartTlsInfo => "Ready to start TLS".to_owned(),
            R::ClosingConnectionInfo(name) => format!("{} Bye", name),
            R::AuthenticationSucceededInfo => "Authentication successful".to_owned(),
            R::OkInfo => "Ok".to_owned(),
            R::OkMessageInfo(text) => text.clone(),
            R::OkHeloInfo { local, remote, .. } => format!("{} greets {}", local, remote),
            R::CannotVerifyUserInfo => {
                "Cannot VRFY user, but will accept message and attempt delivery".to_owned()
            }
            R::AuthChallenge(challenge) => challenge.clone(),
            R::StartMailInputChallenge => "End data with <CR><LF>.<CR><LF>".to_owned(),
            R::ServiceNotAvailableError(text) => text.clone(),
            R::MailboxNotAvailableError => "Requested mail action not taken".to_owned(),
            R::ProcessingError => "Requested action aborted, error in processing".to_owned(),
            R::TooManyRecipientsError => "Too many recipients".to_owned(),
            R::CommandSyntaxFailure => "Syntax error, command unrecognized".to_owned(),
            R::LineTooLongFailure => "Line too long".to_owned(),
            R::ParameterSyntaxFailure => "Syntax error in parameters or arguments".to_owned(),
            R::AuthCredentialsMalformedFailure => "Authentication failed".to_owned(),
            R::AuthAbortedFailure => "Authentication aborted".to_owned(),
            R::CommandNotImplementedFailure => "Command not implemented".to_owned(),
            R::CommandSequenceFailure => "Bad sequence of commands".to_owned(),
            R::UnknownAuthMechanismFailure => "Unrecognized authentication type".to_owned(),
            R::AuthenticationFailedFailure(message) => message
                .clone()
                .unwrap_or_else(|| "Authentication credentials invalid".to_owned()),
            R::MailboxNotAvailableFailure => "Mailbox not available".to_owned(),
            R::StorageFailure => "Message exceeds fixed maximum message size".to_owned(),
            R::TransactionFailure(text) => text.clone(),
        }
    }

    /// Continuation lines following the first one, sharing the reply code.
    pub fn items(&self) -> Vec<String> {
        match self {
            SmtpReply::OkHeloInfo { extensions, .. } => extensions.clone(),
            _ => vec![],
        }
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code();
        let items = self.items();
        if items.is_empty() {
            write!(f, "{} {}\r\n", code, self.text())
        } else {
            write!(f, "{}-{}\r\n", code, self.text())?;
            for (i, item) in items.iter().enumerate() {
                if i + 1 == items.len() {
                    write!(f, "{} {}\r\n", code, item)?;
                } else {
                    write!(f, "{}-{}\r\n", code, item)?;
                }
            }
            Ok(())
        }
    }
}
