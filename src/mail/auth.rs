use crate::common::*;
use crate::smtp::SmtpSession;
use serde::Serialize;

/// SASL mechanisms the server can negotiate.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum Mechanism {
    /// RFC 4616: https://tools.ietf.org/html/rfc4616
    Plain,
    /// Obsolete but needed for some clients (like office365)
    /// https://www.ietf.org/archive/id/draft-murchison-sasl-login-00.txt
    Login,
    /// Non-standard XOAUTH2 mechanism
    /// https://developers.google.com/gmail/imap/xoauth2-protocol
    Xoauth2,
}

impl Mechanism {
    pub fn from_word(word: &str) -> Option<Mechanism> {
        match word.to_ascii_uppercase().as_str() {
            "PLAIN" => Some(Mechanism::Plain),
            "LOGIN" => Some(Mechanism::Login),
            "XOAUTH2" => Some(Mechanism::Xoauth2),
            _ => None,
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mechanism::Plain => "PLAIN",
            Mechanism::Login => "LOGIN",
            Mechanism::Xoauth2 => "XOAUTH2",
        })
    }
}

/// What the client presented, already decoded from the wire exchange.
///
/// For PLAIN and LOGIN the secret is the password, for XOAUTH2 it is the
/// bearer token.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Credentials {
    pub mechanism: Mechanism,
    pub username: String,
    pub secret: String,
}

/// The XOAUTH2 error document sent to the client as a base64 `334` line
/// before the final 535, e.g. telling it where to fetch a fresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BearerChallenge {
    pub status: String,
    pub schemes: String,
    pub scope: String,
}

/// The consumer's decision about presented credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthVerdict {
    /// 235, the session continues as this user
    Granted(String),
    /// 535 with an optional message; XOAUTH2 may carry one challenge round
    Denied {
        message: Option<String>,
        challenge: Option<BearerChallenge>,
    },
}

impl AuthVerdict {
    pub fn denied() -> Self {
        AuthVerdict::Denied {
            message: None,
            challenge: None,
        }
    }
}

/// Validates credentials against whatever user database the consumer has.
///
/// Returning `Err` means the authenticator itself broke - the session is
/// terminated with 421. Rejected credentials are a regular `Denied` verdict.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        credentials: &Credentials,
        session: &SmtpSession,
    ) -> Result<AuthVerdict>;
}
