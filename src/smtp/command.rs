use crate::smtp::Address;

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SmtpCommand {
    Helo(SmtpHelo),
    Mail(Address),
    Rcpt(Address),
    Data,
    Rset,
    Noop(Vec<String>),
    Quit,
    Vrfy(String),
    Help(Vec<String>),
    StartTls,
    Auth {
        /// The SASL mechanism word, uppercased but not yet validated
        mechanism: String,
        /// Initial response of the client, still base64 encoded
        initial: Option<String>,
    },
    /// Anything else. First string is the command verb, next the parameters.
    Other(String, Vec<String>),
}

impl SmtpCommand {
    pub fn verb(&self) -> &str {
        use SmtpCommand as C;
        match self {
            C::Helo(helo) => helo.verb.as_ref(),
            C::Mail(_) => "MAIL",
            C::Rcpt(_) => "RCPT",
            C::Data => "DATA",
            C::Rset => "RSET",
            C::Noop(_) => "NOOP",
            C::Quit => "QUIT",
            C::Vrfy(_) => "VRFY",
            C::Help(_) => "HELP",
            C::StartTls => "STARTTLS",
            C::Auth { .. } => "AUTH",
            C::Other(verb, _) => verb.as_str(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SmtpHelo {
    /// EHLO or HELO as the client spelled it, uppercased
    pub verb: String,
    /// The name the client announced for itself
    pub host: String,
}

impl SmtpHelo {
    pub fn is_extended(&self) -> bool {
        self.verb == "EHLO"
    }
}
