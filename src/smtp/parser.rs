use crate::smtp::{Address, SmtpCommand, SmtpHelo};
use regex::Regex;
use std::collections::HashMap;

/// Verbs of another protocol altogether. Seeing one of these first means a
/// web client ended up on the submission port.
const HTTP_VERBS: &[&str] = &[
    "GET", "POST", "HEAD", "PUT", "DELETE", "OPTIONS", "CONNECT", "TRACE", "PATCH",
];

#[derive(Debug)]
pub enum ParseError {
    /// The command verb was recognized but its arguments were not
    Syntax(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Syntax(what) => write!(f, "invalid command arguments: {}", what),
        }
    }
}
impl std::error::Error for ParseError {}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Turns a single command line (CRLF already stripped) into an [`SmtpCommand`].
///
/// The address command grammar is deliberately lenient about whitespace
/// around the colon - `MAIL FROM : <a@b>` is accepted the way the field
/// deployments expect, although RFC 5321 forbids the spaces.
#[derive(Debug, Clone)]
pub struct SmtpParser {
    address_command: Regex,
}

impl Default for SmtpParser {
    fn default() -> Self {
        SmtpParser {
            address_command: Regex::new(r"(?i)^(MAIL\s+FROM|RCPT\s+TO)\s*:\s*<([^>]*)>(\s+.*)?$")
                .expect("address command regex"),
        }
    }
}

impl SmtpParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_http_verb(verb: &str) -> bool {
        HTTP_VERBS.contains(&verb)
    }

    /// The leading alphabetic token, uppercased.
    pub fn verb(line: &str) -> String {
        line.chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase()
    }

    pub fn parse_command(&self, line: &str) -> ParseResult<SmtpCommand> {
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        let verb = Self::verb(line);
        let rest = line[verb.len()..].trim();

        use SmtpCommand as C;
        Ok(match verb.as_str() {
            "EHLO" | "HELO" => {
                if rest.is_empty() {
                    return Err(ParseError::Syntax("missing hostname".into()));
                }
                C::Helo(SmtpHelo {
                    verb,
                    host: rest.to_owned(),
                })
            }
            "MAIL" => C::Mail(self.parse_address_command("MAIL FROM", line)?),
            "RCPT" => C::Rcpt(self.parse_address_command("RCPT TO", line)?),
            "DATA" => C::Data,
            "RSET" => C::Rset,
            "QUIT" => C::Quit,
            "STARTTLS" => C::StartTls,
            "NOOP" => C::Noop(split_args(rest)),
            "HELP" => C::Help(split_args(rest)),
            "VRFY" => C::Vrfy(rest.to_owned()),
            "AUTH" => {
                let mut words = rest.split_whitespace();
                let mechanism = match words.next() {
                    Some(mechanism) => mechanism.to_ascii_uppercase(),
                    None => return Err(ParseError::Syntax("missing auth mechanism".into())),
                };
                C::Auth {
                    mechanism,
                    initial: words.next().map(str::to_owned),
                }
            }
            _ => C::Other(verb, split_args(rest)),
        })
    }

    /// The `MAIL FROM:<path> [params]` / `RCPT TO:<path> [params]` grammar.
    ///
    /// The angle-bracketed part may be empty (the null sender). The trailing
    /// region is split on whitespace into KEY=VALUE pairs with uppercased
    /// keys; a missing region is `params: None`, distinct from an empty map.
    fn parse_address_command(&self, expected_verb: &str, line: &str) -> ParseResult<Address> {
        let captures = self
            .address_command
            .captures(line)
            .ok_or_else(|| ParseError::Syntax(format!("not a valid {} command", expected_verb)))?;

        let verb = captures
            .get(1)
            .map(|m| {
                m.as_str()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_ascii_uppercase()
            })
            .unwrap_or_default();
        if verb != expected_verb {
            return Err(ParseError::Syntax(format!(
                "expected {}, got {}",
                expected_verb, verb
            )));
        }

        let address = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        let params = captures.get(3).map(|m| {
            let mut params = HashMap::new();
            for word in m.as_str().split_whitespace() {
                match word.split_once('=') {
                    Some((key, value)) => {
                        params.insert(key.to_ascii_uppercase(), value.to_owned())
                    }
                    None => params.insert(word.to_ascii_uppercase(), String::new()),
                };
            }
            params
        });

        Ok(Address {
            address: address.to_owned(),
            params,
        })
    }
}

fn split_args(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_owned).collect()
}
