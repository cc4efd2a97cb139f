use std::fmt::{Display, Formatter, Result as FmtRes};

/// An EHLO keyword without parameters.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Flag {
    pub code: &'static str,
}

impl Display for Flag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtRes {
        f.write_str(self.code)
    }
}

pub const PIPELINING: Flag = Flag { code: "PIPELINING" };
pub const EIGHTBITMIME: Flag = Flag { code: "8BITMIME" };
pub const SMTPUTF8: Flag = Flag { code: "SMTPUTF8" };
pub const STARTTLS: Flag = Flag { code: "STARTTLS" };

/// The set of extensions a session currently advertises on EHLO.
///
/// Advertisement order is the insertion order, so the capability computation
/// decides what the client sees and in what order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ExtensionSet {
    entries: Vec<(String, String)>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }
    /// EHLO lines in advertisement order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, line)| line.as_str())
    }
    pub fn is_enabled(&self, flag: &Flag) -> bool {
        self.is_enabled_code(flag.code)
    }
    pub fn is_enabled_code(&self, code: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == code)
    }
    /// Returns true when the extension was newly enabled.
    pub fn enable(&mut self, flag: &Flag) -> bool {
        self.enable_line(flag.code, flag.code.to_owned())
    }
    /// Enable an extension whose EHLO line carries parameters,
    /// e.g. `SIZE 10240000` or `AUTH PLAIN LOGIN`.
    pub fn enable_with_param(&mut self, code: &str, param: &str) -> bool {
        self.enable_line(code, format!("{} {}", code, param))
    }
    /// Enable an operator-supplied EHLO line verbatim. The first word is the
    /// extension code.
    pub fn enable_custom(&mut self, line: &str) -> bool {
        match line.split_whitespace().next() {
            Some(code) => self.enable_line(&code.to_ascii_uppercase(), line.to_owned()),
            None => false,
        }
    }
    fn enable_line(&mut self, code: &str, line: String) -> bool {
        if self.is_enabled_code(code) {
            return false;
        }
        self.entries.push((code.to_owned(), line));
        true
    }
    /// Returns true when the extension had been enabled before.
    pub fn disable(&mut self, flag: &Flag) -> bool {
        self.disable_code(flag.code)
    }
    pub fn disable_code(&mut self, code: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(c, _)| c != code);
        before != self.entries.len()
    }
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
