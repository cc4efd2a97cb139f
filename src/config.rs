use crate::mail::Mechanism;
use std::collections::HashSet;
use std::time::Duration;

/// Tunables of the listening server and the per-session protocol engine.
///
/// `ServerConfig::new("mx.example.org")` gives sane submission defaults;
/// the `with_*` methods adjust individual knobs.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name announced in the banner, EHLO reply and shutdown notices
    pub service_name: String,
    /// Perform the TLS handshake right on accept (implicit TLS, port 465 style)
    pub secure: bool,
    /// Leave STARTTLS out of the EHLO reply even when TLS is configured
    pub hide_starttls: bool,
    /// Verbs answered as if they were unknown
    pub disabled_commands: HashSet<String>,
    /// SASL mechanisms offered, in advertisement order
    pub auth_mechanisms: Vec<Mechanism>,
    /// Permit AUTH on a plaintext connection
    pub allow_insecure_auth: bool,
    /// Let MAIL proceed without authentication even when an authenticator is set
    pub auth_optional: bool,
    /// Concurrent session cap, 0 means unlimited
    pub max_clients: usize,
    /// Advertised and enforced SIZE limit in octets
    pub size: Option<usize>,
    /// Recipient cap per envelope
    pub max_recipients: usize,
    /// Commands tolerated before authentication succeeds
    pub max_unauthenticated_commands: usize,
    /// Unknown verbs tolerated before the session is dropped
    pub max_unrecognized_commands: usize,
    /// Idle cutoff; expiry answers 421 and closes
    pub socket_timeout: Duration,
    /// Bound on graceful shutdown draining
    pub close_timeout: Duration,
    /// How long to watch for an early talker before sending the banner
    pub early_talker_delay: Duration,
    /// Additional EHLO lines the operator wants advertised
    pub extra_capabilities: Vec<String>,
}

impl ServerConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        ServerConfig {
            service_name: service_name.into(),
            ..Self::default()
        }
    }
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
    pub fn with_hidden_starttls(mut self) -> Self {
        self.hide_starttls = true;
        self
    }
    pub fn with_disabled_command(mut self, verb: &str) -> Self {
        self.disabled_commands.insert(verb.to_ascii_uppercase());
        self
    }
    pub fn with_auth_mechanisms(mut self, mechanisms: Vec<Mechanism>) -> Self {
        self.auth_mechanisms = mechanisms;
        self
    }
    pub fn with_insecure_auth(mut self) -> Self {
        self.allow_insecure_auth = true;
        self
    }
    pub fn with_optional_auth(mut self) -> Self {
        self.auth_optional = true;
        self
    }
    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }
    pub fn with_size_limit(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
    pub fn with_max_recipients(mut self, max_recipients: usize) -> Self {
        self.max_recipients = max_recipients;
        self
    }
    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }
    pub fn with_early_talker_delay(mut self, delay: Duration) -> Self {
        self.early_talker_delay = delay;
        self
    }
    pub fn with_capability(mut self, line: &str) -> Self {
        self.extra_capabilities.push(line.to_owned());
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            service_name: "mailhatch".to_owned(),
            secure: false,
            hide_starttls: false,
            disabled_commands: HashSet::new(),
            auth_mechanisms: vec![Mechanism::Plain, Mechanism::Login],
            allow_insecure_auth: false,
            auth_optional: false,
            max_clients: 0,
            size: None,
            max_recipients: 100,
            max_unauthenticated_commands: 10,
            max_unrecognized_commands: 10,
            socket_timeout: Duration::from_secs(60),
            close_timeout: Duration::from_secs(30),
            early_talker_delay: Duration::from_millis(100),
            extra_capabilities: vec![],
        }
    }
}
