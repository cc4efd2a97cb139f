//! The SMTP conversation engine: command parsing, session state, per-command
//! actions and the driver that moves bytes between the transport and the
//! state machine.

mod address;
mod codec;
pub mod command;
mod driver;
mod envelope;
mod extensions;
mod parser;
mod reply;
mod rfc3207;
mod rfc4954;
mod rfc5321;
mod session;

pub use self::address::*;
pub use self::codec::*;
pub use self::command::{SmtpCommand, SmtpHelo};
pub use self::driver::*;
pub use self::envelope::*;
pub use self::extensions::*;
pub use self::parser::*;
pub use self::reply::*;
pub use self::rfc3207::*;
pub use self::rfc4954::*;
pub use self::rfc5321::*;
pub use self::session::*;

/// Instructions for the transport side of the session.
pub enum DriverControl {
    /// Write an SMTP response
    Response(Vec<u8>),
    /// Start TLS encryption
    StartTls,
    /// Shut the stream down
    Shutdown,
}

impl std::fmt::Debug for DriverControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverControl::Response(bytes) => f
                .debug_tuple("Response")
                .field(&String::from_utf8_lossy(bytes))
                .finish(),
            DriverControl::StartTls => f.write_str("StartTls"),
            DriverControl::Shutdown => f.write_str("Shutdown"),
        }
    }
}
