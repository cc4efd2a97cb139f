//! STARTTLS - RFC 3207 - SMTP Service Extension for Secure SMTP over TLS

mod starttls;

pub use self::starttls::apply_starttls;
