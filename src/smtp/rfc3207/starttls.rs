use crate::smtp::SmtpSession;

/// Orders the in-place TLS upgrade.
///
/// Legal after a greeting, on a plaintext transport that can upgrade. The
/// 220 goes out first, then the driver swaps the byte stream and wipes all
/// EHLO-derived state - the client has to greet again.
pub fn apply_starttls(session: &mut SmtpSession) {
    if session.peer_name.is_none() {
        session.say_command_sequence_fail();
        return;
    }
    if session.secure || !session.starttls_available {
        session.say_command_sequence_fail();
        return;
    }
    info!("{}: switching to TLS", session.id());
    session.reset();
    session.say_start_tls();
}
