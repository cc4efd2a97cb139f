use crate::mail::MailService;
use crate::smtp::SmtpSession;

/// An unrecognized (or operator-disabled) verb. Counts toward the
/// unrecognized-command cap; a client that keeps guessing gets cut off.
pub fn apply_unknown(service: &MailService, session: &mut SmtpSession, verb: &str) {
    session.unrecognized_commands += 1;
    if session.unrecognized_commands > service.config().max_unrecognized_commands {
        warn!("{}: too many unrecognized commands", session.id());
        session.say_shutdown_service_err("Too many unrecognized commands".to_owned());
    } else {
        debug!("{}: unrecognized command {:?}", session.id(), verb);
        session.say_invalid_syntax();
    }
}
