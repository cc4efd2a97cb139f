//! The base command set of RFC 5321, applied to the session state.

mod data;
mod helo;
mod mail;
mod misc;
mod rcpt;
mod unknown;

pub use self::unknown::apply_unknown;

use crate::mail::MailService;
use crate::smtp::command::SmtpCommand;
use crate::smtp::{rfc3207, rfc4954, SmtpSession};

/// Routes one parsed command to its action.
pub async fn apply_command(service: &MailService, session: &mut SmtpSession, cmd: SmtpCommand) {
    use SmtpCommand as C;
    match cmd {
        C::Helo(helo) => helo::apply_helo(service, session, helo).await,
        C::Mail(mail) => mail::apply_mail(service, session, mail).await,
        C::Rcpt(rcpt) => rcpt::apply_rcpt(service, session, rcpt).await,
        C::Data => data::apply_data(service, session).await,
        C::Rset => misc::apply_rset(session),
        C::Noop(_) => misc::apply_noop(session),
        C::Quit => misc::apply_quit(session),
        C::Vrfy(_) => misc::apply_vrfy(session),
        C::Help(_) => misc::apply_help(session),
        C::StartTls => rfc3207::apply_starttls(session),
        C::Auth { mechanism, initial } => {
            rfc4954::apply_auth(service, session, &mechanism, initial).await
        }
        C::Other(verb, _) => apply_unknown(service, session, &verb),
    }
}
