use crate::smtp::{SmtpReply, SmtpSession};

/// RSET drops the transaction and succeeds, greeted or not.
pub fn apply_rset(session: &mut SmtpSession) {
    session.reset();
    session.say_ok();
}

pub fn apply_noop(session: &mut SmtpSession) {
    session.say_ok();
}

pub fn apply_quit(session: &mut SmtpSession) {
    session.say_shutdown_ok();
}

/// Mailbox existence is nobody's business; the message gets its chance.
pub fn apply_vrfy(session: &mut SmtpSession) {
    session.say_reply(SmtpReply::CannotVerifyUserInfo);
}

pub fn apply_help(session: &mut SmtpSession) {
    session.say_reply(SmtpReply::HelpInfo(
        "Supported commands: EHLO HELO MAIL RCPT DATA RSET NOOP QUIT VRFY HELP AUTH STARTTLS"
            .to_owned(),
    ));
}
