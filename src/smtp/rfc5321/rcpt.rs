use crate::mail::{MailService, MailVerdict};
use crate::smtp::{Address, SmtpReply, SmtpSession};

/// Adds a recipient to the open transaction, keeping input order.
pub async fn apply_rcpt(service: &MailService, session: &mut SmtpSession, rcpt: Address) {
    if session.peer_name.is_none() || session.envelope.mail.is_none() {
        session.say_command_sequence_fail();
        return;
    }
    if session.envelope.rcpts.len() >= service.config().max_recipients {
        session.say_reply(SmtpReply::TooManyRecipientsError);
        return;
    }

    match service.guard().add_recipient(&rcpt, session).await {
        MailVerdict::Accepted => {
            debug!("{}: rcpt to {}", session.id(), rcpt);
            session.envelope.rcpts.push(rcpt);
            session.say_ok();
        }
        MailVerdict::Rejected { code, message } => {
            session.say_reply(SmtpReply::Custom(code, message));
        }
    }
}
