use crate::common::time_based_id;
use crate::mail::{MailService, MailVerdict};
use crate::smtp::{Address, SmtpReply, SmtpSession};

/// Opens a mail transaction. Legal only after a greeting and before another
/// MAIL; the consumer guard has the final word on the sender.
pub async fn apply_mail(service: &MailService, session: &mut SmtpSession, mail: Address) {
    if session.peer_name.is_none() || session.envelope.mail.is_some() {
        session.say_command_sequence_fail();
        return;
    }
    let config = service.config();
    if service.authenticator().is_some() && !config.auth_optional && session.user.is_none() {
        session.say_reply(SmtpReply::Custom(530, "Authentication required".to_owned()));
        return;
    }
    if let (Some(limit), Some(declared)) = (config.size, mail.param("SIZE")) {
        if declared.parse::<usize>().map_or(true, |n| n > limit) {
            session.say_reply(SmtpReply::StorageFailure);
            return;
        }
    }

    match service.guard().start_mail(&mail, session).await {
        MailVerdict::Accepted => {
            debug!("{}: mail from {}", session.id(), mail);
            session.envelope.id = time_based_id();
            session.envelope.mail = Some(mail);
            session.say_ok();
        }
        MailVerdict::Rejected { code, message } => {
            session.say_reply(SmtpReply::Custom(code, message));
        }
    }
}
