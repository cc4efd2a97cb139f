use crate::mail::MailService;
use crate::smtp::{SmtpReply, SmtpSession};

/// Starts the mail data transfer once the envelope is complete. The consumer
/// dispatch opens the sink the payload will stream into; refusing to open
/// one fails the command with the consumer's code and drops the envelope.
pub async fn apply_data(service: &MailService, session: &mut SmtpSession) {
    if session.peer_name.is_none()
        || session.envelope.mail.is_none()
        || session.envelope.rcpts.is_empty()
    {
        session.say_command_sequence_fail();
        return;
    }

    match service.dispatch().open_mail_body(session).await {
        Ok(sink) => {
            session.envelope.sink = Some(sink);
            session.say_start_data_challenge();
        }
        Err(e) => {
            warn!("{}: data sink refused: {}", session.id(), e);
            session.reset();
            session.say_reply(SmtpReply::Custom(e.code, e.message));
        }
    }
}
