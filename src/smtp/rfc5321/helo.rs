use crate::mail::MailService;
use crate::smtp::command::SmtpHelo;
use crate::smtp::{extensions, ExtensionSet, SmtpSession};

/// Applies the greeting, either flavor. EHLO advertises capabilities,
/// HELO only greets. Both reset the envelope and set the peer name.
pub async fn apply_helo(service: &MailService, session: &mut SmtpSession, helo: SmtpHelo) {
    let extended = helo.is_extended();
    session.reset_helo(helo.host, extended);
    session.extensions = compute_extensions(service, session);
    match extended {
        false => session.say_helo(),
        true => session.say_ehlo(),
    }
}

/// The capability set for this session as it stands right now.
///
/// Ordering is fixed: PIPELINING, 8BITMIME, SMTPUTF8, SIZE, AUTH, STARTTLS,
/// then whatever the operator added. Entries drop out when their
/// precondition does not hold.
pub(crate) fn compute_extensions(service: &MailService, session: &SmtpSession) -> ExtensionSet {
    let config = service.config();
    let mut set = ExtensionSet::new();
    set.enable(&extensions::PIPELINING);
    set.enable(&extensions::EIGHTBITMIME);
    set.enable(&extensions::SMTPUTF8);
    if let Some(size) = config.size {
        set.enable_with_param("SIZE", &size.to_string());
    }
    if service.authenticator().is_some()
        && (session.secure || config.allow_insecure_auth)
        && !config.disabled_commands.contains("AUTH")
        && !config.auth_mechanisms.is_empty()
    {
        let mechanisms = config
            .auth_mechanisms
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        set.enable_with_param("AUTH", &mechanisms);
    }
    if session.starttls_available
        && !session.secure
        && !config.disabled_commands.contains("STARTTLS")
        && !config.hide_starttls
    {
        set.enable(&extensions::STARTTLS);
    }
    for line in &config.extra_capabilities {
        set.enable_custom(line);
    }
    set
}
