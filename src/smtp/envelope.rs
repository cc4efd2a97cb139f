use crate::common::*;
use crate::mail::MailDataSink;
use crate::smtp::Address;

/// Mail envelope being collected before and during mail data transfer.
///
/// Reset at session start, on RSET, on EHLO/HELO and after every completed
/// DATA exchange.
#[derive(Default)]
pub struct Envelope {
    /// unique mail transaction identifier, assigned when MAIL is accepted
    pub id: String,
    /// The reverse path sent by the peer, None before MAIL
    pub mail: Option<Address>,
    /// Forward paths in the order the peer sent them
    pub rcpts: Vec<Address>,
    /// Write sink the payload goes to while a DATA exchange runs
    pub sink: Option<Pin<Box<dyn MailDataSink>>>,
}

impl Envelope {
    pub fn reset(&mut self) {
        self.id = String::new();
        self.mail = None;
        self.rcpts = vec![];
        self.sink = None;
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.mail.is_none() && self.rcpts.is_empty() && self.sink.is_none()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("id", &self.id)
            .field("mail", &self.mail)
            .field("rcpts", &self.rcpts)
            .field("sink", &self.sink.as_ref().map(|_| "*"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_everything() {
        let mut sut = Envelope::default();
        sut.id = "someid".to_owned();
        sut.mail = Some(Address::new("kaja@example.org"));
        sut.rcpts.push(Address::new("pepa@example.org"));
        let sink: Vec<u8> = vec![];
        sut.sink = Some(Box::pin(sink));
        sut.reset();
        assert!(sut.is_empty());
    }
}
