use crate::common::*;
use crate::smtp::SmtpSession;

/// Where the mail data goes. The engine pours the unstuffed payload bytes in
/// and closes the sink when the terminating dot arrives.
///
/// A sink that has seen enough may bail out early: returning an error of
/// kind `NotConnected` from a write or from close counts as successful
/// completion, any other error carrying a [`DispatchError`] payload selects
/// the failure reply. Either way the engine keeps draining the remaining
/// payload off the wire before answering the client.
pub trait MailDataSink: Write + Send + Sync + 'static {}
impl<T> MailDataSink for T where T: Write + Send + Sync + 'static {}

/// A message-level failure the consumer wants on the wire, code and all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    pub code: u16,
    pub message: String,
}

impl DispatchError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        DispatchError {
            code,
            message: message.into(),
        }
    }
    /// Wraps self for returning out of a sink write/close.
    pub fn into_io_error(self) -> io::Error {
        io::Error::new(io::ErrorKind::Other, self)
    }
    /// Digs a `DispatchError` out of a sink error, if one was put there.
    pub fn from_io_error(e: &io::Error) -> Option<DispatchError> {
        e.get_ref()
            .and_then(|inner| inner.downcast_ref::<DispatchError>())
            .cloned()
    }
}

impl Default for DispatchError {
    fn default() -> Self {
        DispatchError::new(450, "Requested mail action not taken")
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}
impl std::error::Error for DispatchError {}

/// Opens the data sink for an accepted envelope.
///
/// Refusing to open one fails the DATA command with the given error.
#[async_trait::async_trait]
pub trait MailDispatch: Send + Sync {
    async fn open_mail_body(
        &self,
        session: &SmtpSession,
    ) -> std::result::Result<Pin<Box<dyn MailDataSink>>, DispatchError>;
}

/// Default dispatch: accepts every message and throws the bytes away.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDispatch;

#[async_trait::async_trait]
impl MailDispatch for NullDispatch {
    async fn open_mail_body(
        &self,
        _session: &SmtpSession,
    ) -> std::result::Result<Pin<Box<dyn MailDataSink>>, DispatchError> {
        Ok(Box::pin(NullSink))
    }
}

struct NullSink;

impl Write for NullSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }
    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
