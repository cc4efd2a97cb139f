use crate::common::*;
use crate::io::Io;
use async_tls::TlsAcceptor;

/// Upgrades a plaintext byte stream to an encrypted one.
///
/// The provider is handed the raw stream and gives back the encrypted stream
/// once the handshake completes. See [`TlsAcceptorProvider`] for the
/// rustls-backed implementation used by STARTTLS and implicit-TLS servers.
pub trait TlsProvider: Send + Sync {
    fn upgrade_to_tls(&self, io: Box<dyn Io>) -> S3Fut<std::io::Result<Box<dyn Io>>>;
}

impl<T: TlsProvider + ?Sized> TlsProvider for Arc<T> {
    fn upgrade_to_tls(&self, io: Box<dyn Io>) -> S3Fut<std::io::Result<Box<dyn Io>>> {
        T::upgrade_to_tls(self, io)
    }
}

/// Server-side TLS through `async-tls` / `rustls`.
#[derive(Clone)]
pub struct TlsAcceptorProvider {
    acceptor: TlsAcceptor,
}

impl From<TlsAcceptor> for TlsAcceptorProvider {
    fn from(acceptor: TlsAcceptor) -> Self {
        TlsAcceptorProvider { acceptor }
    }
}

impl From<rustls::ServerConfig> for TlsAcceptorProvider {
    fn from(config: rustls::ServerConfig) -> Self {
        TlsAcceptorProvider {
            acceptor: TlsAcceptor::from(Arc::new(config)),
        }
    }
}

impl TlsProvider for TlsAcceptorProvider {
    fn upgrade_to_tls(&self, io: Box<dyn Io>) -> S3Fut<std::io::Result<Box<dyn Io>>> {
        let accept = self.acceptor.accept(io);
        Box::pin(async move {
            let encrypted = accept.await?;
            Ok(Box::new(encrypted) as Box<dyn Io>)
        })
    }
}

impl fmt::Debug for TlsAcceptorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsAcceptorProvider").finish()
    }
}

/// A byte stream that may switch to TLS mid-session.
pub trait MayBeTls: Io {
    /// True while the stream is plaintext and a provider is available.
    fn can_encrypt(&self) -> bool;
    fn is_encrypted(&self) -> bool;
    /// Initiate the handshake. The swap is observed by the next read/write.
    fn encrypt(self: Pin<&mut Self>) -> std::io::Result<()>;
}

/// Wraps the session stream and performs the in-place TLS upgrade.
///
/// Starts out `PlainText` (no provider) or `Enabled`. `encrypt()` moves to
/// `HandShake`; the first read or write afterwards drives the handshake to
/// completion and lands in `Encrypted`.
pub enum TlsCapable {
    PlainText(Box<dyn Io>),
    Enabled(Option<Box<dyn Io>>, Arc<dyn TlsProvider>),
    HandShake(S3Fut<std::io::Result<Box<dyn Io>>>),
    Encrypted(Box<dyn Io>),
    Failed,
}

impl TlsCapable {
    pub fn plaintext(io: Box<dyn Io>) -> Self {
        TlsCapable::PlainText(io)
    }
    pub fn enabled(io: Box<dyn Io>, provider: Arc<dyn TlsProvider>) -> Self {
        TlsCapable::Enabled(Some(io), provider)
    }

    fn poll_tls(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let me = self.get_mut();
        match me {
            TlsCapable::HandShake(handshake) => {
                trace!("Waiting for TLS handshake");
                match handshake.as_mut().poll(cx) {
                    Poll::Pending => Poll::Pending,
                    Poll::Ready(Err(e)) => {
                        *me = TlsCapable::Failed;
                        Poll::Ready(Err(e))
                    }
                    Poll::Ready(Ok(stream)) => {
                        trace!("TLS is on!");
                        *me = TlsCapable::Encrypted(stream);
                        Poll::Ready(Ok(()))
                    }
                }
            }
            TlsCapable::Failed => Poll::Ready(Err(Self::failed())),
            _ => Poll::Ready(Ok(())),
        }
    }

    fn failed() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "TLS setup failed")
    }
}

impl MayBeTls for TlsCapable {
    fn can_encrypt(&self) -> bool {
        matches!(self, TlsCapable::Enabled(_, _))
    }
    fn is_encrypted(&self) -> bool {
        matches!(self, TlsCapable::HandShake(_) | TlsCapable::Encrypted(_))
    }
    fn encrypt(self: Pin<&mut Self>) -> std::io::Result<()> {
        let me = self.get_mut();
        match me {
            TlsCapable::Enabled(io, provider) => {
                trace!("Switching to TLS");
                let io = io.take().expect("encrypt: enabled stream present");
                let handshake = provider.upgrade_to_tls(io);
                *me = TlsCapable::HandShake(handshake);
                Ok(())
            }
            TlsCapable::PlainText(_) => Err(Self::failed()),
            TlsCapable::HandShake(_) | TlsCapable::Encrypted(_) => Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "encrypt: TLS is already on",
            )),
            TlsCapable::Failed => Err(Self::failed()),
        }
    }
}

impl Read for TlsCapable {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<std::io::Result<usize>> {
        futures_util::ready!(self.as_mut().poll_tls(cx))?;
        match self.get_mut() {
            TlsCapable::PlainText(io) => Pin::new(io).poll_read(cx, buf),
            TlsCapable::Enabled(Some(io), _) => Pin::new(io).poll_read(cx, buf),
            TlsCapable::Encrypted(io) => Pin::new(io).poll_read(cx, buf),
            _ => Poll::Ready(Err(Self::failed())),
        }
    }
}

impl Write for TlsCapable {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        futures_util::ready!(self.as_mut().poll_tls(cx))?;
        match self.get_mut() {
            TlsCapable::PlainText(io) => Pin::new(io).poll_write(cx, buf),
            TlsCapable::Enabled(Some(io), _) => Pin::new(io).poll_write(cx, buf),
            TlsCapable::Encrypted(io) => Pin::new(io).poll_write(cx, buf),
            _ => Poll::Ready(Err(Self::failed())),
        }
    }
    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        futures_util::ready!(self.as_mut().poll_tls(cx))?;
        match self.get_mut() {
            TlsCapable::PlainText(io) => Pin::new(io).poll_flush(cx),
            TlsCapable::Enabled(Some(io), _) => Pin::new(io).poll_flush(cx),
            TlsCapable::Encrypted(io) => Pin::new(io).poll_flush(cx),
            _ => Poll::Ready(Err(Self::failed())),
        }
    }
    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        futures_util::ready!(self.as_mut().poll_tls(cx))?;
        match self.get_mut() {
            TlsCapable::PlainText(io) => Pin::new(io).poll_close(cx),
            TlsCapable::Enabled(Some(io), _) => Pin::new(io).poll_close(cx),
            TlsCapable::Encrypted(io) => Pin::new(io).poll_close(cx),
            // closing a dead stream is a no-op
            _ => Poll::Ready(Ok(())),
        }
    }
}

impl fmt::Debug for TlsCapable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TlsCapable::PlainText(_) => "PlainText(..)",
            TlsCapable::Enabled(_, _) => "Enabled(..)",
            TlsCapable::HandShake(_) => "HandShake(..)",
            TlsCapable::Encrypted(_) => "Encrypted(..)",
            TlsCapable::Failed => "Failed",
        })
    }
}
