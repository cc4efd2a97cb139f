use crate::common::*;
use crate::io::tls::TlsCapable;
use crate::io::{ConnectionInfo, Io};
use crate::mail::MailService;
use crate::smtp::{SmtpDriver, SmtpReply, SmtpSession};
use async_std::channel;
use async_std::future::timeout;
use async_std::io::prelude::WriteExt;
use async_std::net::{TcpListener, TcpStream, ToSocketAddrs};
use async_std::task;
use futures_util::future::{select, Either};
use futures_util::pin_mut;
use std::collections::HashMap;
use std::net::{Shutdown, SocketAddr};
use std::sync::Mutex;
use std::time::Duration;

/// `TcpServer` accepts TCP connections and runs each as an SMTP session
/// against the given [`MailService`].
#[derive(Debug, Clone)]
pub struct TcpServer<T = String> {
    addr: T,
}

impl<T> TcpServer<T> {
    /// Listen on this address, usually `host:port`.
    pub fn on(addr: T) -> Self {
        Self { addr }
    }
}

impl<T> TcpServer<T>
where
    T: ToSocketAddrs + Send + Sync + 'static,
{
    /// Binds and serves until the process ends. For a handle that can shut
    /// the server down gracefully, use [`TcpServer::start`].
    pub async fn serve(self, service: MailService) -> Result<()> {
        let handle = self.start(service).await?;
        handle.accept_task.await;
        Ok(())
    }

    /// Binds, spawns the accept loop and hands back the control handle.
    pub async fn start(self, service: MailService) -> Result<ServerHandle> {
        let listener = TcpListener::bind(&self.addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let close_timeout = service.config().close_timeout;
        let (drained_tx, drained_rx) = channel::bounded(1);
        let (stop_tx, stop_rx) = channel::bounded(1);
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                active: 0,
                draining: false,
                sessions: HashMap::new(),
            }),
            drained_tx,
        });

        let accept_task = task::spawn(accept_loop(listener, service, shared.clone(), stop_rx));

        Ok(ServerHandle {
            local_addr,
            shared,
            stop_tx,
            drained_rx,
            close_timeout,
            accept_task,
        })
    }
}

/// Controls a running server: address introspection and graceful shutdown.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    stop_tx: channel::Sender<()>,
    drained_rx: channel::Receiver<()>,
    close_timeout: Duration,
    accept_task: task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn active_sessions(&self) -> usize {
        self.shared.lock().active
    }

    /// Stops accepting, tells every open session 421 on its next command and
    /// waits up to `close_timeout` for them to drain. Whatever is left after
    /// that gets its socket pulled.
    pub async fn close(self) {
        let remaining = self.shared.set_draining();
        let _ = self.stop_tx.send(()).await;
        self.accept_task.await;
        if remaining > 0 {
            info!("Draining {} active sessions", remaining);
            if timeout(self.close_timeout, self.drained_rx.recv())
                .await
                .is_err()
            {
                warn!("Close timeout expired, force-closing remaining sessions");
                self.shared.force_close_all();
            }
        }
    }
}

/// The only state sessions share: the active count, the draining flag and
/// the socket registry used for force-close.
struct Shared {
    inner: Mutex<Inner>,
    drained_tx: channel::Sender<()>,
}

struct Inner {
    active: usize,
    draining: bool,
    sessions: HashMap<String, TcpStream>,
}

enum Admission {
    Granted,
    Full,
    Draining,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("listener state mutex")
    }
    fn admit(&self, max_clients: usize, id: &str, stream: &TcpStream) -> Admission {
        let mut inner = self.lock();
        if inner.draining {
            return Admission::Draining;
        }
        if max_clients > 0 && inner.active >= max_clients {
            return Admission::Full;
        }
        inner.active += 1;
        inner.sessions.insert(id.to_owned(), stream.clone());
        Admission::Granted
    }
    fn release(&self, id: &str) {
        let mut inner = self.lock();
        inner.active -= 1;
        inner.sessions.remove(id);
        if inner.draining && inner.active == 0 {
            let _ = self.drained_tx.try_send(());
        }
    }
    fn is_draining(&self) -> bool {
        self.lock().draining
    }
    fn set_draining(&self) -> usize {
        let mut inner = self.lock();
        inner.draining = true;
        inner.active
    }
    fn force_close_all(&self) {
        let mut inner = self.lock();
        for (id, stream) in inner.sessions.drain() {
            debug!("{}: force closing", id);
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    service: MailService,
    shared: Arc<Shared>,
    stop_rx: channel::Receiver<()>,
) {
    loop {
        let accept = listener.accept();
        let stop = stop_rx.recv();
        pin_mut!(accept);
        pin_mut!(stop);
        match select(accept, stop).await {
            Either::Left((Ok((stream, _)), _)) => {
                let service = service.clone();
                let shared = shared.clone();
                task::spawn(async move {
                    handle_connection(stream, service, shared).await;
                });
            }
            Either::Left((Err(e), _)) => {
                error!("Failed to accept a connection: {}", e);
            }
            Either::Right((_, _)) => {
                debug!("Accept loop stopped");
                return;
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, service: MailService, shared: Arc<Shared>) {
    let config = service.config();
    let conn = ConnectionInfo::new(
        stream
            .local_addr()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        stream
            .peer_addr()
            .map(|s| s.to_string())
            .unwrap_or_default(),
    );
    info!("New peer connection, {}", conn);

    match shared.admit(config.max_clients, &conn.id, &stream) {
        Admission::Granted => {}
        Admission::Full => {
            let notice =
                SmtpReply::ServiceNotAvailableError("Too many connected clients".to_owned());
            let _ = stream.write_all(notice.to_string().as_bytes()).await;
            let _ = stream.shutdown(Shutdown::Both);
            return;
        }
        Admission::Draining => {
            let notice = SmtpReply::ServiceNotAvailableError("Server shutting down".to_owned());
            let _ = stream.write_all(notice.to_string().as_bytes()).await;
            let _ = stream.shutdown(Shutdown::Both);
            return;
        }
    }

    let id = conn.id.clone();
    let io: Box<dyn Io> = Box::new(stream);
    let tls = match service.tls() {
        Some(provider) => TlsCapable::enabled(io, provider),
        None => TlsCapable::plaintext(io),
    };
    let mut session = SmtpSession::new(conn, config.service_name.clone());
    let mut driver = SmtpDriver::new(tls, config.socket_timeout);

    if config.secure {
        // implicit TLS, handshake before anything else hits the wire
        match driver.encrypt() {
            Ok(()) => session.secure = true,
            Err(e) => {
                warn!("{}: TLS handshake setup failed: {}", id, e);
                shared.release(&id);
                return;
            }
        }
    } else {
        session.starttls_available = driver.can_encrypt();
    }

    service.hook().on_connect(&mut session).await;

    match driver.check_early_talker(config.early_talker_delay).await {
        Ok(false) => session.say_service_ready(),
        Ok(true) => {
            warn!("{}: client spoke before the banner", id);
            session.say_shutdown(SmtpReply::TransactionFailure("Go ahead".to_owned()));
        }
        Err(e) => {
            warn!("{}: {}", id, e);
            service.hook().on_close(&session).await;
            shared.release(&id);
            return;
        }
    }

    let drain_watch = shared.clone();
    if let Err(e) = driver
        .drive(&service, &mut session, move || drain_watch.is_draining())
        .await
    {
        warn!("{}: session ended with error: {}", id, e);
    }

    service.hook().on_close(&session).await;
    shared.release(&id);
    info!("Connection {} closed", id);
}
