//! Consumer-facing surface: the callbacks a host application plugs into the
//! server and the [`Builder`] that bundles them into a [`MailService`].

mod auth;
mod dispatch;
mod guard;

pub use self::auth::*;
pub use self::dispatch::*;
pub use self::guard::*;

use crate::common::*;
use crate::config::ServerConfig;
use crate::io::tls::TlsProvider;

/// Everything a session needs to run: configuration plus the consumer
/// callbacks. Cheap to clone, shared across sessions.
#[derive(Clone)]
pub struct MailService {
    config: Arc<ServerConfig>,
    guard: Arc<dyn MailGuard>,
    dispatch: Arc<dyn MailDispatch>,
    authenticator: Option<Arc<dyn Authenticator>>,
    hook: Arc<dyn SessionHook>,
    tls: Option<Arc<dyn TlsProvider>>,
}

impl MailService {
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
    pub fn guard(&self) -> &dyn MailGuard {
        self.guard.as_ref()
    }
    pub fn dispatch(&self) -> &dyn MailDispatch {
        self.dispatch.as_ref()
    }
    pub fn authenticator(&self) -> Option<&dyn Authenticator> {
        self.authenticator.as_deref()
    }
    pub fn hook(&self) -> &dyn SessionHook {
        self.hook.as_ref()
    }
    pub fn tls(&self) -> Option<Arc<dyn TlsProvider>> {
        self.tls.clone()
    }
}

impl fmt::Debug for MailService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailService")
            .field("config", &self.config)
            .field("authenticator", &self.authenticator.is_some())
            .field("tls", &self.tls.is_some())
            .finish()
    }
}

/// Composes a [`MailService`] out of configuration and callbacks.
///
/// Everything has a working default: accept-all policy, discard-all
/// dispatch, no authentication, no TLS.
#[derive(Default)]
pub struct Builder {
    config: ServerConfig,
    guard: Option<Arc<dyn MailGuard>>,
    dispatch: Option<Arc<dyn MailDispatch>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    hook: Option<Arc<dyn SessionHook>>,
    tls: Option<Arc<dyn TlsProvider>>,
}

impl Builder {
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }
    pub fn guard(mut self, guard: impl MailGuard + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }
    pub fn dispatch(mut self, dispatch: impl MailDispatch + 'static) -> Self {
        self.dispatch = Some(Arc::new(dispatch));
        self
    }
    pub fn auth(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }
    pub fn hook(mut self, hook: impl SessionHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }
    pub fn tls(mut self, provider: impl TlsProvider + 'static) -> Self {
        self.tls = Some(Arc::new(provider));
        self
    }
    pub fn build(self) -> MailService {
        MailService {
            config: Arc::new(self.config),
            guard: self.guard.unwrap_or_else(|| Arc::new(AcceptAll)),
            dispatch: self.dispatch.unwrap_or_else(|| Arc::new(NullDispatch)),
            authenticator: self.authenticator,
            hook: self.hook.unwrap_or_else(|| Arc::new(AcceptAll)),
            tls: self.tls,
        }
    }
}
