//! Local/remote request routing.
//!
//! A [`RoutingMode`] picks a primary backend and, for the `*-first`
//! modes, a fallback. When both fail, the primary's error is the one
//! reported; the fallback's error rides along for diagnostics.

use std::fmt;
use std::future::Future;

use cactus_common::RoutingMode;
use tracing::{debug, warn};

use crate::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Remote,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl Backend {
    pub fn other(self) -> Self {
        match self {
            Self::Local => Self::Remote,
            Self::Remote => Self::Local,
        }
    }
}

/// Primary backend and optional fallback for a mode.
pub fn plan(mode: RoutingMode) -> (Backend, Option<Backend>) {
    let primary = match mode {
        RoutingMode::Local | RoutingMode::LocalFirst => Backend::Local,
        RoutingMode::Remote | RoutingMode::RemoteFirst => Backend::Remote,
    };
    (primary, mode.has_fallback().then(|| primary.other()))
}

/// Which backend served a routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDecision {
    pub mode: RoutingMode,
    pub backend: Backend,
    pub fell_back: bool,
}

/// Every backend allowed by the mode failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{backend} request failed ({mode} routing): {source}")]
pub struct RoutingFailure {
    pub mode: RoutingMode,
    /// The primary backend.
    pub backend: Backend,
    #[source]
    pub source: BackendError,
    pub fallback: Option<BackendError>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestRouter {
    default_mode: RoutingMode,
}

impl RequestRouter {
    pub fn new(default_mode: RoutingMode) -> Self {
        Self { default_mode }
    }

    pub fn default_mode(&self) -> RoutingMode {
        self.default_mode
    }

    pub fn set_default_mode(&mut self, mode: RoutingMode) {
        self.default_mode = mode;
    }

    /// Run the request on the backend(s) selected by `mode`.
    ///
    /// Only the operations the mode calls for are invoked.
    pub async fn route<T, L, LF, R, RF>(
        &self,
        mode: RoutingMode,
        local: L,
        remote: R,
    ) -> Result<(T, RouteDecision), RoutingFailure>
    where
        L: FnOnce() -> LF,
        LF: Future<Output = Result<T, BackendError>>,
        R: FnOnce() -> RF,
        RF: Future<Output = Result<T, BackendError>>,
    {
        let (primary, fallback) = plan(mode);
        debug!(%mode, %primary, ?fallback, "routing request");

        let mut local = Some(local);
        let mut remote = Some(remote);

        let primary_err = match run_on(primary, &mut local, &mut remote).await {
            Ok(v) => {
                return Ok((
                    v,
                    RouteDecision {
                        mode,
                        backend: primary,
                        fell_back: false,
                    },
                ))
            }
            Err(e) => e,
        };

        let Some(fallback) = fallback else {
            return Err(RoutingFailure {
                mode,
                backend: primary,
                source: primary_err,
                fallback: None,
            });
        };

        warn!(%mode, "{primary} request failed, trying {fallback}: {primary_err}");
        match run_on(fallback, &mut local, &mut remote).await {
            Ok(v) => Ok((
                v,
                RouteDecision {
                    mode,
                    backend: fallback,
                    fell_back: true,
                },
            )),
            Err(fallback_err) => Err(RoutingFailure {
                mode,
                backend: primary,
                source: primary_err,
                fallback: Some(fallback_err),
            }),
        }
    }

    /// [`route`](Self::route) with the router's default mode.
    pub async fn route_default<T, L, LF, R, RF>(
        &self,
        local: L,
        remote: R,
    ) -> Result<(T, RouteDecision), RoutingFailure>
    where
        L: FnOnce() -> LF,
        LF: Future<Output = Result<T, BackendError>>,
        R: FnOnce() -> RF,
        RF: Future<Output = Result<T, BackendError>>,
    {
        self.route(self.default_mode, local, remote).await
    }
}

/// Invoke the operation for `backend`. Each operation runs at most once.
async fn run_on<T, L, LF, R, RF>(
    backend: Backend,
    local: &mut Option<L>,
    remote: &mut Option<R>,
) -> Result<T, BackendError>
where
    L: FnOnce() -> LF,
    LF: Future<Output = Result<T, BackendError>>,
    R: FnOnce() -> RF,
    RF: Future<Output = Result<T, BackendError>>,
{
    let spent = || BackendError::Unavailable(format!("{backend} operation already used"));
    match backend {
        Backend::Local => match local.take() {
            Some(op) => op().await,
            None => Err(spent()),
        },
        Backend::Remote => match remote.take() {
            Some(op) => op().await,
            None => Err(spent()),
        },
    }
}
