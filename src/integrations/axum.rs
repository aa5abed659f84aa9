use alloc::{
    boxed::Box,
    string::{String, ToString as _},
    sync::Arc,
};
use core::{
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicUsize, Ordering},
    task::{Context, Poll},
};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use parking_lot::Mutex;
use tower_layer::Layer;
use tower_service::Service;
use tracing::debug;

use crate::{Container, Inject, InjectAll, InjectOpt, ResolveError, Scope};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("request scope not found in extensions")]
    ScopeNotAttached,
    #[error(transparent)]
    Resolve(ResolveError),
}

impl IntoResponse for InjectError {
    fn into_response(self) -> Response {
        let body: String = self.to_string();
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Reference-counted hand-off of one request's scope.
///
/// The scope is created lazily on the first injection and disposed exactly
/// when the outstanding lease count returns to zero. The layer holds one
/// lease for the whole request, so every injection within the request
/// observes the same scope.
#[derive(Clone)]
pub struct RequestScope {
    inner: Arc<RequestScopeInner>,
}

struct RequestScopeInner {
    container: Container,
    state: Mutex<Option<Scope>>,
    leases: AtomicUsize,
}

impl RequestScope {
    #[must_use]
    fn new(container: Container) -> Self {
        Self {
            inner: Arc::new(RequestScopeInner {
                container,
                state: Mutex::new(None),
                leases: AtomicUsize::new(0),
            }),
        }
    }

    #[must_use]
    pub fn lease(&self) -> ScopeLease {
        self.inner.leases.fetch_add(1, Ordering::SeqCst);
        ScopeLease {
            inner: self.inner.clone(),
        }
    }
}

/// One outstanding injection. Dropping the last lease disposes the request
/// scope.
pub struct ScopeLease {
    inner: Arc<RequestScopeInner>,
}

impl ScopeLease {
    /// The request's scope, created on first use.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.inner
            .state
            .lock()
            .get_or_insert_with(|| self.inner.container.create_scope())
            .clone()
    }
}

impl Drop for ScopeLease {
    fn drop(&mut self) {
        if self.inner.leases.fetch_sub(1, Ordering::SeqCst) == 1 {
            if let Some(scope) = self.inner.state.lock().take() {
                scope.dispose();
                debug!("Request scope disposed");
            }
        }
    }
}

#[derive(Clone)]
struct ScopeLayer {
    container: Container,
}

impl<S> Layer<S> for ScopeLayer {
    type Service = AttachScope<S>;

    fn layer(&self, service: S) -> Self::Service {
        AttachScope {
            service,
            container: self.container.clone(),
        }
    }
}

#[derive(Clone)]
struct AttachScope<S> {
    service: S,
    container: Container,
}

impl<ResBody, S> Service<Request<ResBody>> for AttachScope<S>
where
    S: Service<Request<ResBody>>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ResBody>) -> Self::Future {
        let attachment = RequestScope::new(self.container.clone());
        let lease = attachment.lease();
        request.extensions_mut().insert(attachment);

        let future = self.service.call(request);
        Box::pin(async move {
            let response = future.await?;
            drop(lease);
            Ok(response)
        })
    }
}

fn leased(parts: &Parts) -> Result<ScopeLease, InjectError> {
    parts
        .extensions
        .get::<RequestScope>()
        .map(RequestScope::lease)
        .ok_or(InjectError::ScopeNotAttached)
}

impl<S, Dep> FromRequestParts<S> for Inject<Dep>
where
    Dep: Send + Sync + 'static,
{
    type Rejection = InjectError;

    fn from_request_parts(parts: &mut Parts, _state: &S) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let res = leased(parts).and_then(|lease| {
            lease
                .scope()
                .get_required()
                .map(Self)
                .map_err(InjectError::Resolve)
        });

        async move { res }
    }
}

impl<S, Dep> FromRequestParts<S> for InjectOpt<Dep>
where
    Dep: Send + Sync + 'static,
{
    type Rejection = InjectError;

    fn from_request_parts(parts: &mut Parts, _state: &S) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let res = leased(parts).and_then(|lease| {
            lease.scope().get().map(Self).map_err(InjectError::Resolve)
        });

        async move { res }
    }
}

impl<S, Dep> FromRequestParts<S> for InjectAll<Dep>
where
    Dep: Send + Sync + 'static,
{
    type Rejection = InjectError;

    fn from_request_parts(parts: &mut Parts, _state: &S) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let res = leased(parts).and_then(|lease| {
            lease
                .scope()
                .get_all()
                .map(Self)
                .map_err(InjectError::Resolve)
        });

        async move { res }
    }
}

impl<S> FromRequestParts<S> for ScopeLease {
    type Rejection = InjectError;

    fn from_request_parts(parts: &mut Parts, _state: &S) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let res = leased(parts);

        async move { res }
    }
}

/// Wires the container into the router: every request gets a lazily-created
/// scope shared by all injections of that request.
#[inline]
pub fn setup<S>(router: Router<S>, container: Container) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(ScopeLayer { container })
}
