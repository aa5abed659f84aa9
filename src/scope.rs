use alloc::{sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, error, info_span};

use crate::{
    any::{AnyInstance, ServiceId, TypeInfo},
    cache::InstanceCache,
    container::Container,
    errors::{ResolutionPath, ResolveError},
    lifetime::Lifetime,
    registry::{Descriptor, Registry},
};

/// A resolution context: an instance cache, a reference to the root scope
/// for singleton sharing, and the construction-path stack used for cycle
/// detection. The root scope and every child scope expose the same
/// resolution contract.
///
/// Handles are cheap to clone; the scope is disposed when [`Self::dispose`]
/// runs or the last handle drops, whichever comes first. Disposal is
/// idempotent.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    registry: Arc<Registry>,
    cache: InstanceCache,
    /// `None` iff this is the root scope.
    root: Option<Scope>,
    /// Descriptors currently under construction; empty between calls.
    stack: Mutex<Vec<Descriptor>>,
    disposed: AtomicBool,
}

impl Scope {
    #[must_use]
    pub(crate) fn root(registry: Arc<Registry>) -> Self {
        Self::with_root(registry, None)
    }

    #[must_use]
    pub(crate) fn child(registry: Arc<Registry>, root: Scope) -> Self {
        Self::with_root(registry, Some(root))
    }

    fn with_root(registry: Arc<Registry>, root: Option<Scope>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                registry,
                cache: InstanceCache::new(),
                root,
                stack: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Resolves the last-registered binding of `Svc`, or `None` when the
    /// type was never registered.
    pub fn get<Svc: Send + Sync + 'static>(&self) -> Result<Option<Arc<Svc>>, ResolveError> {
        let id = ServiceId::of::<Svc>();
        let Some(descriptor) = self.inner.registry.descriptor(&id).copied() else {
            return Ok(None);
        };

        self.resolve(id, descriptor)
            .map(|instance| Some(downcast::<Svc>(instance)))
    }

    /// As [`Self::get`], but an unregistered type is an error.
    pub fn get_required<Svc: Send + Sync + 'static>(&self) -> Result<Arc<Svc>, ResolveError> {
        match self.get()? {
            Some(instance) => Ok(instance),
            None => {
                let err = ResolveError::UnregisteredType(TypeInfo::of::<Svc>());
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Resolves every binding of `Svc`, in registration order.
    pub fn get_all<Svc: Send + Sync + 'static>(&self) -> Result<Vec<Arc<Svc>>, ResolveError> {
        let id = ServiceId::of::<Svc>();
        let descriptors = self.inner.registry.descriptors(&id);

        let mut instances = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            instances.push(downcast::<Svc>(self.resolve(id, *descriptor)?));
        }

        Ok(instances)
    }

    #[must_use]
    pub fn is_registered<Svc: ?Sized + 'static>(&self) -> bool {
        self.inner.registry.is_registered(&ServiceId::of::<Svc>())
    }

    /// Creates a child scope of the root. The child shares the singleton
    /// cache through the root and owns its scoped instances.
    #[must_use]
    pub fn create_scope(&self) -> Scope {
        Scope::child(self.inner.registry.clone(), self.root_scope())
    }

    /// Disposes this scope's cached instances in insertion order, invoking
    /// the [`crate::Disposable`] capability where registered. A second call
    /// is a no-op. Singletons live in the root scope's cache and are only
    /// disposed with the container.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    #[must_use]
    pub(crate) fn container(&self) -> Container {
        Container::from_parts(self.inner.registry.clone(), self.root_scope())
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    fn root_scope(&self) -> Scope {
        match &self.inner.root {
            Some(root) => root.clone(),
            None => self.clone(),
        }
    }

    /// Resolution of one descriptor, requested under `id`.
    fn resolve(&self, id: ServiceId, descriptor: Descriptor) -> Result<AnyInstance, ResolveError> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(ResolveError::ScopeDisposed);
        }

        let span = info_span!(
            "resolve",
            service = id.ty.short_name(),
            lifetime = descriptor.lifetime.name()
        );
        let _guard = span.enter();

        // cycle and captive-dependency checks; the frame pops on every exit
        // path below
        let _frame = StackFrame::push(&self.inner.stack, descriptor, id.ty)?;

        let provider = self
            .inner
            .registry
            .provider(&id, descriptor.implementation.id)
            .expect("every descriptor has a registered provider");
        let factory = provider.factory.clone();
        let build = || (factory)(self, &descriptor);

        if descriptor.lifetime == Lifetime::Transient || !provider.cache_provides {
            return build();
        }

        let key = (id, descriptor.implementation.id);
        match descriptor.lifetime {
            Lifetime::Scoped => self.inner.cache.get_or_build(key, build),
            _ => self.root_scope().inner.cache.get_or_build(key, build),
        }
    }
}

impl ScopeInner {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        for ((id, _), instance) in self.cache.drain() {
            if let Some(disposer) = self.registry.disposer(id.ty.id) {
                (disposer)(instance);
                debug!(service = id.ty.short_name(), "Disposed");
            }
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.dispose();
        debug!("Scope disposed on drop");
    }
}

fn downcast<Svc: Send + Sync + 'static>(instance: AnyInstance) -> Arc<Svc> {
    instance
        .downcast()
        .expect("instantiated value is of the registered service type")
}

/// Scoped acquisition of a construction-stack entry. Pushing runs the cycle
/// and lifetime checks; the pop is guaranteed even when resolution fails
/// mid-construction.
struct StackFrame<'a> {
    stack: &'a Mutex<Vec<Descriptor>>,
}

impl<'a> StackFrame<'a> {
    fn push(
        stack: &'a Mutex<Vec<Descriptor>>,
        descriptor: Descriptor,
        requested: TypeInfo,
    ) -> Result<Self, ResolveError> {
        let mut guard = stack.lock();

        if guard.contains(&descriptor) {
            let err = ResolveError::CircularDependency {
                path: ResolutionPath(guard.iter().map(|visited| visited.implementation).collect()),
                requested,
            };
            error!("{}", err);
            return Err(err);
        }

        if let Some(dependent) = guard.last() {
            if descriptor.lifetime < dependent.lifetime {
                let err = ResolveError::IncompatibleScopes {
                    dependency: descriptor,
                    dependent: *dependent,
                };
                error!("{}", err);
                return Err(err);
            }
        }

        guard.push(descriptor);
        Ok(Self { stack })
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.stack.lock().pop();
    }
}
