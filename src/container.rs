use alloc::{sync::Arc, vec::Vec};

use crate::{errors::ResolveError, registry::Registry, scope::Scope};

/// The built container: owner of the frozen registry and the root scope.
///
/// The root scope's cache holds every singleton; [`Self::dispose`] drains it
/// and runs the registered cleanup hooks. Handles are cheap to clone and the
/// resolution contract is the same as [`Scope`]'s, delegated to the root.
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
    root: Scope,
}

impl Container {
    #[must_use]
    pub(crate) fn new(registry: Registry) -> Self {
        let registry = Arc::new(registry);
        Self {
            root: Scope::root(registry.clone()),
            registry,
        }
    }

    #[must_use]
    pub(crate) fn from_parts(registry: Arc<Registry>, root: Scope) -> Self {
        Self { registry, root }
    }

    /// Resolves the last-registered binding of `Svc` from the root scope,
    /// or `None` when the type was never registered.
    pub fn get<Svc: Send + Sync + 'static>(&self) -> Result<Option<Arc<Svc>>, ResolveError> {
        self.root.get()
    }

    /// As [`Self::get`], but an unregistered type is an error.
    pub fn get_required<Svc: Send + Sync + 'static>(&self) -> Result<Arc<Svc>, ResolveError> {
        self.root.get_required()
    }

    /// Resolves every binding of `Svc`, in registration order.
    pub fn get_all<Svc: Send + Sync + 'static>(&self) -> Result<Vec<Arc<Svc>>, ResolveError> {
        self.root.get_all()
    }

    #[must_use]
    pub fn is_registered<Svc: ?Sized + 'static>(&self) -> bool {
        self.root.is_registered::<Svc>()
    }

    /// Creates a child scope for one logical unit of work. The caller owns
    /// its disposal; dropping the last handle disposes it as well.
    #[must_use]
    pub fn create_scope(&self) -> Scope {
        self.root.create_scope()
    }

    /// Disposes the root scope: every cached singleton's cleanup hook runs
    /// exactly once, in insertion order. Idempotent. Child scopes dispose
    /// their own caches independently.
    pub fn dispose(&self) {
        self.root.dispose();
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::format;
    use core::sync::atomic::{AtomicU8, Ordering};

    use tracing_test::traced_test;

    use super::Container;
    use crate::{
        disposal::Disposable, errors::InstantiateError, registry::ContainerBuilder,
    };

    struct Conn {
        disposed: Arc<AtomicU8>,
    }

    impl Disposable for Conn {
        fn dispose(&self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn conn_container(disposed: &Arc<AtomicU8>, singleton: bool) -> Container {
        let disposed = disposed.clone();
        let factory = move || {
            Ok::<_, InstantiateError>(Conn {
                disposed: disposed.clone(),
            })
        };
        let builder = ContainerBuilder::new();
        let builder = if singleton {
            builder.add_singleton_factory(factory)
        } else {
            builder.add_scoped_factory(factory)
        };
        builder.add_disposable::<Conn>().build()
    }

    #[test]
    #[traced_test]
    fn test_scope_disposal_runs_hook_exactly_once() {
        let disposed = Arc::new(AtomicU8::new(0));
        let container = conn_container(&disposed, false);

        let scope = container.create_scope();
        let _ = scope.get_required::<Conn>().unwrap();

        scope.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);

        scope.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_scope_drop_disposes() {
        let disposed = Arc::new(AtomicU8::new(0));
        let container = conn_container(&disposed, false);

        {
            let scope = container.create_scope();
            let _ = scope.get_required::<Conn>().unwrap();
        }

        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_container_disposal_cascades_to_singletons_once() {
        let disposed = Arc::new(AtomicU8::new(0));
        let container = conn_container(&disposed, true);

        for _ in 0..3 {
            let scope = container.create_scope();
            let _ = scope.get_required::<Conn>().unwrap();
            scope.dispose();
        }
        // child scope disposal must not touch the singleton
        assert_eq!(disposed.load(Ordering::SeqCst), 0);

        container.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);

        container.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_transient_is_never_disposed() {
        let disposed = Arc::new(AtomicU8::new(0));
        let container = {
            let disposed = disposed.clone();
            ContainerBuilder::new()
                .add_transient_factory(move || {
                    Ok::<_, InstantiateError>(Conn {
                        disposed: disposed.clone(),
                    })
                })
                .add_disposable::<Conn>()
                .build()
        };

        let scope = container.create_scope();
        let _ = scope.get_required::<Conn>().unwrap();
        scope.dispose();
        container.dispose();

        assert_eq!(disposed.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[traced_test]
    fn test_disposal_in_insertion_order() {
        use alloc::vec::Vec;
        use parking_lot::Mutex;

        struct Tagged {
            tag: &'static str,
            log: Arc<Mutex<Vec<&'static str>>>,
        }

        impl Disposable for Tagged {
            fn dispose(&self) {
                self.log.lock().push(self.tag);
            }
        }

        struct First(Tagged);
        struct Second(Tagged);

        impl Disposable for First {
            fn dispose(&self) {
                self.0.dispose();
            }
        }

        impl Disposable for Second {
            fn dispose(&self) {
                self.0.dispose();
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let container = {
            let log_1 = log.clone();
            let log_2 = log.clone();
            ContainerBuilder::new()
                .add_scoped_factory(move || {
                    Ok::<_, InstantiateError>(First(Tagged {
                        tag: "first",
                        log: log_1.clone(),
                    }))
                })
                .add_scoped_factory(move || {
                    Ok::<_, InstantiateError>(Second(Tagged {
                        tag: "second",
                        log: log_2.clone(),
                    }))
                })
                .add_disposable::<First>()
                .add_disposable::<Second>()
                .build()
        };

        let scope = container.create_scope();
        let _ = scope.get_required::<Second>().unwrap();
        let _ = scope.get_required::<First>().unwrap();
        scope.dispose();

        assert_eq!(*log.lock(), ["second", "first"]);
    }
}
