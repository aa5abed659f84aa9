use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::any::TypeId;

use crate::{
    any::{AnyInstance, ServiceId, TypeInfo},
    container::Container,
    dependency_resolver::DependencyResolver,
    disposal::{erased_disposer, Disposable, ErasedDisposer},
    injectable::Injectable,
    instantiator::{boxed_factory, ErasedFactory, Factory},
    lifetime::Lifetime,
    resolver::default_factory,
    scope::Scope,
};

/// One registration: how a service identity is implemented and for how long
/// the built instance lives. Structural equality is what the cycle check
/// relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub lifetime: Lifetime,
    pub service: TypeInfo,
    pub implementation: TypeInfo,
}

/// An erased instantiation strategy for one binding.
#[derive(Clone)]
pub(crate) struct Provider {
    pub(crate) factory: ErasedFactory,
    /// The container's own scope-factory binding hands out a fresh handle
    /// instead of caching one; a cached handle would keep its own scope
    /// alive through the cache.
    pub(crate) cache_provides: bool,
}

/// Frozen registration state. Populated only by [`ContainerBuilder`];
/// resolution never mutates it.
pub(crate) struct Registry {
    descriptors: BTreeMap<ServiceId, Vec<Descriptor>>,
    overrides: BTreeMap<(ServiceId, TypeId), Provider>,
    defaults: BTreeMap<(ServiceId, TypeId), Provider>,
    disposers: BTreeMap<TypeId, ErasedDisposer>,
}

impl Registry {
    /// Last-registered descriptor for the identity, if any.
    #[inline]
    pub(crate) fn descriptor(&self, id: &ServiceId) -> Option<&Descriptor> {
        self.descriptors.get(id).and_then(|descriptors| descriptors.last())
    }

    /// Every descriptor registered for the identity, in registration order.
    #[inline]
    pub(crate) fn descriptors(&self, id: &ServiceId) -> &[Descriptor] {
        self.descriptors.get(id).map_or(&[], Vec::as_slice)
    }

    #[inline]
    pub(crate) fn is_registered(&self, id: &ServiceId) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Instantiation strategy for one binding: a custom factory override if
    /// one was registered, else the default constructor entry.
    #[inline]
    pub(crate) fn provider(&self, id: &ServiceId, implementation: TypeId) -> Option<&Provider> {
        let key = (*id, implementation);
        self.overrides.get(&key).or_else(|| self.defaults.get(&key))
    }

    #[inline]
    pub(crate) fn disposer(&self, service: TypeId) -> Option<&ErasedDisposer> {
        self.disposers.get(&service)
    }
}

/// Fluent registration API. Each `add_*` call appends a [`Descriptor`] to
/// the ordered list for the service's identity; repeated calls for one
/// service type form a multi-binding where the last registration wins
/// single resolution and all of them are visible to [`Scope::get_all`].
///
/// No validation of the dependency graph happens here; every check is
/// deferred to first resolution.
pub struct ContainerBuilder {
    descriptors: BTreeMap<ServiceId, Vec<Descriptor>>,
    overrides: BTreeMap<(ServiceId, TypeId), Provider>,
    defaults: BTreeMap<(ServiceId, TypeId), Provider>,
    disposers: BTreeMap<TypeId, ErasedDisposer>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptors: BTreeMap::new(),
            overrides: BTreeMap::new(),
            defaults: BTreeMap::new(),
            disposers: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn add_singleton<Impl>(self) -> Self
    where
        Impl: Injectable + Send + Sync,
    {
        self.add_as::<Impl, Impl>(Lifetime::Singleton)
    }

    #[inline]
    #[must_use]
    pub fn add_scoped<Impl>(self) -> Self
    where
        Impl: Injectable + Send + Sync,
    {
        self.add_as::<Impl, Impl>(Lifetime::Scoped)
    }

    #[inline]
    #[must_use]
    pub fn add_transient<Impl>(self) -> Self
    where
        Impl: Injectable + Send + Sync,
    {
        self.add_as::<Impl, Impl>(Lifetime::Transient)
    }

    #[inline]
    #[must_use]
    pub fn add_singleton_as<Svc, Impl>(self) -> Self
    where
        Svc: Send + Sync + 'static,
        Impl: Injectable + Into<Svc>,
    {
        self.add_as::<Svc, Impl>(Lifetime::Singleton)
    }

    #[inline]
    #[must_use]
    pub fn add_scoped_as<Svc, Impl>(self) -> Self
    where
        Svc: Send + Sync + 'static,
        Impl: Injectable + Into<Svc>,
    {
        self.add_as::<Svc, Impl>(Lifetime::Scoped)
    }

    #[inline]
    #[must_use]
    pub fn add_transient_as<Svc, Impl>(self) -> Self
    where
        Svc: Send + Sync + 'static,
        Impl: Injectable + Into<Svc>,
    {
        self.add_as::<Svc, Impl>(Lifetime::Transient)
    }

    #[inline]
    #[must_use]
    pub fn add_singleton_factory<F, Deps>(self, factory: F) -> Self
    where
        F: Factory<Deps>,
        Deps: DependencyResolver,
    {
        self.add_factory_as::<F::Provides, F, Deps>(Lifetime::Singleton, factory)
    }

    #[inline]
    #[must_use]
    pub fn add_scoped_factory<F, Deps>(self, factory: F) -> Self
    where
        F: Factory<Deps>,
        Deps: DependencyResolver,
    {
        self.add_factory_as::<F::Provides, F, Deps>(Lifetime::Scoped, factory)
    }

    #[inline]
    #[must_use]
    pub fn add_transient_factory<F, Deps>(self, factory: F) -> Self
    where
        F: Factory<Deps>,
        Deps: DependencyResolver,
    {
        self.add_factory_as::<F::Provides, F, Deps>(Lifetime::Transient, factory)
    }

    /// Factory registration under an explicit implementation key, so several
    /// factory-backed bindings of one service type stay distinct.
    #[inline]
    #[must_use]
    pub fn add_singleton_factory_as<Impl, F, Deps>(self, factory: F) -> Self
    where
        Impl: 'static,
        F: Factory<Deps>,
        Deps: DependencyResolver,
    {
        self.add_factory_as::<Impl, F, Deps>(Lifetime::Singleton, factory)
    }

    #[inline]
    #[must_use]
    pub fn add_scoped_factory_as<Impl, F, Deps>(self, factory: F) -> Self
    where
        Impl: 'static,
        F: Factory<Deps>,
        Deps: DependencyResolver,
    {
        self.add_factory_as::<Impl, F, Deps>(Lifetime::Scoped, factory)
    }

    #[inline]
    #[must_use]
    pub fn add_transient_factory_as<Impl, F, Deps>(self, factory: F) -> Self
    where
        Impl: 'static,
        F: Factory<Deps>,
        Deps: DependencyResolver,
    {
        self.add_factory_as::<Impl, F, Deps>(Lifetime::Transient, factory)
    }

    /// Registers the [`Disposable`] capability for cached instances of
    /// `Svc`: disposal of the owning scope invokes `Svc::dispose` on each
    /// cached instance, in insertion order.
    ///
    /// Transient instances are never cached, so the capability never fires
    /// for them.
    #[inline]
    #[must_use]
    pub fn add_disposable<Svc>(mut self) -> Self
    where
        Svc: Disposable + Send + Sync + 'static,
    {
        self.disposers.insert(TypeId::of::<Svc>(), erased_disposer::<Svc>());
        self
    }

    /// Freezes the registrations into a [`Container`]. The container is
    /// self-registered under its own identity so resolved services can ask
    /// for the scope-creation capability.
    #[must_use]
    pub fn build(mut self) -> Container {
        let id = ServiceId::of::<Container>();
        let service = TypeInfo::of::<Container>();
        self.descriptors.entry(id).or_default().push(Descriptor {
            lifetime: Lifetime::Singleton,
            service,
            implementation: service,
        });
        self.overrides.insert(
            (id, service.id),
            Provider {
                factory: Arc::new(|scope: &Scope, _: &Descriptor| {
                    Ok(Arc::new(scope.container()) as AnyInstance)
                }),
                cache_provides: false,
            },
        );

        Container::new(Registry {
            descriptors: self.descriptors,
            overrides: self.overrides,
            defaults: self.defaults,
            disposers: self.disposers,
        })
    }

    fn add_as<Svc, Impl>(mut self, lifetime: Lifetime) -> Self
    where
        Svc: Send + Sync + 'static,
        Impl: Injectable + Into<Svc>,
    {
        let id = ServiceId::of::<Svc>();
        let descriptor = Descriptor {
            lifetime,
            service: TypeInfo::of::<Svc>(),
            implementation: TypeInfo::of::<Impl>(),
        };
        self.descriptors.entry(id).or_default().push(descriptor);
        self.defaults.insert(
            (id, TypeId::of::<Impl>()),
            Provider {
                factory: default_factory::<Svc, Impl>(),
                cache_provides: true,
            },
        );
        self
    }

    fn add_factory_as<Impl, F, Deps>(mut self, lifetime: Lifetime, factory: F) -> Self
    where
        Impl: 'static,
        F: Factory<Deps>,
        Deps: DependencyResolver,
    {
        let id = ServiceId::of::<F::Provides>();
        let descriptor = Descriptor {
            lifetime,
            service: TypeInfo::of::<F::Provides>(),
            implementation: TypeInfo::of::<Impl>(),
        };
        self.descriptors.entry(id).or_default().push(descriptor);
        self.overrides.insert(
            (id, TypeId::of::<Impl>()),
            Provider {
                factory: boxed_factory(factory),
                cache_provides: true,
            },
        );
        self
    }
}
