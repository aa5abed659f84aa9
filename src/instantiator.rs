use alloc::sync::Arc;
use tracing::debug;

use crate::{
    any::AnyInstance,
    dependency_resolver::DependencyResolver,
    errors::{InstantiateError, ResolveError},
    registry::Descriptor,
    scope::Scope,
};

/// A factory producing one service. Implemented for closures whose
/// parameters are extractors ([`crate::Inject`] and friends) and which
/// return `Result<Provides, impl Into<InstantiateError>>`.
pub trait Factory<Deps>: Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateError>;

    fn invoke(&self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

/// A factory erased over its dependency tuple and provided type, invoked
/// against the scope that initiated resolution and the descriptor being
/// resolved.
pub(crate) type ErasedFactory =
    Arc<dyn Fn(&Scope, &Descriptor) -> Result<AnyInstance, ResolveError> + Send + Sync>;

#[must_use]
pub(crate) fn boxed_factory<F, Deps>(factory: F) -> ErasedFactory
where
    F: Factory<Deps>,
    Deps: DependencyResolver,
{
    Arc::new(move |scope, _| {
        let dependencies = Deps::resolve(scope)?;
        let dependency = factory
            .invoke(dependencies)
            .map_err(|err| ResolveError::Instantiate(err.into()))?;

        debug!("Instantiated");

        Ok(Arc::new(dependency) as AnyInstance)
    })
}

macro_rules! impl_factory {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Factory<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Result<Response, Err> + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            Err: Into<InstantiateError>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            fn invoke(&self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_factory);

/// Wraps a value created outside the container into a factory that clones it
/// on every instantiation.
#[inline]
#[must_use]
pub fn instance<T>(val: T) -> impl Factory<(), Provides = T, Error = InstantiateError>
where
    T: Clone + Send + Sync + 'static,
{
    move || Ok(val.clone())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::format;
    use core::sync::atomic::{AtomicU8, Ordering};

    use tracing_test::traced_test;

    use super::{boxed_factory, instance};
    use crate::{
        any::TypeInfo,
        errors::{InstantiateError, ResolveError},
        inject::Inject,
        lifetime::Lifetime,
        registry::{ContainerBuilder, Descriptor},
    };

    struct Request(bool);
    struct Response(bool);

    #[derive(Clone)]
    struct Preset(u8);

    fn transient_descriptor<T: 'static>() -> Descriptor {
        Descriptor {
            lifetime: Lifetime::Transient,
            service: TypeInfo::of::<T>(),
            implementation: TypeInfo::of::<T>(),
        }
    }

    #[test]
    #[traced_test]
    fn test_boxed_factory_resolves_dependencies() {
        let factory_call_count = Arc::new(AtomicU8::new(0));

        let container = ContainerBuilder::new()
            .add_singleton_factory(|| Ok::<_, InstantiateError>(Request(true)))
            .build();

        let erased = boxed_factory({
            let factory_call_count = factory_call_count.clone();
            move |Inject(request): Inject<Request>| {
                factory_call_count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, InstantiateError>(Response(request.0))
            }
        });

        let scope = container.create_scope();
        let descriptor = transient_descriptor::<Response>();
        let response_1 = (erased)(&scope, &descriptor).unwrap();
        let response_2 = (erased)(&scope, &descriptor).unwrap();

        assert!(response_1.downcast::<Response>().unwrap().0);
        assert!(response_2.downcast::<Response>().unwrap().0);
        assert_eq!(factory_call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn test_boxed_factory_propagates_missing_dependency() {
        let container = ContainerBuilder::new().build();
        let erased = boxed_factory(|Inject(request): Inject<Request>| {
            Ok::<_, InstantiateError>(Response(request.0))
        });

        let scope = container.create_scope();
        let descriptor = transient_descriptor::<Response>();
        assert!(matches!(
            (erased)(&scope, &descriptor),
            Err(ResolveError::UnregisteredType(_))
        ));
    }

    #[test]
    #[traced_test]
    fn test_instance_clones_preset_value() {
        let container = ContainerBuilder::new()
            .add_transient_factory(instance(Preset(7)))
            .build();

        let preset_1 = container.get_required::<Preset>().unwrap();
        let preset_2 = container.get_required::<Preset>().unwrap();

        assert_eq!(preset_1.0, 7);
        assert_eq!(preset_2.0, 7);
        assert!(!Arc::ptr_eq(&preset_1, &preset_2));
    }
}
