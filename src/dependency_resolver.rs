use alloc::vec::Vec;

use crate::{errors::ResolveError, injectable::Parameter, scope::Scope};

/// Anything the engine can hand to a factory as one argument position:
/// the extractors in [`crate::inject`] and tuples of them.
pub trait DependencyResolver: Sized {
    fn resolve(scope: &Scope) -> Result<Self, ResolveError>;

    /// The parameters this position contributes to the declared dependency
    /// list of its consumer.
    #[must_use]
    fn parameters() -> Vec<Parameter>;
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            #[inline]
            fn resolve(scope: &Scope) -> Result<Self, ResolveError> {
                Ok(($($ty::resolve(scope)?,)*))
            }

            fn parameters() -> Vec<Parameter> {
                let mut parameters = Vec::new();
                $( parameters.extend($ty::parameters()); )*
                parameters
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);

#[cfg(test)]
mod tests {
    extern crate std;

    use core::sync::atomic::{AtomicU8, Ordering};

    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::format;
    use tracing_test::traced_test;

    use super::DependencyResolver;
    use crate::{
        errors::InstantiateError,
        inject::{Inject, InjectOpt},
        instantiator::instance,
        registry::ContainerBuilder,
    };

    struct Request;

    #[derive(Clone)]
    struct Settings;

    #[test]
    #[allow(dead_code)]
    fn test_dependency_resolver_impls() {
        fn resolver<T: DependencyResolver>() {}
        fn resolver_with_dep<Dep: Send + Sync + 'static>() {
            resolver::<Inject<Dep>>();
            resolver::<InjectOpt<Dep>>();
            resolver::<(Inject<Dep>, InjectOpt<Dep>)>();
        }
    }

    #[test]
    #[traced_test]
    fn test_tuple_resolve_shares_cached_instances() {
        let factory_call_count = Arc::new(AtomicU8::new(0));

        let container = ContainerBuilder::new()
            .add_singleton_factory({
                let factory_call_count = factory_call_count.clone();
                move || {
                    factory_call_count.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, InstantiateError>(Request)
                }
            })
            .add_singleton_factory(instance(Settings))
            .build();

        let scope = container.create_scope();
        let (Inject(request_1), Inject(request_2), Inject(_settings)) =
            <(Inject<Request>, Inject<Request>, Inject<Settings>)>::resolve(&scope).unwrap();

        assert!(Arc::ptr_eq(&request_1, &request_2));
        assert_eq!(factory_call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tuple_parameters_concatenate() {
        let parameters = <(Inject<Request>, InjectOpt<Settings>)>::parameters();

        assert_eq!(parameters.len(), 2);
        assert!(parameters[0].required);
        assert!(!parameters[1].required);
    }
}
