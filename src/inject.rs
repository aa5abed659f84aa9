use alloc::{sync::Arc, vec, vec::Vec};

use crate::{
    dependency_resolver::DependencyResolver, errors::ResolveError, injectable::Parameter, scope::Scope,
};

/// Required dependency: the last-registered binding, resolved per its
/// registered lifetime. Fails with [`ResolveError::UnregisteredType`] when
/// nothing is registered for the type.
pub struct Inject<Dep>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    fn resolve(scope: &Scope) -> Result<Self, ResolveError> {
        scope.get_required().map(Self)
    }

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::typed::<Dep>()]
    }
}

/// Optional dependency: `None` when the type is not registered.
pub struct InjectOpt<Dep>(pub Option<Arc<Dep>>);

impl<Dep: Send + Sync + 'static> DependencyResolver for InjectOpt<Dep> {
    fn resolve(scope: &Scope) -> Result<Self, ResolveError> {
        scope.get().map(Self)
    }

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::optional::<Dep>()]
    }
}

/// Every binding registered for the type, in registration order.
pub struct InjectAll<Dep>(pub Vec<Arc<Dep>>);

impl<Dep: Send + Sync + 'static> DependencyResolver for InjectAll<Dep> {
    fn resolve(scope: &Scope) -> Result<Self, ResolveError> {
        scope.get_all().map(Self)
    }

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::optional::<Dep>()]
    }
}
