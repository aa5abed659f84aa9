use alloc::sync::Arc;
use tracing::debug;

use crate::{
    any::{AnyInstance, ServiceId},
    dependency_resolver::DependencyResolver,
    errors::ResolveError,
    injectable::{Injectable, Parameter},
    instantiator::ErasedFactory,
    registry::Descriptor,
    scope::Scope,
};

/// Builds the default construction strategy for one `(service, implementation)`
/// binding: validate the declared parameter list, resolve the dependencies
/// through the initiating scope, construct the implementation and coerce it
/// into the service type.
#[must_use]
pub(crate) fn default_factory<Svc, Impl>() -> ErasedFactory
where
    Svc: Send + Sync + 'static,
    Impl: Injectable + Into<Svc>,
{
    Arc::new(move |scope, descriptor| {
        check_parameters(scope, descriptor, &Impl::parameters())?;

        let dependencies = <Impl::Deps as DependencyResolver>::resolve(scope)?;
        let implementation = Impl::construct(dependencies).map_err(ResolveError::Instantiate)?;

        debug!("Constructed");

        Ok(Arc::new(Into::<Svc>::into(implementation)) as AnyInstance)
    })
}

/// Walks the declared parameter list before any dependency is constructed.
/// The lifetime check here runs against the *registered descriptor* of the
/// declared dependency type, catching an incompatible capture even before
/// recursive resolution would surface it.
fn check_parameters(
    scope: &Scope,
    dependent: &Descriptor,
    parameters: &[Parameter],
) -> Result<(), ResolveError> {
    for parameter in parameters {
        let Some(ty) = parameter.ty else {
            return Err(ResolveError::UnannotatedParameter {
                name: parameter.name,
                implementation: dependent.implementation,
            });
        };

        match scope.registry().descriptor(&ServiceId::from_type(ty)) {
            Some(dependency) => {
                if dependency.lifetime < dependent.lifetime {
                    return Err(ResolveError::IncompatibleScopes {
                        dependency: *dependency,
                        dependent: *dependent,
                    });
                }
            }
            None if parameter.required => return Err(ResolveError::UnregisteredType(ty)),
            None => {}
        }
    }

    Ok(())
}
