use alloc::boxed::Box;
use core::fmt::{self, Display, Formatter};

use crate::{any::TypeInfo, registry::Descriptor};

/// Failure of a user-supplied factory or [`crate::Injectable`] constructor.
#[derive(Debug, thiserror::Error)]
pub enum InstantiateError {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

/// The chain of implementations under construction when a resolution failed,
/// outermost consumer first.
#[derive(Debug, Clone)]
pub struct ResolutionPath(pub Box<[TypeInfo]>);

impl Display for ResolutionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for ty in &self.0 {
            if !first {
                write!(f, " -> ")?;
            }
            write!(f, "{}", ty.short_name())?;
            first = false;
        }
        Ok(())
    }
}

/// Errors raised by resolution. All of them are registration-time design
/// defects surfaced at first use; none is retryable.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("type '{}' was not registered", .0.name)]
    UnregisteredType(TypeInfo),

    #[error(
        "can't inject service '{}' with {} lifetime into service '{}' with {} lifetime",
        dependency.service.name,
        dependency.lifetime,
        dependent.service.name,
        dependent.lifetime
    )]
    IncompatibleScopes {
        dependency: Descriptor,
        dependent: Descriptor,
    },

    #[error("cannot resolve parameter '{name}' of '{}': missing type information", implementation.name)]
    UnannotatedParameter {
        name: &'static str,
        implementation: TypeInfo,
    },

    #[error("circular dependency detected: {path} -> {}", requested.short_name())]
    CircularDependency {
        path: ResolutionPath,
        requested: TypeInfo,
    },

    #[error("scope is already disposed")]
    ScopeDisposed,

    #[error(transparent)]
    Instantiate(#[from] InstantiateError),
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::{boxed::Box, format};

    use super::{ResolutionPath, ResolveError};
    use crate::{any::TypeInfo, lifetime::Lifetime, registry::Descriptor};

    struct Mailer;
    struct Outbox;

    #[test]
    fn test_circular_display_contains_full_path() {
        let err = ResolveError::CircularDependency {
            path: ResolutionPath(Box::new([TypeInfo::of::<Mailer>(), TypeInfo::of::<Outbox>()])),
            requested: TypeInfo::of::<Mailer>(),
        };
        assert_eq!(
            format!("{err}"),
            "circular dependency detected: Mailer -> Outbox -> Mailer"
        );
    }

    #[test]
    fn test_incompatible_scopes_display() {
        let err = ResolveError::IncompatibleScopes {
            dependency: Descriptor {
                lifetime: Lifetime::Scoped,
                service: TypeInfo::of::<Outbox>(),
                implementation: TypeInfo::of::<Outbox>(),
            },
            dependent: Descriptor {
                lifetime: Lifetime::Singleton,
                service: TypeInfo::of::<Mailer>(),
                implementation: TypeInfo::of::<Mailer>(),
            },
        };
        let rendered = format!("{err}");
        assert!(rendered.contains("scoped"));
        assert!(rendered.contains("singleton"));
    }
}
