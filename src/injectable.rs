use alloc::vec::Vec;

use crate::{any::TypeInfo, dependency_resolver::DependencyResolver, errors::InstantiateError};

/// One declared constructor parameter of an implementation type.
///
/// Parameters derived from [`DependencyResolver::parameters`] always carry
/// type information. Hand-authored lists (e.g. describing a constructor
/// defined outside this crate) may use [`Parameter::untyped`]; the resolver
/// rejects such entries with [`crate::ResolveError::UnannotatedParameter`].
#[derive(Debug, Clone, Copy)]
pub struct Parameter {
    pub name: &'static str,
    pub ty: Option<TypeInfo>,
    pub required: bool,
}

impl Parameter {
    #[inline]
    #[must_use]
    pub fn typed<T: 'static>() -> Self {
        let ty = TypeInfo::of::<T>();
        Self {
            name: ty.short_name(),
            ty: Some(ty),
            required: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn optional<T: 'static>() -> Self {
        Self {
            required: false,
            ..Self::typed::<T>()
        }
    }

    #[inline]
    #[must_use]
    pub const fn untyped(name: &'static str) -> Self {
        Self {
            name,
            ty: None,
            required: true,
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

/// A type the default resolver knows how to construct: its dependencies are
/// declared as extractor parameters and gathered recursively at resolution.
///
/// ```rust
/// use wirebox::{Inject, Injectable, InstantiateError};
/// use std::sync::Arc;
///
/// struct Pool;
///
/// impl Injectable for Pool {
///     type Deps = ();
///
///     fn construct((): Self::Deps) -> Result<Self, InstantiateError> {
///         Ok(Self)
///     }
/// }
///
/// struct UserRepo {
///     pool: Arc<Pool>,
/// }
///
/// impl Injectable for UserRepo {
///     type Deps = (Inject<Pool>,);
///
///     fn construct((Inject(pool),): Self::Deps) -> Result<Self, InstantiateError> {
///         Ok(Self { pool })
///     }
/// }
/// ```
pub trait Injectable: Sized + 'static {
    type Deps: DependencyResolver;

    fn construct(deps: Self::Deps) -> Result<Self, InstantiateError>;

    /// Declared parameter list used for the pre-resolution lifetime check.
    /// Override only to describe a constructor whose parameters are not
    /// expressible as `Deps` (names are purely diagnostic).
    #[must_use]
    fn parameters() -> Vec<Parameter> {
        Self::Deps::parameters()
    }
}
