#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod container;
pub(crate) mod dependency_resolver;
pub(crate) mod disposal;
pub(crate) mod errors;
pub(crate) mod inject;
pub(crate) mod injectable;
pub(crate) mod instantiator;
pub(crate) mod integrations;
pub(crate) mod lifetime;
pub(crate) mod registry;
pub(crate) mod resolver;
pub(crate) mod scope;

pub use any::{ServiceId, TypeInfo};
pub use container::Container;
pub use dependency_resolver::DependencyResolver;
pub use disposal::Disposable;
pub use errors::{InstantiateError, ResolutionPath, ResolveError};
pub use inject::{Inject, InjectAll, InjectOpt};
pub use injectable::{Injectable, Parameter};
pub use instantiator::{instance, Factory};
pub use lifetime::Lifetime;
pub use registry::{ContainerBuilder, Descriptor};
pub use scope::Scope;

#[cfg(feature = "axum")]
pub use integrations::axum;
