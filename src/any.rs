use alloc::sync::Arc;
use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
};

/// Erased identity of a Rust type: its [`TypeId`] plus the name used in
/// diagnostics. Equality and ordering consider only the id.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

/// Identity a service is registered and resolved under: the requested type
/// plus an optional discriminator key. Equality is structural, so two keyed
/// registrations of one type are distinct identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServiceId {
    pub ty: TypeInfo,
    pub key: Option<&'static str>,
}

impl ServiceId {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            ty: TypeInfo::of::<T>(),
            key: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn keyed<T>(key: &'static str) -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            ty: TypeInfo::of::<T>(),
            key: Some(key),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn from_type(ty: TypeInfo) -> Self {
        Self { ty, key: None }
    }
}

/// Shared handle to a constructed instance, erased to the service type.
pub(crate) type AnyInstance = Arc<dyn Any + Send + Sync>;
