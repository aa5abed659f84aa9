use alloc::sync::Arc;

use crate::any::AnyInstance;

/// Optional cleanup capability for cached instances.
///
/// Registered per service type with
/// [`crate::ContainerBuilder::add_disposable`]; disposal of the owning scope
/// invokes it exactly once per cached instance, in insertion order. Cleanup
/// that needs mutation goes through interior mutability.
pub trait Disposable {
    fn dispose(&self);
}

pub(crate) type ErasedDisposer = Arc<dyn Fn(AnyInstance) + Send + Sync>;

#[must_use]
pub(crate) fn erased_disposer<Svc>() -> ErasedDisposer
where
    Svc: Disposable + Send + Sync + 'static,
{
    Arc::new(|instance: AnyInstance| {
        instance
            .downcast::<Svc>()
            .expect("cached instance type matches its registration")
            .dispose();
    })
}
