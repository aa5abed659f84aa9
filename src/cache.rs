use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::{any::TypeId, mem};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    any::{AnyInstance, ServiceId},
    errors::ResolveError,
};

pub(crate) type CacheKey = (ServiceId, TypeId);

/// Per-scope store of already-built instances.
///
/// Each key owns a construction slot with its own lock, so the first build
/// of a key is serialized: concurrent resolvers of one singleton block until
/// the winner has stored the instance, and the factory runs exactly once.
/// Slot locks are taken in dependency order during recursive resolution,
/// which cannot deadlock on an acyclic graph.
///
/// Keys are logged in completion order; [`Self::drain`] yields instances in
/// that insertion order exactly once.
pub(crate) struct InstanceCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    slots: BTreeMap<CacheKey, Arc<Slot>>,
    order: Vec<CacheKey>,
    disposed: bool,
}

#[derive(Default)]
struct Slot {
    cell: Mutex<Option<AnyInstance>>,
}

impl InstanceCache {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                slots: BTreeMap::new(),
                order: Vec::new(),
                disposed: false,
            }),
        }
    }

    pub(crate) fn get_or_build(
        &self,
        key: CacheKey,
        build: impl FnOnce() -> Result<AnyInstance, ResolveError>,
    ) -> Result<AnyInstance, ResolveError> {
        let slot = {
            let mut inner = self.inner.lock();
            if inner.disposed {
                return Err(ResolveError::ScopeDisposed);
            }
            inner.slots.entry(key).or_default().clone()
        };

        let mut cell = slot.cell.lock();
        if let Some(instance) = &*cell {
            debug!("Found in cache");
            return Ok(instance.clone());
        }

        let instance = build()?;
        *cell = Some(instance.clone());

        let mut inner = self.inner.lock();
        if !inner.disposed {
            inner.order.push(key);
        }

        Ok(instance)
    }

    /// Takes every cached instance in insertion order and marks the cache
    /// disposed. A second call yields nothing.
    #[must_use]
    pub(crate) fn drain(&self) -> Vec<(CacheKey, AnyInstance)> {
        let (slots, order) = {
            let mut inner = self.inner.lock();
            if inner.disposed {
                return Vec::new();
            }
            inner.disposed = true;
            (mem::take(&mut inner.slots), mem::take(&mut inner.order))
        };

        order
            .into_iter()
            .filter_map(|key| {
                slots
                    .get(&key)
                    .and_then(|slot| slot.cell.lock().take())
                    .map(|instance| (key, instance))
            })
            .collect()
    }
}
