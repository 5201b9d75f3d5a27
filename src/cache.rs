use crate::{
    key::{KeyHasher, ResourceKey},
    producer::{Producer, ResourceReqs},
    resource::LazyResource,
};
use anyhow::{Context as _, Result};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
};
use tokio::runtime::Handle;

/// Case-insensitive map from keys to lazily loaded resources.
///
/// At most one resource exists per normalized key. Entries are never evicted;
/// they live as long as the cache does.
pub struct ResourceCache<T: ResourceReqs> {
    values: RwLock<HashMap<ResourceKey, Arc<LazyResource<T>>, KeyHasher>>,
    runtime: Handle,
}

impl<T: ResourceReqs> ResourceCache<T> {
    /// Creates a cache whose operations run on the current tokio runtime.
    pub fn new() -> Result<Self> {
        let runtime = Handle::try_current()
            .context("A resource cache must be created inside a tokio runtime")?;
        Ok(Self::with_runtime(runtime))
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        Self::with_hasher(runtime, KeyHasher::default())
    }

    pub fn with_hasher(runtime: Handle, hasher: KeyHasher) -> Self {
        Self {
            values: RwLock::new(HashMap::with_hasher(hasher)),
            runtime,
        }
    }

    /// Returns the resource for `key`, creating it on a miss.
    ///
    /// `create_fn` receives the normalized key and is only called when no
    /// resource exists for it yet. It runs while the cache is locked against
    /// other creators; plain lookups from inside it are fine, but creating or
    /// replacing entries in the same cache is not.
    pub fn get_or_create<F, Fut>(&self, key: impl Into<ResourceKey>, create_fn: F) -> Arc<LazyResource<T>>
    where
        F: FnOnce(&ResourceKey) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key.into();

        let values = self.values.upgradable_read();
        if let Some(existing) = values.get(&key) {
            return existing.clone();
        }

        // Only one upgradable reader exists at a time, so the key stays vacant
        // until the insert below.
        let operation = create_fn(&key);
        log::debug!("Creating resource for `{}`", key);
        let res = LazyResource::new(key.clone(), operation, self.runtime.clone());

        // Lock mutably instead.
        RwLockUpgradableReadGuard::upgrade(values).insert(key, res.clone());
        res
    }

    /// Like [`get_or_create`](Self::get_or_create), with values coming from a
    /// [`Producer`].
    pub fn get_or_fetch<P>(&self, key: impl Into<ResourceKey>, producer: &Arc<P>) -> Arc<LazyResource<T>>
    where
        P: Producer<Output = T>,
    {
        self.get_or_create(key, |key| {
            let producer = producer.clone();
            let key = key.clone();
            log::trace!("Fetching `{}` with {}", key, producer.debug_name());
            async move { producer.produce(&key).await }
        })
    }

    /// Installs a fresh resource for `key`, discarding any cached outcome.
    ///
    /// Readers holding the previous resource keep it; only later lookups see
    /// the replacement.
    pub fn replace<F, Fut>(&self, key: impl Into<ResourceKey>, create_fn: F) -> Arc<LazyResource<T>>
    where
        F: FnOnce(&ResourceKey) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key.into();
        let operation = create_fn(&key);
        let res = LazyResource::new(key.clone(), operation, self.runtime.clone());

        if self.values.write().insert(key, res.clone()).is_some() {
            log::debug!("Replaced resource for `{}`", res.key());
        }

        res
    }

    pub fn remove(&self, key: impl Into<ResourceKey>) -> Option<Arc<LazyResource<T>>> {
        self.values.write().remove(&key.into())
    }

    pub fn get(&self, key: impl Into<ResourceKey>) -> Option<Arc<LazyResource<T>>> {
        self.values.read().get(&key.into()).cloned()
    }

    pub fn contains(&self, key: impl Into<ResourceKey>) -> bool {
        self.values.read().contains_key(&key.into())
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        self.values.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}
