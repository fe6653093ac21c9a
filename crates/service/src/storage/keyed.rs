use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use models::Record;
use tokio::sync::Mutex;

use crate::errors::ServiceError;
use crate::storage::collection_store::{load, save, CollectionStore};

/// Typed, keyed view over one collection of a [`CollectionStore`].
///
/// Every read-modify-write cycle runs under a per-collection mutex, so two
/// requests in this process can no longer overwrite each other's changes.
/// Records carry a `version`; callers that pass the version they last saw get
/// a `Conflict` instead of silently clobbering a newer write.
pub struct KeyedCollection<T> {
    store: Arc<dyn CollectionStore>,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> KeyedCollection<T> {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store, write_lock: Mutex::new(()), _marker: PhantomData }
    }

    async fn load(&self) -> Result<Vec<T>, ServiceError> {
        load(self.store.as_ref(), T::COLLECTION).await
    }

    async fn save(&self, items: &[T]) -> Result<(), ServiceError> {
        save(self.store.as_ref(), T::COLLECTION, items).await
    }

    /// All records in stored order.
    pub async fn all(&self) -> Result<Vec<T>, ServiceError> {
        self.load().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.load().await?.into_iter().find(|r| r.id() == id))
    }

    /// Like [`get`](Self::get) but a missing record is `NotFound`.
    pub async fn require(&self, id: &str) -> Result<T, ServiceError> {
        self.get(id).await?.ok_or_else(|| ServiceError::not_found(T::ENTITY))
    }

    /// Append a new record at version 1.
    pub async fn insert(&self, mut record: T) -> Result<T, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        if items.iter().any(|r| r.id() == record.id()) {
            return Err(ServiceError::Conflict(format!("{} {} already exists", T::ENTITY, record.id())));
        }
        record.set_version(1);
        items.push(record.clone());
        self.save(&items).await?;
        Ok(record)
    }

    /// Mutate one record in place and bump its version.
    ///
    /// `expected_version` is the version the caller last read; `None` skips the check.
    /// If `f` fails nothing is written.
    pub async fn update<F>(&self, id: &str, expected_version: Option<u64>, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut T) -> Result<(), ServiceError>,
    {
        self.update_with(id, expected_version, async { Ok::<(), ServiceError>(()) }, |record, ()| f(record)).await
    }

    /// Like [`update`](Self::update), with a `prepare` step awaited under the write lock
    /// after the version check. Its output is handed to `f`.
    ///
    /// Writers that also take this lock run either before `prepare` or after the write,
    /// so cross-collection checks done in `prepare` stay valid for the write.
    pub async fn update_with<V, Fut, F>(
        &self,
        id: &str,
        expected_version: Option<u64>,
        prepare: Fut,
        f: F,
    ) -> Result<T, ServiceError>
    where
        Fut: Future<Output = Result<V, ServiceError>>,
        F: FnOnce(&mut T, V) -> Result<(), ServiceError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        let idx = items
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| ServiceError::not_found(T::ENTITY))?;

        let current = items[idx].version();
        if let Some(expected) = expected_version {
            if expected != current {
                return Err(ServiceError::Conflict(format!(
                    "{} was modified by someone else (version {current}, expected {expected})",
                    T::ENTITY
                )));
            }
        }

        let prepared = prepare.await?;
        let mut updated = items[idx].clone();
        f(&mut updated, prepared)?;
        updated.set_version(current + 1);
        items[idx] = updated.clone();
        self.save(&items).await?;
        Ok(updated)
    }

    /// Apply `f` to every record; records for which it returns `true` get a new version.
    /// Returns how many records changed. Nothing is written when none did.
    pub async fn update_where<F>(&self, mut f: F) -> Result<usize, ServiceError>
    where
        F: FnMut(&mut T) -> bool,
    {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        let mut changed = 0;
        for item in items.iter_mut() {
            if f(item) {
                let v = item.version();
                item.set_version(v + 1);
                changed += 1;
            }
        }
        if changed > 0 {
            self.save(&items).await?;
        }
        Ok(changed)
    }

    /// Run `f` against the whole collection under the write lock and persist the result.
    /// Used for operations that need to see every record, such as upsert-by-field.
    pub async fn with_items<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, ServiceError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        let out = f(&mut items)?;
        self.save(&items).await?;
        Ok(out)
    }

    /// Remove a record after `guard` approves it; returns the removed record.
    pub async fn remove_with<F>(&self, id: &str, guard: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&T) -> Result<(), ServiceError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        let idx = items
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| ServiceError::not_found(T::ENTITY))?;
        guard(&items[idx])?;
        let removed = items.remove(idx);
        self.save(&items).await?;
        Ok(removed)
    }

    /// Unconditional remove; a missing record is `NotFound`.
    pub async fn remove(&self, id: &str) -> Result<T, ServiceError> {
        self.remove_with(id, |_| Ok(())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCollectionStore;
    use models::package::{Package, PackageInput};

    fn collection() -> Arc<KeyedCollection<Package>> {
        Arc::new(KeyedCollection::new(Arc::new(MemoryCollectionStore::new())))
    }

    fn package(name: &str) -> Package {
        Package::create(PackageInput { name: name.into(), price: 100.0, ..Default::default() }).unwrap()
    }

    #[tokio::test]
    async fn keyed_crud_with_versions() -> Result<(), anyhow::Error> {
        let col = collection();
        let p = col.insert(package("Silver")).await?;
        assert_eq!(p.version, 1);
        assert!(matches!(col.insert(p.clone()).await, Err(ServiceError::Conflict(_))));

        let updated = col.update(&p.id, Some(1), |pkg| { pkg.price = 150.0; Ok(()) }).await?;
        assert_eq!(updated.version, 2);
        assert_eq!(col.require(&p.id).await?.price, 150.0);

        // 过期版本号 -> Conflict，且不写入
        let stale = col.update(&p.id, Some(1), |pkg| { pkg.price = 1.0; Ok(()) }).await;
        assert!(matches!(stale, Err(ServiceError::Conflict(_))));
        assert_eq!(col.require(&p.id).await?.price, 150.0);

        // 闭包失败也不写入
        let failed = col
            .update(&p.id, None, |pkg| { pkg.price = 9.0; Err(ServiceError::Validation("no".into())) })
            .await;
        assert!(failed.is_err());
        assert_eq!(col.require(&p.id).await?.version, 2);

        assert_eq!(col.remove(&p.id).await?.id, p.id);
        assert!(matches!(col.remove(&p.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(col.require(&p.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_updates_do_not_lose_writes() -> Result<(), anyhow::Error> {
        let col = collection();
        let p = col.insert(package("Counter")).await?;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let col = Arc::clone(&col);
            let id = p.id.clone();
            handles.push(tokio::spawn(async move {
                col.update(&id, None, |pkg| { pkg.price += 1.0; Ok(()) }).await
            }));
        }
        for h in handles {
            h.await??;
        }
        let after = col.require(&p.id).await?;
        assert_eq!(after.price, 120.0);
        assert_eq!(after.version, 21);
        Ok(())
    }

    #[tokio::test]
    async fn update_where_and_guarded_remove() -> Result<(), anyhow::Error> {
        let col = collection();
        let a = col.insert(package("A")).await?;
        let b = col.insert(package("B")).await?;

        let changed = col.update_where(|p| { if p.name == "A" { p.popular = true; true } else { false } }).await?;
        assert_eq!(changed, 1);
        assert_eq!(col.require(&a.id).await?.version, 2);
        assert_eq!(col.require(&b.id).await?.version, 1);

        let denied = col.remove_with(&b.id, |_| Err(ServiceError::forbidden())).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
        assert_eq!(col.all().await?.len(), 2);

        let removed = col.remove_with(&b.id, |_| Ok(())).await?;
        assert_eq!(removed.name, "B");
        assert_eq!(col.all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_with_prepares_after_version_check() -> Result<(), anyhow::Error> {
        let col = collection();
        let p = col.insert(package("Gold")).await?;
        let prepared = std::sync::atomic::AtomicBool::new(false);

        let stale = col
            .update_with(&p.id, Some(7), async { prepared.store(true, std::sync::atomic::Ordering::SeqCst); Ok::<_, ServiceError>(1.0) }, |pkg, bump| {
                pkg.price += bump;
                Ok(())
            })
            .await;
        assert!(matches!(stale, Err(ServiceError::Conflict(_))));
        assert!(!prepared.load(std::sync::atomic::Ordering::SeqCst));

        let updated = col.update_with(&p.id, Some(1), async { Ok::<_, ServiceError>(25.0) }, |pkg, bump| { pkg.price += bump; Ok(()) }).await?;
        assert_eq!(updated.price, 125.0);

        // prepare 失败则不写入
        let failed = col
            .update_with(&p.id, None, async { Err::<f64, _>(ServiceError::Validation("no".into())) }, |pkg, bump| {
                pkg.price += bump;
                Ok(())
            })
            .await;
        assert!(matches!(failed, Err(ServiceError::Validation(_))));
        assert_eq!(col.require(&p.id).await?.version, 2);
        Ok(())
    }
}
