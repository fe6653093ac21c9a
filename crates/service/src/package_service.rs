use std::cmp::Ordering;
use std::sync::Arc;

use models::package::{Package, PackageInput, PackagePatch};
use tracing::{info, instrument};

use crate::auth::SessionUser;
use crate::authz::{self, Action, Resource};
use crate::errors::ServiceError;
use crate::storage::{CollectionStore, KeyedCollection};

/// Package catalog. Reads are public, writes are admin-only.
pub struct PackageService {
    packages: KeyedCollection<Package>,
}

/// Popular packages first, then cheapest first.
fn catalog_order(a: &Package, b: &Package) -> Ordering {
    b.popular
        .cmp(&a.popular)
        .then(a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal))
        .then_with(|| a.name.cmp(&b.name))
}

impl PackageService {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { packages: KeyedCollection::new(store) }
    }

    /// Public catalog listing.
    pub async fn list(&self) -> Result<Vec<Package>, ServiceError> {
        let mut items = self.packages.all().await?;
        items.sort_by(catalog_order);
        Ok(items)
    }

    pub async fn get(&self, id: &str) -> Result<Package, ServiceError> {
        self.packages.require(id).await
    }

    /// Unscoped lookup used for booking pricing.
    pub async fn find(&self, id: &str) -> Result<Option<Package>, ServiceError> {
        self.packages.get(id).await
    }

    pub async fn count(&self) -> Result<usize, ServiceError> {
        Ok(self.packages.all().await?.len())
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub async fn create(&self, actor: &SessionUser, input: PackageInput) -> Result<Package, ServiceError> {
        authz::authorize(actor.role, Resource::Package, Action::Create)?;
        let created = self.packages.insert(Package::create(input)?).await?;
        info!(package_id = %created.id, event = "package_created", "package created");
        Ok(created)
    }

    #[instrument(skip(self, actor, patch), fields(actor = %actor.id))]
    pub async fn update(
        &self,
        actor: &SessionUser,
        id: &str,
        patch: PackagePatch,
        expected_version: Option<u64>,
    ) -> Result<Package, ServiceError> {
        authz::authorize(actor.role, Resource::Package, Action::Update)?;
        let updated = self
            .packages
            .update(id, expected_version, |p| p.apply(patch).map_err(ServiceError::from))
            .await?;
        info!(package_id = %updated.id, version = updated.version, event = "package_updated", "package updated");
        Ok(updated)
    }

    /// Bookings keep their `packageId` after the package is gone.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &SessionUser, id: &str) -> Result<(), ServiceError> {
        authz::authorize(actor.role, Resource::Package, Action::Delete)?;
        self.packages.remove(id).await?;
        info!(package_id = %id, event = "package_deleted", "package deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;

    fn input(name: &str, price: f64, popular: bool) -> PackageInput {
        PackageInput { name: name.into(), price, popular, ..Default::default() }
    }

    #[tokio::test]
    async fn catalog_lists_popular_then_by_price() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.packages;
        svc.create(&fx.admin, input("Gold", 3000.0, false)).await?;
        svc.create(&fx.admin, input("Bronze", 900.0, false)).await?;
        svc.create(&fx.admin, input("Signature", 5000.0, true)).await?;

        let names: Vec<String> = svc.list().await?.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Signature", "Bronze", "Gold"]);
        Ok(())
    }

    #[tokio::test]
    async fn writes_are_admin_only() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.packages;
        assert!(matches!(svc.create(&fx.customer, input("X", 1.0, false)).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(svc.create(&fx.team, input("X", 1.0, false)).await, Err(ServiceError::Forbidden(_))));

        let p = svc.create(&fx.admin, input("Silver", 1500.0, false)).await?;
        let patch = PackagePatch { price: Some(1600.0), ..Default::default() };
        assert!(svc.update(&fx.customer, &p.id, patch.clone(), None).await.is_err());
        let updated = svc.update(&fx.admin, &p.id, patch, Some(p.version)).await?;
        assert_eq!(updated.price, 1600.0);

        let stale = svc.update(&fx.admin, &p.id, PackagePatch::default(), Some(p.version)).await;
        assert!(matches!(stale, Err(ServiceError::Conflict(_))));

        svc.delete(&fx.admin, &p.id).await?;
        assert!(matches!(svc.get(&p.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(&fx.admin, &p.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let res = fx.services.packages.create(&fx.admin, input(" ", 10.0, false)).await;
        assert!(matches!(res, Err(ServiceError::Model(_))));
        let res = fx.services.packages.create(&fx.admin, input("Neg", -1.0, false)).await;
        assert!(matches!(res, Err(ServiceError::Model(_))));
        Ok(())
    }
}
