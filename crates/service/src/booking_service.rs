//! Booking lifecycle.
//!
//! Ownership, pricing and status rules for bookings. Scoping comes from
//! [`authz::authorize`]; status changes go through the
//! [`BookingStatus`] transition table.

use std::sync::Arc;

use chrono::Utc;
use models::booking::{normalize_team, validate_amounts, Booking, BookingDraft, BookingStatus, MISSING_FIELDS};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::auth::SessionUser;
use crate::authz::{self, Action, Resource, Scope};
use crate::errors::ServiceError;
use crate::package_service::PackageService;
use crate::storage::{CollectionStore, KeyedCollection};
use crate::user_service::UserService;

/// Create request body. Fields default to empty so missing ones are reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub package_id: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub paid_amount: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update. `version` is the version the client last read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub assigned_team: Option<Vec<String>>,
    pub total_amount: Option<f64>,
    pub paid_amount: Option<f64>,
    pub notes: Option<String>,
    pub version: Option<u64>,
}

impl BookingPatch {
    fn touches_more_than_status(&self) -> bool {
        self.assigned_team.is_some() || self.total_amount.is_some() || self.paid_amount.is_some() || self.notes.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub assigned_to: Option<String>,
    pub user_id: Option<String>,
}

fn in_scope(scope: Scope, actor: &SessionUser, b: &Booking) -> bool {
    match scope {
        Scope::All => true,
        Scope::Own => b.user_id == actor.id,
        Scope::Assigned => b.is_assigned_to(&actor.id),
    }
}

pub struct BookingService {
    bookings: KeyedCollection<Booking>,
    users: Arc<UserService>,
    packages: Arc<PackageService>,
}

impl BookingService {
    pub fn new(store: Arc<dyn CollectionStore>, users: Arc<UserService>, packages: Arc<PackageService>) -> Self {
        Self { bookings: KeyedCollection::new(store), users, packages }
    }

    /// Customers always book for themselves at the package price; admins may
    /// book on behalf of a user and override the amounts.
    #[instrument(skip(self, actor, input), fields(actor = %actor.id, role = %actor.role))]
    pub async fn create(&self, actor: &SessionUser, input: NewBooking) -> Result<Booking, ServiceError> {
        let scope = authz::authorize(actor.role, Resource::Booking, Action::Create)?;

        let mut draft = BookingDraft {
            user_id: actor.id.clone(),
            package_id: input.package_id,
            event_type: input.event_type,
            event_name: input.event_name,
            date: input.date,
            venue: input.venue,
            total_amount: 0.0,
            paid_amount: 0.0,
            notes: input.notes,
        };
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            warn!(missing = %missing.join(","), event = "booking_rejected", "booking request incomplete");
            return Err(ServiceError::Validation(MISSING_FIELDS.into()));
        }

        // 套餐不存在时按 0 计价
        let package_price = self.packages.find(draft.package_id.trim()).await?.map_or(0.0, |p| p.price);

        match scope {
            Scope::All => {
                if let Some(user_id) = input.user_id.filter(|u| !u.trim().is_empty()) {
                    if user_id != actor.id && self.users.find(&user_id).await?.is_none() {
                        return Err(ServiceError::Validation(format!("unknown user: {user_id}")));
                    }
                    draft.user_id = user_id;
                }
                draft.total_amount = input.total_amount.unwrap_or(package_price);
                draft.paid_amount = input.paid_amount.unwrap_or(0.0);
            }
            _ => draft.total_amount = package_price,
        }

        let booking = self.bookings.insert(Booking::create(draft)?).await?;
        info!(
            booking_id = %booking.id,
            user_id = %booking.user_id,
            package_id = %booking.package_id,
            event = "booking_created",
            "booking created"
        );
        Ok(booking)
    }

    /// Bookings visible to `actor`, newest first.
    pub async fn list(&self, actor: &SessionUser, query: &BookingQuery) -> Result<Vec<Booking>, ServiceError> {
        let scope = authz::authorize(actor.role, Resource::Booking, Action::List)?;
        if query.user_id.is_some() && scope != Scope::All {
            return Err(ServiceError::forbidden());
        }
        let mut items: Vec<Booking> = self
            .bookings
            .all()
            .await?
            .into_iter()
            .filter(|b| in_scope(scope, actor, b))
            .filter(|b| query.status.map_or(true, |s| b.status == s))
            .filter(|b| query.assigned_to.as_deref().map_or(true, |m| b.is_assigned_to(m)))
            .filter(|b| query.user_id.as_deref().map_or(true, |u| b.user_id == u))
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    pub async fn get(&self, actor: &SessionUser, id: &str) -> Result<Booking, ServiceError> {
        let scope = authz::authorize(actor.role, Resource::Booking, Action::Read)?;
        let booking = self.bookings.require(id).await?;
        if !in_scope(scope, actor, &booking) {
            return Err(ServiceError::forbidden());
        }
        Ok(booking)
    }

    #[instrument(skip(self, actor, patch), fields(actor = %actor.id, role = %actor.role))]
    pub async fn patch(&self, actor: &SessionUser, id: &str, patch: BookingPatch) -> Result<Booking, ServiceError> {
        let scope = authz::authorize(actor.role, Resource::Booking, Action::Update)?;
        if scope == Scope::Assigned {
            if patch.touches_more_than_status() {
                return Err(ServiceError::forbidden());
            }
            // 未分配的预约对团队成员不可见，先于版本检查拒绝
            let current = self.bookings.require(id).await?;
            if !current.is_assigned_to(&actor.id) {
                return Err(ServiceError::forbidden());
            }
        }

        // 在预约写锁内校验成员，与并发的角色变更串行
        let users = Arc::clone(&self.users);
        let requested_team = patch.assigned_team.clone().map(normalize_team);
        let check_team = async move {
            if let Some(ids) = &requested_team {
                users.ensure_team_members(ids).await?;
            }
            Ok::<_, ServiceError>(requested_team)
        };

        let mut previous_status = None;
        let updated = self
            .bookings
            .update_with(id, patch.version, check_team, |b, team| {
                if !in_scope(scope, actor, b) {
                    return Err(ServiceError::forbidden());
                }
                if let Some(next) = patch.status {
                    if scope == Scope::Assigned
                        && next != b.status
                        && !matches!(next, BookingStatus::InProgress | BookingStatus::Completed)
                    {
                        return Err(ServiceError::forbidden());
                    }
                    if !b.status.can_transition_to(next) {
                        return Err(ServiceError::Conflict(format!(
                            "Illegal status transition: {} -> {}",
                            b.status, next
                        )));
                    }
                    if next != b.status {
                        previous_status = Some(b.status);
                    }
                    b.status = next;
                }
                let total = patch.total_amount.unwrap_or(b.total_amount);
                let paid = patch.paid_amount.unwrap_or(b.paid_amount);
                validate_amounts(total, paid)?;
                b.total_amount = total;
                b.paid_amount = paid;
                if let Some(ids) = team {
                    b.assigned_team = ids;
                }
                if let Some(notes) = patch.notes {
                    b.notes = Some(notes).filter(|n| !n.trim().is_empty());
                }
                b.updated_at = Some(Utc::now());
                Ok(())
            })
            .await?;

        if let Some(from) = previous_status {
            info!(booking_id = %updated.id, %from, to = %updated.status, event = "booking_status_changed", "booking status changed");
        }
        info!(booking_id = %updated.id, version = updated.version, event = "booking_updated", "booking updated");
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &SessionUser, id: &str) -> Result<(), ServiceError> {
        authz::authorize(actor.role, Resource::Booking, Action::Delete)?;
        self.bookings.remove(id).await?;
        info!(booking_id = %id, event = "booking_deleted", "booking deleted");
        Ok(())
    }

    /// Drop `member_id` from every booking team. Returns how many bookings changed.
    pub async fn unassign_member(&self, member_id: &str) -> Result<usize, ServiceError> {
        let changed = self
            .bookings
            .update_where(|b| {
                if !b.is_assigned_to(member_id) {
                    return false;
                }
                b.assigned_team.retain(|m| m != member_id);
                b.updated_at = Some(Utc::now());
                true
            })
            .await?;
        if changed > 0 {
            warn!(%member_id, changed, event = "team_member_unassigned", "member removed from booking teams");
        }
        Ok(changed)
    }

    /// Every booking, unscoped. Only for aggregate reporting.
    pub(crate) async fn snapshot(&self) -> Result<Vec<Booking>, ServiceError> {
        self.bookings.all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCollectionStore;
    use crate::test_support::{fixture, fixture_on, Fixture};
    use async_trait::async_trait;
    use models::package::PackageInput;
    use models::user::Role;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;
    use BookingStatus::*;

    /// Memory store that, once armed, parks the next `users` read until a
    /// `users` write has landed. The parked reader keeps its stale copy.
    #[derive(Default)]
    struct ParkedUsersRead {
        inner: MemoryCollectionStore,
        armed: AtomicBool,
        waiting: AtomicBool,
        parked: Notify,
        users_written: Notify,
    }

    #[async_trait]
    impl CollectionStore for ParkedUsersRead {
        async fn get_collection(&self, name: &str) -> Result<Vec<Value>, ServiceError> {
            let items = self.inner.get_collection(name).await?;
            if name == "users" && self.armed.swap(false, Ordering::SeqCst) {
                self.waiting.store(true, Ordering::SeqCst);
                self.parked.notify_one();
                self.users_written.notified().await;
            }
            Ok(items)
        }

        async fn save_collection(&self, name: &str, items: Vec<Value>) -> Result<(), ServiceError> {
            self.inner.save_collection(name, items).await?;
            if name == "users" && self.waiting.swap(false, Ordering::SeqCst) {
                self.users_written.notify_one();
            }
            Ok(())
        }
    }

    fn request(package_id: &str) -> NewBooking {
        NewBooking {
            package_id: package_id.into(),
            event_type: "Wedding".into(),
            event_name: "A & B".into(),
            date: "2025-01-01".into(),
            venue: "Hall".into(),
            ..Default::default()
        }
    }

    async fn priced_package(fx: &Fixture, price: f64) -> Result<String, anyhow::Error> {
        let p = fx
            .services
            .packages
            .create(&fx.admin, PackageInput { name: "Gold".into(), price, ..Default::default() })
            .await?;
        Ok(p.id)
    }

    fn status(s: BookingStatus) -> BookingPatch {
        BookingPatch { status: Some(s), ..Default::default() }
    }

    #[tokio::test]
    async fn customer_create_forces_owner_and_pricing() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.bookings;
        let pkg = priced_package(&fx, 2500.0).await?;

        let mut req = request(&pkg);
        req.user_id = Some(fx.other_customer.id.clone());
        req.total_amount = Some(1.0);
        req.paid_amount = Some(1.0);
        let b = svc.create(&fx.customer, req).await?;
        assert_eq!(b.user_id, fx.customer.id);
        assert_eq!(b.total_amount, 2500.0);
        assert_eq!(b.paid_amount, 0.0);
        assert_eq!(b.status, Pending);

        // 不存在的套餐按 0 计价
        let b = svc.create(&fx.customer, request("pkg-1")).await?;
        assert_eq!(b.total_amount, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn admin_create_on_behalf_and_team_is_denied() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.bookings;
        let mut req = request("pkg-1");
        req.user_id = Some(fx.customer.id.clone());
        req.total_amount = Some(4000.0);
        req.paid_amount = Some(1000.0);
        let b = svc.create(&fx.admin, req).await?;
        assert_eq!(b.user_id, fx.customer.id);
        assert_eq!(b.balance_due(), 3000.0);

        let mut req = request("pkg-1");
        req.user_id = Some("ghost".into());
        assert!(matches!(svc.create(&fx.admin, req).await, Err(ServiceError::Validation(_))));

        assert!(matches!(svc.create(&fx.team, request("pkg-1")).await, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_use_fixed_message() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let req = NewBooking { package_id: "p".into(), ..Default::default() };
        match fx.services.bookings.create(&fx.customer, req).await {
            Err(ServiceError::Validation(msg)) => assert_eq!(msg, MISSING_FIELDS),
            other => panic!("unexpected: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn lifecycle_follows_transition_table() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.bookings;
        let b = svc.create(&fx.customer, request("pkg-1")).await?;

        assert!(matches!(svc.patch(&fx.admin, &b.id, status(Completed)).await, Err(ServiceError::Conflict(_))));
        svc.patch(&fx.admin, &b.id, status(Approved)).await?;
        svc.patch(&fx.admin, &b.id, status(Approved)).await?;
        svc.patch(&fx.admin, &b.id, status(InProgress)).await?;
        svc.patch(&fx.admin, &b.id, status(Completed)).await?;
        assert_eq!(svc.get(&fx.customer, &b.id).await?.status, Completed);

        assert!(matches!(svc.patch(&fx.admin, &b.id, status(Pending)).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(svc.patch(&fx.admin, &b.id, status(Rejected)).await, Err(ServiceError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn team_patches_only_assigned_status() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.bookings;
        let b = svc.create(&fx.customer, request("pkg-1")).await?;
        let assign = BookingPatch { assigned_team: Some(vec![fx.team.id.clone()]), ..status(Approved) };
        svc.patch(&fx.admin, &b.id, assign).await?;

        assert!(matches!(svc.patch(&fx.other_team, &b.id, status(InProgress)).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(svc.patch(&fx.team, &b.id, status(Rejected)).await, Err(ServiceError::Forbidden(_))));
        let notes = BookingPatch { notes: Some("x".into()), ..Default::default() };
        assert!(matches!(svc.patch(&fx.team, &b.id, notes).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(svc.patch(&fx.customer, &b.id, status(Rejected)).await, Err(ServiceError::Forbidden(_))));

        let moved = svc.patch(&fx.team, &b.id, status(InProgress)).await?;
        assert_eq!(moved.status, InProgress);
        let done = svc.patch(&fx.team, &b.id, status(Completed)).await?;
        assert_eq!(done.status, Completed);
        Ok(())
    }

    #[tokio::test]
    async fn amounts_team_and_versions_are_checked() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.bookings;
        let pkg = priced_package(&fx, 1000.0).await?;
        let b = svc.create(&fx.customer, request(&pkg)).await?;

        let overpaid = BookingPatch { paid_amount: Some(1500.0), ..Default::default() };
        assert!(matches!(svc.patch(&fx.admin, &b.id, overpaid).await, Err(ServiceError::Model(_))));

        let not_team = BookingPatch { assigned_team: Some(vec![fx.customer.id.clone()]), ..Default::default() };
        assert!(matches!(svc.patch(&fx.admin, &b.id, not_team).await, Err(ServiceError::Validation(_))));

        let paid = BookingPatch { paid_amount: Some(400.0), version: Some(b.version), ..Default::default() };
        let after = svc.patch(&fx.admin, &b.id, paid).await?;
        assert_eq!(after.paid_amount, 400.0);
        assert_eq!(after.version, b.version + 1);

        let stale = BookingPatch { notes: Some("late".into()), version: Some(b.version), ..Default::default() };
        assert!(matches!(svc.patch(&fx.admin, &b.id, stale).await, Err(ServiceError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn listing_is_scoped_and_filterable() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.bookings;
        let mine = svc.create(&fx.customer, request("pkg-1")).await?;
        let theirs = svc.create(&fx.other_customer, request("pkg-1")).await?;
        let both = svc.create(&fx.other_customer, request("pkg-1")).await?;
        let team = BookingPatch { assigned_team: Some(vec![fx.team.id.clone()]), ..Default::default() };
        svc.patch(&fx.admin, &theirs.id, team).await?;
        let team = BookingPatch { assigned_team: Some(vec![fx.team.id.clone(), fx.other_team.id.clone()]), ..Default::default() };
        svc.patch(&fx.admin, &both.id, team).await?;

        assert_eq!(svc.list(&fx.admin, &BookingQuery::default()).await?.len(), 3);
        let own = svc.list(&fx.customer, &BookingQuery::default()).await?;
        assert_eq!(own.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), vec![mine.id.as_str()]);
        assert_eq!(svc.list(&fx.team, &BookingQuery::default()).await?.len(), 2);
        assert_eq!(svc.list(&fx.other_team, &BookingQuery::default()).await?.len(), 1);

        let q = BookingQuery { assigned_to: Some(fx.other_team.id.clone()), ..Default::default() };
        let ids: Vec<String> = svc.list(&fx.admin, &q).await?.into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![both.id.clone()]);

        let q = BookingQuery { user_id: Some(fx.other_customer.id.clone()), ..Default::default() };
        assert_eq!(svc.list(&fx.admin, &q).await?.len(), 2);
        assert!(svc.list(&fx.customer, &q).await.is_err());

        assert!(matches!(svc.get(&fx.customer, &theirs.id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(svc.get(&fx.other_team, &theirs.id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(svc.get(&fx.admin, "missing").await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unassign_and_delete() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.bookings;
        let b = svc.create(&fx.customer, request("pkg-1")).await?;
        let team = BookingPatch { assigned_team: Some(vec![fx.team.id.clone(), fx.other_team.id.clone()]), ..Default::default() };
        svc.patch(&fx.admin, &b.id, team).await?;

        assert_eq!(svc.unassign_member(&fx.team.id).await?, 1);
        assert_eq!(svc.get(&fx.admin, &b.id).await?.assigned_team, vec![fx.other_team.id.clone()]);
        assert_eq!(svc.unassign_member(&fx.team.id).await?, 0);

        assert!(matches!(svc.delete(&fx.customer, &b.id).await, Err(ServiceError::Forbidden(_))));
        svc.delete(&fx.admin, &b.id).await?;
        assert!(matches!(svc.delete(&fx.admin, &b.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn demotion_during_assignment_leaves_no_stale_member() -> Result<(), anyhow::Error> {
        let store = Arc::new(ParkedUsersRead::default());
        let fx = fixture_on(store.clone()).await?;
        let s = &fx.services;
        let b = s.bookings.create(&fx.customer, request("pkg-1")).await?;

        store.armed.store(true, Ordering::SeqCst);
        let assign = BookingPatch { assigned_team: Some(vec![fx.team.id.clone()]), ..Default::default() };
        let patching = s.bookings.patch(&fx.admin, &b.id, assign);
        let demoting = async {
            store.parked.notified().await;
            s.change_role(&fx.admin, &fx.team.id, Role::Customer).await
        };
        let (patched, demoted) = tokio::join!(patching, demoting);
        patched?;
        assert_eq!(demoted?.role, Role::Customer);

        // 降级在写入之后完成摘除
        assert!(s.bookings.get(&fx.admin, &b.id).await?.assigned_team.is_empty());
        Ok(())
    }
}
