//! Service wiring.
//!
//! Builds every domain service over one collection store and hosts the
//! operations that span more than one collection.

use std::sync::Arc;

use models::user::{Role, User};
use tracing::instrument;

use crate::auth::SessionUser;
use crate::booking_service::BookingService;
use crate::contact_service::ContactService;
use crate::errors::ServiceError;
use crate::gallery_service::GalleryService;
use crate::package_service::PackageService;
use crate::stats::StatsService;
use crate::storage::CollectionStore;
use crate::user_service::UserService;

#[derive(Clone)]
pub struct Services {
    pub users: Arc<UserService>,
    pub packages: Arc<PackageService>,
    pub bookings: Arc<BookingService>,
    pub gallery: Arc<GalleryService>,
    pub contacts: Arc<ContactService>,
    pub stats: Arc<StatsService>,
}

impl Services {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        let users = Arc::new(UserService::new(Arc::clone(&store)));
        let packages = Arc::new(PackageService::new(Arc::clone(&store)));
        let bookings = Arc::new(BookingService::new(Arc::clone(&store), Arc::clone(&users), Arc::clone(&packages)));
        let gallery = Arc::new(GalleryService::new(Arc::clone(&store)));
        let contacts = Arc::new(ContactService::new(store));
        let stats = Arc::new(StatsService::new(
            Arc::clone(&bookings),
            Arc::clone(&packages),
            Arc::clone(&users),
            Arc::clone(&contacts),
        ));
        Self { users, packages, bookings, gallery, contacts, stats }
    }

    /// Change a user's role; a demoted team member leaves every booking team.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn change_role(&self, actor: &SessionUser, id: &str, role: Role) -> Result<User, ServiceError> {
        let updated = self.users.update_role(actor, id, role).await?;
        if updated.role != Role::Team {
            self.bookings.unassign_member(&updated.id).await?;
        }
        Ok(updated)
    }

    /// Delete an account and drop it from booking teams. Bookings it owns are kept.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_user(&self, actor: &SessionUser, id: &str) -> Result<User, ServiceError> {
        let removed = self.users.delete(actor, id).await?;
        if removed.role == Role::Team {
            self.bookings.unassign_member(&removed.id).await?;
        }
        Ok(removed)
    }
}
