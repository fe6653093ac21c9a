use std::sync::Arc;

use models::booking::BookingStatus;
use models::user::Role;
use serde::Serialize;

use crate::auth::SessionUser;
use crate::authz::{self, Action, Resource};
use crate::booking_service::BookingService;
use crate::contact_service::ContactService;
use crate::errors::ServiceError;
use crate::package_service::PackageService;
use crate::user_service::UserService;

/// Admin dashboard summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_bookings: usize,
    pub pending_bookings: usize,
    pub active_bookings: usize,
    pub completed_bookings: usize,
    /// Sum of `paidAmount` over all bookings.
    pub total_revenue: f64,
    /// Sum of `totalAmount - paidAmount` over bookings that were not rejected.
    pub outstanding_balance: f64,
    pub packages: usize,
    pub customers: usize,
    pub team_members: usize,
    pub unread_messages: usize,
}

pub struct StatsService {
    bookings: Arc<BookingService>,
    packages: Arc<PackageService>,
    users: Arc<UserService>,
    contacts: Arc<ContactService>,
}

impl StatsService {
    pub fn new(
        bookings: Arc<BookingService>,
        packages: Arc<PackageService>,
        users: Arc<UserService>,
        contacts: Arc<ContactService>,
    ) -> Self {
        Self { bookings, packages, users, contacts }
    }

    pub async fn summary(&self, actor: &SessionUser) -> Result<DashboardStats, ServiceError> {
        authz::authorize(actor.role, Resource::Stats, Action::Read)?;
        let bookings = self.bookings.snapshot().await?;
        let count = |s: BookingStatus| bookings.iter().filter(|b| b.status == s).count();

        Ok(DashboardStats {
            total_bookings: bookings.len(),
            pending_bookings: count(BookingStatus::Pending),
            active_bookings: bookings.iter().filter(|b| b.status.is_active()).count(),
            completed_bookings: count(BookingStatus::Completed),
            total_revenue: bookings.iter().map(|b| b.paid_amount).sum(),
            outstanding_balance: bookings
                .iter()
                .filter(|b| b.status != BookingStatus::Rejected)
                .map(|b| b.balance_due())
                .sum(),
            packages: self.packages.count().await?,
            customers: self.users.count_by_role(Role::Customer).await?,
            team_members: self.users.count_by_role(Role::Team).await?,
            unread_messages: self.contacts.unread_count().await?,
        })
    }
}
