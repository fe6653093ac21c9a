use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::new_id;

/// Error body for a create request lacking any required field.
pub const MISSING_FIELDS: &str = "Missing required fields";

/// 预约状态
///
/// ```text
/// pending     -> approved | rejected
/// approved    -> in-progress | rejected
/// in-progress -> completed | rejected
/// completed, rejected: terminal
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Approved,
    InProgress,
    Completed,
    Rejected,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Rejected => "rejected",
        }
    }

    /// Statuses reachable in one step.
    pub fn next_states(&self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Pending => &[Approved, Rejected],
            Approved => &[InProgress, Rejected],
            InProgress => &[Completed, Rejected],
            Completed | Rejected => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// Re-applying the current status is accepted as a no-op.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        *self == next || self.next_states().contains(&next)
    }

    /// Booking still occupies the studio calendar.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Approved | BookingStatus::InProgress)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ModelError::Validation(format!("unknown booking status: {s}")))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub package_id: String,
    pub event_type: String,
    pub event_name: String,
    pub date: String,
    pub venue: String,
    pub status: BookingStatus,
    pub total_amount: f64,
    pub paid_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_team: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u64,
}

crate::impl_record!(Booking, "bookings", "booking");

/// Resolved values for a new booking. Ownership and pricing are decided by the caller.
#[derive(Clone, Debug, Default)]
pub struct BookingDraft {
    pub user_id: String,
    pub package_id: String,
    pub event_type: String,
    pub event_name: String,
    pub date: String,
    pub venue: String,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub notes: Option<String>,
}

impl BookingDraft {
    /// Names of required fields that are missing or blank, in wire form.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("packageId", &self.package_id),
            ("eventType", &self.event_type),
            ("eventName", &self.event_name),
            ("date", &self.date),
            ("venue", &self.venue),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

impl Booking {
    /// Build a `pending` booking from a draft.
    pub fn create(draft: BookingDraft) -> Result<Booking, ModelError> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(ModelError::validation(MISSING_FIELDS));
        }
        if draft.user_id.trim().is_empty() {
            return Err(ModelError::validation("userId is required"));
        }
        validate_amounts(draft.total_amount, draft.paid_amount)?;
        Ok(Booking {
            id: new_id(),
            user_id: draft.user_id,
            package_id: draft.package_id.trim().to_string(),
            event_type: draft.event_type.trim().to_string(),
            event_name: draft.event_name.trim().to_string(),
            date: draft.date.trim().to_string(),
            venue: draft.venue.trim().to_string(),
            status: BookingStatus::Pending,
            total_amount: draft.total_amount,
            paid_amount: draft.paid_amount,
            notes: draft.notes.filter(|n| !n.trim().is_empty()),
            assigned_team: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
        })
    }

    pub fn is_assigned_to(&self, member_id: &str) -> bool {
        self.assigned_team.iter().any(|m| m == member_id)
    }

    pub fn balance_due(&self) -> f64 {
        (self.total_amount - self.paid_amount).max(0.0)
    }

    /// Move to `next` if the transition table allows it.
    pub fn transition_to(&mut self, next: BookingStatus) -> Result<(), ModelError> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::Validation(format!(
                "illegal status transition: {} -> {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// `0 <= paid <= total`, both finite.
pub fn validate_amounts(total: f64, paid: f64) -> Result<(), ModelError> {
    if !total.is_finite() || !paid.is_finite() {
        return Err(ModelError::validation("amounts must be finite numbers"));
    }
    if total < 0.0 || paid < 0.0 {
        return Err(ModelError::validation("amounts must not be negative"));
    }
    if paid > total {
        return Err(ModelError::validation("paidAmount must not exceed totalAmount"));
    }
    Ok(())
}

/// Drop duplicates and blanks, keeping first-seen order.
pub fn normalize_team(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim().to_string();
        if !id.is_empty() && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
