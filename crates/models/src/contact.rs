use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require_non_blank, ModelError};
use crate::record::new_id;
use crate::user::validate_email;

/// Enquiry left through the public contact form.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

crate::impl_record!(ContactMessage, "contacts", "contact message");

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    pub fn create(input: ContactInput) -> Result<ContactMessage, ModelError> {
        require_non_blank("name", &input.name)?;
        require_non_blank("message", &input.message)?;
        validate_email(&input.email)?;
        Ok(ContactMessage {
            id: new_id(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            event_date: input.event_date.filter(|d| !d.trim().is_empty()),
            message: input.message.trim().to_string(),
            read: false,
            created_at: Utc::now(),
            version: 0,
        })
    }
}
