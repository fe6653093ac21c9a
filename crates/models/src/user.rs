use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::new_id;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
    Team,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
            Role::Team => "team",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            "team" => Ok(Role::Team),
            other => Err(ModelError::Validation(format!("unknown role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_profile: Option<TeamProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_profile: Option<CustomerProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

crate::impl_record!(User, "users", "user");

/// Profile edits a user may make on their own account (or an admin on theirs).
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub team_profile: Option<TeamProfile>,
    pub customer_profile: Option<CustomerProfile>,
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ModelError::validation("invalid email")),
    }
}

/// 邮箱统一小写，作为登录匹配键
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    pub fn new(email: &str, name: Option<String>, image: Option<String>, role: Role) -> Result<User, ModelError> {
        validate_email(email)?;
        let now = Utc::now();
        Ok(User {
            id: new_id(),
            email: normalize_email(email),
            name: name.filter(|n| !n.trim().is_empty()),
            image,
            role,
            team_profile: None,
            customer_profile: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    pub fn apply_profile(&mut self, patch: ProfilePatch) -> Result<(), ModelError> {
        if patch.team_profile.is_some() && self.role != Role::Team {
            return Err(ModelError::validation("teamProfile is only valid for team members"));
        }
        if patch.customer_profile.is_some() && self.role != Role::Customer {
            return Err(ModelError::validation("customerProfile is only valid for customers"));
        }
        if let Some(name) = patch.name { self.name = Some(name).filter(|n| !n.trim().is_empty()); }
        if let Some(image) = patch.image { self.image = Some(image).filter(|i| !i.trim().is_empty()); }
        if let Some(p) = patch.team_profile { self.team_profile = Some(p); }
        if let Some(p) = patch.customer_profile { self.customer_profile = Some(p); }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Switch role; profile data of the old role is kept but ignored.
    pub fn set_role(&mut self, role: Role) {
        if role == Role::Team && self.team_profile.is_none() {
            self.team_profile = Some(TeamProfile::default());
        }
        self.role = role;
        self.updated_at = Utc::now();
    }
}
