use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require_non_blank, ModelError};
use crate::record::new_id;

/// 摄影/摄像套餐
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub popular: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

crate::impl_record!(Package, "packages", "package");

/// Create input; `id`/timestamps are generated server side.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackageInput {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub popular: bool,
}

/// Partial update; absent fields are left untouched.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackagePatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub deliverables: Option<Vec<String>>,
    pub preview: Option<String>,
    pub duration: Option<String>,
    pub popular: Option<bool>,
}

fn validate_price(price: f64) -> Result<(), ModelError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ModelError::validation("price must be a non-negative number"));
    }
    Ok(())
}

impl Package {
    pub fn create(input: PackageInput) -> Result<Package, ModelError> {
        require_non_blank("name", &input.name)?;
        validate_price(input.price)?;
        let now = Utc::now();
        Ok(Package {
            id: new_id(),
            name: input.name.trim().to_string(),
            price: input.price,
            description: input.description,
            deliverables: input.deliverables,
            preview: input.preview,
            duration: input.duration,
            popular: input.popular,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn apply(&mut self, patch: PackagePatch) -> Result<(), ModelError> {
        if let Some(name) = patch.name {
            require_non_blank("name", &name)?;
            self.name = name.trim().to_string();
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            self.price = price;
        }
        if let Some(v) = patch.description { self.description = v; }
        if let Some(v) = patch.deliverables { self.deliverables = v; }
        if let Some(v) = patch.preview { self.preview = v; }
        if let Some(v) = patch.duration { self.duration = v; }
        if let Some(v) = patch.popular { self.popular = v; }
        self.updated_at = Utc::now();
        Ok(())
    }
}
