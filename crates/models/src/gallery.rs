use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require_non_blank, ModelError};
use crate::record::new_id;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

crate::impl_record!(GalleryItem, "gallery", "gallery item");

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryInput {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub event_type: String,
}

impl GalleryItem {
    pub fn create(input: GalleryInput) -> Result<GalleryItem, ModelError> {
        require_non_blank("url", &input.url)?;
        require_non_blank("title", &input.title)?;
        Ok(GalleryItem {
            id: new_id(),
            media_type: input.media_type,
            url: input.url.trim().to_string(),
            thumbnail: input.thumbnail.filter(|t| !t.trim().is_empty()),
            title: input.title.trim().to_string(),
            category: input.category,
            event_type: input.event_type,
            created_at: Utc::now(),
            version: 0,
        })
    }
}
