use std::sync::Arc;

use models::gallery::{GalleryInput, GalleryItem, MediaType};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::auth::SessionUser;
use crate::authz::{self, Action, Resource};
use crate::errors::ServiceError;
use crate::storage::{CollectionStore, KeyedCollection};

/// Public gallery filters; all optional and combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryQuery {
    #[serde(rename = "type")]
    pub media_type: Option<MediaType>,
    pub category: Option<String>,
    pub event_type: Option<String>,
}

impl GalleryQuery {
    fn matches(&self, item: &GalleryItem) -> bool {
        self.media_type.map_or(true, |t| item.media_type == t)
            && self.category.as_deref().map_or(true, |c| item.category.eq_ignore_ascii_case(c))
            && self.event_type.as_deref().map_or(true, |e| item.event_type.eq_ignore_ascii_case(e))
    }
}

pub struct GalleryService {
    items: KeyedCollection<GalleryItem>,
}

impl GalleryService {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { items: KeyedCollection::new(store) }
    }

    /// Newest first.
    pub async fn list(&self, query: &GalleryQuery) -> Result<Vec<GalleryItem>, ServiceError> {
        let mut items: Vec<GalleryItem> = self.items.all().await?.into_iter().filter(|i| query.matches(i)).collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub async fn create(&self, actor: &SessionUser, input: GalleryInput) -> Result<GalleryItem, ServiceError> {
        authz::authorize(actor.role, Resource::Gallery, Action::Create)?;
        let item = self.items.insert(GalleryItem::create(input)?).await?;
        info!(item_id = %item.id, event = "gallery_item_created", "gallery item created");
        Ok(item)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &SessionUser, id: &str) -> Result<(), ServiceError> {
        authz::authorize(actor.role, Resource::Gallery, Action::Delete)?;
        self.items.remove(id).await?;
        info!(item_id = %id, event = "gallery_item_deleted", "gallery item deleted");
        Ok(())
    }
}
