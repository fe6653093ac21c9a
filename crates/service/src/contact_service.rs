use std::sync::Arc;

use models::contact::{ContactInput, ContactMessage};
use tracing::{info, instrument};

use crate::auth::SessionUser;
use crate::authz::{self, Action, Resource};
use crate::errors::ServiceError;
use crate::storage::{CollectionStore, KeyedCollection};

/// Contact form inbox.
pub struct ContactService {
    messages: KeyedCollection<ContactMessage>,
}

impl ContactService {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { messages: KeyedCollection::new(store) }
    }

    /// Public submission; no session required.
    #[instrument(skip_all)]
    pub async fn submit(&self, input: ContactInput) -> Result<ContactMessage, ServiceError> {
        let msg = self.messages.insert(ContactMessage::create(input)?).await?;
        info!(message_id = %msg.id, event = "contact_received", "contact message received");
        Ok(msg)
    }

    /// Unread first, newest first within each group.
    pub async fn list(&self, actor: &SessionUser) -> Result<Vec<ContactMessage>, ServiceError> {
        authz::authorize(actor.role, Resource::Contact, Action::List)?;
        let mut items = self.messages.all().await?;
        items.sort_by(|a, b| a.read.cmp(&b.read).then(b.created_at.cmp(&a.created_at)));
        Ok(items)
    }

    pub async fn get(&self, actor: &SessionUser, id: &str) -> Result<ContactMessage, ServiceError> {
        authz::authorize(actor.role, Resource::Contact, Action::Read)?;
        self.messages.require(id).await
    }

    pub async fn set_read(&self, actor: &SessionUser, id: &str, read: bool) -> Result<ContactMessage, ServiceError> {
        authz::authorize(actor.role, Resource::Contact, Action::Update)?;
        self.messages
            .update(id, None, |m| {
                m.read = read;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &SessionUser, id: &str) -> Result<(), ServiceError> {
        authz::authorize(actor.role, Resource::Contact, Action::Delete)?;
        self.messages.remove(id).await?;
        info!(message_id = %id, event = "contact_deleted", "contact message deleted");
        Ok(())
    }

    pub async fn unread_count(&self) -> Result<usize, ServiceError> {
        Ok(self.messages.all().await?.iter().filter(|m| !m.read).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;

    fn input(name: &str) -> ContactInput {
        ContactInput {
            name: name.into(),
            email: format!("{name}@example.com"),
            message: "Do you cover destination weddings?".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn inbox_flow() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.contacts;
        let first = svc.submit(input("ana")).await?;
        svc.submit(input("ben")).await?;
        assert_eq!(svc.unread_count().await?, 2);

        let read = svc.set_read(&fx.admin, &first.id, true).await?;
        assert!(read.read);
        assert_eq!(svc.unread_count().await?, 1);

        let listed = svc.list(&fx.admin).await?;
        assert_eq!(listed.len(), 2);
        assert!(!listed[0].read);

        svc.delete(&fx.admin, &first.id).await?;
        assert!(matches!(svc.get(&fx.admin, &first.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn inbox_is_admin_only() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let svc = &fx.services.contacts;
        let msg = svc.submit(input("cy")).await?;
        for actor in [&fx.customer, &fx.team] {
            assert!(matches!(svc.list(actor).await, Err(ServiceError::Forbidden(_))));
            assert!(matches!(svc.set_read(actor, &msg.id, true).await, Err(ServiceError::Forbidden(_))));
        }
        let bad = ContactInput { email: "nope".into(), ..input("dee") };
        assert!(svc.submit(bad).await.is_err());
        Ok(())
    }
}
