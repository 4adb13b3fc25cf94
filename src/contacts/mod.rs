//! Trusted contacts: the people a user knows, passed to the model so it can
//! recognize (or see through) messages that claim to come from them.

pub mod model;
pub mod routes;

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::ContactError;
use crate::store::Database;
use model::{ContactUpdate, NewContact, Relationship, TrustedContact};

/// `Some(trimmed)` for non-blank input.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct TrustedContacts {
    db: Arc<dyn Database>,
}

impl TrustedContacts {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Validate and store a new contact for `user_id`.
    pub async fn add(
        &self,
        user_id: Uuid,
        contact: NewContact,
    ) -> Result<TrustedContact, ContactError> {
        let name = contact.name.trim().to_string();
        if name.is_empty() || contact.relationship.trim().is_empty() {
            return Err(ContactError::MissingFields);
        }
        let relationship: Relationship = contact.relationship.parse()?;

        let phone = non_blank(contact.phone);
        let email = non_blank(contact.email);
        if phone.is_none() && email.is_none() {
            return Err(ContactError::MissingContactMethod);
        }

        let contact = TrustedContact {
            id: Uuid::new_v4(),
            user_id,
            name,
            phone,
            email,
            relationship,
            created_at: Utc::now(),
        };
        self.db.insert_contact(&contact).await?;

        info!(id = %contact.id, user_id = %user_id, relationship = %relationship, "Trusted contact added");
        Ok(contact)
    }

    /// A user's contacts, oldest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<TrustedContact>, ContactError> {
        Ok(self.db.list_contacts(user_id).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<TrustedContact, ContactError> {
        self.db
            .get_contact(id)
            .await?
            .ok_or_else(|| ContactError::NotFound(id.to_string()))
    }

    /// Apply a partial edit. The result must still have a phone or email.
    pub async fn update(
        &self,
        id: Uuid,
        update: ContactUpdate,
    ) -> Result<TrustedContact, ContactError> {
        let mut contact = self.get(id).await?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ContactError::MissingFields);
            }
            contact.name = name;
        }
        if let Some(relationship) = update.relationship {
            contact.relationship = relationship.parse()?;
        }
        if update.phone.is_some() {
            contact.phone = non_blank(update.phone);
        }
        if update.email.is_some() {
            contact.email = non_blank(update.email);
        }
        if contact.phone.is_none() && contact.email.is_none() {
            return Err(ContactError::MissingContactMethod);
        }

        self.db.update_contact(&contact).await?;
        info!(id = %id, "Trusted contact updated");
        Ok(contact)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ContactError> {
        if !self.db.delete_contact(id).await? {
            return Err(ContactError::NotFound(id.to_string()));
        }
        info!(id = %id, "Trusted contact deleted");
        Ok(())
    }

    /// Prompt descriptions for all of a user's contacts, e.g. `Mary (child)`.
    pub async fn descriptions(&self, user_id: Uuid) -> Result<Vec<String>, ContactError> {
        Ok(self
            .list(user_id)
            .await?
            .iter()
            .map(TrustedContact::description)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LibSqlBackend, User};

    async fn service() -> TrustedContacts {
        TrustedContacts::new(Arc::new(LibSqlBackend::new_memory().await.unwrap()))
    }

    async fn seed_user(contacts: &TrustedContacts, email: &str) -> Uuid {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        };
        contacts.db.insert_user(&user, "h").await.unwrap();
        user.id
    }

    fn new_contact(name: &str, relationship: &str) -> NewContact {
        NewContact {
            name: name.to_string(),
            phone: Some("555-0100".into()),
            email: None,
            relationship: relationship.to_string(),
        }
    }

    #[tokio::test]
    async fn add_normalizes_relationship() {
        let contacts = service().await;
        let user = seed_user(&contacts, "a@x.com").await;
        let added = contacts
            .add(user, new_contact("Mary", "Child"))
            .await
            .unwrap();
        assert_eq!(added.relationship, Relationship::Child);
        assert_eq!(added.description(), "Mary (child)");
    }

    #[tokio::test]
    async fn add_validation() {
        let contacts = service().await;
        let user = Uuid::new_v4();

        assert!(matches!(
            contacts.add(user, new_contact(" ", "friend")).await,
            Err(ContactError::MissingFields)
        ));
        assert!(matches!(
            contacts.add(user, new_contact("Mary", "cousin")).await,
            Err(ContactError::InvalidRelationship(_))
        ));

        let mut no_method = new_contact("Mary", "friend");
        no_method.phone = Some("  ".into());
        assert!(matches!(
            contacts.add(user, no_method).await,
            Err(ContactError::MissingContactMethod)
        ));
        assert!(contacts.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn descriptions_in_creation_order() {
        let contacts = service().await;
        let user = seed_user(&contacts, "a@x.com").await;
        let other = seed_user(&contacts, "b@x.com").await;
        contacts.add(user, new_contact("Mary", "child")).await.unwrap();
        contacts.add(user, new_contact("Tom", "spouse")).await.unwrap();
        contacts
            .add(other, new_contact("Else", "friend"))
            .await
            .unwrap();

        assert_eq!(
            contacts.descriptions(user).await.unwrap(),
            vec!["Mary (child)", "Tom (spouse)"]
        );
    }

    #[tokio::test]
    async fn update_keeps_a_contact_method() {
        let contacts = service().await;
        let user = seed_user(&contacts, "a@x.com").await;
        let added = contacts
            .add(user, new_contact("Mary", "child"))
            .await
            .unwrap();

        let updated = contacts
            .update(
                added.id,
                ContactUpdate {
                    email: Some("mary@example.com".into()),
                    phone: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.phone.is_none());
        assert_eq!(updated.email.as_deref(), Some("mary@example.com"));

        let err = contacts
            .update(
                added.id,
                ContactUpdate {
                    email: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ContactError::MissingContactMethod));
        assert_eq!(
            contacts.get(added.id).await.unwrap().email.as_deref(),
            Some("mary@example.com")
        );
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let contacts = service().await;
        let user = seed_user(&contacts, "a@x.com").await;
        let added = contacts
            .add(user, new_contact("Mary", "child"))
            .await
            .unwrap();
        contacts.delete(added.id).await.unwrap();
        assert!(matches!(
            contacts.delete(added.id).await,
            Err(ContactError::NotFound(_))
        ));
    }
}
