//! In-memory store backend.
//!
//! Implements every store trait on one struct behind an `Arc`, so clones
//! share state and the account-deletion cascade (user row + subscription
//! row) happens in one place.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::billing::storage::{BillingStore, DeadLetter};
use crate::billing::subscription::SubscriptionRecord;
use crate::contacts::{Contact, ContactStatus, ContactStore};
use crate::content::biography::{Biography, BiographyInput, BiographyStore};
use crate::content::blog::{BlogPost, BlogPostDraft, BlogStore};
use crate::content::concerts::{Concert, ConcertInput, ConcertStore};
use crate::content::discography::{Release, ReleaseInput, ReleaseStore};
use crate::error::{EncoreError, Result};
use crate::http::PageQuery;
use crate::roles::Role;
use super::users::{OAuthIdentity, ProfileUpdate, UserRecord, UserStore};

/// Shared in-memory backend for all stores.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    users: RwLock<HashMap<String, UserRecord>>,
    posts: RwLock<HashMap<String, BlogPost>>,
    concerts: RwLock<HashMap<String, Concert>>,
    releases: RwLock<HashMap<String, Release>>,
    biography: RwLock<Option<Biography>>,
    contacts: RwLock<HashMap<String, Contact>>,
    subscriptions: RwLock<HashMap<String, SubscriptionRecord>>,
    processed_events: RwLock<HashMap<String, DateTime<Utc>>>,
    dead_letters: RwLock<Vec<DeadLetter>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Page a sorted vector, returning the slice and the pre-slice total.
fn paginate<T: Clone>(items: Vec<T>, page: &PageQuery) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let page = page.clone().clamped();
    let out = items
        .into_iter()
        .skip(page.offset())
        .take(page.limit())
        .collect();
    (out, total)
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn upsert_oauth(&self, identity: &OAuthIdentity) -> Result<UserRecord> {
        let mut users = self.inner.users.write().unwrap();

        let existing_id = users
            .values()
            .find(|u| u.provider == identity.provider && u.provider_subject == identity.subject)
            .or_else(|| users.values().find(|u| u.email == identity.email))
            .map(|u| u.id.clone());

        let record = match existing_id {
            Some(id) => {
                let user = users.get_mut(&id).expect("id from the same map");
                user.name = identity.name.clone();
                user.image_url = identity.picture.clone();
                user.provider = identity.provider.clone();
                user.provider_subject = identity.subject.clone();
                user.updated_at = Utc::now();
                user.clone()
            }
            None => {
                let user = UserRecord::from_identity(identity);
                users.insert(user.id.clone(), user.clone());
                user
            }
        };

        Ok(record)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        Ok(self.inner.users.read().unwrap().get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .inner
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_customer_id(&self, customer_id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .inner
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn set_role(&self, user_id: &str, role: Role) -> Result<()> {
        let mut users = self.inner.users.write().unwrap();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| EncoreError::not_found(format!("user {user_id}")))?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_stripe_customer_id(&self, user_id: &str, customer_id: &str) -> Result<()> {
        let mut users = self.inner.users.write().unwrap();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| EncoreError::not_found(format!("user {user_id}")))?;
        user.stripe_customer_id = Some(customer_id.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserRecord> {
        let mut users = self.inner.users.write().unwrap();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| EncoreError::not_found(format!("user {user_id}")))?;
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(image_url) = &update.image_url {
            user.image_url = Some(image_url.clone());
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let removed = self.inner.users.write().unwrap().remove(user_id);
        if removed.is_none() {
            return Err(EncoreError::not_found(format!("user {user_id}")));
        }
        // Cascade: the subscription row goes with the account.
        self.inner.subscriptions.write().unwrap().remove(user_id);
        Ok(())
    }

    async fn list_members(&self, page: &PageQuery) -> Result<(Vec<UserRecord>, u64)> {
        let mut members: Vec<UserRecord> = self
            .inner
            .users
            .read()
            .unwrap()
            .values()
            .filter(|u| u.role.is_member())
            .cloned()
            .collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(members, page))
    }
}

#[async_trait]
impl BlogStore for InMemoryStore {
    async fn insert_post(&self, post: &BlogPost) -> Result<()> {
        self.inner
            .posts
            .write()
            .unwrap()
            .insert(post.id.clone(), post.clone());
        Ok(())
    }

    async fn get_post(&self, id: &str) -> Result<Option<BlogPost>> {
        Ok(self.inner.posts.read().unwrap().get(id).cloned())
    }

    async fn update_post(&self, id: &str, draft: &BlogPostDraft) -> Result<BlogPost> {
        let mut posts = self.inner.posts.write().unwrap();
        let post = posts
            .get_mut(id)
            .ok_or_else(|| EncoreError::not_found(format!("post {id}")))?;
        post.title = draft.title.clone();
        post.content = draft.content.clone();
        post.excerpt = draft.excerpt.clone();
        post.thumbnail_url = draft.thumbnail_url.clone();
        post.category = draft.category.clone();
        post.members_only = draft.members_only;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn set_published(&self, id: &str, published_at: DateTime<Utc>) -> Result<BlogPost> {
        let mut posts = self.inner.posts.write().unwrap();
        let post = posts
            .get_mut(id)
            .ok_or_else(|| EncoreError::not_found(format!("post {id}")))?;
        post.published = true;
        post.published_at = Some(published_at);
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: &str) -> Result<()> {
        self.inner
            .posts
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EncoreError::not_found(format!("post {id}")))
    }

    async fn list_visible(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
        page: &PageQuery,
    ) -> Result<(Vec<BlogPost>, u64)> {
        let mut posts: Vec<BlogPost> = self
            .inner
            .posts
            .read()
            .unwrap()
            .values()
            .filter(|p| p.is_publicly_visible(now))
            .filter(|p| category.is_none() || p.category.as_deref() == category)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(paginate(posts, page))
    }

    async fn list_all_posts(&self, page: &PageQuery) -> Result<(Vec<BlogPost>, u64)> {
        let mut posts: Vec<BlogPost> =
            self.inner.posts.read().unwrap().values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(posts, page))
    }
}

#[async_trait]
impl ConcertStore for InMemoryStore {
    async fn insert_concert(&self, concert: &Concert) -> Result<()> {
        self.inner
            .concerts
            .write()
            .unwrap()
            .insert(concert.id.clone(), concert.clone());
        Ok(())
    }

    async fn get_concert(&self, id: &str) -> Result<Option<Concert>> {
        Ok(self.inner.concerts.read().unwrap().get(id).cloned())
    }

    async fn update_concert(&self, id: &str, input: &ConcertInput) -> Result<Concert> {
        let mut concerts = self.inner.concerts.write().unwrap();
        let concert = concerts
            .get_mut(id)
            .ok_or_else(|| EncoreError::not_found(format!("concert {id}")))?;
        concert.title = input.title.clone();
        concert.venue = input.venue.clone();
        concert.city = input.city.clone();
        concert.starts_at = input.starts_at;
        concert.ticket_url = input.ticket_url.clone();
        concert.description = input.description.clone();
        concert.updated_at = Utc::now();
        Ok(concert.clone())
    }

    async fn delete_concert(&self, id: &str) -> Result<()> {
        self.inner
            .concerts
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EncoreError::not_found(format!("concert {id}")))
    }

    async fn list_concerts(&self, page: &PageQuery) -> Result<(Vec<Concert>, u64)> {
        let mut concerts: Vec<Concert> = self
            .inner
            .concerts
            .read()
            .unwrap()
            .values()
            .cloned()
            .collect();
        concerts.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
        Ok(paginate(concerts, page))
    }
}

#[async_trait]
impl ReleaseStore for InMemoryStore {
    async fn insert_release(&self, release: &Release) -> Result<()> {
        self.inner
            .releases
            .write()
            .unwrap()
            .insert(release.id.clone(), release.clone());
        Ok(())
    }

    async fn get_release(&self, id: &str) -> Result<Option<Release>> {
        Ok(self.inner.releases.read().unwrap().get(id).cloned())
    }

    async fn update_release(&self, id: &str, input: &ReleaseInput) -> Result<Release> {
        let mut releases = self.inner.releases.write().unwrap();
        let release = releases
            .get_mut(id)
            .ok_or_else(|| EncoreError::not_found(format!("release {id}")))?;
        release.title = input.title.clone();
        release.released_on = input.released_on;
        release.cover_url = input.cover_url.clone();
        release.tracklist = input.tracklist.clone();
        release.streaming_links = input.streaming_links.clone();
        release.updated_at = Utc::now();
        Ok(release.clone())
    }

    async fn delete_release(&self, id: &str) -> Result<()> {
        self.inner
            .releases
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EncoreError::not_found(format!("release {id}")))
    }

    async fn list_releases(&self, page: &PageQuery) -> Result<(Vec<Release>, u64)> {
        let mut releases: Vec<Release> = self
            .inner
            .releases
            .read()
            .unwrap()
            .values()
            .cloned()
            .collect();
        releases.sort_by(|a, b| b.released_on.cmp(&a.released_on));
        Ok(paginate(releases, page))
    }
}

#[async_trait]
impl BiographyStore for InMemoryStore {
    async fn get_biography(&self) -> Result<Option<Biography>> {
        Ok(self.inner.biography.read().unwrap().clone())
    }

    async fn put_biography(&self, input: BiographyInput) -> Result<Biography> {
        let biography = Biography::from_input(input);
        *self.inner.biography.write().unwrap() = Some(biography.clone());
        Ok(biography)
    }
}

#[async_trait]
impl ContactStore for InMemoryStore {
    async fn insert_contact(&self, contact: &Contact) -> Result<()> {
        self.inner
            .contacts
            .write()
            .unwrap()
            .insert(contact.id.clone(), contact.clone());
        Ok(())
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        Ok(self.inner.contacts.read().unwrap().get(id).cloned())
    }

    async fn set_contact_status(&self, id: &str, status: ContactStatus) -> Result<Contact> {
        let mut contacts = self.inner.contacts.write().unwrap();
        let contact = contacts
            .get_mut(id)
            .ok_or_else(|| EncoreError::not_found(format!("contact {id}")))?;
        contact.status = status;
        contact.updated_at = Utc::now();
        Ok(contact.clone())
    }

    async fn list_contacts(
        &self,
        status: Option<ContactStatus>,
        page: &PageQuery,
    ) -> Result<(Vec<Contact>, u64)> {
        let mut contacts: Vec<Contact> = self
            .inner
            .contacts
            .read()
            .unwrap()
            .values()
            .filter(|c| match status {
                Some(wanted) => c.status == wanted,
                None => c.status != ContactStatus::Archived,
            })
            .cloned()
            .collect();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(contacts, page))
    }
}

#[async_trait]
impl BillingStore for InMemoryStore {
    async fn subscription_for_user(&self, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        Ok(self
            .inner
            .subscriptions
            .read()
            .unwrap()
            .get(user_id)
            .cloned())
    }

    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> Result<()> {
        self.inner
            .subscriptions
            .write()
            .unwrap()
            .insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    async fn subscription_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>> {
        Ok(self
            .inner
            .subscriptions
            .read()
            .unwrap()
            .values()
            .find(|s| s.stripe_subscription_id == stripe_subscription_id)
            .cloned())
    }

    async fn delete_subscription_for_user(&self, user_id: &str) -> Result<()> {
        self.inner.subscriptions.write().unwrap().remove(user_id);
        Ok(())
    }

    async fn is_event_processed(&self, event_id: &str) -> Result<bool> {
        Ok(self
            .inner
            .processed_events
            .read()
            .unwrap()
            .contains_key(event_id))
    }

    async fn mark_event_processed(&self, event_id: &str) -> Result<()> {
        self.inner
            .processed_events
            .write()
            .unwrap()
            .insert(event_id.to_string(), Utc::now());
        Ok(())
    }

    async fn record_dead_letter(&self, entry: &DeadLetter) -> Result<()> {
        self.inner.dead_letters.write().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_dead_letters(&self) -> Result<Vec<DeadLetter>> {
        let mut letters = self.inner.dead_letters.read().unwrap().clone();
        letters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(letters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str, subject: &str) -> OAuthIdentity {
        OAuthIdentity {
            provider: "google".to_string(),
            subject: subject.to_string(),
            email: email.to_string(),
            name: "Fan".to_string(),
            picture: None,
        }
    }

    #[tokio::test]
    async fn oauth_upsert_matches_by_provider_subject() {
        let store = InMemoryStore::new();
        let first = store
            .upsert_oauth(&identity("fan@example.com", "sub-1"))
            .await
            .unwrap();
        let second = store
            .upsert_oauth(&identity("fan@example.com", "sub-1"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.inner.users.read().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn oauth_upsert_links_existing_email_account() {
        let store = InMemoryStore::new();
        let first = store
            .upsert_oauth(&identity("fan@example.com", "sub-1"))
            .await
            .unwrap();

        // Same email through a different provider subject: the account is
        // relinked, not duplicated.
        let mut other = identity("fan@example.com", "sub-2");
        other.provider = "github".to_string();
        let second = store.upsert_oauth(&other).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.provider, "github");
    }

    #[tokio::test]
    async fn role_survives_oauth_reupsert() {
        let store = InMemoryStore::new();
        let user = store
            .upsert_oauth(&identity("fan@example.com", "sub-1"))
            .await
            .unwrap();
        store.set_role(&user.id, Role::MemberGold).await.unwrap();

        let again = store
            .upsert_oauth(&identity("fan@example.com", "sub-1"))
            .await
            .unwrap();
        assert_eq!(again.role, Role::MemberGold);
    }

    #[tokio::test]
    async fn delete_cascades_to_subscription_row() {
        let store = InMemoryStore::new();
        let user = store
            .upsert_oauth(&identity("fan@example.com", "sub-1"))
            .await
            .unwrap();

        store
            .upsert_subscription(&SubscriptionRecord {
                user_id: user.id.clone(),
                tier: crate::billing::MembershipTier::Gold,
                status: crate::billing::SubscriptionStatus::Active,
                current_period_end: None,
                cancel_at_period_end: false,
                stripe_customer_id: "cus_1".to_string(),
                stripe_subscription_id: "sub_1".to_string(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        store.delete_user(&user.id).await.unwrap();
        assert!(store.get_user(&user.id).await.unwrap().is_none());
        assert!(store
            .subscription_for_user(&user.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn missing_ids_surface_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.set_role("ghost", Role::Admin).await,
            Err(EncoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_post("ghost").await,
            Err(EncoreError::NotFound(_))
        ));
        assert!(matches!(
            store.set_contact_status("ghost", ContactStatus::Read).await,
            Err(EncoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn member_listing_filters_and_paginates() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            let user = store
                .upsert_oauth(&identity(&format!("fan{i}@example.com"), &format!("s{i}")))
                .await
                .unwrap();
            if i < 3 {
                store.set_role(&user.id, Role::MemberFree).await.unwrap();
            }
        }

        let page = PageQuery {
            page: 1,
            per_page: 2,
        };
        let (members, total) = store.list_members(&page).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn contact_default_view_excludes_archived() {
        use crate::contacts::NewContact;

        let store = InMemoryStore::new();
        for i in 0..3 {
            let contact = Contact::new(NewContact {
                name: format!("Fan {i}"),
                email: "fan@example.com".to_string(),
                phone: None,
                category: None,
                subject: "Hello".to_string(),
                message: "Hi".to_string(),
            });
            store.insert_contact(&contact).await.unwrap();
            if i == 0 {
                store
                    .set_contact_status(&contact.id, ContactStatus::Archived)
                    .await
                    .unwrap();
            }
        }

        let page = PageQuery::default();
        let (visible, total) = store.list_contacts(None, &page).await.unwrap();
        assert_eq!(total, 2);
        assert!(visible.iter().all(|c| c.status != ContactStatus::Archived));

        let (archived, archived_total) = store
            .list_contacts(Some(ContactStatus::Archived), &page)
            .await
            .unwrap();
        assert_eq!(archived_total, 1);
        assert_eq!(archived[0].status, ContactStatus::Archived);
    }
}
