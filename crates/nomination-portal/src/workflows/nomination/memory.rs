//! In-process adapters for the record store, object bucket, and e-mail relay.
//!
//! They back the HTTP service in development and the test suites; production deployments
//! swap them for clients of the hosted services.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{ApplicationId, ApplicationRecord, ApplicationStatus, Comment, Review};
use super::email::EmailMessage;
use super::repository::{
    ApplicationRepository, BlobError, BlobStore, NotifyError, RepositoryError, StatusNotifier,
    StoredBlob,
};
use super::token::StatusToken;

#[derive(Debug, Default)]
struct Tables {
    applications: HashMap<ApplicationId, ApplicationRecord>,
    comments: Vec<Comment>,
    reviews: Vec<Review>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository lock poisoned".to_string()))
    }

    pub fn review_count(&self, id: &ApplicationId) -> usize {
        self.tables()
            .map(|tables| {
                tables
                    .reviews
                    .iter()
                    .filter(|review| &review.application_id == id)
                    .count()
            })
            .unwrap_or_default()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.applications.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .applications
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.tables()?.applications.get(id).cloned())
    }

    fn find_by_token(
        &self,
        token: &StatusToken,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .applications
            .values()
            .find(|record| &record.public_status_token == token)
            .cloned())
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let mut records: Vec<ApplicationRecord> =
            self.tables()?.applications.values().cloned().collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.tables()?;
        let record = tables
            .applications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        record.status = status;
        record.updated_at = updated_at;
        Ok(record.clone())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.tables()?
            .applications
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn insert_comment(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        self.tables()?.comments.push(comment.clone());
        Ok(comment)
    }

    fn comments(&self, id: &ApplicationId) -> Result<Vec<Comment>, RepositoryError> {
        let mut comments: Vec<Comment> = self
            .tables()?
            .comments
            .iter()
            .filter(|comment| &comment.application_id == id)
            .cloned()
            .collect();
        // stable: equal timestamps keep insertion order
        comments.sort_by_key(|comment| comment.created_at);
        Ok(comments)
    }

    fn delete_comments(&self, id: &ApplicationId) -> Result<usize, RepositoryError> {
        let mut tables = self.tables()?;
        let before = tables.comments.len();
        tables.comments.retain(|comment| &comment.application_id != id);
        Ok(before - tables.comments.len())
    }

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        self.tables()?.reviews.push(review.clone());
        Ok(review)
    }

    fn delete_reviews(&self, id: &ApplicationId) -> Result<usize, RepositoryError> {
        let mut tables = self.tables()?;
        let before = tables.reviews.len();
        tables.reviews.retain(|review| &review.application_id != id);
        Ok(before - tables.reviews.len())
    }
}

/// Object bytes with the content type recorded when they were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Bucket kept in a map; public URLs are `{base_url}/{name}`.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Arc::default(),
        }
    }

    fn objects(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredObject>>, BlobError> {
        self.objects
            .lock()
            .map_err(|_| BlobError::Unavailable("bucket lock poisoned".to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects()
            .map(|objects| objects.contains_key(name))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read(&self, name: &str) -> Option<StoredObject> {
        self.objects()
            .ok()
            .and_then(|objects| objects.get(name).cloned())
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://tops-uploads")
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, name: &str, content_type: &str, bytes: &[u8]) -> Result<(), BlobError> {
        self.objects()?.insert(
            name.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    fn delete(&self, name: &str) -> Result<(), BlobError> {
        self.objects()?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<StoredBlob>, BlobError> {
        Ok(self
            .objects()?
            .iter()
            .map(|(name, object)| StoredBlob {
                name: name.clone(),
                content_type: object.content_type.clone(),
                size: object.bytes.len(),
            })
            .collect())
    }
}

/// Outbox that records every message and logs it instead of relaying.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MemoryNotifier {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl StatusNotifier for MemoryNotifier {
    fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        info!(to = %message.to, subject = %message.subject, "queued status email");
        self.sent
            .lock()
            .map_err(|_| NotifyError::Transport("outbox lock poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}
