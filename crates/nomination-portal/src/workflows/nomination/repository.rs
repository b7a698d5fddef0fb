use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicationId, ApplicationRecord, ApplicationStatus, Comment, Review};
use super::email::EmailMessage;
use super::token::StatusToken;

/// Record store holding applications and their dependent comment and review rows.
///
/// There is no foreign-key cascade behind this trait; the delete saga removes dependents
/// explicitly.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn find_by_token(
        &self,
        token: &StatusToken,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// All applications, newest first.
    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;

    fn insert_comment(&self, comment: Comment) -> Result<Comment, RepositoryError>;
    /// Comments for one application, oldest first.
    fn comments(&self, id: &ApplicationId) -> Result<Vec<Comment>, RepositoryError>;
    fn delete_comments(&self, id: &ApplicationId) -> Result<usize, RepositoryError>;

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    fn delete_reviews(&self, id: &ApplicationId) -> Result<usize, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Flat-namespace object storage bucket.
pub trait BlobStore: Send + Sync {
    fn put(&self, name: &str, content_type: &str, bytes: &[u8]) -> Result<(), BlobError>;
    fn public_url(&self, name: &str) -> String;
    fn delete(&self, name: &str) -> Result<(), BlobError>;
    fn list(&self) -> Result<Vec<StoredBlob>, BlobError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBlob {
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
    #[error("object '{0}' not found")]
    NotFound(String),
    #[error("object storage unavailable: {0}")]
    Unavailable(String),
}

/// Resolve the object name a public URL points at: last path segment, query stripped,
/// percent-escapes decoded.
pub fn object_name_from_url(url: &str) -> String {
    let without_query = url.split(&['?', '#'][..]).next().unwrap_or(url);
    let segment = without_query.rsplit('/').next().unwrap_or(without_query);
    percent_decode(segment)
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' && index + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[index + 1..index + 3]).ok();
            if let Some(value) = hex.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                decoded.push(value);
                index += 3;
                continue;
            }
        }
        decoded.push(bytes[index]);
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Outbound transactional e-mail relay.
pub trait StatusNotifier: Send + Sync {
    fn send(&self, message: EmailMessage) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("email service not configured")]
    NotConfigured,
    #[error("email transport unavailable: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::object_name_from_url;

    #[test]
    fn object_names_come_from_the_last_segment() {
        assert_eq!(
            object_name_from_url("https://cdn.example/storage/tops-uploads/1700-abc.pdf"),
            "1700-abc.pdf"
        );
        assert_eq!(
            object_name_from_url("https://cdn.example/b/academic-1700-x.png?download=1"),
            "academic-1700-x.png"
        );
        assert_eq!(object_name_from_url("my%20file.pdf"), "my file.pdf");
        assert_eq!(object_name_from_url("plain-name.jpg"), "plain-name.jpg");
        assert_eq!(object_name_from_url("broken%2"), "broken%2");
    }
}
