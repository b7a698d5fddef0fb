use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::distributions::{Alphanumeric, Distribution};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{ClaimCategory, DocumentSlot, NominationForm};
use super::repository::{object_name_from_url, BlobError, BlobStore};

/// Largest accepted upload: 5 MB.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const NAME_SUFFIX_LEN: usize = 6;

/// A file selected by the applicant, before it reaches the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Object-name extension for an accepted MIME essence; the client's file name never decides it.
fn extension_for(essence: &str) -> &'static str {
    match essence {
        "application/pdf" => "pdf",
        "image/png" => "png",
        _ => "jpg",
    }
}

/// Size and type limits applied before anything is written to storage.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: usize,
    allowed: Vec<mime::Mime>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            allowed: vec![mime::APPLICATION_PDF, mime::IMAGE_JPEG, mime::IMAGE_PNG],
        }
    }
}

impl UploadPolicy {
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Returns the normalized MIME essence (e.g. `image/png`) when the file is acceptable.
    pub fn check(&self, field: &str, upload: &FileUpload) -> Result<String, UploadRejected> {
        if upload.bytes.len() > self.max_bytes {
            return Err(UploadRejected::TooLarge {
                field: field.to_string(),
                size: upload.bytes.len(),
                max_mb: self.max_bytes / (1024 * 1024),
            });
        }

        let parsed = upload.content_type.trim().parse::<mime::Mime>().ok();
        let essence = parsed.as_ref().map(|value| value.essence_str().to_ascii_lowercase());
        match essence {
            Some(essence)
                if self
                    .allowed
                    .iter()
                    .any(|allowed| allowed.essence_str() == essence) =>
            {
                Ok(essence)
            }
            _ => Err(UploadRejected::UnsupportedType {
                field: field.to_string(),
                content_type: upload.content_type.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejected {
    #[error("{field}: file is too large ({size} bytes); the maximum is {max_mb}MB")]
    TooLarge {
        field: String,
        size: usize,
        max_mb: usize,
    },
    #[error("{field}: only PDF, JPEG, or PNG files are accepted (got '{content_type}')")]
    UnsupportedType { field: String, content_type: String },
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] UploadRejected),
    #[error("Failed to upload file. Please try again.")]
    Storage(#[source] BlobError),
}

/// Outcome of flushing the temporary set on abandonment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// `{timestamp}-{random}.{ext}`, or `{category}-{timestamp}-{random}.{ext}` for certificates.
pub fn object_name<R: Rng + ?Sized>(
    prefix: Option<ClaimCategory>,
    extension: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> String {
    let suffix: String = Alphanumeric
        .sample_iter(rng)
        .take(NAME_SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    let stamp = now.timestamp_millis();
    match prefix {
        Some(category) => format!("{}-{stamp}-{suffix}.{extension}", category.file_prefix()),
        None => format!("{stamp}-{suffix}.{extension}"),
    }
}

/// Tracks blobs uploaded during one wizard session so they can be removed if the
/// session never reaches submission.
pub struct UploadTracker<B: BlobStore> {
    store: Arc<B>,
    policy: UploadPolicy,
    temporary: BTreeSet<String>,
}

impl<B: BlobStore> UploadTracker<B> {
    pub fn new(store: Arc<B>, policy: UploadPolicy) -> Self {
        Self {
            store,
            policy,
            temporary: BTreeSet::new(),
        }
    }

    pub fn temporary(&self) -> Vec<String> {
        self.temporary.iter().cloned().collect()
    }

    pub fn is_temporary(&self, url: &str) -> bool {
        self.temporary.contains(url)
    }

    fn store_blob(
        &mut self,
        field: &str,
        prefix: Option<ClaimCategory>,
        upload: FileUpload,
    ) -> Result<String, UploadError> {
        let essence = self.policy.check(field, &upload)?;
        let name = object_name(
            prefix,
            extension_for(&essence),
            Utc::now(),
            &mut rand::thread_rng(),
        );

        self.store
            .put(&name, &essence, &upload.bytes)
            .map_err(|err| {
                warn!(field, error = %err, "upload to object storage failed");
                UploadError::Storage(err)
            })?;

        let url = self.store.public_url(&name);
        self.temporary.insert(url.clone());
        debug!(
            field,
            %url,
            file_name = %upload.file_name,
            size = upload.bytes.len(),
            "stored temporary upload"
        );
        Ok(url)
    }

    /// Upload into a required-document slot, replacing (and deleting) any earlier file.
    pub fn upload_document(
        &mut self,
        form: &mut NominationForm,
        slot: DocumentSlot,
        upload: FileUpload,
    ) -> Result<String, UploadError> {
        let url = self.store_blob(slot.label(), None, upload)?;
        let previous = form.document_mut(slot).replace(url.clone());
        if let Some(previous) = previous.filter(|previous| !previous.is_empty() && *previous != url)
        {
            self.release(&previous);
        }
        Ok(url)
    }

    /// Upload a certificate for the claim currently being composed; the caller binds the URL.
    pub fn upload_claim_certificate(
        &mut self,
        category: ClaimCategory,
        upload: FileUpload,
    ) -> Result<String, UploadError> {
        let field = format!("{} certificate", category.label());
        self.store_blob(&field, Some(category), upload)
    }

    /// Unbind a document slot and delete its blob.
    pub fn clear_document(&mut self, form: &mut NominationForm, slot: DocumentSlot) -> bool {
        match form.document_mut(slot).take() {
            Some(url) if !url.is_empty() => self.release(&url),
            _ => false,
        }
    }

    /// Delete a blob this session uploaded but no longer references.
    pub fn discard(&mut self, url: &str) -> bool {
        if self.temporary.contains(url) {
            self.release(url)
        } else {
            false
        }
    }

    fn release(&mut self, url: &str) -> bool {
        self.temporary.remove(url);
        match self.store.delete(&object_name_from_url(url)) {
            Ok(()) => {
                debug!(%url, "deleted superseded upload");
                true
            }
            Err(err) => {
                warn!(%url, error = %err, "failed to delete superseded upload");
                false
            }
        }
    }

    /// Uploads become permanent once the application is stored.
    pub fn commit(&mut self) -> Vec<String> {
        std::mem::take(&mut self.temporary).into_iter().collect()
    }

    /// Best-effort removal of everything still temporary.
    pub fn abandon(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for url in std::mem::take(&mut self.temporary) {
            match self.store.delete(&object_name_from_url(&url)) {
                Ok(()) => report.deleted.push(url),
                Err(err) => {
                    warn!(%url, error = %err, "failed to clean up abandoned upload");
                    report.failed.push(url);
                }
            }
        }
        report
    }
}

impl<B: BlobStore> Drop for UploadTracker<B> {
    fn drop(&mut self) {
        if !self.temporary.is_empty() {
            let report = self.abandon();
            debug!(
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "released uploads of dropped session"
            );
        }
    }
}

impl<B: BlobStore> std::fmt::Debug for UploadTracker<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadTracker")
            .field("policy", &self.policy)
            .field("temporary", &self.temporary)
            .finish_non_exhaustive()
    }
}
