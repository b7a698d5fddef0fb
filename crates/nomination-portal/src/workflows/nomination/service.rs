use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::cascade::{self, CascadeReport};
use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ClaimCategory, Comment, DocumentSlot,
    NominationForm,
};
use super::email::{status_email, EmailError, EmailMessage};
use super::export::{self, ExportDocument, ExportError, ExportFormat};
use super::filter::{ApplicationFilter, FilterOptions};
use super::repository::{
    object_name_from_url, ApplicationRepository, BlobError, BlobStore, NotifyError,
    RepositoryError, StatusNotifier,
};
use super::token::StatusToken;
use super::uploads::{UploadPolicy, UploadTracker};

/// Attempts at drawing a status token that is not already in use.
const TOKEN_ATTEMPTS: usize = 5;

/// Author recorded on comments written by the portal itself.
pub const SYSTEM_AUTHOR: &str = "system";

/// Deployment-level knobs shared by every service call.
#[derive(Debug, Clone)]
pub struct PortalSettings {
    pub public_base_url: String,
    pub upload_policy: UploadPolicy,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            upload_policy: UploadPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub token: StatusToken,
    pub status_url: String,
}

/// What the public status page shows for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub id: ApplicationId,
    pub full_name: String,
    pub email: String,
    pub municipality: String,
    pub status: ApplicationStatus,
    pub created_at: chrono::DateTime<Utc>,
    pub comments: Vec<PublicComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicComment {
    pub id: String,
    pub comment_text: String,
    pub created_at: chrono::DateTime<Utc>,
}

/// Which application and field a stored blob belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOwner {
    pub application_id: ApplicationId,
    pub applicant: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
    pub owner: Option<FileOwner>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Please accept the data privacy terms to submit your application.")]
    PrivacyNotAccepted,
    #[error("Please confirm that all information is correct before submitting.")]
    NotConfirmed,
}

/// Error raised by the nomination service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] BlobError),
    #[error(transparent)]
    Notification(#[from] NotifyError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error("Token is required")]
    MissingToken,
    #[error("Invalid token or application not found")]
    UnknownToken,
    #[error("comment text must not be empty")]
    EmptyComment,
    #[error("could not allocate a unique status token")]
    TokenCollision,
    #[error("application {} was not fully deleted", .0.application_id)]
    IncompleteDelete(CascadeReport),
}

/// Service composing the record store, object bucket, and e-mail relay.
pub struct NominationService<R, B, N> {
    repository: Arc<R>,
    blobs: Arc<B>,
    notifier: Arc<N>,
    settings: PortalSettings,
}

impl<R, B, N> NominationService<R, B, N>
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    pub fn new(repository: Arc<R>, blobs: Arc<B>, notifier: Arc<N>, settings: PortalSettings) -> Self {
        Self {
            repository,
            blobs,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    /// A fresh tracker for one wizard session, bound to this service's bucket.
    pub fn upload_tracker(&self) -> UploadTracker<B> {
        UploadTracker::new(self.blobs.clone(), self.settings.upload_policy.clone())
    }

    pub fn status_url(&self, token: &StatusToken) -> String {
        format!(
            "{}/status?token={token}",
            self.settings.public_base_url.trim_end_matches('/')
        )
    }

    /// Store a completed form as a pending application.
    pub fn submit(
        &self,
        form: &NominationForm,
        confirmed: bool,
    ) -> Result<SubmissionReceipt, ServiceError> {
        if !form.data_privacy_accepted {
            return Err(SubmissionError::PrivacyNotAccepted.into());
        }
        if !confirmed {
            return Err(SubmissionError::NotConfirmed.into());
        }

        let token = self.unused_token()?;
        let now = Utc::now();
        let record = ApplicationRecord {
            id: ApplicationId::generate(),
            form: form.clone(),
            status: ApplicationStatus::Pending,
            public_status_token: token.clone(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(record)?;
        info!(application_id = %stored.id, "nomination submitted");

        Ok(SubmissionReceipt {
            status_url: self.status_url(&token),
            application_id: stored.id,
            token,
        })
    }

    fn unused_token(&self) -> Result<StatusToken, ServiceError> {
        for _ in 0..TOKEN_ATTEMPTS {
            let token = StatusToken::generate();
            if self.repository.find_by_token(&token)?.is_none() {
                return Ok(token);
            }
            warn!("status token collision; drawing another");
        }
        Err(ServiceError::TokenCollision)
    }

    pub fn lookup_status(&self, raw_token: &str) -> Result<StatusView, ServiceError> {
        if raw_token.trim().is_empty() {
            return Err(ServiceError::MissingToken);
        }
        let token = StatusToken::parse(raw_token).map_err(|_| ServiceError::UnknownToken)?;
        let record = self
            .repository
            .find_by_token(&token)?
            .ok_or(ServiceError::UnknownToken)?;

        let comments = self
            .repository
            .comments(&record.id)?
            .into_iter()
            .filter(|comment| !comment.is_internal)
            .map(|comment| PublicComment {
                id: comment.id,
                comment_text: comment.comment_text,
                created_at: comment.created_at,
            })
            .collect();

        Ok(StatusView {
            id: record.id,
            full_name: record.form.full_name,
            email: record.form.email,
            municipality: record.form.municipality,
            status: record.status,
            created_at: record.created_at,
            comments,
        })
    }

    /// Newest first, narrowed by the dashboard filter.
    pub fn list(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, ServiceError> {
        Ok(filter.apply(self.repository.list()?))
    }

    pub fn filter_options(&self) -> Result<FilterOptions, ServiceError> {
        Ok(FilterOptions::from_records(&self.repository.list()?))
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, ServiceError> {
        let record = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Last write wins; an internal comment records the change.
    pub fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, ServiceError> {
        let record = self.repository.update_status(id, status, Utc::now())?;
        info!(application_id = %id, status = status.label(), "application status updated");

        let note = Comment::new(
            id.clone(),
            format!("Application status changed to {}", status.display_name()),
            true,
            SYSTEM_AUTHOR,
        );
        if let Err(err) = self.repository.insert_comment(note) {
            warn!(application_id = %id, error = %err, "failed to record status change comment");
        }

        Ok(record)
    }

    pub fn add_comment(
        &self,
        id: &ApplicationId,
        text: &str,
        is_internal: bool,
        created_by: &str,
    ) -> Result<Comment, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::EmptyComment);
        }
        self.get(id)?;

        let author = match created_by.trim() {
            "" => "admin",
            author => author,
        };
        let comment = self
            .repository
            .insert_comment(Comment::new(id.clone(), text, is_internal, author))?;
        Ok(comment)
    }

    pub fn comments(&self, id: &ApplicationId) -> Result<Vec<Comment>, ServiceError> {
        self.get(id)?;
        Ok(self.repository.comments(id)?)
    }

    /// Compose the current-status e-mail and hand it to the relay.
    pub fn send_status_email(
        &self,
        id: &ApplicationId,
        note: Option<&str>,
    ) -> Result<EmailMessage, ServiceError> {
        let record = self.get(id)?;
        let message = status_email(
            &record,
            &self.status_url(&record.public_status_token),
            note,
        )?;
        self.notifier.send(message.clone())?;
        info!(application_id = %id, status = record.status.label(), "status email sent");
        Ok(message)
    }

    /// Remove the application with its files, comments, and reviews.
    pub fn delete_application(&self, id: &ApplicationId) -> Result<CascadeReport, ServiceError> {
        let record = self.get(id)?;
        let steps = cascade::plan(&record);
        let report = cascade::execute(self.repository.as_ref(), self.blobs.as_ref(), id, steps);

        if report.completed() {
            info!(
                application_id = %id,
                files = report.files_deleted(),
                failures = report.failures().count(),
                "application deleted"
            );
            Ok(report)
        } else {
            Err(ServiceError::IncompleteDelete(report))
        }
    }

    /// Every blob in the bucket with the application field that references it, if any.
    pub fn uploaded_files(&self) -> Result<Vec<UploadedFile>, ServiceError> {
        let owners = file_owners(&self.repository.list()?);
        let files = self
            .blobs
            .list()?
            .into_iter()
            .map(|blob| UploadedFile {
                url: self.blobs.public_url(&blob.name),
                owner: owners.get(&blob.name).cloned(),
                name: blob.name,
                content_type: blob.content_type,
                size: blob.size,
            })
            .collect();
        Ok(files)
    }

    pub fn export(&self, format: ExportFormat, today: NaiveDate) -> Result<ExportDocument, ServiceError> {
        let records = self.repository.list()?;
        Ok(export::render(format, &records, today)?)
    }

    pub fn export_applicant(
        &self,
        id: &ApplicationId,
        today: NaiveDate,
    ) -> Result<ExportDocument, ServiceError> {
        let record = self.get(id)?;
        Ok(ExportDocument {
            file_name: export::applicant_file_name(&record, today),
            content_type: ExportFormat::BasicCsv.content_type(),
            body: export::applicant_csv(&record)?,
        })
    }
}

fn file_owners(records: &[ApplicationRecord]) -> HashMap<String, FileOwner> {
    let mut owners = HashMap::new();
    // newest first; the first claimant of a name wins
    for record in records {
        let mut claim = |url: &str, field: String| {
            owners
                .entry(object_name_from_url(url))
                .or_insert_with(|| FileOwner {
                    application_id: record.id.clone(),
                    applicant: record.form.full_name.clone(),
                    field,
                });
        };

        for slot in DocumentSlot::ALL {
            if let Some(url) = record.form.document(slot) {
                claim(url, slot.label().to_string());
            }
        }
        for category in ClaimCategory::ALL {
            for (index, entry) in record.form.claims(category).iter().enumerate() {
                if let Some(url) = entry.certificate() {
                    claim(url, format!("{} Claim #{}", category.label(), index + 1));
                }
            }
        }
    }
    owners
}
