//! TOPS nomination intake, admin review, and public status tracking.
//!
//! Applicants fill a seven-step wizard held server-side as a draft; uploads made along the
//! way stay temporary until the application is stored. Reviewers work through the admin
//! endpoints, and applicants follow their application with the status token issued at
//! submission.

pub mod admin;
pub mod cascade;
pub mod domain;
pub mod drafts;
pub mod email;
pub mod export;
pub mod filter;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod token;
pub mod uploads;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use admin::{AccessGate, AdminSessions, AuthError};
pub use cascade::{CascadeReport, CascadeStep, StepOutcome, StepResult};
pub use domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Claim, ClaimCategory, Comment,
    DocumentSlot, FormPatch, NominationForm, Review, UnknownVariant, MAX_CLAIMS_PER_CATEGORY,
};
pub use drafts::{Draft, DraftId, DraftNotFound, DraftRegistry, DraftSubmitError, DraftView};
pub use email::{EmailError, EmailMessage};
pub use export::{ExportDocument, ExportError, ExportFormat};
pub use filter::{ApplicationFilter, FilterOptions};
pub use memory::{MemoryBlobStore, MemoryNotifier, MemoryRepository, StoredObject};
pub use repository::{
    ApplicationRepository, BlobError, BlobStore, NotifyError, RepositoryError, StatusNotifier,
    StoredBlob,
};
pub use router::{portal_router, ApiError, PortalState};
pub use service::{
    FileOwner, NominationService, PortalSettings, PublicComment, ServiceError, StatusView,
    SubmissionError, SubmissionReceipt, UploadedFile,
};
pub use token::{StatusToken, TokenFormatError};
pub use uploads::{
    CleanupReport, FileUpload, UploadError, UploadPolicy, UploadRejected, UploadTracker,
    MAX_UPLOAD_BYTES,
};
pub use wizard::{FormWizard, WizardError, WizardStep};
