//! Server-side wizard sessions.
//!
//! A draft pairs the form wizard with the upload tracker for the files picked so far.
//! Dropping a draft (abandonment, idle sweep, or shutdown) releases its temporary blobs.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::domain::{Claim, ClaimCategory, DocumentSlot, NominationForm};
use super::repository::{ApplicationRepository, BlobStore, StatusNotifier};
use super::service::{NominationService, ServiceError, SubmissionReceipt};
use super::uploads::{CleanupReport, FileUpload, UploadError, UploadTracker};
use super::wizard::{FormWizard, WizardError, WizardStep};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(pub String);

impl DraftId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("draft '{0}' not found or expired")]
pub struct DraftNotFound(pub DraftId);

#[derive(Debug, thiserror::Error)]
pub enum DraftSubmitError {
    #[error(transparent)]
    NotFound(#[from] DraftNotFound),
    #[error("this nomination has already been submitted")]
    AlreadySubmitted,
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Snapshot returned to the applicant after every draft operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftView {
    pub draft_id: DraftId,
    pub step: WizardStep,
    pub step_number: usize,
    pub step_count: usize,
    pub title: &'static str,
    pub form: NominationForm,
    pub pending_uploads: Vec<String>,
}

#[derive(Debug)]
pub struct Draft<B: BlobStore> {
    wizard: FormWizard,
    uploads: UploadTracker<B>,
    last_touched: DateTime<Utc>,
    submitted: bool,
}

impl<B: BlobStore> Draft<B> {
    pub fn new(uploads: UploadTracker<B>) -> Self {
        Self {
            wizard: FormWizard::new(),
            uploads,
            last_touched: Utc::now(),
            submitted: false,
        }
    }

    pub fn wizard(&self) -> &FormWizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut FormWizard {
        &mut self.wizard
    }

    pub fn uploads(&self) -> &UploadTracker<B> {
        &self.uploads
    }

    pub fn view(&self, id: &DraftId) -> DraftView {
        let step = self.wizard.step();
        DraftView {
            draft_id: id.clone(),
            step,
            step_number: step.number(),
            step_count: WizardStep::ALL.len(),
            title: step.title(),
            form: self.wizard.form().clone(),
            pending_uploads: self.uploads.temporary(),
        }
    }

    pub fn upload_document(
        &mut self,
        slot: DocumentSlot,
        upload: FileUpload,
    ) -> Result<String, UploadError> {
        self.uploads
            .upload_document(self.wizard.form_mut(), slot, upload)
    }

    pub fn clear_document(&mut self, slot: DocumentSlot) -> bool {
        self.uploads.clear_document(self.wizard.form_mut(), slot)
    }

    pub fn upload_certificate(
        &mut self,
        category: ClaimCategory,
        upload: FileUpload,
    ) -> Result<String, UploadError> {
        self.uploads.upload_claim_certificate(category, upload)
    }

    pub fn add_claim(&mut self, category: ClaimCategory, claim: Claim) -> Result<usize, WizardError> {
        self.wizard.add_claim(category, claim)
    }

    /// Remove a claim and delete its certificate if this session uploaded it.
    pub fn remove_claim(
        &mut self,
        category: ClaimCategory,
        index: usize,
    ) -> Result<Claim, WizardError> {
        let claim = self.wizard.remove_claim(category, index)?;
        if let Some(url) = claim.certificate() {
            self.uploads.discard(url);
        }
        Ok(claim)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Store the application and make this session's uploads permanent. A draft submits once.
    pub fn submit<R, N>(
        &mut self,
        service: &NominationService<R, B, N>,
        confirmed: bool,
    ) -> Result<SubmissionReceipt, DraftSubmitError>
    where
        R: ApplicationRepository + 'static,
        B: 'static,
        N: StatusNotifier + 'static,
    {
        if self.submitted {
            return Err(DraftSubmitError::AlreadySubmitted);
        }
        let form = self.wizard.submission_form()?;
        let receipt = service.submit(form, confirmed)?;
        self.submitted = true;
        let committed = self.uploads.commit();
        debug!(files = committed.len(), "draft uploads committed");
        Ok(receipt)
    }

    pub fn abandon(mut self) -> CleanupReport {
        self.uploads.abandon()
    }
}

/// Open drafts keyed by id, expired after a period without activity.
#[derive(Debug)]
pub struct DraftRegistry<B: BlobStore> {
    idle_ttl: Duration,
    drafts: Mutex<HashMap<DraftId, Draft<B>>>,
}

impl<B: BlobStore> DraftRegistry<B> {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            idle_ttl,
            drafts: Mutex::new(HashMap::new()),
        }
    }

    fn drafts(&self) -> std::sync::MutexGuard<'_, HashMap<DraftId, Draft<B>>> {
        self.drafts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self, uploads: UploadTracker<B>) -> DraftId {
        let id = DraftId::generate();
        self.drafts().insert(id.clone(), Draft::new(uploads));
        debug!(draft_id = %id, "draft opened");
        id
    }

    /// Run `action` against a live draft, marking it as recently used.
    pub fn with_draft<T>(
        &self,
        id: &DraftId,
        action: impl FnOnce(&mut Draft<B>) -> T,
    ) -> Result<T, DraftNotFound> {
        let mut drafts = self.drafts();
        let draft = drafts
            .get_mut(id)
            .ok_or_else(|| DraftNotFound(id.clone()))?;
        draft.last_touched = Utc::now();
        Ok(action(draft))
    }

    pub fn take(&self, id: &DraftId) -> Result<Draft<B>, DraftNotFound> {
        self.drafts()
            .remove(id)
            .ok_or_else(|| DraftNotFound(id.clone()))
    }

    /// Submit a draft while holding it outside the registry, so a repeated request finds
    /// nothing to submit. A rejected draft goes back for correction.
    pub fn submit<R, N>(
        &self,
        id: &DraftId,
        service: &NominationService<R, B, N>,
        confirmed: bool,
    ) -> Result<SubmissionReceipt, DraftSubmitError>
    where
        R: ApplicationRepository + 'static,
        B: 'static,
        N: StatusNotifier + 'static,
    {
        let mut draft = self.take(id)?;
        match draft.submit(service, confirmed) {
            Ok(receipt) => {
                info!(
                    draft_id = %id,
                    application_id = %receipt.application_id,
                    "draft submitted"
                );
                Ok(receipt)
            }
            Err(err) => {
                draft.last_touched = Utc::now();
                self.drafts().insert(id.clone(), draft);
                Err(err)
            }
        }
    }

    pub fn abandon(&self, id: &DraftId) -> Result<CleanupReport, DraftNotFound> {
        let draft = self.take(id)?;
        let report = draft.abandon();
        info!(
            draft_id = %id,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "draft abandoned"
        );
        Ok(report)
    }

    /// Abandon every draft idle since before `now - idle_ttl`.
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.idle_ttl;
        let expired: Vec<(DraftId, Draft<B>)> = {
            let mut drafts = self.drafts();
            let ids: Vec<DraftId> = drafts
                .iter()
                .filter(|(_, draft)| draft.last_touched < cutoff)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| drafts.remove(&id).map(|draft| (id, draft)))
                .collect()
        };

        let swept = expired.len();
        for (id, draft) in expired {
            let report = draft.abandon();
            info!(
                draft_id = %id,
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "idle draft expired"
            );
        }
        swept
    }

    pub fn len(&self) -> usize {
        self.drafts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
