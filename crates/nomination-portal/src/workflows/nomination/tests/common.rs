use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::nomination::admin::{AccessGate, AdminSessions};
use crate::workflows::nomination::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Claim, Comment, NominationForm, Review,
};
use crate::workflows::nomination::drafts::DraftRegistry;
use crate::workflows::nomination::email::EmailMessage;
use crate::workflows::nomination::memory::{MemoryBlobStore, MemoryNotifier, MemoryRepository};
use crate::workflows::nomination::repository::{
    ApplicationRepository, BlobError, BlobStore, NotifyError, RepositoryError, StatusNotifier,
    StoredBlob,
};
use crate::workflows::nomination::router::{portal_router, PortalState};
use crate::workflows::nomination::service::{NominationService, PortalSettings};
use crate::workflows::nomination::token::StatusToken;
use crate::workflows::nomination::uploads::{FileUpload, UploadPolicy};

pub(super) const ADMIN_PASSWORD: &str = "s3cret-review";
pub(super) const BUCKET_URL: &str = "https://cdn.example/storage/v1/object/public/tops-uploads";

pub(super) type MemoryService = NominationService<MemoryRepository, MemoryBlobStore, MemoryNotifier>;

pub(super) fn settings() -> PortalSettings {
    PortalSettings {
        public_base_url: "https://tops.example".to_string(),
        upload_policy: UploadPolicy::default(),
    }
}

pub(super) fn claim(name: &str, participation: &str) -> Claim {
    Claim {
        name: name.to_string(),
        type_of_participation: participation.to_string(),
        rank: "1st Place".to_string(),
        level: "Provincial".to_string(),
        modality: Some("Face-to-face".to_string()),
        file_url: None,
    }
}

/// Every required field filled, documents bound, privacy accepted.
pub(super) fn complete_form() -> NominationForm {
    NominationForm {
        full_name: "Maria Santos".to_string(),
        complete_address: "Purok 3, Barangay Poblacion".to_string(),
        municipality: "Sibalom".to_string(),
        phone_number: "09171234567".to_string(),
        email: "maria@example.com".to_string(),
        birthday: "2008-04-12".to_string(),
        age: 17,
        sex: "Female".to_string(),
        school_level: "Senior High School".to_string(),
        school_name: "Antique National School".to_string(),
        school_address: "San Jose de Buenavista".to_string(),
        school_head_name: "Dr. Ramon Cruz".to_string(),
        school_head_email: "principal@ans.edu.ph".to_string(),
        school_head_mobile: "09181112222".to_string(),
        class_advisor_name: "Ms. Liza Reyes".to_string(),
        class_advisor_email: "advisor@ans.edu.ph".to_string(),
        class_advisor_mobile: "09183334444".to_string(),
        nomination_letter_url: Some(format!("{BUCKET_URL}/1700000000000-aaaaaa.pdf")),
        academic_records_url: Some(format!("{BUCKET_URL}/1700000000001-bbbbbb.pdf")),
        certificate_truthfulness_url: Some(format!("{BUCKET_URL}/1700000000002-cccccc.pdf")),
        photo_2x2_url: Some(format!("{BUCKET_URL}/1700000000003-dddddd.jpg")),
        academic_claims: vec![Claim {
            modality: None,
            file_url: Some(format!("{BUCKET_URL}/academic-1700000000004-eeeeee.pdf")),
            ..claim("Math Olympiad", "Contestant")
        }],
        leadership_claims: vec![claim("Supreme Student Government", "President")],
        community_service_claims: Vec::new(),
        data_privacy_accepted: true,
    }
}

pub(super) fn fixed_time(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 8, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn record(id: &str, form: NominationForm, created_at: DateTime<Utc>) -> ApplicationRecord {
    ApplicationRecord {
        id: ApplicationId(id.to_string()),
        form,
        status: ApplicationStatus::Pending,
        public_status_token: StatusToken::generate(),
        created_at,
        updated_at: created_at,
    }
}

pub(super) fn pdf(name: &str) -> FileUpload {
    FileUpload::new(name, "application/pdf", b"%PDF-1.7 test".to_vec())
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryRepository>,
    Arc<MemoryBlobStore>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let blobs = Arc::new(MemoryBlobStore::new(BUCKET_URL));
    let notifier = Arc::new(MemoryNotifier::default());
    let service = NominationService::new(
        repository.clone(),
        blobs.clone(),
        notifier.clone(),
        settings(),
    );
    (service, repository, blobs, notifier)
}

pub(super) fn portal_state<R, B, N>(
    service: NominationService<R, B, N>,
    access_code: Option<&str>,
) -> PortalState<R, B, N>
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    PortalState {
        service: Arc::new(service),
        drafts: Arc::new(DraftRegistry::new(Duration::hours(2))),
        sessions: Arc::new(AdminSessions::new(Duration::hours(8))),
        gate: Arc::new(AccessGate::new(
            ADMIN_PASSWORD,
            access_code.map(str::to_string),
        )),
    }
}

pub(super) fn router_with_state<R, B, N>(state: PortalState<R, B, N>) -> axum::Router
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    portal_router(state)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

/// Record store that is always down.
#[derive(Debug, Default)]
pub(super) struct UnavailableRepository;

impl UnavailableRepository {
    fn down<T>() -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Self::down()
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Self::down()
    }

    fn find_by_token(
        &self,
        _token: &StatusToken,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Self::down()
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Self::down()
    }

    fn update_status(
        &self,
        _id: &ApplicationId,
        _status: ApplicationStatus,
        _updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Self::down()
    }

    fn delete(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn insert_comment(&self, _comment: Comment) -> Result<Comment, RepositoryError> {
        Self::down()
    }

    fn comments(&self, _id: &ApplicationId) -> Result<Vec<Comment>, RepositoryError> {
        Self::down()
    }

    fn delete_comments(&self, _id: &ApplicationId) -> Result<usize, RepositoryError> {
        Self::down()
    }

    fn insert_review(&self, _review: Review) -> Result<Review, RepositoryError> {
        Self::down()
    }

    fn delete_reviews(&self, _id: &ApplicationId) -> Result<usize, RepositoryError> {
        Self::down()
    }
}

/// Memory bucket that counts writes and can be told to fail writes or deletes.
#[derive(Debug)]
pub(super) struct FlakyBlobStore {
    inner: MemoryBlobStore,
    fail_puts: bool,
    failing_deletes: Mutex<Vec<String>>,
    puts: AtomicUsize,
}

impl FlakyBlobStore {
    pub(super) fn healthy() -> Self {
        Self {
            inner: MemoryBlobStore::new(BUCKET_URL),
            fail_puts: false,
            failing_deletes: Mutex::new(Vec::new()),
            puts: AtomicUsize::new(0),
        }
    }

    pub(super) fn rejecting_writes() -> Self {
        Self {
            fail_puts: true,
            ..Self::healthy()
        }
    }

    pub(super) fn fail_delete_of(&self, name: &str) {
        self.failing_deletes
            .lock()
            .expect("lock")
            .push(name.to_string());
    }

    pub(super) fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub(super) fn inner(&self) -> &MemoryBlobStore {
        &self.inner
    }
}

impl BlobStore for FlakyBlobStore {
    fn put(&self, name: &str, content_type: &str, bytes: &[u8]) -> Result<(), BlobError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(BlobError::Unavailable("bucket offline".to_string()));
        }
        self.inner.put(name, content_type, bytes)
    }

    fn public_url(&self, name: &str) -> String {
        self.inner.public_url(name)
    }

    fn delete(&self, name: &str) -> Result<(), BlobError> {
        let failing = self
            .failing_deletes
            .lock()
            .expect("lock")
            .iter()
            .any(|failing| failing == name);
        if failing {
            return Err(BlobError::Unavailable("delete timed out".to_string()));
        }
        self.inner.delete(name)
    }

    fn list(&self) -> Result<Vec<StoredBlob>, BlobError> {
        self.inner.list()
    }
}

/// Relay that refuses every message.
#[derive(Debug, Default)]
pub(super) struct OfflineNotifier;

impl StatusNotifier for OfflineNotifier {
    fn send(&self, _message: EmailMessage) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay unreachable".to_string()))
    }
}
