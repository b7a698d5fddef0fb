use std::sync::Arc;

use chrono::TimeZone;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::common::*;

use crate::workflows::nomination::domain::{ClaimCategory, DocumentSlot, NominationForm};
use crate::workflows::nomination::memory::MemoryBlobStore;
use crate::workflows::nomination::repository::{object_name_from_url, BlobStore};
use crate::workflows::nomination::uploads::{
    object_name, FileUpload, UploadError, UploadPolicy, UploadRejected, UploadTracker,
    MAX_UPLOAD_BYTES,
};

fn tracker(store: &Arc<FlakyBlobStore>) -> UploadTracker<FlakyBlobStore> {
    UploadTracker::new(store.clone(), UploadPolicy::default())
}

#[test]
fn oversized_upload_is_rejected_before_storage() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();

    let big = FileUpload::new(
        "scan.pdf",
        "application/pdf",
        vec![0_u8; MAX_UPLOAD_BYTES + 1],
    );
    let err = uploads
        .upload_document(&mut form, DocumentSlot::NominationLetter, big)
        .expect_err("too large");

    assert!(matches!(
        err,
        UploadError::Rejected(UploadRejected::TooLarge { max_mb: 5, .. })
    ));
    assert_eq!(form.nomination_letter_url, None);
    assert_eq!(store.puts(), 0);
}

#[test]
fn exactly_five_megabytes_is_accepted() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();

    let upload = FileUpload::new("records.png", "image/png", vec![7_u8; MAX_UPLOAD_BYTES]);
    uploads
        .upload_document(&mut form, DocumentSlot::AcademicRecords, upload)
        .expect("at the limit");
    assert_eq!(store.puts(), 1);
}

#[test]
fn disallowed_type_is_rejected_before_storage() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();

    let doc = FileUpload::new(
        "letter.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        b"PK".to_vec(),
    );
    let err = uploads
        .upload_document(&mut form, DocumentSlot::NominationLetter, doc)
        .expect_err("unsupported");

    assert!(matches!(
        err,
        UploadError::Rejected(UploadRejected::UnsupportedType { .. })
    ));
    assert!(err.to_string().contains("Nomination Letter"));
    assert_eq!(form.nomination_letter_url, None);
    assert_eq!(store.puts(), 0);
}

#[test]
fn storage_failure_leaves_form_untouched() {
    let store = Arc::new(FlakyBlobStore::rejecting_writes());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();

    let err = uploads
        .upload_document(&mut form, DocumentSlot::Photo2x2, pdf("photo.pdf"))
        .expect_err("bucket offline");

    assert_eq!(err.to_string(), "Failed to upload file. Please try again.");
    assert_eq!(form.photo_2x2_url, None);
    assert!(uploads.temporary().is_empty());
}

#[test]
fn replacing_a_document_deletes_the_previous_blob() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();

    let first = uploads
        .upload_document(&mut form, DocumentSlot::NominationLetter, pdf("v1.pdf"))
        .expect("stored");
    let second = uploads
        .upload_document(&mut form, DocumentSlot::NominationLetter, pdf("v2.pdf"))
        .expect("stored");

    assert_ne!(first, second);
    assert_eq!(form.nomination_letter_url.as_deref(), Some(second.as_str()));
    assert!(!store.inner().contains(&object_name_from_url(&first)));
    assert!(store.inner().contains(&object_name_from_url(&second)));
    assert_eq!(uploads.temporary(), vec![second]);
}

#[test]
fn failed_replacement_delete_is_only_logged() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();

    let first = uploads
        .upload_document(&mut form, DocumentSlot::Photo2x2, pdf("a.pdf"))
        .expect("stored");
    store.fail_delete_of(&object_name_from_url(&first));

    let second = uploads
        .upload_document(&mut form, DocumentSlot::Photo2x2, pdf("b.pdf"))
        .expect("replacement still succeeds");
    assert_eq!(form.photo_2x2_url.as_deref(), Some(second.as_str()));
    assert!(!uploads.is_temporary(&first));
}

#[test]
fn abandon_deletes_every_temporary_upload() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();

    uploads
        .upload_document(&mut form, DocumentSlot::NominationLetter, pdf("letter.pdf"))
        .expect("stored");
    uploads
        .upload_claim_certificate(ClaimCategory::Leadership, pdf("cert.pdf"))
        .expect("stored");
    assert_eq!(store.inner().len(), 2);

    let report = uploads.abandon();
    assert_eq!(report.deleted.len(), 2);
    assert!(report.failed.is_empty());
    assert!(store.inner().is_empty());
}

#[test]
fn abandon_reports_failed_deletes() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let stuck = uploads
        .upload_claim_certificate(ClaimCategory::Academic, pdf("cert.pdf"))
        .expect("stored");
    store.fail_delete_of(&object_name_from_url(&stuck));

    let report = uploads.abandon();
    assert_eq!(report.failed, vec![stuck]);
    assert!(uploads.temporary().is_empty());
}

#[test]
fn commit_keeps_blobs_and_dropping_afterwards_deletes_nothing() {
    let store = Arc::new(FlakyBlobStore::healthy());
    {
        let mut uploads = tracker(&store);
        let mut form = NominationForm::default();
        uploads
            .upload_document(&mut form, DocumentSlot::AcademicRecords, pdf("grades.pdf"))
            .expect("stored");
        assert_eq!(uploads.commit().len(), 1);
    }
    assert_eq!(store.inner().len(), 1);
}

#[test]
fn dropping_an_uncommitted_tracker_cleans_up() {
    let store = Arc::new(FlakyBlobStore::healthy());
    {
        let mut uploads = tracker(&store);
        uploads
            .upload_claim_certificate(ClaimCategory::Community, pdf("cleanup.pdf"))
            .expect("stored");
    }
    assert!(store.inner().is_empty());
}

#[test]
fn discard_ignores_urls_this_session_did_not_upload() {
    let store = Arc::new(MemoryBlobStore::new(BUCKET_URL));
    store
        .put("foreign.pdf", "application/pdf", b"x")
        .expect("seeded");
    let mut uploads = UploadTracker::new(store.clone(), UploadPolicy::default());

    assert!(!uploads.discard(&store.public_url("foreign.pdf")));
    assert!(store.contains("foreign.pdf"));
}

#[test]
fn clear_document_unbinds_and_deletes() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();
    let url = uploads
        .upload_document(&mut form, DocumentSlot::CertificateTruthfulness, pdf("c.pdf"))
        .expect("stored");

    assert!(uploads.clear_document(&mut form, DocumentSlot::CertificateTruthfulness));
    assert_eq!(form.certificate_truthfulness_url, None);
    assert!(!store.inner().contains(&object_name_from_url(&url)));
    assert!(!uploads.clear_document(&mut form, DocumentSlot::CertificateTruthfulness));
}

#[test]
fn object_names_follow_timestamp_random_extension_layout() {
    let now = chrono::Utc
        .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
        .single()
        .expect("valid timestamp");
    let mut rng = StdRng::seed_from_u64(11);

    let document = object_name(None, "pdf", now, &mut rng);
    let certificate = object_name(Some(ClaimCategory::Leadership), "png", now, &mut rng);

    let stamp = now.timestamp_millis().to_string();
    let (head, ext) = document.rsplit_once('.').expect("extension");
    assert_eq!(ext, "pdf");
    let (prefix, suffix) = head.split_once('-').expect("separator");
    assert_eq!(prefix, stamp);
    assert_eq!(suffix.len(), 6);
    assert!(suffix
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));

    assert!(certificate.starts_with(&format!("leadership-{stamp}-")));
    assert!(certificate.ends_with(".png"));
}

#[test]
fn extension_comes_from_the_accepted_content_type() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let url = uploads
        .upload_claim_certificate(
            ClaimCategory::Academic,
            FileUpload::new("", "image/jpeg", b"\xFF\xD8".to_vec()),
        )
        .expect("stored");
    assert!(url.ends_with(".jpg"));
    assert!(url.starts_with(BUCKET_URL));
}

#[test]
fn client_file_name_cannot_choose_the_stored_extension() {
    let store = Arc::new(FlakyBlobStore::healthy());
    let mut uploads = tracker(&store);
    let mut form = NominationForm::default();

    let disguised = FileUpload::new(
        "letter.html",
        "application/pdf",
        b"<script>alert(1)</script>".to_vec(),
    );
    let url = uploads
        .upload_document(&mut form, DocumentSlot::NominationLetter, disguised)
        .expect("declared type is accepted");

    let name = object_name_from_url(&url);
    assert!(name.ends_with(".pdf"), "unexpected object name {name}");
    let stored = store.inner().read(&name).expect("object stored");
    assert_eq!(stored.content_type, "application/pdf");
}
