use chrono::Duration;

use super::common::*;

use crate::workflows::nomination::domain::DocumentSlot;
use crate::workflows::nomination::drafts::{Draft, DraftId, DraftRegistry, DraftSubmitError};
use crate::workflows::nomination::memory::MemoryBlobStore;
use crate::workflows::nomination::repository::{object_name_from_url, ApplicationRepository};
use crate::workflows::nomination::service::{ServiceError, SubmissionError};

fn walk_to_final_step(draft: &mut Draft<MemoryBlobStore>) {
    *draft.wizard_mut().form_mut() = complete_form();
    while !draft.wizard().step().is_last() {
        draft.wizard_mut().next().expect("step complete");
    }
}

fn ready_draft(service: &MemoryService) -> Draft<MemoryBlobStore> {
    let mut draft = Draft::new(service.upload_tracker());
    walk_to_final_step(&mut draft);
    draft
}

fn registry_with_ready_draft(
    service: &MemoryService,
) -> (DraftRegistry<MemoryBlobStore>, DraftId, String) {
    let registry = DraftRegistry::new(Duration::hours(2));
    let id = registry.open(service.upload_tracker());
    let letter = registry
        .with_draft(&id, |draft| {
            walk_to_final_step(draft);
            draft.upload_document(DocumentSlot::NominationLetter, pdf("letter.pdf"))
        })
        .expect("draft open")
        .expect("stored");
    (registry, id, letter)
}

#[test]
fn a_draft_submits_only_once() {
    let (service, repository, _, _) = build_service();
    let mut draft = ready_draft(&service);

    draft.submit(&service, true).expect("first submission");
    assert!(draft.is_submitted());

    let err = draft.submit(&service, true).expect_err("second submission");
    assert!(matches!(err, DraftSubmitError::AlreadySubmitted));
    assert_eq!(repository.list().expect("list").len(), 1);
}

#[test]
fn repeated_registry_submit_finds_no_draft() {
    let (service, repository, blobs, _) = build_service();
    let (registry, id, letter) = registry_with_ready_draft(&service);

    let receipt = registry.submit(&id, &service, true).expect("submitted");
    assert!(registry.is_empty());

    let err = registry
        .submit(&id, &service, true)
        .expect_err("draft already consumed");
    assert!(matches!(err, DraftSubmitError::NotFound(_)));

    let stored = repository.list().expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, receipt.application_id);
    assert!(blobs.contains(&object_name_from_url(&letter)));
}

#[test]
fn rejected_submission_returns_the_draft_for_correction() {
    let (service, repository, blobs, _) = build_service();
    let (registry, id, letter) = registry_with_ready_draft(&service);

    let err = registry
        .submit(&id, &service, false)
        .expect_err("confirmation missing");
    assert!(matches!(
        err,
        DraftSubmitError::Service(ServiceError::Submission(SubmissionError::NotConfirmed))
    ));
    assert_eq!(registry.len(), 1);
    assert!(blobs.contains(&object_name_from_url(&letter)));
    assert!(repository.list().expect("list").is_empty());

    registry.submit(&id, &service, true).expect("submitted");
    assert!(registry.is_empty());
    assert!(blobs.contains(&object_name_from_url(&letter)));
}
