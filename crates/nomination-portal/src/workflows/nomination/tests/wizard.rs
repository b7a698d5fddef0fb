use super::common::*;

use crate::workflows::nomination::domain::{
    ClaimCategory, DocumentSlot, NominationForm, MAX_CLAIMS_PER_CATEGORY,
};
use crate::workflows::nomination::wizard::{FormWizard, WizardError, WizardStep};

fn wizard_with(form: NominationForm) -> FormWizard {
    let mut wizard = FormWizard::new();
    *wizard.form_mut() = form;
    wizard
}

#[test]
fn next_refuses_to_leave_general_info_with_missing_fields() {
    let mut wizard = wizard_with(NominationForm {
        full_name: "Maria Santos".to_string(),
        email: "maria@example.com".to_string(),
        ..NominationForm::default()
    });

    let err = wizard.next().expect_err("incomplete step");
    match err {
        WizardError::Step { step, missing } => {
            assert_eq!(step, WizardStep::GeneralInfo);
            assert!(missing.contains(&"municipality"));
            assert!(missing.contains(&"age"));
            assert!(!missing.contains(&"full_name"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(wizard.step(), WizardStep::GeneralInfo);
}

#[test]
fn each_single_blank_field_blocks_its_step() {
    let blanks: [(WizardStep, fn(&mut NominationForm)); 4] = [
        (WizardStep::GeneralInfo, |form| form.sex.clear()),
        (WizardStep::SchoolDetails, |form| {
            form.class_advisor_mobile = "   ".to_string()
        }),
        (WizardStep::Requirements, |form| form.photo_2x2_url = None),
        (WizardStep::PrivacySubmit, |form| {
            form.data_privacy_accepted = false
        }),
    ];

    for (step, blank) in blanks {
        let mut form = complete_form();
        blank(&mut form);
        assert_eq!(
            step.missing_fields(&form).len(),
            1,
            "{step} should report exactly one missing field"
        );
    }
}

#[test]
fn complete_form_walks_to_the_final_step() {
    let mut wizard = wizard_with(complete_form());
    for expected in WizardStep::ALL.iter().skip(1) {
        assert_eq!(wizard.next().expect("step valid"), *expected);
    }
    assert!(wizard.step().is_last());
    assert_eq!(wizard.next(), Err(WizardError::AlreadyAtLastStep));
    assert!(wizard.submission_form().is_ok());
}

#[test]
fn empty_claim_steps_do_not_block() {
    let mut form = complete_form();
    form.academic_claims.clear();
    form.leadership_claims.clear();
    let mut wizard = wizard_with(form);

    while !wizard.step().is_last() {
        wizard.next().expect("claims are optional");
    }
    assert_eq!(wizard.step().number(), 7);
}

#[test]
fn requirements_step_needs_all_four_documents() {
    let mut form = complete_form();
    form.academic_records_url = Some(String::new());
    form.certificate_truthfulness_url = None;

    let missing = WizardStep::Requirements.missing_fields(&form);
    assert_eq!(
        missing,
        vec![
            DocumentSlot::AcademicRecords.field_name(),
            DocumentSlot::CertificateTruthfulness.field_name(),
        ]
    );
}

#[test]
fn prev_never_validates_and_stops_at_first_step() {
    let mut wizard = wizard_with(complete_form());
    wizard.next().expect("general info valid");
    wizard.form_mut().full_name.clear();

    assert_eq!(wizard.prev(), WizardStep::GeneralInfo);
    assert_eq!(wizard.prev(), WizardStep::GeneralInfo);
}

#[test]
fn submission_requires_final_step() {
    let wizard = wizard_with(complete_form());
    assert_eq!(
        wizard.submission_form().err(),
        Some(WizardError::NotAtFinalStep)
    );
}

#[test]
fn twenty_first_claim_is_rejected_in_every_category() {
    for category in ClaimCategory::ALL {
        let mut wizard = FormWizard::new();
        for index in 0..MAX_CLAIMS_PER_CATEGORY {
            let count = wizard
                .add_claim(category, claim(&format!("Entry {index}"), "Participant"))
                .expect("under the limit");
            assert_eq!(count, index + 1);
        }

        let err = wizard
            .add_claim(category, claim("One more", "Participant"))
            .expect_err("limit reached");
        assert_eq!(
            err,
            WizardError::ClaimLimitReached {
                category,
                limit: MAX_CLAIMS_PER_CATEGORY,
            }
        );
        assert_eq!(wizard.form().claims(category).len(), MAX_CLAIMS_PER_CATEGORY);
    }
}

#[test]
fn community_limit_message_names_the_category() {
    let mut wizard = FormWizard::new();
    for index in 0..MAX_CLAIMS_PER_CATEGORY {
        wizard
            .add_claim(
                ClaimCategory::Community,
                claim(&format!("Coastal cleanup {index}"), "Volunteer"),
            )
            .expect("under the limit");
    }
    let err = wizard
        .add_claim(ClaimCategory::Community, claim("One more", "Volunteer"))
        .expect_err("limit reached");
    assert_eq!(err.to_string(), "Maximum 20 community service claims allowed");
}

#[test]
fn claims_need_name_and_participation() {
    let mut wizard = FormWizard::new();
    assert_eq!(
        wizard.add_claim(ClaimCategory::Leadership, claim("  ", "President")),
        Err(WizardError::IncompleteClaim)
    );
    assert_eq!(
        wizard.add_claim(ClaimCategory::Leadership, claim("Council", "")),
        Err(WizardError::IncompleteClaim)
    );
    assert!(wizard.form().leadership_claims.is_empty());
}

#[test]
fn academic_claims_drop_modality() {
    let mut wizard = FormWizard::new();
    wizard
        .add_claim(ClaimCategory::Academic, claim("Science Fair", "Contestant"))
        .expect("valid claim");
    wizard
        .add_claim(ClaimCategory::Leadership, claim("Youth Council", "Officer"))
        .expect("valid claim");

    assert_eq!(wizard.form().academic_claims[0].modality, None);
    assert_eq!(
        wizard.form().leadership_claims[0].modality.as_deref(),
        Some("Face-to-face")
    );
}

#[test]
fn remove_claim_returns_the_removed_entry() {
    let mut wizard = FormWizard::new();
    wizard
        .add_claim(ClaimCategory::Academic, claim("Quiz Bee", "Contestant"))
        .expect("valid");
    wizard
        .add_claim(ClaimCategory::Academic, claim("Spelling Bee", "Contestant"))
        .expect("valid");

    let removed = wizard
        .remove_claim(ClaimCategory::Academic, 0)
        .expect("exists");
    assert_eq!(removed.name, "Quiz Bee");
    assert_eq!(wizard.form().academic_claims[0].name, "Spelling Bee");
    assert_eq!(
        wizard.remove_claim(ClaimCategory::Academic, 5),
        Err(WizardError::ClaimNotFound {
            category: ClaimCategory::Academic,
            index: 5,
        })
    );
}
