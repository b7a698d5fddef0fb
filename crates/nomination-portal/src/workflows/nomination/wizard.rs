use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{Claim, ClaimCategory, DocumentSlot, NominationForm, MAX_CLAIMS_PER_CATEGORY};

/// The seven ordered steps of the nomination form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    GeneralInfo,
    SchoolDetails,
    Requirements,
    AcademicProfile,
    LeadershipProfile,
    CommunityService,
    PrivacySubmit,
}

impl WizardStep {
    pub const ALL: [WizardStep; 7] = [
        WizardStep::GeneralInfo,
        WizardStep::SchoolDetails,
        WizardStep::Requirements,
        WizardStep::AcademicProfile,
        WizardStep::LeadershipProfile,
        WizardStep::CommunityService,
        WizardStep::PrivacySubmit,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            WizardStep::GeneralInfo => "General Information",
            WizardStep::SchoolDetails => "School Details",
            WizardStep::Requirements => "Requirements",
            WizardStep::AcademicProfile => "Academic Profile",
            WizardStep::LeadershipProfile => "Leadership Profile",
            WizardStep::CommunityService => "Community Service",
            WizardStep::PrivacySubmit => "Data Privacy & Submit",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// One-based position shown as "Step n of 7".
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn following(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn preceding(self) -> Option<Self> {
        self.index().checked_sub(1).map(|index| Self::ALL[index])
    }

    pub fn is_last(self) -> bool {
        self.following().is_none()
    }

    /// Required fields that are still empty for this step.
    pub fn missing_fields(self, form: &NominationForm) -> Vec<&'static str> {
        fn blank(value: &str) -> bool {
            value.trim().is_empty()
        }

        let checks: Vec<(&'static str, bool)> = match self {
            WizardStep::GeneralInfo => vec![
                ("full_name", blank(&form.full_name)),
                ("complete_address", blank(&form.complete_address)),
                ("municipality", blank(&form.municipality)),
                ("phone_number", blank(&form.phone_number)),
                ("email", blank(&form.email)),
                ("birthday", blank(&form.birthday)),
                ("age", form.age == 0),
                ("sex", blank(&form.sex)),
            ],
            WizardStep::SchoolDetails => vec![
                ("school_level", blank(&form.school_level)),
                ("school_name", blank(&form.school_name)),
                ("school_address", blank(&form.school_address)),
                ("school_head_name", blank(&form.school_head_name)),
                ("school_head_email", blank(&form.school_head_email)),
                ("school_head_mobile", blank(&form.school_head_mobile)),
                ("class_advisor_name", blank(&form.class_advisor_name)),
                ("class_advisor_email", blank(&form.class_advisor_email)),
                ("class_advisor_mobile", blank(&form.class_advisor_mobile)),
            ],
            WizardStep::Requirements => DocumentSlot::ALL
                .iter()
                .map(|slot| (slot.field_name(), form.document(*slot).is_none()))
                .collect(),
            WizardStep::AcademicProfile
            | WizardStep::LeadershipProfile
            | WizardStep::CommunityService => Vec::new(),
            WizardStep::PrivacySubmit => {
                vec![("data_privacy_accepted", !form.data_privacy_accepted)]
            }
        };

        checks
            .into_iter()
            .filter_map(|(field, missing)| missing.then_some(field))
            .collect()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Please complete the required fields in {step}: {}", .missing.join(", "))]
    Step {
        step: WizardStep,
        missing: Vec<&'static str>,
    },
    #[error("already at the final step")]
    AlreadyAtLastStep,
    #[error("submission is only available from the final step")]
    NotAtFinalStep,
    #[error("Maximum {limit} {category} claims allowed")]
    ClaimLimitReached {
        category: ClaimCategory,
        limit: usize,
    },
    #[error("Please fill in at least the name and type of participation")]
    IncompleteClaim,
    #[error("no {category} claim at position {index}")]
    ClaimNotFound {
        category: ClaimCategory,
        index: usize,
    },
}

/// In-memory wizard: current step plus the form being filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormWizard {
    step: WizardStep,
    form: NominationForm,
}

impl FormWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &NominationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut NominationForm {
        &mut self.form
    }

    /// Validate the current step and advance; the index is untouched on failure.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let missing = self.step.missing_fields(&self.form);
        if !missing.is_empty() {
            return Err(WizardError::Step {
                step: self.step,
                missing,
            });
        }

        let next = self.step.following().ok_or(WizardError::AlreadyAtLastStep)?;
        self.step = next;
        Ok(next)
    }

    pub fn prev(&mut self) -> WizardStep {
        if let Some(previous) = self.step.preceding() {
            self.step = previous;
        }
        self.step
    }

    /// Append a claim, returning the new count for the category.
    pub fn add_claim(
        &mut self,
        category: ClaimCategory,
        mut claim: Claim,
    ) -> Result<usize, WizardError> {
        let claims = self.form.claims_mut(category);
        if claims.len() >= MAX_CLAIMS_PER_CATEGORY {
            return Err(WizardError::ClaimLimitReached {
                category,
                limit: MAX_CLAIMS_PER_CATEGORY,
            });
        }
        if claim.name.trim().is_empty() || claim.type_of_participation.trim().is_empty() {
            return Err(WizardError::IncompleteClaim);
        }

        if !category.has_modality() {
            claim.modality = None;
        }
        if claim.file_url.as_deref() == Some("") {
            claim.file_url = None;
        }

        claims.push(claim);
        Ok(claims.len())
    }

    pub fn remove_claim(
        &mut self,
        category: ClaimCategory,
        index: usize,
    ) -> Result<Claim, WizardError> {
        let claims = self.form.claims_mut(category);
        if index >= claims.len() {
            return Err(WizardError::ClaimNotFound { category, index });
        }
        Ok(claims.remove(index))
    }

    /// The form as it stands, provided the wizard has reached the final step.
    pub fn submission_form(&self) -> Result<&NominationForm, WizardError> {
        if self.step.is_last() {
            Ok(&self.form)
        } else {
            Err(WizardError::NotAtFinalStep)
        }
    }
}
