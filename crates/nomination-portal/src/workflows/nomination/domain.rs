use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::StatusToken;

/// Upper bound on claims per category.
pub const MAX_CLAIMS_PER_CATEGORY: usize = 20;

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three repeatable achievement lists collected by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimCategory {
    Academic,
    Leadership,
    Community,
}

impl ClaimCategory {
    pub const ALL: [ClaimCategory; 3] = [
        ClaimCategory::Academic,
        ClaimCategory::Leadership,
        ClaimCategory::Community,
    ];

    /// Label used in exports and file ownership listings.
    pub const fn label(self) -> &'static str {
        match self {
            ClaimCategory::Academic => "Academic",
            ClaimCategory::Leadership => "Leadership",
            ClaimCategory::Community => "Community Service",
        }
    }

    /// Prefix applied to certificate object names.
    pub const fn file_prefix(self) -> &'static str {
        match self {
            ClaimCategory::Academic => "academic",
            ClaimCategory::Leadership => "leadership",
            ClaimCategory::Community => "community",
        }
    }

    /// Academic claims are never tagged with a modality.
    pub const fn has_modality(self) -> bool {
        !matches!(self, ClaimCategory::Academic)
    }
}

impl fmt::Display for ClaimCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimCategory::Academic => f.write_str("academic"),
            ClaimCategory::Leadership => f.write_str("leadership"),
            ClaimCategory::Community => f.write_str("community service"),
        }
    }
}

impl FromStr for ClaimCategory {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "academic" => Ok(Self::Academic),
            "leadership" => Ok(Self::Leadership),
            "community" | "community_service" | "community-service" => Ok(Self::Community),
            other => Err(UnknownVariant {
                kind: "claim category",
                value: other.to_string(),
            }),
        }
    }
}

/// A single achievement entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Claim {
    pub name: String,
    pub type_of_participation: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl Claim {
    pub fn certificate(&self) -> Option<&str> {
        self.file_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// The four documents every nomination must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    NominationLetter,
    AcademicRecords,
    CertificateTruthfulness,
    Photo2x2,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::NominationLetter,
        DocumentSlot::AcademicRecords,
        DocumentSlot::CertificateTruthfulness,
        DocumentSlot::Photo2x2,
    ];

    /// Column name of the URL field in the stored record.
    pub const fn field_name(self) -> &'static str {
        match self {
            DocumentSlot::NominationLetter => "nomination_letter_url",
            DocumentSlot::AcademicRecords => "academic_records_url",
            DocumentSlot::CertificateTruthfulness => "certificate_truthfulness_url",
            DocumentSlot::Photo2x2 => "photo_2x2_url",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentSlot::NominationLetter => "Nomination Letter",
            DocumentSlot::AcademicRecords => "Academic Records",
            DocumentSlot::CertificateTruthfulness => "Certificate of Truthfulness",
            DocumentSlot::Photo2x2 => "Photo 2x2",
        }
    }
}

impl FromStr for DocumentSlot {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        let normalized = normalized.strip_suffix("_url").unwrap_or(&normalized);
        match normalized {
            "nomination_letter" => Ok(Self::NominationLetter),
            "academic_records" => Ok(Self::AcademicRecords),
            "certificate_truthfulness" => Ok(Self::CertificateTruthfulness),
            "photo_2x2" | "photo" => Ok(Self::Photo2x2),
            other => Err(UnknownVariant {
                kind: "document slot",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Everything the applicant fills in across the seven wizard steps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NominationForm {
    pub full_name: String,
    pub complete_address: String,
    pub municipality: String,
    pub phone_number: String,
    pub email: String,
    pub birthday: String,
    pub age: u32,
    pub sex: String,

    pub school_level: String,
    pub school_name: String,
    pub school_address: String,
    pub school_head_name: String,
    pub school_head_email: String,
    pub school_head_mobile: String,
    pub class_advisor_name: String,
    pub class_advisor_email: String,
    pub class_advisor_mobile: String,

    pub nomination_letter_url: Option<String>,
    pub academic_records_url: Option<String>,
    pub certificate_truthfulness_url: Option<String>,
    pub photo_2x2_url: Option<String>,

    pub academic_claims: Vec<Claim>,
    pub leadership_claims: Vec<Claim>,
    pub community_service_claims: Vec<Claim>,

    pub data_privacy_accepted: bool,
}

impl NominationForm {
    pub fn document(&self, slot: DocumentSlot) -> Option<&str> {
        let value = match slot {
            DocumentSlot::NominationLetter => &self.nomination_letter_url,
            DocumentSlot::AcademicRecords => &self.academic_records_url,
            DocumentSlot::CertificateTruthfulness => &self.certificate_truthfulness_url,
            DocumentSlot::Photo2x2 => &self.photo_2x2_url,
        };
        value.as_deref().filter(|url| !url.is_empty())
    }

    pub(crate) fn document_mut(&mut self, slot: DocumentSlot) -> &mut Option<String> {
        match slot {
            DocumentSlot::NominationLetter => &mut self.nomination_letter_url,
            DocumentSlot::AcademicRecords => &mut self.academic_records_url,
            DocumentSlot::CertificateTruthfulness => &mut self.certificate_truthfulness_url,
            DocumentSlot::Photo2x2 => &mut self.photo_2x2_url,
        }
    }

    pub fn claims(&self, category: ClaimCategory) -> &[Claim] {
        match category {
            ClaimCategory::Academic => &self.academic_claims,
            ClaimCategory::Leadership => &self.leadership_claims,
            ClaimCategory::Community => &self.community_service_claims,
        }
    }

    pub(crate) fn claims_mut(&mut self, category: ClaimCategory) -> &mut Vec<Claim> {
        match category {
            ClaimCategory::Academic => &mut self.academic_claims,
            ClaimCategory::Leadership => &mut self.leadership_claims,
            ClaimCategory::Community => &mut self.community_service_claims,
        }
    }

    /// Every blob URL the form points at: document slots first, then claim certificates.
    pub fn file_references(&self) -> Vec<String> {
        let documents = DocumentSlot::ALL
            .iter()
            .filter_map(|slot| self.document(*slot));
        let certificates = ClaimCategory::ALL
            .iter()
            .flat_map(|category| self.claims(*category))
            .filter_map(Claim::certificate);

        let mut references: Vec<String> = Vec::new();
        for url in documents.chain(certificates) {
            if !references.iter().any(|existing| existing == url) {
                references.push(url.to_string());
            }
        }
        references
    }

    /// Merge applicant-editable text fields; uploads and claims have their own operations.
    pub fn apply_patch(&mut self, patch: FormPatch) {
        fn merge(target: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        merge(&mut self.full_name, patch.full_name);
        merge(&mut self.complete_address, patch.complete_address);
        merge(&mut self.municipality, patch.municipality);
        merge(&mut self.phone_number, patch.phone_number);
        merge(&mut self.email, patch.email);
        merge(&mut self.birthday, patch.birthday);
        merge(&mut self.sex, patch.sex);
        merge(&mut self.school_level, patch.school_level);
        merge(&mut self.school_name, patch.school_name);
        merge(&mut self.school_address, patch.school_address);
        merge(&mut self.school_head_name, patch.school_head_name);
        merge(&mut self.school_head_email, patch.school_head_email);
        merge(&mut self.school_head_mobile, patch.school_head_mobile);
        merge(&mut self.class_advisor_name, patch.class_advisor_name);
        merge(&mut self.class_advisor_email, patch.class_advisor_email);
        merge(&mut self.class_advisor_mobile, patch.class_advisor_mobile);

        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(accepted) = patch.data_privacy_accepted {
            self.data_privacy_accepted = accepted;
        }
    }
}

/// Partial update of the applicant-editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormPatch {
    pub full_name: Option<String>,
    pub complete_address: Option<String>,
    pub municipality: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub birthday: Option<String>,
    pub age: Option<u32>,
    pub sex: Option<String>,
    pub school_level: Option<String>,
    pub school_name: Option<String>,
    pub school_address: Option<String>,
    pub school_head_name: Option<String>,
    pub school_head_email: Option<String>,
    pub school_head_mobile: Option<String>,
    pub class_advisor_name: Option<String>,
    pub class_advisor_email: Option<String>,
    pub class_advisor_mobile: Option<String>,
    pub data_privacy_accepted: Option<bool>,
}

/// Review state tracked for every application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Human-facing wording used in comments and e-mails.
    pub const fn display_name(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending Review",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "application status",
                value: value.to_string(),
            })
    }
}

/// Stored nomination as written to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    #[serde(flatten)]
    pub form: NominationForm,
    pub status: ApplicationStatus,
    pub public_status_token: StatusToken,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reviewer note attached to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub application_id: ApplicationId,
    pub comment_text: String,
    pub is_internal: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        application_id: ApplicationId,
        comment_text: impl Into<String>,
        is_internal: bool,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            application_id,
            comment_text: comment_text.into(),
            is_internal,
            created_by: created_by.into(),
            created_at: Utc::now(),
        }
    }
}

/// Scoring row kept by the review committee; only the delete cascade touches it here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub application_id: ApplicationId,
    pub reviewer: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}
