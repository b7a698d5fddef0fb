//! Flattened downloads generated from already-fetched application records.

use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::Value;

use super::domain::{ApplicationRecord, Claim, ClaimCategory, DocumentSlot, UnknownVariant};

/// Excel needs the byte-order mark to open UTF-8 CSV correctly.
const UTF8_BOM: &[u8] = "\u{feff}".as_bytes();

const BASIC_HEADERS: [&str; 25] = [
    "ID",
    "Full Name",
    "Email",
    "Phone",
    "Municipality",
    "Birthday",
    "Age",
    "Sex",
    "School Level",
    "School Name",
    "School Address",
    "School Head Name",
    "School Head Email",
    "School Head Mobile",
    "Class Advisor Name",
    "Class Advisor Email",
    "Class Advisor Mobile",
    "Nomination Letter URL",
    "Academic Records URL",
    "Certificate Truthfulness URL",
    "Photo 2x2 URL",
    "Academic Claims Count",
    "Leadership Claims Count",
    "Community Service Claims Count",
    "Submitted At",
];

const EXPANDED_HEADERS: [&str; 16] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Municipality",
    "School",
    "Level",
    "Type",
    "No",
    "Award",
    "Participation",
    "Rank",
    "Competition Level",
    "Modality",
    "Certificate Link",
    "Date",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export buffer failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    BasicCsv,
    ExpandedCsv,
    Json,
    DetailedJson,
}

impl ExportFormat {
    pub fn file_name(self, today: NaiveDate) -> String {
        let date = today.format("%Y-%m-%d");
        match self {
            ExportFormat::BasicCsv => format!("TOPS_Applications_{date}.csv"),
            ExportFormat::ExpandedCsv => format!("TOPS_All_Claims_Expanded_{date}.csv"),
            ExportFormat::Json => format!("tops_applications_{date}.json"),
            ExportFormat::DetailedJson => format!("TOPS_Detailed_Report_{date}.json"),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::BasicCsv | ExportFormat::ExpandedCsv => "text/csv; charset=utf-8",
            ExportFormat::Json | ExportFormat::DetailedJson => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic-csv" | "csv" => Ok(Self::BasicCsv),
            "expanded-csv" | "claims-csv" => Ok(Self::ExpandedCsv),
            "json" => Ok(Self::Json),
            "detailed-json" | "report" => Ok(Self::DetailedJson),
            other => Err(UnknownVariant {
                kind: "export format",
                value: other.to_string(),
            }),
        }
    }
}

/// A rendered download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub fn render(
    format: ExportFormat,
    records: &[ApplicationRecord],
    today: NaiveDate,
) -> Result<ExportDocument, ExportError> {
    let body = match format {
        ExportFormat::BasicCsv => basic_csv(records)?,
        ExportFormat::ExpandedCsv => expanded_csv(records)?,
        ExportFormat::Json => json_dump(records)?,
        ExportFormat::DetailedJson => detailed_json(records)?,
    };

    Ok(ExportDocument {
        file_name: format.file_name(today),
        content_type: format.content_type(),
        body,
    })
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(UTF8_BOM.to_vec())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn submitted_at(record: &ApplicationRecord) -> String {
    record.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn submitted_on(record: &ApplicationRecord) -> String {
    record.created_at.format("%Y-%m-%d").to_string()
}

/// One row per applicant; claim lists reduced to counts.
pub fn basic_csv(records: &[ApplicationRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv_writer();
    writer.write_record(BASIC_HEADERS)?;

    for record in records {
        let form = &record.form;
        let age = if form.age == 0 {
            String::new()
        } else {
            form.age.to_string()
        };
        writer.write_record([
            record.id.0.as_str(),
            &form.full_name,
            &form.email,
            &form.phone_number,
            &form.municipality,
            &form.birthday,
            &age,
            &form.sex,
            &form.school_level,
            &form.school_name,
            &form.school_address,
            &form.school_head_name,
            &form.school_head_email,
            &form.school_head_mobile,
            &form.class_advisor_name,
            &form.class_advisor_email,
            &form.class_advisor_mobile,
            opt(&form.nomination_letter_url),
            opt(&form.academic_records_url),
            opt(&form.certificate_truthfulness_url),
            opt(&form.photo_2x2_url),
            &form.academic_claims.len().to_string(),
            &form.leadership_claims.len().to_string(),
            &form.community_service_claims.len().to_string(),
            &submitted_at(record),
        ])?;
    }

    finish(writer)
}

/// One row per claim, applicant columns repeated; applicants without claims get a `None` row.
pub fn expanded_csv(records: &[ApplicationRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv_writer();
    writer.write_record(EXPANDED_HEADERS)?;

    for record in records {
        let form = &record.form;
        let base = [
            record.id.0.as_str(),
            &form.full_name,
            &form.email,
            &form.phone_number,
            &form.municipality,
            &form.school_name,
            &form.school_level,
        ];
        let date = submitted_on(record);
        let mut wrote_claim = false;

        for category in ClaimCategory::ALL {
            for (index, claim) in form.claims(category).iter().enumerate() {
                let number = (index + 1).to_string();
                let modality = claim_modality(category, claim);
                let mut row: Vec<&str> = base.to_vec();
                row.extend([
                    category.label(),
                    &number,
                    &claim.name,
                    &claim.type_of_participation,
                    &claim.rank,
                    &claim.level,
                    modality,
                    claim.certificate().unwrap_or(""),
                    &date,
                ]);
                writer.write_record(&row)?;
                wrote_claim = true;
            }
        }

        if !wrote_claim {
            let mut row: Vec<&str> = base.to_vec();
            row.extend(["None", "0", "", "", "", "", "", "", &date]);
            writer.write_record(&row)?;
        }
    }

    finish(writer)
}

fn claim_modality(category: ClaimCategory, claim: &Claim) -> &str {
    if !category.has_modality() {
        return "N/A";
    }
    claim
        .modality
        .as_deref()
        .filter(|modality| !modality.trim().is_empty())
        .unwrap_or("N/A")
}

pub fn json_dump(records: &[ApplicationRecord]) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// Full dump with every claim list repeated under an explicit `*_details` key.
pub fn detailed_json(records: &[ApplicationRecord]) -> Result<Vec<u8>, ExportError> {
    let report = records
        .iter()
        .map(|record| {
            let mut value = serde_json::to_value(record)?;
            if let Value::Object(map) = &mut value {
                map.insert(
                    "academic_claims_details".to_string(),
                    serde_json::to_value(&record.form.academic_claims)?,
                );
                map.insert(
                    "leadership_claims_details".to_string(),
                    serde_json::to_value(&record.form.leadership_claims)?,
                );
                map.insert(
                    "community_service_claims_details".to_string(),
                    serde_json::to_value(&record.form.community_service_claims)?,
                );
            }
            Ok(value)
        })
        .collect::<Result<Vec<Value>, serde_json::Error>>()?;

    Ok(serde_json::to_vec_pretty(&report)?)
}

/// `Field,Value` pairs for a single applicant, claims flattened into numbered rows.
pub fn applicant_csv(record: &ApplicationRecord) -> Result<Vec<u8>, ExportError> {
    let form = &record.form;
    let mut rows: Vec<(String, String)> = vec![
        ("ID".into(), record.id.0.clone()),
        ("Status".into(), record.status.display_name().into()),
        ("Status Token".into(), record.public_status_token.to_string()),
        ("Full Name".into(), form.full_name.clone()),
        ("Complete Address".into(), form.complete_address.clone()),
        ("Municipality".into(), form.municipality.clone()),
        ("Phone".into(), form.phone_number.clone()),
        ("Email".into(), form.email.clone()),
        ("Birthday".into(), form.birthday.clone()),
        ("Age".into(), form.age.to_string()),
        ("Sex".into(), form.sex.clone()),
        ("School Level".into(), form.school_level.clone()),
        ("School Name".into(), form.school_name.clone()),
        ("School Address".into(), form.school_address.clone()),
        ("School Head Name".into(), form.school_head_name.clone()),
        ("School Head Email".into(), form.school_head_email.clone()),
        ("School Head Mobile".into(), form.school_head_mobile.clone()),
        ("Class Advisor Name".into(), form.class_advisor_name.clone()),
        ("Class Advisor Email".into(), form.class_advisor_email.clone()),
        ("Class Advisor Mobile".into(), form.class_advisor_mobile.clone()),
    ];

    for slot in DocumentSlot::ALL {
        rows.push((
            slot.label().to_string(),
            form.document(slot).unwrap_or("").to_string(),
        ));
    }

    for category in ClaimCategory::ALL {
        let claims = form.claims(category);
        rows.push((
            format!("{} Claims", category.label()),
            claims.len().to_string(),
        ));
        for (index, claim) in claims.iter().enumerate() {
            let prefix = format!("{} Claim #{}", category.label(), index + 1);
            rows.push((format!("{prefix} Award"), claim.name.clone()));
            rows.push((
                format!("{prefix} Participation"),
                claim.type_of_participation.clone(),
            ));
            rows.push((format!("{prefix} Rank"), claim.rank.clone()));
            rows.push((format!("{prefix} Level"), claim.level.clone()));
            rows.push((
                format!("{prefix} Modality"),
                claim_modality(category, claim).to_string(),
            ));
            rows.push((
                format!("{prefix} Certificate"),
                claim.certificate().unwrap_or("").to_string(),
            ));
        }
    }

    rows.push(("Submitted At".into(), submitted_at(record)));

    let mut writer = csv_writer();
    writer.write_record(["Field", "Value"])?;
    for (field, value) in &rows {
        writer.write_record([field, value])?;
    }
    finish(writer)
}

/// Download name for the per-applicant sheet.
pub fn applicant_file_name(record: &ApplicationRecord, today: NaiveDate) -> String {
    let slug: String = record
        .form
        .full_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_')
        .collect();
    let slug = if slug.is_empty() { "Applicant".to_string() } else { slug };
    format!("TOPS_Application_{slug}_{}.csv", today.format("%Y-%m-%d"))
}
