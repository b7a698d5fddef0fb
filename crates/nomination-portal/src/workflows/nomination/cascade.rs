//! Ordered removal of an application and everything hanging off it.
//!
//! The record store has no foreign-key cascade, so dependents are removed explicitly in a
//! fixed order: files, comments, reviews, then the application row. Steps are not
//! compensated; each result is logged and recorded in the report.

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicationId, ApplicationRecord};
use super::repository::{object_name_from_url, ApplicationRepository, BlobStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CascadeStep {
    DeleteFile { url: String },
    DeleteComments,
    DeleteReviews,
    DeleteApplication,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Done { affected: usize },
    Failed { reason: String },
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    #[serde(flatten)]
    pub step: CascadeStep,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub application_id: ApplicationId,
    pub steps: Vec<StepResult>,
}

impl CascadeReport {
    /// The application row is gone.
    pub fn completed(&self) -> bool {
        self.steps.iter().any(|result| {
            result.step == CascadeStep::DeleteApplication && result.outcome.is_done()
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps
            .iter()
            .filter(|result| !result.outcome.is_done())
    }

    pub fn files_deleted(&self) -> usize {
        self.steps
            .iter()
            .filter(|result| {
                matches!(result.step, CascadeStep::DeleteFile { .. }) && result.outcome.is_done()
            })
            .count()
    }
}

/// Steps for removing `record`: every referenced file, then comments, reviews, and the row.
pub fn plan(record: &ApplicationRecord) -> Vec<CascadeStep> {
    let mut steps: Vec<CascadeStep> = record
        .form
        .file_references()
        .into_iter()
        .map(|url| CascadeStep::DeleteFile { url })
        .collect();
    steps.extend([
        CascadeStep::DeleteComments,
        CascadeStep::DeleteReviews,
        CascadeStep::DeleteApplication,
    ]);
    steps
}

/// Run every step in order, continuing past failures.
pub fn execute<R, B>(
    repository: &R,
    blobs: &B,
    id: &ApplicationId,
    steps: Vec<CascadeStep>,
) -> CascadeReport
where
    R: ApplicationRepository + ?Sized,
    B: BlobStore + ?Sized,
{
    let mut results = Vec::with_capacity(steps.len());

    for step in steps {
        let outcome = match &step {
            CascadeStep::DeleteFile { url } => blobs
                .delete(&object_name_from_url(url))
                .map(|()| 1)
                .map_err(|err| err.to_string()),
            CascadeStep::DeleteComments => {
                repository.delete_comments(id).map_err(|err| err.to_string())
            }
            CascadeStep::DeleteReviews => {
                repository.delete_reviews(id).map_err(|err| err.to_string())
            }
            CascadeStep::DeleteApplication => repository
                .delete(id)
                .map(|()| 1)
                .map_err(|err| err.to_string()),
        };

        let outcome = match outcome {
            Ok(affected) => {
                info!(application_id = %id, ?step, affected, "cascade step completed");
                StepOutcome::Done { affected }
            }
            Err(reason) => {
                warn!(application_id = %id, ?step, %reason, "cascade step failed");
                StepOutcome::Failed { reason }
            }
        };
        results.push(StepResult { step, outcome });
    }

    CascadeReport {
        application_id: id.clone(),
        steps: results,
    }
}
