use crate::{
    intake::{FileSummary, SelectedFile},
    render::ResultView,
    util::sha256_hex,
    workflow::{IgnoreReason, SubmitOutcome},
};
use serde::Serialize;

/// Record of one CLI submission, written as JSON on request.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub file: FileSummary,
    pub sha256: String,
    pub base_url: String,
    pub started: String,
    pub finished: String,
    pub outcome: ReportOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    Succeeded,
    Failed { message: String },
    Cancelled,
    Ignored { reason: IgnoreReason },
}

impl SubmissionReport {
    pub fn new(
        file: &SelectedFile,
        base_url: &str,
        started: String,
        finished: String,
        outcome: &SubmitOutcome,
    ) -> Self {
        let (outcome, result) = match outcome {
            SubmitOutcome::Succeeded(view) => (ReportOutcome::Succeeded, Some(view.clone())),
            SubmitOutcome::Failed(message) => (
                ReportOutcome::Failed {
                    message: message.to_string(),
                },
                None,
            ),
            SubmitOutcome::Cancelled => (ReportOutcome::Cancelled, None),
            SubmitOutcome::Ignored(reason) => (ReportOutcome::Ignored { reason: *reason }, None),
        };
        Self {
            file: file.summary(),
            sha256: sha256_hex(&file.raw_bytes),
            base_url: base_url.to_string(),
            started,
            finished,
            outcome,
            result,
        }
    }
}
