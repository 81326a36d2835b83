pub mod http;
pub mod types;

use crate::{error::SubmissionError, intake::SelectedFile};
use std::future::Future;

pub use http::HttpService;
pub use types::{HealthResponse, InputFeatures, Match, PredictResponse};

/// The remote classifier as the workflow sees it.
pub trait ClassifierService: Send + Sync {
    /// Uploads the file. A non-2xx reply is a `SubmissionError::Server`.
    fn predict(
        &self,
        file: &SelectedFile,
    ) -> impl Future<Output = Result<PredictResponse, SubmissionError>> + Send;

    fn health(&self) -> impl Future<Output = Result<HealthResponse, SubmissionError>> + Send;

    /// Used when describing connectivity failures to the user.
    fn base_url(&self) -> &str;
}
