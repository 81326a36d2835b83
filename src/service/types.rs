use serde::{Deserialize, Serialize};

/// Body of a `POST /predict` reply. Every field is optional on the wire; the
/// workflow decides what counts as a usable result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub model_prediction: Option<String>,
    #[serde(default)]
    pub input_features: Option<InputFeatures>,
    #[serde(default)]
    pub closest_match: Option<Match>,
    #[serde(default)]
    pub top_5_matches: Option<Vec<Match>>,
    #[serde(default)]
    pub total_comparisons: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PredictResponse {
    /// A reply is a result when it says so or carries a non-empty prediction.
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
            || self
                .model_prediction
                .as_deref()
                .is_some_and(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFeatures {
    pub contrast: f64,
    pub correlation: f64,
    pub energy: f64,
    pub homogeneity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub label: String,
    pub index: i64,
    pub distance: f64,
}

/// Body of a `GET /health` reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model_status: Option<String>,
    #[serde(default)]
    pub data_status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Error body the server attaches to non-2xx replies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
