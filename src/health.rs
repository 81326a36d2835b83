use crate::{
    error::classify,
    service::{ClassifierService, HealthResponse},
};
use serde::Serialize;
use tracing::{info, warn};

const UNKNOWN: &str = "Unknown";
const LOADED: &str = "loaded";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub overall: String,
    pub model_status: String,
    pub data_status: String,
    pub model_loaded: bool,
    pub data_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl From<HealthResponse> for HealthStatus {
    fn from(resp: HealthResponse) -> Self {
        let model_loaded = resp.model_status.as_deref() == Some(LOADED);
        let data_loaded = resp.data_status.as_deref() == Some(LOADED);
        Self {
            overall: resp.status.unwrap_or_else(|| UNKNOWN.to_string()),
            model_status: resp.model_status.unwrap_or_else(|| UNKNOWN.to_string()),
            data_status: resp.data_status.unwrap_or_else(|| UNKNOWN.to_string()),
            model_loaded,
            data_loaded,
            timestamp: resp.timestamp.filter(|t| !t.is_empty()),
        }
    }
}

/// What the health dialog shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthView {
    Healthy(HealthStatus),
    Failed { message: String },
}

/// The always-visible connection indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "Checking...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }
}

pub async fn check_health<S: ClassifierService>(service: &S) -> HealthView {
    match service.health().await {
        Ok(resp) => {
            let status = HealthStatus::from(resp);
            info!(
                overall = %status.overall,
                model_loaded = status.model_loaded,
                data_loaded = status.data_loaded,
                "health check ok"
            );
            HealthView::Healthy(status)
        }
        Err(err) => {
            warn!("health check failed: {err}");
            HealthView::Failed {
                message: classify(&err, service.base_url()).to_string(),
            }
        }
    }
}
