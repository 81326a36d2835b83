use super::{types::*, ClassifierService};
use crate::{config::Api, error::SubmissionError, intake::SelectedFile};
use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// reqwest-backed client for the `/predict` and `/health` endpoints.
/// Sends no cookies or credentials.
#[derive(Debug, Clone)]
pub struct HttpService {
    client: reqwest::Client,
    api: Api,
}

impl HttpService {
    pub fn new(api: &Api) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("leaf-check/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "building HTTP client")?;
        Ok(Self {
            client,
            api: api.clone(),
        })
    }
}

impl ClassifierService for HttpService {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictResponse, SubmissionError> {
        let url = self.api.predict_url();
        let part = Part::bytes(file.raw_bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(self.api.upload_field.clone(), part);

        debug!(%url, bytes = file.size_bytes, "sending predict request");
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .timeout(self.api.request_timeout())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            debug!(status = status.as_u16(), error = ?body.error, "predict rejected");
            return Err(SubmissionError::Server {
                status: status.as_u16(),
                message: body.message,
            });
        }

        Ok(response.json::<PredictResponse>().await?)
    }

    async fn health(&self) -> Result<HealthResponse, SubmissionError> {
        let url = self.api.health_url();
        debug!(%url, "sending health request");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(self.api.health_timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(SubmissionError::Server {
                status: status.as_u16(),
                message: body.message,
            });
        }

        Ok(response.json::<HealthResponse>().await?)
    }

    fn base_url(&self) -> &str {
        &self.api.base_url
    }
}
