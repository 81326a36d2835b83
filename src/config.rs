use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub upload: Upload,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub workflow: Workflow,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Applies `LEAF_CHECK_*` overrides. `lookup` is `std::env::var` in the binary.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LEAF_CHECK_BASE_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("LEAF_CHECK_REQUEST_TIMEOUT_MS") {
            self.api.request_timeout_ms = v
                .trim()
                .parse()
                .with_context(|| format!("LEAF_CHECK_REQUEST_TIMEOUT_MS: {v}"))?;
        }
        if let Some(v) = lookup("LEAF_CHECK_HEALTH_TIMEOUT_MS") {
            self.api.health_timeout_ms = v
                .trim()
                .parse()
                .with_context(|| format!("LEAF_CHECK_HEALTH_TIMEOUT_MS: {v}"))?;
        }
        if let Some(v) = lookup("LEAF_CHECK_MAX_FILE_SIZE") {
            self.upload.max_file_size_bytes = v
                .trim()
                .parse()
                .with_context(|| format!("LEAF_CHECK_MAX_FILE_SIZE: {v}"))?;
        }
        if let Some(v) = lookup("LEAF_CHECK_ALLOWED_TYPES") {
            self.upload.allowed_types = v
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;
        if self.api.request_timeout_ms == 0 {
            return Err(anyhow!("api.request_timeout_ms must be > 0"));
        }
        if self.api.health_timeout_ms == 0 {
            return Err(anyhow!("api.health_timeout_ms must be > 0"));
        }
        if self.upload.allowed_types.is_empty() {
            return Err(anyhow!("upload.allowed_types must not be empty"));
        }
        if self.progress.tick_ms == 0 {
            return Err(anyhow!("progress.tick_ms must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Api {
    pub base_url: String,
    pub predict_path: String,
    pub health_path: String,
    pub upload_field: String,
    pub request_timeout_ms: u64,
    pub health_timeout_ms: u64,
}
impl Api {
    pub fn predict_url(&self) -> String {
        join_url(&self.base_url, &self.predict_path)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}
impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            predict_path: "/predict".into(),
            health_path: "/health".into(),
            upload_field: "image".into(),
            request_timeout_ms: 30_000,
            health_timeout_ms: 5_000,
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Upload {
    pub max_file_size_bytes: u64,
    pub allowed_types: Vec<String>,
}
impl Default for Upload {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
            allowed_types: vec![
                "image/png".into(),
                "image/jpg".into(),
                "image/jpeg".into(),
                "image/gif".into(),
                "image/bmp".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub tick_ms: u64,
    pub max_increment: f64,
    pub cap_percent: f64,
}
impl Default for Progress {
    fn default() -> Self {
        Self {
            tick_ms: 200,
            max_increment: 15.0,
            cap_percent: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Classification {
    /// Substring of the predicted label that marks the "not a durian leaf" class.
    pub non_target_marker: String,
}
impl Default for Classification {
    fn default() -> Self {
        Self {
            non_target_marker: "Bukan Daun Durian".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Workflow {
    pub probe_on_start: bool,
    pub error_emphasis_ms: u64,
}
impl Default for Workflow {
    fn default() -> Self {
        Self {
            probe_on_start: true,
            error_emphasis_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "leaf-check.log".into(),
        }
    }
}
