use crate::util::format_file_size;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Local, pre-flight rejection of a candidate file. Never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a valid image file (PNG, JPG, JPEG, GIF, BMP)")]
    UnsupportedType { mime_type: String },
    #[error("File size must be less than {}", limit_label(.limit))]
    TooLarge { size: u64, limit: u64 },
}

/// `10 MB` → `10MB`; byte counts keep their space.
fn limit_label(limit: &u64) -> String {
    let label = format_file_size(*limit);
    match label.split_once(' ') {
        Some((amount, unit)) if unit != "Bytes" => format!("{amount}{unit}"),
        _ => label,
    }
}

/// Everything that can go wrong between pressing submit and holding a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmissionError {
    #[error("request timed out")]
    Timeout,
    #[error("network unreachable")]
    NetworkUnreachable,
    #[error("request sent but no response received")]
    NoResponse,
    #[error("server responded with status {status}")]
    Server { status: u16, message: Option<String> },
    #[error("{message}")]
    Classification { message: String },
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for SubmissionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SubmissionError::Timeout
        } else if err.is_connect() {
            SubmissionError::NetworkUnreachable
        } else if let Some(status) = err.status() {
            SubmissionError::Server {
                status: status.as_u16(),
                message: None,
            }
        } else if err.is_request() || err.is_body() {
            SubmissionError::NoResponse
        } else {
            SubmissionError::Other(err.to_string())
        }
    }
}

/// The single displayable line (or block) the user sees for a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UserMessage(String);

impl UserMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ValidationError> for UserMessage {
    fn from(err: &ValidationError) -> Self {
        UserMessage(err.to_string())
    }
}

pub const TIMEOUT_MESSAGE: &str = "Request timeout. The server is taking too long to respond.";
pub const NETWORK_MESSAGE: &str =
    "Network error. Please check your internet connection and make sure the server is running.";
pub const TOO_LARGE_MESSAGE: &str = "File too large. Please select a smaller image.";
const BAD_REQUEST_MESSAGE: &str = "Bad request. Please check your input.";
const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// Maps a submission or health failure to what the user reads. Always non-empty.
pub fn classify(err: &SubmissionError, base_url: &str) -> UserMessage {
    let msg = match err {
        SubmissionError::Timeout => TIMEOUT_MESSAGE.to_string(),
        SubmissionError::NetworkUnreachable => NETWORK_MESSAGE.to_string(),
        SubmissionError::Server { status, message } => {
            let server_text = message.as_deref().map(str::trim).filter(|m| !m.is_empty());
            match *status {
                400 => server_text.unwrap_or(BAD_REQUEST_MESSAGE).to_string(),
                413 => TOO_LARGE_MESSAGE.to_string(),
                500 => server_text.unwrap_or(SERVER_ERROR_MESSAGE).to_string(),
                other => format!("Server error ({other})"),
            }
        }
        SubmissionError::NoResponse => connectivity_checklist(base_url),
        SubmissionError::Classification { message } | SubmissionError::Other(message) => {
            message.clone()
        }
    };

    if msg.trim().is_empty() {
        UserMessage(FALLBACK_MESSAGE.to_string())
    } else {
        UserMessage(msg)
    }
}

fn connectivity_checklist(base_url: &str) -> String {
    format!(
        "Unable to connect to the server. Please ensure:\n\n\
         1. The classification server is running\n\
         2. Server is accessible at {base_url}\n\
         3. Your firewall/antivirus is not blocking the connection\n\
         4. The configured endpoint paths match the server"
    )
}
