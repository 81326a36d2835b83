use crate::{config::Upload, error::ValidationError, util::format_file_size};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::Path;

/// A file as handed over by a picker or a drop, before validation.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads `path` and infers the MIME type from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading input: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            mime_type: mime_from_extension(path).to_string(),
            bytes,
        })
    }
}

pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// The staged file. At most one lives in a workflow at a time.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub raw_bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            size_label: format_file_size(self.size_bytes),
            mime_type: self.mime_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: u64,
    pub size_label: String,
    pub mime_type: String,
}

/// Checks type then size, in that order.
pub fn validate(cfg: &Upload, candidate: FileCandidate) -> Result<SelectedFile, ValidationError> {
    let mime_type = candidate.mime_type.trim().to_string();
    let allowed = cfg
        .allowed_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&mime_type));
    if !allowed {
        return Err(ValidationError::UnsupportedType {
            mime_type: candidate.mime_type,
        });
    }

    let size = candidate.bytes.len() as u64;
    if size > cfg.max_file_size_bytes {
        return Err(ValidationError::TooLarge {
            size,
            limit: cfg.max_file_size_bytes,
        });
    }

    Ok(SelectedFile {
        name: candidate.name,
        size_bytes: size,
        mime_type,
        raw_bytes: candidate.bytes,
    })
}

/// Decoded, displayable form of the staged image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub data_url: String,
}

/// Decodes the image bytes. Blocking; run it off the async executor.
pub fn decode_preview(file: &SelectedFile) -> Result<Preview> {
    let img = image::load_from_memory(&file.raw_bytes)
        .with_context(|| format!("decoding preview for {}", file.name))?;
    Ok(Preview {
        width: img.width(),
        height: img.height(),
        data_url: format!(
            "data:{};base64,{}",
            file.mime_type,
            STANDARD.encode(&file.raw_bytes)
        ),
    })
}
