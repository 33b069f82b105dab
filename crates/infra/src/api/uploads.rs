//! File uploads
//!
//! Validation of attachments before they are sent, a multipart body that can
//! be rebuilt for the refresh retry, and small helpers for file names and
//! media URLs returned by the API.

use casefile_domain::constants::PDF_CONTENT_TYPE;
use casefile_domain::UploadConfig;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;

/// Attachment rejected before upload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("file {file_name} is {size} bytes, the limit is {limit}")]
    TooLarge { file_name: String, size: u64, limit: u64 },

    #[error("file {file_name} has unsupported type {content_type}")]
    UnsupportedType { file_name: String, content_type: String },

    #[error("file {file_name} is not a PDF")]
    NotPdf { file_name: String },
}

/// In-memory attachment
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), bytes: bytes.into() }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn part(&self) -> Result<Part, reqwest::Error> {
        Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Limits applied by [`validate_image`] and [`validate_pdf`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_image_bytes: u64,
    pub max_pdf_bytes: u64,
    pub allowed_image_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_image_bytes: config.max_image_bytes,
            max_pdf_bytes: config.max_pdf_bytes,
            allowed_image_types: config.allowed_image_types.clone(),
        }
    }
}

/// Check an image attachment against the size limit and allowed types.
pub fn validate_image(file: &UploadFile, policy: &UploadPolicy) -> Result<(), UploadError> {
    if file.size() > policy.max_image_bytes {
        return Err(UploadError::TooLarge {
            file_name: file.file_name.clone(),
            size: file.size(),
            limit: policy.max_image_bytes,
        });
    }

    let content_type = file.content_type.to_ascii_lowercase();
    if !policy.allowed_image_types.iter().any(|allowed| allowed.eq_ignore_ascii_case(&content_type))
    {
        return Err(UploadError::UnsupportedType {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
        });
    }

    Ok(())
}

/// Check a PDF attachment: content type first, then size.
pub fn validate_pdf(file: &UploadFile, policy: &UploadPolicy) -> Result<(), UploadError> {
    if !file.content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
        return Err(UploadError::NotPdf { file_name: file.file_name.clone() });
    }

    if file.size() > policy.max_pdf_bytes {
        return Err(UploadError::TooLarge {
            file_name: file.file_name.clone(),
            size: file.size(),
            limit: policy.max_pdf_bytes,
        });
    }

    Ok(())
}

/// Multipart request body
///
/// Held as plain data and turned into a fresh [`Form`] for every send, since
/// a reqwest form is consumed by the request that carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadFile)>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text fields from a JSON object; `null` members are skipped, strings
    /// are sent as-is and other values as their JSON text.
    pub fn from_json(data: &Value) -> Self {
        let mut body = Self::new();
        if let Some(object) = data.as_object() {
            for (key, value) in object {
                match value {
                    Value::Null => {}
                    Value::String(text) => body = body.text(key.clone(), text.clone()),
                    other => body = body.text(key.clone(), other.to_string()),
                }
            }
        }
        body
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a text field only when a value is present.
    pub fn optional_text(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Attach a file under a caller-chosen field name.
    pub fn file(mut self, field: impl Into<String>, file: UploadFile) -> Self {
        self.files.push((field.into(), file));
        self
    }

    /// Attach a file only when one is present.
    pub fn optional_file(self, field: impl Into<String>, file: Option<UploadFile>) -> Self {
        match file {
            Some(file) => self.file(field, file),
            None => self,
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[(String, UploadFile)] {
        &self.files
    }

    pub(crate) fn to_form(&self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for (field, file) in &self.files {
            form = form.part(field.clone(), file.part()?);
        }
        Ok(form)
    }
}

/// Lowercase extension after the last dot, if any.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, extension) = file_name.rsplit_once('.')?;
    (!extension.is_empty()).then(|| extension.to_ascii_lowercase())
}

/// Collision-resistant file name: non-alphanumerics become `_` and the
/// millisecond timestamp is appended before the extension.
pub fn unique_file_name(file_name: &str, at: DateTime<Utc>) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => stem,
        _ => file_name,
    };
    let clean: String =
        stem.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect();
    let millis = at.timestamp_millis();

    match file_extension(file_name) {
        Some(extension) => format!("{clean}_{millis}.{extension}"),
        None => format!("{clean}_{millis}"),
    }
}

/// Absolute URL for a media path returned by the API.
///
/// Absolute URLs pass through; relative paths are joined to `origin` with a
/// single slash. Empty paths yield `None`.
pub fn media_url(origin: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    Some(format!("{}/{}", origin.trim_end_matches('/'), path.trim_start_matches('/')))
}
