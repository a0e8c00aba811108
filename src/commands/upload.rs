use std::fmt;
use std::path::Path;

use crate::error::{Result, ShareError};
use crate::sanitize::{SanitizeOptions, sanitize, sanitize_object_key};
use crate::state::AppState;

#[derive(Debug)]
pub struct UploadReport {
    pub key: String,
    pub size_bytes: usize,
    pub content_type: String,
    pub hours: u64,
    pub url: String,
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Upload complete!")?;
        writeln!(
            f,
            "\nFile: {} ({:.2} KB, {})",
            self.key,
            self.size_bytes as f64 / 1024.0,
            self.content_type
        )?;
        write!(f, "Download URL ({}h):\n{}", self.hours, self.url)
    }
}

/// Store a local file and return a download link for it.
pub async fn upload(
    state: &mut AppState,
    path: &Path,
    raw_key: Option<&str>,
    attachment: bool,
) -> Result<UploadReport> {
    state.rate_limiter.admit()?;

    if !path.is_file() {
        return Err(ShareError::InvalidInput(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| sanitize(Some(n), &SanitizeOptions::filename()))
        .ok_or_else(|| {
            ShareError::InvalidInput(format!("unusable file name: {}", path.display()))
        })?;

    let key = match raw_key.filter(|k| !k.is_empty()) {
        Some(k) => sanitize_object_key(k)
            .ok_or_else(|| ShareError::InvalidInput(format!("unusable key {:?}", k)))?,
        None => file_name.clone(),
    };

    let body = tokio::fs::read(path)
        .await
        .map_err(|e| ShareError::InvalidInput(format!("cannot read {}: {}", path.display(), e)))?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    let disposition = attachment.then(|| format!("attachment; filename=\"{}\"", file_name));

    tracing::info!(
        "Uploading {} to s3://{}/{}",
        file_name,
        state.store.bucket_name(),
        key
    );
    state
        .store
        .put_object(&key, &body, &content_type, disposition.as_deref())
        .await?;

    let hours = state.settings.default_expiration_hours;
    let url = state.store.sign_get_url(&key, hours.saturating_mul(3600)).await?;

    Ok(UploadReport {
        key,
        size_bytes: body.len(),
        content_type,
        hours,
        url,
    })
}
