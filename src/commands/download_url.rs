use std::fmt;

use crate::config::positive_or;
use crate::error::{Result, ShareError};
use crate::sanitize::sanitize_object_key;
use crate::state::AppState;

#[derive(Debug)]
pub struct DownloadUrlReport {
    pub key: String,
    pub hours: u64,
    pub url: String,
}

impl fmt::Display for DownloadUrlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Key: {}", self.key)?;
        writeln!(f, "Expiration: {} hours", self.hours)?;
        write!(f, "\nDownload URL:\n{}", self.url)
    }
}

/// Sign a time-limited GET link for an object already in the bucket.
pub async fn download_url(
    state: &mut AppState,
    raw_key: &str,
    raw_hours: Option<&str>,
) -> Result<DownloadUrlReport> {
    state.rate_limiter.admit()?;

    let key = sanitize_object_key(raw_key)
        .ok_or_else(|| ShareError::InvalidInput(format!("unusable key {:?}", raw_key)))?;
    let hours = positive_or(raw_hours, state.settings.default_expiration_hours);

    tracing::info!(%key, hours, "generating download url");
    let url = state.store.sign_get_url(&key, hours.saturating_mul(3600)).await?;

    Ok(DownloadUrlReport { key, hours, url })
}
