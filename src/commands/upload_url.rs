use std::fmt;

use crate::commands::{UPLOAD_EXPIRES_SECS, mb_to_bytes, now_millis, random_tag};
use crate::config::positive_or;
use crate::error::Result;
use crate::sanitize::{SanitizeOptions, UPLOAD_PREFIX, sanitize};
use crate::state::AppState;
use crate::storage::PresignedPost;

#[derive(Debug)]
pub struct UploadUrlReport {
    pub key: String,
    pub max_mb: u64,
    pub post: PresignedPost,
}

impl UploadUrlReport {
    // one -F per policy field, the file goes last
    pub fn curl_command(&self) -> String {
        let fields: Vec<String> = self
            .post
            .fields
            .iter()
            .map(|(k, v)| format!("-F \"{}={}\"", k, v))
            .collect();
        format!(
            "curl {} -F \"file=@yourfile.ext\" \"{}\"",
            fields.join(" "),
            self.post.url
        )
    }
}

impl fmt::Display for UploadUrlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = serde_json::to_string_pretty(&self.post.fields).map_err(|_| fmt::Error)?;

        writeln!(f, "Key: {}", self.key)?;
        writeln!(f, "Max file size: {} MB", self.max_mb)?;
        writeln!(f, "Expiration: 1 hour\n")?;
        writeln!(f, "POST URL: {}", self.post.url)?;
        writeln!(f, "\nForm fields (include these in your POST request):")?;
        writeln!(f, "{}", fields)?;
        writeln!(f, "\nTo upload, POST a multipart/form-data request with:")?;
        writeln!(f, "   - All the fields above as hidden inputs")?;
        writeln!(f, "   - A file input named \"file\"")?;
        writeln!(f, "\nExample cURL command:")?;
        write!(f, "{}", self.curl_command())
    }
}

/// Sign a POST form that lets a browser or curl upload one file directly.
pub async fn upload_url(
    state: &mut AppState,
    filename: Option<&str>,
    raw_max_mb: Option<&str>,
) -> Result<UploadUrlReport> {
    state.rate_limiter.admit()?;

    // no name, or nothing left of it after cleaning
    let key = sanitize(filename, &SanitizeOptions::upload_key()).unwrap_or_else(|| {
        format!("{}{}-{}", UPLOAD_PREFIX, now_millis(), random_tag(6))
    });
    let max_mb = positive_or(raw_max_mb, state.settings.max_upload_size_mb);

    tracing::info!(%key, max_mb, "generating upload form");
    let post = state
        .store
        .sign_post_policy(&key, mb_to_bytes(max_mb), UPLOAD_EXPIRES_SECS)
        .await?;

    Ok(UploadUrlReport { key, max_mb, post })
}
