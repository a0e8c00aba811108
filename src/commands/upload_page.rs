use std::fmt;

use crate::commands::{PAGE_LINK_EXPIRES_SECS, UPLOAD_EXPIRES_SECS, mb_to_bytes, now_millis};
use crate::config::positive_or;
use crate::error::Result;
use crate::page::render_upload_page;
use crate::sanitize::UPLOAD_PREFIX;
use crate::state::AppState;

#[derive(Debug)]
pub struct UploadPageReport {
    pub page_key: String,
    pub page_url: String,
    pub upload_key: String,
    pub max_mb: u64,
}

impl fmt::Display for UploadPageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Upload page created!\n")?;
        writeln!(f, "Page URL (24h expiration):")?;
        writeln!(f, "{}", self.page_url)?;
        write!(
            f,
            "\nFiles will be uploaded with key: {} (max {} MB)",
            self.upload_key, self.max_mb
        )
    }
}

// Signs an upload form, bakes it into an HTML page, stores the page and
// signs a link to it. A failure after the page is stored leaves it in place.
pub async fn upload_page(state: &mut AppState, raw_max_mb: Option<&str>) -> Result<UploadPageReport> {
    state.rate_limiter.admit()?;

    let max_mb = positive_or(raw_max_mb, state.settings.max_upload_size_mb);
    let stamp = now_millis();
    let upload_key = format!("{}upload-{}", UPLOAD_PREFIX, stamp);
    let page_key = format!("upload-page-{}.html", stamp);

    tracing::info!(%upload_key, max_mb, "generating upload page");
    let post = state
        .store
        .sign_post_policy(&upload_key, mb_to_bytes(max_mb), UPLOAD_EXPIRES_SECS)
        .await?;

    let html = render_upload_page(&post, max_mb)?;
    state
        .store
        .put_object(&page_key, html.as_bytes(), "text/html", None)
        .await?;
    tracing::debug!(%page_key, bytes = html.len(), "upload page stored");

    let page_url = state
        .store
        .sign_get_url(&page_key, PAGE_LINK_EXPIRES_SECS)
        .await?;

    Ok(UploadPageReport {
        page_key,
        page_url,
        upload_key,
        max_mb,
    })
}
