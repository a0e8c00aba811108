use crate::error::{Result, ShareError};
use crate::storage::PresignedPost;

const UPLOAD_PAGE_TEMPLATE: &str = include_str!("../templates/upload_page.html");

/// Fill the upload page template with a signed POST form.
///
/// URL and fields are embedded as JSON literals inside a `<script>` block,
/// with `<` escaped so no value can close the tag early.
pub fn render_upload_page(post: &PresignedPost, max_size_mb: u64) -> Result<String> {
    let url = script_json(&post.url)?;
    let fields = script_json(&post.fields)?;

    Ok(UPLOAD_PAGE_TEMPLATE
        .replace("__UPLOAD_URL__", &url)
        .replace("__UPLOAD_FIELDS__", &fields)
        .replace("__MAX_SIZE__", &max_size_mb.to_string()))
}

fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)
        .map_err(|e| ShareError::InvalidInput(format!("cannot encode page data: {}", e)))?;
    Ok(json.replace('<', "\\u003c"))
}
