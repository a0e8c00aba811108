mod download_url;
mod upload;
mod upload_page;
mod upload_url;

pub use download_url::{DownloadUrlReport, download_url};
pub use upload::{UploadReport, upload};
pub use upload_page::{UploadPageReport, upload_page};
pub use upload_url::{UploadUrlReport, upload_url};

use rand::Rng;

// POST policies and upload pages stay valid for an hour
pub const UPLOAD_EXPIRES_SECS: u64 = 3600;
// the page link itself lives a day
pub const PAGE_LINK_EXPIRES_SECS: u64 = 86_400;

const BYTES_PER_MB: u64 = 1024 * 1024;

pub(crate) fn mb_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(BYTES_PER_MB)
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// short lowercase base36 tag for generated names
pub(crate) fn random_tag(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .collect()
}
