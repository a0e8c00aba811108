// Object storage: store an object, sign a GET link, sign a POST policy.
// S3Store talks to S3 or anything compatible, MemoryStore just records calls.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, PostPolicy, PostPolicyField, PostPolicyValue, Region};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::config::Settings;
use crate::error::{Result, ShareError};

/// Target URL plus the form fields a browser must send with the file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PresignedPost {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket_name(&self) -> &str;

    async fn put_object(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
        content_disposition: Option<&str>,
    ) -> Result<()>;

    async fn sign_get_url(&self, key: &str, expires_secs: u64) -> Result<String>;

    async fn sign_post_policy(
        &self,
        key: &str,
        max_bytes: u64,
        expires_secs: u64,
    ) -> Result<PresignedPost>;
}

// S3 backed store
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    pub fn new(settings: &Settings) -> Result<Self> {
        // credentials come from the usual AWS env vars / profile
        let credentials = Credentials::default()
            .map_err(|e| ShareError::collaborator("loading credentials", e))?;

        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => settings
                .region
                .parse::<Region>()
                .map_err(|e| ShareError::InvalidInput(format!("bad region: {}", e)))?,
        };

        let bucket = Bucket::new(&settings.bucket_name, region, credentials)
            .map_err(|e| ShareError::collaborator("creating bucket client", e))?;
        let bucket = if settings.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        tracing::debug!(bucket = %settings.bucket_name, region = %settings.region, "s3 store ready");
        Ok(Self { bucket })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket_name(&self) -> &str {
        &self.bucket.name
    }

    async fn put_object(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
        content_disposition: Option<&str>,
    ) -> Result<()> {
        let bucket = match content_disposition {
            Some(disposition) => {
                let mut bucket = self.bucket.clone();
                bucket.add_header("content-disposition", disposition);
                bucket
            }
            None => self.bucket.clone(),
        };

        let response = bucket
            .put_object_with_content_type(key, body, content_type)
            .await
            .map_err(|e| ShareError::collaborator("put_object", e))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(ShareError::collaborator(
                "put_object",
                format!("unexpected status {}", status),
            ));
        }
        tracing::debug!(key, bytes = body.len(), "object stored");
        Ok(())
    }

    async fn sign_get_url(&self, key: &str, expires_secs: u64) -> Result<String> {
        let expires = to_u32_secs(expires_secs)?;
        self.bucket
            .presign_get(key, expires, None)
            .await
            .map_err(|e| ShareError::collaborator("presign_get", e))
    }

    async fn sign_post_policy(
        &self,
        key: &str,
        max_bytes: u64,
        expires_secs: u64,
    ) -> Result<PresignedPost> {
        let expires = to_u32_secs(expires_secs)?;
        let max_bytes = u32::try_from(max_bytes).map_err(|_| {
            ShareError::InvalidInput(format!("max upload size {} bytes is too large", max_bytes))
        })?;

        let policy = PostPolicy::new(expires)
            .condition(PostPolicyField::Key, PostPolicyValue::Exact(Cow::from(key)))
            .and_then(|p| {
                p.condition(
                    PostPolicyField::ContentLengthRange,
                    PostPolicyValue::Range(0, max_bytes),
                )
            })
            .map_err(|e| ShareError::collaborator("building post policy", e))?;

        let post = self
            .bucket
            .presign_post(policy)
            .await
            .map_err(|e| ShareError::collaborator("presign_post", e))?;

        Ok(PresignedPost {
            url: post.url,
            fields: post.fields.into_iter().collect(),
        })
    }
}

fn to_u32_secs(secs: u64) -> Result<u32> {
    u32::try_from(secs)
        .map_err(|_| ShareError::InvalidInput(format!("expiration of {}s is too long", secs)))
}

/// What `MemoryStore` saw, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Put {
        key: String,
        body: Vec<u8>,
        content_type: String,
        content_disposition: Option<String>,
    },
    SignGet {
        key: String,
        expires_secs: u64,
    },
    SignPost {
        key: String,
        max_bytes: u64,
        expires_secs: u64,
    },
}

// In-memory store for tests; clones share one call log
#[derive(Clone)]
pub struct MemoryStore {
    bucket: String,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    fail_get: bool,
    fail_post: bool,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_get: false,
            fail_post: false,
        }
    }

    // every sign_* call errors, puts still succeed
    pub fn failing_signatures(bucket: &str) -> Self {
        Self {
            fail_get: true,
            fail_post: true,
            ..Self::new(bucket)
        }
    }

    // only GET links fail
    pub fn failing_get_urls(bucket: &str) -> Self {
        Self {
            fail_get: true,
            ..Self::new(bucket)
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: StoreCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket_name(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
        content_disposition: Option<&str>,
    ) -> Result<()> {
        self.record(StoreCall::Put {
            key: key.to_string(),
            body: body.to_vec(),
            content_type: content_type.to_string(),
            content_disposition: content_disposition.map(str::to_string),
        });
        Ok(())
    }

    async fn sign_get_url(&self, key: &str, expires_secs: u64) -> Result<String> {
        if self.fail_get {
            return Err(ShareError::collaborator("presign_get", "signing disabled"));
        }
        self.record(StoreCall::SignGet {
            key: key.to_string(),
            expires_secs,
        });
        Ok(format!(
            "https://{}.s3.example.com/{}?X-Amz-Expires={}",
            self.bucket, key, expires_secs
        ))
    }

    async fn sign_post_policy(
        &self,
        key: &str,
        max_bytes: u64,
        expires_secs: u64,
    ) -> Result<PresignedPost> {
        if self.fail_post {
            return Err(ShareError::collaborator("presign_post", "signing disabled"));
        }
        self.record(StoreCall::SignPost {
            key: key.to_string(),
            max_bytes,
            expires_secs,
        });

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), key.to_string());
        fields.insert("bucket".to_string(), self.bucket.clone());
        fields.insert("Policy".to_string(), "eyJleHBpcmF0aW9uIjoi".to_string());
        fields.insert("X-Amz-Algorithm".to_string(), "AWS4-HMAC-SHA256".to_string());
        Ok(PresignedPost {
            url: format!("https://{}.s3.example.com/", self.bucket),
            fields,
        })
    }
}
