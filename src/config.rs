use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShareError};

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "bucket-share")]
#[command(about = "Pre-signed download/upload links and uploads for an S3 bucket")]
pub struct Args {
    // Settings file (JSON)
    #[arg(long, default_value = "config.json", global = true)]
    pub config: PathBuf,

    // Overrides for values in the settings file
    #[arg(long, global = true)]
    pub region: Option<String>,

    #[arg(long, global = true)]
    pub bucket: Option<String>,

    // S3-compatible endpoint (MinIO, R2, ...)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[arg(long, global = true)]
    pub path_style: bool,

    // Rate limit max calls per window
    #[arg(long, default_value_t = 10, global = true)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60, global = true)]
    pub rate_window: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Pre-signed GET URL for an existing object
    DownloadUrl {
        key: String,
        /// Expiration in hours
        hours: Option<String>,
    },
    /// Pre-signed POST form for a direct upload
    UploadUrl {
        filename: Option<String>,
        /// Max upload size in MB
        max_mb: Option<String>,
    },
    /// Self-contained HTML upload page stored in the bucket
    UploadPage {
        /// Max upload size in MB
        max_mb: Option<String>,
    },
    /// Upload a local file and print a download link
    Upload {
        file: PathBuf,
        key: Option<String>,
        /// Serve as a download instead of inline
        #[arg(long)]
        attachment: bool,
    },
}

// Settings file, same keys the old config.json used
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub region: String,
    pub bucket_name: String,
    pub default_expiration_hours: u64,
    #[serde(rename = "maxUploadSizeMB")]
    pub max_upload_size_mb: u64,
    pub endpoint: Option<String>,
    pub path_style: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            bucket_name: String::new(),
            default_expiration_hours: 24,
            max_upload_size_mb: 100,
            endpoint: None,
            path_style: false,
        }
    }
}

impl Settings {
    /// Read the settings file, falling back to defaults when it is absent.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ShareError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ShareError::InvalidInput(format!("malformed {}: {}", path.display(), e))
        })
    }

    // CLI flags win over the file
    pub fn with_overrides(mut self, args: &Args) -> Result<Self> {
        if let Some(region) = &args.region {
            self.region = region.clone();
        }
        if let Some(bucket) = &args.bucket {
            self.bucket_name = bucket.clone();
        }
        if args.endpoint.is_some() {
            self.endpoint = args.endpoint.clone();
        }
        self.path_style |= args.path_style;

        if self.bucket_name.trim().is_empty() {
            return Err(ShareError::InvalidInput(
                "no bucket configured (set bucketName or pass --bucket)".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn load(args: &Args) -> Result<Self> {
        Self::from_file(&args.config)?.with_overrides(args)
    }
}

// "0", "abc", "2.5", "12h" and missing all mean "use the default"
pub fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["bucket-share"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&["download-url", "a.txt"]);
        Args::parse_from(argv)
    }

    #[test]
    fn settings_file_uses_original_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"region":"eu-west-1","bucketName":"files","defaultExpirationHours":6,"maxUploadSizeMB":25}}"#
        )
        .unwrap();

        let s = Settings::from_file(file.path()).unwrap();
        assert_eq!(s.region, "eu-west-1");
        assert_eq!(s.bucket_name, "files");
        assert_eq!(s.default_expiration_hours, 6);
        assert_eq!(s.max_upload_size_mb, 25);
        assert!(!s.path_style);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let s = Settings::from_file(Path::new("/definitely/not/here.json")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn malformed_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            Settings::from_file(file.path()),
            Err(ShareError::InvalidInput(_))
        ));
    }

    #[test]
    fn cli_overrides_file_values() {
        let a = args(&["--bucket", "cli-bucket", "--region", "ap-south-1", "--path-style"]);
        let s = Settings::default().with_overrides(&a).unwrap();
        assert_eq!(s.bucket_name, "cli-bucket");
        assert_eq!(s.region, "ap-south-1");
        assert!(s.path_style);
    }

    #[test]
    fn bucket_is_required() {
        let a = args(&[]);
        assert!(matches!(
            Settings::default().with_overrides(&a),
            Err(ShareError::InvalidInput(_))
        ));
    }

    #[test]
    fn bad_numbers_fall_back() {
        assert_eq!(positive_or(Some("12"), 24), 12);
        assert_eq!(positive_or(Some("0"), 24), 24);
        assert_eq!(positive_or(Some("soon"), 24), 24);
        assert_eq!(positive_or(None, 24), 24);
        // whole numbers only, no leading-digit parsing
        assert_eq!(positive_or(Some("2.5"), 24), 24);
        assert_eq!(positive_or(Some("12h"), 24), 24);
    }

    #[test]
    fn key_is_required_for_download_url() {
        assert!(Args::try_parse_from(["bucket-share", "download-url"]).is_err());
    }
}
