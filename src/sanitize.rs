// Untrusted names -> storage keys.
// Every key that reaches the store passes through here first, keys are
// spliced straight into bucket paths and signed URLs.

use crate::error::{Result, ShareError};

pub const MAX_FILENAME_LEN: usize = 255;
pub const MAX_KEY_LEN: usize = 1024;
pub const UPLOAD_PREFIX: &str = "uploads/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeOptions {
    required_prefix: Option<String>,
    // bound on the whole result, prefix included; always > prefix length
    max_length: usize,
}

impl SanitizeOptions {
    // refuses a cap that leaves no room for a name after the prefix
    pub fn new(required_prefix: Option<&str>, max_length: usize) -> Result<Self> {
        let prefix_len = required_prefix.map_or(0, str::len);
        if max_length <= prefix_len {
            return Err(ShareError::InvalidInput(format!(
                "max key length {} leaves no room after prefix {:?}",
                max_length,
                required_prefix.unwrap_or("")
            )));
        }
        Ok(Self {
            required_prefix: required_prefix.map(str::to_string),
            max_length,
        })
    }

    pub fn required_prefix(&self) -> Option<&str> {
        self.required_prefix.as_deref()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    // single path component, no namespace
    pub fn filename() -> Self {
        Self {
            required_prefix: None,
            max_length: MAX_FILENAME_LEN,
        }
    }

    // keys for browser/form uploads, always under uploads/
    pub fn upload_key() -> Self {
        Self {
            required_prefix: Some(UPLOAD_PREFIX.to_string()),
            max_length: MAX_KEY_LEN,
        }
    }
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self::filename()
    }
}

/// Turn a caller-supplied name into a safe key.
///
/// Removes `..`, strips leading `/`, maps anything outside
/// `[A-Za-z0-9._-]` to `_`, caps the length and finally puts the result
/// under `required_prefix`. The cap is applied to the final key, so the
/// name part gets `max_length - prefix.len()` characters.
///
/// Returns `None` when nothing usable is left; callers fall back to a
/// generated name.
pub fn sanitize(raw: Option<&str>, opts: &SanitizeOptions) -> Option<String> {
    let raw = raw.filter(|s| !s.is_empty())?;
    let prefix = opts.required_prefix.as_deref().unwrap_or("");

    // an already-prefixed key keeps its namespace instead of having the
    // separator inside the prefix mangled
    let body = if prefix.is_empty() {
        raw
    } else {
        raw.strip_prefix(prefix).unwrap_or(raw)
    };

    let body = body.replace("..", "");
    let body = body.trim_start_matches('/');

    let mut cleaned: String = body
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // all ascii by now, byte truncation is char truncation
    cleaned.truncate(opts.max_length.saturating_sub(prefix.len()));

    if cleaned.is_empty() {
        return None;
    }
    Some(format!("{prefix}{cleaned}"))
}

/// Sanitize a full object key one `/`-separated segment at a time.
///
/// Used for keys that already exist in the bucket (`uploads/a.png`), where
/// flattening the separators would point at a different object. Empty,
/// `.` and traversal segments disappear.
pub fn sanitize_object_key(raw: &str) -> Option<String> {
    let segment_opts = SanitizeOptions {
        required_prefix: None,
        max_length: MAX_KEY_LEN,
    };

    let mut key = raw
        .split('/')
        .filter_map(|seg| sanitize(Some(seg), &segment_opts))
        .filter(|seg| seg != ".")
        .collect::<Vec<_>>()
        .join("/");

    key.truncate(MAX_KEY_LEN);
    let key = key.trim_end_matches('/');
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "../../etc/passwd",
        "my file!@#.txt",
        "a/../../b*c.png",
        "/////leading",
        "....//....//x",
        "...",
        "uploads/report.pdf",
        "uploads/../secret",
        "ünïcødé name.txt",
        "tab\there\nnewline",
        "C:\\Windows\\system32",
        ".hidden",
        "-dash_start.tar.gz",
    ];

    #[test]
    fn cap_must_leave_room_for_a_name() {
        assert!(matches!(
            SanitizeOptions::new(Some(UPLOAD_PREFIX), UPLOAD_PREFIX.len()),
            Err(ShareError::InvalidInput(_))
        ));
        assert!(SanitizeOptions::new(None, 0).is_err());

        let opts = SanitizeOptions::new(Some(UPLOAD_PREFIX), UPLOAD_PREFIX.len() + 3).unwrap();
        assert_eq!(opts.required_prefix(), Some(UPLOAD_PREFIX));
        assert_eq!(opts.max_length(), 11);
        assert_eq!(
            sanitize(Some("report.pdf"), &opts).as_deref(),
            Some("uploads/rep")
        );
    }

    #[test]
    fn presets_are_valid() {
        for preset in [SanitizeOptions::filename(), SanitizeOptions::upload_key()] {
            let rebuilt =
                SanitizeOptions::new(preset.required_prefix(), preset.max_length()).unwrap();
            assert_eq!(rebuilt, preset);
        }
    }

    #[test]
    fn traversal_is_neutralised() {
        let out = sanitize(Some("../../etc/passwd"), &SanitizeOptions::filename()).unwrap();
        assert!(!out.contains(".."));
        assert!(!out.starts_with('/'));
        assert_eq!(out, "etc_passwd");
    }

    #[test]
    fn invalid_characters_become_underscores() {
        let out = sanitize(Some("my file!@#.txt"), &SanitizeOptions::filename());
        assert_eq!(out.as_deref(), Some("my_file___.txt"));
    }

    #[test]
    fn long_names_are_cut_to_the_limit() {
        let long = "a".repeat(2000);
        let out = sanitize(Some(&long), &SanitizeOptions::filename()).unwrap();
        assert_eq!(out.len(), 255);

        let out = sanitize(Some(&long), &SanitizeOptions::upload_key()).unwrap();
        assert_eq!(out.len(), MAX_KEY_LEN);
        assert!(out.starts_with(UPLOAD_PREFIX));
    }

    #[test]
    fn empty_or_absent_gives_none() {
        for opts in [SanitizeOptions::filename(), SanitizeOptions::upload_key()] {
            assert_eq!(sanitize(None, &opts), None);
            assert_eq!(sanitize(Some(""), &opts), None);
            // nothing survives these
            assert_eq!(sanitize(Some(".."), &opts), None);
            assert_eq!(sanitize(Some("///"), &opts), None);
        }
    }

    #[test]
    fn upload_keys_live_under_the_prefix() {
        let out = sanitize(Some("a/../../b*c.png"), &SanitizeOptions::upload_key()).unwrap();
        assert_eq!(out, "uploads/a___b_c.png");
        assert!(!out.contains(".."));

        let body = out.strip_prefix(UPLOAD_PREFIX).unwrap();
        assert!(!body.is_empty());
        assert!(
            body.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        );
    }

    #[test]
    fn existing_prefix_is_not_doubled() {
        let out = sanitize(Some("uploads/report.pdf"), &SanitizeOptions::upload_key());
        assert_eq!(out.as_deref(), Some("uploads/report.pdf"));

        let out = sanitize(Some("uploads/../secret"), &SanitizeOptions::upload_key());
        assert_eq!(out.as_deref(), Some("uploads/secret"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        for opts in [SanitizeOptions::filename(), SanitizeOptions::upload_key()] {
            for s in SAMPLES {
                let once = sanitize(Some(s), &opts);
                let twice = sanitize(once.as_deref(), &opts);
                assert_eq!(once, twice, "input {s:?}");
            }
        }
    }

    #[test]
    fn output_never_escapes() {
        for s in SAMPLES {
            if let Some(out) = sanitize(Some(s), &SanitizeOptions::filename()) {
                assert!(!out.contains(".."), "{s:?} -> {out:?}");
                assert!(!out.contains('/'), "{s:?} -> {out:?}");
            }
        }
    }

    #[test]
    fn object_keys_keep_their_directories() {
        assert_eq!(
            sanitize_object_key("uploads/photo 1.png").as_deref(),
            Some("uploads/photo_1.png")
        );
        assert_eq!(
            sanitize_object_key("/a/./b/../c//d.txt").as_deref(),
            Some("a/b/c/d.txt")
        );
        assert_eq!(sanitize_object_key("../.."), None);
        assert_eq!(sanitize_object_key(""), None);
    }
}
