use crate::error::{HealError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const URL_ENV: &str = "SUPABASE_URL";
pub const KEY_ENV: &str = "SUPABASE_SERVICE_KEY";

/// Invocations of the approval operation allowed per run.
pub const MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_REVIEWER: &str = "Lauren";
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_TRIGGER_FIX_PATH: &str =
    "/home/ubuntu/merets/supabase/FIX_REP_TRACKING_OVERFLOW.sql";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Settings for a single run, built once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub service_key: String,
    pub reviewer_name: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Where fix scripts are written: `/tmp` on Unix unless `$TMPDIR`
    /// points elsewhere.
    pub fix_dir: PathBuf,
    pub trigger_fix_path: PathBuf,
}

impl Config {
    /// Validate the two required values and fill in defaults for the rest.
    ///
    /// `None` and blank strings are both treated as missing.
    pub fn new(base_url: Option<&str>, service_key: Option<&str>) -> Result<Self> {
        let base_url = required(base_url, URL_ENV)?;
        let service_key = required(service_key, KEY_ENV)?;

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(HealError::InvalidConfig(format!(
                "{URL_ENV} must start with http:// or https://, got '{base_url}'"
            )));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            reviewer_name: DEFAULT_REVIEWER.to_string(),
            max_attempts: MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            fix_dir: std::env::temp_dir(),
            trigger_fix_path: PathBuf::from(DEFAULT_TRIGGER_FIX_PATH),
        })
    }

    pub fn with_reviewer(mut self, name: impl Into<String>) -> Self {
        self.reviewer_name = name.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_fix_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.fix_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_trigger_fix_path(mut self, path: impl AsRef<Path>) -> Self {
        self.trigger_fix_path = path.as_ref().to_path_buf();
        self
    }

    /// First DNS label of the store host, e.g. `abcd` for
    /// `https://abcd.supabase.co`.
    pub fn project_ref(&self) -> &str {
        let host = self
            .base_url
            .split_once("//")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.base_url);
        host.split(['.', '/', ':']).next().unwrap_or(host)
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(HealError::MissingConfig(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_rejected() {
        let err = Config::new(None, Some("key")).unwrap_err();
        assert!(matches!(err, HealError::MissingConfig(URL_ENV)));
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = Config::new(Some("https://x.supabase.co"), Some("   ")).unwrap_err();
        assert!(matches!(err, HealError::MissingConfig(KEY_ENV)));
    }

    #[test]
    fn url_without_scheme_is_rejected() {
        let err = Config::new(Some("x.supabase.co"), Some("key")).unwrap_err();
        assert!(matches!(err, HealError::InvalidConfig(_)));
    }

    #[test]
    fn defaults_are_filled_in() {
        let config = Config::new(Some("https://abcd.supabase.co/"), Some("key")).unwrap();
        assert_eq!(config.base_url, "https://abcd.supabase.co");
        assert_eq!(config.reviewer_name, "Lauren");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(
            config.trigger_fix_path,
            PathBuf::from(DEFAULT_TRIGGER_FIX_PATH)
        );
    }

    #[test]
    fn fix_dir_defaults_to_system_temp_dir() {
        let config = Config::new(Some("https://abcd.supabase.co"), Some("key")).unwrap();
        assert_eq!(config.fix_dir, std::env::temp_dir());
        if std::env::var_os("TMPDIR").is_none() && cfg!(unix) {
            assert_eq!(config.fix_dir, PathBuf::from("/tmp"));
        }
    }

    #[test]
    fn project_ref_is_first_host_label() {
        let config = Config::new(Some("https://abcd.supabase.co"), Some("key")).unwrap();
        assert_eq!(config.project_ref(), "abcd");

        let local = Config::new(Some("http://127.0.0.1:5432"), Some("key")).unwrap();
        assert_eq!(local.project_ref(), "127");
    }
}
