use crate::error::{Result, SessionError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:9200/";
pub const DEFAULT_WELCOME_FILE: &str = "/welcome.pure";
const DEFAULT_STATUS_POLL: Duration = Duration::from_millis(500);
const DEFAULT_ACTIVITY_POLL: Duration = Duration::from_millis(1_000);
const DEFAULT_TEST_POLL: Duration = Duration::from_millis(1_000);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Settings for one IDE session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub server_url: String,
    pub mode: Option<String>,
    pub fast_compile: Option<String>,
    /// Wait between execution-status polls.
    pub status_poll: Duration,
    /// Wait between initialization-activity polls.
    pub activity_poll: Duration,
    /// Wait between test-result polls.
    pub test_poll: Duration,
    pub request_timeout: Duration,
    pub welcome_file: String,
    pub navigation_limit: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            mode: None,
            fast_compile: None,
            status_poll: DEFAULT_STATUS_POLL,
            activity_poll: DEFAULT_ACTIVITY_POLL,
            test_poll: DEFAULT_TEST_POLL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            welcome_file: DEFAULT_WELCOME_FILE.to_string(),
            navigation_limit: None,
        }
    }
}

/// On-disk shape; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    server_url: Option<String>,
    mode: Option<String>,
    fast_compile: Option<String>,
    status_poll_ms: Option<u64>,
    activity_poll_ms: Option<u64>,
    test_poll_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    welcome_file: Option<String>,
    navigation_limit: Option<usize>,
}

impl SessionConfig {
    /// Defaults, then the optional TOML file, then `PURE_IDE_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|err| {
                    SessionError::Config(format!("Failed to read {}: {err}", path.display()))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|err| SessionError::Config(err.to_string()))?;
        let mut config = Self::default();
        if let Some(url) = file.server_url {
            config.server_url = url;
        }
        config.mode = file.mode.or(config.mode);
        config.fast_compile = file.fast_compile.or(config.fast_compile);
        let positive = |ms: Option<u64>| ms.filter(|ms| *ms > 0).map(Duration::from_millis);
        config.status_poll = positive(file.status_poll_ms).unwrap_or(config.status_poll);
        config.activity_poll = positive(file.activity_poll_ms).unwrap_or(config.activity_poll);
        config.test_poll = positive(file.test_poll_ms).unwrap_or(config.test_poll);
        config.request_timeout =
            positive(file.request_timeout_ms).unwrap_or(config.request_timeout);
        if let Some(welcome) = file.welcome_file {
            config.welcome_file = welcome;
        }
        config.navigation_limit = file.navigation_limit.filter(|limit| *limit > 0);
        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let text = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let duration = |key: &str| duration_from_ms(text(key));

        if let Some(url) = text("PURE_IDE_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(mode) = text("PURE_IDE_MODE") {
            self.mode = Some(mode);
        }
        if let Some(fast_compile) = text("PURE_IDE_FAST_COMPILE") {
            self.fast_compile = Some(fast_compile);
        }
        if let Some(poll) = duration("PURE_IDE_STATUS_POLL_MS") {
            self.status_poll = poll;
        }
        if let Some(poll) = duration("PURE_IDE_ACTIVITY_POLL_MS") {
            self.activity_poll = poll;
        }
        if let Some(poll) = duration("PURE_IDE_TEST_POLL_MS") {
            self.test_poll = poll;
        }
        if let Some(timeout) = duration("PURE_IDE_REQUEST_TIMEOUT_MS") {
            self.request_timeout = timeout;
        }
    }
}

fn duration_from_ms(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let config = SessionConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.status_poll, Duration::from_millis(500));
        assert_eq!(config.activity_poll, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(600));
        assert_eq!(config.navigation_limit, None);
    }

    #[test]
    fn file_then_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "server_url = \"http://ide:9000/\"\nmode = \"dev\"\nstatus_poll_ms = 250\ntest_poll_ms = 0"
        )
        .expect("write config");

        let mut config = SessionConfig::load(Some(file.path())).expect("load");
        assert_eq!(config.server_url, "http://ide:9000/");
        assert_eq!(config.mode.as_deref(), Some("dev"));
        assert_eq!(config.status_poll, Duration::from_millis(250));
        // zero keeps the default
        assert_eq!(config.test_poll, Duration::from_secs(1));

        let env: HashMap<&str, &str> = HashMap::from([
            ("PURE_IDE_STATUS_POLL_MS", "100"),
            ("PURE_IDE_ACTIVITY_POLL_MS", "not-a-number"),
            ("PURE_IDE_TEST_POLL_MS", "0"),
            ("PURE_IDE_FAST_COMPILE", " true "),
        ]);
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.status_poll, Duration::from_millis(100));
        assert_eq!(config.activity_poll, Duration::from_secs(1));
        assert_eq!(config.test_poll, Duration::from_secs(1));
        assert_eq!(config.fast_compile.as_deref(), Some("true"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SessionConfig::from_toml_str("server = \"x\"").expect_err("unknown key");
        assert!(matches!(err, SessionError::Config(_)));
    }
}
