// Harness configuration
//
// Everything the harness needs comes from environment variables. The three
// required ones (BASE_URL, USER_EMAIL, USER_PASSWORD) are checked together so
// a misconfigured run reports every missing name at once; everything else has
// a default.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Variables that must be set before any test can run.
pub const REQUIRED_VARS: [&str; 3] = ["BASE_URL", "USER_EMAIL", "USER_PASSWORD"];

/// Default per-test budget (60 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for a single action's explicit wait (15 seconds)
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for page navigation (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for boolean visibility checks and assertions (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout policy shared by every interaction on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Budget for a whole test
    pub test: Duration,
    /// Explicit wait before each action
    pub action: Duration,
    /// Page navigation
    pub navigation: Duration,
    /// `is_visible`-style checks and expect_* assertions
    pub expect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            test: DEFAULT_TEST_TIMEOUT,
            action: DEFAULT_ACTION_TIMEOUT,
            navigation: DEFAULT_NAVIGATION_TIMEOUT,
            expect: DEFAULT_EXPECT_TIMEOUT,
        }
    }
}

/// Browser engine to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Some(BrowserKind::Chromium),
            "firefox" => Some(BrowserKind::Firefox),
            "webkit" | "safari" => Some(BrowserKind::Webkit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

/// Filesystem locations for inputs and artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Files used as upload fixtures
    pub test_files: PathBuf,
    pub screenshots: PathBuf,
    pub downloads: PathBuf,
    /// HTML/JSON/JUnit reports
    pub report: PathBuf,
    /// Persisted authenticated session snapshot
    pub session_state: PathBuf,
    /// Structured test data record
    pub test_data: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            test_files: PathBuf::from("test-files"),
            screenshots: PathBuf::from("test-results/screenshots"),
            downloads: PathBuf::from("test-results/downloads"),
            report: PathBuf::from("test-results/report"),
            session_state: PathBuf::from(".auth/user.json"),
            test_data: PathBuf::from("test-data/drive.json"),
        }
    }
}

/// Resolved harness configuration.
#[derive(Clone)]
pub struct HarnessConfig {
    pub base_url: Url,
    pub user_email: String,
    pub user_password: String,
    pub timeouts: Timeouts,
    pub paths: Paths,
    pub browser: BrowserKind,
    pub headless: bool,
    pub slow_mo: Duration,
    pub viewport: (u32, u32),
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("base_url", &self.base_url.as_str())
            .field("user_email", &self.user_email)
            .field("user_password", &"<redacted>")
            .field("timeouts", &self.timeouts)
            .field("paths", &self.paths)
            .field("browser", &self.browser)
            .field("headless", &self.headless)
            .field("slow_mo", &self.slow_mo)
            .field("viewport", &self.viewport)
            .finish()
    }
}

impl HarnessConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's value
    /// or None when it is unset.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .into_iter()
            .filter(|&name| get(name).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingConfig { names: missing });
        }

        let raw_base = get("BASE_URL").unwrap_or_default();
        let base_url = Url::parse(raw_base.trim()).map_err(|e| Error::InvalidConfig {
            name: "BASE_URL".to_string(),
            message: format!("'{raw_base}' is not an absolute URL ({e})"),
        })?;

        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            test: parse_millis(&get, "TEST_TIMEOUT", defaults.test)?,
            action: parse_millis(&get, "ACTION_TIMEOUT", defaults.action)?,
            navigation: parse_millis(&get, "NAVIGATION_TIMEOUT", defaults.navigation)?,
            expect: parse_millis(&get, "EXPECT_TIMEOUT", defaults.expect)?,
        };

        let default_paths = Paths::default();
        let path = |name: &str, default: PathBuf| get(name).map(PathBuf::from).unwrap_or(default);
        let paths = Paths {
            test_files: path("TEST_FILES_PATH", default_paths.test_files),
            screenshots: path("SCREENSHOTS_PATH", default_paths.screenshots),
            downloads: path("DOWNLOADS_PATH", default_paths.downloads),
            report: path("REPORT_PATH", default_paths.report),
            session_state: path("SESSION_STATE_PATH", default_paths.session_state),
            test_data: path("TEST_DATA_PATH", default_paths.test_data),
        };

        let browser = match get("BROWSER") {
            Some(value) => BrowserKind::parse(&value).ok_or_else(|| Error::InvalidConfig {
                name: "BROWSER".to_string(),
                message: format!("'{value}' is not one of chromium, firefox, webkit"),
            })?,
            None => BrowserKind::default(),
        };

        let headless = match get("HEADLESS") {
            Some(value) => parse_bool(&value).ok_or_else(|| Error::InvalidConfig {
                name: "HEADLESS".to_string(),
                message: format!("'{value}' is not a boolean"),
            })?,
            None => true,
        };

        let slow_mo = parse_millis(&get, "SLOW_MO", Duration::ZERO)?;
        let viewport = (
            parse_number(&get, "VIEWPORT_WIDTH", 1280)?,
            parse_number(&get, "VIEWPORT_HEIGHT", 720)?,
        );

        let config = Self {
            base_url,
            user_email: get("USER_EMAIL").unwrap_or_default(),
            user_password: get("USER_PASSWORD").unwrap_or_default(),
            timeouts,
            paths,
            browser,
            headless,
            slow_mo,
            viewport,
        };
        tracing::debug!(?config, "loaded harness configuration");
        Ok(config)
    }

    /// Resolves `path` against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| Error::InvalidConfig {
            name: "BASE_URL".to_string(),
            message: format!("cannot join '{path}': {e}"),
        })
    }
}

fn parse_number<F, T>(get: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(name) {
        Some(value) => value.trim().parse().map_err(|_| Error::InvalidConfig {
            name: name.to_string(),
            message: format!("'{value}' is not a non-negative integer"),
        }),
        None => Ok(default),
    }
}

fn parse_millis<F>(get: &F, name: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_number(get, name, default_ms).map(Duration::from_millis)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("BASE_URL", "https://drive.example.com"),
            ("USER_EMAIL", "qa@example.com"),
            ("USER_PASSWORD", "hunter2"),
        ]
    }

    #[test]
    fn reports_all_missing_required_vars() {
        let err = HarnessConfig::from_lookup(lookup(&[("USER_EMAIL", "qa@example.com")]))
            .unwrap_err();
        match err {
            Error::MissingConfig { names } => {
                assert_eq!(names, vec!["BASE_URL", "USER_PASSWORD"]);
            }
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut vars = required();
        vars[2] = ("USER_PASSWORD", "   ");
        let err = HarnessConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, Error::MissingConfig { names } if names == ["USER_PASSWORD"]));
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_unset() {
        let config = HarnessConfig::from_lookup(lookup(&required())).unwrap();
        assert_eq!(config.timeouts, Timeouts::default());
        assert_eq!(config.paths, Paths::default());
        assert_eq!(config.browser, BrowserKind::Chromium);
        assert!(config.headless);
        assert_eq!(config.viewport, (1280, 720));
        assert_eq!(config.url("/login").unwrap().as_str(), "https://drive.example.com/login");
    }

    #[test]
    fn optional_overrides_are_parsed() {
        let mut vars = required();
        vars.extend([
            ("ACTION_TIMEOUT", "2500"),
            ("NAVIGATION_TIMEOUT", "9000"),
            ("DOWNLOADS_PATH", "/tmp/dl"),
            ("BROWSER", "Firefox"),
            ("HEADLESS", "false"),
            ("SLOW_MO", "250"),
        ]);
        let config = HarnessConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.timeouts.action, Duration::from_millis(2500));
        assert_eq!(config.timeouts.navigation, Duration::from_secs(9));
        assert_eq!(config.paths.downloads, PathBuf::from("/tmp/dl"));
        assert_eq!(config.browser, BrowserKind::Firefox);
        assert!(!config.headless);
        assert_eq!(config.slow_mo, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let mut vars = required();
        vars.push(("ACTION_TIMEOUT", "soon"));
        let err = HarnessConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { ref name, .. } if name == "ACTION_TIMEOUT"));

        let mut vars = required();
        vars[0] = ("BASE_URL", "drive.example.com");
        let err = HarnessConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { ref name, .. } if name == "BASE_URL"));
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let config = HarnessConfig::from_lookup(lookup(&required())).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
