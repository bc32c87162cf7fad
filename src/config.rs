//! Run configuration.
//!
//! Every run parameter has an environment-backed default (`WEBSMOKE_*`) so
//! the harness runs flagless in CI; CLI flags override the environment.
//! Credentials left unset are generated fresh per run, which keeps the
//! register → login → logout chain coherent against a database that is not
//! reset between runs.

use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

/// Browser viewport, passed to the engine as a fixed window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    /// Parse a `WIDTHxHEIGHT` string such as `1920x1080`.
    pub fn parse(value: &str) -> Option<Self> {
        let (w, h) = value.split_once(['x', 'X'])?;
        Some(Self {
            width: w.trim().parse().ok()?,
            height: h.trim().parse().ok()?,
        })
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl std::fmt::Display for WindowSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Full configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base URL of the application under test.
    pub base_url: String,
    /// WebDriver endpoint (chromedriver).
    pub webdriver_url: String,
    /// Account used by the auth scenarios.
    pub username: String,
    pub password: String,
    /// Whether the credentials were generated for this run rather than
    /// supplied by the caller.
    pub generated_credentials: bool,
    /// Bounded wait applied to every condition poll within a scenario.
    pub wait_timeout: Duration,
    pub window_size: WindowSize,
    pub headless: bool,
    /// Directory for reports and failure artifacts.
    pub output_dir: PathBuf,
    /// Write test-results.json / junit.xml and capture failure artifacts.
    pub report_enabled: bool,
    /// Stop scheduling scenarios after the first failure.
    pub fail_fast: bool,
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| v == "true" || v == "1")
}

impl Default for RunConfig {
    fn default() -> Self {
        let base_url = std::env::var("WEBSMOKE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let webdriver_url = std::env::var("WEBSMOKE_WEBDRIVER_URL")
            .unwrap_or_else(|_| "http://localhost:9515".to_string());

        let env_username = std::env::var("WEBSMOKE_USERNAME").ok();
        let env_password = std::env::var("WEBSMOKE_PASSWORD").ok();
        let generated = env_username.is_none() || env_password.is_none();
        let (username, password) = match (env_username, env_password) {
            (Some(u), Some(p)) => (u, p),
            (u, p) => {
                let (gu, gp) = generate_credentials();
                (u.unwrap_or(gu), p.unwrap_or(gp))
            }
        };

        let wait_timeout = std::env::var("WEBSMOKE_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        let window_size = std::env::var("WEBSMOKE_WINDOW_SIZE")
            .ok()
            .and_then(|v| WindowSize::parse(&v))
            .unwrap_or_default();

        let headless = !env_flag("WEBSMOKE_HEADED").unwrap_or(false);

        Self {
            base_url,
            webdriver_url,
            username,
            password,
            generated_credentials: generated,
            wait_timeout,
            window_size,
            headless,
            output_dir: PathBuf::from("output"),
            report_enabled: false,
            fail_fast: false,
        }
    }
}

impl RunConfig {
    /// Compose an absolute URL from the configured base and a path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// Fresh username/password pair for a single run.
fn generate_credentials() -> (String, String) {
    let user_tag = Uuid::new_v4().simple().to_string();
    let pass_tag = Uuid::new_v4().simple().to_string();
    (
        format!("user-{}", &user_tag[..8]),
        format!("pw-{}", &pass_tag[..16]),
    )
}
