//! WebDriver-protocol implementation of the browser seams, backed by
//! `fantoccini` against a chromedriver endpoint.
//!
//! Element location distinguishes "absent" from transport failure: absence
//! is polled under the session wait policy and surfaces as `ElementNotFound`
//! (locate steps) or `Timeout` (wait steps); anything else is an engine
//! error.

use std::time::Instant;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use log::debug;

use crate::config::{RunConfig, WindowSize};
use crate::driver::traits::{BrowserSession, SessionFactory};
use crate::driver::wait::{self, WaitPolicy};
use crate::error::{SessionError, StepError};
use crate::scenario::types::{Condition, Target};

/// Opens Chrome sessions through a WebDriver endpoint with the harness'
/// fixed session options: headless (unless headed mode is requested),
/// sandbox disabled, fixed window size.
pub struct WebDriverFactory {
    webdriver_url: String,
    headless: bool,
    window_size: WindowSize,
    policy: WaitPolicy,
}

impl WebDriverFactory {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
            window_size: config.window_size,
            policy: WaitPolicy::with_timeout(config.wait_timeout),
        }
    }

    /// Chrome session arguments in `goog:chromeOptions` form.
    fn chrome_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless".to_string());
        }
        args.push("--no-sandbox".to_string());
        args.push("--disable-dev-shm-usage".to_string());
        args.push(format!(
            "--window-size={},{}",
            self.window_size.width, self.window_size.height
        ));
        args
    }

    fn capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut caps = serde_json::map::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({ "args": self.chrome_args() }),
        );
        caps
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
        let caps = self.capabilities();
        debug!(
            "opening webdriver session at {} with args {:?}",
            self.webdriver_url,
            self.chrome_args()
        );

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| SessionError::Acquire {
                endpoint: self.webdriver_url.clone(),
                source: Box::new(e),
            })?;

        Ok(Box::new(WebDriverSession {
            client,
            policy: self.policy,
        }))
    }
}

/// Selector resolved to a concrete WebDriver locator strategy. The `name`
/// strategy has no WebDriver equivalent and becomes an attribute CSS
/// selector, matching what Selenium-style clients do.
enum ResolvedTarget {
    Css(String),
    LinkText(String),
}

fn resolve(target: &Target) -> ResolvedTarget {
    match target {
        Target::Name(name) => ResolvedTarget::Css(format!("[name=\"{}\"]", name)),
        Target::Css(css) => ResolvedTarget::Css(css.clone()),
        Target::LinkText(text) => ResolvedTarget::LinkText(text.clone()),
    }
}

impl ResolvedTarget {
    fn locator(&self) -> Locator<'_> {
        match self {
            ResolvedTarget::Css(css) => Locator::Css(css),
            ResolvedTarget::LinkText(text) => Locator::LinkText(text),
        }
    }
}

fn engine_err(err: CmdError) -> StepError {
    StepError::Engine(Box::new(err))
}

/// One fantoccini client bound to a single scenario.
pub struct WebDriverSession {
    client: Client,
    policy: WaitPolicy,
}

impl WebDriverSession {
    /// Single location attempt; `Ok(None)` means the element is absent.
    async fn try_find(&self, target: &Target) -> Result<Option<Element>, StepError> {
        let resolved = resolve(target);
        match self.client.find(resolved.locator()).await {
            Ok(element) => Ok(Some(element)),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(engine_err(e)),
        }
    }

    /// One poll round: locate, and when required, check the element is
    /// displayed and enabled. Readiness-check failures (element went stale
    /// between attempts) count as "not ready yet".
    async fn probe(&self, target: &Target, clickable: bool) -> Result<Option<Element>, StepError> {
        match self.try_find(target).await? {
            None => Ok(None),
            Some(element) if !clickable => Ok(Some(element)),
            Some(element) => {
                let displayed = element.is_displayed().await.unwrap_or(false);
                let enabled = element.is_enabled().await.unwrap_or(false);
                if displayed && enabled {
                    Ok(Some(element))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Poll for the element under the session wait policy. `Ok(None)`
    /// means the policy expired without the element becoming available.
    async fn poll_element(
        &self,
        target: &Target,
        clickable: bool,
    ) -> Result<Option<Element>, StepError> {
        let start = Instant::now();
        let mut interval = self.policy.initial_interval;
        loop {
            if let Some(element) = self.probe(target, clickable).await? {
                return Ok(Some(element));
            }
            if start.elapsed() >= self.policy.timeout {
                return Ok(None);
            }
            tokio::time::sleep(interval).await;
            interval = self.policy.next_interval(interval);
        }
    }

    fn not_found(&self, target: &Target) -> StepError {
        StepError::ElementNotFound {
            target: target.to_string(),
            waited_ms: self.policy.timeout_ms(),
        }
    }

    fn timed_out(&self, condition: &Condition) -> StepError {
        StepError::Timeout {
            condition: condition.to_string(),
            waited_ms: self.policy.timeout_ms(),
        }
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), StepError> {
        debug!("goto {}", url);
        self.client.goto(url).await.map_err(engine_err)
    }

    async fn fill(&self, target: &Target, text: &str) -> Result<(), StepError> {
        match self.poll_element(target, false).await? {
            Some(element) => element.send_keys(text).await.map_err(engine_err),
            None => Err(self.not_found(target)),
        }
    }

    async fn click(&self, target: &Target) -> Result<(), StepError> {
        match self.poll_element(target, true).await? {
            Some(element) => element.click().await.map(|_| ()).map_err(engine_err),
            None => Err(self.not_found(target)),
        }
    }

    async fn wait_for(&self, condition: &Condition) -> Result<(), StepError> {
        let met = match condition {
            Condition::UrlContains(part) => {
                let client = self.client.clone();
                let needle = part.clone();
                wait::until(&self.policy, move || {
                    let client = client.clone();
                    let needle = needle.clone();
                    async move {
                        match client.current_url().await {
                            Ok(url) => url.as_str().contains(&needle),
                            Err(_) => false,
                        }
                    }
                })
                .await
            }
            Condition::Present(target) => self.poll_element(target, false).await?.is_some(),
            Condition::Clickable(target) => self.poll_element(target, true).await?.is_some(),
        };

        if met {
            Ok(())
        } else {
            Err(self.timed_out(condition))
        }
    }

    async fn current_url(&self) -> Result<String, StepError> {
        self.client
            .current_url()
            .await
            .map(|url| url.as_str().to_string())
            .map_err(engine_err)
    }

    async fn page_source(&self) -> Result<String, StepError> {
        self.client.source().await.map_err(engine_err)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, StepError> {
        self.client.screenshot().await.map_err(engine_err)
    }

    async fn quit(self: Box<Self>) -> Result<(), StepError> {
        debug!("closing webdriver session");
        self.client.close().await.map_err(engine_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn factory(headless: bool) -> WebDriverFactory {
        WebDriverFactory {
            webdriver_url: "http://localhost:9515".to_string(),
            headless,
            window_size: WindowSize::default(),
            policy: WaitPolicy::with_timeout(Duration::from_secs(10)),
        }
    }

    #[test]
    fn chrome_args_cover_session_options() {
        let args = factory(true).chrome_args();
        assert_eq!(
            args,
            vec![
                "--headless",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--window-size=1920,1080",
            ]
        );
    }

    #[test]
    fn headed_mode_drops_only_the_headless_switch() {
        let args = factory(false).chrome_args();
        assert!(!args.iter().any(|a| a == "--headless"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn capabilities_nest_args_under_chrome_options() {
        let caps = factory(true).capabilities();
        let args = caps["goog:chromeOptions"]["args"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert!(args.iter().any(|a| a == "--headless"));
        assert!(args.iter().any(|a| a == "--window-size=1920,1080"));
    }

    #[test]
    fn name_targets_become_attribute_selectors() {
        match resolve(&Target::name("username")) {
            ResolvedTarget::Css(css) => assert_eq!(css, "[name=\"username\"]"),
            _ => panic!("expected css selector"),
        }
        match resolve(&Target::css("button[type='submit']")) {
            ResolvedTarget::Css(css) => assert_eq!(css, "button[type='submit']"),
            _ => panic!("expected css selector"),
        }
        match resolve(&Target::link_text("Logout")) {
            ResolvedTarget::LinkText(text) => assert_eq!(text, "Logout"),
            _ => panic!("expected link text"),
        }
    }

    // Requires a running chromedriver on localhost:9515.
    #[tokio::test]
    #[ignore]
    async fn opens_and_quits_a_live_session() {
        let config = RunConfig::default();
        let session = WebDriverFactory::new(&config)
            .open()
            .await
            .expect("chromedriver session");
        session
            .goto("data:text/html,<h1>websmoke</h1>")
            .await
            .expect("navigate");
        let source = session.page_source().await.expect("page source");
        assert!(source.contains("websmoke"));
        session.quit().await.expect("quit");
    }
}
