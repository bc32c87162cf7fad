//! Engine-agnostic seams between the runner and the browser-automation
//! engine. The runner only ever sees these traits; the concrete WebDriver
//! implementation lives in [`crate::driver::webdriver`].

use async_trait::async_trait;

use crate::error::{SessionError, StepError};
use crate::scenario::types::{Condition, Target};

/// Creates isolated browser sessions. One session is opened per scenario
/// and never shared; acquisition failure is fatal for the whole run.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError>;
}

/// One isolated browser instance bound to a single scenario. Owns its own
/// navigation state and cookies; destroyed via [`quit`](Self::quit) after
/// the scenario completes regardless of outcome.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load an absolute URL.
    async fn goto(&self, url: &str) -> Result<(), StepError>;

    /// Locate an element (bounded presence wait) and type text into it.
    /// Fails with `ElementNotFound` if the target never appears.
    async fn fill(&self, target: &Target, text: &str) -> Result<(), StepError>;

    /// Locate an element (bounded clickable wait) and click it.
    /// Fails with `ElementNotFound` if the target never becomes ready.
    async fn click(&self, target: &Target) -> Result<(), StepError>;

    /// Block until the condition holds, failing with `Timeout` when the
    /// session's wait policy elapses first.
    async fn wait_for(&self, condition: &Condition) -> Result<(), StepError>;

    /// Current URL as a string.
    async fn current_url(&self) -> Result<String, StepError>;

    /// Full rendered page source.
    async fn page_source(&self) -> Result<String, StepError>;

    /// PNG screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, StepError>;

    /// End the session and release the browser.
    async fn quit(self: Box<Self>) -> Result<(), StepError>;
}
