use anyhow::{Context as _, Result};
use colored::Colorize;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::driver::{BrowserSession, SessionFactory};
use crate::error::{SessionError, StepError};
use crate::report;
use crate::runner::context::{safe_file_stem, RunContext};
use crate::runner::events::{ConsoleEventListener, EventEmitter, RunEvent};
use crate::runner::state::{
    RunReport, RunState, ScenarioState, ScenarioStatus, StepState, StepStatus,
};
use crate::scenario::{Condition, Expectation, Scenario, Step};

/// Drives scenarios one at a time: a fresh browser session per scenario,
/// steps executed in order, the session closed no matter how the steps end.
pub struct ScenarioExecutor {
    factory: Box<dyn SessionFactory>,
    config: RunConfig,
    context: RunContext,
    run: RunState,
    emitter: EventEmitter,
    listener: Option<tokio::task::JoinHandle<()>>,
}

impl ScenarioExecutor {
    pub fn new(factory: Box<dyn SessionFactory>, config: &RunConfig, scenario_count: usize) -> Self {
        let emitter = EventEmitter::new();
        let listener = tokio::spawn(ConsoleEventListener::listen(emitter.subscribe()));

        let context = RunContext::new(config);
        let mut run = RunState::new(&Uuid::new_v4().to_string());
        run.start();

        emitter.emit(RunEvent::RunStarted {
            run_id: run.run_id.clone(),
            scenario_count,
        });

        Self {
            factory,
            config: config.clone(),
            context,
            run,
            emitter,
            listener: Some(listener),
        }
    }

    pub fn log(&self, message: String) {
        self.emitter.emit(RunEvent::Log { message });
    }

    pub fn last_scenario_failed(&self) -> bool {
        self.run
            .last_scenario()
            .map(|s| s.status == ScenarioStatus::Failed)
            .unwrap_or(false)
    }

    /// Runs one scenario in its own session. Step and assertion failures are
    /// recorded and the run goes on; only a session that cannot be opened at
    /// all is returned as an error.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> Result<(), SessionError> {
        let steps: Vec<StepState> = scenario
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| StepState::new(i, &step.display_name()))
            .collect();
        let mut state = ScenarioState::new(&scenario.name, &scenario.title, steps);

        self.emitter.emit(RunEvent::ScenarioStarted {
            name: scenario.name.clone(),
            title: scenario.title.clone(),
            step_count: scenario.step_count(),
        });
        state.start();

        let session = match self.factory.open().await {
            Ok(session) => session,
            Err(e) => {
                self.emitter.emit(RunEvent::Log {
                    message: format!("{} Could not open a browser session: {}", "✗".red(), e),
                });
                return Err(e);
            }
        };

        let outcome = self.drive(session.as_ref(), scenario, &mut state).await;

        if outcome.is_err() {
            self.handle_failure(session.as_ref(), &mut state).await;
        }

        // The session is released whatever happened above.
        if let Err(e) = session.quit().await {
            self.emitter.emit(RunEvent::Log {
                message: format!("{} Browser session did not close cleanly: {}", "⚠".yellow(), e),
            });
        }

        state.finish();
        self.emitter.emit(RunEvent::ScenarioFinished {
            name: state.name.clone(),
            status: state.status.clone(),
            duration_ms: state.total_duration_ms,
        });
        self.run.add_scenario(state);
        Ok(())
    }

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        scenario: &Scenario,
        state: &mut ScenarioState,
    ) -> Result<(), StepError> {
        for (index, step) in scenario.steps.iter().enumerate() {
            if let Some(step_state) = state.current_step() {
                step_state.start();
            }
            self.emitter.emit(RunEvent::StepStarted {
                scenario: scenario.name.clone(),
                index,
                step: step.display_name(),
            });

            match self.apply_step(session, step).await {
                Ok(()) => {
                    let mut duration_ms = 0;
                    if let Some(step_state) = state.current_step() {
                        step_state.pass();
                        duration_ms = step_state.duration_ms.unwrap_or(0);
                    }
                    self.emitter.emit(RunEvent::StepPassed {
                        scenario: scenario.name.clone(),
                        index,
                        duration_ms,
                    });
                    state.advance();
                }
                Err(e) => {
                    let message = e.to_string();
                    let mut duration_ms = 0;
                    if let Some(step_state) = state.current_step() {
                        step_state.fail(message.clone(), e.kind());
                        duration_ms = step_state.duration_ms.unwrap_or(0);
                    }
                    self.emitter.emit(RunEvent::StepFailed {
                        scenario: scenario.name.clone(),
                        index,
                        error: message.clone(),
                        duration_ms,
                    });
                    state.record_failure(message, e.kind());
                    state.advance();
                    self.skip_rest(scenario, state);
                    return Err(e);
                }
            }
        }

        for expectation in &scenario.expected {
            match self.check_expectation(session, expectation).await {
                Ok(()) => {
                    self.emitter.emit(RunEvent::Log {
                        message: format!("{} expect {}", "✓".green(), expectation),
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    self.emitter.emit(RunEvent::Log {
                        message: format!("{} expect {}: {}", "✗".red(), expectation, message),
                    });
                    state.record_failure(message, e.kind());
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    async fn apply_step(
        &self,
        session: &dyn BrowserSession,
        step: &Step,
    ) -> Result<(), StepError> {
        match step {
            Step::Navigate { path } => {
                let url = self.config.url_for(&self.context.substitute_vars(path));
                session.goto(&url).await
            }
            Step::Fill { target, value } => {
                let text = self.context.substitute_vars(value);
                session.fill(target, &text).await
            }
            Step::Click { target } => session.click(target).await,
            Step::WaitFor { condition } => {
                let condition = self.resolve_condition(condition);
                session.wait_for(&condition).await
            }
            Step::AssertThat { expectation } => self.check_expectation(session, expectation).await,
        }
    }

    fn resolve_condition(&self, condition: &Condition) -> Condition {
        match condition {
            Condition::UrlContains(part) => {
                Condition::UrlContains(self.context.substitute_vars(part))
            }
            other => other.clone(),
        }
    }

    async fn check_expectation(
        &self,
        session: &dyn BrowserSession,
        expectation: &Expectation,
    ) -> Result<(), StepError> {
        match expectation {
            Expectation::UrlContains(part) => {
                let needle = self.context.substitute_vars(part);
                let url = session.current_url().await?;
                if url.contains(&needle) {
                    Ok(())
                } else {
                    Err(StepError::Assertion(format!(
                        "URL \"{}\" does not contain \"{}\"",
                        url, needle
                    )))
                }
            }
            Expectation::PageContains(part) => {
                let needle = self.context.substitute_vars(part);
                let page = session.page_source().await?;
                if page.contains(&needle) {
                    Ok(())
                } else {
                    Err(StepError::Assertion(format!(
                        "page does not contain \"{}\"",
                        needle
                    )))
                }
            }
        }
    }

    fn skip_rest(&self, scenario: &Scenario, state: &mut ScenarioState) {
        let reason = "Previous step failed";
        state.skip_remaining(reason);
        for (index, step) in scenario.steps.iter().enumerate() {
            if matches!(state.steps[index].status, StepStatus::Skipped { .. }) {
                self.emitter.emit(RunEvent::StepSkipped {
                    scenario: scenario.name.clone(),
                    index,
                    step: step.display_name(),
                    reason: reason.to_string(),
                });
            }
        }
    }

    /// Grabs a screenshot and the page source while the session is still
    /// alive, so a failed scenario leaves something to look at.
    async fn handle_failure(&self, session: &dyn BrowserSession, state: &mut ScenarioState) {
        if !self.config.report_enabled {
            return;
        }

        self.emitter.emit(RunEvent::Log {
            message: "ℹ Capturing failure context...".to_string(),
        });

        let stem = format!(
            "fail_{}_{}_step{}_{}",
            safe_file_stem(&state.name),
            chrono::Local::now().format("%Y%m%d_%H%M%S"),
            state.current_index,
            &Uuid::new_v4().to_string()[..8]
        );

        match session.page_source().await {
            Ok(html) => {
                let filename = format!("{}.html", stem);
                let path = self.context.output_path(&filename);
                match std::fs::write(&path, html) {
                    Ok(()) => {
                        state.page_source_path = Some(filename);
                        self.emitter.emit(RunEvent::Log {
                            message: format!("📄 Saved page source: {}", path.display()),
                        });
                    }
                    Err(e) => {
                        self.emitter.emit(RunEvent::Log {
                            message: format!("{} Could not write page source: {}", "⚠".yellow(), e),
                        });
                    }
                }
            }
            Err(e) => {
                self.emitter.emit(RunEvent::Log {
                    message: format!("{} Could not read page source: {}", "⚠".yellow(), e),
                });
            }
        }

        match session.screenshot().await {
            Ok(png) => {
                let filename = format!("{}.png", stem);
                let path = self.context.output_path(&filename);
                match std::fs::write(&path, png) {
                    Ok(()) => {
                        state.screenshot_path = Some(filename);
                        self.emitter.emit(RunEvent::Log {
                            message: format!("📸 Saved screenshot: {}", path.display()),
                        });
                    }
                    Err(e) => {
                        self.emitter.emit(RunEvent::Log {
                            message: format!("{} Could not write screenshot: {}", "⚠".yellow(), e),
                        });
                    }
                }
            }
            Err(e) => {
                self.emitter.emit(RunEvent::Log {
                    message: format!("{} Could not take screenshot: {}", "⚠".yellow(), e),
                });
            }
        }
    }

    /// Closes the run: emits the summary, waits for the console listener to
    /// drain, then writes result files if reporting is on.
    pub async fn finish(mut self) -> Result<RunReport> {
        self.run.finish();
        let run_report = self.run.to_report();

        self.emitter.emit(RunEvent::RunFinished {
            summary: run_report.summary.clone(),
        });
        drop(self.emitter);
        if let Some(listener) = self.listener.take() {
            let _ = listener.await;
        }

        if self.config.report_enabled {
            let results_path = self.context.output_path("test-results.json");
            let json = serde_json::to_string_pretty(&run_report)
                .context("serializing run results")?;
            std::fs::write(&results_path, json)
                .with_context(|| format!("writing {}", results_path.display()))?;
            println!(
                "{} Results saved to: {}",
                "✓".green(),
                results_path.display()
            );

            let junit_path = self.context.output_path("junit.xml");
            report::junit::write_file(&run_report, &junit_path)?;
            println!(
                "{} JUnit report saved to: {}",
                "✓".green(),
                junit_path.display()
            );
        }

        Ok(run_report)
    }
}

/// Stub session factory shared by the executor and run-loop tests.
#[cfg(test)]
pub(crate) mod stubs {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::config::RunConfig;
    use crate::driver::{BrowserSession, SessionFactory};
    use crate::error::{SessionError, StepError};
    use crate::scenario::{Condition, Target};

    #[derive(Default)]
    pub struct StubStats {
        pub opened: AtomicUsize,
        pub quit: AtomicUsize,
        pub visited: Mutex<Vec<String>>,
        pub filled: Mutex<Vec<(String, String)>>,
    }

    #[derive(Clone)]
    pub struct StubBehavior {
        pub url: String,
        pub page: String,
        pub known_targets: Vec<String>,
        pub fail_open: bool,
    }

    impl Default for StubBehavior {
        fn default() -> Self {
            Self {
                url: "http://app.local/home/".to_string(),
                page: "<html><body>Hello tester</body></html>".to_string(),
                known_targets: vec![],
                fail_open: false,
            }
        }
    }

    pub struct StubFactory {
        behavior: StubBehavior,
        stats: Arc<StubStats>,
    }

    struct StubSession {
        behavior: StubBehavior,
        stats: Arc<StubStats>,
    }

    pub fn factory_with(behavior: StubBehavior) -> (Box<StubFactory>, Arc<StubStats>) {
        let stats = Arc::new(StubStats::default());
        let factory = Box::new(StubFactory {
            behavior,
            stats: stats.clone(),
        });
        (factory, stats)
    }

    pub fn test_config(dir: &tempfile::TempDir) -> RunConfig {
        let mut config = RunConfig::default();
        config.base_url = "http://app.local".to_string();
        config.username = "tester".to_string();
        config.password = "pw".to_string();
        config.output_dir = dir.path().to_path_buf();
        config.report_enabled = false;
        config
    }

    #[async_trait]
    impl SessionFactory for StubFactory {
        async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
            if self.behavior.fail_open {
                return Err(SessionError::Acquire {
                    endpoint: "http://localhost:9515".to_string(),
                    source: "connection refused".into(),
                });
            }
            self.stats.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubSession {
                behavior: self.behavior.clone(),
                stats: self.stats.clone(),
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for StubSession {
        async fn goto(&self, url: &str) -> Result<(), StepError> {
            self.stats.visited.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn fill(&self, target: &Target, text: &str) -> Result<(), StepError> {
            let key = target.to_string();
            if !self.behavior.known_targets.contains(&key) {
                return Err(StepError::ElementNotFound {
                    target: key,
                    waited_ms: 5,
                });
            }
            self.stats
                .filled
                .lock()
                .unwrap()
                .push((key, text.to_string()));
            Ok(())
        }

        async fn click(&self, target: &Target) -> Result<(), StepError> {
            let key = target.to_string();
            if !self.behavior.known_targets.contains(&key) {
                return Err(StepError::ElementNotFound {
                    target: key,
                    waited_ms: 5,
                });
            }
            Ok(())
        }

        async fn wait_for(&self, condition: &Condition) -> Result<(), StepError> {
            let met = match condition {
                Condition::UrlContains(part) => self.behavior.url.contains(part.as_str()),
                Condition::Present(target) | Condition::Clickable(target) => {
                    self.behavior.known_targets.contains(&target.to_string())
                }
            };
            if met {
                Ok(())
            } else {
                Err(StepError::Timeout {
                    condition: condition.to_string(),
                    waited_ms: 5,
                })
            }
        }

        async fn current_url(&self) -> Result<String, StepError> {
            Ok(self.behavior.url.clone())
        }

        async fn page_source(&self) -> Result<String, StepError> {
            Ok(self.behavior.page.clone())
        }

        async fn screenshot(&self) -> Result<Vec<u8>, StepError> {
            Ok(vec![0x89, b'P', b'N', b'G'])
        }

        async fn quit(self: Box<Self>) -> Result<(), StepError> {
            self.stats.quit.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
