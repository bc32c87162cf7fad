pub mod context;
pub mod events;
pub mod executor;
pub mod state;

use anyhow::Result;
use colored::Colorize;

use crate::config::RunConfig;
use crate::driver::{SessionFactory, WebDriverFactory};
use crate::scenario::{self, Scenario};

pub use events::*;
pub use state::*;

use executor::ScenarioExecutor;

/// Run the selected scenarios (all of them when `names` is empty) against
/// the configured target, and return the aggregated report.
pub async fn run_scenarios(config: &RunConfig, names: &[String]) -> Result<RunReport> {
    let (selected, unknown) = scenario::select_scenarios(names);
    if !unknown.is_empty() {
        anyhow::bail!(
            "Unknown scenario(s): {}. Use `websmoke list` to see what is available.",
            unknown.join(", ")
        );
    }
    if selected.is_empty() {
        println!("{} No scenarios selected.", "ℹ".blue());
        return Ok(RunState::new(&uuid::Uuid::new_v4().to_string()).to_report());
    }

    print_target(config);

    let factory = Box::new(WebDriverFactory::new(config));
    run_with(factory, config, &selected).await
}

/// The run loop proper, behind the session seam so any engine can drive it.
async fn run_with(
    factory: Box<dyn SessionFactory>,
    config: &RunConfig,
    scenarios: &[Scenario],
) -> Result<RunReport> {
    let mut executor = ScenarioExecutor::new(factory, config, scenarios.len());

    for scenario in scenarios {
        if let Err(fatal) = executor.run_scenario(scenario).await {
            // A session that cannot even be opened would fail every later
            // scenario the same way; stop the whole run.
            let _ = executor.finish().await;
            return Err(anyhow::Error::new(fatal).context("browser session could not be acquired"));
        }
        if config.fail_fast && executor.last_scenario_failed() {
            executor.log(format!(
                "{} Stopping after first failure (--fail-fast)",
                "⚠".yellow()
            ));
            break;
        }
    }

    executor.finish().await
}

fn print_target(config: &RunConfig) {
    println!("{} Target: {}", "▶".green().bold(), config.base_url.bold());
    println!("  WebDriver: {}", config.webdriver_url);
    println!(
        "  Wait timeout: {}s, window: {}, {}",
        config.wait_timeout.as_secs(),
        config.window_size,
        if config.headless { "headless" } else { "headed" }
    );
    if config.generated_credentials {
        println!("  Credentials: {} (generated for this run)", config.username);
    } else {
        println!("  Credentials: {}", config.username);
    }
    if config.report_enabled {
        println!("  Output: {}", config.output_dir.display().to_string().cyan());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::executor::stubs::{factory_with, test_config, StubBehavior};
    use super::*;
    use crate::scenario::Target;
    use std::sync::atomic::Ordering;

    fn two_scenarios_first_failing() -> Vec<Scenario> {
        vec![
            Scenario::new("first", "First").click(Target::name("missing")),
            Scenario::new("second", "Second").navigate("/"),
        ]
    }

    #[tokio::test]
    async fn fail_fast_stops_the_run_after_the_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.fail_fast = true;
        let (factory, stats) = factory_with(StubBehavior::default());

        let report = run_with(factory, &config, &two_scenarios_first_failing())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 1);
        assert!(!report.results[0].passed());
        assert!(!report.success());
        assert_eq!(stats.opened.load(Ordering::SeqCst), 1);
        assert_eq!(stats.quit.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn without_fail_fast_the_loop_reaches_every_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let (factory, stats) = factory_with(StubBehavior::default());

        let report = run_with(factory, &config, &two_scenarios_first_failing())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert!(report.results[1].passed());
        assert_eq!(stats.opened.load(Ordering::SeqCst), 2);
        assert_eq!(stats.quit.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn an_unreachable_engine_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let behavior = StubBehavior {
            fail_open: true,
            ..StubBehavior::default()
        };
        let (factory, stats) = factory_with(behavior);

        let outcome = run_with(factory, &config, &two_scenarios_first_failing()).await;

        let error = outcome.expect_err("acquisition failure should abort");
        assert!(error.to_string().contains("could not be acquired"));
        assert_eq!(stats.opened.load(Ordering::SeqCst), 0);
        assert_eq!(stats.quit.load(Ordering::SeqCst), 0);
    }
}
