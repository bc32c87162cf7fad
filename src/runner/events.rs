use super::state::{RunSummary, ScenarioStatus};
use tokio::sync::broadcast;

/// Run execution events for real-time console updates
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: String,
        scenario_count: usize,
    },
    RunFinished {
        summary: RunSummary,
    },

    ScenarioStarted {
        name: String,
        title: String,
        step_count: usize,
    },
    ScenarioFinished {
        name: String,
        status: ScenarioStatus,
        duration_ms: Option<u64>,
    },

    StepStarted {
        scenario: String,
        index: usize,
        step: String,
    },
    StepPassed {
        scenario: String,
        index: usize,
        duration_ms: u64,
    },
    StepFailed {
        scenario: String,
        index: usize,
        error: String,
        duration_ms: u64,
    },
    StepSkipped {
        scenario: String,
        index: usize,
        step: String,
        reason: String,
    },

    /// Free-form line routed through the listener so it doesn't tear
    /// spinner output.
    Log {
        message: String,
    },
}

/// Event emitter for broadcasting run events
pub struct EventEmitter {
    sender: broadcast::Sender<RunEvent>,
}

impl EventEmitter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    pub fn emit(&self, event: RunEvent) {
        let _ = self.sender.send(event);
    }

    /// Events are only delivered to receivers that subscribed before the
    /// emit, so listeners attach before the run starts.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }
}

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates. Runs until the
/// emitter is dropped; the executor joins it before printing anything
/// after the run so output never interleaves with a live spinner.
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<RunEvent>) {
        use colored::Colorize;
        use indicatif::ProgressDrawTarget;
        use std::io::IsTerminal;

        // Hidden draw target when piped, to keep escape codes out of logs
        let multi = if std::io::stdout().is_terminal() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let mut spinner: Option<ProgressBar> = None;
        let mut step_text = String::new();

        while let Ok(event) = receiver.recv().await {
            match event {
                RunEvent::RunStarted {
                    run_id,
                    scenario_count,
                } => {
                    // suspend + println survives a hidden draw target, where
                    // MultiProgress::println is a no-op
                    multi.suspend(|| {
                        println!(
                            "\n{} Smoke run started: {} ({} scenarios)",
                            "▶".green().bold(),
                            run_id.cyan(),
                            scenario_count
                        )
                    });
                }

                RunEvent::RunFinished { summary } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }

                    println!("\n{} Smoke run finished", "■".blue().bold());
                    println!("  Scenarios: {}", summary.scenarios);
                    println!(
                        "  {} passed, {} failed, {} errored",
                        summary.passed.to_string().green(),
                        summary.failures.to_string().red(),
                        summary.errors.to_string().yellow()
                    );
                    println!(
                        "  Steps: {} ({} passed, {} failed, {} skipped)",
                        summary.steps_total,
                        summary.steps_passed,
                        summary.steps_failed,
                        summary.steps_skipped
                    );
                    if let Some(duration) = summary.total_duration_ms {
                        println!("  Duration: {}ms", duration);
                    }

                    if summary.success {
                        println!("\n{} All scenarios passed", "✓".green().bold());
                    } else {
                        println!(
                            "\n{} {} scenario(s) failed, {} error(s)",
                            "✗".red().bold(),
                            summary.failures,
                            summary.errors
                        );
                    }
                }

                RunEvent::ScenarioStarted {
                    name,
                    title,
                    step_count,
                } => {
                    println!(
                        "\n  {} Scenario: {} {} ({} steps)",
                        "→".blue(),
                        name.white().bold(),
                        format!("- {}", title).dimmed(),
                        step_count
                    );
                }

                RunEvent::ScenarioFinished {
                    name,
                    status,
                    duration_ms,
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }

                    let status_str = match status {
                        ScenarioStatus::Passed => "PASSED".green().bold(),
                        ScenarioStatus::Failed => "FAILED".red().bold(),
                        _ => "UNKNOWN".white().bold(),
                    };
                    println!("  {} Scenario {} [{}]", "←".blue(), name, status_str);
                    if let Some(duration) = duration_ms {
                        println!("    Duration: {}ms", duration);
                    }
                }

                RunEvent::StepStarted { index, step, .. } => {
                    let pb = multi.add(ProgressBar::new_spinner());
                    let style = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("    {spinner} {msg}")
                        .unwrap();
                    pb.set_style(style);

                    let body = format!("[{}] {}... ", index, step.dimmed());
                    pb.set_message(body.clone());
                    pb.enable_steady_tick(StdDuration::from_millis(100));

                    spinner = Some(pb);
                    step_text = body;
                }

                RunEvent::StepPassed { duration_ms, .. } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("    {} {}({}ms)", "✓".green(), step_text, duration_ms);
                }

                RunEvent::StepFailed {
                    error, duration_ms, ..
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("    {} {}({}ms)", "✗".red(), step_text, duration_ms);
                    println!("      {} {}", "✗".red(), error.red());
                }

                RunEvent::StepSkipped {
                    index, step, reason, ..
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!(
                        "    {} [{}] {} ({})",
                        "○".yellow(),
                        index,
                        step.dimmed(),
                        reason.dimmed()
                    );
                }

                RunEvent::Log { message } => {
                    multi.suspend(|| println!("      {}", message));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn emitter_delivers_events_to_subscribers() {
        let emitter = EventEmitter::new();
        let mut receiver = emitter.subscribe();
        emitter.emit(RunEvent::Log {
            message: "hello".into(),
        });
        match receiver.recv().await {
            Ok(RunEvent::Log { message }) => assert_eq!(message, "hello"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn listener_ends_when_emitter_is_dropped() {
        let emitter = EventEmitter::new();
        let handle = tokio::spawn(ConsoleEventListener::listen(emitter.subscribe()));
        emitter.emit(RunEvent::Log {
            message: "one line".into(),
        });
        drop(emitter);

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("listener should stop after emitter drop")
            .expect("listener task should not panic");
    }

    #[test]
    fn log_printing_does_not_depend_on_a_terminal() {
        use indicatif::ProgressDrawTarget;

        // The listener prints Log lines through suspend; with the hidden
        // draw target used for piped output, println through MultiProgress
        // would be dropped but the suspended closure still runs.
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let mut printed = false;
        multi.suspend(|| printed = true);
        assert!(printed);
    }
}
