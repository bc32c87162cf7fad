use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use websmoke::config::{RunConfig, WindowSize};
use websmoke::{report, runner, scenario};

#[derive(Parser)]
#[command(name = "websmoke")]
#[command(version = "0.1.0")]
#[command(about = "Headless browser smoke tests for web auth flows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run smoke scenarios against a deployment
    Run {
        /// Base URL of the deployment under test (WEBSMOKE_BASE_URL)
        #[arg(short, long)]
        base_url: Option<String>,

        /// WebDriver endpoint, usually a local chromedriver (WEBSMOKE_WEBDRIVER_URL)
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Account name used by the auth scenarios; generated per run if omitted
        #[arg(short, long)]
        username: Option<String>,

        /// Account password; generated per run if omitted
        #[arg(short, long)]
        password: Option<String>,

        /// Wait timeout in seconds for element lookups and conditions
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Browser window size, e.g. 1920x1080
        #[arg(long)]
        window_size: Option<String>,

        /// Run with a visible browser window instead of headless
        #[arg(long, default_value = "false")]
        headed: bool,

        /// Run only the named scenario(s) (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',')]
        scenario: Vec<String>,

        /// Stop scheduling scenarios after the first failure
        #[arg(long, default_value = "false")]
        fail_fast: bool,

        /// Output directory for results and failure artifacts
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Write JSON results, a JUnit file and failure artifacts
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// List the scenario catalog
    List,

    /// Generate a report from saved results
    Report {
        /// Path to a test-results.json produced by `run --report`
        results: PathBuf,

        /// Output format (json, junit)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file path; prints to stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            base_url,
            webdriver_url,
            username,
            password,
            timeout,
            window_size,
            headed,
            scenario,
            fail_fast,
            output,
            report,
        } => {
            let mut config = RunConfig::default();
            if let Some(value) = base_url {
                config.base_url = value;
            }
            if let Some(value) = webdriver_url {
                config.webdriver_url = value;
            }
            if username.is_some() || password.is_some() {
                config.generated_credentials = false;
            }
            if let Some(value) = username {
                config.username = value;
            }
            if let Some(value) = password {
                config.password = value;
            }
            if let Some(secs) = timeout {
                config.wait_timeout = Duration::from_secs(secs);
            }
            if let Some(value) = window_size {
                config.window_size = WindowSize::parse(&value).ok_or_else(|| {
                    anyhow::anyhow!("Invalid window size {:?}, expected WIDTHxHEIGHT", value)
                })?;
            }
            if headed {
                config.headless = false;
            }
            config.output_dir = output;
            config.report_enabled = report;
            config.fail_fast = fail_fast;

            let run_report = runner::run_scenarios(&config, &scenario).await?;
            if !run_report.success() {
                std::process::exit(1);
            }
        }

        Commands::List => {
            println!("{} Available scenarios:", "📋".to_string().blue());
            for entry in scenario::all_scenarios() {
                println!(
                    "  {} {} ({} steps)",
                    entry.name.cyan().bold(),
                    entry.title,
                    entry.step_count()
                );
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref()).await?;
        }
    }

    Ok(())
}
