pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;

// Re-export common items
pub use config::RunConfig;
pub use report::generate_report;
pub use runner::run_scenarios;
