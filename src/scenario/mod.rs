pub mod builtin;
pub mod types;

pub use builtin::{all_scenarios, select_scenarios};
pub use types::{Condition, Expectation, Scenario, Step, Target};
