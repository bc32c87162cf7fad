//! Scenario model: named, ordered step sequences plus terminal-state
//! expectations. Values and expected substrings may carry `${var}`
//! placeholders that the runner resolves against the run context just
//! before acting, so built-in definitions stay free of credentials.

use serde::{Deserialize, Serialize};

/// Stable element selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Target {
    /// Form control matched by its `name` attribute.
    Name(String),
    /// CSS selector.
    Css(String),
    /// Anchor matched by its visible link text.
    LinkText(String),
}

impl Target {
    pub fn name(value: impl Into<String>) -> Self {
        Target::Name(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Target::Css(value.into())
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Target::LinkText(value.into())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Name(name) => write!(f, "name=\"{}\"", name),
            Target::Css(css) => write!(f, "css=\"{}\"", css),
            Target::LinkText(text) => write!(f, "link=\"{}\"", text),
        }
    }
}

/// Predicate a `WaitFor` step polls for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    /// Current URL contains the substring.
    UrlContains(String),
    /// Element is attached to the DOM.
    Present(Target),
    /// Element is displayed and enabled.
    Clickable(Target),
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::UrlContains(part) => write!(f, "urlContains(\"{}\")", part),
            Condition::Present(target) => write!(f, "present({})", target),
            Condition::Clickable(target) => write!(f, "clickable({})", target),
        }
    }
}

/// Terminal-state check, evaluated once with no retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expectation {
    UrlContains(String),
    PageContains(String),
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expectation::UrlContains(part) => write!(f, "urlContains(\"{}\")", part),
            Expectation::PageContains(part) => write!(f, "pageContains(\"{}\")", part),
        }
    }
}

/// One linear action within a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Step {
    /// Load the absolute URL composed from the configured base and `path`.
    Navigate { path: String },
    /// Locate an element (bounded presence wait) and type `value` into it.
    Fill { target: Target, value: String },
    /// Locate an element (bounded clickable wait) and click it.
    Click { target: Target },
    /// Block until `condition` holds or the wait timeout elapses.
    WaitFor { condition: Condition },
    /// Check `expectation` immediately.
    AssertThat { expectation: Expectation },
}

impl Step {
    /// Compact label used in progress lines and reports.
    pub fn display_name(&self) -> String {
        match self {
            Step::Navigate { path } => format!("navigate(\"{}\")", path),
            Step::Fill { target, value } => format!("fill({}, \"{}\")", target, value),
            Step::Click { target } => format!("click({})", target),
            Step::WaitFor { condition } => format!("waitFor({})", condition),
            Step::AssertThat { expectation } => format!("assert({})", expectation),
        }
    }
}

/// A named, ordered sequence of steps plus terminal expectations.
/// Immutable once built; the builder methods consume and return `self`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Stable identifier used for filtering and report keys.
    pub name: String,
    /// Human-readable description shown in progress output.
    pub title: String,
    pub steps: Vec<Step>,
    /// Evaluated in order after the last step; all must hold.
    pub expected: Vec<Expectation>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            steps: Vec::new(),
            expected: Vec::new(),
        }
    }

    pub fn navigate(mut self, path: impl Into<String>) -> Self {
        self.steps.push(Step::Navigate { path: path.into() });
        self
    }

    pub fn fill(mut self, target: Target, value: impl Into<String>) -> Self {
        self.steps.push(Step::Fill {
            target,
            value: value.into(),
        });
        self
    }

    pub fn click(mut self, target: Target) -> Self {
        self.steps.push(Step::Click { target });
        self
    }

    pub fn wait_for(mut self, condition: Condition) -> Self {
        self.steps.push(Step::WaitFor { condition });
        self
    }

    pub fn assert_that(mut self, expectation: Expectation) -> Self {
        self.steps.push(Step::AssertThat { expectation });
        self
    }

    /// Append a terminal-state expectation.
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expected.push(expectation);
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_step_order() {
        let scenario = Scenario::new("login", "Login flow")
            .navigate("/")
            .wait_for(Condition::Present(Target::name("username")))
            .fill(Target::name("username"), "${username}")
            .click(Target::css("button[type='submit']"))
            .expect(Expectation::UrlContains("home".into()));

        assert_eq!(scenario.step_count(), 4);
        assert!(matches!(scenario.steps[0], Step::Navigate { .. }));
        assert!(matches!(scenario.steps[3], Step::Click { .. }));
        assert_eq!(scenario.expected.len(), 1);
    }

    #[test]
    fn step_display_names_are_compact() {
        let step = Step::Fill {
            target: Target::name("username"),
            value: "${username}".into(),
        };
        assert_eq!(step.display_name(), "fill(name=\"username\", \"${username}\")");

        let step = Step::WaitFor {
            condition: Condition::Clickable(Target::link_text("Logout")),
        };
        assert_eq!(step.display_name(), "waitFor(clickable(link=\"Logout\"))");

        let step = Step::AssertThat {
            expectation: Expectation::PageContains("How are you".into()),
        };
        assert_eq!(step.display_name(), "assert(pageContains(\"How are you\"))");
    }

    #[test]
    fn target_display_covers_all_strategies() {
        assert_eq!(Target::name("password").to_string(), "name=\"password\"");
        assert_eq!(
            Target::css("button[type='submit']").to_string(),
            "css=\"button[type='submit']\""
        );
        assert_eq!(Target::link_text("Register").to_string(), "link=\"Register\"");
    }
}
