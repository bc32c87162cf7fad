//! Built-in scenario catalog for the auth flows of the target application.
//!
//! Declaration order is execution order: registration runs first so the
//! credentials registered in this run exist for the login-dependent flows.

use super::types::{Condition, Expectation, Scenario, Target};

fn submit_button() -> Target {
    Target::css("button[type='submit']")
}

/// Shared login prefix: open the login page, submit credentials, wait for
/// the redirect to the home page.
fn with_login_steps(scenario: Scenario) -> Scenario {
    scenario
        .navigate("/")
        .wait_for(Condition::Present(Target::name("username")))
        .fill(Target::name("username"), "${username}")
        .fill(Target::name("password"), "${password}")
        .click(submit_button())
        .wait_for(Condition::UrlContains("/home/".into()))
}

fn register_new_user() -> Scenario {
    Scenario::new("register-new-user", "Register a new user")
        .navigate("/register/")
        .wait_for(Condition::Present(Target::name("username")))
        .fill(Target::name("username"), "${username}")
        .fill(Target::name("password"), "${password}")
        .click(submit_button())
        .wait_for(Condition::UrlContains("login".into()))
        .expect(Expectation::UrlContains("login".into()))
}

fn login() -> Scenario {
    with_login_steps(Scenario::new("login", "Log in with valid credentials"))
        .expect(Expectation::UrlContains("home".into()))
}

fn home_page_display() -> Scenario {
    with_login_steps(Scenario::new(
        "home-page-display",
        "Home page greets the signed-in user",
    ))
    .expect(Expectation::PageContains("Hello ${username}".into()))
    .expect(Expectation::PageContains("How are you".into()))
}

fn logout() -> Scenario {
    with_login_steps(Scenario::new("logout", "Log out ends the session"))
        .wait_for(Condition::Clickable(Target::link_text("Logout")))
        .click(Target::link_text("Logout"))
        .wait_for(Condition::UrlContains("login".into()))
        .expect(Expectation::UrlContains("login".into()))
}

fn navigation() -> Scenario {
    Scenario::new("navigation", "Register and Login links navigate both ways")
        .navigate("/")
        .wait_for(Condition::Clickable(Target::link_text("Register")))
        .click(Target::link_text("Register"))
        .wait_for(Condition::UrlContains("/register/".into()))
        .assert_that(Expectation::UrlContains("register".into()))
        .wait_for(Condition::Clickable(Target::link_text("Login")))
        .click(Target::link_text("Login"))
        .wait_for(Condition::UrlContains("login".into()))
        .expect(Expectation::UrlContains("login".into()))
}

/// All built-in scenarios in execution order.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        register_new_user(),
        login(),
        home_page_display(),
        logout(),
        navigation(),
    ]
}

/// Filter the catalog by scenario name, preserving declaration order.
/// An empty filter selects everything. Unknown names are returned
/// separately so the caller can refuse the run.
pub fn select_scenarios(names: &[String]) -> (Vec<Scenario>, Vec<String>) {
    let all = all_scenarios();
    if names.is_empty() {
        return (all, Vec::new());
    }

    let unknown: Vec<String> = names
        .iter()
        .filter(|n| !all.iter().any(|s| s.name == **n))
        .cloned()
        .collect();
    let selected = all
        .into_iter()
        .filter(|s| names.iter().any(|n| *n == s.name))
        .collect();
    (selected, unknown)
}
