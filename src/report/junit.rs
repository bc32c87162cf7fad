use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

use crate::error::FailureKind;
use crate::runner::state::{RunReport, ScenarioResult};

/// Render the run as JUnit XML so CI servers can ingest it.
pub fn generate_junit_xml(report: &RunReport) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let tests = report.summary.scenarios;
    let failures = report.summary.failures;
    let errors = report.summary.errors;
    let time = report.summary.total_duration_ms.unwrap_or(0) as f64 / 1000.0;

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "websmoke-run"));
    suites_start.push_attribute(("tests", tests.to_string().as_str()));
    suites_start.push_attribute(("failures", failures.to_string().as_str()));
    suites_start.push_attribute(("errors", errors.to_string().as_str()));
    suites_start.push_attribute(("time", time.to_string().as_str()));
    writer.write_event(Event::Start(suites_start))?;

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", "scenarios"));
    suite_start.push_attribute(("id", report.run_id.as_str()));
    suite_start.push_attribute(("tests", tests.to_string().as_str()));
    suite_start.push_attribute(("failures", failures.to_string().as_str()));
    suite_start.push_attribute(("errors", errors.to_string().as_str()));
    suite_start.push_attribute(("skipped", "0"));
    suite_start.push_attribute(("time", time.to_string().as_str()));
    suite_start.push_attribute(("timestamp", report.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for result in &report.results {
        write_test_case(&mut writer, result)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    result: &ScenarioResult,
) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", result.name.as_str()));
    case_start.push_attribute(("classname", "websmoke.scenarios"));
    case_start.push_attribute((
        "time",
        (result.total_duration_ms.unwrap_or(0) as f64 / 1000.0)
            .to_string()
            .as_str(),
    ));
    writer.write_event(Event::Start(case_start))?;

    if !result.passed() {
        let message = result.error.as_deref().unwrap_or("Unknown error");
        let kind = result.failure_kind.unwrap_or(FailureKind::Engine);
        // Assertion mismatches become <failure>, execution trouble <error>,
        // matching the failed/errored split of the summary counts.
        let element = if kind.is_assertion() { "failure" } else { "error" };

        let mut fail_start = BytesStart::new(element);
        fail_start.push_attribute(("message", message));
        fail_start.push_attribute(("type", kind_label(kind)));
        writer.write_event(Event::Start(fail_start))?;
        writer.write_event(Event::Text(BytesText::new(message)))?;
        writer.write_event(Event::End(BytesEnd::new(element)))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

fn kind_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Assertion => "AssertionFailed",
        FailureKind::Element => "ElementNotFound",
        FailureKind::Timeout => "TimeoutCondition",
        FailureKind::Engine => "EngineError",
    }
}

/// Write the XML next to the other run artifacts.
pub fn write_file(report: &RunReport, path: &Path) -> Result<()> {
    let xml = generate_junit_xml(report)?;
    std::fs::write(path, xml)?;
    Ok(())
}

/// CLI entry: render to a file or stdout.
pub async fn generate(report: &RunReport, output: Option<&Path>) -> Result<()> {
    let xml = generate_junit_xml(report)?;

    if let Some(path) = output {
        std::fs::write(path, xml)?;
        println!("JUnit report saved to: {}", path.display());
    } else {
        println!("{}", xml);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{RunSummary, ScenarioStatus};

    fn sample_report() -> RunReport {
        RunReport {
            run_id: "run-1234".to_string(),
            generated_at: "2024-05-01 12:00:00".to_string(),
            results: vec![
                ScenarioResult {
                    name: "login".to_string(),
                    title: "Log in with valid credentials".to_string(),
                    status: ScenarioStatus::Passed,
                    steps: vec![],
                    total_duration_ms: Some(1500),
                    error: None,
                    failure_kind: None,
                    screenshot_path: None,
                    page_source_path: None,
                },
                ScenarioResult {
                    name: "logout".to_string(),
                    title: "Log out".to_string(),
                    status: ScenarioStatus::Failed,
                    steps: vec![],
                    total_duration_ms: Some(2000),
                    error: Some("URL \"/home/\" does not contain \"login\"".to_string()),
                    failure_kind: Some(FailureKind::Assertion),
                    screenshot_path: None,
                    page_source_path: None,
                },
                ScenarioResult {
                    name: "navigation".to_string(),
                    title: "Switch between pages".to_string(),
                    status: ScenarioStatus::Failed,
                    steps: vec![],
                    total_duration_ms: Some(10_200),
                    error: Some("element link=\"Register\" not found within 10000ms".to_string()),
                    failure_kind: Some(FailureKind::Element),
                    screenshot_path: None,
                    page_source_path: None,
                },
            ],
            summary: RunSummary {
                scenarios: 3,
                passed: 1,
                failures: 1,
                errors: 1,
                steps_total: 12,
                steps_passed: 9,
                steps_failed: 2,
                steps_skipped: 1,
                total_duration_ms: Some(13_700),
                success: false,
            },
        }
    }

    #[test]
    fn junit_xml_carries_run_counts() {
        let xml = generate_junit_xml(&sample_report()).unwrap();

        assert!(xml.contains(r#"<testsuites name="websmoke-run""#));
        assert!(xml.contains(r#"tests="3""#));
        assert!(xml.contains(r#"failures="1""#));
        assert!(xml.contains(r#"errors="1""#));
        assert!(xml.contains(r#"<testcase name="login""#));
    }

    #[test]
    fn assertion_and_execution_failures_use_different_elements() {
        let xml = generate_junit_xml(&sample_report()).unwrap();

        assert!(xml.contains(r#"type="AssertionFailed""#));
        assert!(xml.contains(r#"type="ElementNotFound""#));
        assert!(xml.contains("<failure message="));
        assert!(xml.contains("<error message="));
    }

    #[test]
    fn passing_cases_have_no_failure_element() {
        let xml = generate_junit_xml(&sample_report()).unwrap();

        let login_case = xml
            .split("<testcase")
            .find(|chunk| chunk.contains(r#"name="login""#))
            .unwrap();
        let login_case = login_case.split("</testcase>").next().unwrap();
        assert!(!login_case.contains("<failure"));
        assert!(!login_case.contains("<error"));
    }
}
