use super::types::RunReport;
use crate::runner::state::TestVerdict;
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Generate a JUnit XML document with one testcase per target
pub fn generate_junit_xml(report: &RunReport) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let tests = report.summary.total.to_string();
    let failures = report.summary.failed.to_string();
    let time = format!(
        "{:.3}",
        report
            .results
            .iter()
            .map(|v| v.elapsed.as_secs_f64())
            .sum::<f64>()
    );

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "nexus-tester"));
    suites_start.push_attribute(("tests", tests.as_str()));
    suites_start.push_attribute(("failures", failures.as_str()));
    suites_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(suites_start))?;

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", report.suite.as_str()));
    suite_start.push_attribute(("id", report.run_id.as_str()));
    suite_start.push_attribute(("tests", tests.as_str()));
    suite_start.push_attribute(("failures", failures.as_str()));
    suite_start.push_attribute(("skipped", "0"));
    suite_start.push_attribute(("time", time.as_str()));
    suite_start.push_attribute(("timestamp", report.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for verdict in &report.results {
        write_test_case(&mut writer, report.suite.as_str(), verdict)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite: &str,
    verdict: &TestVerdict,
) -> Result<()> {
    let classname = format!("{}.{}", suite, verdict.target_id);
    let time = format!("{:.3}", verdict.elapsed.as_secs_f64());

    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", verdict.target_name.as_str()));
    case_start.push_attribute(("classname", classname.as_str()));
    case_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(case_start))?;

    if !verdict.success {
        let message = verdict
            .error_message
            .as_deref()
            .unwrap_or(crate::runner::classifier::UNKNOWN_ERROR);
        let mut fail_start = BytesStart::new("failure");
        fail_start.push_attribute(("message", message));
        fail_start.push_attribute((
            "type",
            verdict.failing_step.as_deref().unwrap_or("ExecutionFailed"),
        ));
        writer.write_event(Event::Start(fail_start))?;
        writer.write_event(Event::Text(BytesText::new(message)))?;
        writer.write_event(Event::End(BytesEnd::new("failure")))?;
    }

    let mut out = Vec::new();
    if let Some(id) = &verdict.execution_id {
        out.push(format!("execution: {}", id));
    }
    if let Some(steps) = verdict.nodes_tested.as_ref().filter(|s| !s.is_empty()) {
        out.push(format!("steps: {}", steps.join(", ")));
    }
    if !out.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("system-out")))?;
        writer.write_event(Event::Text(BytesText::new(&out.join("\n"))))?;
        writer.write_event(Event::End(BytesEnd::new("system-out")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}
