//! End-to-end grading tests: built-in problems, the judge, the evaluator and
//! report generation working together without the HTTP layer.

use std::time::Duration;

use judge_engine::{
    evaluate_with_policy, EmptyFixturePolicy, Judge, JudgeOptions, SubmissionRequest,
    SubmissionStatus,
};
use judge_report::{json::JsonGenerator, GradingReport, MarkdownGenerator};
use judge_server::{Config, ProblemStore, StaticProblemStore};

fn judge() -> Judge {
    Judge::new(JudgeOptions::immediate())
}

async fn grade(problem_id: u64, source: &str, policy: EmptyFixturePolicy) -> GradingReport {
    let problem = StaticProblemStore
        .get(problem_id)
        .expect("Store failed")
        .expect("Unknown problem");

    let request = SubmissionRequest::new(source, None).expect("Invalid request");
    let verdict = judge().judge(&request).await.expect("Judging failed");
    let result = evaluate_with_policy(&verdict, &problem.fixtures, policy);

    GradingReport::from_result(problem.title, &result).expect("Invalid report")
}

#[tokio::test]
async fn test_builtin_solutions_run() {
    let problems = StaticProblemStore.list().expect("Store failed");

    for problem in problems {
        let Some(solution) = problem.solution.as_deref() else {
            continue;
        };
        let report = grade(problem.id, solution, EmptyFixturePolicy::AcceptOnSuccess).await;
        assert!(
            report.summary.succeeded,
            "solution to '{}' was rejected",
            problem.title
        );
    }
}

#[tokio::test]
async fn test_only_println_literals_are_graded() {
    let hello = StaticProblemStore.get(1).expect("Store failed").expect("Unknown problem");
    let report = grade(
        1,
        hello.solution.as_deref().expect("Problem has a solution"),
        EmptyFixturePolicy::AcceptOnSuccess,
    )
    .await;
    assert_eq!(report.summary.status, SubmissionStatus::Accepted);

    // The Fibonacci solution only uses print, so nothing is recognized as output.
    let loops = StaticProblemStore.get(5).expect("Store failed").expect("Unknown problem");
    let report = grade(
        5,
        loops.solution.as_deref().expect("Problem has a solution"),
        EmptyFixturePolicy::AcceptOnSuccess,
    )
    .await;
    assert_eq!(report.summary.status, SubmissionStatus::WrongAnswer);
    assert_eq!(report.simulated_output, judge_engine::synthesizer::SILENT_OUTPUT);
    assert!(!report.suggestions.is_empty());
}

#[tokio::test]
async fn test_starter_code_is_not_accepted_where_fixtures_exist() {
    let problem = StaticProblemStore
        .get(1)
        .expect("Store failed")
        .expect("Unknown problem");

    let report = grade(1, &problem.starter_code, EmptyFixturePolicy::AcceptOnSuccess).await;

    assert_eq!(report.summary.status, SubmissionStatus::WrongAnswer);
    assert_eq!(report.summary.passed, 0);
    assert_eq!(report.summary.total, 1);
}

#[tokio::test]
async fn test_reject_policy_fails_fixtureless_problems() {
    let problem = StaticProblemStore
        .get(2)
        .expect("Store failed")
        .expect("Unknown problem");
    assert!(problem.fixtures.is_empty());

    let solution = problem.solution.as_deref().expect("Problem has a solution");
    let report = grade(2, solution, EmptyFixturePolicy::Reject).await;

    assert_eq!(report.summary.status, SubmissionStatus::WrongAnswer);
}

#[tokio::test]
async fn test_failed_submission_report() {
    let report = grade(
        1,
        "public class A { public static void main(String[] a) { System.out.println(\"Hi\");",
        EmptyFixturePolicy::AcceptOnSuccess,
    )
    .await;

    assert_eq!(report.summary.status, SubmissionStatus::Failed);
    assert_eq!(
        report.diagnostic.as_ref().map(|d| d.message.as_str()),
        Some("Compilation error: Missing closing brace '}'.")
    );

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("## Diagnostic"));
    assert!(markdown.contains("&#10060; Failed"));

    let json = JsonGenerator::new(&report).generate().expect("Serialization failed");
    let value: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");
    assert_eq!(value["summary"]["status"], "failed");
}

#[tokio::test]
async fn test_config_delay_reaches_verdict() {
    let config = Config {
        execution_delay_ms: 50,
        ..Config::default()
    };
    let request = SubmissionRequest::new(
        "public static void main(String[] a) { System.out.println(\"Hi\"); }",
        None,
    )
    .expect("Invalid request");

    let verdict = Judge::new(config.judge_options())
        .judge(&request)
        .await
        .expect("Judging failed");

    assert!(verdict.elapsed() >= Duration::from_millis(50));
    assert_eq!(verdict.simulated_output(), "Hi");
}
