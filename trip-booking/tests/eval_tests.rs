mod common;

use common::{FLIGHT_ONLY, capture, travel_model};
use serde_json::json;
use trip_booking::{FLIGHT_AGENT, PipelineCaseRunner, PipelineConfig};
use trip_eval::{Comparer, SpanExpectation, TestCase, TraceValidator};
use trip_telemetry::{Entity, SpanKind, TraceCollector};

fn cases(file: &str) -> Vec<TestCase> {
    let path = format!("{}/tests/cases/{}", env!("CARGO_MANIFEST_DIR"), file);
    TestCase::load_all(path).unwrap()
}

fn runner(collector: &TraceCollector) -> PipelineCaseRunner {
    PipelineCaseRunner::new(PipelineConfig::default(), travel_model(), collector.clone())
}

#[tokio::test]
async fn test_flight_and_hotel_cases_pass() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));

    let cases = cases("flight_and_hotel.json");
    assert_eq!(cases.len(), 4);

    let report = TraceValidator::new().run_all(&cases, &runner(&collector)).await.unwrap();
    assert!(report.all_passed(), "{}", report.format_summary());
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.results[0].scores["test_output"], 1.0);
    let paraphrase = report.results[1].scores["test_output"];
    assert!((0.5..1.0).contains(&paraphrase), "paraphrase scored {}", paraphrase);
    assert!(report.results[3].scores["agentic.turn.bert_score.f1"] >= 0.5);
}

#[tokio::test]
async fn test_mock_tool_case_passes() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));

    let cases = cases("mock_tools.json");
    let report = TraceValidator::new().run_all(&cases, &runner(&collector)).await.unwrap();
    assert!(report.all_passed(), "{}", report.format_summary());
}

#[tokio::test]
async fn test_cases_only_see_their_own_spans() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));
    let runner = runner(&collector);

    let hotel =
        SpanExpectation::new(SpanKind::ToolInvocation).with_entity(Entity::tool("book_hotel"));
    let with_hotel = TestCase::new(common::FLIGHT_AND_HOTEL).with_span(hotel.clone());
    let without_hotel = TestCase::new(FLIGHT_ONLY).with_span(hotel);

    let cases = [with_hotel, without_hotel];
    let report = TraceValidator::new().run_all(&cases, &runner).await.unwrap();
    assert!(report.results[0].passed);
    assert!(!report.results[1].passed);
    assert_eq!(report.results[1].failures[0].check, "agentic.tool.invocation [book_hotel]");
    assert_eq!(report.summary.failed, 1);
}

#[tokio::test]
async fn test_wrong_expected_output_fails_with_score() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));

    let case = TestCase::new(FLIGHT_ONLY)
        .with_output("Hotel reserved in Paris", Comparer::Exact)
        .with_span(
            SpanExpectation::new(SpanKind::AgentInvocation)
                .with_entity(Entity::agent(FLIGHT_AGENT))
                .with_output("Flight booked from San Francisco to Mumbai", Comparer::Contains)
                .without_errors(),
        );
    let result = TraceValidator::new().run(&case, &runner(&collector)).await.unwrap();

    assert!(!result.passed);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].check, "test_output");
    assert_eq!(result.scores["test_output"], 0.0);
}

#[tokio::test]
async fn test_unknown_mock_tool_is_rejected() {
    let collector = TraceCollector::new();
    let case = TestCase::new(FLIGHT_ONLY).with_mock_tool("book_car", json!({"status": "success"}));

    let err = TraceValidator::new().run(&case, &runner(&collector)).await.unwrap_err();
    assert!(err.to_string().contains("book_car"));
}

#[tokio::test]
async fn test_model_failure_is_a_run_failure() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));
    let failing = std::sync::Arc::new(trip_model::MockLlm::from_fn("broken", |_| {
        Err(trip_core::TripError::Model("quota exhausted".into()))
    }));
    let runner = PipelineCaseRunner::new(PipelineConfig::default(), failing, collector.clone());

    let result = TraceValidator::new().run(&TestCase::new(FLIGHT_ONLY), &runner).await.unwrap();
    assert!(!result.passed);
    assert_eq!(result.failures[0].check, "run");
    assert!(result.failures[0].message.contains("quota exhausted"));

    let expected_failure = TestCase::new(FLIGHT_ONLY).with_span(SpanExpectation {
        expect_errors: Some(true),
        ..SpanExpectation::new(SpanKind::Turn)
    });
    let result = TraceValidator::new().run(&expected_failure, &runner).await.unwrap();
    assert!(result.passed, "{:?}", result.failures);
}
