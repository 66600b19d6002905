mod common;

use common::{FLIGHT_AND_HOTEL, FLIGHT_ONLY, capture, respond, travel_model};
use serde_json::json;
use std::sync::Arc;
use trip_booking::{
    FLIGHT_AGENT, HOTEL_AGENT, InstructionProfile, PipelineBuilder, PipelineConfig, SUMMARY_AGENT,
    SUPERVISOR_AGENT, book_flight_tool,
};
use trip_core::{AgentOutcome, LlmResponse, TripError};
use trip_eval::TraceAsserter;
use trip_model::MockLlm;
use trip_session::InMemorySessionService;
use trip_telemetry::TraceCollector;
use trip_tool::MockTool;

fn config() -> PipelineConfig {
    PipelineConfig::default()
}

#[tokio::test]
async fn test_flight_and_hotel_request_books_both_in_order() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));

    let pipeline = PipelineBuilder::new(config()).model(travel_model()).build().unwrap();
    let run = pipeline.run(FLIGHT_AND_HOTEL).await.unwrap();

    assert_eq!(
        run.stages.iter().map(|s| s.agent.as_str()).collect::<Vec<_>>(),
        vec![FLIGHT_AGENT, HOTEL_AGENT, SUMMARY_AGENT]
    );
    assert!(run.output.contains("San Francisco to Mumbai"));
    assert!(run.output.contains("Marriot Intercontinental in Central Mumbai for 4 nights"));

    let calls = run.tool_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].name, "book_flight");
    assert_eq!(calls[1].args["duration"], json!(4));
    assert_eq!(
        calls[1].response["message"],
        json!("Successfully booked a stay at Marriot Intercontinental in Central Mumbai for 4 nights starting 27th April 2026.")
    );

    let trace = TraceAsserter::from_collector(&collector);
    assert_eq!(
        trace.agent_order(),
        vec![SUPERVISOR_AGENT, FLIGHT_AGENT, HOTEL_AGENT, SUMMARY_AGENT]
    );
    let flight_tool = trace.called_tool("book_flight", FLIGHT_AGENT).count_is(1).first().clone();
    let hotel_tool = trace.called_tool("book_hotel", HOTEL_AGENT).count_is(1).first().clone();
    let flight = trace.called_agent(FLIGHT_AGENT).first().clone();
    let hotel = trace.called_agent(HOTEL_AGENT).first().clone();
    let summary = trace.called_agent(SUMMARY_AGENT).first().clone();
    assert_eq!(flight_tool.parent, Some(flight.seq));
    assert_eq!(hotel_tool.parent, Some(hotel.seq));
    assert!(flight_tool.seq < summary.seq && hotel_tool.seq < summary.seq);

    let turn = trace.turn().count_is(1).first().clone();
    assert_eq!(turn.input, FLIGHT_AND_HOTEL);
    assert_eq!(turn.output, run.output);
    assert_eq!(collector.tree(turn.seq).len(), 7);
}

#[tokio::test]
async fn test_flight_only_request_never_books_a_hotel() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));

    let pipeline = PipelineBuilder::new(config()).model(travel_model()).build().unwrap();
    let run = pipeline.run(FLIGHT_ONLY).await.unwrap();

    assert!(matches!(run.outcome(FLIGHT_AGENT), Some(AgentOutcome::Acted { .. })));
    assert!(run.outcome(HOTEL_AGENT).is_some_and(AgentOutcome::is_abstained));
    assert_eq!(
        run.output,
        "Trip summary: Flight booked from San Francisco to Mumbai on 26th March 2026."
    );

    let trace = TraceAsserter::from_collector(&collector);
    trace.did_not_call_tool("book_hotel");
    trace
        .called_tool("book_flight", FLIGHT_AGENT)
        .contains_input("San Francisco")
        .contains_input("26th March 2026")
        .contains_output("success")
        .has_no_error();
    trace.called_agent(HOTEL_AGENT).contains_input(FLIGHT_ONLY).has_no_error();
}

#[tokio::test]
async fn test_hotel_agent_sees_only_the_original_request() {
    let model = travel_model();
    let pipeline = PipelineBuilder::new(config()).model(model.clone()).build().unwrap();
    pipeline.run(FLIGHT_AND_HOTEL).await.unwrap();

    let requests = model.requests();
    let hotel_requests: Vec<_> =
        requests.iter().filter(|r| r.tools.contains_key("book_hotel")).collect();
    assert_eq!(hotel_requests.len(), 2);
    let first = hotel_requests[0];
    assert_eq!(first.contents.len(), 1);
    assert_eq!(first.user_text(), FLIGHT_AND_HOTEL);
    assert!(!first.tools.contains_key("book_flight"));
    assert!(first.answered_tools().is_empty());
    let instruction = first.system_instruction.as_deref().unwrap();
    assert!(instruction.contains("You only handle hotel booking."));
}

#[tokio::test]
async fn test_summary_reads_both_slots() {
    let model = travel_model();
    let pipeline = PipelineBuilder::new(config()).model(model.clone()).build().unwrap();
    pipeline.run(FLIGHT_ONLY).await.unwrap();

    let requests = model.requests();
    let summary = requests.iter().find(|r| r.tools.is_empty()).unwrap();
    let text = summary.user_text();
    assert!(text.starts_with(
        "flight_booking: Your flight is confirmed. Flight booked from San Francisco to Mumbai on 26th March 2026."
    ));
    assert!(text.ends_with("hotel_booking: (no action taken)"));
    assert!(summary.system_instruction.as_deref().unwrap().contains("single sentence"));
}

#[tokio::test]
async fn test_output_budget_reaches_every_model_call() {
    let model = travel_model();
    let lenient = PipelineConfig::default().with_profile(InstructionProfile::Lenient);
    let pipeline = PipelineBuilder::new(lenient).model(model.clone()).build().unwrap();
    pipeline.run(FLIGHT_ONLY).await.unwrap();

    let requests = model.requests();
    assert!(!requests.is_empty());
    for request in &requests {
        assert_eq!(request.config.as_ref().and_then(|c| c.max_output_tokens), Some(100));
    }
}

#[tokio::test]
async fn test_summary_abstaining_gives_empty_output() {
    let pipeline = PipelineBuilder::new(config()).model(travel_model()).build().unwrap();
    let run = pipeline.run("What is the weather in Mumbai?").await.unwrap();

    assert_eq!(run.output, "");
    assert!(run.stages.iter().all(|s| s.outcome.is_abstained()));
    assert!(run.tool_calls().is_empty());
}

#[tokio::test]
async fn test_empty_request_is_rejected() {
    let model = travel_model();
    let pipeline = PipelineBuilder::new(config()).model(model.clone()).build().unwrap();

    let err = pipeline.run("   \n").await.unwrap_err();
    assert!(matches!(err, TripError::InvalidInput(_)));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_model_failure_names_the_stage() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));

    let model = Arc::new(MockLlm::from_fn("flaky", |req| {
        if req.tools.contains_key("book_hotel") {
            Err(TripError::Model("quota exceeded".to_string()))
        } else {
            respond(req)
        }
    }));
    let sessions = Arc::new(InMemorySessionService::new());
    let pipeline = PipelineBuilder::new(config())
        .model(model.clone())
        .session_service(sessions.clone())
        .build()
        .unwrap();

    let err = pipeline.run(FLIGHT_AND_HOTEL).await.unwrap_err();
    assert_eq!(err.stage(), Some(HOTEL_AGENT));
    assert!(err.to_string().contains("quota exceeded"));
    let message = "Model error: quota exceeded".to_string();
    assert_eq!(AgentOutcome::from_error(&err), AgentOutcome::Errored { message });
    assert!(sessions.is_empty());
    assert!(model.requests().iter().all(|r| !r.tools.is_empty()), "summary must not run");

    let trace = TraceAsserter::from_collector(&collector);
    trace.turn().has_error();
    trace.called_agent(HOTEL_AGENT).has_error();
    trace.called_agent(FLIGHT_AGENT).has_no_error();
    assert!(trace.spans().iter().all(|s| s.agent_name() != Some(SUMMARY_AGENT)));
}

#[tokio::test]
async fn test_sessions_are_ephemeral() {
    let sessions = Arc::new(InMemorySessionService::new());
    let pipeline = PipelineBuilder::new(config())
        .model(travel_model())
        .session_service(sessions.clone())
        .build()
        .unwrap();

    let first = pipeline.run(FLIGHT_ONLY).await.unwrap();
    let second = pipeline.run(FLIGHT_ONLY).await.unwrap();
    assert_ne!(first.session_id, second.session_id);
    assert_eq!(first.output, second.output);
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_mocked_tool_renders_arguments() {
    let pipeline = PipelineBuilder::new(config())
        .model(travel_model())
        .mock_tool(
            "book_flight",
            json!({
                "status": "success",
                "message": "Mock flight {{from_airport}} -> {{to_airport}}."
            }),
        )
        .unwrap()
        .build()
        .unwrap();

    let run = pipeline.run(FLIGHT_ONLY).await.unwrap();
    let message = &run.tool_calls()[0].response["message"];
    assert_eq!(message, &json!("Mock flight San Francisco -> Mumbai."));
    assert_eq!(run.output, "Trip summary: Mock flight San Francisco -> Mumbai.");
}

#[tokio::test]
async fn test_override_tool_keeps_declaration() {
    let real = book_flight_tool();
    let mock =
        Arc::new(MockTool::replacing(real.as_ref(), json!({"status": "success", "message": "ok"})));
    let model = travel_model();
    let pipeline = PipelineBuilder::new(config())
        .model(model.clone())
        .override_tool(mock.clone())
        .build()
        .unwrap();

    pipeline.run(FLIGHT_ONLY).await.unwrap();
    assert_eq!(mock.calls().len(), 1);
    let requests = model.requests();
    assert_eq!(requests[0].tools["book_flight"], real.declaration());
}

#[test]
fn test_builder_errors() {
    let err = PipelineBuilder::new(config())
        .model(travel_model())
        .mock_tool("book_train", json!({}))
        .err()
        .unwrap();
    assert!(matches!(err, TripError::Config(_)));

    let stray = Arc::new(MockTool::new("book_car", "Books a car", json!("ok")));
    let err = PipelineBuilder::new(config())
        .model(travel_model())
        .override_tool(stray)
        .build()
        .err()
        .unwrap();
    assert!(err.to_string().contains("book_car"));

    let err = PipelineBuilder::new(config()).build().err().unwrap();
    assert!(err.to_string().contains("GOOGLE_API_KEY"));

    let pipeline = PipelineBuilder::new(config().with_api_key("test-key")).build().unwrap();
    assert_eq!(pipeline.root_agent().name(), SUPERVISOR_AGENT);
    assert_eq!(pipeline.root_agent().sub_agents().len(), 3);
}

#[tokio::test]
async fn test_scripted_confirmation_is_passed_through() {
    let model = Arc::new(
        MockLlm::new("scripted")
            .with_response(LlmResponse::function_call(
                "book_flight",
                json!({"from_airport": "San Francisco", "to_airport": "Mumbai"}),
            ))
            .with_response(LlmResponse::text("Flight from San Francisco to Mumbai is booked."))
            .with_response(LlmResponse::text(""))
            .with_response(LlmResponse::text("You fly from San Francisco to Mumbai.")),
    );
    let pipeline = PipelineBuilder::new(config()).model(model).build().unwrap();
    let run = pipeline.run(FLIGHT_ONLY).await.unwrap();

    assert_eq!(
        run.outcome(FLIGHT_AGENT).unwrap().text(),
        "Flight from San Francisco to Mumbai is booked."
    );
    assert_eq!(
        run.tool_calls()[0].response,
        json!({"status": "success", "message": "Flight booked from San Francisco to Mumbai."})
    );
    assert_eq!(run.output, "You fly from San Francisco to Mumbai.");
}

#[tokio::test]
async fn test_hotel_call_from_flight_agent_leaves_no_trace() {
    let collector = TraceCollector::new();
    let _guard = tracing::subscriber::set_default(capture(&collector));

    let model = Arc::new(
        MockLlm::new("scripted")
            .with_response(LlmResponse::function_call(
                "book_hotel",
                json!({"hotel_name": "Marriot Intercontinental", "city": "Juhu"}),
            ))
            .with_response(LlmResponse::text(""))
            .with_response(LlmResponse::text(""))
            .with_response(LlmResponse::text("")),
    );
    let pipeline = PipelineBuilder::new(config()).model(model).build().unwrap();
    let run = pipeline.run(FLIGHT_ONLY).await.unwrap();

    assert!(run.tool_calls().is_empty());
    assert!(run.outcome(FLIGHT_AGENT).is_some_and(AgentOutcome::is_abstained));
    let trace = TraceAsserter::from_collector(&collector);
    trace.did_not_call_tool("book_hotel").did_not_call_tool("book_flight");
}
