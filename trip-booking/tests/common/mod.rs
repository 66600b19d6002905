#![allow(dead_code)]

use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use trip_core::{LlmRequest, LlmResponse, Part, Result};
use trip_model::MockLlm;
use trip_telemetry::{TraceCollector, TraceLayer};

pub const FLIGHT_AND_HOTEL: &str = "Book a flight from San Francisco to Mumbai for 26th April 2026. \
Book a two queen room at Marriot Intercontinental at Central Mumbai for 27th April 2026 for 4 nights.";
pub const FLIGHT_ONLY: &str = "Book a flight from San Francisco to Mumbai for 26th March 2026.";

static FLIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"flight from ([A-Za-z ]+?) to ([A-Za-z ]+?)(?: for ([0-9]+[a-z]{2} [A-Za-z]+ [0-9]{4}))?\.").unwrap()
});
static HOTEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"room at ([A-Za-z ]+?) at ([A-Za-z ]+?) for ([0-9]+[a-z]{2} [A-Za-z]+ [0-9]{4}) for ([0-9]+) nights").unwrap()
});
static STAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"stay at ([A-Za-z ]+?) in ([A-Za-z ]+?)\.").unwrap());

/// Deterministic stand-in for the hosted model
///
/// Extracts booking fields with regexes, calls the agent's tool once,
/// confirms with the tool's message and summarizes the input slots.
pub fn travel_model() -> Arc<MockLlm> {
    Arc::new(MockLlm::from_fn("travel-fake", respond))
}

pub fn respond(req: &LlmRequest) -> Result<LlmResponse> {
    if let Some(message) = tool_message(req) {
        let confirmation = if req.tools.contains_key("book_flight") {
            format!("Your flight is confirmed. {message}")
        } else {
            format!("Your hotel is confirmed. {message}")
        };
        return Ok(LlmResponse::text(confirmation));
    }

    let text = req.user_text();
    if req.tools.contains_key("book_flight") {
        return Ok(match FLIGHT_RE.captures(&text) {
            Some(caps) => {
                let mut args = json!({"from_airport": &caps[1], "to_airport": &caps[2]});
                if let Some(date) = caps.get(3) {
                    args["date"] = json!(date.as_str());
                }
                LlmResponse::function_call("book_flight", args)
            }
            None => LlmResponse::text(""),
        });
    }
    if req.tools.contains_key("book_hotel") {
        if let Some(caps) = HOTEL_RE.captures(&text) {
            let nights: u32 = caps[4].parse().unwrap_or(1);
            return Ok(LlmResponse::function_call(
                "book_hotel",
                json!({
                    "hotel_name": &caps[1],
                    "city": &caps[2],
                    "check_in_date": &caps[3],
                    "duration": nights
                }),
            ));
        }
        if let Some(caps) = STAY_RE.captures(&text) {
            return Ok(LlmResponse::function_call(
                "book_hotel",
                json!({"hotel_name": &caps[1], "city": &caps[2]}),
            ));
        }
        return Ok(LlmResponse::text(""));
    }
    Ok(LlmResponse::text(summarize(&text)))
}

fn tool_message(req: &LlmRequest) -> Option<String> {
    req.contents.iter().flat_map(|c| c.parts.iter()).find_map(|p| match p {
        Part::FunctionResponse { function_response, .. } => Some(
            function_response.response["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| function_response.response.to_string()),
        ),
        _ => None,
    })
}

/// Joins the non-empty `slot: value` lines of the summary agent's input
fn summarize(slots: &str) -> String {
    let booked: Vec<&str> = slots
        .lines()
        .filter_map(|line| line.split_once(": ").map(|(_, v)| v))
        .filter(|v| *v != trip_agent::EMPTY_SLOT)
        .map(|v| v.rsplit(". ").next().unwrap_or(v).trim_end_matches('.'))
        .collect();
    if booked.is_empty() {
        String::new()
    } else {
        format!("Trip summary: {}.", booked.join("; "))
    }
}

pub fn capture(collector: &TraceCollector) -> impl Subscriber + Send + Sync + use<> {
    tracing_subscriber::registry().with(TraceLayer::new(collector.clone()))
}
