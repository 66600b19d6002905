//! Booking tools
//!
//! Both tools are pure: the same arguments always produce the same
//! confirmation, and nothing is actually reserved.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use trip_core::{Result, Tool, ToolContext, TripError};
use trip_tool::FunctionTool;

pub const BOOK_FLIGHT: &str = "book_flight";
pub const BOOK_HOTEL: &str = "book_hotel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Success,
    /// Never produced; booking cannot fail.
    Failure,
}

/// What a booking tool hands back to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResult {
    pub status: BookingStatus,
    pub message: String,
}

impl BookingResult {
    fn success(message: String) -> Self {
        Self { status: BookingStatus::Success, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FlightBookingArgs {
    /// The airport from which the flight departs.
    pub from_airport: String,
    /// The airport to which the flight arrives.
    pub to_airport: String,
    /// The date of the flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HotelBookingArgs {
    /// The name of the hotel to book.
    pub hotel_name: String,
    /// The city where the hotel is located.
    pub city: String,
    /// The check-in date for the hotel stay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_date: Option<String>,
    /// The duration of the hotel stay in nights.
    #[serde(default = "one_night")]
    pub duration: u32,
}

fn one_night() -> u32 {
    1
}

/// Books a flight from one airport to another.
pub fn book_flight(from_airport: &str, to_airport: &str, date: Option<&str>) -> BookingResult {
    let message = match date {
        Some(date) => format!("Flight booked from {from_airport} to {to_airport} on {date}."),
        None => format!("Flight booked from {from_airport} to {to_airport}."),
    };
    BookingResult::success(message)
}

/// Books a hotel for a stay of `duration` nights.
pub fn book_hotel(
    hotel_name: &str,
    city: &str,
    check_in_date: Option<&str>,
    duration: u32,
) -> BookingResult {
    let mut message = format!("Successfully booked a stay at {hotel_name} in {city}");
    if duration > 1 {
        message.push_str(&format!(" for {duration} nights"));
    }
    if let Some(date) = check_in_date {
        message.push_str(&format!(" starting {date}"));
    }
    message.push('.');
    BookingResult::success(message)
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| TripError::Tool(format!("invalid arguments for {tool}: {e}")))
}

fn call_book_flight(args: Value) -> Result<Value> {
    let args: FlightBookingArgs = parse_args(BOOK_FLIGHT, args)?;
    let result = book_flight(&args.from_airport, &args.to_airport, args.date.as_deref());
    Ok(serde_json::to_value(result)?)
}

fn call_book_hotel(args: Value) -> Result<Value> {
    let args: HotelBookingArgs = parse_args(BOOK_HOTEL, args)?;
    let result =
        book_hotel(&args.hotel_name, &args.city, args.check_in_date.as_deref(), args.duration);
    Ok(serde_json::to_value(result)?)
}

pub fn book_flight_tool() -> Arc<dyn Tool> {
    let tool = FunctionTool::new(
        BOOK_FLIGHT,
        "Books a flight from one airport to another.",
        |_ctx: Arc<dyn ToolContext>, args| async move { call_book_flight(args) },
    )
    .with_parameters_schema::<FlightBookingArgs>();
    Arc::new(tool)
}

pub fn book_hotel_tool() -> Arc<dyn Tool> {
    let tool = FunctionTool::new(
        BOOK_HOTEL,
        "Books a hotel for a stay.",
        |_ctx: Arc<dyn ToolContext>, args| async move { call_book_hotel(args) },
    )
    .with_parameters_schema::<HotelBookingArgs>();
    Arc::new(tool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_flight_message() {
        let result = book_flight("San Francisco", "Mumbai", None);
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"status":"success","message":"Flight booked from San Francisco to Mumbai."}"#
        );
        assert_eq!(
            book_flight("San Francisco", "Mumbai", Some("26th April 2026")).message,
            "Flight booked from San Francisco to Mumbai on 26th April 2026."
        );
    }

    #[test]
    fn test_book_hotel_clauses() {
        let result =
            book_hotel("Marriot Intercontinental", "Central Mumbai", Some("27th April 2026"), 4);
        assert_eq!(
            result.message,
            "Successfully booked a stay at Marriot Intercontinental in Central Mumbai for 4 nights starting 27th April 2026."
        );
        assert_eq!(result.status, BookingStatus::Success);

        let short = book_hotel("Hilton", "Boston", None, 1);
        assert_eq!(short.message, "Successfully booked a stay at Hilton in Boston.");
        assert!(!short.message.contains("nights"));
    }

    #[test]
    fn test_identical_arguments_give_identical_output() {
        let booking = || book_hotel("Hilton", "Boston", Some("1st May 2026"), 2);
        let a = serde_json::to_string(&booking()).unwrap();
        let b = serde_json::to_string(&booking()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hotel_duration_defaults_to_one_night() {
        let args = serde_json::json!({"hotel_name": "Hilton", "city": "Boston"});
        let args: HotelBookingArgs = serde_json::from_value(args).unwrap();
        assert_eq!(args.duration, 1);
        assert_eq!(args.check_in_date, None);
    }

    #[test]
    fn test_tool_declarations() {
        let flight = book_flight_tool();
        let decl = flight.declaration();
        assert_eq!(decl["name"], "book_flight");
        let required = decl["parameters"]["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("from_airport")));
        assert!(!required.contains(&serde_json::json!("date")));

        let hotel = book_hotel_tool();
        let params = hotel.parameters_schema().unwrap();
        assert!(params["properties"]["duration"].is_object());
        let required = params["required"].as_array().unwrap();
        assert!(!required.contains(&serde_json::json!("duration")));
    }
}
