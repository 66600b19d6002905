//! Agent instruction texts per [`InstructionProfile`]
//!
//! The hotel instruction's "Marriott only on odd dates" rule is policy text
//! for the model. Nothing in the tools enforces it.

use crate::config::InstructionProfile;

pub const FLIGHT_AGENT_DESCRIPTION: &str = "Agent to book flights based on user queries.";
pub const HOTEL_AGENT_DESCRIPTION: &str = "Agent to book hotels based on user queries.";
pub const SUMMARY_AGENT_DESCRIPTION: &str =
    "Summarize the travel details from hotel bookings and flight bookings agents.";
pub const SUPERVISOR_DESCRIPTION: &str = "You are the supervisor agent that coordinates the flight booking and hotel booking. \
You must provide a consolidated summary back to the full coordination of the user's request.";

const FOCUSED_FLIGHT: &str = "You are a helpful agent who can assist users in booking flights. \
You only handle flight booking. Just handle that part from what the user says, ignore other parts of the requests.";

const FOCUSED_HOTEL: &str = "You are a helpful agent who can assist users in booking hotels. \
You only handle hotel booking. Book hotel if the user explicitly asks, just handle that part from what the user says, \
ignore other parts of the requests. NOTE: Marriott is only available on odd dates. Otherwise Hilton is the primary \
option unless user states specific hotel criteria and you can go ahead and book that instead.";

const CLARIFYING_HOTEL_SUFFIX: &str = " If the request contains the phrase \"Flight Hotel\", do not book anything; \
ask the user whether they mean a hotel near the airport or a hotel in the destination city.";

const SENTENCE_SUMMARY: &str = "Summarize the travel details from hotel bookings and flight bookings agents. \
Be concise in response and provide a single sentence summary.";

const PARAGRAPH_SUMMARY: &str = "Summarize the travel details from hotel bookings and flight bookings agents \
in one short paragraph. Mention only bookings that were actually made.";

const LENIENT_FLIGHT: &str = "You are a helpful agent who can assist users in booking flights.";

const LENIENT_HOTEL: &str = "You are a helpful agent who can assist users in booking hotels. \
If you are asked about hotel bookings, provide the relevant information. If not, then just stay silent.";

const LENIENT_SUMMARY: &str =
    "Summarize the travel details from hotel bookings and flight bookings agents.";

impl InstructionProfile {
    pub fn flight_instruction(&self) -> &'static str {
        match self {
            InstructionProfile::Focused | InstructionProfile::Clarifying => FOCUSED_FLIGHT,
            InstructionProfile::Lenient => LENIENT_FLIGHT,
        }
    }

    pub fn hotel_instruction(&self) -> String {
        match self {
            InstructionProfile::Focused => FOCUSED_HOTEL.to_string(),
            InstructionProfile::Clarifying => format!("{FOCUSED_HOTEL}{CLARIFYING_HOTEL_SUFFIX}"),
            InstructionProfile::Lenient => LENIENT_HOTEL.to_string(),
        }
    }

    pub fn summary_instruction(&self) -> &'static str {
        match self {
            InstructionProfile::Focused => SENTENCE_SUMMARY,
            InstructionProfile::Clarifying => PARAGRAPH_SUMMARY,
            InstructionProfile::Lenient => LENIENT_SUMMARY,
        }
    }
}
