//! # trip-booking
//!
//! A travel-booking assistant built from three agents run in a fixed order
//! by a supervisor:
//!
//! 1. `flight_booking_agent` may call [`book_flight`](tools::book_flight) and
//!    writes the `flight_booking` slot.
//! 2. `hotel_booking_agent` sees the same request, may call
//!    [`book_hotel`](tools::book_hotel) and writes `hotel_booking`.
//! 3. `trip_summary_agent` reads both slots and writes `booking_summary`,
//!    which becomes the run's output.
//!
//! Either booking agent may stay silent when the request is not about its
//! domain; the summary then reports only what was booked.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trip_booking::{PipelineBuilder, PipelineConfig};
//!
//! let pipeline = PipelineBuilder::new(PipelineConfig::from_env()?).build()?;
//! let run = pipeline
//!     .run("Book a flight from San Francisco to Mumbai for 26th April 2026.")
//!     .await?;
//! println!("{}", run.output);
//! ```

pub mod config;
pub mod eval;
pub mod instructions;
pub mod pipeline;
pub mod tools;

pub use config::{DEFAULT_APP_NAME, DEFAULT_USER_ID, InstructionProfile, PipelineConfig};
pub use eval::PipelineCaseRunner;
pub use pipeline::{
    FLIGHT_AGENT, FLIGHT_SLOT, HOTEL_AGENT, HOTEL_SLOT, PipelineBuilder, PipelineRun,
    SUMMARY_AGENT, SUMMARY_SLOT, SUPERVISOR_AGENT, StageReport, TravelPipeline,
};
pub use tools::{
    BOOK_FLIGHT, BOOK_HOTEL, BookingResult, BookingStatus, FlightBookingArgs, HotelBookingArgs,
    book_flight, book_flight_tool, book_hotel, book_hotel_tool,
};
