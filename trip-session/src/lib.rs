//! # trip-session
//!
//! Session storage for pipeline runs. A run creates one session, agents write
//! their output slots into its state through event state deltas, and the
//! session is dropped when the run ends.

mod inmemory;
mod service;
mod session;

pub use inmemory::InMemorySessionService;
pub use service::{CreateRequest, DeleteRequest, GetRequest, SessionService};
pub use session::{SessionSnapshot, StateMap};
