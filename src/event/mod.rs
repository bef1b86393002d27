//! Probe event model and wire schema.
//!
//! This module defines:
//! - The tagged `Event` union emitted by the instrumentation probes
//! - The shared correlation header (invocation / parent / program ids)
//! - Lenient parsing of transport batch payloads

pub mod schema;

// Re-export main types
pub use schema::{
    parse_event, parse_event_batch, BranchEvent, ConsoleLogEvent, Event, EventHeader,
    FunctionEndEvent, FunctionStartEvent, StatementEvent,
};
