//! Wire schema for probe events.
//!
//! The instrumentation side injects probes into the running JS/TS program;
//! each probe fires a JSON event tagged with a `type` discriminator and the
//! correlation identifiers that let the builder reconstruct the call tree.
//! Field names are camelCase on the wire to match the emitter.

use crate::utils::config;
use crate::utils::error::EventError;
use log::warn;
use serde::{Deserialize, Serialize};

/// Fields shared by every event variant.
///
/// `current_uuid` identifies the invocation the event occurred within;
/// `parent_uuid` identifies the invocation that called it (absent or empty
/// for top-level calls); `program_uuid` identifies one run of the
/// instrumented program and signals a state reset when it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHeader {
    /// Source path of the instrumented file
    pub filename: String,

    /// Enclosing function name
    pub function_name: String,

    /// 1-based source line of the probe
    pub line_number: u32,

    /// Wall-clock milliseconds (JS `Date.now()` interop, hence floating point)
    pub timestamp: f64,

    #[serde(rename = "currentUUID")]
    pub current_uuid: String,

    #[serde(
        rename = "parentUUID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_uuid: Option<String>,

    #[serde(rename = "programUUID")]
    pub program_uuid: String,
}

impl EventHeader {
    /// Parent invocation id, normalizing the emitter's empty string to "no parent".
    pub fn parent(&self) -> Option<&str> {
        self.parent_uuid.as_deref().filter(|p| !p.is_empty())
    }

    /// Call-site key (`filename||functionName`) of the enclosing function.
    pub fn call_site_key(&self) -> String {
        config::call_site_key(&self.filename, &self.function_name)
    }
}

/// A plain executed-statement probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEvent {
    #[serde(flatten)]
    pub header: EventHeader,
}

/// A captured `console.log` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleLogEvent {
    #[serde(flatten)]
    pub header: EventHeader,

    /// Ordered arguments of the console call, as arbitrary JSON values
    pub log_data: Vec<serde_json::Value>,

    /// Unique id for UI cross-referencing (hover sync, drag payloads)
    pub log_id: String,

    /// Pre-rendered display string for the whole call
    pub console_log_text: String,
}

/// A branch-decision probe (if/else, switch, ternary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchEvent {
    #[serde(flatten)]
    pub header: EventHeader,

    pub branch_type: String,

    /// Source text of the evaluated condition
    pub condition: String,
}

/// A function-entry probe; the one event type that creates invocation nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionStartEvent {
    #[serde(flatten)]
    pub header: EventHeader,
}

/// A function-exit probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionEndEvent {
    #[serde(flatten)]
    pub header: EventHeader,
}

/// One observed runtime occurrence, discriminated by the wire `type` field.
///
/// Modeled as a sum type so a `statement` cannot carry `logData` and a
/// `branch` cannot lose its condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "statement")]
    Statement(StatementEvent),

    #[serde(rename = "console.log")]
    ConsoleLog(ConsoleLogEvent),

    #[serde(rename = "branch")]
    Branch(BranchEvent),

    #[serde(rename = "functionStart")]
    FunctionStart(FunctionStartEvent),

    #[serde(rename = "functionEnd")]
    FunctionEnd(FunctionEndEvent),
}

impl Event {
    /// Shared header of any variant
    pub fn header(&self) -> &EventHeader {
        match self {
            Event::Statement(e) => &e.header,
            Event::ConsoleLog(e) => &e.header,
            Event::Branch(e) => &e.header,
            Event::FunctionStart(e) => &e.header,
            Event::FunctionEnd(e) => &e.header,
        }
    }

    pub fn is_function_start(&self) -> bool {
        matches!(self, Event::FunctionStart(_))
    }

    pub fn as_console_log(&self) -> Option<&ConsoleLogEvent> {
        match self {
            Event::ConsoleLog(e) => Some(e),
            _ => None,
        }
    }
}

/// Parse a single event from a JSON value
///
/// # Errors
/// * `EventError::JsonError` - the value does not match the event schema
pub fn parse_event(value: &serde_json::Value) -> Result<Event, EventError> {
    Ok(serde_json::from_value(value.clone())?)
}

/// Parse a batch payload from the transport collaborator
///
/// Accepts either the `{"logs": [...]}` envelope the HTTP collector posts,
/// or a bare JSON array of events.
///
/// Individually malformed entries are logged and skipped rather than failing
/// the batch - the emitter runs inside arbitrary user programs and a partial
/// batch is still worth ingesting. A non-empty batch where every entry is
/// malformed is rejected.
///
/// # Errors
/// * `EventError::InvalidFormat` - payload is not an array or `logs` envelope,
///   or no entry in a non-empty batch could be parsed
pub fn parse_event_batch(payload: &serde_json::Value) -> Result<Vec<Event>, EventError> {
    let entries = extract_batch_entries(payload)?;

    let mut events = Vec::with_capacity(entries.len());
    for (index, value) in entries.iter().enumerate() {
        match serde_json::from_value::<Event>(value.clone()) {
            Ok(event) => events.push(event),
            Err(e) => {
                // Log but don't fail - some entries may be malformed
                warn!("Failed to parse event {}: {}", index, e);
            }
        }
    }

    if events.is_empty() && !entries.is_empty() {
        return Err(EventError::InvalidFormat(
            "All events in batch failed to parse".to_string(),
        ));
    }

    Ok(events)
}

/// Locate the event array inside a batch payload
fn extract_batch_entries(payload: &serde_json::Value) -> Result<&[serde_json::Value], EventError> {
    match payload {
        serde_json::Value::Object(obj) => obj
            .get("logs")
            .and_then(|v| v.as_array())
            .map(|a| a.as_slice())
            .ok_or_else(|| {
                EventError::InvalidFormat(
                    "Batch object is missing a \"logs\" array".to_string(),
                )
            }),
        serde_json::Value::Array(arr) => Ok(arr.as_slice()),
        _ => Err(EventError::InvalidFormat(
            "Batch payload must be a JSON object or array".to_string(),
        )),
    }
}
