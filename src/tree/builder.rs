//! Call-tree builder: wires the three trees together for one program run.
//!
//! Every ingested event flows concrete-first: the concrete tree decides
//! whether the event started a new invocation, attached to an existing one,
//! or was an orphan; the abstract tree then aggregates, and the presented
//! tree is rebuilt to mirror the new original state. The strict
//! parent-before-child recording order the abstract tree relies on falls out
//! of this sequencing.

use crate::event::{parse_event_batch, ConsoleLogEvent, Event};
use crate::utils::error::{EventError, TreeError};
use log::info;

use super::abstract_tree::AbstractCallTree;
use super::concrete::{AppendOutcome, ConcreteCallTree};
use super::presented::{MergeOutcome, PresentedTree};

/// All call-tree state for a single run of the instrumented program.
///
/// Constructed fresh when a new `programUUID` is observed and discarded
/// wholesale afterwards; nothing in here survives a run change.
#[derive(Debug)]
pub struct CallTreeBuilder {
    program_uuid: String,
    concrete: ConcreteCallTree,
    original: AbstractCallTree,
    presented: PresentedTree,
    console_logs: Vec<ConsoleLogEvent>,
}

impl CallTreeBuilder {
    pub fn new(program_uuid: impl Into<String>) -> Self {
        Self {
            program_uuid: program_uuid.into(),
            concrete: ConcreteCallTree::new(),
            original: AbstractCallTree::new(),
            presented: PresentedTree::new(),
            console_logs: Vec::new(),
        }
    }

    /// The run this builder belongs to
    pub fn program_uuid(&self) -> &str {
        &self.program_uuid
    }

    /// Ingest one event: concrete append, abstract aggregation, presented
    /// rebuild.
    ///
    /// Note the rebuild resets any split/merge state on the presented tree;
    /// callers re-apply their splits afterwards if they want them to stick.
    pub fn append_event(&mut self, event: Event) -> AppendOutcome {
        let uuid = event.header().current_uuid.clone();
        let console = event.as_console_log().cloned();

        let outcome = self.concrete.append_event(event);

        match outcome {
            AppendOutcome::NewInvocation => {
                let header = self
                    .concrete
                    .node(&uuid)
                    .map(|n| n.header().clone());
                let parent_header = self.concrete.parent_of(&uuid).map(|n| n.header().clone());
                if let Some(header) = header {
                    self.original
                        .record_invocation(&header, parent_header.as_ref());
                }
            }
            AppendOutcome::Associated => {
                if let Some(log) = console {
                    let invocation = self.concrete.node(&uuid).map(|n| n.header().clone());
                    if let Some(invocation) = invocation {
                        self.original.record_log_hit(&invocation, &log);
                        self.console_logs.push(log);
                    }
                }
            }
            AppendOutcome::DuplicateStart | AppendOutcome::Orphaned => {}
        }

        self.presented.rebuild_from_original(&self.original);
        outcome
    }

    /// Per-invocation call tree (read-only)
    pub fn concrete(&self) -> &ConcreteCallTree {
        &self.concrete
    }

    /// Authoritative abstract tree (read-only)
    pub fn original(&self) -> &AbstractCallTree {
        &self.original
    }

    /// UI-facing working copy (read-only; mutate through `split_presented`
    /// and `merge_presented`)
    pub fn presented(&self) -> &PresentedTree {
        &self.presented
    }

    /// Split a presented subtree out into its own root
    pub fn split_presented(&mut self, key: &str) -> Result<(), TreeError> {
        self.presented.split_by_key(key)
    }

    /// Merge two presented subtrees, validated against the original topology
    pub fn merge_presented(&mut self, key_a: &str, key_b: &str) -> Result<MergeOutcome, TreeError> {
        self.presented.merge_by_keys(key_a, key_b, &self.original)
    }

    /// All events observed within one invocation
    pub fn invocation_logs(&self, uuid: &str) -> Result<&[Event], TreeError> {
        self.concrete.invocation_logs(uuid)
    }

    /// Every captured console call of this run, in arrival order
    pub fn console_logs(&self) -> &[ConsoleLogEvent] {
        &self.console_logs
    }
}

/// Ingestion front door owning builder lifecycles.
///
/// The transport collaborator pushes events (or raw JSON batches) in here;
/// the session watches `programUUID` and swaps in a fresh builder whenever a
/// new run starts.
#[derive(Debug, Default)]
pub struct IngestSession {
    builder: Option<CallTreeBuilder>,
}

impl IngestSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one event, replacing the builder if it belongs to a new run.
    pub fn ingest(&mut self, event: Event) -> AppendOutcome {
        let program_uuid = event.header().program_uuid.clone();

        let stale = self
            .builder
            .as_ref()
            .map_or(true, |b| b.program_uuid() != program_uuid);
        if stale {
            info!(
                "Program run {} started, discarding prior call-tree state",
                program_uuid
            );
            self.builder = None;
        }

        self.builder
            .get_or_insert_with(|| CallTreeBuilder::new(program_uuid))
            .append_event(event)
    }

    /// Ingest a transport batch payload (`{"logs": [...]}` or a bare array).
    ///
    /// Returns the number of events handed to the builder; individually
    /// malformed entries were already skipped by the event parser.
    ///
    /// # Errors
    /// * `EventError::InvalidFormat` - unrecognizable payload or a non-empty
    ///   batch with no parseable entry
    pub fn ingest_batch(&mut self, payload: &serde_json::Value) -> Result<usize, EventError> {
        let events = parse_event_batch(payload)?;
        let count = events.len();
        for event in events {
            self.ingest(event);
        }
        Ok(count)
    }

    /// Builder of the current run, if any event has arrived yet
    pub fn builder(&self) -> Option<&CallTreeBuilder> {
        self.builder.as_ref()
    }

    pub fn builder_mut(&mut self) -> Option<&mut CallTreeBuilder> {
        self.builder.as_mut()
    }
}
