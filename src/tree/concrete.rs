//! Concrete call tree: one node per function invocation.
//!
//! Every `functionStart` event creates a node keyed by its invocation UUID;
//! all other events attach to the node of the invocation they occurred in.
//! Nodes live in a flat arena and reference children by index, so traversals
//! stay iterative even for pathologically deep recursive programs.

use crate::event::{Event, EventHeader, FunctionStartEvent};
use crate::utils::error::TreeError;
use log::{debug, warn};
use std::collections::HashMap;

/// Index of a node inside the tree's arena
pub type NodeId = usize;

/// What `append_event` did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A `functionStart` created a new invocation node
    NewInvocation,

    /// `functionStart` for an already-known invocation; ignored (idempotent)
    DuplicateStart,

    /// Event appended to its invocation's associated-event sequence
    Associated,

    /// Event referenced an unknown invocation and was dropped
    Orphaned,
}

/// One function invocation and everything observed inside it
#[derive(Debug, Clone)]
pub struct InvocationNode {
    start: FunctionStartEvent,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    events: Vec<Event>,
}

impl InvocationNode {
    /// Invocation identifier (`currentUUID` of the `functionStart`)
    pub fn uuid(&self) -> &str {
        &self.start.header.current_uuid
    }

    pub fn header(&self) -> &EventHeader {
        &self.start.header
    }

    /// Call-site key (`filename||functionName`) of this invocation
    pub fn call_site_key(&self) -> String {
        self.start.header.call_site_key()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child invocations, in call order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Every event observed within this invocation, including its own
    /// `functionStart`, in arrival order
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

/// Owned deep copy of an invocation subtree
///
/// Handed to presentation code that wants a snapshot it can keep across
/// further ingestion.
#[derive(Debug, Clone)]
pub struct InvocationSubtree {
    pub start: FunctionStartEvent,
    pub events: Vec<Event>,
    pub children: Vec<InvocationSubtree>,
}

/// The per-invocation call tree for one program run.
///
/// Only grows; a new `programUUID` means the owner discards the whole tree
/// and starts a fresh one.
#[derive(Debug, Default)]
pub struct ConcreteCallTree {
    nodes: Vec<InvocationNode>,
    index: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
}

impl ConcreteCallTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one event.
    ///
    /// `functionStart` creates (or idempotently skips) an invocation node and
    /// links it under its parent, promoting it to root when the parent is not
    /// (yet) known. Ordered arrival - a parent's `functionStart` before its
    /// children's events - is a precondition of the ingestion boundary;
    /// promotion is permanent and is not revisited if the parent shows up
    /// later.
    ///
    /// Any other event type attaches to the node matching its `currentUUID`,
    /// or is dropped with a diagnostic if that invocation was never started.
    pub fn append_event(&mut self, event: Event) -> AppendOutcome {
        match &event {
            Event::FunctionStart(start) => {
                let start = start.clone();
                self.handle_function_start(start, event)
            }
            _ => self.associate_with_invocation(event),
        }
    }

    fn handle_function_start(
        &mut self,
        start: FunctionStartEvent,
        event: Event,
    ) -> AppendOutcome {
        let uuid = start.header.current_uuid.clone();
        if self.index.contains_key(&uuid) {
            // Skip duplicates: at-least-once delivery from the probe side
            return AppendOutcome::DuplicateStart;
        }

        let parent = start
            .header
            .parent()
            .and_then(|p| self.index.get(p).copied());

        let id = self.nodes.len();
        self.nodes.push(InvocationNode {
            start,
            parent,
            children: Vec::new(),
            events: Vec::new(),
        });
        self.index.insert(uuid.clone(), id);

        match parent {
            Some(parent_id) => self.nodes[parent_id].children.push(id),
            // No known parent: promoted to root
            None => self.roots.push(id),
        }

        debug!(
            "New invocation {} ({})",
            uuid,
            self.nodes[id].call_site_key()
        );

        // The functionStart is also the first associated event of its own node
        self.nodes[id].events.push(event);
        AppendOutcome::NewInvocation
    }

    fn associate_with_invocation(&mut self, event: Event) -> AppendOutcome {
        let header = event.header();
        match self.index.get(&header.current_uuid) {
            Some(&id) => {
                self.nodes[id].events.push(event);
                AppendOutcome::Associated
            }
            None => {
                warn!(
                    "Dropping event at {}:{} - no active invocation with UUID={}",
                    header.filename, header.line_number, header.current_uuid
                );
                AppendOutcome::Orphaned
            }
        }
    }

    /// Node for an invocation UUID, if it was ever started
    pub fn node(&self, uuid: &str) -> Option<&InvocationNode> {
        self.index.get(uuid).map(|&id| &self.nodes[id])
    }

    /// Node by arena id (for walking `children()` lists)
    pub fn get(&self, id: NodeId) -> Option<&InvocationNode> {
        self.nodes.get(id)
    }

    /// Parent invocation of a known invocation, if it had one
    pub fn parent_of(&self, uuid: &str) -> Option<&InvocationNode> {
        self.node(uuid)
            .and_then(|n| n.parent)
            .map(|id| &self.nodes[id])
    }

    /// All events observed within one invocation
    ///
    /// # Errors
    /// * `TreeError::UnknownUuid` - the invocation was never started
    pub fn invocation_logs(&self, uuid: &str) -> Result<&[Event], TreeError> {
        self.node(uuid)
            .map(|n| n.events())
            .ok_or_else(|| TreeError::UnknownUuid(uuid.to_string()))
    }

    /// Root invocations in arrival order
    pub fn roots(&self) -> impl Iterator<Item = &InvocationNode> {
        self.roots.iter().map(|&id| &self.nodes[id])
    }

    /// Number of invocations observed so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Owned deep copy of the subtree rooted at an invocation.
    ///
    /// Returns `None` for an unknown UUID so presentation code can probe
    /// defensively without an error path.
    pub fn subtree(&self, uuid: &str) -> Option<InvocationSubtree> {
        let root = *self.index.get(uuid)?;
        Some(self.clone_subtree(root))
    }

    fn clone_subtree(&self, root: NodeId) -> InvocationSubtree {
        // Pre-order walk with an explicit stack, then assemble in reverse so
        // every node's children are built before the node itself.
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().copied());
        }

        let mut built: HashMap<NodeId, InvocationSubtree> = HashMap::new();
        for &id in order.iter().rev() {
            let node = &self.nodes[id];
            let children = node
                .children
                .iter()
                .map(|child| {
                    built
                        .remove(child)
                        .expect("reverse pre-order builds children before parents")
                })
                .collect();
            built.insert(
                id,
                InvocationSubtree {
                    start: node.start.clone(),
                    events: node.events.clone(),
                    children,
                },
            );
        }

        built
            .remove(&root)
            .expect("subtree root is built last in reverse pre-order")
    }

    /// Nearest ancestor (the invocation itself included) whose call-site key
    /// matches.
    ///
    /// Lets a UI map a console line back to the invocation covered by a
    /// split-out subtree root.
    pub fn ancestor_matching_key(&self, uuid: &str, call_site_key: &str) -> Option<&InvocationNode> {
        let mut current = self.index.get(uuid).copied();
        while let Some(id) = current {
            let node = &self.nodes[id];
            if node.call_site_key() == call_site_key {
                return Some(node);
            }
            current = node.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ConsoleLogEvent, EventHeader, FunctionStartEvent, StatementEvent};

    fn header(uuid: &str, parent: Option<&str>, function: &str, line: u32) -> EventHeader {
        EventHeader {
            filename: "src/app.ts".to_string(),
            function_name: function.to_string(),
            line_number: line,
            timestamp: 1000.0,
            current_uuid: uuid.to_string(),
            parent_uuid: parent.map(str::to_string),
            program_uuid: "run-1".to_string(),
        }
    }

    fn start(uuid: &str, parent: Option<&str>, function: &str) -> Event {
        Event::FunctionStart(FunctionStartEvent {
            header: header(uuid, parent, function, 1),
        })
    }

    fn console(uuid: &str, function: &str, line: u32) -> Event {
        Event::ConsoleLog(ConsoleLogEvent {
            header: header(uuid, None, function, line),
            log_data: vec![serde_json::json!("msg")],
            log_id: format!("log-{}-{}", uuid, line),
            console_log_text: "msg".to_string(),
        })
    }

    fn statement(uuid: &str, function: &str, line: u32) -> Event {
        Event::Statement(StatementEvent {
            header: header(uuid, None, function, line),
        })
    }

    #[test]
    fn test_parent_child_linking() {
        let mut tree = ConcreteCallTree::new();
        tree.append_event(start("u1", None, "foo"));
        tree.append_event(start("u2", Some("u1"), "bar"));
        tree.append_event(start("u3", Some("u1"), "bar"));

        let roots: Vec<_> = tree.roots().collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].uuid(), "u1");
        assert_eq!(roots[0].children().len(), 2);

        let child_uuids: Vec<_> = roots[0]
            .children()
            .iter()
            .map(|&id| tree.get(id).unwrap().uuid().to_string())
            .collect();
        assert_eq!(child_uuids, vec!["u2", "u3"]);
        assert_eq!(tree.parent_of("u2").unwrap().uuid(), "u1");
    }

    #[test]
    fn test_duplicate_function_start_is_idempotent() {
        let mut tree = ConcreteCallTree::new();
        assert_eq!(
            tree.append_event(start("u1", None, "foo")),
            AppendOutcome::NewInvocation
        );
        assert_eq!(
            tree.append_event(start("u1", None, "foo")),
            AppendOutcome::DuplicateStart
        );

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roots().count(), 1);
        // The duplicate start is not associated a second time either
        assert_eq!(tree.invocation_logs("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_orphan_event_is_dropped() {
        let mut tree = ConcreteCallTree::new();
        assert_eq!(
            tree.append_event(console("ghost", "foo", 10)),
            AppendOutcome::Orphaned
        );
        assert!(tree.is_empty());

        // Ingestion continues unharmed
        assert_eq!(
            tree.append_event(start("u1", None, "foo")),
            AppendOutcome::NewInvocation
        );
    }

    #[test]
    fn test_unknown_parent_promotes_to_root() {
        let mut tree = ConcreteCallTree::new();
        tree.append_event(start("u2", Some("never-started"), "bar"));

        let roots: Vec<_> = tree.roots().collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].uuid(), "u2");

        // Promotion is permanent even if the parent arrives afterwards
        tree.append_event(start("never-started", None, "foo"));
        assert_eq!(tree.roots().count(), 2);
        assert!(tree.node("u2").unwrap().parent().is_none());
    }

    #[test]
    fn test_invocation_logs() {
        let mut tree = ConcreteCallTree::new();
        tree.append_event(start("u1", None, "foo"));
        tree.append_event(statement("u1", "foo", 2));
        tree.append_event(console("u1", "foo", 3));

        let logs = tree.invocation_logs("u1").unwrap();
        assert_eq!(logs.len(), 3);
        assert!(logs[0].is_function_start());

        assert!(matches!(
            tree.invocation_logs("nope"),
            Err(TreeError::UnknownUuid(_))
        ));
    }

    #[test]
    fn test_subtree_is_deep_copy() {
        let mut tree = ConcreteCallTree::new();
        tree.append_event(start("u1", None, "foo"));
        tree.append_event(start("u2", Some("u1"), "bar"));
        tree.append_event(console("u2", "bar", 10));

        let snapshot = tree.subtree("u1").unwrap();
        assert_eq!(snapshot.children.len(), 1);
        assert_eq!(snapshot.children[0].events.len(), 2);

        // Later ingestion does not leak into the snapshot
        tree.append_event(console("u2", "bar", 11));
        assert_eq!(snapshot.children[0].events.len(), 2);

        assert!(tree.subtree("nope").is_none());
    }

    #[test]
    fn test_ancestor_matching_key() {
        let mut tree = ConcreteCallTree::new();
        tree.append_event(start("u1", None, "foo"));
        tree.append_event(start("u2", Some("u1"), "bar"));
        tree.append_event(start("u3", Some("u2"), "baz"));

        let hit = tree
            .ancestor_matching_key("u3", "src/app.ts||foo")
            .expect("foo is an ancestor of u3");
        assert_eq!(hit.uuid(), "u1");

        // The starting invocation itself counts
        let self_hit = tree
            .ancestor_matching_key("u3", "src/app.ts||baz")
            .unwrap();
        assert_eq!(self_hit.uuid(), "u3");

        assert!(tree.ancestor_matching_key("u3", "src/app.ts||quux").is_none());
    }
}
