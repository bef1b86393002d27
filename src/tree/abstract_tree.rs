//! Abstract call tree: one node per distinct call site.
//!
//! Collapses repeated invocations of the same (filename, functionName) pair
//! into a single node carrying aggregate counts, with one nested log-site
//! node per distinct console line. Lets the UI show "called 12 times, with
//! console output at 3 distinct lines" without re-walking the concrete tree
//! on every render.
//!
//! The shape of this tree is monotonic: nodes are only ever added, a node's
//! parent is fixed by the first invocation that established it, and repeat
//! traffic mutates counters alone.

use crate::event::{ConsoleLogEvent, EventHeader};
use crate::utils::config;
use log::debug;
use std::collections::{BTreeSet, HashMap};

use super::concrete::NodeId;

/// Per-kind aggregate state of an abstract node
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractNodeKind {
    /// A call site: a static (filename, functionName) pair
    Function {
        /// Invocations observed at this site
        call_count: u64,
        /// Distinct source lines with console output under this site
        log_lines: BTreeSet<u32>,
    },

    /// A logging-statement site nested under its call site
    Log {
        /// 1-based source line of the console call
        line_number: u32,
        /// Hits observed at this exact line
        hit_count: u64,
    },
}

/// A deduplicated call-site or log-site node
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractNode {
    key: String,
    filename: String,
    function_name: String,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: AbstractNodeKind,
}

impl AbstractNode {
    /// Identity key: `filename||functionName`, with `||lineNumber` appended
    /// for log sites
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Display label: the function name, or the console text for log sites
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &AbstractNodeKind {
        &self.kind
    }

    pub fn is_log(&self) -> bool {
        matches!(self.kind, AbstractNodeKind::Log { .. })
    }

    /// Invocations for call sites, hits for log sites
    pub fn call_count(&self) -> u64 {
        match &self.kind {
            AbstractNodeKind::Function { call_count, .. } => *call_count,
            AbstractNodeKind::Log { hit_count, .. } => *hit_count,
        }
    }
}

/// The authoritative deduplicated tree for one program run.
#[derive(Debug, Default)]
pub struct AbstractCallTree {
    nodes: Vec<AbstractNode>,
    index: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
}

impl AbstractCallTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation of a call site.
    ///
    /// A known key only increments its `call_count`. A new key creates a node
    /// under the parent invocation's abstract node; conflicting parents seen
    /// later never move it.
    ///
    /// # Panics
    /// If `parent` names an invocation whose abstract node does not exist.
    /// The builder records parents strictly before children, so a missing
    /// abstract parent is an internal ordering bug, not bad input.
    pub fn record_invocation(&mut self, header: &EventHeader, parent: Option<&EventHeader>) {
        let key = header.call_site_key();

        if let Some(&id) = self.index.get(&key) {
            if let AbstractNodeKind::Function { call_count, .. } = &mut self.nodes[id].kind {
                *call_count += 1;
            }
            return;
        }

        let parent_id = parent.map(|p| {
            let parent_key = p.call_site_key();
            match self.index.get(&parent_key) {
                Some(&id) => id,
                None => panic!("Abstract parent node not found for {}", parent_key),
            }
        });

        let id = self.push_node(AbstractNode {
            key: key.clone(),
            filename: header.filename.clone(),
            function_name: header.function_name.clone(),
            name: header.function_name.clone(),
            parent: parent_id,
            children: Vec::new(),
            kind: AbstractNodeKind::Function {
                call_count: 1,
                log_lines: BTreeSet::new(),
            },
        });

        match parent_id {
            Some(pid) => self.nodes[pid].children.push(id),
            None => self.roots.push(id),
        }

        debug!("New call site {}", key);
    }

    /// Record a console hit within an invocation of a known call site.
    ///
    /// Creates the log-site node on the first hit at that line (display name
    /// taken from the pre-rendered console text) and increments its counter
    /// afterwards; the distinct line is also folded into the owning call
    /// site's `log_lines` set.
    ///
    /// # Panics
    /// If the invocation's call site has no abstract node; the builder
    /// records every invocation before its events, so this is an internal
    /// ordering bug.
    pub fn record_log_hit(&mut self, invocation: &EventHeader, event: &ConsoleLogEvent) {
        let site_key = invocation.call_site_key();
        let site_id = match self.index.get(&site_key) {
            Some(&id) => id,
            None => panic!("Abstract call-site node not found for {}", site_key),
        };

        let line = event.header.line_number;
        let log_key = config::log_site_key(&site_key, line);

        match self.index.get(&log_key) {
            Some(&id) => {
                if let AbstractNodeKind::Log { hit_count, .. } = &mut self.nodes[id].kind {
                    *hit_count += 1;
                }
            }
            None => {
                let id = self.push_node(AbstractNode {
                    key: log_key,
                    filename: invocation.filename.clone(),
                    function_name: invocation.function_name.clone(),
                    name: event.console_log_text.clone(),
                    parent: Some(site_id),
                    children: Vec::new(),
                    kind: AbstractNodeKind::Log {
                        line_number: line,
                        hit_count: 1,
                    },
                });
                self.nodes[site_id].children.push(id);
            }
        }

        if let AbstractNodeKind::Function { log_lines, .. } = &mut self.nodes[site_id].kind {
            log_lines.insert(line);
        }
    }

    /// Root call sites in first-observed order
    pub fn roots(&self) -> impl Iterator<Item = &AbstractNode> {
        self.roots.iter().map(|&id| &self.nodes[id])
    }

    pub fn node_by_key(&self, key: &str) -> Option<&AbstractNode> {
        self.index.get(key).map(|&id| &self.nodes[id])
    }

    /// Node by arena id (for walking `children()` lists)
    pub fn get(&self, id: NodeId) -> Option<&AbstractNode> {
        self.nodes.get(id)
    }

    pub(crate) fn root_ids(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of distinct call sites and log sites
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Key of a node's parent in the authoritative topology, or `None` for
    /// roots and unknown keys.
    ///
    /// Reconciliation uses this to validate proposed moves against the true
    /// shape rather than whatever the presented tree currently looks like.
    pub fn original_parent_key(&self, key: &str) -> Option<&str> {
        let node = self.node_by_key(key)?;
        node.parent.map(|pid| self.nodes[pid].key())
    }

    /// Whether `ancestor_key` lies strictly above `descendant_key` in the
    /// authoritative topology.
    pub fn is_ancestor(&self, ancestor_key: &str, descendant_key: &str) -> bool {
        if ancestor_key == descendant_key {
            return false;
        }
        let Some(descendant) = self.node_by_key(descendant_key) else {
            return false;
        };

        let mut current = descendant.parent;
        while let Some(id) = current {
            if self.nodes[id].key() == ancestor_key {
                return true;
            }
            current = self.nodes[id].parent;
        }
        false
    }

    /// Path of keys from `ancestor_key` (exclusive) down to `key`
    /// (inclusive), following original parent links. Empty when the two are
    /// unrelated.
    pub(crate) fn path_from_ancestor(&self, ancestor_key: &str, key: &str) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = self.node_by_key(key);
        while let Some(node) = current {
            if node.key() == ancestor_key {
                path.reverse();
                return path;
            }
            path.push(node.key().to_string());
            current = node.parent.map(|id| &self.nodes[id]);
        }
        Vec::new()
    }

    fn push_node(&mut self, node: AbstractNode) -> NodeId {
        let id = self.nodes.len();
        self.index.insert(node.key.clone(), id);
        self.nodes.push(node);
        id
    }
}
