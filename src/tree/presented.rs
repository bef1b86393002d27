//! Presented call tree: the mutable working copy the UI rearranges.
//!
//! Rebuilt as a full deep clone of the original abstract tree after every
//! ingested event - a deliberate CPU-for-simplicity trade, since the number
//! of distinct call sites stays small relative to event volume. Rebuilding
//! resets any split/merge state; callers that want splits to survive
//! re-apply them afterwards.
//!
//! Split and merge only move nodes among the *presented* roots. Merges are
//! validated against the original tree's ancestry so the UI can never
//! fabricate a parent-child edge that the program never executed.

use crate::reorder::TreeItem;
use crate::utils::error::TreeError;
use std::collections::HashMap;

use super::abstract_tree::{AbstractCallTree, AbstractNodeKind};
use super::concrete::NodeId;

/// Result of `merge_by_keys`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The descendant's subtree was folded back under the ancestor; `root`
    /// is the ancestor's key
    Merged { root: String },

    /// Neither key is an ancestor of the other; both presented roots were
    /// left untouched
    Unrelated,
}

/// A node of the presented tree; a mutable clone of its abstract original
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedNode {
    key: String,
    filename: String,
    function_name: String,
    name: String,
    kind: AbstractNodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl PresentedNode {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AbstractNodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Payload attached to `TreeItem`s handed to reorder UIs
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedNodeData {
    pub key: String,
    pub filename: String,
    pub function_name: String,
    pub name: String,
    pub kind: AbstractNodeKind,
}

/// The UI-facing working copy of the abstract tree.
#[derive(Debug, Default)]
pub struct PresentedTree {
    nodes: Vec<PresentedNode>,
    index: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
}

impl PresentedTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole presented state with a fresh deep clone of the
    /// original. Discards any prior split/merge mutations.
    pub fn rebuild_from_original(&mut self, original: &AbstractCallTree) {
        self.nodes.clear();
        self.index.clear();
        self.roots.clear();

        // Pre-order clone with an explicit stack; parents are cloned before
        // their children, so the new parent id is known at visit time.
        let mut stack: Vec<(NodeId, Option<NodeId>)> = original
            .root_ids()
            .iter()
            .rev()
            .map(|&id| (id, None))
            .collect();

        while let Some((original_id, new_parent)) = stack.pop() {
            let Some(node) = original.get(original_id) else {
                continue;
            };

            let new_id = self.nodes.len();
            self.nodes.push(PresentedNode {
                key: node.key().to_string(),
                filename: node.filename().to_string(),
                function_name: node.function_name().to_string(),
                name: node.name().to_string(),
                kind: node.kind().clone(),
                parent: new_parent,
                children: Vec::new(),
            });
            self.index.insert(node.key().to_string(), new_id);

            match new_parent {
                Some(pid) => self.nodes[pid].children.push(new_id),
                None => self.roots.push(new_id),
            }

            for &child in node.children().iter().rev() {
                stack.push((child, Some(new_id)));
            }
        }
    }

    /// Detach the node for `key` from its parent and append it as a new
    /// presented root ("pull this subtree out into its own column").
    ///
    /// Splitting a node that is already a root is a no-op success.
    ///
    /// # Errors
    /// * `TreeError::UnknownKey` - the key is not in the presented tree;
    ///   split keys always come from a prior query, so this is a caller bug
    pub fn split_by_key(&mut self, key: &str) -> Result<(), TreeError> {
        let id = self.lookup(key)?;

        let Some(parent) = self.nodes[id].parent else {
            return Ok(());
        };

        self.nodes[parent].children.retain(|&c| c != id);
        self.nodes[id].parent = None;
        self.roots.push(id);
        Ok(())
    }

    /// Merge two presented subtrees, honoring the original topology.
    ///
    /// If one key is a true ancestor of the other (per `original`), the
    /// descendant is detached from wherever it currently sits and re-attached
    /// at its immediate original parent inside the ancestor's presented
    /// subtree; intermediate nodes on the original path are materialized if
    /// the presented tree no longer holds them. Otherwise nothing moves.
    ///
    /// # Errors
    /// * `TreeError::UnknownKey` - either key is not in the presented tree
    pub fn merge_by_keys(
        &mut self,
        key_a: &str,
        key_b: &str,
        original: &AbstractCallTree,
    ) -> Result<MergeOutcome, TreeError> {
        self.lookup(key_a)?;
        self.lookup(key_b)?;

        if original.is_ancestor(key_a, key_b) {
            self.fold_under(key_a, key_b, original);
            Ok(MergeOutcome::Merged {
                root: key_a.to_string(),
            })
        } else if original.is_ancestor(key_b, key_a) {
            self.fold_under(key_b, key_a, original);
            Ok(MergeOutcome::Merged {
                root: key_b.to_string(),
            })
        } else {
            Ok(MergeOutcome::Unrelated)
        }
    }

    fn fold_under(&mut self, ancestor_key: &str, descendant_key: &str, original: &AbstractCallTree) {
        let descendant_id = self.index[descendant_key];

        // Detach the descendant from wherever it currently sits
        match self.nodes[descendant_id].parent {
            Some(parent) => self.nodes[parent].children.retain(|&c| c != descendant_id),
            None => self.roots.retain(|&r| r != descendant_id),
        }
        self.nodes[descendant_id].parent = None;

        // Walk the original path from the ancestor down to the descendant's
        // immediate original parent, materializing missing links.
        let path = original.path_from_ancestor(ancestor_key, descendant_key);
        let mut attach = self.index[ancestor_key];
        for key in path.iter().take(path.len().saturating_sub(1)) {
            attach = match self.index.get(key) {
                Some(&id) => id,
                None => self.clone_single_node(key, attach, original),
            };
        }

        self.nodes[descendant_id].parent = Some(attach);
        self.nodes[attach].children.push(descendant_id);
    }

    /// Clone one node (no subtree) from the original as a child of `parent`.
    fn clone_single_node(
        &mut self,
        key: &str,
        parent: NodeId,
        original: &AbstractCallTree,
    ) -> NodeId {
        let node = original
            .node_by_key(key)
            .expect("merge paths are computed from the original tree");

        let id = self.nodes.len();
        self.nodes.push(PresentedNode {
            key: node.key().to_string(),
            filename: node.filename().to_string(),
            function_name: node.function_name().to_string(),
            name: node.name().to_string(),
            kind: node.kind().clone(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.index.insert(key.to_string(), id);
        self.nodes[parent].children.push(id);
        id
    }

    /// Presented roots in order (original order plus split-off roots at the
    /// end)
    pub fn roots(&self) -> impl Iterator<Item = &PresentedNode> {
        self.roots.iter().map(|&id| &self.nodes[id])
    }

    pub fn node_by_key(&self, key: &str) -> Option<&PresentedNode> {
        self.index.get(key).map(|&id| &self.nodes[id])
    }

    /// Node by arena id (for walking `children()` lists)
    pub fn get(&self, id: NodeId) -> Option<&PresentedNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Key of a node's parent in the *presented* (possibly rearranged) tree
    pub fn presented_parent_key(&self, key: &str) -> Option<&str> {
        let node = self.node_by_key(key)?;
        node.parent.map(|pid| self.nodes[pid].key())
    }

    /// Convert the presented roots into `TreeItem`s for a sortable tree view.
    ///
    /// Items start collapsed, matching the terminal view's default.
    pub fn to_tree_items(&self) -> Vec<TreeItem<PresentedNodeData>> {
        // Reverse pre-order assembly: children are built before parents.
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().copied());
        }

        let mut built: HashMap<NodeId, TreeItem<PresentedNodeData>> = HashMap::new();
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
                TreeItem {
                    id: node.key.clone(),
                    collapsed: true,
                    data: PresentedNodeData {
                        key: node.key.clone(),
                        filename: node.filename.clone(),
                        function_name: node.function_name.clone(),
                        name: node.name.clone(),
                        kind: node.kind.clone(),
                    },
                    children,
                },
            );
        }

        self.roots
            .iter()
            .map(|id| {
                built
                    .remove(id)
                    .expect("every presented root is assembled exactly once")
            })
            .collect()
    }

    fn lookup(&self, key: &str) -> Result<NodeId, TreeError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| TreeError::UnknownKey(key.to_string()))
    }
}
