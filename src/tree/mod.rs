//! Incremental dynamic call-tree construction.
//!
//! This module maintains three views over one run of an instrumented
//! program:
//! - The concrete tree: one node per invocation, with its associated events
//! - The abstract tree (original): one node per call site, with aggregates
//! - The presented tree: a rearrangeable working copy of the abstract tree

pub mod abstract_tree;
pub mod builder;
pub mod concrete;
pub mod presented;

// Re-export main types
pub use abstract_tree::{AbstractCallTree, AbstractNode, AbstractNodeKind};
pub use builder::{CallTreeBuilder, IngestSession};
pub use concrete::{AppendOutcome, ConcreteCallTree, InvocationNode, InvocationSubtree, NodeId};
pub use presented::{MergeOutcome, PresentedNode, PresentedNodeData, PresentedTree};
