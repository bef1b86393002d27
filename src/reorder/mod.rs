//! Reconciliation utilities for drag-reorderable tree views.
//!
//! Pure, payload-generic helpers that translate between nested trees and the
//! flat lists a sortable view renders, plus the projection math that decides
//! where a drop lands.

pub mod flatten;
pub mod projection;

// Re-export main types and functions
pub use flatten::{
    build_tree, flatten_tree, get_child_count, remove_children_of, remove_item, FlattenedItem,
    TreeItem,
};
pub use projection::{get_projection, Projection};
