//! Drop-target projection for indentation-aware drag and drop.
//!
//! While an item is dragged over a flattened tree view, the horizontal
//! pointer offset expresses intended nesting: dragging right indents the
//! item under the row above, dragging left outdents it. The projection
//! computes the depth the drop would land at, clamped to what the
//! neighbouring rows allow, and resolves the parent that depth implies.

use super::flatten::FlattenedItem;

/// Where a drop would land
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Clamped depth the dragged item would take
    pub depth: usize,

    /// Deepest placement the row above allows
    pub max_depth: usize,

    /// Shallowest placement the row below allows
    pub min_depth: usize,

    /// Parent implied by `depth`, `None` for a root placement
    pub parent_id: Option<String>,
}

/// Project a drag gesture onto the flattened list.
///
/// `drag_offset` is the horizontal pointer travel in the same unit as
/// `indentation_width` (pixels in practice). Returns `None` when either id
/// is not in the list.
pub fn get_projection<T>(
    items: &[FlattenedItem<T>],
    dragged_id: &str,
    over_id: &str,
    drag_offset: f64,
    indentation_width: f64,
) -> Option<Projection> {
    let over_index = items.iter().position(|item| item.id == over_id)?;
    let active_index = items.iter().position(|item| item.id == dragged_id)?;
    let active_depth = items[active_index].depth;

    // Simulate the reorder the drop would perform, then look at the rows
    // that would surround the dragged item.
    let mut reordered: Vec<&FlattenedItem<T>> = items.iter().collect();
    let moved = reordered.remove(active_index);
    reordered.insert(over_index, moved);

    let previous = if over_index == 0 {
        None
    } else {
        reordered.get(over_index - 1).copied()
    };
    let next = reordered.get(over_index + 1).copied();

    let drag_depth = (drag_offset / indentation_width).round() as i64;
    let projected_depth = active_depth as i64 + drag_depth;

    let max_depth = previous.map_or(0, |item| item.depth + 1);
    let min_depth = next.map_or(0, |item| item.depth);

    // min/max chained by hand: a malformed list could invert the bounds and
    // i64::clamp would panic on that
    let depth = projected_depth.min(max_depth as i64).max(min_depth as i64) as usize;

    let parent_id = resolve_parent_id(&reordered, over_index, depth, previous);

    Some(Projection {
        depth,
        max_depth,
        min_depth,
        parent_id,
    })
}

fn resolve_parent_id<T>(
    reordered: &[&FlattenedItem<T>],
    over_index: usize,
    depth: usize,
    previous: Option<&FlattenedItem<T>>,
) -> Option<String> {
    let previous = previous?;
    if depth == 0 {
        return None;
    }

    if depth == previous.depth {
        return previous.parent_id.clone();
    }
    if depth > previous.depth {
        return Some(previous.id.clone());
    }

    // Outdented below the row above: parent is whatever the nearest
    // preceding row at the target depth hangs from
    reordered[..over_index]
        .iter()
        .rev()
        .find(|item| item.depth == depth)
        .and_then(|item| item.parent_id.clone())
}
