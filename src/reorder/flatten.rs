//! Generic tree flattening and rebuilding for reorderable tree views.
//!
//! A sortable tree UI renders a flat, depth-annotated list; these helpers
//! convert between that list and the nested representation, and carve items
//! in and out of it. All functions are pure and type-parametric over the
//! node payload.

use std::collections::{HashMap, HashSet};

/// One item in a nested tree; topology is implicit in `children`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeItem<T> {
    /// Unique identifier of the item
    pub id: String,

    /// Expanded/collapsed state of this item in the view
    pub collapsed: bool,

    pub data: T,

    pub children: Vec<TreeItem<T>>,
}

/// A tree item with its topological position made explicit.
///
/// Produced by [`flatten_tree`]; `depth` is 0 for roots and `index` is the
/// 0-based position among siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedItem<T> {
    pub id: String,

    /// Id of the immediate parent, `None` for roots
    pub parent_id: Option<String>,

    pub depth: usize,

    pub index: usize,

    pub collapsed: bool,

    pub data: T,
}

/// Flatten a forest into a depth-first, pre-order list.
pub fn flatten_tree<T: Clone>(items: &[TreeItem<T>]) -> Vec<FlattenedItem<T>> {
    let mut out = Vec::new();

    // Explicit stack, children pushed in reverse so they pop in order
    let mut stack: Vec<(&TreeItem<T>, Option<String>, usize, usize)> = items
        .iter()
        .enumerate()
        .rev()
        .map(|(index, item)| (item, None, 0, index))
        .collect();

    while let Some((item, parent_id, depth, index)) = stack.pop() {
        out.push(FlattenedItem {
            id: item.id.clone(),
            parent_id,
            depth,
            index,
            collapsed: item.collapsed,
            data: item.data.clone(),
        });
        for (child_index, child) in item.children.iter().enumerate().rev() {
            stack.push((child, Some(item.id.clone()), depth + 1, child_index));
        }
    }

    out
}

/// Rebuild a forest from a flattened list; the inverse of [`flatten_tree`].
///
/// Items are grouped under their `parent_id` in list order. An item whose
/// parent does not appear in the list becomes a root, which is what lets a
/// drag handler concatenate two flattened lists and rebuild.
pub fn build_tree<T: Clone>(items: &[FlattenedItem<T>]) -> Vec<TreeItem<T>> {
    let mut index_by_id: HashMap<&str, usize> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        index_by_id.entry(item.id.as_str()).or_insert(i);
    }

    let mut root_indices: Vec<usize> = Vec::new();
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    for (i, item) in items.iter().enumerate() {
        match item
            .parent_id
            .as_deref()
            .and_then(|p| index_by_id.get(p).copied())
            .filter(|&p| p != i)
        {
            Some(parent) => children_of[parent].push(i),
            None => root_indices.push(i),
        }
    }

    // Reverse pre-order assembly: children are built before parents
    let mut order = Vec::new();
    let mut stack: Vec<usize> = root_indices.clone();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children_of[i].iter().copied());
    }

    let mut built: HashMap<usize, TreeItem<T>> = HashMap::new();
    for &i in order.iter().rev() {
        let item = &items[i];
        let children = children_of[i]
            .iter()
            .map(|c| {
                built
                    .remove(c)
                    .expect("reverse pre-order builds children before parents")
            })
            .collect();
        built.insert(
            i,
            TreeItem {
                id: item.id.clone(),
                collapsed: item.collapsed,
                data: item.data.clone(),
                children,
            },
        );
    }

    root_indices
        .iter()
        .filter_map(|i| built.remove(i))
        .collect()
}

/// Remove a node and its entire subtree from a forest.
pub fn remove_item<T: Clone>(items: &[TreeItem<T>], id: &str) -> Vec<TreeItem<T>> {
    let flattened = flatten_tree(items);

    let mut kept = Vec::new();
    let mut removing_below: Option<usize> = None;
    for item in flattened {
        if let Some(depth) = removing_below {
            if item.depth > depth {
                continue;
            }
            removing_below = None;
        }
        if item.id == id {
            removing_below = Some(item.depth);
            continue;
        }
        kept.push(item);
    }

    build_tree(&kept)
}

/// Drop the descendants of every id in `ids` from a flattened list.
///
/// Used to hide the children of collapsed items without losing them from
/// the underlying model; exclusion cascades so grandchildren vanish too.
pub fn remove_children_of<T: Clone>(
    items: &[FlattenedItem<T>],
    ids: &[&str],
) -> Vec<FlattenedItem<T>> {
    let mut excluded: HashSet<String> = ids.iter().map(|id| id.to_string()).collect();

    let mut kept = Vec::new();
    for item in items {
        let parent_excluded = item
            .parent_id
            .as_deref()
            .is_some_and(|p| excluded.contains(p));
        if parent_excluded {
            excluded.insert(item.id.clone());
            continue;
        }
        kept.push(item.clone());
    }
    kept
}

/// Total number of descendants of a node ("N items" drag badge).
///
/// Returns 0 when the id is absent.
pub fn get_child_count<T: Clone>(items: &[TreeItem<T>], id: &str) -> usize {
    let flattened = flatten_tree(items);

    let mut count = 0;
    let mut counting_below: Option<usize> = None;
    for item in &flattened {
        if let Some(depth) = counting_below {
            if item.depth > depth {
                count += 1;
                continue;
            }
            break;
        }
        if item.id == id {
            counting_below = Some(item.depth);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(id: &str) -> TreeItem<u32> {
        TreeItem {
            id: id.to_string(),
            collapsed: false,
            data: 0,
            children: Vec::new(),
        }
    }

    fn node(id: &str, children: Vec<TreeItem<u32>>) -> TreeItem<u32> {
        TreeItem {
            id: id.to_string(),
            collapsed: false,
            data: 0,
            children,
        }
    }

    /// a(b(c, d), e), f
    fn sample_forest() -> Vec<TreeItem<u32>> {
        vec![
            node("a", vec![node("b", vec![leaf("c"), leaf("d")]), leaf("e")]),
            leaf("f"),
        ]
    }

    #[test]
    fn test_flatten_assigns_depth_and_index() {
        let flattened = flatten_tree(&sample_forest());

        let ids: Vec<_> = flattened.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e", "f"]);

        let depths: Vec<_> = flattened.iter().map(|i| i.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 1, 0]);

        let indices: Vec<_> = flattened.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 0, 0, 1, 1, 1]);

        assert_eq!(flattened[2].parent_id.as_deref(), Some("b"));
        assert_eq!(flattened[5].parent_id, None);
    }

    #[test]
    fn test_round_trip_law() {
        let forest = sample_forest();
        assert_eq!(build_tree(&flatten_tree(&forest)), forest);
    }

    #[test]
    fn test_round_trip_preserves_collapsed_and_data() {
        let mut forest = sample_forest();
        forest[0].collapsed = true;
        forest[0].children[0].data = 42;

        assert_eq!(build_tree(&flatten_tree(&forest)), forest);
    }

    #[test]
    fn test_build_tree_promotes_unknown_parent_to_root() {
        let flattened = vec![FlattenedItem {
            id: "stray".to_string(),
            parent_id: Some("missing".to_string()),
            depth: 1,
            index: 0,
            collapsed: false,
            data: 0u32,
        }];

        let forest = build_tree(&flattened);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, "stray");
    }

    #[test]
    fn test_remove_item_takes_subtree_along() {
        let forest = sample_forest();
        let pruned = remove_item(&forest, "b");

        let flattened = flatten_tree(&pruned);
        let ids: Vec<_> = flattened.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "e", "f"]);
    }

    #[test]
    fn test_remove_item_unknown_id_is_noop() {
        let forest = sample_forest();
        assert_eq!(remove_item(&forest, "zzz"), forest);
    }

    #[test]
    fn test_remove_children_of_cascades() {
        let flattened = flatten_tree(&sample_forest());
        let visible = remove_children_of(&flattened, &["a"]);

        let ids: Vec<_> = visible.iter().map(|i| i.id.as_str()).collect();
        // b is hidden, so its children are hidden too
        assert_eq!(ids, vec!["a", "f"]);
    }

    #[test]
    fn test_get_child_count() {
        let forest = sample_forest();
        assert_eq!(get_child_count(&forest, "a"), 4);
        assert_eq!(get_child_count(&forest, "b"), 2);
        assert_eq!(get_child_count(&forest, "c"), 0);
        assert_eq!(get_child_count(&forest, "zzz"), 0);
    }
}
