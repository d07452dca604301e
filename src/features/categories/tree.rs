//! Category hierarchy: building the forest from the flat list and walking it.
//!
//! Everything here is pure. The forest is rebuilt from the flat list on every
//! load and each node owns its children, so nothing is ever shared or mutated
//! in place. Traversals use an explicit stack instead of recursion.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::features::categories::dtos::CategoryTreeDto;
use crate::features::categories::models::Category;

/// Result of building the hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryForest {
    /// Root categories in input order, children fully populated
    pub roots: Vec<CategoryTreeDto>,
    /// Ids of records that are not reachable from any root: a parent that
    /// does not exist, a category listed as its own parent, or a parent cycle
    pub detached: Vec<Uuid>,
}

/// A node visited during a pre-order walk
#[derive(Debug, Clone, Copy)]
pub struct TreeEntry<'a> {
    pub node: &'a CategoryTreeDto,
    pub depth: usize,
}

/// A picker entry
#[derive(Debug, Clone, Copy)]
pub struct TreeOption<'a> {
    pub node: &'a CategoryTreeDto,
    pub depth: usize,
    pub selectable: bool,
    pub selected: bool,
}

/// Build the category forest from the flat list.
///
/// Roots keep their input order and so do siblings under each parent. Records
/// whose parent is missing are dropped rather than promoted to roots. A record
/// pointing at itself, or a group of records pointing at each other, never
/// hangs off a root and is dropped the same way, so the result is always a
/// finite forest. Duplicate ids resolve to the last record with that id when
/// used as a parent.
pub fn build_forest(categories: &[Category]) -> CategoryForest {
    let index: HashMap<Uuid, usize> = categories
        .iter()
        .enumerate()
        .map(|(pos, c)| (c.id, pos))
        .collect();

    let mut root_positions = Vec::new();
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); categories.len()];

    for (pos, category) in categories.iter().enumerate() {
        match category.parent_id {
            None => root_positions.push(pos),
            Some(parent_id) if parent_id == category.id => {}
            Some(parent_id) => {
                if let Some(&parent_pos) = index.get(&parent_id) {
                    children_of[parent_pos].push(pos);
                }
            }
        }
    }

    // Pre-order positions of everything reachable from a root. Each position
    // sits in exactly one child list (or the root list), so this visits every
    // reachable record once.
    let mut order = Vec::with_capacity(categories.len());
    let mut stack: Vec<usize> = root_positions.iter().rev().copied().collect();
    while let Some(pos) = stack.pop() {
        order.push(pos);
        stack.extend(children_of[pos].iter().rev().copied());
    }

    // Reverse pre-order finishes every child before its parent
    let mut built: Vec<Option<CategoryTreeDto>> = vec![None; categories.len()];
    for &pos in order.iter().rev() {
        let mut node = CategoryTreeDto::leaf(&categories[pos]);
        node.children = children_of[pos]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[pos] = Some(node);
    }

    let roots = root_positions
        .iter()
        .filter_map(|&pos| built[pos].take())
        .collect();

    let mut reachable = vec![false; categories.len()];
    for &pos in &order {
        reachable[pos] = true;
    }
    let detached = categories
        .iter()
        .zip(reachable.iter())
        .filter_map(|(c, &is_reachable)| (!is_reachable).then_some(c.id))
        .collect();

    CategoryForest { roots, detached }
}

/// Root nodes of the forest built from `categories`
pub fn build_tree(categories: &[Category]) -> Vec<CategoryTreeDto> {
    build_forest(categories).roots
}

fn walk_pre_order<'a, F>(roots: &'a [CategoryTreeDto], descend: F) -> Vec<TreeEntry<'a>>
where
    F: Fn(&CategoryTreeDto) -> bool,
{
    let mut entries = Vec::new();
    let mut stack: Vec<TreeEntry<'a>> = roots
        .iter()
        .rev()
        .map(|node| TreeEntry { node, depth: 0 })
        .collect();

    while let Some(entry) = stack.pop() {
        if descend(entry.node) {
            stack.extend(entry.node.children.iter().rev().map(|child| TreeEntry {
                node: child,
                depth: entry.depth + 1,
            }));
        }
        entries.push(entry);
    }

    entries
}

/// Rows for the admin table. Children of a node are listed only when the
/// node's id is in `expanded`; collapsed subtrees are left out entirely.
pub fn flatten_for_listing<'a>(
    roots: &'a [CategoryTreeDto],
    expanded: &HashSet<Uuid>,
) -> Vec<TreeEntry<'a>> {
    walk_pre_order(roots, |node| expanded.contains(&node.id))
}

/// Entries for the category picker, always covering the whole forest.
///
/// `editing` and every id in `disabled` stay in the list for context but are
/// not selectable.
pub fn option_list<'a>(
    roots: &'a [CategoryTreeDto],
    selected: &HashSet<Uuid>,
    disabled: &HashSet<Uuid>,
    editing: Option<Uuid>,
) -> Vec<TreeOption<'a>> {
    walk_pre_order(roots, |_| true)
        .into_iter()
        .map(|TreeEntry { node, depth }| TreeOption {
            node,
            depth,
            selectable: !disabled.contains(&node.id) && editing != Some(node.id),
            selected: selected.contains(&node.id),
        })
        .collect()
}

/// Ids of every category below `node`, excluding `node` itself
pub fn descendant_ids(node: &CategoryTreeDto) -> HashSet<Uuid> {
    walk_pre_order(&node.children, |_| true)
        .into_iter()
        .map(|entry| entry.node.id)
        .collect()
}

pub fn find_node(roots: &[CategoryTreeDto], id: Uuid) -> Option<&CategoryTreeDto> {
    let mut stack: Vec<&CategoryTreeDto> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        if node.id == id {
            return Some(node);
        }
        stack.extend(node.children.iter());
    }
    None
}

pub fn count_nodes(roots: &[CategoryTreeDto]) -> usize {
    walk_pre_order(roots, |_| true).len()
}
