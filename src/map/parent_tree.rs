//! Parent pointer assignment. Road extraction consumes these pointers; this
//! module is the upstream step that produces them for generated worlds.

use super::Map;
use crate::grid::GridCoord;
use bevy::prelude::*;
use pathfinding::prelude::dijkstra_all;

/// Fill every reachable cell's `parent` with the next hop of a shortest-path
/// tree grown from `roots`.
///
/// `step_cost(map, from, to)` prices a move between neighbors, `None` meaning
/// impassable. Roots and unreachable cells get the zero sentinel. Returns the
/// number of cells that received a parent.
pub fn assign_parents<F>(map: &mut Map, roots: &[GridCoord], mut step_cost: F) -> usize
where
    F: FnMut(&Map, GridCoord, GridCoord) -> Option<u32>,
{
    // a virtual source (None) links to every root, so the result is a forest
    let tree = {
        let map_ref: &Map = map;
        dijkstra_all(&None, |node: &Option<GridCoord>| -> Vec<(Option<GridCoord>, u32)> {
            match node {
                None => roots
                    .iter()
                    .filter(|root| map_ref.contains(**root) && !root.is_zero())
                    .map(|root| (Some(*root), 0))
                    .collect(),
                Some(hex) => map_ref
                    .geometry()
                    .neighbors(*hex)
                    .into_iter()
                    .filter(|n| map_ref.contains(*n) && !n.is_zero())
                    .filter_map(|n| step_cost(map_ref, *hex, n).map(|cost| (Some(n), cost.max(1))))
                    .collect(),
            }
        })
    };

    for hex in map.all_hex().collect::<Vec<_>>() {
        if let Some(cell) = map.get_mut(hex) {
            cell.parent = GridCoord::ZERO;
        }
    }

    let mut assigned = 0;
    for (node, (parent, _cost)) in tree {
        if let (Some(hex), Some(parent)) = (node, parent) {
            if let Some(cell) = map.get_mut(hex) {
                cell.parent = parent;
                assigned += 1;
            }
        }
    }

    debug!(
        "Assigned parents to {assigned} cells from {} roots",
        roots.len()
    );
    assigned
}
