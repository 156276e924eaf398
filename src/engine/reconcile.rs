//! Merges a freshly flattened dataset into the live model with minimal
//! churn, so node identity (and with it any layout position the canvas
//! carries per id) survives a mutation response.

use std::collections::HashSet;

use super::flatten::FlatGraph;
use super::model::{GraphEdge, GraphModel, GraphNode};

fn unordered_key(source: &str, target: &str) -> (String, String) {
	if source <= target {
		(source.to_string(), target.to_string())
	} else {
		(target.to_string(), source.to_string())
	}
}

/// Applies a flattened mutation response to the model.
///
/// Nodes present in both sets keep their entry, with the level updated in
/// place when the decomposition reassigned it; new nodes are appended.
/// Nothing is removed here: node removal is the orphan detector's job (a
/// level change alone must never delete a node), and edge removal is
/// handled by the deletion flow, keeping this merge idempotent against
/// replayed adds. Edges are keyed as unordered pairs, which also collapses
/// the flattener's duplicate-edge quirk.
pub fn reconcile(model: &mut GraphModel, flat: &FlatGraph) {
	for incoming in &flat.nodes {
		match model.nodes.iter_mut().find(|n| n.id == incoming.id) {
			Some(existing) => {
				if existing.level != incoming.level {
					existing.level = incoming.level;
				}
			}
			None => model.nodes.push(GraphNode {
				id: incoming.id.clone(),
				level: incoming.level,
				flashing: false,
			}),
		}
	}

	let mut present: HashSet<(String, String)> = model
		.edges
		.iter()
		.map(|e| unordered_key(&e.source, &e.target))
		.collect();
	for incoming in &flat.edges {
		let key = unordered_key(&incoming.source, &incoming.target);
		if present.insert(key) {
			model.edges.push(GraphEdge {
				id: incoming.id.clone(),
				source: incoming.source.clone(),
				target: incoming.target.clone(),
				level: incoming.level,
				fading: false,
			});
		}
	}

	model.touch();
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::flatten::{FlatEdge, FlatNode};

	fn flat(nodes: &[(&str, u32)], edges: &[(&str, &str, u32)]) -> FlatGraph {
		FlatGraph {
			nodes: nodes
				.iter()
				.map(|&(id, level)| FlatNode { id: id.into(), level })
				.collect(),
			edges: edges
				.iter()
				.map(|&(s, t, level)| FlatEdge {
					id: format!("{s}-{t}"),
					source: s.into(),
					target: t.into(),
					level,
				})
				.collect(),
			prune_order: Vec::new(),
		}
	}

	#[test]
	fn reconcile_is_idempotent() {
		let mut model = GraphModel::default();
		let incoming = flat(&[("1", 2), ("2", 2)], &[("1", "2", 2)]);
		reconcile(&mut model, &incoming);
		let (nodes, edges) = (model.nodes.len(), model.edges.len());
		reconcile(&mut model, &incoming);
		assert_eq!(model.nodes.len(), nodes);
		assert_eq!(model.edges.len(), edges);
	}

	#[test]
	fn level_changes_update_in_place() {
		let mut model = GraphModel::default();
		reconcile(&mut model, &flat(&[("1", 3)], &[]));
		reconcile(&mut model, &flat(&[("1", 1)], &[]));
		assert_eq!(model.nodes.len(), 1);
		assert_eq!(model.nodes[0].level, 1);
	}

	#[test]
	fn nodes_are_never_removed_here() {
		let mut model = GraphModel::default();
		reconcile(&mut model, &flat(&[("1", 1), ("2", 1)], &[]));
		reconcile(&mut model, &flat(&[("2", 1)], &[]));
		assert!(model.node("1").is_some());
	}

	#[test]
	fn reversed_orientation_is_not_a_new_edge() {
		let mut model = GraphModel::default();
		reconcile(&mut model, &flat(&[], &[("1", "2", 1)]));
		reconcile(&mut model, &flat(&[], &[("2", "1", 1)]));
		assert_eq!(model.edges.len(), 1);
	}

	#[test]
	fn duplicate_flattened_edges_collapse() {
		let mut model = GraphModel::default();
		reconcile(&mut model, &flat(&[], &[("1", "2", 2), ("1", "2", 1)]));
		assert_eq!(model.edges.len(), 1);
		assert_eq!(model.edges[0].level, 2);
	}
}
