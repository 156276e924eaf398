//! The locally owned, mutable view of the rendered graph.
//!
//! The model is the single authority the canvas draws from. It carries the
//! node and edge lists, the prune order with its progress index, and the
//! transient visual flags (fading edges, flashing nodes) the animation gate
//! raises before a removal commits.

use super::flatten::{FlatGraph, edge_id, flipped_id};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
	pub id: String,
	pub level: u32,
	/// Raised while the orphan-removal flash is playing.
	pub flashing: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	pub level: u32,
	/// Raised while the highlight-then-fade of a pending deletion plays.
	pub fading: bool,
}

/// Owned graph state for one session.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
	pub prune_order: Vec<String>,
	/// Index of the next prune-order entry to play.
	pub progress: usize,
	reheat: std::cell::Cell<bool>,
	revision: u64,
}

impl GraphModel {
	/// Replaces the whole model from a freshly flattened dataset. Used on
	/// sample change, upload and node removal; single-edge mutations go
	/// through the reconciler instead.
	pub fn reset_from(&mut self, flat: FlatGraph) {
		self.nodes = flat
			.nodes
			.into_iter()
			.map(|n| GraphNode { id: n.id, level: n.level, flashing: false })
			.collect();
		self.edges = flat
			.edges
			.into_iter()
			.map(|e| GraphEdge {
				id: e.id,
				source: e.source,
				target: e.target,
				level: e.level,
				fading: false,
			})
			.collect();
		self.prune_order = flat.prune_order;
		self.progress = 0;
		self.reheat.set(true);
		self.touch();
	}

	/// Finds an edge by id, trying both orientations.
	pub fn resolve_edge(&self, id: &str) -> Option<&GraphEdge> {
		let flipped = flipped_id(id);
		self.edges
			.iter()
			.find(|e| e.id == id || Some(e.id.as_str()) == flipped.as_deref())
	}

	/// Finds an edge by endpoint pair, either orientation.
	pub fn find_edge(&self, source: &str, target: &str) -> Option<&GraphEdge> {
		self.resolve_edge(&edge_id(source, target))
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Endpoints of `id` that would be left with zero incident edges once
	/// every copy of that edge (either orientation) is gone.
	pub fn orphans_after_removal(&self, id: &str) -> Vec<String> {
		let Some(edge) = self.resolve_edge(id) else {
			return Vec::new();
		};
		let (source, target) = (edge.source.clone(), edge.target.clone());
		let doomed = edge.id.clone();
		let flipped = flipped_id(&doomed);
		let survives = |e: &&GraphEdge| e.id != doomed && Some(e.id.as_str()) != flipped.as_deref();

		let mut orphans = Vec::new();
		for endpoint in [source, target] {
			let still_referenced = self
				.edges
				.iter()
				.filter(survives)
				.any(|e| e.source == endpoint || e.target == endpoint);
			if !still_referenced {
				orphans.push(endpoint);
			}
		}
		orphans
	}

	/// Removes every copy of the edge, both orientations.
	pub fn remove_edge(&mut self, id: &str) {
		let flipped = flipped_id(id);
		self.edges
			.retain(|e| e.id != id && Some(e.id.as_str()) != flipped.as_deref());
		self.touch();
	}

	pub fn remove_node(&mut self, id: &str) {
		self.nodes.retain(|n| n.id != id);
		self.touch();
	}

	pub fn set_edge_fading(&mut self, id: &str, fading: bool) {
		let flipped = flipped_id(id);
		for edge in &mut self.edges {
			if edge.id == id || Some(edge.id.as_str()) == flipped.as_deref() {
				edge.fading = fading;
			}
		}
		self.touch();
	}

	pub fn set_node_flashing(&mut self, id: &str, flashing: bool) {
		if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
			node.flashing = flashing;
			self.touch();
		}
	}

	/// Asks the canvas to restart its force layout with low energy.
	pub fn request_reheat(&mut self) {
		self.reheat.set(true);
		self.touch();
	}

	/// Consumed by the canvas once per sync; takes `&self` because the
	/// canvas only ever holds a shared borrow of the model.
	pub fn take_reheat(&self) -> bool {
		self.reheat.replace(false)
	}

	/// Monotonic change counter; the canvas skips syncing when unchanged.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub(crate) fn touch(&mut self) {
		self.revision += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn model(edges: &[(&str, &str)]) -> GraphModel {
		let mut m = GraphModel::default();
		for &(s, t) in edges {
			for id in [s, t] {
				if m.node(id).is_none() {
					m.nodes.push(GraphNode { id: id.into(), level: 1, flashing: false });
				}
			}
			m.edges.push(GraphEdge {
				id: edge_id(s, t),
				source: s.into(),
				target: t.into(),
				level: 1,
				fading: false,
			});
		}
		m
	}

	#[test]
	fn resolve_edge_tries_both_orientations() {
		let m = model(&[("1", "2")]);
		assert!(m.resolve_edge("1-2").is_some());
		assert!(m.resolve_edge("2-1").is_some());
		assert!(m.resolve_edge("1-3").is_none());
	}

	#[test]
	fn orphan_detection_checks_remaining_incidence() {
		let m = model(&[("1", "2"), ("2", "3")]);
		// Node 1 loses its only edge; node 2 keeps 2-3.
		assert_eq!(m.orphans_after_removal("1-2"), vec!["1".to_string()]);
		// Removing 2-3 orphans 3 only.
		assert_eq!(m.orphans_after_removal("2-3"), vec!["3".to_string()]);
	}

	#[test]
	fn orphan_detection_counts_duplicate_edges_as_one() {
		let mut m = model(&[("1", "2")]);
		m.edges.push(GraphEdge {
			id: "2-1".into(),
			source: "2".into(),
			target: "1".into(),
			level: 2,
			fading: false,
		});
		// Both copies disappear with the removal, so both endpoints orphan.
		assert_eq!(m.orphans_after_removal("1-2"), vec!["1".to_string(), "2".to_string()]);
	}

	#[test]
	fn remove_edge_drops_both_orientations() {
		let mut m = model(&[("1", "2")]);
		m.edges.push(GraphEdge {
			id: "2-1".into(),
			source: "2".into(),
			target: "1".into(),
			level: 2,
			fading: false,
		});
		m.remove_edge("1-2");
		assert!(m.edges.is_empty());
	}

	#[test]
	fn reset_clears_progress_and_requests_reheat() {
		let mut m = model(&[("1", "2")]);
		m.progress = 3;
		m.reset_from(FlatGraph::default());
		assert_eq!(m.progress, 0);
		assert!(m.nodes.is_empty());
		assert!(m.take_reheat());
		assert!(!m.take_reheat());
	}
}
