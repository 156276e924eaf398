//! Wire types for the decomposition service.
//!
//! The service reports a graph decomposition as a map from level (core,
//! clique or truss number) to the nodes and edges still present at that
//! level, plus the edges its peeling pass removed to get there. Level keys
//! arrive as JSON object keys, i.e. strings of integers; serde maps them
//! into a numerically ordered [`BTreeMap`] so flattening can scan levels
//! high-to-low.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One level of a decomposition: the subgraph still alive at this level and
/// the edges peeled off while reducing the previous level to this one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LevelSlice {
	#[serde(default)]
	pub nodes: Vec<u64>,
	#[serde(default)]
	pub edges: Vec<(u64, u64)>,
	#[serde(default)]
	pub pruned_edges: Vec<(u64, u64)>,
}

/// Full leveled decomposition, keyed by level.
pub type DecompositionData = BTreeMap<u32, LevelSlice>;

/// One node of the server-side history tree. The root carries no edge
/// annotation (`action` is `None`); every other node records the add/remove
/// that created it. The tree is replaced wholesale on each mutation
/// response and never edited client-side.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TimelineNode {
	pub id: u64,
	#[serde(default)]
	pub action: Option<u8>,
	#[serde(default)]
	pub source_node: Option<u64>,
	#[serde(default)]
	pub target_node: Option<u64>,
	#[serde(default)]
	pub value: Option<serde_json::Value>,
	#[serde(default)]
	pub children: Vec<TimelineNode>,
}

impl TimelineNode {
	/// Short human-readable label for history panels.
	pub fn label(&self) -> String {
		match (self.action, self.source_node, self.target_node) {
			(Some(1), Some(s), Some(t)) => format!("add {s}-{t}"),
			(Some(0), Some(s), Some(t)) => format!("remove {s}-{t}"),
			_ => "root".to_string(),
		}
	}
}

/// Discriminator for a replayed edge action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeAction {
	Remove,
	Add,
}

/// One entry of a history-navigation replay script.
///
/// The service emits these either as `[action, source, target]` triples or
/// as objects with named fields; both decode to the same normalized form
/// with plain string endpoints.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "ActionStepRepr")]
pub struct ActionStep {
	pub action: EdgeAction,
	pub source: String,
	pub target: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionStepRepr {
	Triple(u8, serde_json::Value, serde_json::Value),
	Object {
		action: u8,
		source: serde_json::Value,
		target: serde_json::Value,
	},
}

fn endpoint_id(value: &serde_json::Value) -> Result<String, String> {
	match value {
		serde_json::Value::String(s) => Ok(s.clone()),
		serde_json::Value::Number(n) => Ok(n.to_string()),
		other => Err(format!("endpoint is neither id nor string: {other}")),
	}
}

impl TryFrom<ActionStepRepr> for ActionStep {
	type Error = String;

	fn try_from(repr: ActionStepRepr) -> Result<Self, Self::Error> {
		let (action, source, target) = match repr {
			ActionStepRepr::Triple(a, s, t) => (a, s, t),
			ActionStepRepr::Object { action, source, target } => (action, source, target),
		};
		let action = match action {
			0 => EdgeAction::Remove,
			1 => EdgeAction::Add,
			other => return Err(format!("unknown action discriminator {other}")),
		};
		Ok(ActionStep {
			action,
			source: endpoint_id(&source)?,
			target: endpoint_id(&target)?,
		})
	}
}

/// Envelope of every mutating endpoint: the refreshed decomposition plus,
/// for edge mutations, the updated history tree.
#[derive(Clone, Debug, Deserialize)]
pub struct MutationResponse {
	pub core_data: DecompositionData,
	#[serde(default)]
	pub timeline: Option<TimelineNode>,
}

/// Response of `navigate_to_node`.
#[derive(Clone, Debug, Deserialize)]
pub struct NavigateResponse {
	#[serde(default)]
	pub action_sequence: Vec<ActionStep>,
}

/// Read-only snapshot from `get_current_graph`, carrying all three
/// decomposition flavors. Re-serialized verbatim for the JSON export.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GraphSnapshot {
	pub core_data: DecompositionData,
	#[serde(default)]
	pub clique_data: BTreeMap<u32, Vec<u64>>,
	#[serde(default)]
	pub truss_data: BTreeMap<u32, Vec<u64>>,
}

/// Parses an uploaded edge list: one `source,target` (or whitespace
/// separated) pair per line, numeric endpoints, blank lines ignored.
/// Lines that do not parse are skipped with a warning, matching the lax
/// behavior of the upload form this replaces.
pub fn parse_edge_list(text: &str) -> Vec<(u64, u64)> {
	let mut edges = Vec::new();
	for line in text.lines() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		let pair = if let Some((source, target)) = line.split_once(',') {
			(
				source.trim().parse::<u64>().ok(),
				target.trim().parse::<u64>().ok(),
			)
		} else {
			let mut parts = line.split_whitespace();
			match (parts.next(), parts.next(), parts.next()) {
				(Some(source), Some(target), None) => {
					(source.parse::<u64>().ok(), target.parse::<u64>().ok())
				}
				_ => (None, None),
			}
		};
		match pair {
			(Some(source), Some(target)) => edges.push((source, target)),
			_ => log::warn!("skipping malformed edge line: {line:?}"),
		}
	}
	edges
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn level_keys_decode_numerically() {
		let json = r#"{"10": {"nodes": [1], "edges": [], "pruned_edges": []},
		               "2": {"nodes": [2], "edges": [[1, 2]], "pruned_edges": [[3, 4]]}}"#;
		let data: DecompositionData = serde_json::from_str(json).unwrap();
		assert_eq!(data.keys().copied().collect::<Vec<_>>(), vec![2, 10]);
		assert_eq!(data[&2].edges, vec![(1, 2)]);
		assert_eq!(data[&2].pruned_edges, vec![(3, 4)]);
	}

	#[test]
	fn missing_pruned_edges_defaults_empty() {
		let json = r#"{"1": {"nodes": [7], "edges": []}}"#;
		let data: DecompositionData = serde_json::from_str(json).unwrap();
		assert!(data[&1].pruned_edges.is_empty());
	}

	#[test]
	fn action_step_decodes_triples_and_objects() {
		let triples: Vec<ActionStep> = serde_json::from_str("[[1, 3, 4], [0, 5, 6]]").unwrap();
		assert_eq!(triples[0].action, EdgeAction::Add);
		assert_eq!(triples[0].source, "3");
		assert_eq!(triples[1].action, EdgeAction::Remove);
		assert_eq!(triples[1].target, "6");

		let objects: Vec<ActionStep> =
			serde_json::from_str(r#"[{"action": 1, "source": "8", "target": 9}]"#).unwrap();
		assert_eq!(objects[0].source, "8");
		assert_eq!(objects[0].target, "9");
	}

	#[test]
	fn action_step_rejects_unknown_discriminator() {
		assert!(serde_json::from_str::<ActionStep>("[2, 1, 2]").is_err());
	}

	#[test]
	fn timeline_root_has_no_action() {
		let json = r#"{"id": 1, "action": null, "source_node": null, "target_node": null,
		               "children": [{"id": 2, "action": 1, "source_node": 3,
		                             "target_node": 4, "children": []}]}"#;
		let tree: TimelineNode = serde_json::from_str(json).unwrap();
		assert_eq!(tree.label(), "root");
		assert_eq!(tree.children[0].label(), "add 3-4");
	}

	#[test]
	fn edge_list_accepts_both_separators() {
		assert_eq!(parse_edge_list("1,2\n3, 4\n"), vec![(1, 2), (3, 4)]);
		assert_eq!(parse_edge_list("1 2\n3 4"), vec![(1, 2), (3, 4)]);
		assert_eq!(parse_edge_list("1\t2\n3  4"), vec![(1, 2), (3, 4)]);
	}

	#[test]
	fn edge_list_skips_blank_and_malformed_lines() {
		assert_eq!(parse_edge_list("\n1,2\n\nnot an edge\n5,6\n"), vec![(1, 2), (5, 6)]);
	}
}
