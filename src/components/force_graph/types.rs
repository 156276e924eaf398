use force_graph::DefaultNodeIdx;

/// Node payload carried inside the simulation graph.
#[derive(Clone, Debug)]
pub struct NodeVisual {
	pub id: String,
	pub level: u32,
	pub flashing: bool,
}

/// Drawable edge, kept parallel to the simulation's edge set so level
/// colors and fade flags survive without round-tripping through it.
#[derive(Clone, Debug)]
pub struct EdgeVisual {
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
	pub level: u32,
	pub fading: bool,
}
