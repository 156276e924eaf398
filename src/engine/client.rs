//! Remote mutation client: the one funnel through which every graph
//! mutation reaches the decomposition service.
//!
//! Endpoint payloads are normalized here — endpoints travel as plain string
//! ids and nothing else — so no ambiguous representation ever reaches the
//! model. The engine only depends on the [`RemoteGraph`] trait; tests swap
//! in a scripted mock.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::dataset::{
	ActionStep, GraphSnapshot, MutationResponse, NavigateResponse,
};
use super::error::EngineError;

/// Who initiated a mutation. Travels on the wire as `algo_running` and
/// decides what happens to playback state once the response lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationMode {
	/// User-initiated edit.
	Manual,
	/// Sequencer-driven prune step.
	Prune,
	/// Replay-driven action; replay keeps its own progression.
	Replay,
}

impl MutationMode {
	pub fn wire(self) -> &'static str {
		match self {
			MutationMode::Manual => "0",
			MutationMode::Prune => "1",
			MutationMode::Replay => "2",
		}
	}

	/// Manual edits and prune steps invalidate the old prune order, so the
	/// progress counter restarts against the refreshed one.
	pub fn resets_progress(self) -> bool {
		matches!(self, MutationMode::Manual | MutationMode::Prune)
	}

	/// Only a manual edit stops automatic playback; a prune step is part
	/// of it and replay progresses on its own.
	pub fn stops_autoplay(self) -> bool {
		matches!(self, MutationMode::Manual)
	}
}

/// The decomposition service as seen by the engine.
#[allow(async_fn_in_trait)]
pub trait RemoteGraph {
	/// `initialize_graph`: loads sample `"1"`, `"2"` or `"3"`.
	async fn initialize(&self, sample: &str) -> Result<MutationResponse, EngineError>;
	/// `add_edge`.
	async fn add_edge(
		&self,
		source: &str,
		target: &str,
		mode: MutationMode,
	) -> Result<MutationResponse, EngineError>;
	/// `remove_edge`.
	async fn remove_edge(
		&self,
		source: &str,
		target: &str,
		mode: MutationMode,
	) -> Result<MutationResponse, EngineError>;
	/// `remove_node`.
	async fn remove_node(&self, node: &str) -> Result<MutationResponse, EngineError>;
	/// `upload_graph`: replaces the server-side graph with an edge list.
	async fn upload_graph(&self, edges: &[(u64, u64)]) -> Result<MutationResponse, EngineError>;
	/// `navigate_to_node`: returns the replay script for a history node.
	async fn navigate_to(&self, node_id: u64) -> Result<Vec<ActionStep>, EngineError>;
	/// `get_current_graph`: read-only snapshot of all decomposition flavors.
	async fn current_graph(&self) -> Result<GraphSnapshot, EngineError>;
}

#[derive(Serialize)]
struct EdgeRequest<'a> {
	source: &'a str,
	target: &'a str,
	algo_running: &'a str,
}

#[derive(Serialize)]
struct SampleRequest<'a> {
	value: &'a str,
}

#[derive(Serialize)]
struct NodeRequest<'a> {
	node: &'a str,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
	edges: &'a [(u64, u64)],
}

#[derive(Serialize)]
struct NavigateRequest {
	node_id: u64,
}

/// HTTP implementation over reqwest's fetch backend.
#[derive(Clone, Debug)]
pub struct HttpRemoteGraph {
	base: String,
	http: reqwest::Client,
}

impl HttpRemoteGraph {
	/// Where the Python service listens during development.
	pub const DEFAULT_BASE: &'static str = "http://localhost:8000";

	pub fn new(base: impl Into<String>) -> Self {
		Self {
			base: base.into(),
			http: reqwest::Client::new(),
		}
	}

	async fn post<T: DeserializeOwned>(
		&self,
		path: &str,
		body: &impl Serialize,
	) -> Result<T, EngineError> {
		let url = format!("{}/{path}", self.base);
		log::debug!("POST {url}");
		let response = self
			.http
			.post(&url)
			.json(body)
			.send()
			.await
			.map_err(|e| EngineError::Transport(format!("{path}: {e}")))?;
		decode(path, response).await
	}

	async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, EngineError> {
		let url = format!("{}/{path}", self.base);
		log::debug!("GET {url}");
		let response = self
			.http
			.get(&url)
			.send()
			.await
			.map_err(|e| EngineError::Transport(format!("{path}: {e}")))?;
		decode(path, response).await
	}
}

async fn decode<T: DeserializeOwned>(
	path: &str,
	response: reqwest::Response,
) -> Result<T, EngineError> {
	let status = response.status();
	if !status.is_success() {
		return Err(EngineError::Transport(format!("{path}: status {status}")));
	}
	response
		.json::<T>()
		.await
		.map_err(|e| EngineError::Malformed(format!("{path}: {e}")))
}

impl RemoteGraph for HttpRemoteGraph {
	async fn initialize(&self, sample: &str) -> Result<MutationResponse, EngineError> {
		self.post("initialize_graph", &SampleRequest { value: sample }).await
	}

	async fn add_edge(
		&self,
		source: &str,
		target: &str,
		mode: MutationMode,
	) -> Result<MutationResponse, EngineError> {
		let body = EdgeRequest { source, target, algo_running: mode.wire() };
		self.post("add_edge", &body).await
	}

	async fn remove_edge(
		&self,
		source: &str,
		target: &str,
		mode: MutationMode,
	) -> Result<MutationResponse, EngineError> {
		let body = EdgeRequest { source, target, algo_running: mode.wire() };
		self.post("remove_edge", &body).await
	}

	async fn remove_node(&self, node: &str) -> Result<MutationResponse, EngineError> {
		self.post("remove_node", &NodeRequest { node }).await
	}

	async fn upload_graph(&self, edges: &[(u64, u64)]) -> Result<MutationResponse, EngineError> {
		self.post("upload_graph", &UploadRequest { edges }).await
	}

	async fn navigate_to(&self, node_id: u64) -> Result<Vec<ActionStep>, EngineError> {
		let response: NavigateResponse =
			self.post("navigate_to_node", &NavigateRequest { node_id }).await?;
		Ok(response.action_sequence)
	}

	async fn current_graph(&self) -> Result<GraphSnapshot, EngineError> {
		self.get("get_current_graph").await
	}
}
