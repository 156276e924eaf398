//! One graph session: the owned model, the history-tree snapshot, the
//! pending replay script, and the control flows that mutate them.
//!
//! All mutation flows funnel through the remote client and only touch local
//! state after a fully parsed success response. The prune sequencer and the
//! action replay engine each carry their own re-entrancy guard so at most
//! one mutation per subsystem is ever in flight; everything runs on the
//! single-threaded browser event loop, so interior mutability is `RefCell`
//! and `Cell`, never locks.

use std::cell::{Cell, Ref, RefCell};
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;

use futures::future::{Either, select};

use super::client::{MutationMode, RemoteGraph};
use super::clock::Clock;
use super::dataset::{ActionStep, EdgeAction, MutationResponse, TimelineNode};
use super::error::EngineError;
use super::flatten::{FlatGraph, flatten};
use super::model::GraphModel;
use super::reconcile::reconcile;

/// Highlight-then-fade on a deleted edge before its line is removed.
pub const EDGE_FADE_MS: u32 = 250;
/// Flash on an orphaned node before its committed removal.
pub const ORPHAN_FLASH_MS: u32 = 250;
/// Sequencer timer while autoplay is on.
pub const AUTOPLAY_INTERVAL_MS: u32 = 600;
/// Settle delay between replayed actions.
pub const REPLAY_GAP_MS: u32 = 600;
/// Backoff before retrying a failed replay action.
pub const REPLAY_RETRY_MS: u32 = 1000;
/// Transport timeout; a hung request must not stall a sequencer forever.
pub const REQUEST_TIMEOUT_MS: u32 = 10_000;

/// User-visible event emitted by the engine; the UI drains these into its
/// operations log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
	Info(String),
	Error(String),
}

/// Result of one sequencer step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
	/// The queued edge was deleted remotely and committed locally.
	Pruned(String),
	/// The queued id no longer resolves to a live edge; the progress
	/// counter advanced without a remote call.
	SkippedStale(String),
	/// The prune order is exhausted; autoplay was stopped.
	Exhausted,
	/// A step was already in flight; this invocation was a no-op.
	Busy,
}

/// Per-action cancellation handle for the replay engine. Dropped (settled)
/// as soon as the action completes, success or not.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
	pub fn cancel(&self) {
		self.0.set(true);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.get()
	}
}

/// Playback and synchronization engine for one graph session.
pub struct Session<R, C> {
	remote: R,
	clock: C,
	model: RefCell<GraphModel>,
	timeline: RefCell<Option<TimelineNode>>,
	actions: RefCell<Vec<ActionStep>>,
	notices: RefCell<Vec<Notice>>,
	stepping: Cell<bool>,
	replaying: Cell<bool>,
	autoplay: Cell<bool>,
	replay_cancel: RefCell<Option<CancelToken>>,
	/// Bumped by [`Session::reset_replay`]; a running replay loop compares
	/// against the epoch it started under and winds down on mismatch.
	replay_epoch: Cell<u64>,
}

impl<R: RemoteGraph, C: Clock> Session<R, C> {
	pub fn new(remote: R, clock: C) -> Self {
		Self {
			remote,
			clock,
			model: RefCell::new(GraphModel::default()),
			timeline: RefCell::new(None),
			actions: RefCell::new(Vec::new()),
			notices: RefCell::new(Vec::new()),
			stepping: Cell::new(false),
			replaying: Cell::new(false),
			autoplay: Cell::new(false),
			replay_cancel: RefCell::new(None),
			replay_epoch: Cell::new(0),
		}
	}

	/// Read access for the canvas and control widgets.
	pub fn model(&self) -> Ref<'_, GraphModel> {
		self.model.borrow()
	}

	pub fn timeline(&self) -> Ref<'_, Option<TimelineNode>> {
		self.timeline.borrow()
	}

	/// `(next index, queue length)` of the prune playback.
	pub fn progress(&self) -> (usize, usize) {
		let model = self.model.borrow();
		(model.progress, model.prune_order.len())
	}

	pub fn autoplay_on(&self) -> bool {
		self.autoplay.get()
	}

	/// True while either sequencer has a mutation in flight; edit controls
	/// are disabled off this.
	pub fn busy(&self) -> bool {
		self.stepping.get() || self.replaying.get()
	}

	pub fn drain_notices(&self) -> Vec<Notice> {
		std::mem::take(&mut self.notices.borrow_mut())
	}

	fn push_notice(&self, notice: Notice) {
		if let Notice::Error(text) = &notice {
			log::error!("{text}");
		}
		self.notices.borrow_mut().push(notice);
	}

	/// Races a remote call against the transport timeout so a hung request
	/// releases the owning sequencer.
	async fn guarded<T>(
		&self,
		call: impl Future<Output = Result<T, EngineError>>,
	) -> Result<T, EngineError> {
		let call = pin!(call);
		let timeout = pin!(self.clock.sleep(REQUEST_TIMEOUT_MS));
		match select(call, timeout).await {
			Either::Left((result, _)) => result,
			Either::Right(((), _)) => Err(EngineError::Transport("request timed out".into())),
		}
	}

	// ---- dataset loads (wholesale replacement) ----

	/// Loads one of the built-in samples (`"1"`, `"2"`, `"3"`).
	pub async fn load_sample(&self, sample: &str) -> Result<(), EngineError> {
		let response = self.guarded(self.remote.initialize(sample)).await;
		match response {
			Ok(response) => {
				self.adopt(response);
				self.push_notice(Notice::Info(format!("loaded sample {sample}")));
				Ok(())
			}
			Err(e) => {
				self.push_notice(Notice::Error(format!("sample load failed: {e}")));
				Err(e)
			}
		}
	}

	/// Replaces the server-side graph with an uploaded edge list.
	pub async fn upload_edges(&self, edges: Vec<(u64, u64)>) -> Result<(), EngineError> {
		let response = self.guarded(self.remote.upload_graph(&edges)).await;
		match response {
			Ok(response) => {
				self.adopt(response);
				self.push_notice(Notice::Info(format!("uploaded {} edges", edges.len())));
				Ok(())
			}
			Err(e) => {
				self.push_notice(Notice::Error(format!("upload failed: {e}")));
				Err(e)
			}
		}
	}

	/// Deletes a node server-side. The response carries no incremental
	/// delta, so the whole model is rebuilt from it; per-id positions
	/// survive in the canvas layer.
	pub async fn delete_node(&self, node: &str) -> Result<(), EngineError> {
		let node = node.trim();
		let response = self.guarded(self.remote.remove_node(node)).await;
		match response {
			Ok(response) => {
				self.adopt(response);
				self.push_notice(Notice::Info(format!("deleted node {node}")));
				Ok(())
			}
			Err(e) => {
				self.push_notice(Notice::Error(format!("delete node failed: {e}")));
				Err(e)
			}
		}
	}

	fn adopt(&self, response: MutationResponse) {
		self.model.borrow_mut().reset_from(flatten(&response.core_data));
		if let Some(tree) = response.timeline {
			*self.timeline.borrow_mut() = Some(tree);
		}
		self.actions.borrow_mut().clear();
		self.autoplay.set(false);
		self.reset_replay();
	}

	// ---- single-edge mutations ----

	/// User-initiated add.
	pub async fn add_edge(&self, source: &str, target: &str) -> Result<(), EngineError> {
		let (source, target) = (source.trim(), target.trim());
		let result = self.mutate_add(source, target, MutationMode::Manual).await;
		match &result {
			Ok(()) => self.push_notice(Notice::Info(format!("added edge {source}-{target}"))),
			Err(e) => self.push_notice(Notice::Error(format!("add edge failed: {e}"))),
		}
		result
	}

	/// User-initiated delete.
	pub async fn delete_edge(&self, source: &str, target: &str) -> Result<(), EngineError> {
		let (source, target) = (source.trim(), target.trim());
		let result = self.mutate_remove(source, target, MutationMode::Manual).await;
		match &result {
			Ok(()) => self.push_notice(Notice::Info(format!("deleted edge {source}-{target}"))),
			Err(e) => self.push_notice(Notice::Error(format!("delete edge failed: {e}"))),
		}
		result
	}

	async fn mutate_add(
		&self,
		source: &str,
		target: &str,
		mode: MutationMode,
	) -> Result<(), EngineError> {
		let response = self.guarded(self.remote.add_edge(source, target, mode)).await?;
		let flat = flatten(&response.core_data);
		self.commit(response, flat, mode);
		Ok(())
	}

	async fn mutate_remove(
		&self,
		source: &str,
		target: &str,
		mode: MutationMode,
	) -> Result<(), EngineError> {
		let response = self.guarded(self.remote.remove_edge(source, target, mode)).await?;
		let flat = flatten(&response.core_data);

		let doomed = self
			.model
			.borrow()
			.find_edge(source, target)
			.map(|e| e.id.clone());
		if let Some(id) = doomed {
			let orphans = {
				let mut model = self.model.borrow_mut();
				let orphans = model.orphans_after_removal(&id);
				model.set_edge_fading(&id, true);
				for orphan in &orphans {
					model.set_node_flashing(orphan, true);
				}
				orphans
			};
			// The visual cue and the committed removal share one gate, so a
			// fast double-click cannot observe the edge half-removed.
			self.clock.sleep(EDGE_FADE_MS.max(ORPHAN_FLASH_MS)).await;
			let mut model = self.model.borrow_mut();
			model.remove_edge(&id);
			for orphan in &orphans {
				model.remove_node(orphan);
			}
			if !orphans.is_empty() {
				model.request_reheat();
			}
		}

		self.commit(response, flat, mode);
		Ok(())
	}

	fn commit(&self, response: MutationResponse, flat: FlatGraph, mode: MutationMode) {
		{
			let mut model = self.model.borrow_mut();
			reconcile(&mut model, &flat);
			model.prune_order = flat.prune_order;
			if mode.resets_progress() {
				model.progress = 0;
			}
		}
		if mode.stops_autoplay() {
			self.autoplay.set(false);
		}
		if let Some(tree) = response.timeline {
			*self.timeline.borrow_mut() = Some(tree);
		}
	}

	// ---- prune sequencer ----

	/// Plays one entry of the prune order. Re-entrant calls are no-ops
	/// reported as [`StepOutcome::Busy`]; at most one remote delete is in
	/// flight per invocation chain.
	pub async fn step(&self) -> Result<StepOutcome, EngineError> {
		if self.stepping.replace(true) {
			return Ok(StepOutcome::Busy);
		}
		let outcome = self.step_inner().await;
		self.stepping.set(false);
		if let Err(e) = &outcome {
			self.push_notice(Notice::Error(format!("prune step failed: {e}")));
		}
		outcome
	}

	async fn step_inner(&self) -> Result<StepOutcome, EngineError> {
		let queued = {
			let model = self.model.borrow();
			model.prune_order.get(model.progress).cloned()
		};
		let Some(id) = queued else {
			self.autoplay.set(false);
			self.push_notice(Notice::Info("prune playback complete".into()));
			return Ok(StepOutcome::Exhausted);
		};

		let resolved = self
			.model
			.borrow()
			.resolve_edge(&id)
			.map(|e| (e.source.clone(), e.target.clone()));
		let Some((source, target)) = resolved else {
			// Already pruned by a concurrent edit; advance without a call.
			self.model.borrow_mut().progress += 1;
			log::debug!("prune entry {id} already absent, skipping");
			return Ok(StepOutcome::SkippedStale(id));
		};

		self.mutate_remove(&source, &target, MutationMode::Prune).await?;
		Ok(StepOutcome::Pruned(id))
	}

	/// Drives [`Session::step`] on a fixed timer until the queue empties or
	/// the autoplay flag is cleared. Stopping mid-flight lets the current
	/// step finish; it never aborts a dispatched mutation.
	pub async fn run_autoplay(&self) {
		if self.autoplay.replace(true) {
			return;
		}
		log::info!("autoplay started");
		while self.autoplay.get() {
			match self.step().await {
				Ok(StepOutcome::Exhausted) => break,
				Ok(_) => {}
				Err(_) => {} // already reported; next tick retries
			}
			if !self.autoplay.get() {
				break;
			}
			self.clock.sleep(AUTOPLAY_INTERVAL_MS).await;
		}
		self.autoplay.set(false);
		log::info!("autoplay stopped");
	}

	pub fn stop_autoplay(&self) {
		self.autoplay.set(false);
	}

	// ---- action replay ----

	/// Fetches the replay script for a history node and plays it. A replay
	/// already in flight is reset first; the new script is only installed
	/// and started once the old loop has wound down, so it always plays
	/// from its first action.
	pub async fn navigate_to(&self, node_id: u64) -> Result<(), EngineError> {
		let sequence = match self.guarded(self.remote.navigate_to(node_id)).await {
			Ok(sequence) => sequence,
			Err(e) => {
				self.push_notice(Notice::Error(format!("history navigation failed: {e}")));
				return Err(e);
			}
		};
		if self.replaying.get() {
			self.reset_replay();
			while self.replaying.get() {
				self.clock.sleep(REPLAY_GAP_MS).await;
			}
		}
		log::info!("replaying {} actions for history node {node_id}", sequence.len());
		*self.actions.borrow_mut() = sequence;
		self.replay_actions().await;
		Ok(())
	}

	/// Plays the pending action sequence in order. Single-flight via its
	/// own guard, distinct from the sequencer's. The stored sequence is
	/// taken as a whole unit up front, so it is consumed exactly once and
	/// a script installed mid-replay can never be spliced into this run.
	/// Each action gets a fresh cancellation token that settles with the
	/// action; a failed action is retried once after a backoff, then
	/// skipped — one failure never aborts the rest of the script.
	pub async fn replay_actions(&self) {
		if self.replaying.replace(true) {
			return;
		}
		let epoch = self.replay_epoch.get();
		let script = std::mem::take(&mut *self.actions.borrow_mut());
		for action in &script {
			if self.replay_epoch.get() != epoch {
				break; // external reset
			}
			let token = CancelToken::default();
			*self.replay_cancel.borrow_mut() = Some(token.clone());
			let mut attempts = 0;
			loop {
				match self.apply_action(action, &token).await {
					Ok(()) => break,
					Err(e) if e.is_cancellation() => break,
					Err(e) => {
						self.push_notice(Notice::Error(format!("replay action failed: {e}")));
						attempts += 1;
						if attempts > 1 {
							break;
						}
						self.clock.sleep(REPLAY_RETRY_MS).await;
					}
				}
			}
			self.replay_cancel.borrow_mut().take();
			self.clock.sleep(REPLAY_GAP_MS).await;
		}
		self.replaying.set(false);
	}

	async fn apply_action(
		&self,
		action: &ActionStep,
		token: &CancelToken,
	) -> Result<(), EngineError> {
		if token.is_cancelled() {
			return Err(EngineError::Cancelled);
		}
		match action.action {
			EdgeAction::Add => {
				self.mutate_add(&action.source, &action.target, MutationMode::Replay).await
			}
			EdgeAction::Remove => {
				self.mutate_remove(&action.source, &action.target, MutationMode::Replay).await
			}
		}
	}

	/// Aborts replay: bumps the epoch so the running loop winds down after
	/// the current action settles, and cancels that action's token. The
	/// loop itself clears the `replaying` guard when it exits.
	pub fn reset_replay(&self) {
		self.replay_epoch.set(self.replay_epoch.get().wrapping_add(1));
		if let Some(token) = self.replay_cancel.borrow().as_ref() {
			token.cancel();
		}
	}

	/// Fetches and pretty-prints the current decomposition snapshot.
	pub async fn export_snapshot(&self) -> Result<String, EngineError> {
		let snapshot = self.guarded(self.remote.current_graph()).await?;
		serde_json::to_string_pretty(&snapshot).map_err(|e| EngineError::Malformed(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::VecDeque;
	use std::pin::Pin;
	use std::task::{Context, Poll};

	use futures::executor::block_on;
	use futures::future::join;
	use futures::task::noop_waker;

	use super::*;
	use crate::engine::dataset::{DecompositionData, LevelSlice};

	/// Completes on its second poll, giving concurrent futures a chance to
	/// interleave under `block_on`.
	#[derive(Default)]
	struct YieldOnce(bool);

	impl Future for YieldOnce {
		type Output = ();

		fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
			if self.0 {
				Poll::Ready(())
			} else {
				self.0 = true;
				cx.waker().wake_by_ref();
				Poll::Pending
			}
		}
	}

	/// Every sleep yields exactly once, regardless of duration.
	#[derive(Clone, Copy, Default)]
	struct TestClock;

	impl Clock for TestClock {
		fn sleep(&self, _ms: u32) -> impl Future<Output = ()> {
			YieldOnce::default()
		}
	}

	#[derive(Default)]
	struct MockRemote {
		responses: RefCell<VecDeque<Result<MutationResponse, EngineError>>>,
		/// Script returned by every `navigate_to` call.
		navigation: RefCell<Vec<ActionStep>>,
		calls: RefCell<Vec<String>>,
		/// Suspend once before answering, to exercise in-flight guards.
		yield_first: Cell<bool>,
		/// Never answer at all, to exercise the transport timeout.
		hang: Cell<bool>,
	}

	impl MockRemote {
		fn push_ok(&self, data: DecompositionData) {
			self.responses
				.borrow_mut()
				.push_back(Ok(MutationResponse { core_data: data, timeline: None }));
		}

		fn push_err(&self, text: &str) {
			self.responses
				.borrow_mut()
				.push_back(Err(EngineError::Transport(text.into())));
		}

		async fn answer(&self, call: String) -> Result<MutationResponse, EngineError> {
			self.calls.borrow_mut().push(call);
			if self.hang.get() {
				futures::future::pending::<()>().await;
			}
			if self.yield_first.get() {
				YieldOnce::default().await;
			}
			self.responses
				.borrow_mut()
				.pop_front()
				.unwrap_or_else(|| Err(EngineError::Transport("unscripted call".into())))
		}
	}

	impl RemoteGraph for MockRemote {
		async fn initialize(&self, sample: &str) -> Result<MutationResponse, EngineError> {
			self.answer(format!("init:{sample}")).await
		}

		async fn add_edge(
			&self,
			source: &str,
			target: &str,
			mode: MutationMode,
		) -> Result<MutationResponse, EngineError> {
			self.answer(format!("add:{source}:{target}:{}", mode.wire())).await
		}

		async fn remove_edge(
			&self,
			source: &str,
			target: &str,
			mode: MutationMode,
		) -> Result<MutationResponse, EngineError> {
			self.answer(format!("remove:{source}:{target}:{}", mode.wire())).await
		}

		async fn remove_node(&self, node: &str) -> Result<MutationResponse, EngineError> {
			self.answer(format!("remove_node:{node}")).await
		}

		async fn upload_graph(
			&self,
			edges: &[(u64, u64)],
		) -> Result<MutationResponse, EngineError> {
			self.answer(format!("upload:{}", edges.len())).await
		}

		async fn navigate_to(&self, node_id: u64) -> Result<Vec<ActionStep>, EngineError> {
			self.calls.borrow_mut().push(format!("navigate:{node_id}"));
			Ok(self.navigation.borrow().clone())
		}

		async fn current_graph(
			&self,
		) -> Result<crate::engine::dataset::GraphSnapshot, EngineError> {
			Err(EngineError::Transport("unscripted call".into()))
		}
	}

	fn dataset(levels: &[(u32, &[u64], &[(u64, u64)], &[(u64, u64)])]) -> DecompositionData {
		levels
			.iter()
			.map(|&(level, nodes, edges, pruned)| {
				(level, LevelSlice {
					nodes: nodes.to_vec(),
					edges: edges.to_vec(),
					pruned_edges: pruned.to_vec(),
				})
			})
			.collect()
	}

	fn session() -> Session<MockRemote, TestClock> {
		Session::new(MockRemote::default(), TestClock)
	}

	fn seed(session: &Session<MockRemote, TestClock>, data: DecompositionData) {
		session.model.borrow_mut().reset_from(flatten(&data));
	}

	/// Two levels, prune order ["1-2"], suitable for one prune step.
	fn seed_simple(session: &Session<MockRemote, TestClock>) {
		seed(
			session,
			dataset(&[
				(2, &[1, 2, 3], &[(1, 2), (2, 3)], &[]),
				(1, &[1, 2, 3, 4], &[(3, 4)], &[(1, 2)]),
			]),
		);
	}

	/// What the server would answer after pruning 1-2: no pruned edges left.
	fn pruned_response() -> DecompositionData {
		dataset(&[(1, &[2, 3, 4], &[(2, 3), (3, 4)], &[])])
	}

	#[test]
	fn step_issues_one_delete_for_the_queued_edge() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			s.remote.push_ok(pruned_response());

			let outcome = s.step().await.unwrap();
			assert_eq!(outcome, StepOutcome::Pruned("1-2".into()));
			assert_eq!(s.remote.calls.borrow().as_slice(), ["remove:1:2:1"]);
			assert!(s.model().resolve_edge("1-2").is_none());
		});
	}

	#[test]
	fn concurrent_steps_are_single_flight() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			s.remote.yield_first.set(true);
			s.remote.push_ok(pruned_response());

			let (first, second) = join(s.step(), s.step()).await;
			assert_eq!(first.unwrap(), StepOutcome::Pruned("1-2".into()));
			assert_eq!(second.unwrap(), StepOutcome::Busy);
			assert_eq!(s.remote.calls.borrow().len(), 1);
		});
	}

	#[test]
	fn stale_entry_advances_without_a_remote_call() {
		block_on(async {
			let s = session();
			seed(&s, dataset(&[(1, &[1, 2], &[(1, 2)], &[(5, 6)])]));

			let outcome = s.step().await.unwrap();
			assert_eq!(outcome, StepOutcome::SkippedStale("5-6".into()));
			assert_eq!(s.model().progress, 1);
			assert!(s.remote.calls.borrow().is_empty());
		});
	}

	#[test]
	fn exhausted_queue_stops_autoplay() {
		block_on(async {
			let s = session();
			seed(&s, dataset(&[(1, &[1], &[], &[])]));
			s.autoplay.set(true);

			assert_eq!(s.step().await.unwrap(), StepOutcome::Exhausted);
			assert!(!s.autoplay_on());
			assert!(s
				.drain_notices()
				.contains(&Notice::Info("prune playback complete".into())));
		});
	}

	#[test]
	fn orphan_removal_commits_only_after_the_gate() {
		let s = session();
		seed(&s, dataset(&[(1, &[3, 4], &[(3, 4)], &[])]));
		s.remote.push_ok(dataset(&[(1, &[], &[], &[])]));

		let fut = s.delete_edge("3", "4");
		let mut fut = Box::pin(fut);
		let waker = noop_waker();
		let mut cx = Context::from_waker(&waker);

		// First poll runs up to the animation gate: the response has been
		// parsed, the edge is fading and both orphans flash, but nothing
		// has been removed yet.
		assert!(fut.as_mut().poll(&mut cx).is_pending());
		{
			let model = s.model();
			let edge = model.resolve_edge("3-4").unwrap();
			assert!(edge.fading);
			assert!(model.node("3").unwrap().flashing);
			assert!(model.node("4").unwrap().flashing);
		}

		// Second poll lets the gate elapse and commits the removal.
		assert!(fut.as_mut().poll(&mut cx).is_ready());
		let model = s.model();
		assert!(model.resolve_edge("3-4").is_none());
		assert!(model.node("3").is_none());
		assert!(model.node("4").is_none());
	}

	#[test]
	fn prune_step_resets_progress_but_keeps_autoplay() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			s.autoplay.set(true);
			s.remote.push_ok(dataset(&[(1, &[2, 3, 4], &[(2, 3), (3, 4)], &[(2, 3)])]));

			s.step().await.unwrap();
			assert_eq!(s.model().progress, 0);
			assert_eq!(s.model().prune_order, vec!["2-3".to_string()]);
			assert!(s.autoplay_on());
		});
	}

	#[test]
	fn manual_edit_resets_progress_and_stops_autoplay() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			s.model.borrow_mut().progress = 1;
			s.autoplay.set(true);
			s.remote.push_ok(dataset(&[(1, &[1, 2, 3, 4, 5], &[(4, 5)], &[])]));

			s.add_edge("4", "5").await.unwrap();
			assert_eq!(s.model().progress, 0);
			assert!(!s.autoplay_on());
			assert_eq!(s.remote.calls.borrow().as_slice(), ["add:4:5:0"]);
		});
	}

	#[test]
	fn failed_mutation_leaves_local_state_untouched() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			let revision = s.model().revision();
			s.remote.push_err("boom");

			assert!(s.add_edge("7", "8").await.is_err());
			assert_eq!(s.model().revision(), revision);
			assert!(matches!(s.drain_notices().last(), Some(Notice::Error(_))));
		});
	}

	#[test]
	fn autoplay_runs_to_exhaustion() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			s.remote.push_ok(pruned_response());

			s.run_autoplay().await;
			assert!(!s.autoplay_on());
			assert_eq!(s.remote.calls.borrow().len(), 1);
			assert_eq!(s.progress(), (0, 0));
		});
	}

	#[test]
	fn replay_retries_once_then_continues() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			s.model.borrow_mut().progress = 1;
			*s.actions.borrow_mut() = vec![
				ActionStep { action: EdgeAction::Add, source: "4".into(), target: "5".into() },
				ActionStep { action: EdgeAction::Remove, source: "3".into(), target: "4".into() },
			];
			// First add fails twice (initial try + one retry), then the
			// remove succeeds.
			s.remote.push_err("flaky");
			s.remote.push_err("flaky again");
			s.remote.push_ok(pruned_response());

			s.replay_actions().await;

			assert_eq!(
				s.remote.calls.borrow().as_slice(),
				["add:4:5:2", "add:4:5:2", "remove:3:4:2"]
			);
			// Replay never resets the prune progress counter.
			assert_eq!(s.model().progress, 1);
			// The consumed script is cleared as a whole unit.
			assert!(s.actions.borrow().is_empty());
			assert!(!s.replaying.get());
		});
	}

	#[test]
	fn replay_is_single_flight() {
		block_on(async {
			let s = session();
			*s.actions.borrow_mut() = vec![ActionStep {
				action: EdgeAction::Add,
				source: "1".into(),
				target: "2".into(),
			}];
			s.replaying.set(true);

			s.replay_actions().await;
			// The guarded call returned immediately without consuming.
			assert_eq!(s.actions.borrow().len(), 1);
			assert!(s.remote.calls.borrow().is_empty());
		});
	}

	#[test]
	fn navigation_during_replay_restarts_with_the_new_script() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			*s.actions.borrow_mut() = vec![
				ActionStep { action: EdgeAction::Add, source: "1".into(), target: "2".into() },
				ActionStep { action: EdgeAction::Remove, source: "3".into(), target: "4".into() },
			];
			*s.remote.navigation.borrow_mut() = vec![
				ActionStep { action: EdgeAction::Remove, source: "7".into(), target: "8".into() },
				ActionStep { action: EdgeAction::Add, source: "9".into(), target: "10".into() },
			];
			s.remote.push_ok(pruned_response());
			s.remote.push_ok(pruned_response());
			s.remote.push_ok(pruned_response());

			let (_, nav) = join(s.replay_actions(), s.navigate_to(5)).await;
			nav.unwrap();

			// The old script is cut short after its in-flight action; the
			// navigated script then plays from its own first action instead
			// of being picked up at the old script's index.
			assert_eq!(
				s.remote.calls.borrow().as_slice(),
				["add:1:2:2", "navigate:5", "remove:7:8:2", "add:9:10:2"]
			);
			assert!(s.actions.borrow().is_empty());
			assert!(!s.replaying.get());
		});
	}

	#[test]
	fn cancelled_action_is_not_dispatched() {
		block_on(async {
			let s = session();
			let token = CancelToken::default();
			token.cancel();
			let action = ActionStep {
				action: EdgeAction::Add,
				source: "1".into(),
				target: "2".into(),
			};
			let result = s.apply_action(&action, &token).await;
			assert!(matches!(result, Err(EngineError::Cancelled)));
			assert!(s.remote.calls.borrow().is_empty());
		});
	}

	#[test]
	fn hung_request_times_out_and_releases_the_guard() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			s.remote.hang.set(true);

			let outcome = s.step().await;
			assert!(matches!(outcome, Err(EngineError::Transport(_))));
			assert!(!s.stepping.get());

			// The sequencer is usable again.
			s.remote.hang.set(false);
			s.remote.push_ok(pruned_response());
			assert_eq!(s.step().await.unwrap(), StepOutcome::Pruned("1-2".into()));
		});
	}

	#[test]
	fn sample_load_replaces_everything() {
		block_on(async {
			let s = session();
			seed_simple(&s);
			s.model.borrow_mut().progress = 1;
			*s.actions.borrow_mut() = vec![ActionStep {
				action: EdgeAction::Add,
				source: "9".into(),
				target: "9".into(),
			}];
			s.autoplay.set(true);
			s.remote.push_ok(dataset(&[(1, &[7, 8], &[(7, 8)], &[])]));

			s.load_sample("2").await.unwrap();
			assert_eq!(s.progress(), (0, 0));
			assert!(s.actions.borrow().is_empty());
			assert!(!s.autoplay_on());
			assert!(s.model().node("7").is_some());
			assert!(s.model().node("1").is_none());
		});
	}
}
