use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::prelude::*;

use crate::components::force_graph::DecompositionCanvas;
use crate::components::history_tree::HistoryTree;
use crate::engine::{
	AppSession, BrowserClock, HttpRemoteGraph, Notice, TimelineNode, parse_edge_list,
};

/// Engine state is mirrored into signals on this cadence; reactive views
/// read only the signals, never the session itself.
const POLL_INTERVAL_MS: i32 = 250;
const MAX_LOG_LINES: usize = 30;

/// Viewer page: the canvas plus the edit, playback, history and export
/// panels, all driving one shared session.
#[component]
pub fn Home() -> impl IntoView {
	let session = Rc::new(AppSession::new(
		HttpRemoteGraph::new(HttpRemoteGraph::DEFAULT_BASE),
		BrowserClock,
	));

	let progress = RwSignal::new((0usize, 0usize));
	let busy = RwSignal::new(false);
	let autoplay = RwSignal::new(false);
	let timeline = RwSignal::new(None::<TimelineNode>);
	let notices = RwSignal::new(Vec::<String>::new());
	let navigate = RwSignal::new(None::<u64>);

	let edge_source = RwSignal::new(String::new());
	let edge_target = RwSignal::new(String::new());
	let node_input = RwSignal::new(String::new());
	let upload_text = RwSignal::new(String::new());
	let export_text = RwSignal::new(String::new());

	// Load the default sample once the page is up.
	{
		let session = session.clone();
		Effect::new(move |_| {
			let session = session.clone();
			spawn_local(async move {
				let _ = session.load_sample("1").await;
			});
		});
	}

	// Mirror engine state into the signals above on a fixed timer.
	{
		let session = session.clone();
		let poll: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
		Effect::new(move |_| {
			if poll.borrow().is_some() {
				return;
			}
			let session = session.clone();
			let cb: Closure<dyn FnMut()> = Closure::new(move || {
				let current = session.progress();
				if progress.get_untracked() != current {
					progress.set(current);
				}
				if busy.get_untracked() != session.busy() {
					busy.set(session.busy());
				}
				if autoplay.get_untracked() != session.autoplay_on() {
					autoplay.set(session.autoplay_on());
				}
				let tree = session.timeline().clone();
				if timeline.with_untracked(|t| *t != tree) {
					timeline.set(tree);
				}
				for notice in session.drain_notices() {
					let line = match notice {
						Notice::Info(text) => text,
						Notice::Error(text) => format!("error: {text}"),
					};
					notices.update(|log| {
						log.push(line);
						if log.len() > MAX_LOG_LINES {
							log.remove(0);
						}
					});
				}
			});
			if let Some(window) = web_sys::window() {
				let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
					cb.as_ref().unchecked_ref(),
					POLL_INTERVAL_MS,
				);
			}
			*poll.borrow_mut() = Some(cb);
		});
	}

	// History clicks arrive through the navigate signal because the tree
	// renders inside a reactive closure that cannot capture the session.
	{
		let session = session.clone();
		Effect::new(move |_| {
			if let Some(id) = navigate.get() {
				navigate.set(None);
				let session = session.clone();
				spawn_local(async move {
					let _ = session.navigate_to(id).await;
				});
			}
		});
	}

	let editing_locked = move || busy.get() || autoplay.get();

	let on_add_edge = {
		let session = session.clone();
		move |_| {
			let session = session.clone();
			let (s, t) = (edge_source.get_untracked(), edge_target.get_untracked());
			spawn_local(async move {
				let _ = session.add_edge(&s, &t).await;
			});
		}
	};

	let on_delete_edge = {
		let session = session.clone();
		move |_| {
			let session = session.clone();
			let (s, t) = (edge_source.get_untracked(), edge_target.get_untracked());
			spawn_local(async move {
				let _ = session.delete_edge(&s, &t).await;
			});
		}
	};

	let on_delete_node = {
		let session = session.clone();
		move |_| {
			let session = session.clone();
			let node = node_input.get_untracked();
			spawn_local(async move {
				let _ = session.delete_node(&node).await;
			});
		}
	};

	let on_sample = {
		let session = session.clone();
		move |ev| {
			let session = session.clone();
			let sample = event_target_value(&ev);
			spawn_local(async move {
				let _ = session.load_sample(&sample).await;
			});
		}
	};

	let on_upload = {
		let session = session.clone();
		move |_| {
			let edges = parse_edge_list(&upload_text.get_untracked());
			if edges.is_empty() {
				notices.update(|log| log.push("upload ignored: no parsable edges".into()));
				return;
			}
			let session = session.clone();
			spawn_local(async move {
				let _ = session.upload_edges(edges).await;
			});
		}
	};

	let on_step = {
		let session = session.clone();
		move |_| {
			let session = session.clone();
			spawn_local(async move {
				let _ = session.step().await;
			});
		}
	};

	let on_autoplay = {
		let session = session.clone();
		move |_| {
			if session.autoplay_on() {
				session.stop_autoplay();
			} else {
				let session = session.clone();
				spawn_local(async move {
					session.run_autoplay().await;
				});
			}
		}
	};

	let on_export = {
		let session = session.clone();
		move |_| {
			let session = session.clone();
			spawn_local(async move {
				match session.export_snapshot().await {
					Ok(json) => export_text.set(json),
					Err(e) => notices.update(|log| log.push(format!("export failed: {e}"))),
				}
			});
		}
	};

	let canvas_session = session.clone();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="viewer-layout">
				<div class="graph-panel">
					<DecompositionCanvas session=canvas_session />
				</div>

				<div class="side-panel">
					<section class="dataset-controls">
						<h2>"Dataset"</h2>
						<label>
							"Sample"
							<select on:change=on_sample prop:disabled=editing_locked>
								<option value="1">"Sample 1"</option>
								<option value="2">"Sample 2"</option>
								<option value="3">"Sample 3"</option>
							</select>
						</label>
						<textarea
							placeholder="one edge per line: source,target"
							prop:value=move || upload_text.get()
							on:input=move |ev| upload_text.set(event_target_value(&ev))
						/>
						<button on:click=on_upload prop:disabled=editing_locked>
							"Upload edge list"
						</button>
					</section>

					<section class="edit-controls">
						<h2>"Edit"</h2>
						<input
							placeholder="source"
							prop:value=move || edge_source.get()
							on:input=move |ev| edge_source.set(event_target_value(&ev))
						/>
						<input
							placeholder="target"
							prop:value=move || edge_target.get()
							on:input=move |ev| edge_target.set(event_target_value(&ev))
						/>
						<button on:click=on_add_edge prop:disabled=editing_locked>
							"Add edge"
						</button>
						<button on:click=on_delete_edge prop:disabled=editing_locked>
							"Delete edge"
						</button>
						<input
							placeholder="node"
							prop:value=move || node_input.get()
							on:input=move |ev| node_input.set(event_target_value(&ev))
						/>
						<button on:click=on_delete_node prop:disabled=editing_locked>
							"Delete node"
						</button>
					</section>

					<section class="playback-controls">
						<h2>"Prune playback"</h2>
						<button on:click=on_step prop:disabled=move || autoplay.get()>
							"Step"
						</button>
						<button on:click=on_autoplay>
							{move || if autoplay.get() { "Stop" } else { "Autoplay" }}
						</button>
						<span class="progress">
							{move || {
								let (done, total) = progress.get();
								format!("{done} / {total}")
							}}
						</span>
					</section>

					<HistoryTree timeline=timeline navigate=navigate />

					<section class="operations-log">
						<h2>"Log"</h2>
						<ul>
							{move || {
								notices
									.get()
									.into_iter()
									.map(|line| view! { <li>{line}</li> })
									.collect_view()
							}}
						</ul>
					</section>

					<section class="export-panel">
						<h2>"Export"</h2>
						<button on:click=on_export>"Fetch snapshot"</button>
						<pre class="export-output">{move || export_text.get()}</pre>
					</section>
				</div>
			</div>
		</ErrorBoundary>
	}
}
