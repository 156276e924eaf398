//! Panel showing the server-side history tree. Clicking a node posts its id
//! to the `navigate` signal; the page resolves that into a replay.

use leptos::prelude::*;

use crate::engine::TimelineNode;

fn tree_view(node: &TimelineNode, navigate: RwSignal<Option<u64>>) -> AnyView {
	let id = node.id;
	let label = node.label();
	let children = node
		.children
		.iter()
		.map(|child| tree_view(child, navigate))
		.collect_view();
	view! {
		<li>
			<button class="history-node" on:click=move |_| navigate.set(Some(id))>
				{label}
			</button>
			<ul>{children}</ul>
		</li>
	}
	.into_any()
}

/// History panel fed from the timeline snapshot the page keeps in sync.
#[component]
pub fn HistoryTree(
	timeline: RwSignal<Option<TimelineNode>>,
	navigate: RwSignal<Option<u64>>,
) -> impl IntoView {
	view! {
		<div class="history-panel">
			<h2>"History"</h2>
			{move || {
				timeline
					.get()
					.map(|root| view! { <ul class="history-tree">{tree_view(&root, navigate)}</ul> })
			}}
		</div>
	}
}
