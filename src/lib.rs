//! Interactive playback viewer for k-core, k-clique and k-truss graph
//! decompositions.
//!
//! The [`engine`] module is the portable core: it flattens the leveled
//! datasets the decomposition service emits, funnels every mutation through
//! the remote client, and drives prune playback and history replay. The
//! remaining modules are the browser shell (Leptos app, canvas, panels) and
//! only build for wasm.

pub mod engine;

// Shell dependencies are only referenced from the wasm modules.
#[cfg(not(target_arch = "wasm32"))]
use {
	console_error_panic_hook as _, console_log as _, force_graph as _, leptos as _,
	leptos_meta as _, leptos_router as _, wasm_bindgen as _, web_sys as _,
};

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod components;
#[cfg(target_arch = "wasm32")]
mod pages;

#[cfg(target_arch = "wasm32")]
pub use app::{App, init_logging};
