//! Playback and synchronization engine for leveled graph decompositions.
//!
//! The decomposition itself (k-core, k-clique, k-truss) is computed by an
//! external service; this engine turns its leveled datasets into a
//! deterministic prune playback, keeps the rendered graph consistent with
//! the authoritative remote graph after every mutation, and replays
//! history-navigation scripts. Everything here is target-independent and
//! unit-tested on the host; the browser only contributes the fetch
//! transport and the real clock.

pub mod client;
pub mod clock;
pub mod dataset;
pub mod error;
pub mod flatten;
pub mod model;
pub mod reconcile;
pub mod session;

pub use client::{HttpRemoteGraph, MutationMode, RemoteGraph};
pub use clock::{Clock, InstantClock};
pub use dataset::{
	ActionStep, DecompositionData, EdgeAction, GraphSnapshot, LevelSlice, MutationResponse,
	TimelineNode, parse_edge_list,
};
pub use error::EngineError;
pub use flatten::{FlatGraph, flatten};
pub use model::{GraphEdge, GraphModel, GraphNode};
pub use reconcile::reconcile;
pub use session::{Notice, Session, StepOutcome};

#[cfg(target_arch = "wasm32")]
pub use clock::BrowserClock;

/// The session type the UI components work with.
#[cfg(target_arch = "wasm32")]
pub type AppSession = Session<HttpRemoteGraph, BrowserClock>;
