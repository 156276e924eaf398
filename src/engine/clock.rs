use std::future::Future;

/// Source of timed deferrals for animation gates, autoplay pacing and
/// request timeouts.
///
/// The engine only ever suspends through this trait, so host-side tests can
/// substitute a clock that completes immediately.
pub trait Clock {
	/// Resolves after roughly `ms` milliseconds.
	fn sleep(&self, ms: u32) -> impl Future<Output = ()>;
}

/// Clock backed by the browser event loop.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
	fn sleep(&self, ms: u32) -> impl Future<Output = ()> {
		gloo_timers::future::TimeoutFuture::new(ms)
	}
}

/// Clock whose sleeps resolve on the first poll. Used by unit tests and
/// useful for headless replays where no animation is visible anyway.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantClock;

impl Clock for InstantClock {
	fn sleep(&self, _ms: u32) -> impl Future<Output = ()> {
		std::future::ready(())
	}
}
