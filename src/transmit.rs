//! Pulse a GPIO line through one JJY frame.
//!
//! The line idles high. Each second starts with the line pulled low for the width of that
//! second's [`Slot`](jjy::Slot) (200, 500 or 800 ms), then released high until the next second.
//! Every edge is scheduled against a single monotonic time base sampled when the frame starts,
//! so wall clock steps during the frame cannot stretch or squash it, and per-second errors do
//! not accumulate.

use std::thread;
use std::time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use jjy::Frame;
use tracing::{debug, warn};

/// Milliseconds per slot.
const SLOT_MS: u64 = 1000;

/// A monotonic millisecond clock that can wait for a deadline.
pub trait Ticker {
	/// Milliseconds since an arbitrary fixed origin.
	fn now_ms(&self) -> u64;

	/// Block until [`Ticker::now_ms`] reaches `deadline`. Returns at once if already past it.
	fn wait_until(&mut self, deadline: u64);
}

/// Sleep until shortly before a deadline, then poll for the rest.
///
/// `thread::sleep` alone may overshoot by several milliseconds. Sleeping until `slack` before the
/// deadline and yielding in a loop for the remainder keeps edges within a millisecond or so of
/// their deadline while only spinning for at most `slack` per wait.
#[derive(Clone, Copy, Debug)]
pub struct SpinSleep {
	origin: Instant,
	slack: Duration
}

impl SpinSleep {
	/// Default polling window.
	pub const DEFAULT_SLACK: Duration = Duration::from_millis(10);

	/// Create a ticker that polls for the final `slack` of each wait.
	pub fn new(slack: Duration) -> SpinSleep {
		SpinSleep { origin: Instant::now(), slack }
	}
}

impl Default for SpinSleep {
	fn default() -> Self {
		SpinSleep::new(SpinSleep::DEFAULT_SLACK)
	}
}

impl Ticker for SpinSleep {
	fn now_ms(&self) -> u64 {
		self.origin.elapsed().as_millis() as u64
	}

	fn wait_until(&mut self, deadline: u64) {
		let slack = self.slack.as_millis() as u64;
		let now = self.now_ms();
		if deadline > now + slack {
			thread::sleep(Duration::from_millis(deadline - now - slack));
		}
		while self.now_ms() < deadline {
			thread::yield_now();
		}
	}
}

/// Summary of one transmitted frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
	/// Worst delay between a slot's deadline and its falling edge, in milliseconds.
	pub max_late_ms: u64,
	/// Number of edges the pin failed to drive.
	pub pin_errors: u32,
	/// Time from the first deadline to the end of the last slot, in milliseconds.
	pub span_ms: u64
}

/// Drives a JJY frame onto an output pin.
pub struct Transmitter<P, K> {
	pin: P,
	ticker: K
}

impl<P: OutputPin, K: Ticker> Transmitter<P, K> {
	/// Take ownership of `pin` and drive it to the idle (high) level.
	///
	/// # Errors
	///
	/// Returns the pin's error if it cannot be driven high.
	pub fn new(mut pin: P, ticker: K) -> Result<Transmitter<P, K>, P::Error> {
		pin.set_high()?;
		Ok(Transmitter { pin, ticker })
	}

	/// Send `frame`, blocking for the full 60 seconds.
	///
	/// The first slot starts immediately. There is no way to stop part way through. A failed pin
	/// write is logged and counted in the returned [`Report`], and the frame carries on.
	pub fn transmit(&mut self, frame: &Frame) -> Report {
		let base = self.ticker.now_ms();
		let mut report = Report::default();

		for (i, slot) in frame.iter().enumerate() {
			let deadline = base + i as u64 * SLOT_MS;
			self.ticker.wait_until(deadline);
			let late = self.ticker.now_ms().saturating_sub(deadline);
			report.max_late_ms = report.max_late_ms.max(late);

			if let Err(e) = self.pin.set_low() {
				warn!(slot = i, error = ?e, "Failed to start pulse");
				report.pin_errors += 1;
			}
			self.ticker.wait_until(deadline + slot.pulse_width().as_millis() as u64);
			if let Err(e) = self.pin.set_high() {
				warn!(slot = i, error = ?e, "Failed to end pulse");
				report.pin_errors += 1;
			}

			self.ticker.wait_until(deadline + SLOT_MS);
		}

		report.span_ms = self.ticker.now_ms() - base;
		debug!(
			max_late_ms = report.max_late_ms,
			pin_errors = report.pin_errors,
			span_ms = report.span_ms,
			"Frame sent"
		);
		report
	}
}
