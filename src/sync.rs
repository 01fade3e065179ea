//! Waiting for the top of the minute.
//!
//! [`MinuteSync::wait_next_minute`] reads the seconds of the current minute, arms a one-shot
//! timer for the remaining whole seconds, and blocks on a channel until the timer fires. The
//! receive is bounded by a safety margin so a lost wake-up costs at most a couple of seconds
//! rather than the whole transmission. The thread is parked for the entire wait; nothing spins.
//!
//! The boundary is computed from whole seconds, and the wall clock may be stepped while waiting,
//! so callers must read the clock again after the wait returns.

use std::fmt::Display;
use std::io;
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::clock::WallClock;

/// How long past the expected wake-up to keep waiting for the timer.
pub const WAKE_MARGIN: Duration = Duration::from_secs(2);

/// A timer that can be armed to fire once.
pub trait OneShot {
	/// The error returned when the timer cannot be armed.
	type Error: Display;

	/// Arm the timer to send a single `()` on `wake` once `after` has elapsed.
	///
	/// Failing to send (the waiter already gave up) must be ignored by the timer.
	fn arm(&mut self, after: Duration, wake: SyncSender<()>) -> Result<(), Self::Error>;
}

/// One-shot timer backed by a short-lived sleeping thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadTimer;

impl OneShot for ThreadTimer {
	type Error = io::Error;

	fn arm(&mut self, after: Duration, wake: SyncSender<()>) -> io::Result<()> {
		thread::Builder::new()
			.name(String::from("jjy-next-minute"))
			.spawn(move || {
				thread::sleep(after);
				let _ = wake.try_send(());
			})
			.map(drop)
	}
}

/// How a call to [`MinuteSync::wait_next_minute`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake {
	/// Already at second zero, no timer armed.
	Immediate,
	/// The timer fired.
	Woken,
	/// The timer never fired and the safety margin ran out.
	TimedOut,
	/// The timer went away without firing, so the rest of the wait was slept out instead.
	Slept,
	/// The timer could not be armed. No wait was performed.
	Unarmed,
	/// The wall clock could not be read. No wait was performed.
	NoClock
}

/// Blocks the calling thread until the next minute boundary.
pub struct MinuteSync<T> {
	timer: T,
	margin: Duration
}

impl<T: OneShot> MinuteSync<T> {
	/// Create a synchronizer using `timer` and the default [`WAKE_MARGIN`].
	pub fn new(timer: T) -> MinuteSync<T> {
		MinuteSync::with_margin(timer, WAKE_MARGIN)
	}

	/// Create a synchronizer using `timer`, waiting at most `margin` past the expected wake-up.
	pub fn with_margin(timer: T, margin: Duration) -> MinuteSync<T> {
		MinuteSync { timer, margin }
	}

	/// Block until the seconds of `clock` roll over to zero.
	///
	/// Returns at once when the clock already reads second zero, when it cannot be read, or when
	/// the timer cannot be armed. Otherwise returns between `R` and `R + margin` seconds later,
	/// where `R` is the number of whole seconds left in the minute.
	pub fn wait_next_minute(&mut self, clock: &impl WallClock) -> Wake {
		let Some(tm) = clock.now() else {
			warn!("Failed to read the wall clock, not waiting for the next minute");
			return Wake::NoClock;
		};
		if tm.sec == 0 {
			return Wake::Immediate;
		}

		let remaining = Duration::from_secs(60 - u64::from(tm.sec.min(59)));
		debug!(
			hour = tm.hour,
			minute = tm.min,
			second = tm.sec,
			wait_s = remaining.as_secs(),
			"Arming next minute timer"
		);

		let start = Instant::now();
		let (tx, rx) = sync_channel(1);
		if let Err(e) = self.timer.arm(remaining, tx) {
			warn!(error = %e, "Failed to arm next minute timer, not waiting");
			return Wake::Unarmed;
		}

		match rx.recv_timeout(remaining + self.margin) {
			Ok(()) => Wake::Woken,
			Err(RecvTimeoutError::Timeout) => {
				warn!(margin_ms = self.margin.as_millis() as u64, "Next minute timer did not fire");
				Wake::TimedOut
			},
			Err(RecvTimeoutError::Disconnected) => {
				warn!("Next minute timer dropped without firing, sleeping instead");
				thread::sleep(remaining.saturating_sub(start.elapsed()));
				Wake::Slept
			}
		}
	}
}
