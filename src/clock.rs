//! Wall clock access.
//!
//! The sender never asks whether the clock has been synchronized: whatever the clock says is
//! what gets transmitted. Keeping the clock behind [`WallClock`] lets tests pin it to a chosen
//! instant.

use time::{Tm, TimeSpec};

/// Timestamps before this (Sep 9, 2001) are taken to mean the clock was never set.
const UNSET_BEFORE: i64 = 1000000000;

/// A source of calendar time.
pub trait WallClock {
	/// Read the current calendar time, or `None` if the clock cannot be read.
	fn now(&self) -> Option<Tm>;

	/// Whether the clock looks like it was ever set. Only used for diagnostics.
	fn looks_set(&self) -> bool {
		true
	}
}

/// The system real-time clock shifted by a fixed UTC offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SystemClock {
	/// Seconds east of UTC.
	offset: i32
}

impl SystemClock {
	/// Default offset, UTC+8.
	pub const DEFAULT_OFFSET: i32 = 8 * 3600;

	/// Create a clock reporting local time at `offset` seconds east of UTC.
	pub fn new(offset: i32) -> SystemClock {
		SystemClock { offset }
	}

	/// The configured offset, in seconds east of UTC.
	pub fn offset(&self) -> i32 {
		self.offset
	}

	fn read(&self) -> Option<TimeSpec> {
		time::now()
	}
}

impl Default for SystemClock {
	fn default() -> Self {
		SystemClock::new(SystemClock::DEFAULT_OFFSET)
	}
}

impl WallClock for SystemClock {
	fn now(&self) -> Option<Tm> {
		Tm::with_offset(self.read()?.sec, self.offset)
	}

	fn looks_set(&self) -> bool {
		self.read().is_some_and(|t| t.sec >= UNSET_BEFORE)
	}
}
