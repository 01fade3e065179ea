//! Encode the JJY time code.
//!
//! JJY transmits one 60 second frame per minute. Each second carries one [`Slot`], sent as a
//! low pulse whose width identifies the slot: 200 ms for a [`Slot::Marker`], 500 ms for a
//! [`Slot::One`], and 800 ms for a [`Slot::Zero`]. The frame sent during a minute describes the
//! instant at the **beginning** of that minute.
//!
//! This crate only builds frames; it knows nothing about clocks or GPIO. It is `no_std`.
//!
//! # Examples
//! ```
//! # use jjy::{encode, decode, TimeSnapshot, Slot};
//! // Wed, Jan 1, 2025. 00:00
//! let snapshot = TimeSnapshot { minute: 0, hour: 0, yday: 1, year: 25, weekday: 3 };
//! let frame = encode(&snapshot);
//!
//! assert_eq!(frame[0], Slot::Marker);
//! assert_eq!(frame[33], Slot::One);
//! assert_eq!(decode(&frame), Ok(snapshot));
//! ```

#![no_std]

use core::{error, fmt};
use time::Tm;

mod frame;
mod code;

pub use frame::{Frame, Slot};
pub use code::{encode, decode};

/// The calendar fields carried by one frame.
///
/// A snapshot is taken once per transmitted minute and never re-read while encoding. Fields are
/// not range checked: out of range values still produce a well-formed frame, just not a
/// meaningful one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeSnapshot {
	/// Minute, ranged [0, 59].
	pub minute: u8,
	/// Hour, ranged [0, 23].
	pub hour: u8,
	/// Day of the year, ranged [1, 366].
	pub yday: u16,
	/// Year of the century, ranged [0, 99].
	pub year: u8,
	/// Day of the week, ranged [0, 6] => [Sunday, Saturday].
	pub weekday: u8
}

impl From<&Tm> for TimeSnapshot {
	fn from(tm: &Tm) -> Self {
		TimeSnapshot {
			minute: tm.min,
			hour: tm.hour,
			yday: tm.yday,
			year: (tm.year % 100) as u8,
			weekday: tm.wday
		}
	}
}

/// The error type for decoding frames.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
	/// A position marker slot does not hold [`Slot::Marker`]. The slot index is the payload.
	MissingMarker(usize),
	/// A data slot holds [`Slot::Marker`]. The slot index is the payload.
	UnexpectedMarker(usize),
	/// A parity slot disagrees with the slots it covers. The parity slot index is the payload.
	ParityMismatch(usize)
}

impl fmt::Display for FrameError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FrameError::MissingMarker(i) => write!(f, "Missing marker at slot {}", i),
			FrameError::UnexpectedMarker(i) => write!(f, "Unexpected marker at slot {}", i),
			FrameError::ParityMismatch(i) => write!(f, "Parity mismatch at slot {}", i),
		}
	}
}

impl fmt::Debug for FrameError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl error::Error for FrameError {}
