//! Frame and slot types.

use core::fmt;
use core::ops::{Index, RangeInclusive};
use core::time::Duration;

/// The value carried by one second of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Slot {
	/// Binary 0, an 800 ms pulse.
	#[default]
	Zero,
	/// Binary 1, a 500 ms pulse.
	One,
	/// Position marker, a 200 ms pulse.
	Marker
}

impl Slot {
	/// The slot for a binary value.
	#[inline(always)]
	pub const fn from_bit(bit: bool) -> Slot {
		if bit { Slot::One } else { Slot::Zero }
	}

	/// How long the line is held low at the start of this slot.
	pub const fn pulse_width(self) -> Duration {
		match self {
			Slot::Marker => Duration::from_millis(200),
			Slot::One => Duration::from_millis(500),
			Slot::Zero => Duration::from_millis(800)
		}
	}

	/// Single character used when printing frames: `M`, `1` or `0`.
	pub const fn symbol(self) -> char {
		match self {
			Slot::Marker => 'M',
			Slot::One => '1',
			Slot::Zero => '0'
		}
	}
}

/// Seconds per frame.
const SLOTS: usize = 60;

/// One minute of time code: 60 slots, one per second.
///
/// Frames returned by [`encode`](crate::encode) always hold [`Slot::Marker`] at
/// [`Frame::MARKERS`] and nowhere else. Arbitrary frames can be built from an array of slots,
/// which is mostly useful for exercising a transmitter.
///
/// Printing a frame gives six groups of ten slots, e.g.
/// `M00000000M 000000000M 000000000M 000100010M 000100101M 011000000M`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame([Slot; SLOTS]);

impl Frame {
	/// Number of slots in a frame.
	pub const LEN: usize = SLOTS;

	/// Slot indices that always hold a position marker.
	pub const MARKERS: [usize; 7] = [0, 9, 19, 29, 39, 49, 59];

	/// A frame with the position markers set and every other slot [`Slot::Zero`].
	pub fn new() -> Frame {
		let mut slots = [Slot::Zero; SLOTS];
		for i in Frame::MARKERS {
			slots[i] = Slot::Marker;
		}
		Frame(slots)
	}

	/// All slots, in transmission order.
	#[inline(always)]
	pub fn slots(&self) -> &[Slot; SLOTS] {
		&self.0
	}

	/// Iterate over the slots in transmission order.
	pub fn iter(&self) -> impl Iterator<Item = Slot> + '_ {
		self.0.iter().copied()
	}

	/// Count the [`Slot::One`]s within `range`.
	pub fn ones(&self, range: RangeInclusive<usize>) -> u32 {
		self.0[range].iter().filter(|&&s| s == Slot::One).count() as u32
	}

	#[inline(always)]
	pub(crate) fn set(&mut self, i: usize, slot: Slot) {
		self.0[i] = slot;
	}
}

impl Default for Frame {
	fn default() -> Self {
		Frame::new()
	}
}

impl From<[Slot; SLOTS]> for Frame {
	fn from(slots: [Slot; SLOTS]) -> Self {
		Frame(slots)
	}
}

impl Index<usize> for Frame {
	type Output = Slot;

	fn index(&self, i: usize) -> &Self::Output {
		&self.0[i]
	}
}

impl fmt::Display for Frame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, slot) in self.iter().enumerate() {
			if i > 0 && i % 10 == 0 {
				f.write_str(" ")?;
			}
			write!(f, "{}", slot.symbol())?;
		}
		Ok(())
	}
}

impl fmt::Debug for Frame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

#[cfg(test)]
mod tests {
	extern crate std;
	use std::string::ToString;
	use super::*;

	#[test]
	fn new_frame_test() {
		let frame = Frame::new();
		assert_eq!(
			frame.to_string(),
			"M00000000M 000000000M 000000000M 000000000M 000000000M 000000000M"
		);
		assert_eq!(frame, Frame::default());
		assert_eq!(frame.ones(0..=59), 0);
	}

	#[test]
	fn pulse_width_test() {
		assert_eq!(Slot::Marker.pulse_width(), Duration::from_millis(200));
		assert_eq!(Slot::One.pulse_width(), Duration::from_millis(500));
		assert_eq!(Slot::Zero.pulse_width(), Duration::from_millis(800));
	}

	#[test]
	fn ones_test() {
		let mut slots = [Slot::Zero; SLOTS];
		slots[1] = Slot::One;
		slots[5] = Slot::One;
		slots[9] = Slot::Marker;
		slots[12] = Slot::One;
		let frame = Frame::from(slots);
		assert_eq!(frame.ones(1..=8), 2);
		assert_eq!(frame.ones(9..=9), 0);
		assert_eq!(frame.ones(0..=59), 3);
		assert_eq!(frame.to_string(), "010001000M 0010000000 0000000000 0000000000 0000000000 0000000000");
	}
}
