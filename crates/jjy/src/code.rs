//! Time code layout: where each calendar field lives within a frame.
//!
//! | Slots   | Content                                 |
//! | ------- | --------------------------------------- |
//! | 1-3     | Minute tens (BCD)                       |
//! | 5-8     | Minute ones (BCD)                       |
//! | 12-13   | Hour tens (BCD)                         |
//! | 15-18   | Hour ones (BCD)                         |
//! | 22-23   | Day of year hundreds (BCD)              |
//! | 25-28   | Day of year tens (BCD)                  |
//! | 30-33   | Day of year ones (BCD)                  |
//! | 36      | Parity over slots 1-8 and 12-18         |
//! | 37      | Parity over slots 22-33                 |
//! | 41-44   | Year tens (BCD)                         |
//! | 45-48   | Year ones (BCD)                         |
//! | 50-52   | Day of week (binary, 0 = Sunday)        |
//!
//! Slots 0, 9, 19, 29, 39, 49 and 59 are position markers. Everything else is reserved and always
//! [`Slot::Zero`].

use core::ops::RangeInclusive;
use crate::{Frame, FrameError, Slot, TimeSnapshot};

/// A run of slots holding one binary number, most significant bit first.
#[derive(Clone, Copy)]
struct Field {
	start: usize,
	len: usize
}

impl Field {
	const fn new(start: usize, len: usize) -> Field {
		Field { start, len }
	}

	/// Write the low `len` bits of `value` into `frame`. Higher bits are dropped.
	fn put(self, frame: &mut Frame, value: u16) {
		for i in 0..self.len {
			let bit = (value >> (self.len - 1 - i)) & 1 == 1;
			frame.set(self.start + i, Slot::from_bit(bit));
		}
	}

	/// Read the field back out of `frame`.
	fn get(self, frame: &Frame) -> u16 {
		(0..self.len).fold(0, |acc, i| (acc << 1) | (frame[self.start + i] == Slot::One) as u16)
	}
}

const MIN_TENS: Field = Field::new(1, 3);
const MIN_ONES: Field = Field::new(5, 4);
const HOUR_TENS: Field = Field::new(12, 2);
const HOUR_ONES: Field = Field::new(15, 4);
const YDAY_HUNS: Field = Field::new(22, 2);
const YDAY_TENS: Field = Field::new(25, 4);
const YDAY_ONES: Field = Field::new(30, 4);
const YEAR_TENS: Field = Field::new(41, 4);
const YEAR_ONES: Field = Field::new(45, 4);
const WEEKDAY: Field = Field::new(50, 3);

/// First parity slot and the ranges it covers (minute and hour).
const PARITY_1: (usize, [RangeInclusive<usize>; 2]) = (36, [1..=8, 12..=18]);
/// Second parity slot and the range it covers (day of year).
const PARITY_2: (usize, [RangeInclusive<usize>; 1]) = (37, [22..=33]);

/// Parity over the given slot ranges: `true` if they hold an odd number of ones.
fn parity<const N: usize>(frame: &Frame, ranges: &[RangeInclusive<usize>; N]) -> bool {
	ranges.iter().map(|r| frame.ones(r.clone())).sum::<u32>() & 1 == 1
}

/// Encode `snapshot` into a frame.
///
/// This never fails. Fields outside their calendar range are truncated to the width of their
/// slots, so the frame stays well-formed (markers in place, reserved slots zero) even though the
/// time it carries is meaningless.
///
/// # Examples
///
/// ```
/// # use jjy::{encode, TimeSnapshot};
/// // Sat, July 4, 2020. 11:36
/// let snapshot = TimeSnapshot { minute: 36, hour: 11, yday: 186, year: 20, weekday: 6 };
/// assert_eq!(
/// 	encode(&snapshot).to_string(),
/// 	"M01100110M 000100001M 000101000M 011000000M 000100000M 110000000M"
/// );
/// ```
pub fn encode(snapshot: &TimeSnapshot) -> Frame {
	let mut frame = Frame::new();
	let minute = snapshot.minute as u16;
	let hour = snapshot.hour as u16;
	let yday = snapshot.yday;
	let year = snapshot.year as u16;

	MIN_TENS.put(&mut frame, minute / 10);
	MIN_ONES.put(&mut frame, minute % 10);
	HOUR_TENS.put(&mut frame, hour / 10);
	HOUR_ONES.put(&mut frame, hour % 10);
	YDAY_HUNS.put(&mut frame, yday / 100);
	YDAY_TENS.put(&mut frame, yday / 10 % 10);
	YDAY_ONES.put(&mut frame, yday % 10);
	YEAR_TENS.put(&mut frame, year / 10 % 10);
	YEAR_ONES.put(&mut frame, year % 10);
	WEEKDAY.put(&mut frame, snapshot.weekday as u16);

	let p1 = parity(&frame, &PARITY_1.1);
	frame.set(PARITY_1.0, Slot::from_bit(p1));
	let p2 = parity(&frame, &PARITY_2.1);
	frame.set(PARITY_2.0, Slot::from_bit(p2));

	frame
}

/// Decode a frame back into the calendar fields it carries.
///
/// # Errors
///
/// Returns [`FrameError::MissingMarker`] or [`FrameError::UnexpectedMarker`] if markers are out
/// of place, and [`FrameError::ParityMismatch`] if either parity slot disagrees with its data.
pub fn decode(frame: &Frame) -> Result<TimeSnapshot, FrameError> {
	for (i, slot) in frame.iter().enumerate() {
		match (Frame::MARKERS.contains(&i), slot == Slot::Marker) {
			(true, false) => return Err(FrameError::MissingMarker(i)),
			(false, true) => return Err(FrameError::UnexpectedMarker(i)),
			_ => ()
		}
	}

	if parity(frame, &PARITY_1.1) != (frame[PARITY_1.0] == Slot::One) {
		return Err(FrameError::ParityMismatch(PARITY_1.0));
	}
	if parity(frame, &PARITY_2.1) != (frame[PARITY_2.0] == Slot::One) {
		return Err(FrameError::ParityMismatch(PARITY_2.0));
	}

	Ok(TimeSnapshot {
		minute: (MIN_TENS.get(frame) * 10 + MIN_ONES.get(frame)) as u8,
		hour: (HOUR_TENS.get(frame) * 10 + HOUR_ONES.get(frame)) as u8,
		yday: YDAY_HUNS.get(frame) * 100 + YDAY_TENS.get(frame) * 10 + YDAY_ONES.get(frame),
		year: (YEAR_TENS.get(frame) * 10 + YEAR_ONES.get(frame)) as u8,
		weekday: WEEKDAY.get(frame) as u8
	})
}
