//! Wall clock reads and Unix timestamp to calendar conversion.
//!
//! # Examples
//!
//! ```
//! # use time::time::Tm;
//! let date = Tm::new(1718617807).unwrap();
//! assert_eq!(date, Tm {
//! 	sec: 7,
//! 	min: 50,
//! 	hour: 9,
//! 	day: 17,
//! 	mon: 6,
//! 	year: 2024,
//! 	wday: 1,
//! 	yday: 169
//! });
//! ```

#[cfg(feature = "now")]
use core::mem::MaybeUninit;
#[cfg(feature = "now")]
use libc::{timespec, clock_gettime, CLOCK_REALTIME};

/// Unix time with nanosecond granularity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSpec {
	/// Seconds since the Unix epoch
	pub sec: i64,
	/// Nanoseconds since the beginning of `sec`, ranging [0-999999999]
	pub nsec: i64
}

#[cfg(feature = "now")]
impl From<timespec> for TimeSpec {
	fn from(value: timespec) -> Self {
		TimeSpec {
			sec: value.tv_sec as i64,
			nsec: value.tv_nsec as i64
		}
	}
}

/// Get the current wall clock time as a Unix timestamp with nanosecond granularity.
///
/// Returns `None` if `libc::clock_gettime` fails. The value is whatever the system clock says:
/// no check is made that it has ever been synchronized.
///
/// # Examples
///
/// ```
/// # use time::time::now;
/// let c = now().expect("Failed to get current time");
/// assert!(c.sec > 0);
/// ```
#[cfg(feature = "now")]
pub fn now() -> Option<TimeSpec> {
	let mut time = MaybeUninit::<timespec>::uninit();
	// Safety:
	// - clock_gettime does not read time, only writes
	// - if clock_gettime returns zero, time is successfully initialized
	unsafe {
		match clock_gettime(CLOCK_REALTIME, time.as_mut_ptr()) {
			0 => Some(time.assume_init().into()),
			_ => None
		}
	}
}

/// Check whether a given absolute Gregorian `year` is a leap year.
///
/// # Examples
///
/// ```
/// # use time::time::isleapyear;
/// assert_eq!(isleapyear(1900), false);
/// assert_eq!(isleapyear(2000), true);
/// assert_eq!(isleapyear(2023), false);
/// assert_eq!(isleapyear(2024), true);
/// ```
#[inline(always)]
pub fn isleapyear(year: u16) -> bool {
	let l = if year % 100 != 0 { 3 } else { 15 };
	(year & l) == 0
}

/// Seconds per minute.
const SECONDS_PER_MINUTE: i64 = 60;
/// Seconds per hour.
const SECONDS_PER_HOUR: i64 = SECONDS_PER_MINUTE * 60;
/// Seconds per day.
const SECONDS_PER_DAY: i64 = SECONDS_PER_HOUR * 24;
/// Days in a 400 year Gregorian cycle.
const DAYS_PER_ERA: i64 = 146097;
/// Days from March 1, 0000 to January 1, 1970.
const DAYS_FROM_MARCH_0000_TO_1970: i64 = 719468;
/// Days from March 1 to December 31, inclusive.
const DAYS_FROM_MAR_TO_DEC: i64 = 306;
/// Days from January 1 to February 28, inclusive.
const DAYS_FROM_JAN_TO_FEB: i64 = 59;

/// Gregorian calendar date and time of day.
///
/// Compared with `libc::tm`, `mon` is [1, 12], `yday` is [1, 366], and `year` is the absolute
/// year rather than years since 1900.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tm {
	/// Seconds, ranged [0, 59]
	pub sec: u8,
	/// Minutes, ranged [0, 59]
	pub min: u8,
	/// Hours, ranged [0, 23]
	pub hour: u8,
	/// Day of the month, ranged [1, 31]
	pub day: u8,
	/// Month of the year, ranged [1, 12]
	pub mon: u8,
	/// Absolute Gregorian year
	pub year: u16,
	/// Day of the week, ranged [0, 6] => [Sunday, Saturday]
	pub wday: u8,
	/// Day of the year, ranged [1, 366]
	pub yday: u16
}

impl Tm {
	/// Convert a Unix timestamp into a UTC calendar date.
	///
	/// Only timestamps on or after the Unix epoch are supported, and the year must fit in a
	/// `u16`; anything else returns `None`.
	pub fn new(unixtimestamp: i64) -> Option<Tm> {
		// The calendar is rotated to start on March 1 so the leap day falls at the end of the
		// year, then split into 400 year eras.
		// http://howardhinnant.github.io/date_algorithms.html#civil_from_days
		if unixtimestamp < 0 { return None }
		let days = unixtimestamp / SECONDS_PER_DAY;
		let rem = unixtimestamp % SECONDS_PER_DAY;

		let z = days + DAYS_FROM_MARCH_0000_TO_1970;
		let era = z / DAYS_PER_ERA;
		let doe = z % DAYS_PER_ERA;
		let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
		let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
		let mp = (5 * doy + 2) / 153;
		let d = doy - (153 * mp + 2) / 5 + 1;

		let (m, y) = if mp < 10 {
			(mp + 3, yoe + era * 400)
		} else {
			(mp - 9, yoe + era * 400 + 1)
		};
		let year = u16::try_from(y).ok()?;
		let yday = if mp < 10 {
			doy + DAYS_FROM_JAN_TO_FEB + isleapyear(year) as i64
		} else {
			doy - DAYS_FROM_MAR_TO_DEC
		};

		Some(Tm {
			sec: (rem % SECONDS_PER_MINUTE) as u8,
			min: (rem % SECONDS_PER_HOUR / SECONDS_PER_MINUTE) as u8,
			hour: (rem / SECONDS_PER_HOUR) as u8,
			day: d as u8,
			mon: m as u8,
			year,
			wday: ((days + 4) % 7) as u8, // Jan 1, 1970 was a Thursday
			yday: (yday + 1) as u16
		})
	}

	/// Convert a Unix timestamp into the calendar date at a fixed offset from UTC.
	///
	/// `offset` is in seconds east of UTC, e.g. `9 * 3600` for Japan standard time.
	pub fn with_offset(unixtimestamp: i64, offset: i32) -> Option<Tm> {
		Tm::new(unixtimestamp.checked_add(offset as i64)?)
	}

	/// Check whether `self` is in a leap year.
	#[inline(always)]
	pub fn isleapyear(&self) -> bool {
		isleapyear(self.year)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::mem::MaybeUninit;
	use libc::{time_t, tm};

	// Get the libc version of UTC calendar time
	fn utc_time(time: time_t) -> tm {
		unsafe {
			let mut utc = MaybeUninit::<tm>::uninit();
			libc::gmtime_r(&time, utc.as_mut_ptr());
			utc.assume_init()
		}
	}

	fn compare_dates(time: i64) {
		let d1 = utc_time(time as time_t);
		let d2 = Tm::new(time).unwrap();
		assert_eq!(d1.tm_sec, d2.sec as i32, "time: {}, sec", time);
		assert_eq!(d1.tm_min, d2.min as i32, "time: {}, min", time);
		assert_eq!(d1.tm_hour, d2.hour as i32, "time: {}, hour", time);
		assert_eq!(d1.tm_mday, d2.day as i32, "time: {}, mday", time);
		assert_eq!(d1.tm_mon + 1, d2.mon as i32, "time: {}, mon", time);
		assert_eq!(d1.tm_year + 1900, d2.year as i32, "time: {}, year", time);
		assert_eq!(d1.tm_wday, d2.wday as i32, "time: {}, wday", time);
		assert_eq!(d1.tm_yday + 1, d2.yday as i32, "time: {}, yday", time);
	}

	#[test]
	fn date_test() {
		assert!(Tm::new(-94694400).is_none());
		compare_dates(0);
		compare_dates(5097600);
		compare_dates(31449600);
		compare_dates(951782400);  // Feb 29, 2000
		compare_dates(951868800);  // Mar 1, 2000
		compare_dates(1709164800); // Feb 29, 2024
		compare_dates(1735603199); // Dec 30, 2024 23:59:59
		compare_dates(1735689599); // Dec 31, 2024 23:59:59 (day 366)
		compare_dates(1735689600);
		compare_dates(1718617807);
		compare_dates(1844848207);
		compare_dates(4102444800); // Jan 1, 2100

		// Make sure extreme inputs cannot panic
		assert!(Tm::new(i64::MAX).is_none());
		Tm::new(i64::MIN);
	}

	#[test]
	fn leap_year_end_test() {
		let date = Tm::new(1735689599).unwrap();
		assert_eq!((date.mon, date.day, date.yday), (12, 31, 366));
		assert!(date.isleapyear());

		let date = Tm::new(1767225599).unwrap();
		assert_eq!((date.mon, date.day, date.yday), (12, 31, 365));
		assert!(!date.isleapyear());
	}

	#[test]
	fn offset_test() {
		// Dec 31, 2024 15:00:00 UTC is midnight in Tokyo
		let date = Tm::with_offset(1735657200, 9 * 3600).unwrap();
		assert_eq!(date, Tm { sec: 0, min: 0, hour: 0, day: 1, mon: 1, year: 2025, wday: 3, yday: 1 });

		// ... and still the 31st in UTC
		let date = Tm::with_offset(1735657200, 0).unwrap();
		assert_eq!((date.day, date.hour, date.wday, date.yday), (31, 15, 2, 366));

		// Negative offsets can cross back over the epoch
		assert!(Tm::with_offset(3600, -7200).is_none());
		assert!(Tm::with_offset(i64::MAX, 1).is_none());
	}

	#[test]
	fn isleapyear_test() {
		assert_eq!(isleapyear(1900), false);
		assert_eq!(isleapyear(2000), true);
		assert_eq!(isleapyear(2020), true);
		assert_eq!(isleapyear(2023), false);
		assert_eq!(isleapyear(2024), true);
		assert_eq!(isleapyear(2100), false);

		// Make sure extreme inputs cannot panic
		isleapyear(0);
		isleapyear(u16::MAX);
	}
}
