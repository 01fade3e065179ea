//! Calendar time for the JJY sender.
//!
//! The [`time`] module converts Unix timestamps into Gregorian calendar fields ([`Tm`]) with a
//! fixed UTC offset, without relying on libc's `localtime` and its global timezone state. The
//! conversion is thread safe and `no_std`.
//!
//! If the `now` feature is enabled, [`now`] reads the current wall clock through
//! `clock_gettime(CLOCK_REALTIME)`.
//!
//! # Examples
//!
//! ```
//! # use time::Tm;
//! // Jan 1, 2025. 00:00:00 JST (UTC+9)
//! let date = Tm::with_offset(1735657200, 9 * 3600).unwrap();
//! assert_eq!(date, Tm {
//! 	sec: 0,
//! 	min: 0,
//! 	hour: 0,
//! 	day: 1,
//! 	mon: 1,
//! 	year: 2025,
//! 	wday: 3,
//! 	yday: 1
//! });
//! ```

#![no_std]

pub mod time;

pub use time::*;
