//! Send JJY frames on a GPIO line, once per minute, until the receiver reports it is set.
//!
//! The pieces, from the bottom up:
//! - [`clock`]: the wall clock, read as calendar time at a fixed UTC offset.
//! - [`sync`]: blocking until the top of the minute.
//! - [`transmit`]: pulsing one frame onto an output pin with millisecond timing.
//! - [`sender`]: the per-minute loop, and running it on a background thread.
//! - [`pin`]: sysfs GPIO lines and stand-ins for running without hardware.
//!
//! Frame encoding lives in the [`jjy`] crate.

pub mod clock;
pub mod error;
pub mod pin;
pub mod sender;
pub mod sync;
pub mod transmit;
