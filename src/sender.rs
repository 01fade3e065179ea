//! The transmission loop and its lifecycle.
//!
//! A [`Station`] owns everything needed to send frames: the wall clock, the minute synchronizer,
//! the transmitter and the external signal line. Each pass waits for the top of the minute,
//! encodes the time read right after waking, sends it, then checks the signal line. A high line
//! means the receiver has what it needs and the loop ends.
//!
//! [`Sender`] runs a [`Transmission`] on its own thread and allows at most one run at a time.

use std::num::NonZero;
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use embedded_hal::digital::{InputPin, OutputPin};
use jjy::{encode, TimeSnapshot};
use tracing::{debug, info, warn};

use crate::clock::WallClock;
use crate::sync::{MinuteSync, OneShot};
use crate::transmit::{Ticker, Transmitter};

/// Work that [`Sender`] runs on a background thread.
pub trait Transmission: Send + 'static {
	/// Run to completion.
	fn run(&mut self);
}

/// Sends one frame per minute until the signal line goes high.
pub struct Station<C, T, P, K, I> {
	clock: C,
	sync: MinuteSync<T>,
	transmitter: Transmitter<P, K>,
	signal: I,
	limit: Option<NonZero<usize>>
}

#[inline(always)]
fn level(high: bool) -> &'static str {
	if high { "HIGH" } else { "LOW" }
}

impl<C, T, P, K, I> Station<C, T, P, K, I>
where C: WallClock, T: OneShot, P: OutputPin, K: Ticker, I: InputPin
{
	/// Create a station with no frame limit.
	pub fn new(clock: C, sync: MinuteSync<T>, transmitter: Transmitter<P, K>, signal: I)
		-> Station<C, T, P, K, I>
	{
		Station { clock, sync, transmitter, signal, limit: None }
	}

	/// Stop after `limit` frames even if the signal line stays low.
	pub fn with_limit(mut self, limit: Option<NonZero<usize>>) -> Station<C, T, P, K, I> {
		self.limit = limit;
		self
	}

	/// Read the signal line. A failed read counts as low, so sending carries on.
	fn signal_high(&mut self) -> bool {
		match self.signal.is_high() {
			Ok(high) => high,
			Err(e) => {
				warn!(error = ?e, "Failed to read signal line, treating it as low");
				false
			}
		}
	}

	/// Time to encode, read fresh after the minute boundary.
	fn snapshot(&self) -> TimeSnapshot {
		if !self.clock.looks_set() {
			warn!("Wall clock does not look set, sending it anyway");
		}
		match self.clock.now() {
			Some(tm) => {
				info!(
					"Sending {:04}-{:02}-{:02} {:02}:{:02} weekday {}",
					tm.year, tm.mon, tm.day, tm.hour, tm.min, tm.wday
				);
				TimeSnapshot::from(&tm)
			},
			None => {
				warn!("Failed to read the wall clock, sending an empty time");
				TimeSnapshot::default()
			}
		}
	}

	/// Send frames until the signal line reads high or the limit is reached. Returns the number of
	/// frames sent.
	pub fn send_until_signal(&mut self) -> usize {
		let mut sent = 0;
		loop {
			let high = self.signal_high();
			info!(iteration = sent + 1, signal = level(high), "Waiting for next minute");

			let wake = self.sync.wait_next_minute(&self.clock);
			debug!(?wake, "Minute boundary");

			let frame = encode(&self.snapshot());
			debug!(%frame, "Encoded");
			let report = self.transmitter.transmit(&frame);
			sent += 1;
			info!(
				max_late_ms = report.max_late_ms,
				pin_errors = report.pin_errors,
				"Frame {} sent",
				sent
			);

			let high = self.signal_high();
			if high {
				info!(signal = level(high), "Signal line high, receiver is synchronized");
				break;
			}
			if self.limit.is_some_and(|n| sent >= n.get()) {
				info!(signal = level(high), "Frame limit reached");
				break;
			}
			debug!(signal = level(high), "Signal line still low, sending again");
		}
		sent
	}
}

impl<C, T, P, K, I> Transmission for Station<C, T, P, K, I>
where
	C: WallClock + Send + 'static,
	T: OneShot + Send + 'static,
	P: OutputPin + Send + 'static,
	K: Ticker + Send + 'static,
	I: InputPin + Send + 'static
{
	fn run(&mut self) {
		self.send_until_signal();
	}
}

/// Flags shared between a [`Sender`] and its thread.
#[derive(Debug, Default)]
struct Lifecycle {
	running: AtomicBool,
	done: AtomicBool
}

/// Marks a run finished when dropped, including when the run panics.
struct Finish(Arc<Lifecycle>);

impl Drop for Finish {
	fn drop(&mut self) {
		// Free the slot before reporting done, so a start that follows `is_done` succeeds
		self.0.running.store(false, Ordering::Release);
		self.0.done.store(true, Ordering::Release);
	}
}

/// Runs a [`Transmission`] on a background thread, one run at a time.
pub struct Sender<S> {
	station: Arc<Mutex<S>>,
	lifecycle: Arc<Lifecycle>,
	handle: Mutex<Option<JoinHandle<()>>>
}

impl<S: Transmission> Sender<S> {
	/// Wrap `station`, ready to [`start`](Sender::start).
	pub fn new(station: S) -> Sender<S> {
		Sender {
			station: Arc::new(Mutex::new(station)),
			lifecycle: Arc::new(Lifecycle::default()),
			handle: Mutex::new(None)
		}
	}

	/// Start a run in the background.
	///
	/// Returns `false` without doing anything if a run is already in progress, or if the thread
	/// could not be spawned. Starting clears the done flag.
	pub fn start(&self) -> bool {
		if self.lifecycle.running
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			debug!("Transmission already running");
			return false;
		}
		self.lifecycle.done.store(false, Ordering::Release);

		let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
		let station = self.station.clone();
		let lifecycle = self.lifecycle.clone();
		let spawned = thread::Builder::new()
			.name(String::from("jjy-send"))
			.spawn(move || {
				let _finish = Finish(lifecycle);
				station.lock().unwrap_or_else(PoisonError::into_inner).run();
			});

		match spawned {
			Ok(h) => {
				*handle = Some(h);
				true
			},
			Err(e) => {
				warn!(error = %e, "Failed to spawn transmission thread");
				self.lifecycle.running.store(false, Ordering::Release);
				false
			}
		}
	}

	/// Whether the last run has finished. Stays set until [`Sender::clear_done`] or the next start.
	pub fn is_done(&self) -> bool {
		self.lifecycle.done.load(Ordering::Acquire)
	}

	/// Reset the done flag.
	pub fn clear_done(&self) {
		self.lifecycle.done.store(false, Ordering::Release);
	}

	/// Whether a run is in progress.
	pub fn is_running(&self) -> bool {
		self.lifecycle.running.load(Ordering::Acquire)
	}

	/// Block until the current run, if any, has finished.
	pub fn join(&self) {
		let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
		if let Some(handle) = handle {
			if handle.join().is_err() {
				warn!("Transmission thread panicked");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Barrier;
	use std::sync::mpsc::{channel, Receiver, Sender as ChannelSender};
	use embedded_hal::digital::{ErrorKind, ErrorType};
	use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
	use jjy::Frame;
	use time::Tm;
	use crate::clock::tests::FixedClock;
	use crate::sync::ThreadTimer;
	use crate::transmit::tests::{RecordingPin, VirtualTicker};

	/// 2025-01-01 00:00:00, a Wednesday.
	const NEW_YEAR: Tm = Tm { sec: 0, min: 0, hour: 0, day: 1, mon: 1, year: 2025, wday: 3, yday: 1 };

	type TestStation<I> = Station<FixedClock, ThreadTimer, RecordingPin, VirtualTicker, I>;

	fn station<I: InputPin>(clock: FixedClock, signal: I) -> (TestStation<I>, RecordingPin) {
		let ticker = VirtualTicker::default();
		let pin = RecordingPin::on(&ticker);
		let transmitter = Transmitter::new(pin.clone(), ticker).unwrap();
		(Station::new(clock, MinuteSync::new(ThreadTimer), transmitter, signal), pin)
	}

	/// Signal line reads low before each wait, then `after` once per frame.
	fn signal_line(after: &[State]) -> PinMock {
		let expectations: Vec<_> = after.iter()
			.flat_map(|&state| [PinTransaction::get(State::Low), PinTransaction::get(state)])
			.collect();
		PinMock::new(&expectations)
	}

	/// Signal line that cannot be read.
	struct BrokenLine;

	impl ErrorType for BrokenLine {
		type Error = ErrorKind;
	}

	impl InputPin for BrokenLine {
		fn is_high(&mut self) -> Result<bool, Self::Error> {
			Err(ErrorKind::Other)
		}

		fn is_low(&mut self) -> Result<bool, Self::Error> {
			Err(ErrorKind::Other)
		}
	}

	/// Blocks its run until told to finish.
	struct Gate(Receiver<()>);

	impl Transmission for Gate {
		fn run(&mut self) {
			let _ = self.0.recv();
		}
	}

	fn gate() -> (Gate, ChannelSender<()>) {
		let (tx, rx) = channel();
		(Gate(rx), tx)
	}

	struct Panics;

	impl Transmission for Panics {
		fn run(&mut self) {
			panic!("transmission failed");
		}
	}

	#[test]
	fn stop_on_signal_test() {
		let signal = signal_line(&[State::Low, State::High]);
		let (mut station, pin) = station(FixedClock::at(NEW_YEAR), signal.clone());

		assert_eq!(station.send_until_signal(), 2);

		let frame = encode(&TimeSnapshot::from(&NEW_YEAR));
		let pulses = pin.pulses();
		assert_eq!(pulses.len(), 120);
		for (i, &(_, width)) in pulses.iter().enumerate() {
			assert_eq!(width, frame[i % Frame::LEN].pulse_width().as_millis() as u64);
		}

		let mut signal = signal;
		signal.done();
	}

	#[test]
	fn frame_limit_test() {
		let signal = signal_line(&[State::Low, State::Low, State::Low]);
		let (station, pin) = station(FixedClock::at(NEW_YEAR), signal.clone());
		let mut station = station.with_limit(NonZero::new(3));

		assert_eq!(station.send_until_signal(), 3);
		assert_eq!(pin.pulses().len(), 180);

		let mut signal = signal;
		signal.done();
	}

	#[test]
	fn broken_signal_test() {
		// Unreadable line keeps sending, so only the limit stops it
		let (station, pin) = station(FixedClock::at(NEW_YEAR), BrokenLine);
		let mut station = station.with_limit(NonZero::new(2));
		assert_eq!(station.send_until_signal(), 2);
		assert_eq!(pin.pulses().len(), 120);
	}

	#[test]
	fn broken_clock_test() {
		let signal = signal_line(&[State::High]);
		let (mut station, pin) = station(FixedClock::broken(), signal.clone());
		assert_eq!(station.send_until_signal(), 1);

		let frame = encode(&TimeSnapshot::default());
		let widths: Vec<u64> = pin.pulses().iter().map(|&(_, w)| w).collect();
		let expected: Vec<u64> = frame.iter().map(|s| s.pulse_width().as_millis() as u64).collect();
		assert_eq!(widths, expected);

		let mut signal = signal;
		signal.done();
	}

	#[test]
	fn single_run_test() {
		let (gate, tx) = gate();
		let sender = Sender::new(gate);
		assert!(!sender.is_running());
		assert!(!sender.is_done());

		assert!(sender.start());
		assert!(sender.is_running());
		// Rejected, not queued
		assert!(!sender.start());
		assert!(sender.is_running());
		assert!(!sender.is_done());

		tx.send(()).unwrap();
		sender.join();
		assert!(sender.is_done());
		assert!(!sender.is_running());

		sender.clear_done();
		assert!(!sender.is_done());

		// Startable again once finished
		assert!(sender.start());
		tx.send(()).unwrap();
		sender.join();
		assert!(sender.is_done());
		assert!(!sender.is_running());
	}

	#[test]
	fn start_clears_done_test() {
		let (gate, tx) = gate();
		let sender = Sender::new(gate);
		assert!(sender.start());
		tx.send(()).unwrap();
		sender.join();
		assert!(sender.is_done());

		assert!(sender.start());
		assert!(!sender.is_done());
		tx.send(()).unwrap();
		sender.join();
	}

	#[test]
	fn panic_test() {
		let sender = Sender::new(Panics);
		assert!(sender.start());
		sender.join();
		assert!(sender.is_done());
		assert!(!sender.is_running());

		// Poisoned station lock does not block the next run
		assert!(sender.start());
		sender.join();
		assert!(sender.is_done());
	}

	#[test]
	fn concurrent_start_test() {
		const THREADS: usize = 8;
		let (gate, tx) = gate();
		let sender = Arc::new(Sender::new(gate));
		let barrier = Arc::new(Barrier::new(THREADS));

		let starters: Vec<_> = (0..THREADS)
			.map(|_| {
				let sender = sender.clone();
				let barrier = barrier.clone();
				thread::spawn(move || {
					barrier.wait();
					sender.start()
				})
			})
			.collect();
		let started = starters.into_iter()
			.map(|h| h.join().unwrap())
			.filter(|&s| s)
			.count();

		assert_eq!(started, 1);
		assert!(sender.is_running());
		assert!(!sender.is_done());

		tx.send(()).unwrap();
		sender.join();
		assert!(sender.is_done());
		assert!(!sender.is_running());
	}

	#[test]
	fn restart_after_done_test() {
		let (gate, tx) = gate();
		let sender = Sender::new(gate);
		assert!(sender.start());
		for i in 0..50 {
			tx.send(()).unwrap();
			// Poll instead of joining, so start follows is_done directly
			while !sender.is_done() {
				thread::yield_now();
			}
			assert!(sender.start(), "restart {} rejected", i);
		}
		tx.send(()).unwrap();
		sender.join();
		assert!(sender.is_done());
	}

	#[test]
	fn join_idle_test() {
		let (gate, _tx) = gate();
		let sender = Sender::new(gate);
		sender.join();
		assert!(!sender.is_done());
	}

	#[test]
	fn background_station_test() {
		let signal = signal_line(&[State::High]);
		let (station, pin) = station(FixedClock::at(NEW_YEAR), signal.clone());
		let sender = Sender::new(station);

		assert!(sender.start());
		sender.join();
		assert!(sender.is_done());
		assert!(!sender.is_running());
		assert_eq!(pin.pulses().len(), 60);

		let mut signal = signal;
		signal.done();
	}
}
