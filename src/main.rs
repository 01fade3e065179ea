//! Emulate the [JJY] longwave time signal on a GPIO line.
//!
//! Radio-controlled clock movements usually pair a JJY receiver module with the clock's own
//! controller. Replacing the receiver's output line with a GPIO lets the controller be set from a
//! host's system clock instead of the radio. Once per minute, on the minute, the current time is
//! encoded as a 60 second JJY frame and pulsed out: the line idles high and is pulled low at the
//! start of every second for 200 ms (marker), 500 ms (one) or 800 ms (zero).
//!
//! Sending repeats every minute until the external signal line (the receiver's power-on line,
//! which the controller drops once it has the time) reads high after a frame.
//!
//! [JJY]: https://en.wikipedia.org/wiki/JJY
//!
//! # Command Line Arguments
//!
//! General form: `jjysender [options...]`
//!
//! | Short form | Long form      | Argument         | Default | Description                          |
//! | ---------- | -------------- | ---------------- | ------- | ------------------------------------ |
//! | `-p`       | `--pin`        | sysfs GPIO       | 3       | The output line                      |
//! | `-s`       | `--signal-pin` | sysfs GPIO       | 4       | The external signal line             |
//! | `-z`       | `--utc-offset` | `±HH[:MM]`       | +08:00  | The offset of the transmitted time   |
//! |            | `--slack`      | Milliseconds     | 10      | How long to poll before each edge    |
//! | `-n`       | `--count`      | Integer > 0      | None    | Stop after this many frames          |
//! |            | `--dry-run`    |                  |         | Log pulses instead of driving GPIO   |
//! | `-v`       | `--verbose`    |                  |         | Log every frame and pulse            |
//!
//! The system clock is trusted as is. Nothing checks that it has been synchronized, though a
//! warning is logged when it obviously has not been set.
//!
//! # Examples
//!
//! Send on GPIO 17 until the receiver's line on GPIO 27 goes high
//! ```sh
//! jjysender -p 17 -s 27
//! ```
//!
//! Try it out without hardware for three minutes
//! ```sh
//! jjysender --dry-run -n 3 -v
//! ```

use std::process::ExitCode;
use embedded_hal::digital::{InputPin, OutputPin};
use tracing::{error, info, warn, Level};

use jjysender::clock::{SystemClock, WallClock};
use jjysender::error::SetupError;
use jjysender::pin::{self, DryRunPin, QuietLine};
use jjysender::sender::{Sender, Station};
use jjysender::sync::{MinuteSync, ThreadTimer};
use jjysender::transmit::{SpinSleep, Transmitter};

use args::{Arguments, ArgumentsError};

mod args;

/// Send frames on `pin` until `signal` goes high, blocking until done.
///
/// # Errors
///
/// Returns [`SetupError::IdleLevel`] if `pin` cannot be driven to its idle level.
fn send<P, I>(args: &Arguments, pin: P, signal: I) -> Result<ExitCode, SetupError>
where
	P: OutputPin + Send + 'static,
	I: InputPin + Send + 'static
{
	let clock = SystemClock::new(args.utc_offset);
	if !clock.looks_set() {
		warn!("System clock does not look set, frames will carry the wrong time");
	}

	let transmitter = Transmitter::new(pin, SpinSleep::new(args.slack))
		.map_err(|e| SetupError::IdleLevel(format!("{:?}", e)))?;
	let station = Station::new(clock, MinuteSync::new(ThreadTimer), transmitter, signal)
		.with_limit(args.count);

	let sender = Sender::new(station);
	if !sender.start() {
		error!("Failed to start sending");
		return Ok(ExitCode::FAILURE);
	}
	sender.join();
	info!(done = sender.is_done(), running = sender.is_running(), "Stopped sending");

	Ok(ExitCode::SUCCESS)
}

/// Open the configured lines and send.
fn run(args: Arguments) -> Result<ExitCode, SetupError> {
	info!(
		pin = args.pin,
		signal_pin = args.signal_pin,
		utc_offset = args.utc_offset,
		slack_ms = args.slack.as_millis() as u64,
		dry_run = args.dry_run,
		"Starting jjysender"
	);

	if args.dry_run {
		send(&args, DryRunPin::new(), QuietLine)
	} else {
		let pin = pin::output(args.pin)?;
		let signal = pin::input(args.signal_pin)?;
		send(&args, pin, signal)
	}
}

/// Main program entry point.
///
/// Parses input arguments and sends JJY frames. See [`crate`] documentation for details.
fn main() -> ExitCode {
	let args = match Arguments::parse(std::env::args_os().skip(1)) {
		Ok(a) => a,
		Err(e) => {
			return if let ArgumentsError::Help = e {
				println!("\
Emulate the JJY time signal on a GPIO line.

Usage: jjysender [OPTIONS]

Options:
  -p, --pin <GPIO>             the output line, default 3
  -s, --signal-pin <GPIO>      the external signal line, default 4
  -z, --utc-offset <+HH[:MM]>  the offset of the transmitted time, default +08:00
  --slack <MS>                 how long to poll before each edge, default 10
  -n, --count <COUNT>          stop after this many frames, default no limit
  --dry-run                    log pulses instead of driving GPIO
  -v, --verbose                log every frame and pulse
  -h, --help                   print this help

Examples:
  jjysender -p 17 -s 27
  jjysender -z +09:00 -n 10
  jjysender --dry-run -n 3 -v\n");
				ExitCode::SUCCESS
			} else {
				eprintln!("{}", e);
				ExitCode::FAILURE
			}
		}
	};

	tracing_subscriber::fmt()
		.with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
		.with_thread_names(true)
		.init();

	run(args)
		.inspect_err(|e| error!("{}", e))
		.unwrap_or(ExitCode::FAILURE)
}
