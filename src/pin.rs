//! GPIO lines.
//!
//! On Linux the output and signal lines are sysfs GPIOs. For trying things out without hardware,
//! [`DryRunPin`] logs pulses instead and [`QuietLine`] is a signal line that never goes high.

use std::convert::Infallible;
use std::time::Instant;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use linux_embedded_hal::SysfsPin;
use tracing::debug;

use crate::error::SetupError;

/// Export sysfs GPIO `n` as an output, starting high.
pub fn output(n: u64) -> Result<SysfsPin, SetupError> {
	let pin = SysfsPin::new(n);
	pin.export().map_err(|e| SetupError::Export(n, e.to_string()))?;
	let pin = pin.into_output_pin(PinState::High)
		.map_err(|e| SetupError::Direction(n, e.to_string()))?;
	debug!(gpio = n, "Output line ready");
	Ok(pin)
}

/// Export sysfs GPIO `n` as an input.
pub fn input(n: u64) -> Result<SysfsPin, SetupError> {
	let pin = SysfsPin::new(n);
	pin.export().map_err(|e| SetupError::Export(n, e.to_string()))?;
	let pin = pin.into_input_pin().map_err(|e| SetupError::Direction(n, e.to_string()))?;
	debug!(gpio = n, "Signal line ready");
	Ok(pin)
}

/// An output line that only logs.
#[derive(Debug, Default)]
pub struct DryRunPin {
	/// When the current pulse started, if the line is low.
	low_since: Option<Instant>,
	pulses: u64
}

impl DryRunPin {
	/// A line that starts high with no pulses counted.
	pub fn new() -> DryRunPin {
		DryRunPin::default()
	}

	/// Number of complete pulses so far.
	pub fn pulses(&self) -> u64 {
		self.pulses
	}
}

impl ErrorType for DryRunPin {
	type Error = Infallible;
}

impl OutputPin for DryRunPin {
	fn set_low(&mut self) -> Result<(), Self::Error> {
		if self.low_since.is_none() {
			self.low_since = Some(Instant::now());
		}
		Ok(())
	}

	fn set_high(&mut self) -> Result<(), Self::Error> {
		if let Some(since) = self.low_since.take() {
			self.pulses += 1;
			debug!(pulse = self.pulses, width_ms = since.elapsed().as_millis() as u64, "Pulse");
		}
		Ok(())
	}
}

/// A signal line that always reads low.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuietLine;

impl ErrorType for QuietLine {
	type Error = Infallible;
}

impl InputPin for QuietLine {
	fn is_high(&mut self) -> Result<bool, Self::Error> {
		Ok(false)
	}

	fn is_low(&mut self) -> Result<bool, Self::Error> {
		Ok(true)
	}
}
