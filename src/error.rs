//! Error types used across modules.
//!
//! The transmission path itself never fails: it logs and carries on. These errors only come from
//! getting the GPIO lines ready before the first frame.

use std::{error, fmt};

/// The error type for preparing GPIO lines.
#[cfg_attr(test, derive(PartialEq))]
pub enum SetupError {
	/// The line could not be exported through sysfs. The line number and the underlying error
	/// message are provided in the payload.
	Export(u64, String),
	/// The line direction could not be set. The line number and the underlying error message are
	/// provided in the payload.
	Direction(u64, String),
	/// The output line could not be driven to its idle level. The underlying error message is
	/// provided in the payload.
	IdleLevel(String)
}

impl fmt::Display for SetupError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SetupError::Export(n, e) => write!(f, "Failed to export GPIO {}: {}", n, e),
			SetupError::Direction(n, e) => write!(f, "Failed to set direction of GPIO {}: {}", n, e),
			SetupError::IdleLevel(e) => write!(f, "Failed to drive output line high: {}", e)
		}
	}
}

impl fmt::Debug for SetupError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl error::Error for SetupError {}
