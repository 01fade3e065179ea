//! Support for command line argument parsing.
//!
//! See [crate] documentation for details on command line arguments and examples.

use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Debug};
use std::num::NonZero;
use std::time::Duration;

use jjysender::clock::SystemClock;
use jjysender::transmit::SpinSleep;

/// Default output line.
const DEFAULT_PIN: u64 = 3;
/// Default external signal line.
const DEFAULT_SIGNAL_PIN: u64 = 4;
/// Largest accepted UTC offset, in hours.
const MAX_OFFSET_HOURS: i32 = 14;

/// The error type for parsing command line arguments.
#[cfg_attr(test, derive(PartialEq))]
pub enum ArgumentsError {
	/// The option was unrecognized. The option is returned as the payload of this variant.
	UnrecognizedOption(String),
	/// A positional argument was supplied, but none are accepted. The argument is returned as the
	/// payload of this variant.
	UnexpectedArgument(String),
	/// Error converting an option or parameter to UTF-8. The argument index and original
	/// [`OsString`] that could not be converted are returned as the payload of this variant.
	InvalidUTF8(usize, OsString),
	/// The provided GPIO line number was invalid. The supplied argument is returned as the payload
	/// of this variant.
	InvalidPin(String),
	/// The provided UTC offset was invalid. The supplied argument is returned as the payload of this
	/// variant.
	InvalidOffset(String),
	/// The provided slack was invalid. The supplied argument is returned as the payload of this
	/// variant.
	InvalidSlack(String),
	/// The provided frame count was invalid. The supplied argument is returned as the payload of
	/// this variant.
	InvalidCount(String),
	/// The parameter for an option was not supplied. The option is returned as the payload for this
	/// variant.
	MissingParameter(String),
	/// Help option (-h) was included, so print help details and exit.
	Help
}

impl Display for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ArgumentsError::UnrecognizedOption(s) => write!(f, "Unrecognized option: {}", s),
			ArgumentsError::UnexpectedArgument(s) => write!(f, "Unexpected argument: {}", s),
			ArgumentsError::InvalidUTF8(i, v) => write!(f, "Invalid UTF-8 in argument {}: {:?}", i, v),
			ArgumentsError::InvalidPin(s) => write!(f, "Invalid GPIO line: {}", s),
			ArgumentsError::InvalidOffset(s) => write!(f, "Invalid UTC offset: {}", s),
			ArgumentsError::InvalidSlack(s) => write!(f, "Invalid slack: {}", s),
			ArgumentsError::InvalidCount(s) => write!(f, "Invalid count: {}", s),
			ArgumentsError::MissingParameter(s) => write!(f, "Missing parameter for option {}", s),
			ArgumentsError::Help => write!(f, "Help requested")
		}
	}
}

impl Debug for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}

impl Error for ArgumentsError {}

/// Convert an argument to [`&str`].
///
/// The function takes the argument index `i`, optional argument name `a`, and the argument `s`.
///
/// # Errors
///
/// Returns [`ArgumentsError::InvalidUTF8`] if the argument could not be converted to UTF-8 or
/// [`ArgumentsError::MissingParameter`] if the argument is `None`.
fn arg_to_str<'a, 'b>(i: usize, a: Option<&'a str>, s: Option<&'b OsString>)
	-> Result<&'b str, ArgumentsError>
{
	match s {
		Some(v) => v.to_str().ok_or_else(|| ArgumentsError::InvalidUTF8(i, v.clone())),
		None => Err(ArgumentsError::MissingParameter(a.map(String::from).unwrap_or_default()))
	}
}

/// Parse a run of one or two ASCII digits.
fn digits(s: &str) -> Option<i32> {
	if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	s.parse().ok()
}

/// Parse a UTC offset of the form `±HH[:MM]` into seconds east of UTC.
///
/// The sign may be left off for positive offsets. Offsets beyond ±14 hours are rejected.
///
/// # Examples
///
/// ```
/// assert_eq!(parse_offset("+09:00"), Some(32400));
/// assert_eq!(parse_offset("-5"), Some(-18000));
/// assert_eq!(parse_offset("+5:75"), None);
/// ```
fn parse_offset(s: &str) -> Option<i32> {
	let (sign, rest) = match s.as_bytes().first()? {
		b'+' => (1, &s[1..]),
		b'-' => (-1, &s[1..]),
		_ => (1, s)
	};
	let (hours, minutes) = match rest.split_once(':') {
		Some((h, m)) => (digits(h)?, digits(m)?),
		None => (digits(rest)?, 0)
	};
	if hours > MAX_OFFSET_HOURS || minutes > 59 || (hours == MAX_OFFSET_HOURS && minutes > 0) {
		return None;
	}
	Some(sign * (hours * 3600 + minutes * 60))
}

/// Parsed command line arguments.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Arguments {
	/// The output GPIO line.
	pub pin: u64,
	/// The external signal GPIO line.
	pub signal_pin: u64,
	/// Offset of the transmitted time from UTC, in seconds.
	pub utc_offset: i32,
	/// How long before each edge to stop sleeping and start polling.
	pub slack: Duration,
	/// The number of frames after which to stop (if provided).
	pub count: Option<NonZero<usize>>,
	/// Log pulses instead of driving GPIO.
	pub dry_run: bool,
	/// Enable debug logging.
	pub verbose: bool
}

impl Default for Arguments {
	fn default() -> Self {
		Arguments {
			pin: DEFAULT_PIN,
			signal_pin: DEFAULT_SIGNAL_PIN,
			utc_offset: SystemClock::DEFAULT_OFFSET,
			slack: SpinSleep::DEFAULT_SLACK,
			count: None,
			dry_run: false,
			verbose: false
		}
	}
}

impl Arguments {
	/// Parse command line arguments.
	///
	/// The input can be any type that implements [`Iterator`] that yields [`OsString`], though
	/// typically this would be [`std::env::args_os`]. This function assumes that the application
	/// name is **not** supplied as the first item yielded by `args`.
	///
	/// # Errors
	///
	/// This function can return any of the variants in [`ArgumentsError`]. See that documentation
	/// for more details.
	pub fn parse(mut args: impl Iterator<Item = OsString>) -> Result<Arguments, ArgumentsError>
	{
		let mut parsed = Arguments::default();
		let mut arg = args.next();
		let mut i = 0;
		loop {
			if arg.is_none() { break; }
			match arg_to_str(i, None, arg.as_ref())? {
				p @ ("-p" | "--pin" | "-s" | "--signal-pin") => {
					let n = arg_to_str(i+1, Some(p), args.next().as_ref())
						.and_then(|v| v.parse().map_err(|_| ArgumentsError::InvalidPin(v.to_string())))?;
					if p == "-p" || p == "--pin" {
						parsed.pin = n;
					} else {
						parsed.signal_pin = n;
					}
					// Increment because we called args.next()
					i += 1;
				},
				z @ ("-z" | "--utc-offset") => {
					parsed.utc_offset = arg_to_str(i+1, Some(z), args.next().as_ref())
						.and_then(|v| parse_offset(v).ok_or_else(|| ArgumentsError::InvalidOffset(v.to_string())))?;
					i += 1;
				},
				"--slack" => {
					parsed.slack = arg_to_str(i+1, Some("--slack"), args.next().as_ref())
						.and_then(|v| v.parse::<u16>()
							.map(|ms| Duration::from_millis(u64::from(ms)))
							.map_err(|_| ArgumentsError::InvalidSlack(v.to_string())))?;
					i += 1;
				},
				n @ ("-n" | "--count") => {
					parsed.count = Some(
						arg_to_str(i+1, Some(n), args.next().as_ref())
						.and_then(
							|v| v.parse().map_err(|_| ArgumentsError::InvalidCount(v.to_string()))
						)?
					);
					i += 1;
				},
				"--dry-run" => parsed.dry_run = true,
				"-v" | "--verbose" => parsed.verbose = true,
				"-h" | "--help" => return Err(ArgumentsError::Help),
				v => {
					if v.starts_with('-') {
						return Err(ArgumentsError::UnrecognizedOption(v.to_string()));
					}
					return Err(ArgumentsError::UnexpectedArgument(v.to_string()));
				}
			}
			arg = args.next();
			i += 1;
		}

		Ok(parsed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	fn parse(args: &[&str]) -> Result<Arguments, ArgumentsError> {
		Arguments::parse(args.iter().map(OsString::from))
	}

	#[test]
	fn arg_to_str_test() {
		let valid = OsString::from_str("test").unwrap();
		assert_eq!(
			arg_to_str(1, Some("arg"), Some(&valid)),
			Ok("test")
		);
		assert_eq!(
			arg_to_str(1, Some("arg"), None),
			Err(ArgumentsError::MissingParameter(String::from("arg")))
		);

		let invalid = unsafe { OsString::from_encoded_bytes_unchecked(vec![b't', 0xff, b's', b't']) };
		assert_eq!(
			arg_to_str(1, Some("arg"), Some(&invalid)),
			Err(ArgumentsError::InvalidUTF8(1, invalid.clone()))
		);
	}

	#[test]
	fn parse_offset_test() {
		assert_eq!(parse_offset("+09:00"), Some(32400));
		assert_eq!(parse_offset("09:00"), Some(32400));
		assert_eq!(parse_offset("+9"), Some(32400));
		assert_eq!(parse_offset("-05:30"), Some(-19800));
		assert_eq!(parse_offset("0"), Some(0));
		assert_eq!(parse_offset("-0"), Some(0));
		assert_eq!(parse_offset("+14:00"), Some(50400));

		assert_eq!(parse_offset(""), None);
		assert_eq!(parse_offset("+"), None);
		assert_eq!(parse_offset("+14:30"), None);
		assert_eq!(parse_offset("+15"), None);
		assert_eq!(parse_offset("+5:60"), None);
		assert_eq!(parse_offset("+009"), None);
		assert_eq!(parse_offset("++9"), None);
		assert_eq!(parse_offset("+9:"), None);
		assert_eq!(parse_offset("JST"), None);
	}

	#[test]
	fn defaults_test() {
		assert_eq!(
			parse(&[]),
			Ok(Arguments {
				pin: 3,
				signal_pin: 4,
				utc_offset: 8 * 3600,
				slack: Duration::from_millis(10),
				count: None,
				dry_run: false,
				verbose: false
			})
		);
	}

	#[test]
	fn arguments_parse_test() {
		assert_eq!(
			parse(&["-p", "17", "-s", "27", "-z", "-05:00", "--slack", "25", "-n", "5", "--dry-run", "-v"]),
			Ok(Arguments {
				pin: 17,
				signal_pin: 27,
				utc_offset: -5 * 3600,
				slack: Duration::from_millis(25),
				count: NonZero::new(5),
				dry_run: true,
				verbose: true
			})
		);

		assert_eq!(
			parse(&["--pin", "5", "--signal-pin", "6", "--utc-offset", "+01:00", "--count", "2", "--verbose"]),
			Ok(Arguments {
				pin: 5,
				signal_pin: 6,
				utc_offset: 3600,
				count: NonZero::new(2),
				verbose: true,
				..Default::default()
			})
		);

		// Later options win
		assert_eq!(
			parse(&["-p", "5", "-p", "6"]).map(|a| a.pin),
			Ok(6)
		);
	}

	#[test]
	fn arguments_error_test() {
		assert_eq!(parse(&["-p"]), Err(ArgumentsError::MissingParameter(String::from("-p"))));
		assert_eq!(parse(&["--slack"]), Err(ArgumentsError::MissingParameter(String::from("--slack"))));
		assert_eq!(parse(&["-p", "x"]), Err(ArgumentsError::InvalidPin(String::from("x"))));
		assert_eq!(parse(&["-s", "-1"]), Err(ArgumentsError::InvalidPin(String::from("-1"))));
		assert_eq!(parse(&["-z", "JST"]), Err(ArgumentsError::InvalidOffset(String::from("JST"))));
		assert_eq!(parse(&["--slack", "-3"]), Err(ArgumentsError::InvalidSlack(String::from("-3"))));
		assert_eq!(parse(&["--slack", "70000"]), Err(ArgumentsError::InvalidSlack(String::from("70000"))));
		assert_eq!(parse(&["-n", "0"]), Err(ArgumentsError::InvalidCount(String::from("0"))));
		assert_eq!(parse(&["-n", "asd"]), Err(ArgumentsError::InvalidCount(String::from("asd"))));
		assert_eq!(parse(&["--ntp"]), Err(ArgumentsError::UnrecognizedOption(String::from("--ntp"))));
		assert_eq!(parse(&["jjy"]), Err(ArgumentsError::UnexpectedArgument(String::from("jjy"))));
		assert_eq!(parse(&["-v", "-h", "-p", "x"]), Err(ArgumentsError::Help));
		assert_eq!(parse(&["--help"]), Err(ArgumentsError::Help));
	}
}
