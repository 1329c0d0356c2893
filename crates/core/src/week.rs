use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekTokenError {
	#[error("expected a week number or a `start-end` range")]
	Syntax,
	#[error("week numbers start at 1")]
	Zero,
	#[error("range ends (week {end}) before it starts (week {start})")]
	Inverted { start: u32, end: u32 },
}

/// An inclusive run of academic weeks, e.g. `10-13` or `7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
	pub start: u32,
	pub end: u32,
}

impl WeekRange {
	/// Number of weekly occurrences covered by the range.
	#[must_use]
	pub fn count(self) -> u32 {
		self.end - self.start + 1
	}
}

impl fmt::Display for WeekRange {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		if self.start == self.end {
			write!(f, "{}", self.start)
		} else {
			write!(f, "{}-{}", self.start, self.end)
		}
	}
}

fn parse_week(s: &str) -> Result<u32, WeekTokenError> {
	if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
		return Err(WeekTokenError::Syntax);
	}

	match s.parse() {
		Ok(0) => Err(WeekTokenError::Zero),
		Ok(week) => Ok(week),
		Err(_) => Err(WeekTokenError::Syntax),
	}
}

impl FromStr for WeekRange {
	type Err = WeekTokenError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// tokens are comma separated in the page, so the last one may keep it
		let s = s.strip_suffix(',').unwrap_or(s);

		let (start, end) = match s.split_once('-') {
			Some((start, end)) => (parse_week(start)?, parse_week(end)?),
			None => {
				let week = parse_week(s)?;
				(week, week)
			}
		};

		if end < start {
			return Err(WeekTokenError::Inverted { start, end });
		}

		Ok(Self { start, end })
	}
}
