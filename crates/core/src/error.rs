use std::{fmt, io};

use thiserror::Error;

use crate::week::WeekTokenError;

/// Where in the timetable a failure was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
	pub course: Option<String>,
	pub activity: Option<String>,
	/// 1-based row inside the activity's table.
	pub row: Option<usize>,
}

impl Location {
	#[must_use]
	pub fn course(name: &str) -> Self {
		Self {
			course: Some(name.to_string()),
			..Self::default()
		}
	}

	#[must_use]
	pub fn activity(mut self, name: &str) -> Self {
		self.activity = Some(name.to_string());
		self
	}

	#[must_use]
	pub fn row(mut self, row: usize) -> Self {
		self.row = Some(row);
		self
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let mut parts = Vec::with_capacity(3);

		if let Some(course) = &self.course {
			parts.push(format!("course {course:?}"));
		}
		if let Some(activity) = &self.activity {
			parts.push(format!("activity {activity:?}"));
		}
		if let Some(row) = self.row {
			parts.push(format!("row {row}"));
		}

		if parts.is_empty() {
			f.write_str("document")
		} else {
			f.write_str(&parts.join(", "))
		}
	}
}

#[derive(Debug, Error)]
pub enum Error {
	/// The markup does not have the heading / label / table shape we expect.
	#[error("malformed document at {location}: {reason}")]
	MalformedDocument { location: Location, reason: String },

	#[error("malformed week token {token:?} at {location}")]
	MalformedWeekToken {
		location: Location,
		token: String,
		#[source]
		source: WeekTokenError,
	},

	#[error("unknown weekday {day:?} at {location}")]
	UnknownWeekday { location: Location, day: String },

	#[error("week {week} of {year} cannot be placed on a calendar date at {location}")]
	DateOutOfRange {
		location: Location,
		year: i32,
		week: u32,
	},

	#[error("hour {hour} is not a time of day at {location}")]
	InvalidHour { location: Location, hour: u32 },

	#[error("failed to read timetable: {0}")]
	Io(#[from] io::Error),
}

impl Error {
	pub(crate) fn malformed(location: Location, reason: impl Into<String>) -> Self {
		Self::MalformedDocument {
			location,
			reason: reason.into(),
		}
	}

	/// Where the failure was found, if it came from the document.
	#[must_use]
	pub fn location(&self) -> Option<&Location> {
		match self {
			Self::MalformedDocument { location, .. }
			| Self::MalformedWeekToken { location, .. }
			| Self::UnknownWeekday { location, .. }
			| Self::DateOutOfRange { location, .. }
			| Self::InvalidHour { location, .. } => Some(location),
			Self::Io(_) => None,
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
