use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, trace};

use crate::{
	error::{Error, Location, Result},
	schedule::{MeetingSlot, Schedule},
	week::WeekRange,
};

pub const DANISH_WEEKDAYS: [&str; 7] = [
	"Mandag", "Tirsdag", "Onsdag", "Torsdag", "Fredag", "Lørdag", "Søndag",
];

/// Minutes past the hour a session starts with academic timing.
pub const ACADEMIC_QUARTER: u32 = 15;

/// Highest week number of the Monday-first week-of-year numbering.
const LAST_WEEK: u32 = 53;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandOptions {
	/// Start sessions a quarter past the hour.
	pub academic_timing: bool,
	/// Year the week numbers are placed in.
	pub year: i32,
	/// Weekday names as written in the timetable, Monday first.
	pub weekdays: [String; 7],
}

impl Default for ExpandOptions {
	fn default() -> Self {
		Self {
			academic_timing: true,
			year: Local::now().year(),
			weekdays: DANISH_WEEKDAYS.map(String::from),
		}
	}
}

impl ExpandOptions {
	#[must_use]
	pub fn with_year(mut self, year: i32) -> Self {
		self.year = year;
		self
	}

	#[must_use]
	pub fn with_academic_timing(mut self, academic_timing: bool) -> Self {
		self.academic_timing = academic_timing;
		self
	}

	#[must_use]
	pub fn with_weekdays(mut self, weekdays: [String; 7]) -> Self {
		self.weekdays = weekdays;
		self
	}

	fn start_minute(&self) -> u32 {
		if self.academic_timing {
			ACADEMIC_QUARTER
		} else {
			0
		}
	}
}

/// Weekly repetition with an interval of one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
	/// Total number of occurrences, the first one included.
	pub count: u32,
}

impl Recurrence {
	#[must_use]
	pub const fn frequency(self) -> rrule::Frequency {
		rrule::Frequency::Weekly
	}

	#[must_use]
	pub const fn interval(self) -> u16 {
		1
	}

	#[must_use]
	pub fn rule(self) -> rrule::RRule<rrule::Unvalidated> {
		rrule::RRule::new(self.frequency())
			.interval(self.interval())
			.count(self.count)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
	pub summary: String,
	/// First occurrence, in local time.
	pub start: NaiveDateTime,
	pub end: NaiveDateTime,
	pub recurrence: Recurrence,
	pub location: String,
}

/// Date of `weekday` (0 = Monday) in `week` of `year`, where week 1 starts
/// on the year's first Monday and week 0 holds the days before it.
///
/// Week 0 is counted from January 1st, so in a year starting on a Monday it
/// gives the same dates as week 1.
fn week_date(year: i32, week: u32, weekday: u32) -> Option<NaiveDate> {
	let jan_1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
	let jan_1_weekday = jan_1.weekday().num_days_from_monday();

	if week == 0 {
		return jan_1
			.checked_add_signed(Duration::days(i64::from(weekday) - i64::from(jan_1_weekday)));
	}

	let first_monday = jan_1 + Duration::days(i64::from((7 - jan_1_weekday) % 7));

	first_monday
		.checked_add_signed(Duration::weeks(i64::from(week) - 1))?
		.checked_add_signed(Duration::days(i64::from(weekday)))
}

fn at(date: NaiveDate, hour: u32, minute: u32, location: &Location) -> Result<NaiveDateTime> {
	NaiveTime::from_hms_opt(hour, minute, 0)
		.map(|time| date.and_time(time))
		.ok_or_else(|| Error::InvalidHour {
			location: location.clone(),
			hour,
		})
}

fn expand_range(
	summary: &str,
	slot: &MeetingSlot,
	weekday: u32,
	range: WeekRange,
	options: &ExpandOptions,
	location: &Location,
) -> Result<CalendarEvent> {
	// the timetable's week numbers run one ahead of the week-of-year numbering
	let week = range.start - 1;
	let out_of_range = || Error::DateOutOfRange {
		location: location.clone(),
		year: options.year,
		week: range.start,
	};

	if week > LAST_WEEK {
		return Err(out_of_range());
	}
	let date = week_date(options.year, week, weekday).ok_or_else(out_of_range)?;

	let event = CalendarEvent {
		summary: summary.to_string(),
		start: at(date, slot.time.start, options.start_minute(), location)?,
		end: at(date, slot.time.end, 0, location)?,
		recurrence: Recurrence {
			count: range.count(),
		},
		location: slot.place.clone(),
	};

	trace!(
		summary,
		weeks = %range,
		start = %event.start,
		count = event.recurrence.count,
		"expanded week range"
	);

	Ok(event)
}

/// Turns every week range of every meeting slot into one recurring event.
///
/// # Errors
///
/// Fails on a weekday name missing from [`ExpandOptions::weekdays`], or when
/// a week or hour cannot be placed on the calendar.
pub fn expand(schedule: &Schedule, options: &ExpandOptions) -> Result<Vec<CalendarEvent>> {
	let mut events = Vec::new();

	for course in &schedule.courses {
		for activity in &course.activities {
			let summary = format!("{} ({})", course.name, activity.name);

			for (i, slot) in activity.slots.iter().enumerate() {
				let location = Location::course(&course.name)
					.activity(&activity.name)
					.row(i + 1);

				let weekday = (0u32..)
					.zip(&options.weekdays)
					.find_map(|(i, day)| (*day == slot.day).then_some(i))
					.ok_or_else(|| Error::UnknownWeekday {
						location: location.clone(),
						day: slot.day.clone(),
					})?;

				for range in &slot.weeks {
					events.push(expand_range(
						&summary, slot, weekday, *range, options, &location,
					)?);
				}
			}
		}
	}

	debug!(
		events = events.len(),
		year = options.year,
		academic_timing = options.academic_timing,
		"expanded schedule"
	);

	Ok(events)
}
