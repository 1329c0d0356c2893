#![warn(clippy::pedantic)]

use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};

pub mod error;
pub mod event;
pub mod schedule;
pub mod week;

pub use error::{Error, Location, Result};
pub use event::{expand, CalendarEvent, ExpandOptions, Recurrence};
pub use schedule::{extract, Activity, Course, MeetingSlot, Schedule, TimeRange};
pub use week::{WeekRange, WeekTokenError};

pub const DEFAULT_CALENDAR_NAME: &str = "Skema";

#[must_use]
pub fn create_calendar(events: &[CalendarEvent], name: &str) -> Calendar {
	let mut calendar = Calendar::new();

	calendar.name(name);

	for item in events {
		let mut event = Event::new();

		event
			.summary(&item.summary)
			.starts(CalendarDateTime::Floating(item.start))
			.ends(CalendarDateTime::Floating(item.end))
			.location(&item.location)
			.add_property("RRULE", item.recurrence.rule().to_string());

		calendar.push(event);
	}

	calendar
}
