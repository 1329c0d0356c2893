#![warn(clippy::pedantic)]

use skema2ics_core::{ExpandOptions, DEFAULT_CALENDAR_NAME};
use wasm_bindgen::{prelude::wasm_bindgen, JsError};

/// Converts timetable HTML into iCalendar text.
///
/// `year` defaults to the current year.
///
/// # Errors
///
/// Returns the conversion failure as a JS error.
#[wasm_bindgen]
pub fn from_html(html: &str, academic_timing: bool, year: Option<i32>) -> Result<String, JsError> {
	let mut options = ExpandOptions::default().with_academic_timing(academic_timing);

	if let Some(year) = year {
		options = options.with_year(year);
	}

	let schedule = skema2ics_core::schedule::parse_from_str(html)?;
	let events = skema2ics_core::expand(&schedule, &options)?;
	let calendar = skema2ics_core::create_calendar(&events, DEFAULT_CALENDAR_NAME);

	Ok(calendar.to_string())
}
