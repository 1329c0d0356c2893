use std::{fs::File, io, iter, path::Path};

use select::{
	document::Document,
	node::Node,
	predicate::Name,
};
use tracing::{debug, trace, warn};

use crate::{
	error::{Error, Location, Result},
	week::WeekRange,
};

/// Tag wrapping a course name.
const HEADING: &str = "h3";
/// Tag wrapping an activity name, followed by the activity's table.
const LABEL: &str = "strong";
const TABLE: &str = "table";

/// `[ignored, day, time, place, weeks]`
const COLUMNS: usize = 5;

/// Whole-hour span of a meeting, e.g. `10 - 12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
	pub start: u32,
	pub end: u32,
}

impl TimeRange {
	fn parse(s: &str) -> Option<Self> {
		let (start, end) = s.split_once('-')?;

		Some(Self {
			start: start.trim().parse().ok()?,
			end: end.trim().parse().ok()?,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingSlot {
	/// Weekday name as written in the timetable.
	pub day: String,
	pub time: TimeRange,
	pub place: String,
	pub weeks: Vec<WeekRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
	pub name: String,
	pub slots: Vec<MeetingSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
	pub name: String,
	pub activities: Vec<Activity>,
}

impl Course {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			activities: Vec::new(),
		}
	}

	/// Adds an activity, replacing one with the same name in place.
	pub fn insert(&mut self, activity: Activity) {
		match self.activities.iter_mut().find(|a| a.name == activity.name) {
			Some(existing) => *existing = activity,
			None => self.activities.push(activity),
		}
	}

	#[must_use]
	pub fn get(&self, activity: &str) -> Option<&Activity> {
		self.activities.iter().find(|a| a.name == activity)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
	pub courses: Vec<Course>,
}

impl Schedule {
	/// Adds a course, replacing one with the same name in place.
	pub fn insert(&mut self, course: Course) {
		match self.courses.iter_mut().find(|c| c.name == course.name) {
			Some(existing) => *existing = course,
			None => self.courses.push(course),
		}
	}

	#[must_use]
	pub fn get(&self, course: &str) -> Option<&Course> {
		self.courses.iter().find(|c| c.name == course)
	}

	/// Iterates `(course, activity, slot)` in document order.
	pub fn slots(&self) -> impl Iterator<Item = (&Course, &Activity, &MeetingSlot)> {
		self.courses.iter().flat_map(|course| {
			course.activities.iter().flat_map(move |activity| {
				activity.slots.iter().map(move |slot| (course, activity, slot))
			})
		})
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.courses.is_empty()
	}
}

fn following_siblings(node: Node<'_>) -> impl Iterator<Item = Node<'_>> {
	iter::successors(node.next(), Node::next)
}

fn collapse_whitespace(s: &str) -> String {
	s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The table belonging to an activity label: the first `<table>` after it,
/// as long as no other label or heading comes first.
fn table_after(label: Node<'_>) -> Option<Node<'_>> {
	following_siblings(label)
		.filter(|node| node.name().is_some())
		.take_while(|node| !matches!(node.name(), Some(HEADING | LABEL)))
		.find(|node| node.name() == Some(TABLE))
}

fn parse_row(row: Node<'_>, location: &Location) -> Result<MeetingSlot> {
	let cells = row.find(Name("td")).map(|td| td.text()).collect::<Vec<_>>();

	let [_, day, time, place, weeks, ..] = cells.as_slice() else {
		return Err(Error::malformed(
			location.clone(),
			format!("expected {COLUMNS} columns, found {}", cells.len()),
		));
	};

	let time = TimeRange::parse(time).ok_or_else(|| {
		Error::malformed(
			location.clone(),
			format!("unreadable time range {:?}", time.trim()),
		)
	})?;

	// the first word is a label such as "Uger:"
	let weeks = weeks
		.split_whitespace()
		.skip(1)
		.map(|token| {
			token.parse().map_err(|source| Error::MalformedWeekToken {
				location: location.clone(),
				token: token.to_string(),
				source,
			})
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(MeetingSlot {
		day: day.trim().to_string(),
		time,
		place: collapse_whitespace(place),
		weeks,
	})
}

fn parse_activity(label: Node<'_>, course: &str) -> Result<Activity> {
	let name = label.text().trim().to_string();
	let location = Location::course(course).activity(&name);

	let table = table_after(label)
		.ok_or_else(|| Error::malformed(location.clone(), "activity has no table"))?;

	let slots = table
		.find(Name("tr"))
		.enumerate()
		.map(|(i, row)| parse_row(row, &location.clone().row(i + 1)))
		.collect::<Result<Vec<_>>>()?;

	trace!(course, activity = %name, slots = slots.len(), "parsed activity");

	Ok(Activity { name, slots })
}

/// Builds the schedule from a timetable document.
///
/// Activity labels are siblings of every heading at once, so each heading's
/// share is the labels following it minus the labels following the next
/// heading. The last heading keeps everything that remains.
///
/// # Errors
///
/// Fails on the first structural problem; no partial schedule is returned.
pub fn extract(document: &Document) -> Result<Schedule> {
	let headings = document.find(Name(HEADING)).collect::<Vec<_>>();

	// first pass: every label following each heading, in document order
	let labels = headings
		.iter()
		.map(|heading| {
			following_siblings(*heading)
				.filter(|node| node.name() == Some(LABEL))
				.collect::<Vec<_>>()
		})
		.collect::<Vec<_>>();

	let mut schedule = Schedule::default();

	// second pass: slice off each heading's own share
	for (i, heading) in headings.iter().enumerate() {
		let name = heading.text().trim().to_string();
		let later = labels.get(i + 1).map_or(0, Vec::len);
		let count = labels[i].len().checked_sub(later).ok_or_else(|| {
			Error::malformed(
				Location::course(&name),
				"next course heading is followed by more activities than this one",
			)
		})?;

		let mut course = Course::new(name);

		for label in &labels[i][..count] {
			course.insert(parse_activity(*label, &course.name)?);
		}

		debug!(
			course = %course.name,
			activities = course.activities.len(),
			"parsed course"
		);

		schedule.insert(course);
	}

	if schedule.is_empty() {
		warn!("no course headings found in timetable");
	}

	Ok(schedule)
}

/// # Errors
///
/// See [`extract`].
pub fn parse_from_str(html: &str) -> Result<Schedule> {
	extract(&Document::from(html))
}

/// # Errors
///
/// Fails when the buffer cannot be decoded, or see [`extract`].
pub fn parse_from_buf(buf: &[u8]) -> Result<Schedule> {
	extract(&Document::from_read(buf)?)
}

/// Reads the timetable from `path`, or from stdin when no path is given.
///
/// # Errors
///
/// Fails when the input cannot be read, or see [`extract`].
pub fn parse_from_file<P: AsRef<Path>>(path: Option<P>) -> Result<Schedule> {
	let document = if let Some(path) = path {
		let file = File::open(path)?;
		Document::from_read(file)?
	} else {
		Document::from_read(io::stdin())?
	};

	extract(&document)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row(day: &str, time: &str, place: &str, weeks: &str) -> String {
		format!("<tr><td>x</td><td>{day}</td><td>{time}</td><td>{place}</td><td>{weeks}</td></tr>")
	}

	fn activity(name: &str, rows: &[String]) -> String {
		format!("<strong>{name}</strong>\n<table>{}</table>\n", rows.concat())
	}

	fn page(body: &str) -> String {
		format!("<html><body><div>\n{body}</div></body></html>")
	}

	fn lecture() -> String {
		row("Mandag", "10 - 12", "Aud 1", "Uger: 10-13")
	}

	#[test]
	fn activities_are_split_between_headings() {
		let html = page(&format!(
			"<h3>Algoritmer</h3>\n{}{}<h3>Databaser</h3>\n{}<h3>Netværk</h3>\n{}{}{}",
			activity("Forelæsning", &[lecture()]),
			activity("Øvelser", &[lecture()]),
			activity("Forelæsning", &[lecture()]),
			activity("Forelæsning", &[lecture()]),
			activity("Øvelser", &[lecture()]),
			activity("Lab", &[lecture()]),
		));

		let schedule = parse_from_str(&html).unwrap();
		let counts = schedule
			.courses
			.iter()
			.map(|c| (c.name.as_str(), c.activities.len()))
			.collect::<Vec<_>>();

		assert_eq!(
			counts,
			[("Algoritmer", 2), ("Databaser", 1), ("Netværk", 3)]
		);
		assert!(schedule.get("Databaser").unwrap().get("Øvelser").is_none());
	}

	#[test]
	fn row_fields_are_normalized() {
		let html = page(&format!(
			"<h3>\n  Algoritmer  \n</h3>{}",
			activity(
				" Forelæsning ",
				&[row(
					" Tirsdag ",
					" 8 - 10 ",
					"  Bldg  5,\n Room 3 ",
					"Uger: 5-8, 10"
				)]
			)
		));

		let schedule = parse_from_str(&html).unwrap();
		let activity = schedule.get("Algoritmer").unwrap().get("Forelæsning").unwrap();

		assert_eq!(
			activity.slots,
			[MeetingSlot {
				day: "Tirsdag".to_string(),
				time: TimeRange { start: 8, end: 10 },
				place: "Bldg 5, Room 3".to_string(),
				weeks: vec![WeekRange { start: 5, end: 8 }, WeekRange { start: 10, end: 10 }],
			}]
		);
	}

	#[test]
	fn each_activity_reads_its_own_table() {
		let html = page(&format!(
			"<h3>Algoritmer</h3>{}{}",
			activity("Forelæsning", &[lecture()]),
			activity(
				"Øvelser",
				&[
					row("Onsdag", "12 - 14", "Lokale 2", "Uger: 7"),
					row("Fredag", "8 - 10", "Lokale 3", "Uger: 7"),
				]
			),
		));

		let schedule = parse_from_str(&html).unwrap();
		let course = schedule.get("Algoritmer").unwrap();

		assert_eq!(course.get("Forelæsning").unwrap().slots.len(), 1);
		let exercises = &course.get("Øvelser").unwrap().slots;
		assert_eq!(exercises.len(), 2);
		assert_eq!(exercises[1].day, "Fredag");
	}

	#[test]
	fn duplicate_activity_keeps_last() {
		let html = page(&format!(
			"<h3>Algoritmer</h3>{}{}",
			activity("Forelæsning", &[lecture()]),
			activity("Forelæsning", &[row("Torsdag", "9 - 11", "Aud 2", "Uger: 3")]),
		));

		let schedule = parse_from_str(&html).unwrap();
		let course = schedule.get("Algoritmer").unwrap();

		assert_eq!(course.activities.len(), 1);
		assert_eq!(course.activities[0].slots[0].day, "Torsdag");
	}

	#[test]
	fn short_row_is_an_error() {
		let html = page(&format!(
			"<h3>Algoritmer</h3><strong>Forelæsning</strong><table>{}<tr><td>x</td><td>Mandag</td><td>10 - 12</td></tr></table>",
			lecture()
		));

		let err = parse_from_str(&html).unwrap_err();
		assert!(matches!(err, Error::MalformedDocument { .. }), "{err:?}");
		assert_eq!(
			err.location(),
			Some(&Location::course("Algoritmer").activity("Forelæsning").row(2))
		);
	}

	#[test]
	fn label_without_table_is_an_error() {
		let html = page(&format!(
			"<h3>Algoritmer</h3><strong>Forelæsning</strong><p>aflyst</p>{}",
			activity("Øvelser", &[lecture()])
		));

		let err = parse_from_str(&html).unwrap_err();
		assert!(matches!(err, Error::MalformedDocument { .. }), "{err:?}");
		assert_eq!(
			err.location(),
			Some(&Location::course("Algoritmer").activity("Forelæsning"))
		);
	}

	#[test]
	fn bad_week_token_is_an_error() {
		let html = page(&format!(
			"<h3>Algoritmer</h3>{}",
			activity("Forelæsning", &[row("Mandag", "10 - 12", "Aud 1", "Uger: 10-x")])
		));

		match parse_from_str(&html).unwrap_err() {
			Error::MalformedWeekToken { token, location, .. } => {
				assert_eq!(token, "10-x");
				assert_eq!(location.row, Some(1));
			}
			err => panic!("unexpected error: {err:?}"),
		}
	}

	#[test]
	fn bad_time_range_is_an_error() {
		let html = page(&format!(
			"<h3>Algoritmer</h3>{}",
			activity("Forelæsning", &[row("Mandag", "ti til tolv", "Aud 1", "Uger: 10")])
		));

		assert!(matches!(
			parse_from_str(&html),
			Err(Error::MalformedDocument { .. })
		));
	}

	#[test]
	fn empty_document_is_an_empty_schedule() {
		let schedule = parse_from_str("<html><body><p>Ingen skema</p></body></html>").unwrap();
		assert!(schedule.is_empty());
	}

	#[test]
	fn reads_from_file_and_buffer() {
		use std::io::Write;

		let html = page(&format!("<h3>Algoritmer</h3>{}", activity("Forelæsning", &[lecture()])));

		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(html.as_bytes()).unwrap();

		let from_file = parse_from_file(Some(file.path())).unwrap();
		let from_buf = parse_from_buf(html.as_bytes()).unwrap();

		assert_eq!(from_file, from_buf);
		assert_eq!(from_file.slots().count(), 1);
	}

	#[test]
	fn missing_file_is_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = parse_from_file(Some(dir.path().join("skema.html"))).unwrap_err();
		assert!(matches!(err, Error::Io(_)));
	}
}
