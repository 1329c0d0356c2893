#![warn(clippy::pedantic)]

use std::{fs::File, io::Write, path::PathBuf, process::ExitCode};

use anyhow::{bail, Context};
use clap::Parser;
use skema2ics_core::{create_calendar, event::ExpandOptions, schedule, DEFAULT_CALENDAR_NAME};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version, about = "Convert a timetable page into an iCalendar file")]
struct Args {
	/// Timetable HTML, read from stdin when omitted
	#[clap(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
	path: Option<PathBuf>,
	/// Where to write the calendar, stdout when omitted
	#[clap(short, long, value_hint = clap::ValueHint::FilePath)]
	output: Option<PathBuf>,
	/// Start sessions on the hour instead of a quarter past
	#[clap(long)]
	exact_hours: bool,
	/// Year the week numbers belong to, defaults to the current year
	#[clap(short, long)]
	year: Option<i32>,
	/// Weekday names used in the timetable, Monday first
	#[clap(long, value_delimiter = ',', value_name = "DAY")]
	weekdays: Option<Vec<String>>,
	/// Calendar name shown by calendar clients
	#[clap(short, long, default_value = DEFAULT_CALENDAR_NAME)]
	name: String,
	/// Log debug output to stderr
	#[clap(short, long)]
	verbose: bool,
}

impl Args {
	fn options(&self) -> anyhow::Result<ExpandOptions> {
		let mut options = ExpandOptions::default().with_academic_timing(!self.exact_hours);

		if let Some(year) = self.year {
			options = options.with_year(year);
		}

		if let Some(weekdays) = &self.weekdays {
			let Ok(weekdays) = <[String; 7]>::try_from(weekdays.clone()) else {
				bail!("expected 7 weekday names, got {}", weekdays.len());
			};
			options = options.with_weekdays(weekdays);
		}

		Ok(options)
	}
}

fn run(args: &Args) -> anyhow::Result<()> {
	let options = args.options()?;

	let schedule = schedule::parse_from_file(args.path.as_ref())
		.context("failed to parse timetable")?;
	let events = skema2ics_core::expand(&schedule, &options)
		.context("failed to build calendar events")?;

	info!(
		courses = schedule.courses.len(),
		events = events.len(),
		"converted timetable"
	);

	let calendar = create_calendar(&events, &args.name);

	if let Some(output) = &args.output {
		let mut file = File::create(output)
			.with_context(|| format!("failed to create {}", output.display()))?;
		write!(&mut file, "{calendar}")
			.with_context(|| format!("failed to write {}", output.display()))?;
	} else {
		write!(&mut std::io::stdout(), "{calendar}").context("failed to write calendar")?;
	}

	Ok(())
}

fn main() -> ExitCode {
	let args = Args::parse();

	let filter = if args.verbose {
		EnvFilter::new(Level::DEBUG.to_string())
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();

	match run(&args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::FAILURE
		}
	}
}
