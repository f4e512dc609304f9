use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use serde::Serialize;

use chronos_insights::TimeEntry;
use chronos_insights::calendar::{Granularity, RollingRange, rolling_range_from_today};
use chronos_insights::config::{load_config, resolve_config_path};
use chronos_insights::dimension::Dimension;
use chronos_insights::format::format_minutes;
use chronos_insights::grid::{Histogram, TimeGrid, build_hourly_histogram, build_time_grid};
use chronos_insights::series::{SeriesRequest, StackedSeries, build_stacked_series_with};
use chronos_insights::storage::{load_entries, sort_for_reporting};

#[derive(Debug, Parser)]
#[command(name = "chronos-insights", about = "Chart-ready aggregates from logged time entries")]
struct Cli {
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	#[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
	format: OutputFormat,
	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
	Json,
	Text,
}

#[derive(Debug, Subcommand)]
enum Command {
	Series {
		#[arg(long)]
		entries: PathBuf,
		#[arg(long, value_enum)]
		granularity: Option<Granularity>,
		#[arg(long, value_enum)]
		dimension: Option<Dimension>,
		#[arg(long)]
		top: Option<usize>,
		#[arg(long)]
		from: Option<String>,
		#[arg(long)]
		to: Option<String>,
	},
	Grid {
		#[arg(long)]
		entries: PathBuf,
		#[arg(long)]
		from: String,
		#[arg(long)]
		to: String,
	},
	Histogram {
		#[arg(long)]
		entries: PathBuf,
		#[arg(long, requires = "to")]
		from: Option<String>,
		#[arg(long, requires = "from")]
		to: Option<String>,
	},
	Range {
		#[arg(long, value_enum)]
		granularity: Option<Granularity>,
		#[arg(long, default_value_t = 0, allow_negative_numbers = true)]
		offset: i32,
	},
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let config_path = resolve_config_path(cli.config);
	let config = load_config(config_path.as_deref())?;

	match cli.command {
		Command::Series {
			entries,
			granularity,
			dimension,
			top,
			from,
			to,
		} => {
			let entries = load_sorted_entries(&entries)?;
			let request = SeriesRequest {
				granularity: granularity.unwrap_or(config.granularity),
				dimension: dimension.unwrap_or(config.dimension),
				top_n: top.unwrap_or(config.top_n),
				start_date: from.as_deref().map(parse_day).transpose()?,
				end_date: to.as_deref().map(parse_day).transpose()?,
			};
			let series = build_stacked_series_with(&entries, &request, &config.resolver());
			emit(cli.format, &series, print_series)?;
		}
		Command::Grid { entries, from, to } => {
			let entries = load_sorted_entries(&entries)?;
			let days = days_between(parse_day(&from)?, parse_day(&to)?);
			let grid = build_time_grid(&entries, &days);
			emit(cli.format, &grid, print_grid)?;
		}
		Command::Histogram { entries, from, to } => {
			let entries = load_sorted_entries(&entries)?;
			let days = match (from, to) {
				(Some(from), Some(to)) => Some(days_between(parse_day(&from)?, parse_day(&to)?)),
				_ => None,
			};
			let histogram = build_hourly_histogram(&entries, days.as_deref());
			emit(cli.format, &histogram, print_histogram)?;
		}
		Command::Range { granularity, offset } => {
			if offset > 0 {
				warn!("future periods are not reported, clamping offset {offset} to 0");
			}
			let granularity = granularity.unwrap_or(config.granularity);
			let range = rolling_range_from_today(granularity, offset.min(0))
				.ok_or_else(|| format!("offset {offset} reaches outside the supported calendar"))?;
			emit(cli.format, &range, |range: &RollingRange| {
				println!(
					"{} | {} .. {}",
					range.label,
					range.start_date.format("%Y-%m-%d"),
					range.end_date.format("%Y-%m-%d")
				);
			})?;
		}
	}

	Ok(())
}

fn emit<T: Serialize>(
	format: OutputFormat,
	value: &T,
	print_text: impl Fn(&T),
) -> Result<(), Box<dyn Error>> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
		OutputFormat::Text => print_text(value),
	}
	Ok(())
}

fn load_sorted_entries(path: &Path) -> Result<Vec<TimeEntry>, Box<dyn Error>> {
	let mut entries = load_entries(path)?;
	sort_for_reporting(&mut entries);
	Ok(entries)
}

fn parse_day(input: &str) -> Result<NaiveDate, Box<dyn Error>> {
	Ok(NaiveDate::parse_from_str(input, "%Y-%m-%d")?)
}

fn days_between(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
	from.iter_days().take_while(|day| *day <= to).collect()
}

fn print_series(series: &StackedSeries) {
	if series.data.is_empty() {
		println!("no tracked time in range");
		return;
	}

	let header = series
		.stacks
		.iter()
		.map(|stack| stack.label.as_str())
		.collect::<Vec<_>>()
		.join(" | ");
	println!("bucket | {header} | total");
	for row in &series.data {
		let cells = row
			.minutes
			.iter()
			.map(|minutes| format_minutes(*minutes))
			.collect::<Vec<_>>()
			.join(" | ");
		println!("{} | {} | {}", row.label, cells, format_minutes(row.total_minutes));
	}
	println!("\ntotal: {}", format_minutes(series.total_minutes));
}

fn print_grid(grid: &TimeGrid) {
	for row in &grid.grid {
		println!("{}", row.day.format("%a %Y-%m-%d"));
		for (hour, cell) in row.hours.iter().enumerate() {
			if cell.total_minutes == 0 {
				continue;
			}
			let top = cell
				.dominant()
				.map(|item| item.task_name.as_str())
				.unwrap_or_default();
			println!("  {hour:02}:00 | {} | {top}", format_minutes(cell.total_minutes));
		}
	}
	if let Some(footnote) = grid.exclusions.footnote() {
		println!("\n{footnote}");
	}
}

fn print_histogram(histogram: &Histogram) {
	for (hour, minutes) in histogram.bins.iter().enumerate() {
		println!("{hour:02}:00 | {}", format_minutes(*minutes));
	}
	if let Some(hour) = histogram.peak_hour() {
		println!("\npeak hour: {hour:02}:00");
	}
	if let Some(footnote) = histogram.exclusions.footnote() {
		println!("{footnote}");
	}
}
