mod activities;
mod clock;
mod command;
mod config;
mod grid;
mod session;
mod storage;
mod ui;
mod window;

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::clock::{Clock, SystemClock};
use crate::config::{
	Config, ConfigError, load_config, resolve_config_path, resolve_data_dir, write_default_config,
};
use crate::session::{Flow, Session};
use crate::storage::JsonDayStore;
use crate::ui::{print_day_summary, run_dashboard};

const LOG_FILE: &str = "bubble_timer.log";
const LOG_ENV: &str = "BUBBLETIMER_LOG";

#[derive(Debug, Parser)]
#[command(name = "bubble_timer", about = "Plan and record your day in 15 minute slices")]
struct Cli {
	#[arg(long)]
	config: Option<PathBuf>,
	#[arg(long)]
	data_dir: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	Summary {
		#[arg(long)]
		day: Option<String>,
	},
	Exec {
		#[arg(long)]
		day: Option<String>,
		/// First absolute slice (0-95) of the window instead of the one ending now
		#[arg(long)]
		start: Option<usize>,
		input: String,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let config_path = resolve_config_path(cli.config);
	let data_dir = resolve_data_dir(cli.data_dir);

	if let Err(err) = init_logging(&data_dir) {
		eprintln!("warning: logging disabled: {err}");
	}

	if let Some(Command::Init) = &cli.command {
		match write_default_config(&config_path) {
			Ok(_) => println!("wrote default config to {}", config_path.display()),
			Err(ConfigError::AlreadyExists(path)) => {
				println!("config already exists at {}", path.display());
			}
			Err(err) => return Err(err.into()),
		}
		return Ok(());
	}

	let Some(config) = load_or_create_config(&config_path)? else {
		return Ok(());
	};
	info!(config = %config_path.display(), data_dir = %data_dir.display(), "starting");

	let store = JsonDayStore::new(&data_dir, &config.user_id);
	let clock = SystemClock;

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {}
		Command::Dashboard => {
			let mut session = Session::open(&config, &store, &clock)?;
			run_dashboard(&mut session, &config, &store, &clock)?;
			println!("Come back soon!");
		}
		Command::Summary { day } => {
			let date = parse_day(day.as_deref(), &clock)?;
			let session = Session::open_on(date, &config, &store, &clock)?;
			if !session.is_loaded() {
				return Err(session.status().to_string().into());
			}
			print_day_summary(&session, &config);
		}
		Command::Exec { day, start, input } => {
			let date = parse_day(day.as_deref(), &clock)?;
			let mut session = Session::open_on(date, &config, &store, &clock)?;
			if !session.is_loaded() {
				return Err(session.status().to_string().into());
			}
			if let Some(start) = start {
				session.pin_window(start);
			}

			if session.handle_input(&input, &config, &store, &clock) == Flow::Ignored {
				return Err(format!("invalid command: {input}").into());
			}
			if session.status().is_error() {
				return Err(session.status().to_string().into());
			}
			println!("{}", session.status());
		}
	}

	Ok(())
}

/// Loads the config, or writes a starter one and returns `None` so the user
/// can edit it before the first run.
fn load_or_create_config(path: &Path) -> Result<Option<Config>, Box<dyn Error>> {
	if let Some(config) = load_config(path)? {
		return Ok(Some(config));
	}

	write_default_config(path)?;
	println!("\nYou have a new default config file at: {}", path.display());
	println!("\nPlease edit the file to match your desired configuration.\n");
	Ok(None)
}

fn init_logging(data_dir: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
	fs::create_dir_all(data_dir)?;
	let file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(data_dir.join(LOG_FILE))?;
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(Mutex::new(file))
		.with_ansi(false)
		.try_init()?;
	Ok(())
}

fn parse_day(input: Option<&str>, clock: &dyn Clock) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
	} else {
		Ok(clock.now().date())
	}
}
