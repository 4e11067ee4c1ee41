use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::Duration;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use crate::activities::{by_id, ActivityDirectory};
use crate::clock::Clock;
use crate::config::Config;
use crate::grid::{format_duration, slices_duration, span_label};
use crate::session::{Flow, Session, Status};
use crate::storage::DayStore;
use crate::window::Window;

const HEADER_DATE_FORMAT: &str = "%A, %B %-d, %Y";
const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HEADER_COLOR: Color = Color::LightGreen;
const NOW_MARKER: &str = "<";

pub fn run_dashboard(
	session: &mut Session,
	config: &Config,
	store: &dyn DayStore,
	clock: &dyn Clock,
) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, session, config, store, clock);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	session: &mut Session,
	config: &Config,
	store: &dyn DayStore,
	clock: &dyn Clock,
) -> Result<(), Box<dyn Error>> {
	let mut input = String::new();

	loop {
		let view = build_view(session, config, clock);
		terminal.draw(|frame| draw_dashboard(frame, &view, &input))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				match key.code {
					KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
					KeyCode::Char(value) => input.push(value),
					KeyCode::Backspace => {
						input.pop();
					}
					KeyCode::Esc => input.clear(),
					KeyCode::Enter => {
						let flow = session.handle_input_in(view.window, &input, config, store, clock);
						input.clear();
						if flow == Flow::Quit {
							break;
						}
					}
					_ => {}
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, view: &ViewModel, input: &str) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Length(3),
			Constraint::Min(8),
			Constraint::Length(4),
		])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
		.split(layout[1]);

	render_header(frame, layout[0], view);
	render_slices_panel(frame, body[0], view);
	render_activities_panel(frame, body[1], view);
	render_footer(frame, layout[2], view, input);
}

fn render_header(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let header = Paragraph::new(Line::from(Span::styled(
		view.header.clone(),
		Style::default().fg(HEADER_COLOR).add_modifier(Modifier::BOLD),
	)))
	.alignment(Alignment::Center)
	.block(Block::default().borders(Borders::ALL));
	frame.render_widget(header, area);
}

fn render_slices_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let lines = view
		.slice_rows
		.iter()
		.map(|row| {
			let mut spans = vec![
				Span::styled(
					format!("t{:<3}", row.display_index),
					Style::default().add_modifier(Modifier::BOLD),
				),
				Span::raw(format!("{:<14}", row.label)),
			];
			match &row.activity_name {
				Some(name) => spans.push(Span::styled(name.clone(), row.style)),
				None => spans.push(Span::styled("-", Style::default().fg(Color::DarkGray))),
			}
			if row.is_now {
				spans.push(Span::styled(
					format!(" {NOW_MARKER}"),
					Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
				));
			}
			Line::from(spans)
		})
		.collect::<Vec<_>>();

	let panel = Paragraph::new(lines).block(
		Block::default()
			.borders(Borders::ALL)
			.title(view.window_title.clone())
			.border_style(border_style(true)),
	);
	frame.render_widget(panel, area);
}

fn render_activities_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let mut lines = view
		.activity_rows
		.iter()
		.map(|row| {
			Line::from(vec![
				Span::styled(
					format!("a{:<3}", row.display_index),
					Style::default().add_modifier(Modifier::BOLD),
				),
				Span::styled(format!("{:<20}", row.name), row.style),
				Span::raw(format_duration(row.total)),
			])
		})
		.collect::<Vec<_>>();

	if lines.is_empty() {
		lines.push(Line::from("(no active activities)"));
	}

	let title = format!("Activities | total {}", format_duration(view.day_total));
	let panel = Paragraph::new(lines).block(
		Block::default()
			.borders(Borders::ALL)
			.title(title)
			.border_style(border_style(false)),
	);
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, view: &ViewModel, input: &str) {
	let lines = vec![
		Line::from(vec![
			Span::styled("Command: ", Style::default().fg(Color::Green)),
			Span::styled(input.to_string(), Style::default().fg(Color::Yellow)),
		]),
		Line::from(Span::styled(view.status.to_string(), status_style(&view.status))),
	];

	let footer = Paragraph::new(lines).block(
		Block::default()
			.borders(Borders::ALL)
			.title("t# a# assign | u t# clear | +/- page | n/p day | t today | y yesterday | q quit"),
	);
	frame.render_widget(footer, area);
}

/// Everything the dashboard draws, computed fresh for each frame.
#[derive(Debug, Clone)]
pub struct ViewModel {
	pub header: String,
	/// Window the slice rows were built from; typed `t#` indices refer to it.
	pub window: Window,
	pub window_title: String,
	pub slice_rows: Vec<SliceRow>,
	pub activity_rows: Vec<ActivityRow>,
	pub day_total: Duration,
	pub status: Status,
}

#[derive(Debug, Clone)]
pub struct SliceRow {
	pub display_index: usize,
	pub label: String,
	pub activity_name: Option<String>,
	pub style: Style,
	pub is_now: bool,
}

#[derive(Debug, Clone)]
pub struct ActivityRow {
	pub display_index: usize,
	pub name: String,
	pub style: Style,
	pub total: Duration,
}

pub fn build_view(session: &Session, config: &Config, clock: &dyn Clock) -> ViewModel {
	let window = session.window(clock);
	let now_display = session
		.now_slice(clock)
		.and_then(|absolute| window.absolute_to_display(absolute));
	let day = session.day();

	let slice_rows = window
		.display_indices()
		.filter_map(|(display_index, absolute)| {
			let slice = day.get(absolute).ok()?;
			let activity = slice
				.activity_id
				.as_deref()
				.and_then(|id| by_id(&config.activities, id));
			Some(SliceRow {
				display_index,
				label: slice.label(),
				activity_name: activity.map(|activity| activity.name.clone()),
				style: style_from_color(activity.and_then(|activity| activity.color.as_deref())),
				is_now: now_display == Some(display_index),
			})
		})
		.collect::<Vec<_>>();

	let counts = day.slice_counts();
	let directory = ActivityDirectory::new(&config.activities);
	let activity_rows = directory
		.active()
		.iter()
		.enumerate()
		.map(|(position, activity)| ActivityRow {
			display_index: position + 1,
			name: activity.name.clone(),
			style: style_from_color(activity.color.as_deref()),
			total: slices_duration(counts.get(activity.id.as_str()).copied().unwrap_or(0)),
		})
		.collect::<Vec<_>>();

	let last = window.start() + window.size() - 1;
	ViewModel {
		header: session.date().format(HEADER_DATE_FORMAT).to_string(),
		window,
		window_title: format!(
			"Time slices {}{}",
			span_label(window.start(), last),
			if session.is_today(clock) { " | today" } else { "" }
		),
		slice_rows,
		activity_rows,
		day_total: slices_duration(counts.values().sum()),
		status: session.status().clone(),
	}
}

/// Plain-text rendering of a day for the `summary` subcommand.
pub fn print_day_summary(session: &Session, config: &Config) {
	let day = session.day();
	println!("summary for {}", day.date().format("%Y-%m-%d"));

	let counts = day.slice_counts();
	if counts.is_empty() {
		println!("no assigned slices for this day");
		return;
	}

	let directory = ActivityDirectory::new(&config.activities);
	if !directory.is_empty() {
		println!("\nby activity:");
	}
	for (position, activity) in directory.active().iter().enumerate() {
		let count = counts.get(activity.id.as_str()).copied().unwrap_or(0);
		println!(
			"a{} | {} | {}",
			position + 1,
			format_duration(slices_duration(count)),
			activity.name
		);
	}

	println!("\nslices:");
	for slice in day.slices().iter().filter(|slice| slice.is_assigned()) {
		let name = slice
			.activity_id
			.as_deref()
			.and_then(|id| by_id(&config.activities, id))
			.map(|activity| activity.name.as_str())
			.unwrap_or("(unknown activity)");
		println!("{:>2} | {} | {}", slice.index, slice.label(), name);
	}
}

fn style_from_color(color_name: Option<&str>) -> Style {
	color_name
		.and_then(color_from_name)
		.map(|color| Style::default().fg(color))
		.unwrap_or_default()
}

fn color_from_name(color_name: &str) -> Option<Color> {
	if let Some(hex) = color_name.strip_prefix('#') {
		return color_from_hex(hex);
	}

	match color_name.to_lowercase().as_str() {
		"black" => Some(Color::Black),
		"red" => Some(Color::Red),
		"green" => Some(Color::Green),
		"yellow" => Some(Color::Yellow),
		"blue" => Some(Color::Blue),
		"magenta" => Some(Color::Magenta),
		"cyan" => Some(Color::Cyan),
		"gray" => Some(Color::Gray),
		"dark_gray" => Some(Color::DarkGray),
		"light_red" => Some(Color::LightRed),
		"light_green" => Some(Color::LightGreen),
		"light_yellow" => Some(Color::LightYellow),
		"light_blue" => Some(Color::LightBlue),
		"light_magenta" => Some(Color::LightMagenta),
		"light_cyan" => Some(Color::LightCyan),
		"white" => Some(Color::White),
		_ => None,
	}
}

fn color_from_hex(hex: &str) -> Option<Color> {
	if hex.len() != 6 {
		return None;
	}
	let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
	Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn status_style(status: &Status) -> Style {
	if status.is_error() {
		Style::default().fg(Color::LightRed)
	} else {
		Style::default()
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}
