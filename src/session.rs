use std::fmt::{Display, Formatter};

use chrono::{Duration, NaiveDate};
use tracing::{debug, error, info};

use crate::activities::ActivityDirectory;
use crate::clock::Clock;
use crate::command::{self, Command, Limits};
use crate::config::Config;
use crate::grid::{Day, slice_for_time};
use crate::storage::DayStore;
use crate::window::{Window, WindowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The input was not a valid command and changed nothing.
    Ignored,
    Quit,
}

/// Status line shown under the command input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Info(message) => write!(f, "{message}"),
            Status::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Everything the planner knows about the day on screen. The session owns its
/// `Day` outright; switching dates replaces it.
///
/// `loaded` is false while `day` is only a placeholder for a date whose record
/// could not be read. Edits are refused in that state so a save never
/// overwrites the stored record.
#[derive(Debug, Clone)]
pub struct Session {
    day: Day,
    loaded: bool,
    window: Window,
    follow_clock: bool,
    status: Status,
}

impl Session {
    pub fn open(
        config: &Config,
        store: &dyn DayStore,
        clock: &dyn Clock,
    ) -> Result<Self, WindowError> {
        Self::open_on(clock.now().date(), config, store, clock)
    }

    pub fn open_on(
        date: NaiveDate,
        config: &Config,
        store: &dyn DayStore,
        clock: &dyn Clock,
    ) -> Result<Self, WindowError> {
        let window = Window::for_time(config.window_size, clock.now().time())?;
        let mut session = Self {
            day: Day::new(date),
            loaded: false,
            window,
            follow_clock: true,
            status: Status::Info("Ready".to_string()),
        };
        session.switch_day(date, store);
        Ok(session)
    }

    pub fn day(&self) -> &Day {
        &self.day
    }

    pub fn date(&self) -> NaiveDate {
        self.day.date()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_today(&self, clock: &dyn Clock) -> bool {
        self.date() == clock.now().date()
    }

    /// Absolute slice for the current time, when the session shows today.
    pub fn now_slice(&self, clock: &dyn Clock) -> Option<usize> {
        let now = clock.now();
        (now.date() == self.date()).then(|| slice_for_time(now.time()))
    }

    pub fn window(&self, clock: &dyn Clock) -> Window {
        if self.follow_clock {
            self.window.follow(clock.now().time())
        } else {
            self.window
        }
    }

    /// Pins the window so it starts at absolute slice `start`.
    pub fn pin_window(&mut self, start: usize) {
        self.window = self.window.moved_to(start);
        self.follow_clock = false;
    }

    /// Applies `input` against the window as it stands now.
    pub fn handle_input(
        &mut self,
        input: &str,
        config: &Config,
        store: &dyn DayStore,
        clock: &dyn Clock,
    ) -> Flow {
        let window = self.window(clock);
        self.handle_input_in(window, input, config, store, clock)
    }

    /// Applies `input` with `t#` resolved against `window`, the window the
    /// user was looking at when the command was typed.
    pub fn handle_input_in(
        &mut self,
        window: Window,
        input: &str,
        config: &Config,
        store: &dyn DayStore,
        clock: &dyn Clock,
    ) -> Flow {
        let directory = ActivityDirectory::new(&config.activities);
        let limits = Limits {
            window_size: window.size(),
            activity_count: directory.len(),
        };

        match command::parse(input, limits) {
            Ok(command) => self.apply(command, window, &directory, store, clock),
            Err(err) => {
                debug!(input, %err, "ignoring invalid command");
                Flow::Ignored
            }
        }
    }

    fn apply(
        &mut self,
        command: Command,
        window: Window,
        directory: &ActivityDirectory<'_>,
        store: &dyn DayStore,
        clock: &dyn Clock,
    ) -> Flow {
        match command {
            Command::Quit => return Flow::Quit,
            Command::PageForward => {
                self.window = window.page_forward();
                self.follow_clock = false;
            }
            Command::PageBackward => {
                self.window = window.page_backward();
                self.follow_clock = false;
            }
            Command::NextDay => {
                if let Some(date) = self.date().succ_opt() {
                    self.switch_day(date, store);
                }
            }
            Command::PriorDay => {
                if let Some(date) = self.date().pred_opt() {
                    self.switch_day(date, store);
                }
            }
            Command::Today => {
                self.follow_clock = true;
                self.switch_day(clock.now().date(), store);
            }
            Command::Yesterday => {
                self.follow_clock = true;
                self.switch_day(clock.now().date() - Duration::days(1), store);
            }
            Command::Assign { .. } | Command::Unassign { .. } if !self.loaded => {
                self.status = Status::Error(format!(
                    "{} is not loaded, edits are disabled until it loads",
                    self.date().format("%Y-%m-%d")
                ));
            }
            Command::Assign { slices, activity } => {
                let Ok(activity) = directory.by_display_index(activity) else {
                    debug_assert!(false, "validated activity index {activity} did not resolve");
                    return Flow::Ignored;
                };
                let Some(indices) = resolve_slices(&window, &slices) else {
                    return Flow::Ignored;
                };
                for index in &indices {
                    if self.day.set(*index, Some(activity.id.clone())).is_err() {
                        debug_assert!(false, "window produced slice {index} outside the day");
                    }
                }
                self.status = Status::Info(format!(
                    "{} slice(s) set to {}",
                    indices.len(),
                    activity.name
                ));
                self.persist(store);
            }
            Command::Unassign { slices } => {
                let Some(indices) = resolve_slices(&window, &slices) else {
                    return Flow::Ignored;
                };
                for index in &indices {
                    if self.day.set(*index, None).is_err() {
                        debug_assert!(false, "window produced slice {index} outside the day");
                    }
                }
                self.status = Status::Info(format!("{} slice(s) cleared", indices.len()));
                self.persist(store);
            }
        }
        Flow::Continue
    }

    /// Loads `date` and replaces the current day with it. On failure the
    /// session stays where it was and reports the error in the status line.
    fn switch_day(&mut self, date: NaiveDate, store: &dyn DayStore) {
        match store.load(date) {
            Ok(day) => {
                info!(%date, "switched day");
                self.day = day;
                self.loaded = true;
                self.status = Status::Info(format!("Showing {}", date.format("%Y-%m-%d")));
            }
            Err(err) => {
                error!(%date, %err, "failed to load day");
                self.status = Status::Error(format!(
                    "unable to load {}: {err}",
                    date.format("%Y-%m-%d")
                ));
            }
        }
    }

    fn persist(&mut self, store: &dyn DayStore) {
        if let Err(err) = store.save(&self.day) {
            error!(date = %self.date(), %err, "failed to save day");
            self.status = Status::Error(format!(
                "unable to save {}: {err}",
                self.date().format("%Y-%m-%d")
            ));
        }
    }
}

fn resolve_slices(window: &Window, display_indices: &[usize]) -> Option<Vec<usize>> {
    let resolved = display_indices
        .iter()
        .map(|display| window.display_to_absolute(*display))
        .collect::<Result<Vec<_>, _>>();
    match resolved {
        Ok(indices) => Some(indices),
        Err(err) => {
            debug_assert!(false, "validated slice did not resolve: {err}");
            None
        }
    }
}
