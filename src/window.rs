use chrono::NaiveTime;
use thiserror::Error;

use crate::grid::{SLICES_PER_DAY, slice_for_time};

pub const DEFAULT_WINDOW_SIZE: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window size {0} must be between 1 and {SLICES_PER_DAY}")]
    InvalidSize(usize),
    #[error("display index {index} is outside 1..={size}")]
    InvalidDisplayIndex { index: usize, size: usize },
}

/// The contiguous run of slices currently on screen.
///
/// Display indices are 1-based and run oldest first: display index 1 is
/// `start`, display index `size` is `start + size - 1`. Every conversion goes
/// through [`Window::display_to_absolute`] so rendering and command resolution
/// cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: usize,
    size: usize,
}

impl Window {
    /// Window whose last slice is the one containing `time`, clamped to the day.
    pub fn for_time(size: usize, time: NaiveTime) -> Result<Self, WindowError> {
        Ok(Self::for_index(size, 0)?.follow(time))
    }

    /// Window starting at `anchor`, clamped so it never runs past either end of the day.
    pub fn for_index(size: usize, anchor: usize) -> Result<Self, WindowError> {
        check_size(size)?;
        Ok(Self::clamped(anchor, size))
    }

    /// Same size, re-anchored so it ends on the slice containing `time`.
    pub fn follow(self, time: NaiveTime) -> Self {
        let now = slice_for_time(time);
        Self::clamped((now + 1).saturating_sub(self.size), self.size)
    }

    /// Same size, moved to start at `anchor`.
    pub fn moved_to(self, anchor: usize) -> Self {
        Self::clamped(anchor, self.size)
    }

    fn clamped(start: usize, size: usize) -> Self {
        Self {
            start: start.min(SLICES_PER_DAY - size),
            size,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn page_forward(self) -> Self {
        Self::clamped(self.start + self.size, self.size)
    }

    pub fn page_backward(self) -> Self {
        Self::clamped(self.start.saturating_sub(self.size), self.size)
    }

    pub fn display_to_absolute(&self, display_index: usize) -> Result<usize, WindowError> {
        if display_index == 0 || display_index > self.size {
            return Err(WindowError::InvalidDisplayIndex {
                index: display_index,
                size: self.size,
            });
        }
        Ok(self.start + display_index - 1)
    }

    pub fn absolute_to_display(&self, absolute_index: usize) -> Option<usize> {
        if absolute_index < self.start || absolute_index >= self.start + self.size {
            return None;
        }
        Some(absolute_index - self.start + 1)
    }

    /// `(display_index, absolute_index)` pairs in presentation order.
    pub fn display_indices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..=self.size).filter_map(move |display| {
            self.display_to_absolute(display)
                .ok()
                .map(|absolute| (display, absolute))
        })
    }
}

fn check_size(size: usize) -> Result<(), WindowError> {
    if size == 0 || size > SLICES_PER_DAY {
        return Err(WindowError::InvalidSize(size));
    }
    Ok(())
}
