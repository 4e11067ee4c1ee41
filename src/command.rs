//! Command language for the day grid.
//!
//! ```text
//! command          := literal | assign-command | unassign-command
//! literal          := q | quit | + | - | n | next | p | prior
//!                   | t | today | r | refresh | reset | y | yesterday
//! assign-command   := slice-spec ws* "a" number
//! unassign-command := "u" ws* slice-spec
//! slice-spec       := slice-range | slice-set
//! slice-range      := "t" number "-" "t"? number
//! slice-set        := slice-token+
//! slice-token      := "t" number ","? ws?
//! ```
//!
//! Input is trimmed and lowercased first. `t#` and `a#` are 1-based display
//! indices into the current window and the current active-activity list; the
//! parser checks them against [`Limits`] but leaves resolving them to the caller.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    PageForward,
    PageBackward,
    NextDay,
    PriorDay,
    Today,
    Yesterday,
    Assign { slices: Vec<usize>, activity: usize },
    Unassign { slices: Vec<usize> },
}

/// Bounds a command is validated against, read fresh for every parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub window_size: usize,
    pub activity_count: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized input at byte {position}")]
    Malformed { position: usize },
    #[error("slice t{index} is outside t1..t{size}")]
    SliceOutOfRange { index: usize, size: usize },
    #[error("range t{start}-t{end} must run forward")]
    EmptyRange { start: usize, end: usize },
    #[error("activity a{index} is outside a1..a{count}")]
    ActivityOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceSpec {
    Set(Vec<usize>),
    Range { start: usize, end: usize },
}

impl SliceSpec {
    fn validate(&self, window_size: usize) -> Result<(), CommandError> {
        let in_window = |index: usize| {
            if index == 0 || index > window_size {
                Err(CommandError::SliceOutOfRange {
                    index,
                    size: window_size,
                })
            } else {
                Ok(())
            }
        };

        match self {
            SliceSpec::Set(slices) => slices.iter().try_for_each(|&index| in_window(index)),
            SliceSpec::Range { start, end } => {
                in_window(*start)?;
                in_window(*end)?;
                if start >= end {
                    return Err(CommandError::EmptyRange {
                        start: *start,
                        end: *end,
                    });
                }
                Ok(())
            }
        }
    }

    /// Display indices the spec covers. Ranges are inclusive; sets keep their
    /// order and any repeats.
    pub fn expand(self) -> Vec<usize> {
        match self {
            SliceSpec::Set(slices) => slices,
            SliceSpec::Range { start, end } => (start..=end).collect(),
        }
    }
}

pub fn parse(input: &str, limits: Limits) -> Result<Command, CommandError> {
    let input = input.trim().to_lowercase();
    let command = match input.as_str() {
        "q" | "quit" => Command::Quit,
        "+" => Command::PageForward,
        "-" => Command::PageBackward,
        "n" | "next" => Command::NextDay,
        "p" | "prior" => Command::PriorDay,
        "t" | "today" | "r" | "refresh" | "reset" => Command::Today,
        "y" | "yesterday" => Command::Yesterday,
        other => {
            let mut parser = Parser::new(other);
            match parser.peek() {
                Some(b't') => parser.assign_command(limits)?,
                Some(b'u') => parser.unassign_command(limits)?,
                _ => return Err(parser.malformed()),
            }
        }
    };
    Ok(command)
}

struct Parser<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            position: 0,
        }
    }

    fn assign_command(&mut self, limits: Limits) -> Result<Command, CommandError> {
        let spec = self.slice_spec()?;
        self.skip_whitespace();
        self.expect(b'a')?;
        let activity = self.number()?;
        self.finish()?;

        spec.validate(limits.window_size)?;
        if activity == 0 || activity > limits.activity_count {
            return Err(CommandError::ActivityOutOfRange {
                index: activity,
                count: limits.activity_count,
            });
        }

        Ok(Command::Assign {
            slices: spec.expand(),
            activity,
        })
    }

    fn unassign_command(&mut self, limits: Limits) -> Result<Command, CommandError> {
        self.expect(b'u')?;
        self.skip_whitespace();
        let spec = self.slice_spec()?;
        self.finish()?;

        spec.validate(limits.window_size)?;
        Ok(Command::Unassign {
            slices: spec.expand(),
        })
    }

    fn slice_spec(&mut self) -> Result<SliceSpec, CommandError> {
        self.expect(b't')?;
        let first = self.number()?;

        if self.eat(b'-') {
            self.eat(b't');
            let end = self.number()?;
            return Ok(SliceSpec::Range { start: first, end });
        }

        let mut slices = vec![first];
        loop {
            self.eat(b',');
            if self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
                self.position += 1;
            }
            if self.peek() != Some(b't') {
                break;
            }
            self.position += 1;
            slices.push(self.number()?);
        }
        Ok(SliceSpec::Set(slices))
    }

    fn number(&mut self) -> Result<usize, CommandError> {
        let start = self.position;
        while self.peek().is_some_and(|byte| byte.is_ascii_digit()) {
            self.position += 1;
        }
        std::str::from_utf8(&self.input[start..self.position])
            .ok()
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or(CommandError::Malformed { position: start })
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), CommandError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.malformed())
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    fn finish(&self) -> Result<(), CommandError> {
        if self.position == self.input.len() {
            Ok(())
        } else {
            Err(self.malformed())
        }
    }

    fn malformed(&self) -> CommandError {
        CommandError::Malformed {
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, CommandError, Limits, parse};

    const LIMITS: Limits = Limits {
        window_size: 12,
        activity_count: 5,
    };

    fn assign(slices: &[usize], activity: usize) -> Command {
        Command::Assign {
            slices: slices.to_vec(),
            activity,
        }
    }

    fn unassign(slices: &[usize]) -> Command {
        Command::Unassign {
            slices: slices.to_vec(),
        }
    }

    #[test]
    fn parses_literal_commands() {
        let cases = [
            ("q", Command::Quit),
            ("QUIT", Command::Quit),
            ("+", Command::PageForward),
            ("-", Command::PageBackward),
            ("n", Command::NextDay),
            ("Next", Command::NextDay),
            ("p", Command::PriorDay),
            ("prior", Command::PriorDay),
            ("t", Command::Today),
            ("today", Command::Today),
            ("r", Command::Today),
            ("refresh", Command::Today),
            ("reset", Command::Today),
            ("y", Command::Yesterday),
            ("yesterday", Command::Yesterday),
            ("  q  ", Command::Quit),
        ];
        for (input, expected) in cases {
            assert_eq!(parse(input, LIMITS), Ok(expected), "input {input:?}");
        }
    }

    #[test]
    fn accepts_slice_sets_in_any_separator_style() {
        let cases = [
            ("t1 a1", assign(&[1], 1)),
            ("t1a1", assign(&[1], 1)),
            ("T1 A1", assign(&[1], 1)),
            ("t3, t6 a2", assign(&[3, 6], 2)),
            ("t3,t6 a2", assign(&[3, 6], 2)),
            ("t3 t6 a2", assign(&[3, 6], 2)),
            ("t3t6 a2", assign(&[3, 6], 2)),
            ("t3t6a2", assign(&[3, 6], 2)),
            ("t12 t1   a5", assign(&[12, 1], 5)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse(input, LIMITS), Ok(expected), "input {input:?}");
        }
    }

    #[test]
    fn expands_ranges_inclusively() {
        let cases = [
            ("t7-t10 a5", assign(&[7, 8, 9, 10], 5)),
            ("t7-10 a5", assign(&[7, 8, 9, 10], 5)),
            ("t7-t10a5", assign(&[7, 8, 9, 10], 5)),
            ("t7-10a5", assign(&[7, 8, 9, 10], 5)),
            ("t1-t12 a1", assign(&(1..=12).collect::<Vec<_>>(), 1)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse(input, LIMITS), Ok(expected), "input {input:?}");
        }
    }

    #[test]
    fn keeps_repeated_slices() {
        assert_eq!(parse("t4t4 a3", LIMITS), Ok(assign(&[4, 4], 3)));
    }

    #[test]
    fn parses_unassignments() {
        let cases = [
            ("u t1", unassign(&[1])),
            ("u t3,t6", unassign(&[3, 6])),
            ("u t3, t6", unassign(&[3, 6])),
            ("u t3 t6", unassign(&[3, 6])),
            ("ut3t6", unassign(&[3, 6])),
            ("u t7-10", unassign(&[7, 8, 9, 10])),
            ("u t7-t10", unassign(&[7, 8, 9, 10])),
            ("ut7-10", unassign(&[7, 8, 9, 10])),
        ];
        for (input, expected) in cases {
            assert_eq!(parse(input, LIMITS), Ok(expected), "input {input:?}");
        }
    }

    #[test]
    fn rejects_malformed_input() {
        let cases = [
            "", "t1", "t1 a", "t1a", "t a1", "ta1", "ta", "x", "qq", "t1 a1 extra", "t1-t3t5 a1",
            "t1t3-5 a1", "t3 ,t6 a2", "t1 b1", "u", "u t", "u t1 a1", "u t1-", "a1", "t1-a1",
            "t99999999999999999999999 a1",
        ];
        for input in cases {
            assert!(
                matches!(parse(input, LIMITS), Err(CommandError::Malformed { .. })),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn rejects_indices_outside_the_window_and_activity_list() {
        assert_eq!(
            parse("t0-t1 a1", LIMITS),
            Err(CommandError::SliceOutOfRange { index: 0, size: 12 })
        );
        assert_eq!(
            parse("t1-t13 a1", LIMITS),
            Err(CommandError::SliceOutOfRange { index: 13, size: 12 })
        );
        assert_eq!(
            parse("t0 a1", LIMITS),
            Err(CommandError::SliceOutOfRange { index: 0, size: 12 })
        );
        assert_eq!(
            parse("t3t13 a1", LIMITS),
            Err(CommandError::SliceOutOfRange { index: 13, size: 12 })
        );
        assert_eq!(
            parse("u t13", LIMITS),
            Err(CommandError::SliceOutOfRange { index: 13, size: 12 })
        );
        assert_eq!(
            parse("t1 a6", LIMITS),
            Err(CommandError::ActivityOutOfRange { index: 6, count: 5 })
        );
        assert_eq!(
            parse("t1 a0", LIMITS),
            Err(CommandError::ActivityOutOfRange { index: 0, count: 5 })
        );
    }

    #[test]
    fn ranges_must_run_forward() {
        assert_eq!(
            parse("t1-t1 a1", LIMITS),
            Err(CommandError::EmptyRange { start: 1, end: 1 })
        );
        assert_eq!(
            parse("t2-t1 a1", LIMITS),
            Err(CommandError::EmptyRange { start: 2, end: 1 })
        );
        assert_eq!(
            parse("u t5-2", LIMITS),
            Err(CommandError::EmptyRange { start: 5, end: 2 })
        );
    }

    #[test]
    fn validates_against_the_supplied_limits() {
        let narrow = Limits {
            window_size: 4,
            activity_count: 0,
        };
        assert!(parse("u t1-4", narrow).is_ok());
        assert!(parse("u t5", narrow).is_err());
        assert_eq!(
            parse("t1 a1", narrow),
            Err(CommandError::ActivityOutOfRange { index: 1, count: 0 })
        );
    }
}
