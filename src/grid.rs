use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const SLICES_PER_DAY: usize = 96;
pub const MINUTES_PER_SLICE: u32 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("slice index {0} is outside 0..{SLICES_PER_DAY}")]
    OutOfRange(usize),
}

/// One 15 minute unit of a day, optionally tagged with an activity id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSlice {
    pub index: usize,
    pub activity_id: Option<String>,
}

impl TimeSlice {
    pub fn is_assigned(&self) -> bool {
        self.activity_id.is_some()
    }

    pub fn label(&self) -> String {
        slice_label(self.index)
    }
}

/// A calendar day of exactly [`SLICES_PER_DAY`] slices. Slice `i` always covers
/// wall-clock minutes `[i * 15, i * 15 + 15)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    date: NaiveDate,
    slices: Vec<TimeSlice>,
}

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        let slices = (0..SLICES_PER_DAY)
            .map(|index| TimeSlice {
                index,
                activity_id: None,
            })
            .collect();
        Self { date, slices }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn slices(&self) -> &[TimeSlice] {
        &self.slices
    }

    pub fn get(&self, index: usize) -> Result<&TimeSlice, GridError> {
        self.slices.get(index).ok_or(GridError::OutOfRange(index))
    }

    pub fn set(&mut self, index: usize, activity_id: Option<String>) -> Result<(), GridError> {
        let slice = self
            .slices
            .get_mut(index)
            .ok_or(GridError::OutOfRange(index))?;
        slice.activity_id = activity_id.filter(|id| !id.is_empty());
        Ok(())
    }

    /// Number of assigned slices per activity id.
    pub fn slice_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for slice in &self.slices {
            if let Some(id) = slice.activity_id.as_deref() {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn to_sparse_map(&self) -> BTreeMap<String, SliceRecord> {
        self.slices
            .iter()
            .filter_map(|slice| {
                slice.activity_id.as_ref().map(|id| {
                    (
                        slice.index.to_string(),
                        SliceRecord {
                            activity_id: Some(id.clone()),
                        },
                    )
                })
            })
            .collect()
    }

    pub fn from_sparse_map(date: NaiveDate, records: BTreeMap<String, SliceRecord>) -> Self {
        let mut day = Day::new(date);
        for (key, record) in records {
            let Some(activity_id) = record.activity_id.filter(|id| !id.is_empty()) else {
                warn!(%date, key = key.as_str(), "ignoring stored slice without an activity id");
                continue;
            };
            let assigned = key
                .parse::<usize>()
                .map_err(|_| GridError::OutOfRange(usize::MAX))
                .and_then(|index| day.set(index, Some(activity_id)));
            if assigned.is_err() {
                warn!(%date, key = key.as_str(), "ignoring stored slice with invalid index");
            }
        }
        day
    }
}

/// Stored form of one assigned slice: `{"activity_id": "<id>"}`. A null or
/// missing id reads as unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
}

pub fn slice_for_time(time: NaiveTime) -> usize {
    (time.hour() * 4 + time.minute() / MINUTES_PER_SLICE) as usize
}

/// 24h wall-clock span of a slice, e.g. `9:00 - 9:15` or `23:45 - 0:00`.
pub fn slice_label(index: usize) -> String {
    span_label(index, index)
}

/// Wall-clock span from the start of slice `first` to the end of slice `last`.
pub fn span_label(first: usize, last: usize) -> String {
    let start = first * MINUTES_PER_SLICE as usize;
    let end = ((last + 1) * MINUTES_PER_SLICE as usize) % (24 * 60);
    format!(
        "{}:{:02} - {}:{:02}",
        start / 60,
        start % 60,
        end / 60,
        end % 60
    )
}

pub fn slices_duration(count: usize) -> Duration {
    Duration::minutes(count as i64 * i64::from(MINUTES_PER_SLICE))
}

pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, NaiveTime};

    use super::{
        Day, GridError, SLICES_PER_DAY, SliceRecord, format_duration, slice_for_time, slice_label,
        slices_duration, span_label,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
    }

    #[test]
    fn new_day_has_every_slice_unassigned() {
        let day = Day::new(date());
        assert_eq!(day.slices().len(), SLICES_PER_DAY);
        for (position, slice) in day.slices().iter().enumerate() {
            assert_eq!(slice.index, position);
            assert!(!slice.is_assigned());
        }
    }

    #[test]
    fn set_changes_only_the_target_slice() {
        let mut day = Day::new(date());
        let before = day.clone();
        day.set(40, Some("write".to_string())).expect("in range");

        for (left, right) in day.slices().iter().zip(before.slices()) {
            if left.index == 40 {
                assert_eq!(left.activity_id.as_deref(), Some("write"));
            } else {
                assert_eq!(left, right);
            }
        }

        day.set(40, None).expect("in range");
        assert_eq!(day, before);
    }

    #[test]
    fn rejects_indices_past_the_last_slice() {
        let mut day = Day::new(date());
        assert_eq!(day.get(96).unwrap_err(), GridError::OutOfRange(96));
        assert_eq!(
            day.set(200, Some("x".to_string())).unwrap_err(),
            GridError::OutOfRange(200)
        );
        assert!(day.get(95).is_ok());
    }

    #[test]
    fn empty_activity_id_clears_the_slice() {
        let mut day = Day::new(date());
        day.set(3, Some(String::new())).expect("in range");
        assert!(!day.get(3).expect("in range").is_assigned());
    }

    #[test]
    fn sparse_map_holds_only_assigned_slices() {
        let mut day = Day::new(date());
        day.set(0, Some("sleep".to_string())).expect("in range");
        day.set(95, Some("read".to_string())).expect("in range");

        let map = day.to_sparse_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["0"].activity_id.as_deref(), Some("sleep"));
        assert_eq!(map["95"].activity_id.as_deref(), Some("read"));

        let json = serde_json::to_string(&map).expect("encodes");
        assert_eq!(
            json,
            r#"{"0":{"activity_id":"sleep"},"95":{"activity_id":"read"}}"#
        );
        assert_eq!(Day::from_sparse_map(date(), map), day);
    }

    #[test]
    fn sparse_map_skips_unusable_keys() {
        let mut records = BTreeMap::new();
        let record = |id: &str| SliceRecord {
            activity_id: Some(id.to_string()),
        };
        records.insert("12".to_string(), record("walk"));
        records.insert("96".to_string(), record("late"));
        records.insert("noon".to_string(), record("lunch"));

        let day = Day::from_sparse_map(date(), records);
        assert_eq!(day.slice_counts().len(), 1);
        assert_eq!(day.get(12).expect("in range").activity_id.as_deref(), Some("walk"));
    }

    #[test]
    fn null_or_missing_activity_ids_read_as_unassigned() {
        let raw = r#"{
            "6": {"activity_id": "sleep"},
            "7": {"activity_id": null},
            "8": {},
            "9": {"activity_id": ""}
        }"#;
        let records: BTreeMap<String, SliceRecord> =
            serde_json::from_str(raw).expect("slices without ids still decode");

        let day = Day::from_sparse_map(date(), records);
        assert_eq!(day.get(6).expect("in range").activity_id.as_deref(), Some("sleep"));
        for index in 7..=9 {
            assert!(!day.get(index).expect("in range").is_assigned());
        }
        assert_eq!(day.to_sparse_map().len(), 1);
    }

    #[test]
    fn counts_slices_per_activity() {
        let mut day = Day::new(date());
        for index in 10..14 {
            day.set(index, Some("write".to_string())).expect("in range");
        }
        day.set(50, Some("walk".to_string())).expect("in range");

        let counts = day.slice_counts();
        assert_eq!(counts["write"], 4);
        assert_eq!(counts["walk"], 1);
    }

    #[test]
    fn maps_wall_clock_to_slices() {
        let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("valid time");
        assert_eq!(slice_for_time(at(0, 0)), 0);
        assert_eq!(slice_for_time(at(0, 14)), 0);
        assert_eq!(slice_for_time(at(1, 15)), 5);
        assert_eq!(slice_for_time(at(23, 59)), 95);
    }

    #[test]
    fn labels_slice_spans() {
        assert_eq!(slice_label(0), "0:00 - 0:15");
        assert_eq!(slice_label(37), "9:15 - 9:30");
        assert_eq!(slice_label(39), "9:45 - 10:00");
        assert_eq!(slice_label(95), "23:45 - 0:00");
        assert_eq!(span_label(37, 40), "9:15 - 10:15");
        assert_eq!(span_label(84, 95), "21:00 - 0:00");
    }

    #[test]
    fn formats_slice_totals() {
        assert_eq!(format_duration(slices_duration(0)), "00:00");
        assert_eq!(format_duration(slices_duration(6)), "01:30");
        assert_eq!(format_duration(slices_duration(96)), "24:00");
    }
}
