use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::grid::{Day, SliceRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse day record: {0}")]
    JsonDecode(serde_json::Error),
    #[error("failed to encode day record: {0}")]
    JsonEncode(serde_json::Error),
}

/// Persistence for one user's days. A date with no record loads as an empty day.
pub trait DayStore {
    fn load(&self, date: NaiveDate) -> Result<Day, StorageError>;
    fn save(&self, day: &Day) -> Result<(), StorageError>;
}

/// Stores each day as `<root>/<user_id>/days/<YYYY-MM-DD>.json`, holding the
/// sparse slice map `{"<index>": {"activity_id": "<id>"}}`.
#[derive(Debug, Clone)]
pub struct JsonDayStore {
    days_dir: PathBuf,
}

impl JsonDayStore {
    pub fn new(data_dir: &Path, user_id: &str) -> Self {
        Self {
            days_dir: data_dir.join(user_id).join("days"),
        }
    }

    pub fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.days_dir
            .join(format!("{}.json", date.format(DATE_FORMAT)))
    }
}

impl DayStore for JsonDayStore {
    fn load(&self, date: NaiveDate) -> Result<Day, StorageError> {
        let path = self.day_path(date);
        let raw = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(%date, "no stored record, starting an empty day");
                return Ok(Day::new(date));
            }
            Err(err) => return Err(StorageError::Io(err)),
        };

        if raw.trim().is_empty() {
            return Ok(Day::new(date));
        }

        let records: BTreeMap<String, SliceRecord> =
            serde_json::from_str(&raw).map_err(StorageError::JsonDecode)?;
        info!(%date, assigned = records.len(), "loaded day");
        Ok(Day::from_sparse_map(date, records))
    }

    fn save(&self, day: &Day) -> Result<(), StorageError> {
        fs::create_dir_all(&self.days_dir)?;

        let records = day.to_sparse_map();
        let body = serde_json::to_string_pretty(&records).map_err(StorageError::JsonEncode)?;
        fs::write(self.day_path(day.date()), body)?;
        info!(date = %day.date(), assigned = records.len(), "saved day");
        Ok(())
    }
}
