use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ID_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActivityError {
    #[error("activity index {index} is outside 1..={count}")]
    InvalidActivityIndex { index: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Activity {
    pub fn new(name: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            color: color.map(str::to_string),
            active: true,
        }
    }
}

fn default_active() -> bool {
    true
}

/// The active activities in configuration order. Position `n` is shown to the
/// user as `a{n + 1}`; build a fresh directory for every render so toggling an
/// activity never leaves stale indices behind.
#[derive(Debug, Clone)]
pub struct ActivityDirectory<'a> {
    active: Vec<&'a Activity>,
}

impl<'a> ActivityDirectory<'a> {
    pub fn new(activities: &'a [Activity]) -> Self {
        Self {
            active: activities.iter().filter(|activity| activity.active).collect(),
        }
    }

    pub fn active(&self) -> &[&'a Activity] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn by_display_index(&self, display_index: usize) -> Result<&'a Activity, ActivityError> {
        display_index
            .checked_sub(1)
            .and_then(|position| self.active.get(position))
            .copied()
            .ok_or(ActivityError::InvalidActivityIndex {
                index: display_index,
                count: self.active.len(),
            })
    }
}

/// Looks up any configured activity, active or not. Unknown ids are not an
/// error: historical slices may point at activities that were since removed.
pub fn by_id<'a>(activities: &'a [Activity], id: &str) -> Option<&'a Activity> {
    activities.iter().find(|activity| activity.id == id)
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityDirectory, ActivityError, by_id, generate_id};

    fn activity(id: &str, active: bool) -> Activity {
        Activity {
            id: id.to_string(),
            name: id.to_uppercase(),
            color: None,
            active,
        }
    }

    #[test]
    fn keeps_only_active_activities_in_order() {
        let activities = vec![
            activity("sleep", true),
            activity("old", false),
            activity("write", true),
            activity("walk", true),
        ];
        let directory = ActivityDirectory::new(&activities);
        let ids = directory
            .active()
            .iter()
            .map(|activity| activity.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["sleep", "write", "walk"]);
        assert_eq!(directory.by_display_index(2).expect("in range").id, "write");
    }

    #[test]
    fn indices_follow_the_current_active_flags() {
        let mut activities = vec![activity("a", true), activity("b", true)];
        assert_eq!(
            ActivityDirectory::new(&activities)
                .by_display_index(2)
                .expect("in range")
                .id,
            "b"
        );

        activities[0].active = false;
        let directory = ActivityDirectory::new(&activities);
        assert_eq!(directory.by_display_index(1).expect("in range").id, "b");
        assert_eq!(
            directory.by_display_index(2).unwrap_err(),
            ActivityError::InvalidActivityIndex { index: 2, count: 1 }
        );
    }

    #[test]
    fn rejects_zero_and_past_the_end() {
        let activities = vec![activity("a", true)];
        let directory = ActivityDirectory::new(&activities);
        assert!(directory.by_display_index(0).is_err());
        assert!(directory.by_display_index(2).is_err());
    }

    #[test]
    fn looks_up_inactive_activities_by_id() {
        let activities = vec![activity("a", true), activity("retired", false)];
        assert_eq!(
            by_id(&activities, "retired").map(|activity| activity.name.as_str()),
            Some("RETIRED")
        );
        assert!(by_id(&activities, "missing").is_none());
    }

    #[test]
    fn generates_distinct_ids() {
        let first = generate_id();
        let second = generate_id();
        assert_eq!(first.len(), 8);
        assert_ne!(first, second);
        assert!(Activity::new("Read", Some("blue")).active);
    }
}
