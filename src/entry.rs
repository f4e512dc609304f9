use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRef {
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// One logged interval as handed over by the query layer.
///
/// `calendar_date` is already resolved to the local day the entry belongs to
/// and `started_at` is a local wall-clock timestamp; nothing in this crate
/// converts between time zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub calendar_date: NaiveDate,
    pub duration_minutes: i64,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub task_title: Option<String>,
    #[serde(default)]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub goal: Option<GoalRef>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Whether an entry can be placed on the hour-of-day axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Timed(NaiveDateTime),
    Untimed,
}

impl TimeEntry {
    pub fn new(id: impl Into<String>, calendar_date: NaiveDate, duration_minutes: i64) -> Self {
        Self {
            id: id.into(),
            calendar_date,
            duration_minutes,
            started_at: None,
            task_id: None,
            task_name: None,
            task_title: None,
            goal_id: None,
            goal: None,
            category: None,
        }
    }

    pub fn placement(&self) -> Placement {
        match self.started_at {
            Some(started_at) => Placement::Timed(started_at),
            None => Placement::Untimed,
        }
    }

    /// Minutes this entry contributes to any aggregate. Non-positive
    /// durations contribute nothing.
    pub fn counted_minutes(&self) -> i64 {
        self.duration_minutes.max(0)
    }

    pub fn goal_title(&self) -> Option<&str> {
        self.goal.as_ref().and_then(|goal| goal.title.as_deref())
    }

    pub fn goal_color(&self) -> Option<&str> {
        self.goal.as_ref().and_then(|goal| goal.color.as_deref())
    }

    /// Display name of the task: the title when present, else the free-text name.
    pub fn task_display_name(&self) -> Option<&str> {
        self.task_title.as_deref().or(self.task_name.as_deref())
    }

    pub fn with_start(mut self, started_at: NaiveDateTime) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_task(mut self, task_id: Option<&str>, task_name: &str) -> Self {
        self.task_id = task_id.map(str::to_string);
        self.task_name = Some(task_name.to_string());
        self
    }

    pub fn with_goal(mut self, goal_id: &str, title: &str, color: Option<&str>) -> Self {
        self.goal_id = Some(goal_id.to_string());
        self.goal = Some(GoalRef {
            title: Some(title.to_string()),
            color: color.map(str::to_string),
        });
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

/// Sums minute totals, saturating instead of overflowing.
pub(crate) fn sum_minutes(minutes: impl IntoIterator<Item = i64>) -> i64 {
    minutes.into_iter().fold(0, i64::saturating_add)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Placement, TimeEntry};

    #[test]
    fn decodes_sparse_json_entry() {
        let entry: TimeEntry = serde_json::from_str(
            r#"{"id":"e1","calendar_date":"2024-03-04","duration_minutes":30,"started_at":"2024-03-04T09:15:00"}"#,
        )
        .expect("entry should decode");

        assert_eq!(entry.calendar_date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert!(entry.goal.is_none());
        assert!(matches!(entry.placement(), Placement::Timed(_)));
    }

    #[test]
    fn title_wins_over_name() {
        let mut entry = TimeEntry::new("e1", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), 10)
            .with_task(Some("t1"), "email");
        assert_eq!(entry.task_display_name(), Some("email"));

        entry.task_title = Some("Inbox zero".to_string());
        assert_eq!(entry.task_display_name(), Some("Inbox zero"));
    }

    #[test]
    fn negative_duration_counts_as_zero() {
        let entry = TimeEntry::new("e1", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), -5);
        assert_eq!(entry.counted_minutes(), 0);
        assert_eq!(entry.placement(), Placement::Untimed);
    }
}
