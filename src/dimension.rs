use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize, Serializer};

use crate::entry::TimeEntry;

pub const NO_GOAL_COLOR: &str = "#94a3b8";
pub const OTHER_COLOR: &str = "#cbd5e1";

const NO_GOAL_LABEL: &str = "No goal";
const UNCATEGORIZED_LABEL: &str = "Uncategorized";
const UNTITLED_TASK_LABEL: &str = "Untitled task";
const OTHER_LABEL: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Goal,
    Task,
    Category,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Goal => "goal",
            Dimension::Task => "task",
            Dimension::Category => "category",
        }
    }
}

/// Identity of one group along a dimension.
///
/// Renders as the canonical `goal:<id>` / `task:<id>` / `taskname:<name>`
/// strings when displayed or serialized. Ids and category values that read
/// as `none`, `other` or start with `=` get a `=` prefix, so distinct keys
/// never render alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Goal(String),
    NoGoal,
    Task(String),
    TaskName(String),
    Category(String),
    NoCategory,
    Other(Dimension),
}

impl GroupKey {
    pub fn is_other(&self) -> bool {
        matches!(self, GroupKey::Other(_))
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::Goal(id) => write!(f, "goal:{}", Escaped(id)),
            GroupKey::NoGoal => write!(f, "goal:none"),
            GroupKey::Task(id) => write!(f, "task:{}", Escaped(id)),
            GroupKey::TaskName(name) => write!(f, "taskname:{name}"),
            GroupKey::Category(value) => write!(f, "category:{}", Escaped(value)),
            GroupKey::NoCategory => write!(f, "category:none"),
            GroupKey::Other(dimension) => write!(f, "{}:other", dimension.as_str()),
        }
    }
}

struct Escaped<'a>(&'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let reserved = matches!(self.0, "none" | "other") || self.0.starts_with('=');
        if reserved {
            write!(f, "={}", self.0)
        } else {
            f.write_str(self.0)
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedGroup {
    pub key: GroupKey,
    pub label: String,
    pub color: Option<String>,
}

impl ResolvedGroup {
    pub fn other(dimension: Dimension) -> Self {
        Self {
            key: GroupKey::Other(dimension),
            label: OTHER_LABEL.to_string(),
            color: Some(OTHER_COLOR.to_string()),
        }
    }
}

/// Maps entries onto groups. Category labels come from the host; values
/// without a label are shown as-is.
#[derive(Debug, Clone, Default)]
pub struct GroupResolver {
    category_labels: BTreeMap<String, String>,
}

impl GroupResolver {
    pub fn with_category_labels(category_labels: BTreeMap<String, String>) -> Self {
        Self { category_labels }
    }

    pub fn resolve(&self, entry: &TimeEntry, dimension: Dimension) -> ResolvedGroup {
        match dimension {
            Dimension::Goal => resolve_goal(entry),
            Dimension::Task => resolve_task(entry),
            Dimension::Category => self.resolve_category(entry),
        }
    }

    fn resolve_category(&self, entry: &TimeEntry) -> ResolvedGroup {
        match entry.category.as_deref() {
            Some(value) => ResolvedGroup {
                key: GroupKey::Category(value.to_string()),
                label: self
                    .category_labels
                    .get(value)
                    .cloned()
                    .unwrap_or_else(|| value.to_string()),
                color: None,
            },
            None => ResolvedGroup {
                key: GroupKey::NoCategory,
                label: UNCATEGORIZED_LABEL.to_string(),
                color: Some(NO_GOAL_COLOR.to_string()),
            },
        }
    }
}

pub fn resolve_group(entry: &TimeEntry, dimension: Dimension) -> ResolvedGroup {
    GroupResolver::default().resolve(entry, dimension)
}

/// Merge key for free-text task names: trimmed, inner whitespace collapsed,
/// lowercased.
pub fn normalize_task_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn resolve_goal(entry: &TimeEntry) -> ResolvedGroup {
    if let (Some(goal_id), Some(title)) = (entry.goal_id.as_deref(), entry.goal_title()) {
        return ResolvedGroup {
            key: GroupKey::Goal(goal_id.to_string()),
            label: title.to_string(),
            color: entry.goal_color().map(str::to_string),
        };
    }

    ResolvedGroup {
        key: GroupKey::NoGoal,
        label: NO_GOAL_LABEL.to_string(),
        color: Some(NO_GOAL_COLOR.to_string()),
    }
}

fn resolve_task(entry: &TimeEntry) -> ResolvedGroup {
    if let Some(task_id) = entry.task_id.as_deref() {
        return ResolvedGroup {
            key: GroupKey::Task(task_id.to_string()),
            label: entry
                .task_display_name()
                .map(str::to_string)
                .unwrap_or_else(|| UNTITLED_TASK_LABEL.to_string()),
            color: None,
        };
    }

    let name = entry
        .task_name
        .as_deref()
        .or(entry.task_title.as_deref())
        .unwrap_or_default();
    let trimmed = name.trim();
    ResolvedGroup {
        key: GroupKey::TaskName(normalize_task_name(name)),
        label: if trimmed.is_empty() {
            UNTITLED_TASK_LABEL.to_string()
        } else {
            trimmed.to_string()
        },
        color: None,
    }
}
