use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::dimension::{Dimension, GroupKey, ResolvedGroup};
use crate::entry::sum_minutes;

/// Per-group minute totals that remember the order groups were first seen.
#[derive(Debug, Clone, Default)]
pub struct GroupTotals {
    groups: Vec<(ResolvedGroup, i64)>,
    index: HashMap<GroupKey, usize>,
}

impl GroupTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, group: ResolvedGroup, minutes: i64) {
        match self.index.get(&group.key) {
            Some(&position) => {
                let total = &mut self.groups[position].1;
                *total = total.saturating_add(minutes);
            }
            None => {
                self.index.insert(group.key.clone(), self.groups.len());
                self.groups.push((group, minutes));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_for(&self, key: &GroupKey) -> Option<i64> {
        self.index.get(key).map(|&position| self.groups[position].1)
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResolvedGroup, i64)> {
        self.groups.iter().map(|(group, minutes)| (group, *minutes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stack {
    pub key: GroupKey,
    pub label: String,
    pub color: Option<String>,
    pub total_minutes: i64,
}

impl Stack {
    fn from_group(group: &ResolvedGroup, total_minutes: i64) -> Self {
        Self {
            key: group.key.clone(),
            label: group.label.clone(),
            color: group.color.clone(),
            total_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    /// Selected groups in rank order, followed by the Other stack when present.
    pub stacks: Vec<Stack>,
    /// Groups folded into the Other stack.
    pub folded: HashSet<GroupKey>,
}

impl Ranking {
    pub fn has_other(&self) -> bool {
        self.stacks.last().is_some_and(|stack| stack.key.is_other())
    }
}

/// Keeps the `top_n` largest groups and folds the rest into one Other stack.
///
/// Ties keep first-seen order, so the result is only as stable as the order
/// of the entries the totals were accumulated from.
pub fn select_top_groups(totals: &GroupTotals, top_n: usize, dimension: Dimension) -> Ranking {
    let mut ranked = totals.iter().collect::<Vec<_>>();
    ranked.sort_by(|left, right| right.1.cmp(&left.1));

    let split = top_n.min(ranked.len());
    let (selected, remainder) = ranked.split_at(split);

    let mut stacks = selected
        .iter()
        .map(|(group, minutes)| Stack::from_group(group, *minutes))
        .collect::<Vec<_>>();

    let folded = remainder
        .iter()
        .map(|(group, _)| group.key.clone())
        .collect::<HashSet<_>>();

    if !remainder.is_empty() {
        let other_total = sum_minutes(remainder.iter().map(|(_, minutes)| *minutes));
        stacks.push(Stack::from_group(
            &ResolvedGroup::other(dimension),
            other_total,
        ));
    }

    Ranking { stacks, folded }
}
