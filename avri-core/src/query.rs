//! Date-relative queries over a pickup schedule.
//!
//! All queries keep records whose day is on or after the threshold and order
//! them by day with a stable sort, so records sharing a day keep their
//! schedule order.

use std::collections::HashMap;

use chrono::{NaiveDateTime, NaiveTime};

use crate::model::PickupRecord;

/// Midnight at the start of the day containing `now`.
#[must_use]
pub fn start_of_day(now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(NaiveTime::MIN)
}

/// Earliest pickup on or after `threshold`.
#[must_use]
pub fn upcoming(records: &[PickupRecord], threshold: NaiveDateTime) -> Option<PickupRecord> {
    upcoming_sorted(records, threshold).first().map(|&record| record.clone())
}

/// Earliest pickup on or after `threshold` for every waste type, ordered by day.
#[must_use]
pub fn upcoming_of_each(records: &[PickupRecord], threshold: NaiveDateTime) -> Vec<PickupRecord> {
    // name -> (first position in the sorted sequence, earliest day)
    let mut earliest: HashMap<&str, (usize, NaiveDateTime)> = HashMap::new();

    for (position, record) in upcoming_sorted(records, threshold).into_iter().enumerate() {
        earliest
            .entry(record.name.as_str())
            .and_modify(|(_, day)| *day = (*day).min(record.day))
            .or_insert((position, record.day));
    }

    let mut reduced: Vec<_> = earliest.into_iter().collect();
    reduced.sort_by_key(|&(_, (position, day))| (day, position));

    reduced
        .into_iter()
        .map(|(name, (_, day))| PickupRecord::new(name, day))
        .collect()
}

/// Every pickup on or after `threshold`, ordered by day.
#[must_use]
pub fn all_upcoming(records: &[PickupRecord], threshold: NaiveDateTime) -> Vec<PickupRecord> {
    upcoming_sorted(records, threshold)
        .into_iter()
        .cloned()
        .collect()
}

fn upcoming_sorted(records: &[PickupRecord], threshold: NaiveDateTime) -> Vec<&PickupRecord> {
    let mut selected: Vec<&PickupRecord> = records
        .iter()
        .filter(|record| record.day >= threshold)
        .collect();
    selected.sort_by_key(|record| record.day);
    selected
}
