//! In-memory holder for the most recently fetched schedule.

use chrono::{Duration, NaiveDateTime};

use crate::model::PickupRecord;

/// Records from one successful refresh together with the time they were fetched.
#[derive(Debug, Clone)]
pub(crate) struct ScheduleCache {
    records: Vec<PickupRecord>,
    fetched_at: NaiveDateTime,
}

impl ScheduleCache {
    pub(crate) fn new(records: Vec<PickupRecord>, fetched_at: NaiveDateTime) -> Self {
        Self {
            records,
            fetched_at,
        }
    }

    pub(crate) fn records(&self) -> &[PickupRecord] {
        &self.records
    }

    pub(crate) fn fetched_at(&self) -> NaiveDateTime {
        self.fetched_at
    }
}

/// Whether `cache` must be refreshed at `now`: absent, or older than `ttl`.
pub(crate) fn is_stale(cache: Option<&ScheduleCache>, now: NaiveDateTime, ttl: Duration) -> bool {
    cache.is_none_or(|cached| now - cached.fetched_at > ttl)
}
