//! Read-side queries and the dashboard view.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::EngineError;
use crate::store::{AggregateWriter, IdGenerator, TimeEntryStore};
use crate::time_entry::{TimeEntry, clamp_storable};
use crate::types::{EntryId, PageRequest, UserId};

use super::TimeEntryService;

/// How far back the dashboard's "most active" section looks.
pub const DASHBOARD_WINDOW: TimeDelta = TimeDelta::days(7);
/// Size of the dashboard's "most active" section.
pub const DASHBOARD_TOP_LIMIT: u64 = 5;
/// Size of the dashboard's activity feed.
pub const DASHBOARD_RECENT_LIMIT: u64 = 20;

/// Dashboard view for one owner.
///
/// The sections are independent queries: an entry can appear in both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Entries stopped in the last week, shortest duration first.
    pub most_active: Vec<TimeEntry>,
    /// Most recently started entries, newest first.
    pub recent: Vec<TimeEntry>,
}

impl Dashboard {
    /// Both sections appended, without deduplication.
    pub fn into_entries(self) -> Vec<TimeEntry> {
        let mut entries = self.most_active;
        entries.extend(self.recent);
        entries
    }
}

impl<S, G> TimeEntryService<S, G>
where
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    /// Loads one entry by id.
    pub fn get(&self, id: &str) -> Result<TimeEntry, EngineError> {
        let entry_id = EntryId::parse(id)?;
        self.load_entry(&entry_id)
    }

    /// Running entries for `owner`, ordered by id.
    pub fn running(&self, owner: &str, page: PageRequest) -> Result<Vec<TimeEntry>, EngineError> {
        let user_id = UserId::parse(owner)?;
        self.store
            .list_running(&user_id, page)
            .map_err(EngineError::store("list running time entries"))
    }

    /// Entries for `owner` created within `[from, to]`, ordered by id.
    ///
    /// Bounds beyond the storable years are clamped, so an open-ended range
    /// such as `[from, DateTime::<Utc>::MAX_UTC]` still matches.
    pub fn range(
        &self,
        owner: &str,
        page: PageRequest,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, EngineError> {
        let user_id = UserId::parse(owner)?;
        if to < from {
            return Ok(Vec::new());
        }
        let (from, to) = (clamp_storable(from), clamp_storable(to));
        self.store
            .list_created_between(&user_id, page, from, to)
            .map_err(EngineError::store("list time entries in range"))
    }

    /// The dashboard for `owner` as of `now`.
    pub fn dashboard(&self, owner: &str, now: DateTime<Utc>) -> Result<Dashboard, EngineError> {
        let user_id = UserId::parse(owner)?;
        let most_active = self
            .store
            .list_stopped_between(&user_id, now - DASHBOARD_WINDOW, now, DASHBOARD_TOP_LIMIT)
            .map_err(EngineError::store("list most active time entries"))?;
        let recent = self
            .store
            .list_recent(&user_id, DASHBOARD_RECENT_LIMIT)
            .map_err(EngineError::store("list recent time entries"))?;
        tracing::debug!(
            user_id = %user_id,
            most_active = most_active.len(),
            recent = recent.len(),
            "built dashboard"
        );
        Ok(Dashboard {
            most_active,
            recent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    use crate::error::ErrorKind;
    use crate::test_support::{Fixture, OWNER, OTHER_OWNER, at, entry_fields, new_entry};

    fn page(page: u32, size: u32) -> PageRequest {
        PageRequest::new(page, size).unwrap()
    }

    #[test]
    fn test_get_distinguishes_invalid_from_missing() {
        let fx = Fixture::new();
        assert_eq!(
            fx.service.get("xyz").unwrap_err().kind(),
            ErrorKind::InvalidId
        );
        assert_eq!(
            fx.service
                .get("00000000-0000-0000-0000-000000000099")
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_running_filters_owner_and_state() {
        let mut fx = Fixture::new();
        let mine = fx
            .service
            .start(&entry_fields(), OWNER, at(9, 0, 0))
            .unwrap();
        fx.service
            .start(&entry_fields(), OTHER_OWNER, at(9, 0, 0))
            .unwrap();
        fx.service
            .create(&new_entry(at(1, 0, 0), 60), OWNER, at(2, 0, 0))
            .unwrap();

        let running = fx.service.running(OWNER, page(1, 10)).unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id, mine.id);

        fx.service.stop(&mine.id.to_string(), at(10, 0, 0)).unwrap();
        assert!(fx.service.running(OWNER, page(1, 10)).unwrap().is_empty());
    }

    #[test]
    fn test_range_pages_are_disjoint() {
        let mut fx = Fixture::new();
        for hour in 0..3 {
            fx.service
                .create(&new_entry(at(hour, 0, 0), 60), OWNER, at(hour, 5, 0))
                .unwrap();
        }

        let first = fx
            .service
            .range(OWNER, page(1, 1), at(0, 0, 0), at(23, 0, 0))
            .unwrap();
        let second = fx
            .service
            .range(OWNER, page(2, 1), at(0, 0, 0), at(23, 0, 0))
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].id, second[0].id);
        assert!(first[0].id < second[0].id);
    }

    #[test]
    fn test_range_bounds_are_inclusive_and_filter_date_created() {
        let mut fx = Fixture::new();
        fx.service
            .create(&new_entry(at(0, 0, 0), 60), OWNER, at(8, 0, 0))
            .unwrap();
        fx.service
            .create(&new_entry(at(0, 0, 0), 60), OWNER, at(12, 0, 0))
            .unwrap();

        let hits = fx
            .service
            .range(OWNER, page(1, 10), at(8, 0, 0), at(8, 0, 0))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].date_created, at(8, 0, 0));

        let inverted = fx
            .service
            .range(OWNER, page(1, 10), at(12, 0, 0), at(8, 0, 0))
            .unwrap();
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_dashboard_combines_sections_without_dedup() {
        let mut fx = Fixture::new();
        let now = at(12, 0, 0);
        let long = fx
            .service
            .create(&new_entry(at(1, 0, 0), 7_200), OWNER, now)
            .unwrap();
        let short = fx
            .service
            .create(&new_entry(at(4, 0, 0), 600), OWNER, now)
            .unwrap();
        let old_start = Utc.with_ymd_and_hms(2021, 9, 1, 0, 0, 0).unwrap();
        let old = fx
            .service
            .create(&new_entry(old_start, 600), OWNER, now)
            .unwrap();
        fx.service
            .create(&new_entry(at(5, 0, 0), 60), OTHER_OWNER, now)
            .unwrap();

        let dashboard = fx.service.dashboard(OWNER, now).unwrap();
        let most_active: Vec<_> = dashboard.most_active.iter().map(|e| e.id).collect();
        assert_eq!(most_active, vec![short.id, long.id]);
        let recent: Vec<_> = dashboard.recent.iter().map(|e| e.id).collect();
        assert_eq!(recent, vec![short.id, long.id, old.id]);

        let entries = dashboard.into_entries();
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn test_dashboard_sections_are_capped() {
        let mut fx = Fixture::new();
        for minute in 0..25 {
            fx.service
                .create(&new_entry(at(1, minute, 0), 60), OWNER, at(3, 0, 0))
                .unwrap();
        }
        let dashboard = fx.service.dashboard(OWNER, at(3, 0, 0)).unwrap();
        assert_eq!(dashboard.most_active.len(), 5);
        assert_eq!(dashboard.recent.len(), 20);
        assert_eq!(dashboard.recent[0].start, at(1, 24, 0));
    }
}
