//! Daily trigger list derived from the day's solar times.
//!
//! The scheduler holds three entries per day (open, interior light, close) and
//! one persistent recompute trigger. It never looks at the clock itself; the
//! control loop hands it the current local time each tick.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

use crate::geo::SolarTimes;
use crate::time::TimeOfDay;

/// What a schedule entry asks the door controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    OpenDoor,
    CloseDoor,
    ToggleInteriorLight,
}

impl Action {
    /// Order within a single minute: close first, then the light, then open.
    fn rank(self) -> u8 {
        match self {
            Action::CloseDoor => 0,
            Action::ToggleInteriorLight => 1,
            Action::OpenDoor => 2,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::OpenDoor => "open door",
            Action::CloseDoor => "close door",
            Action::ToggleInteriorLight => "toggle interior light",
        })
    }
}

/// One time-of-day trigger. Fires at most once between rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub trigger_time: TimeOfDay,
    pub action: Action,
    fired_today: bool,
}

impl ScheduleEntry {
    fn new(trigger_time: TimeOfDay, action: Action) -> Self {
        Self {
            trigger_time,
            action,
            fired_today: false,
        }
    }

    pub fn fired_today(&self) -> bool {
        self.fired_today
    }
}

/// Holds today's entries and decides when tomorrow's are due.
#[derive(Debug, Clone)]
pub struct DailyScheduler {
    entries: Vec<ScheduleEntry>,
    solar_times: Option<SolarTimes>,
    recompute_at: TimeOfDay,
    /// Last calendar date a rebuild was attempted, successful or not.
    last_attempt: Option<NaiveDate>,
}

impl DailyScheduler {
    /// An empty scheduler whose daily recompute runs at `recompute_at`.
    pub fn new(recompute_at: TimeOfDay) -> Self {
        Self {
            entries: Vec::new(),
            solar_times: None,
            recompute_at,
            last_attempt: None,
        }
    }

    /// Replace every entry with a fresh set for `solar_times`.
    ///
    /// Creates open at sunrise, toggle-light at `dusk - interior_light_offset`
    /// (clamped at midnight) and close at dusk, sorted by trigger time and then
    /// by the same-minute order of [`Action`]. Counts as the rebuild for
    /// `solar_times.date`.
    pub fn rebuild(
        &mut self,
        solar_times: SolarTimes,
        interior_light_offset: u16,
    ) -> &[ScheduleEntry] {
        let mut entries = vec![
            ScheduleEntry::new(solar_times.sunrise, Action::OpenDoor),
            ScheduleEntry::new(
                solar_times.dusk.saturating_sub_minutes(interior_light_offset),
                Action::ToggleInteriorLight,
            ),
            ScheduleEntry::new(solar_times.dusk, Action::CloseDoor),
        ];
        entries.sort_by_key(|entry| (entry.trigger_time, entry.action.rank()));

        self.entries = entries;
        self.solar_times = Some(solar_times);
        self.last_attempt = Some(solar_times.date);
        &self.entries
    }

    /// Actions whose trigger minute is `now` and that have not fired yet.
    ///
    /// Returned actions are marked fired and never returned again before the
    /// next rebuild. Matching is exact to the minute: a minute the loop never
    /// observed is skipped rather than caught up later.
    pub fn tick(&mut self, now: TimeOfDay) -> Vec<Action> {
        self.entries
            .iter_mut()
            .filter(|entry| !entry.fired_today && entry.trigger_time == now)
            .map(|entry| {
                entry.fired_today = true;
                entry.action
            })
            .collect()
    }

    /// Whether the daily recompute should run at local time `now`.
    ///
    /// True once per calendar date, from the recompute time onwards, unless a
    /// rebuild (or a failed attempt) already happened that date.
    pub fn recompute_due(&self, now: NaiveDateTime) -> bool {
        TimeOfDay::from(now.time()) >= self.recompute_at
            && self.last_attempt != Some(now.date())
    }

    /// Record a failed recompute so it is not retried until the next day.
    ///
    /// The previous entries and solar times stay in place.
    pub fn mark_attempted(&mut self, date: NaiveDate) {
        self.last_attempt = Some(date);
    }

    /// Re-arm the last good solar times for `date` after a failed recompute.
    ///
    /// Yesterday's times fire again today. Returns the date the times were
    /// computed for, or `None` (after marking `date` attempted) when there is
    /// nothing to carry forward.
    pub fn carry_forward(
        &mut self,
        date: NaiveDate,
        interior_light_offset: u16,
    ) -> Option<NaiveDate> {
        let Some(previous) = self.solar_times else {
            self.mark_attempted(date);
            return None;
        };
        self.rebuild(SolarTimes { date, ..previous }, interior_light_offset);
        Some(previous.date)
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn solar_times(&self) -> Option<&SolarTimes> {
        self.solar_times.as_ref()
    }

    pub fn recompute_at(&self) -> TimeOfDay {
        self.recompute_at
    }

    /// The next entry that has not fired and is still ahead of `now`.
    pub fn next_pending(&self, now: TimeOfDay) -> Option<&ScheduleEntry> {
        self.entries
            .iter()
            .find(|entry| !entry.fired_today && entry.trigger_time >= now)
    }
}
