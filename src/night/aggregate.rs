use std::collections::{BTreeMap, HashSet};

use time::Date;

use super::night_scale_hours;
use crate::model::{Quality, SleepRecord, SleepType};

pub const SLEEP_TYPE_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightGroup {
    pub night: Date,
    pub records: Vec<SleepRecord>,
    /// Plain sum of every record's duration; overlapping periods count twice.
    pub total_minutes: i64,
}

/// Buckets records by night, most recent night first. Records keep their
/// input order inside a night.
pub fn group_by_night(records: &[SleepRecord]) -> Vec<NightGroup> {
    let mut buckets: BTreeMap<Date, Vec<SleepRecord>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(record.night())
            .or_default()
            .push(record.clone());
    }
    buckets
        .into_iter()
        .rev()
        .map(|(night, records)| {
            let total_minutes = records.iter().map(SleepRecord::duration_minutes).sum();
            NightGroup {
                night,
                records,
                total_minutes,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotals {
    pub date: Date,
    pub minutes_by_type: [i64; SLEEP_TYPE_COUNT],
    pub total_hours: f64,
    /// Trailing mean of `total_hours`, shorter at the start of the window.
    pub moving_average_hours: f64,
}

impl DailyTotals {
    pub fn minutes(&self, sleep_type: SleepType) -> i64 {
        self.minutes_by_type[sleep_type.index()]
    }

    pub fn total_minutes(&self) -> i64 {
        self.minutes_by_type.iter().sum()
    }
}

/// Per-day sleep totals over `window`, keyed by night bucket. Days with no
/// records are reported as zeros; records outside the window are ignored.
pub fn daily_breakdown(
    records: &[SleepRecord],
    window: &[Date],
    average_span: usize,
) -> Vec<DailyTotals> {
    let mut slots: BTreeMap<Date, [i64; SLEEP_TYPE_COUNT]> =
        window.iter().map(|date| (*date, [0; SLEEP_TYPE_COUNT])).collect();
    for record in records {
        if let Some(slot) = slots.get_mut(&record.night()) {
            slot[record.sleep_type.index()] += record.duration_minutes();
        }
    }

    let per_day: Vec<[i64; SLEEP_TYPE_COUNT]> = window
        .iter()
        .map(|date| slots.get(date).copied().unwrap_or_default())
        .collect();
    let totals: Vec<f64> = per_day
        .iter()
        .map(|minutes| minutes.iter().sum::<i64>() as f64 / 60.0)
        .collect();

    let span = average_span.max(1);
    window
        .iter()
        .enumerate()
        .map(|(index, date)| {
            let start = (index + 1).saturating_sub(span);
            let trailing = &totals[start..=index];
            let moving_average_hours = trailing.iter().sum::<f64>() / trailing.len() as f64;
            DailyTotals {
                date: *date,
                minutes_by_type: per_day[index],
                total_hours: totals[index],
                moving_average_hours,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    pub record_count: usize,
    pub minutes_by_type: [i64; SLEEP_TYPE_COUNT],
    pub sleep_quality: [usize; Quality::LEVELS],
    pub wake_quality: [usize; Quality::LEVELS],
}

impl Distribution {
    pub fn from_records(records: &[SleepRecord], filter: Option<SleepType>) -> Self {
        let mut distribution = Distribution::default();
        for record in records
            .iter()
            .filter(|record| filter.map_or(true, |wanted| record.sleep_type == wanted))
        {
            distribution.record_count += 1;
            distribution.minutes_by_type[record.sleep_type.index()] += record.duration_minutes();
            distribution.sleep_quality[record.sleep_quality.slot()] += 1;
            distribution.wake_quality[record.wake_quality.slot()] += 1;
        }
        distribution
    }

    pub fn minutes(&self, sleep_type: SleepType) -> i64 {
        self.minutes_by_type[sleep_type.index()]
    }

    pub fn total_minutes(&self) -> i64 {
        self.minutes_by_type.iter().sum()
    }

    /// Share of total sleep time spent in `sleep_type`, in percent.
    pub fn type_share(&self, sleep_type: SleepType) -> f64 {
        let total = self.total_minutes();
        if total == 0 {
            return 0.0;
        }
        self.minutes_by_type[sleep_type.index()] as f64 * 100.0 / total as f64
    }

    pub fn sleep_quality_count(&self, quality: Quality) -> usize {
        self.sleep_quality[quality.slot()]
    }

    pub fn wake_quality_count(&self, quality: Quality) -> usize {
        self.wake_quality[quality.slot()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSpan {
    pub night: Date,
    pub sleep_type: SleepType,
    pub record_id: String,
    /// Hours on the 20:00 to 20:00 axis, in `[20, 44)`.
    pub start: f64,
    pub end: f64,
}

/// Sleep periods of the nights in `window`, ordered by night then input order.
pub fn timeline(records: &[SleepRecord], window: &[Date]) -> Vec<TimelineSpan> {
    let wanted: HashSet<Date> = window.iter().copied().collect();
    let mut spans: Vec<TimelineSpan> = records
        .iter()
        .filter_map(|record| {
            let night = record.night();
            if !wanted.contains(&night) {
                return None;
            }
            let start = night_scale_hours(record.bed_time);
            let mut end = night_scale_hours(record.wake_time);
            if end <= start {
                end += 24.0;
            }
            Some(TimelineSpan {
                night,
                sleep_type: record.sleep_type,
                record_id: record.id.clone(),
                start,
                end,
            })
        })
        .collect();
    spans.sort_by_key(|span| span.night);
    spans
}
