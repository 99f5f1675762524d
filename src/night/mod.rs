//! Night accounting: durations across midnight, the 20:00 night boundary,
//! and the date helpers the entry form and summaries are built on.
//!
//! A "night" runs from 20:00 to 20:00 the next day and is identified by the
//! date on which it starts. Only nocturnal sleep is bucketed that way; naps,
//! drowsiness and catch-up sleep stay on the date they were recorded under.

use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::config::Locale;
use crate::model::SleepType;

pub mod aggregate;

pub use aggregate::{
    daily_breakdown, group_by_night, timeline, DailyTotals, Distribution, NightGroup,
    TimelineSpan,
};

/// Clock hour at which a new night begins.
pub const NIGHT_THRESHOLD_HOUR: u8 = 20;

/// Minutes slept between `bed` and `wake`.
///
/// When `wake` is at or before `bed` the wake-up happens the next day, so two
/// identical times span a full day (1440 minutes) rather than zero.
pub fn sleep_duration_minutes(bed: Time, wake: Time) -> i64 {
    let mut span = wake - bed;
    if span <= Duration::ZERO {
        span += Duration::DAY;
    }
    span.whole_minutes()
}

/// `0min`, `45min`, `9h`, `1h 30min`.
pub fn format_duration(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours == 0 {
        return format!("{mins}min");
    }
    if mins == 0 {
        return format!("{hours}h");
    }
    format!("{hours}h {mins}min")
}

pub fn time_to_decimal(time: Time) -> f64 {
    f64::from(time.hour()) + f64::from(time.minute()) / 60.0
}

/// Position of `time` on a 20:00 to 20:00 axis: times before the threshold
/// belong to the following calendar day and are shifted by 24 hours.
pub fn night_scale_hours(time: Time) -> f64 {
    let decimal = time_to_decimal(time);
    if decimal < f64::from(NIGHT_THRESHOLD_HOUR) {
        decimal + 24.0
    } else {
        decimal
    }
}

/// Night bucket for an entry recorded on `date`.
pub fn night_date(date: Date, bed: Time, sleep_type: SleepType) -> Date {
    if sleep_type != SleepType::Nocturnal || bed.hour() >= NIGHT_THRESHOLD_HOUR {
        return date;
    }
    date.previous_day().unwrap_or(date)
}

/// Date pre-filled in the entry form: before 20:00 the user is most likely
/// logging the night that just ended, from 20:00 on the one about to start.
pub fn default_night_date(now: PrimitiveDateTime) -> Date {
    if now.hour() < NIGHT_THRESHOLD_HOUR {
        now.date().previous_day().unwrap_or(now.date())
    } else {
        now.date()
    }
}

pub fn format_night_label(night: Date, locale: Locale) -> String {
    let end = night.next_day().unwrap_or(night);
    match locale {
        Locale::En => format!(
            "Night of the {} to the {} of {} {}",
            ordinal(night.day()),
            ordinal(end.day()),
            end.month(),
            end.year()
        ),
        Locale::Fr => format!(
            "Nuit du {} au {} {} {}",
            night.day(),
            end.day(),
            french_month_abbrev(end.month()),
            end.year()
        ),
    }
}

/// Longest window the CLI and config accept, in days.
pub const MAX_WINDOW_DAYS: usize = 3660;

/// The last `n` calendar days ending at `today`, oldest first. Stops early
/// at the earliest representable date.
pub fn last_n_days(today: Date, n: usize) -> Vec<Date> {
    let reachable = usize::try_from((today - Date::MIN).whole_days())
        .unwrap_or(0)
        .saturating_add(1);
    let mut days = Vec::with_capacity(n.min(reachable));
    let mut cursor = Some(today);
    for _ in 0..n {
        let Some(day) = cursor else { break };
        days.push(day);
        cursor = day.previous_day();
    }
    days.reverse();
    days
}

pub fn now_local() -> OffsetDateTime {
    match OffsetDateTime::now_local() {
        Ok(now) => now,
        Err(err) => {
            tracing::warn!(%err, "local UTC offset unavailable, using UTC");
            OffsetDateTime::now_utc()
        }
    }
}

pub fn today_local() -> Date {
    now_local().date()
}

pub fn local_wall_clock() -> PrimitiveDateTime {
    let now = now_local();
    PrimitiveDateTime::new(now.date(), now.time())
}

fn ordinal(day: u8) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

fn french_month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "janv.",
        Month::February => "févr.",
        Month::March => "mars",
        Month::April => "avr.",
        Month::May => "mai",
        Month::June => "juin",
        Month::July => "juil.",
        Month::August => "août",
        Month::September => "sept.",
        Month::October => "oct.",
        Month::November => "nov.",
        Month::December => "déc.",
    }
}
