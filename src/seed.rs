//! Sample data for demos and manual testing. Only reachable through the
//! `seed` and `clear` commands.

use anyhow::{Context, Result};
use rand::Rng;
use time::{Date, Time};

use crate::model::{Quality, SleepDraft, SleepType};
use crate::night::last_n_days;
use crate::storage::SleepStore;

const CATCHUP_PROBABILITY: f64 = 0.3;
const NAP_PROBABILITY: f64 = 0.7;

/// Plausible entries for each of the last `days` days ending at `today`:
/// one night, sometimes an early-morning catch-up, often an afternoon nap.
pub fn generate_sample<R: Rng + ?Sized>(today: Date, days: usize, rng: &mut R) -> Vec<SleepDraft> {
    let mut drafts = Vec::new();
    for date in last_n_days(today, days) {
        drafts.push(sample_period(
            rng,
            date,
            SleepType::Nocturnal,
            22 * 60..24 * 60,
            180..=300,
        ));
        if rng.gen_bool(CATCHUP_PROBABILITY) {
            drafts.push(sample_period(rng, date, SleepType::Catchup, 5 * 60..6 * 60, 60..=120));
        }
        if rng.gen_bool(NAP_PROBABILITY) {
            drafts.push(sample_period(rng, date, SleepType::Nap, 12 * 60 + 30..14 * 60, 30..=90));
        }
    }
    drafts
}

pub fn insert_sample(store: &dyn SleepStore, today: Date, days: usize) -> Result<usize> {
    let drafts = generate_sample(today, days, &mut rand::thread_rng());
    let inserted = store
        .insert_many(drafts)
        .context("inserting sample entries")?;
    tracing::info!(count = inserted.len(), days, "inserted sample sleep entries");
    Ok(inserted.len())
}

pub fn clear_all(store: &dyn SleepStore) -> Result<usize> {
    let removed = store.delete_all().context("clearing sleep entries")?;
    tracing::info!(count = removed, "cleared sleep entries");
    Ok(removed)
}

fn sample_period<R: Rng + ?Sized>(
    rng: &mut R,
    date: Date,
    sleep_type: SleepType,
    bed_window: std::ops::Range<u16>,
    duration: std::ops::RangeInclusive<u16>,
) -> SleepDraft {
    let bed = rng.gen_range(bed_window);
    let wake = bed + rng.gen_range(duration);
    SleepDraft {
        date,
        sleep_type,
        bed_time: clock_from_minutes(bed),
        wake_time: clock_from_minutes(wake),
        sleep_quality: skewed_quality(rng),
        wake_quality: skewed_quality(rng),
    }
}

fn clock_from_minutes(minutes: u16) -> Time {
    let hour = ((minutes / 60) % 24) as u8;
    let minute = (minutes % 60) as u8;
    Time::from_hms(hour, minute, 0).unwrap_or(Time::MIDNIGHT)
}

/// 5 % very poor, 10 % poor, 25 % average, 35 % good, 25 % very good.
fn skewed_quality<R: Rng + ?Sized>(rng: &mut R) -> Quality {
    let roll: f64 = rng.gen();
    let level = match roll {
        r if r < 0.05 => 1,
        r if r < 0.15 => 2,
        r if r < 0.40 => 3,
        r if r < 0.75 => 4,
        _ => 5,
    };
    Quality::new(level).unwrap_or_default()
}
