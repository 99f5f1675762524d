use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use time::{Date, PrimitiveDateTime, Time};
use unicode_width::UnicodeWidthStr;

use crate::config::{AppConfig, EntryDefaults, Locale};
use crate::model::{self, ModelError, Quality, SleepDraft, SleepPatch, SleepRecord, SleepType};
use crate::night::{self, DailyTotals, Distribution, NightGroup, TimelineSpan};
use crate::seed;
use crate::storage::{self, SleepStore};

const TIMELINE_CELLS_PER_HOUR: usize = 2;
const TIMELINE_HOURS: usize = 24;

#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Date the entry is recorded under (defaults to the night in progress)
    #[arg(long, value_parser = date_arg)]
    pub date: Option<Date>,
    /// nocturnal, nap, drowsiness or catchup
    #[arg(long = "type", value_parser = sleep_type_arg)]
    pub sleep_type: Option<SleepType>,
    /// Bed time, HH:MM
    #[arg(long, value_parser = clock_arg)]
    pub bed: Option<Time>,
    /// Wake time, HH:MM
    #[arg(long, value_parser = clock_arg)]
    pub wake: Option<Time>,
    /// Sleep quality from 1 to 5
    #[arg(long, value_parser = quality_arg)]
    pub sleep_quality: Option<Quality>,
    /// Wake quality from 1 to 5
    #[arg(long, value_parser = quality_arg)]
    pub wake_quality: Option<Quality>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Entry id or unique id prefix
    pub id: String,
    #[command(flatten)]
    pub fields: AddArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Entry id or unique id prefix
    pub id: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only show the most recent N nights
    #[arg(long)]
    pub nights: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// First recorded date (inclusive)
    #[arg(value_parser = date_arg)]
    pub start: Date,
    /// Last recorded date (inclusive)
    #[arg(value_parser = date_arg)]
    pub end: Date,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    /// Number of days to summarise (defaults to `window_days` from the config)
    #[arg(long, value_parser = days_arg)]
    pub days: Option<usize>,
    /// Restrict the distribution to one sleep type
    #[arg(long = "type", value_parser = sleep_type_arg)]
    pub sleep_type: Option<SleepType>,
}

#[derive(Args, Debug, Clone)]
pub struct TimelineArgs {
    /// Number of nights to draw (defaults to `window_days` from the config)
    #[arg(long, value_parser = days_arg)]
    pub days: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Number of days of sample data, ending today
    #[arg(long, default_value_t = 30, value_parser = days_arg)]
    pub days: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ClearArgs {
    /// Confirm deletion of every entry
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// JSON export to read, or `-` for stdin
    pub path: String,
}

pub fn add_entry(config: &AppConfig, store: &dyn SleepStore, args: AddArgs) -> Result<()> {
    let draft = draft_from_args(&config.entry, &args, night::local_wall_clock());
    let record = store.insert(draft).context("saving sleep entry")?;
    println!("Added {}", describe_record(&record, config.locale));
    Ok(())
}

pub fn edit_entry(config: &AppConfig, store: &dyn SleepStore, args: EditArgs) -> Result<()> {
    let patch = patch_from_args(&args.fields);
    if patch.is_empty() {
        bail!("nothing to change, pass at least one field flag");
    }
    let existing = storage::find_by_prefix(store, &args.id)?;
    let Some(updated) = store
        .update(&existing.id, &patch)
        .with_context(|| format!("updating entry {}", existing.id))?
    else {
        bail!("entry '{}' not found", args.id);
    };
    println!("Updated {}", describe_record(&updated, config.locale));
    Ok(())
}

pub fn delete_entry(store: &dyn SleepStore, args: DeleteArgs) -> Result<()> {
    let existing = storage::find_by_prefix(store, &args.id)?;
    if !store
        .delete(&existing.id)
        .with_context(|| format!("deleting entry {}", existing.id))?
    {
        bail!("entry '{}' not found", args.id);
    }
    println!("Deleted entry {}", existing.short_id());
    Ok(())
}

pub fn list_nights(config: &AppConfig, store: &dyn SleepStore, args: ListArgs) -> Result<()> {
    let records = store.all().context("loading sleep entries")?;
    let mut groups = night::group_by_night(&records);
    if let Some(limit) = args.nights {
        groups.truncate(limit);
    }
    print!("{}", format_night_groups(&groups, config.locale));
    Ok(())
}

pub fn list_range(config: &AppConfig, store: &dyn SleepStore, args: RangeArgs) -> Result<()> {
    if args.start > args.end {
        bail!("range start {} is after its end {}", args.start, args.end);
    }
    let records = store
        .by_date_range(args.start, args.end)
        .context("querying sleep entries by date")?;
    print!("{}", format_record_table(&records, config.locale));
    Ok(())
}

pub fn show_stats(config: &AppConfig, store: &dyn SleepStore, args: StatsArgs) -> Result<()> {
    let records = store.all().context("loading sleep entries")?;
    let days = args.days.unwrap_or(config.window_days as usize);
    let window = night::last_n_days(night::today_local(), days);
    let average_days = config.average_days as usize;
    let daily = night::daily_breakdown(&records, &window, average_days);
    let distribution = Distribution::from_records(&records, args.sleep_type);
    print!(
        "{}",
        format_stats(&daily, average_days, &distribution, args.sleep_type, config.locale)
    );
    Ok(())
}

pub fn show_timeline(config: &AppConfig, store: &dyn SleepStore, args: TimelineArgs) -> Result<()> {
    let records = store.all().context("loading sleep entries")?;
    let days = args.days.unwrap_or(config.window_days as usize);
    let window = night::last_n_days(night::today_local(), days);
    print!("{}", format_timeline(&night::timeline(&records, &window)));
    Ok(())
}

pub fn seed_entries(store: &dyn SleepStore, args: SeedArgs) -> Result<()> {
    let inserted = seed::insert_sample(store, night::today_local(), args.days)?;
    println!(
        "Inserted {inserted} sample entr{} over {} day{}",
        if inserted == 1 { "y" } else { "ies" },
        args.days,
        if args.days == 1 { "" } else { "s" }
    );
    Ok(())
}

pub fn clear_entries(store: &dyn SleepStore, args: ClearArgs) -> Result<()> {
    if !args.yes {
        bail!("refusing to delete every entry without --yes");
    }
    let removed = seed::clear_all(store)?;
    println!(
        "Deleted {removed} entr{}",
        if removed == 1 { "y" } else { "ies" }
    );
    Ok(())
}

pub fn export_entries(store: &dyn SleepStore, args: ExportArgs) -> Result<()> {
    let records = store.all().context("loading sleep entries")?;
    let json = serde_json::to_string_pretty(&records).context("serialising entries")?;
    match args.output {
        Some(path) => {
            fs::write(&path, json.as_bytes())
                .with_context(|| format!("writing export {}", path.display()))?;
            tracing::info!(count = records.len(), path = %path.display(), "exported entries");
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn import_entries(store: &dyn SleepStore, args: ImportArgs) -> Result<()> {
    let raw = if args.path == "-" {
        match read_stdin()? {
            Some(raw) => raw,
            None => bail!("no JSON on stdin, pipe an export or pass a file path"),
        }
    } else {
        fs::read_to_string(&args.path).with_context(|| format!("reading {}", args.path))?
    };
    let records = parse_export(&raw)?;
    let total = records.len();
    let added = store.import(records).context("importing entries")?;
    println!(
        "Imported {added} of {total} entries ({} already present)",
        total - added
    );
    Ok(())
}

fn parse_export(raw: &str) -> Result<Vec<SleepRecord>> {
    serde_json::from_str(raw).context("parsing sleep entry export")
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

fn draft_from_args(defaults: &EntryDefaults, args: &AddArgs, now: PrimitiveDateTime) -> SleepDraft {
    SleepDraft {
        date: args
            .date
            .unwrap_or_else(|| night::default_night_date(now)),
        sleep_type: args.sleep_type.unwrap_or(defaults.sleep_type),
        bed_time: args.bed.unwrap_or_else(|| defaults.bed_time()),
        wake_time: args.wake.unwrap_or_else(|| defaults.wake_time()),
        sleep_quality: args
            .sleep_quality
            .unwrap_or_else(|| defaults.sleep_quality()),
        wake_quality: args.wake_quality.unwrap_or_else(|| defaults.wake_quality()),
    }
}

fn patch_from_args(args: &AddArgs) -> SleepPatch {
    SleepPatch {
        date: args.date,
        sleep_type: args.sleep_type,
        bed_time: args.bed,
        wake_time: args.wake,
        sleep_quality: args.sleep_quality,
        wake_quality: args.wake_quality,
    }
}

fn describe_record(record: &SleepRecord, locale: Locale) -> String {
    format!(
        "{} ({}, {} → {}, {}) to {}",
        record.short_id(),
        record.sleep_type.label(locale),
        model::format_clock(record.bed_time),
        model::format_clock(record.wake_time),
        night::format_duration(record.duration_minutes()),
        night::format_night_label(record.night(), locale)
    )
}

fn format_night_groups(groups: &[NightGroup], locale: Locale) -> String {
    if groups.is_empty() {
        return "No sleep entries yet. Record one with `sleeplog add`.\n".to_string();
    }
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(
            &mut out,
            "{}  ·  {}",
            night::format_night_label(group.night, locale),
            night::format_duration(group.total_minutes)
        );
        for record in &group.records {
            let _ = writeln!(&mut out, "  {}", format_record_line(record, locale));
        }
        out.push('\n');
    }
    out
}

fn format_record_table(records: &[SleepRecord], locale: Locale) -> String {
    if records.is_empty() {
        return "No entries in this range.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            &mut out,
            "{}  {}",
            model::format_date(record.date),
            format_record_line(record, locale)
        );
    }
    out
}

fn format_record_line(record: &SleepRecord, locale: Locale) -> String {
    format!(
        "{}  {}  {} → {}  {}  sleep {}  wake {}",
        record.short_id(),
        pad(record.sleep_type.label(locale), 19),
        model::format_clock(record.bed_time),
        model::format_clock(record.wake_time),
        pad(&night::format_duration(record.duration_minutes()), 9),
        pad(&quality_cell(record.sleep_quality, locale), 16),
        quality_cell(record.wake_quality, locale)
    )
}

fn quality_cell(quality: Quality, locale: Locale) -> String {
    format!("{} ({})", quality.label(locale), quality.get())
}

fn format_stats(
    daily: &[DailyTotals],
    average_days: usize,
    distribution: &Distribution,
    filter: Option<SleepType>,
    locale: Locale,
) -> String {
    let mut out = String::new();

    let _ = write!(&mut out, "{}", pad("date", 10));
    for sleep_type in SleepType::all() {
        let _ = write!(&mut out, " {:>10}", sleep_type.as_str());
    }
    let _ = writeln!(&mut out, " {:>7} {:>7}", "total", format!("avg{average_days}d"));
    for day in daily {
        let _ = write!(&mut out, "{}", model::format_date(day.date));
        for sleep_type in SleepType::all() {
            let _ = write!(&mut out, " {:>10}", hours_cell(day.minutes(sleep_type) as f64 / 60.0));
        }
        let _ = writeln!(
            &mut out,
            " {:>7} {:>7}",
            hours_cell(day.total_hours),
            hours_cell(day.moving_average_hours)
        );
    }

    out.push('\n');
    if distribution.record_count == 0 {
        out.push_str("No entries to summarise.\n");
        return out;
    }
    let _ = writeln!(
        &mut out,
        "{} entries, {} in total",
        distribution.record_count,
        night::format_duration(distribution.total_minutes())
    );

    if filter.is_none() {
        out.push_str("\nBy sleep type\n");
        for sleep_type in SleepType::all() {
            let minutes = distribution.minutes(sleep_type);
            if minutes == 0 {
                continue;
            }
            let _ = writeln!(
                &mut out,
                "  {}  {:>7}  {:>3.0}%",
                pad(sleep_type.label(locale), 19),
                hours_cell(minutes as f64 / 60.0),
                distribution.type_share(sleep_type)
            );
        }
    }

    out.push_str("\nSleep quality\n");
    for quality in Quality::all() {
        write_histogram_row(&mut out, quality, distribution.sleep_quality_count(quality), locale);
    }
    out.push_str("\nWake quality\n");
    for quality in Quality::all() {
        write_histogram_row(&mut out, quality, distribution.wake_quality_count(quality), locale);
    }
    out
}

fn write_histogram_row(out: &mut String, quality: Quality, count: usize, locale: Locale) {
    let _ = writeln!(
        out,
        "  {}  {:>4}  {}",
        pad(&quality_cell(quality, locale), 16),
        count,
        "#".repeat(count.min(60))
    );
}

fn hours_cell(hours: f64) -> String {
    format!("{hours:.1}h")
}

fn format_timeline(spans: &[TimelineSpan]) -> String {
    if spans.is_empty() {
        return "No nights in this window.\n".to_string();
    }
    let cells = TIMELINE_HOURS * TIMELINE_CELLS_PER_HOUR;
    let mut axis = vec![' '; cells];
    for hour in (0..TIMELINE_HOURS).step_by(4) {
        let label = format!("{:02}h", (hour + usize::from(night::NIGHT_THRESHOLD_HOUR)) % 24);
        for (offset, ch) in label.chars().enumerate() {
            if let Some(slot) = axis.get_mut(hour * TIMELINE_CELLS_PER_HOUR + offset) {
                *slot = ch;
            }
        }
    }

    let mut out = String::new();
    let _ = writeln!(&mut out, "{:<10}  {:<10}  {:<11}  {}", "night", "type", "", axis.iter().collect::<String>());
    for span in spans {
        let start = scale_cell(span.start).min(cells);
        let end = scale_cell(span.end).max(start + 1).min(cells);
        let bar: String = (0..cells)
            .map(|cell| if (start..end).contains(&cell) { '#' } else { '.' })
            .collect();
        let _ = writeln!(
            &mut out,
            "{}  {:<10}  {} → {}  {}",
            model::format_date(span.night),
            span.sleep_type.as_str(),
            scale_to_clock(span.start),
            scale_to_clock(span.end),
            bar
        );
    }
    out
}

fn scale_cell(hours: f64) -> usize {
    let offset = (hours - f64::from(night::NIGHT_THRESHOLD_HOUR)).max(0.0);
    (offset * TIMELINE_CELLS_PER_HOUR as f64).round() as usize
}

fn scale_to_clock(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    format!("{:02}:{:02}", (total_minutes / 60) % 24, total_minutes % 60)
}

fn pad(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    if visible >= width {
        return text.to_string();
    }
    format!("{text}{}", " ".repeat(width - visible))
}

fn date_arg(raw: &str) -> Result<Date, ModelError> {
    model::parse_date(raw)
}

fn clock_arg(raw: &str) -> Result<Time, ModelError> {
    model::parse_clock(raw)
}

fn quality_arg(raw: &str) -> Result<Quality, String> {
    let value: u8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a rating between 1 and 5"))?;
    Quality::new(value).map_err(|err| err.to_string())
}

fn days_arg(raw: &str) -> Result<usize, String> {
    let days: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of days"))?;
    if !(1..=night::MAX_WINDOW_DAYS).contains(&days) {
        return Err(format!(
            "days must be between 1 and {}, got {days}",
            night::MAX_WINDOW_DAYS
        ));
    }
    Ok(days)
}

fn sleep_type_arg(raw: &str) -> Result<SleepType, String> {
    raw.parse().map_err(|_| {
        format!("unknown sleep type '{raw}', expected nocturnal, nap, drowsiness or catchup")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use time::macros::{date, datetime, time};

    type TestResult<T = ()> = Result<T>;

    fn record(id: &str, date: Date, sleep_type: SleepType, bed: Time, wake: Time) -> SleepRecord {
        SleepDraft {
            date,
            sleep_type,
            bed_time: bed,
            wake_time: wake,
            sleep_quality: Quality::new(4).unwrap(),
            wake_quality: Quality::new(2).unwrap(),
        }
        .into_record(id.into(), datetime!(2025-12-22 09:00 UTC))
    }

    #[test]
    fn day_counts_are_bounded() {
        assert_eq!(days_arg("30"), Ok(30));
        assert_eq!(days_arg(&night::MAX_WINDOW_DAYS.to_string()), Ok(night::MAX_WINDOW_DAYS));
        assert!(days_arg("0").is_err());
        assert!(days_arg("18446744073709551615").is_err());
        assert!(days_arg("many").is_err());
    }

    #[test]
    fn add_defaults_follow_config_and_night_threshold() {
        let defaults = EntryDefaults::default();
        let morning = draft_from_args(&defaults, &AddArgs::default(), datetime!(2025-12-22 08:00));
        assert_eq!(morning.date, date!(2025 - 12 - 21));
        assert_eq!(morning.sleep_type, SleepType::Nocturnal);
        assert_eq!(morning.bed_time, time!(22:00));
        assert_eq!(morning.wake_time, time!(07:00));
        assert_eq!(morning.sleep_quality.get(), 3);

        let evening = draft_from_args(&defaults, &AddArgs::default(), datetime!(2025-12-22 20:00));
        assert_eq!(evening.date, date!(2025 - 12 - 22));

        let explicit = AddArgs {
            date: Some(date!(2025 - 11 - 02)),
            sleep_type: Some(SleepType::Nap),
            bed: Some(time!(13:15)),
            ..AddArgs::default()
        };
        let nap = draft_from_args(&defaults, &explicit, datetime!(2025-12-22 08:00));
        assert_eq!(nap.date, date!(2025 - 11 - 02));
        assert_eq!(nap.sleep_type, SleepType::Nap);
        assert_eq!(nap.bed_time, time!(13:15));
    }

    #[test]
    fn edit_patch_only_carries_given_flags() {
        assert!(patch_from_args(&AddArgs::default()).is_empty());
        let patch = patch_from_args(&AddArgs {
            wake: Some(time!(06:00)),
            ..AddArgs::default()
        });
        assert_eq!(patch.wake_time, Some(time!(06:00)));
        assert!(patch.bed_time.is_none());
    }

    #[test]
    fn night_listing_shows_labels_totals_and_entries() {
        let records = vec![
            record("aaaaaaaa-1", date!(2025 - 12 - 22), SleepType::Nocturnal, time!(02:00), time!(06:00)),
            record("bbbbbbbb-2", date!(2025 - 12 - 21), SleepType::Nocturnal, time!(22:00), time!(23:30)),
            record("cccccccc-3", date!(2025 - 12 - 22), SleepType::Nap, time!(14:00), time!(14:45)),
        ];
        let output = format_night_groups(&night::group_by_night(&records), Locale::En);

        let newest = output
            .find("Night of the 22nd to the 23rd of December 2025  ·  45min")
            .expect("nap night present");
        let older = output
            .find("Night of the 21st to the 22nd of December 2025  ·  5h 30min")
            .expect("main night present");
        assert!(newest < older, "nights should be listed newest first:\n{output}");
        assert!(output.contains("aaaaaaaa  Nocturnal sleep      02:00 → 06:00  4h"));
        assert!(output.contains("Good (4)"));
        assert!(output.contains("Poor (2)"));
    }

    #[test]
    fn night_listing_in_french() {
        let records = vec![record("dddddddd", date!(2025 - 12 - 31), SleepType::Catchup, time!(05:00), time!(06:30))];
        let output = format_night_groups(&night::group_by_night(&records), Locale::Fr);
        assert!(output.contains("Nuit du 31 au 1 janv. 2026  ·  1h 30min"));
        assert!(output.contains("Rattrapage nocturne"));
        assert!(output.contains("Bon (4)"));
    }

    #[test]
    fn empty_listing_points_to_add() {
        assert!(format_night_groups(&[], Locale::En).contains("sleeplog add"));
        assert_eq!(format_record_table(&[], Locale::En), "No entries in this range.\n");
    }

    #[test]
    fn range_table_prefixes_recorded_dates() {
        let records = vec![record("eeeeeeee", date!(2025 - 12 - 22), SleepType::Nocturnal, time!(01:00), time!(05:00))];
        let output = format_record_table(&records, Locale::En);
        assert!(output.starts_with("2025-12-22  eeeeeeee"));
    }

    #[test]
    fn stats_report_daily_rows_and_distributions() {
        let records = vec![
            record("a", date!(2025 - 12 - 21), SleepType::Nocturnal, time!(23:00), time!(07:00)),
            record("b", date!(2025 - 12 - 22), SleepType::Nap, time!(13:00), time!(14:30)),
        ];
        let window = night::last_n_days(date!(2025 - 12 - 22), 3);
        let daily = night::daily_breakdown(&records, &window, 7);
        let distribution = Distribution::from_records(&records, None);
        let output = format_stats(&daily, 7, &distribution, None, Locale::En);

        assert!(output.lines().next().unwrap_or_default().contains("avg7d"));
        assert!(output.contains("2025-12-20"));
        assert!(output.contains("2025-12-21       8.0h"));
        assert!(output.contains("2 entries, 9h 30min in total"));
        assert!(output.contains("By sleep type"));
        assert!(output.contains("Nocturnal sleep         8.0h   84%"));
        assert!(output.contains("Good (4)             2  ##"));
        assert!(output.contains("Poor (2)             2  ##"));
    }

    #[test]
    fn filtered_stats_skip_type_breakdown() {
        let records = vec![record("a", date!(2025 - 12 - 21), SleepType::Nap, time!(13:00), time!(14:00))];
        let distribution = Distribution::from_records(&records, Some(SleepType::Nocturnal));
        let output = format_stats(&[], 7, &distribution, Some(SleepType::Nocturnal), Locale::En);
        assert!(output.contains("No entries to summarise."));
        assert!(!output.contains("By sleep type"));
    }

    #[test]
    fn timeline_draws_bars_on_night_axis() {
        let records = vec![record("a", date!(2025 - 12 - 21), SleepType::Nocturnal, time!(22:00), time!(06:00))];
        let spans = night::timeline(&records, &[date!(2025 - 12 - 21)]);
        let output = format_timeline(&spans);
        let row = output.lines().nth(1).expect("one timeline row");
        assert!(row.starts_with("2025-12-21  nocturnal   22:00 → 06:00  "));
        let bar = row.rsplit("  ").next().unwrap_or_default();
        assert_eq!(bar.len(), 48);
        assert_eq!(bar.chars().filter(|ch| *ch == '#').count(), 16);
        assert!(bar.starts_with("....#"));
        assert!(output.lines().next().unwrap_or_default().contains("20h"));
        assert_eq!(format_timeline(&[]), "No nights in this window.\n");
    }

    #[test]
    fn export_output_imports_back_without_duplicates() -> TestResult {
        let source = MemoryStore::default();
        source.insert(SleepDraft {
            date: date!(2025 - 12 - 22),
            sleep_type: SleepType::Drowsiness,
            bed_time: time!(16:00),
            wake_time: time!(16:20),
            sleep_quality: Quality::default(),
            wake_quality: Quality::default(),
        })?;
        let json = serde_json::to_string_pretty(&source.all()?)?;

        let target = MemoryStore::default();
        assert_eq!(target.import(parse_export(&json)?)?, 1);
        assert_eq!(target.import(parse_export(&json)?)?, 0);
        assert_eq!(target.all()?, source.all()?);
        Ok(())
    }

    #[test]
    fn clear_requires_confirmation() -> TestResult {
        let store = MemoryStore::default();
        seed::insert_sample(&store, date!(2025 - 12 - 22), 2)?;
        assert!(clear_entries(&store, ClearArgs { yes: false }).is_err());
        assert!(!store.is_empty());
        clear_entries(&store, ClearArgs { yes: true })?;
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn delete_and_edit_accept_id_prefixes() -> TestResult {
        let store = MemoryStore::default();
        store.import(vec![record("f00dcafe-0000", date!(2025 - 12 - 22), SleepType::Nap, time!(13:00), time!(13:40))])?;
        let config = AppConfig::default();

        edit_entry(
            &config,
            &store,
            EditArgs {
                id: "f00d".into(),
                fields: AddArgs {
                    wake: Some(time!(14:10)),
                    ..AddArgs::default()
                },
            },
        )?;
        let edited = store.get("f00dcafe-0000")?.expect("entry kept");
        assert_eq!(edited.wake_time, time!(14:10));

        let nothing = edit_entry(
            &config,
            &store,
            EditArgs {
                id: "f00d".into(),
                fields: AddArgs::default(),
            },
        );
        assert!(nothing.is_err());

        delete_entry(&store, DeleteArgs { id: "f00dcafe".into() })?;
        assert!(store.is_empty());
        Ok(())
    }
}
