use chrono::{Datelike, NaiveDate, Utc};

use super::domain::ExperienceEntry;

/// Total years across all experience entries, evaluated against today.
///
/// Entries ending in `"present"` accrue against the wall clock, so repeated
/// calls over real time yield slowly increasing totals.
pub fn total_years(entries: &[ExperienceEntry]) -> f64 {
    total_years_at(entries, today())
}

pub fn total_years_at(entries: &[ExperienceEntry], today: NaiveDate) -> f64 {
    let months: i64 = entries
        .iter()
        .map(|entry| entry_months(entry, today))
        .sum();
    months as f64 / 12.0
}

/// Years restricted to entries whose technology list contains `needle`
/// (case-insensitive substring match).
pub fn tech_years(entries: &[ExperienceEntry], needle: &str) -> f64 {
    tech_years_at(entries, needle, today())
}

pub fn tech_years_at(entries: &[ExperienceEntry], needle: &str, today: NaiveDate) -> f64 {
    let needle = needle.to_lowercase();
    let months: i64 = entries
        .iter()
        .filter(|entry| {
            entry
                .technologies
                .iter()
                .any(|tech| tech.to_lowercase().contains(&needle))
        })
        .map(|entry| entry_months(entry, today))
        .sum();
    months as f64 / 12.0
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Elapsed months for one entry. An unparsable or missing start contributes
/// zero rather than failing the whole calculation; a missing or `"present"`
/// end means ongoing.
fn entry_months(entry: &ExperienceEntry, today: NaiveDate) -> i64 {
    let Some(start) = parse_month(&entry.start) else {
        return 0;
    };

    let end = if entry.end.is_empty() || entry.end.eq_ignore_ascii_case("present") {
        today
    } else {
        match parse_month(&entry.end) {
            Some(end) => end,
            None => return 0,
        }
    };

    let months =
        i64::from(end.year() - start.year()) * 12 + i64::from(end.month()) - i64::from(start.month());
    months.max(0)
}

fn parse_month(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").ok()
}
