//! Total professional experience, precomputed from structured CV entries.
//!
//! Overlapping positions count once. Open-ended positions run until `today`.
//! The rendered value ("4.3 years") is handed to the aligner and used to
//! correct duration claims in its justifications.

use chrono::{Datelike, NaiveDate};

use crate::cv_database::models::ExperienceEntry;

/// Months covered by the union of all dated positions.
pub fn total_experience_months(entries: &[ExperienceEntry], today: NaiveDate) -> f64 {
    let mut ranges: Vec<(NaiveDate, NaiveDate)> = entries
        .iter()
        .filter_map(|e| {
            let start = e.start_date?;
            let end = e.end_date.unwrap_or(today).min(today);
            (start <= end).then_some((start, end))
        })
        .collect();
    ranges.sort();

    let mut merged: Vec<(NaiveDate, NaiveDate)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => {
                if end > *last_end {
                    *last_end = end;
                }
            }
            _ => merged.push((start, end)),
        }
    }

    merged
        .iter()
        .map(|(start, end)| months_between(*start, *end))
        .sum()
}

/// Renders the total as "<years> years" with one decimal, or `None` if no position is dated.
pub fn total_experience(entries: &[ExperienceEntry], today: NaiveDate) -> Option<String> {
    if !entries.iter().any(|e| e.start_date.is_some()) {
        return None;
    }
    let years = total_experience_months(entries, today) / 12.0;
    Some(format!("{:.1} years", (years * 10.0).round() / 10.0))
}

fn months_between(start: NaiveDate, end: NaiveDate) -> f64 {
    let years = end.year() - start.year();
    let months = end.month() as i32 - start.month() as i32;
    let total = years * 12 + months;
    let day_frac = (end.day() as f64 - start.day() as f64) / 30.0;
    (total as f64 + day_frac).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn position(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ExperienceEntry {
        ExperienceEntry {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            start_date: start,
            end_date: end,
            description: String::new(),
        }
    }

    #[test]
    fn test_sequential_positions_are_summed() {
        let entries = vec![
            position(Some(date(2018, 1, 1)), Some(date(2020, 1, 1))),
            position(Some(date(2021, 1, 1)), Some(date(2022, 1, 1))),
        ];
        let months = total_experience_months(&entries, date(2025, 1, 1));
        assert!((months - 36.0).abs() < 1e-9, "got {months}");
    }

    #[test]
    fn test_overlapping_positions_count_once() {
        let entries = vec![
            position(Some(date(2018, 1, 1)), Some(date(2020, 1, 1))),
            position(Some(date(2019, 1, 1)), Some(date(2021, 1, 1))),
        ];
        let months = total_experience_months(&entries, date(2025, 1, 1));
        assert!((months - 36.0).abs() < 1e-9, "got {months}");
    }

    #[test]
    fn test_open_ended_position_runs_until_today() {
        let entries = vec![position(Some(date(2020, 7, 1)), None)];
        assert_eq!(
            total_experience(&entries, date(2024, 11, 1)).as_deref(),
            Some("4.3 years")
        );
    }

    #[test]
    fn test_undated_entries_yield_none() {
        let entries = vec![position(None, None)];
        assert_eq!(total_experience(&entries, date(2024, 1, 1)), None);
    }
}
