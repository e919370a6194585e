use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use std::collections::BTreeSet;

use crate::domain::value_objects::recurrence::RecurrencePattern;

/// One concrete occurrence produced by expanding a recurrence pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub sequence_number: i32,
}

/// Expands `pattern` over `[start_date, end_date]` and pairs every retained
/// date with every entry of `times`. Sequence numbers are assigned 1.. in
/// (date, time) ascending order. Pure value computation, no I/O.
pub fn generate(
    start_date: NaiveDate,
    end_date: NaiveDate,
    pattern: &RecurrencePattern,
    times: &[NaiveTime],
) -> Vec<SessionSlot> {
    if start_date > end_date || times.is_empty() {
        return Vec::new();
    }

    let dates = match pattern {
        RecurrencePattern::Weekly { interval, weekdays } => {
            expand_weekly(start_date, end_date, *interval, weekdays)
        }
        RecurrencePattern::Monthly {
            interval,
            nth,
            weekdays,
        } => expand_monthly(start_date, end_date, *interval, *nth, weekdays),
    };

    let mut times = times.to_vec();
    times.sort();

    let mut sequence = 0;
    dates
        .into_iter()
        .flat_map(|date| times.iter().map(move |time| (date, *time)))
        .map(|(date, time)| {
            sequence += 1;
            SessionSlot {
                date,
                time,
                sequence_number: sequence,
            }
        })
        .collect()
}

/// Every named weekday of every `interval`-th week, starting at the week
/// (Monday-based) containing `start_date`.
fn expand_weekly(
    start_date: NaiveDate,
    end_date: NaiveDate,
    interval: u32,
    weekdays: &[Weekday],
) -> BTreeSet<NaiveDate> {
    let mut dates = BTreeSet::new();
    let mut week_start =
        start_date - Duration::days(start_date.weekday().num_days_from_monday() as i64);

    while week_start <= end_date {
        for weekday in weekdays {
            let date = week_start + Duration::days(weekday.num_days_from_monday() as i64);
            if date >= start_date && date <= end_date {
                dates.insert(date);
            }
        }
        week_start += Duration::weeks(interval as i64);
    }
    dates
}

/// The nth occurrence of every named weekday in every `interval`-th month.
/// An nth that does not exist in a month is skipped for that month only,
/// never wrapped into the next one.
fn expand_monthly(
    start_date: NaiveDate,
    end_date: NaiveDate,
    interval: u32,
    nth: u32,
    weekdays: &[Weekday],
) -> BTreeSet<NaiveDate> {
    let mut dates = BTreeSet::new();
    let mut year = start_date.year();
    let mut month = start_date.month();

    loop {
        let first_of_month = match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(date) => date,
            None => break,
        };
        if first_of_month > end_date {
            break;
        }

        for weekday in weekdays {
            if let Some(date) = nth_weekday_of_month(year, month, *weekday, nth) {
                if date >= start_date && date <= end_date {
                    dates.insert(date);
                }
            }
        }

        let total_months = year * 12 + month as i32 - 1 + interval as i32;
        year = total_months.div_euclid(12);
        month = (total_months.rem_euclid(12) + 1) as u32;
    }
    dates
}

fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, nth: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (weekday.num_days_from_monday() + 7 - first.weekday().num_days_from_monday()) % 7;
    let day = 1 + offset + 7 * (nth - 1);
    // from_ymd_opt rejects a day past the month's end, which is exactly the
    // skip-not-wrap rule.
    NaiveDate::from_ymd_opt(year, month, day)
}
