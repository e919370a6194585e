use std::str::FromStr;

use chrono::Weekday;

/// Recurrence pattern grammar:
/// `weekly_<interval>_<day1,day2,...>` or `monthly_<interval>_<nth>_<day1,day2,...>`.
///
/// `interval` is a positive cadence of weeks/months, `nth` is the 1..=5
/// occurrence of a weekday within a month, weekday names are full English
/// names, case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrencePattern {
    Weekly {
        interval: u32,
        weekdays: Vec<Weekday>,
    },
    Monthly {
        interval: u32,
        nth: u32,
        weekdays: Vec<Weekday>,
    },
}

impl FromStr for RecurrencePattern {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split('_').collect();
        match parts.as_slice() {
            ["weekly", interval, days] => Ok(RecurrencePattern::Weekly {
                interval: parse_interval(interval)?,
                weekdays: parse_weekdays(days)?,
            }),
            ["monthly", interval, nth, days] => {
                let nth: u32 = nth
                    .parse()
                    .map_err(|_| format!("Invalid nth occurrence: {}", nth))?;
                if !(1..=5).contains(&nth) {
                    return Err(format!("nth occurrence out of range 1..=5: {}", nth));
                }
                Ok(RecurrencePattern::Monthly {
                    interval: parse_interval(interval)?,
                    nth,
                    weekdays: parse_weekdays(days)?,
                })
            }
            _ => Err(format!("Unsupported recurrence pattern: {}", value)),
        }
    }
}

fn parse_interval(raw: &str) -> Result<u32, String> {
    let interval: u32 = raw
        .parse()
        .map_err(|_| format!("Invalid recurrence interval: {}", raw))?;
    if interval == 0 {
        return Err("Recurrence interval must be positive".to_string());
    }
    Ok(interval)
}

fn parse_weekdays(raw: &str) -> Result<Vec<Weekday>, String> {
    let weekdays = raw
        .split(',')
        .map(|day| match day.trim().to_lowercase().as_str() {
            "monday" => Ok(Weekday::Mon),
            "tuesday" => Ok(Weekday::Tue),
            "wednesday" => Ok(Weekday::Wed),
            "thursday" => Ok(Weekday::Thu),
            "friday" => Ok(Weekday::Fri),
            "saturday" => Ok(Weekday::Sat),
            "sunday" => Ok(Weekday::Sun),
            other => Err(format!("Unknown weekday: {}", other)),
        })
        .collect::<Result<Vec<Weekday>, String>>()?;

    if weekdays.is_empty() {
        return Err("Recurrence pattern needs at least one weekday".to_string());
    }
    Ok(weekdays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weekly_pattern() {
        let pattern: RecurrencePattern = "weekly_1_monday,wednesday".parse().unwrap();
        assert_eq!(
            pattern,
            RecurrencePattern::Weekly {
                interval: 1,
                weekdays: vec![Weekday::Mon, Weekday::Wed],
            }
        );
    }

    #[test]
    fn parses_monthly_pattern() {
        let pattern: RecurrencePattern = "monthly_2_3_tuesday".parse().unwrap();
        assert_eq!(
            pattern,
            RecurrencePattern::Monthly {
                interval: 2,
                nth: 3,
                weekdays: vec![Weekday::Tue],
            }
        );
    }

    #[test]
    fn weekday_names_are_case_insensitive() {
        let pattern: RecurrencePattern = "weekly_1_Friday".parse().unwrap();
        assert_eq!(
            pattern,
            RecurrencePattern::Weekly {
                interval: 1,
                weekdays: vec![Weekday::Fri],
            }
        );
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!("daily_1_monday".parse::<RecurrencePattern>().is_err());
        assert!("weekly_0_monday".parse::<RecurrencePattern>().is_err());
        assert!("weekly_1_moonday".parse::<RecurrencePattern>().is_err());
        assert!("monthly_1_6_monday".parse::<RecurrencePattern>().is_err());
        assert!("monthly_1_monday".parse::<RecurrencePattern>().is_err());
        assert!("weekly_1".parse::<RecurrencePattern>().is_err());
    }
}
