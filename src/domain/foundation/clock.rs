//! Timezone-aware date snapshot used by template built-ins.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Snapshot of "now" taken once per template resolution.
///
/// Day-granular values are computed in the user's timezone when it parses
/// as a valid IANA zone name; otherwise they fall back to UTC and a warning
/// is logged. Instant values are always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateContext {
    utc_now: DateTime<Utc>,
    utc_today: NaiveDate,
    user_today: NaiveDate,
}

impl DateContext {
    /// Builds a context for the current moment in the given timezone.
    pub fn for_timezone(timezone: Option<&str>) -> Self {
        Self::at(Utc::now(), timezone)
    }

    /// Builds a context at a fixed instant. Test seam for date built-ins.
    pub fn at(utc_now: DateTime<Utc>, timezone: Option<&str>) -> Self {
        let utc_today = utc_now.date_naive();
        let user_today = match timezone {
            Some(tz_name) if !tz_name.is_empty() => match tz_name.parse::<Tz>() {
                Ok(tz) => utc_now.with_timezone(&tz).date_naive(),
                Err(_) => {
                    warn!("Invalid timezone '{}', falling back to UTC", tz_name);
                    utc_today
                }
            },
            _ => utc_today,
        };

        Self {
            utc_now,
            utc_today,
            user_today,
        }
    }

    /// The instant this context was taken, UTC.
    pub fn utc_now(&self) -> DateTime<Utc> {
        self.utc_now
    }

    /// Calendar date at UTC.
    pub fn utc_today(&self) -> NaiveDate {
        self.utc_today
    }

    /// Calendar date in the user's timezone.
    pub fn user_today(&self) -> NaiveDate {
        self.user_today
    }

    /// Monday of the user's current week.
    pub fn user_week_start(&self) -> NaiveDate {
        let days_since_monday = self.user_today.weekday().num_days_from_monday() as i64;
        self.user_today - Duration::days(days_since_monday)
    }

    /// Sunday of the user's current week.
    pub fn user_week_end(&self) -> NaiveDate {
        let days_until_sunday = 6 - self.user_today.weekday().num_days_from_monday() as i64;
        self.user_today + Duration::days(days_until_sunday)
    }

    /// The instant minus `hours`, formatted as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn instant_minus_hours(&self, hours: i64) -> String {
        (self.utc_now - Duration::hours(hours))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_instant() -> DateTime<Utc> {
        // Wednesday 2024-06-12, 03:30 UTC
        Utc.with_ymd_and_hms(2024, 6, 12, 3, 30, 0).unwrap()
    }

    #[test]
    fn utc_and_user_dates_match_for_utc_zone() {
        let ctx = DateContext::at(fixed_instant(), Some("UTC"));
        assert_eq!(ctx.utc_today(), ctx.user_today());
    }

    #[test]
    fn user_date_shifts_behind_utc() {
        // 03:30 UTC is still the previous evening in Denver.
        let ctx = DateContext::at(fixed_instant(), Some("America/Denver"));
        assert_eq!(ctx.utc_today(), NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
        assert_eq!(ctx.user_today(), NaiveDate::from_ymd_opt(2024, 6, 11).unwrap());
    }

    #[test]
    fn invalid_timezone_falls_back_to_utc() {
        let ctx = DateContext::at(fixed_instant(), Some("Not/AZone"));
        assert_eq!(ctx.user_today(), ctx.utc_today());
    }

    #[test]
    fn week_bounds_are_monday_and_sunday() {
        let ctx = DateContext::at(fixed_instant(), Some("UTC"));
        // 2024-06-12 is a Wednesday.
        assert_eq!(ctx.user_week_start(), NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(ctx.user_week_end(), NaiveDate::from_ymd_opt(2024, 6, 16).unwrap());
    }

    #[test]
    fn instant_minus_hours_formats_with_z_suffix() {
        let ctx = DateContext::at(fixed_instant(), None);
        assert_eq!(ctx.instant_minus_hours(0), "2024-06-12T03:30:00Z");
        assert_eq!(ctx.instant_minus_hours(6), "2024-06-11T21:30:00Z");
    }
}
