use crate::error::{PressError, Result};
use crate::types::{PublishMode, ScheduleMode, ScheduleStatus};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Time window
// ---------------------------------------------------------------------------

static WINDOW_RE: OnceLock<Regex> = OnceLock::new();

fn window_re() -> &'static Regex {
    WINDOW_RE.get_or_init(|| Regex::new(r"^([01][0-9]|2[0-3]):([0-5][0-9])$").unwrap())
}

/// Parse a minute-of-day string ("HH:mm") into minutes since midnight.
pub fn parse_minute_of_day(s: &str) -> Result<u32> {
    let caps = window_re()
        .captures(s)
        .ok_or_else(|| PressError::InvalidTimeWindow(format!("'{s}' is not HH:mm")))?;
    let hours: u32 = caps[1].parse().unwrap();
    let minutes: u32 = caps[2].parse().unwrap();
    Ok(hours * 60 + minutes)
}

/// Write-time invariant: the window end must be strictly after its start.
pub fn validate_window(start: &str, end: &str) -> Result<()> {
    let start_min = parse_minute_of_day(start)?;
    let end_min = parse_minute_of_day(end)?;
    if end_min <= start_min {
        return Err(PressError::InvalidTimeWindow(format!(
            "window end {end} must be after start {start}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ScheduleDefinition
// ---------------------------------------------------------------------------

/// A production schedule owning a keyword backlog. The external worker polls
/// keywords of ACTIVE schedules during the schedule's run window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDefinition {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub mode: ScheduleMode,
    pub status: ScheduleStatus,
    pub production_per_day: u32,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub publish_mode: PublishMode,
    pub time_window_start: String,
    pub time_window_end: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything a scheduling operator supplies at creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSchedule {
    pub name: String,
    pub mode: ScheduleMode,
    pub production_per_day: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub publish_mode: PublishMode,
    pub time_window_start: String,
    pub time_window_end: String,
}

impl ScheduleDefinition {
    pub fn create(brand: impl Into<String>, input: NewSchedule) -> Result<Self> {
        if input.name.trim().is_empty() {
            return Err(PressError::Validation("schedule name is empty".to_string()));
        }
        if input.production_per_day == 0 {
            return Err(PressError::Validation(
                "production_per_day must be at least 1".to_string(),
            ));
        }
        if let Some(end) = input.end_date {
            if end < input.start_date {
                return Err(PressError::Validation(format!(
                    "end_date {end} precedes start_date {}",
                    input.start_date
                )));
            }
        }
        validate_window(&input.time_window_start, &input.time_window_end)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            brand: brand.into(),
            mode: input.mode,
            status: ScheduleStatus::Active,
            production_per_day: input.production_per_day,
            start_date: input.start_date,
            end_date: input.end_date,
            publish_mode: input.publish_mode,
            time_window_start: input.time_window_start,
            time_window_end: input.time_window_end,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn pause(&mut self) {
        self.status = ScheduleStatus::Paused;
        self.updated_at = Utc::now();
    }

    pub fn resume(&mut self) {
        self.status = ScheduleStatus::Active;
        self.updated_at = Utc::now();
    }

    /// Whether `minute_of_day` falls inside the schedule's run window.
    pub fn window_contains(&self, minute_of_day: u32) -> bool {
        let start = parse_minute_of_day(&self.time_window_start).unwrap_or(0);
        let end = parse_minute_of_day(&self.time_window_end).unwrap_or(0);
        minute_of_day >= start && minute_of_day < end
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewSchedule {
        NewSchedule {
            name: "spring blog push".to_string(),
            mode: ScheduleMode::Blog,
            production_per_day: 3,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end_date: None,
            publish_mode: PublishMode::QcRequired,
            time_window_start: "09:00".to_string(),
            time_window_end: "17:00".to_string(),
        }
    }

    #[test]
    fn parses_minute_of_day() {
        assert_eq!(parse_minute_of_day("00:00").unwrap(), 0);
        assert_eq!(parse_minute_of_day("09:30").unwrap(), 570);
        assert_eq!(parse_minute_of_day("23:59").unwrap(), 1439);
    }

    #[test]
    fn rejects_malformed_windows() {
        for s in ["24:00", "9:00", "09:60", "0900", "nine", ""] {
            assert!(parse_minute_of_day(s).is_err(), "expected invalid: {s}");
        }
    }

    #[test]
    fn window_end_before_start_rejected_at_creation() {
        let mut bad = input();
        bad.time_window_start = "09:00".to_string();
        bad.time_window_end = "08:00".to_string();
        let err = ScheduleDefinition::create("acme", bad).unwrap_err();
        assert!(matches!(err, PressError::InvalidTimeWindow(_)));
    }

    #[test]
    fn equal_window_bounds_rejected() {
        assert!(validate_window("09:00", "09:00").is_err());
    }

    #[test]
    fn create_starts_active() {
        let s = ScheduleDefinition::create("acme", input()).unwrap();
        assert_eq!(s.status, ScheduleStatus::Active);
        assert_eq!(s.name, "spring blog push");
    }

    #[test]
    fn zero_quota_rejected() {
        let mut bad = input();
        bad.production_per_day = 0;
        assert!(ScheduleDefinition::create("acme", bad).is_err());
    }

    #[test]
    fn end_date_before_start_rejected() {
        let mut bad = input();
        bad.end_date = Some(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert!(ScheduleDefinition::create("acme", bad).is_err());
    }

    #[test]
    fn pause_and_resume_toggle() {
        let mut s = ScheduleDefinition::create("acme", input()).unwrap();
        s.pause();
        assert_eq!(s.status, ScheduleStatus::Paused);
        s.resume();
        assert_eq!(s.status, ScheduleStatus::Active);
    }

    #[test]
    fn window_contains_is_half_open() {
        let s = ScheduleDefinition::create("acme", input()).unwrap();
        assert!(!s.window_contains(parse_minute_of_day("08:59").unwrap()));
        assert!(s.window_contains(parse_minute_of_day("09:00").unwrap()));
        assert!(s.window_contains(parse_minute_of_day("16:59").unwrap()));
        assert!(!s.window_contains(parse_minute_of_day("17:00").unwrap()));
    }
}
