//! Time rules
//!
//! Values may be native timestamps, Unix-epoch seconds or strings. Strings
//! are parsed against each configured format in each configured timezone,
//! first success wins.
//!
//! Format names: `rfc3339` (default) and `rfc2822`. Anything else is a chrono
//! `strftime` pattern; patterns without an offset are read as wall-clock time
//! in the timezone being tried, date-only patterns mean midnight.

use chrono::format::{Item, StrftimeItems};
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use super::{absent, type_mismatch, RuleSet};
use crate::errors::{ConfigError, ValidationErrors, ValidationResult};
use crate::params::Params;
use crate::types::{unix_seconds, Value};

const PARAMS: &[&str] = &[
    "required",
    "min_date",
    "max_date",
    "formats",
    "timezones",
    "before_now",
    "after_now",
    "relative_range",
    "workday",
    "weekdays",
    "holidays",
    "min_time",
    "max_time",
    "business_hours",
];

/// Named format for RFC 3339 timestamps
pub const RFC3339: &str = "rfc3339";
/// Named format for RFC 2822 timestamps
pub const RFC2822: &str = "rfc2822";
/// Timezone used when none is configured
pub const DEFAULT_TIMEZONE: &str = "UTC";

// ============================================================================
// Parsing helpers
// ============================================================================

/// Parse a time string against `formats` in each of `timezones`.
///
/// Empty lists fall back to `rfc3339` and `UTC`. Unknown timezones are
/// skipped.
pub fn parse_time_string(
    s: &str,
    formats: &[String],
    timezones: &[String],
) -> Option<DateTime<FixedOffset>> {
    let default_formats = [RFC3339.to_string()];
    let default_timezones = [DEFAULT_TIMEZONE.to_string()];
    let formats = if formats.is_empty() { &default_formats[..] } else { formats };
    let timezones = if timezones.is_empty() { &default_timezones[..] } else { timezones };

    for tz in timezones.iter().filter_map(|name| name.parse::<Tz>().ok()) {
        for format in formats {
            if let Some(t) = parse_with_format(s, format, &tz) {
                return Some(t);
            }
        }
    }
    None
}

fn parse_with_format(s: &str, format: &str, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    if format.eq_ignore_ascii_case(RFC3339) {
        return DateTime::parse_from_rfc3339(s).ok();
    }
    if format.eq_ignore_ascii_case(RFC2822) {
        return DateTime::parse_from_rfc2822(s).ok();
    }
    if let Ok(t) = DateTime::parse_from_str(s, format) {
        return Some(t);
    }
    let local = NaiveDateTime::parse_from_str(s, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    tz.from_local_datetime(&local)
        .earliest()
        .map(|t| t.fixed_offset())
}

/// Parse a duration such as `90`, `"1h30m"`, `"2d"` or `"500ms"`.
///
/// Bare numbers are seconds. Units: `d`, `h`, `m`, `s`, `ms`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration '{}'", s);
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = s.parse::<f64>() {
        return seconds_to_duration(secs).ok_or_else(invalid);
    }

    let mut total_ms: i64 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let amount: f64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];
        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit_ms = match &rest[..unit_len] {
            "ms" => 1.0,
            "s" => 1_000.0,
            "m" => 60_000.0,
            "h" => 3_600_000.0,
            "d" => 86_400_000.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        let ms = amount * unit_ms;
        if !ms.is_finite() || ms.abs() > i64::MAX as f64 {
            return Err(invalid());
        }
        total_ms = total_ms.checked_add(ms as i64).ok_or_else(invalid)?;
    }
    Ok(Duration::milliseconds(total_ms))
}

fn seconds_to_duration(secs: f64) -> Option<Duration> {
    let ms = secs * 1_000.0;
    if ms.is_finite() && ms >= 0.0 && ms <= i64::MAX as f64 {
        Some(Duration::milliseconds(ms as i64))
    } else {
        None
    }
}

/// Absolute instant: RFC 3339 or a `YYYY-MM-DD` date (midnight UTC)
fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| Utc.from_utc_datetime(&t).fixed_offset())
    })
}

/// Time of day: `HH:MM` or `HH:MM:SS`
fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Hours and minutes of an `HH:MM` string
fn parse_hm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Weekday from a name (`mon`, `Monday`) or a number (Sunday = 0)
fn parse_weekday(value: &JsonValue) -> Result<Weekday, String> {
    match value {
        JsonValue::String(name) => name
            .trim()
            .parse::<Weekday>()
            .map_err(|_| format!("unknown weekday '{}'", name)),
        JsonValue::Number(n) => match n.as_u64() {
            Some(0) => Ok(Weekday::Sun),
            Some(1) => Ok(Weekday::Mon),
            Some(2) => Ok(Weekday::Tue),
            Some(3) => Ok(Weekday::Wed),
            Some(4) => Ok(Weekday::Thu),
            Some(5) => Ok(Weekday::Fri),
            Some(6) => Ok(Weekday::Sat),
            _ => Err(format!("weekday number out of range: {}", n)),
        },
        other => Err(format!("unsupported weekday value: {}", other)),
    }
}

fn parse_weekdays(value: &JsonValue) -> Result<Vec<Weekday>, String> {
    match value {
        JsonValue::Array(items) => items.iter().map(parse_weekday).collect(),
        single => parse_weekday(single).map(|d| vec![d]),
    }
}

fn weekday_names(days: &[Weekday]) -> JsonValue {
    json!(days.iter().map(|d| d.to_string()).collect::<Vec<_>>())
}

fn rfc3339(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339()
}

// ============================================================================
// BusinessHours
// ============================================================================

/// Working window checked in its own timezone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessHours {
    /// Opening time, `HH:MM`
    pub start: String,
    /// Closing time, `HH:MM` (inclusive)
    pub end: String,
    /// Working days; empty allows every day
    pub days: Vec<Weekday>,
    /// IANA timezone; falls back to the rule's projection timezone
    pub timezone: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BusinessHoursConfig {
    start: String,
    end: String,
    #[serde(default)]
    days: Option<JsonValue>,
    #[serde(default)]
    timezone: Option<String>,
}

impl BusinessHours {
    fn from_json(value: &JsonValue) -> Result<Self, String> {
        let raw: BusinessHoursConfig =
            serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
        if parse_hm(&raw.start).is_none() {
            return Err(format!("invalid start time '{}', expected HH:MM", raw.start));
        }
        if parse_hm(&raw.end).is_none() {
            return Err(format!("invalid end time '{}', expected HH:MM", raw.end));
        }
        let timezone = raw.timezone.filter(|tz| !tz.is_empty());
        if let Some(tz) = &timezone {
            tz.parse::<Tz>()
                .map_err(|_| format!("unknown timezone '{}'", tz))?;
        }
        let days = match raw.days.filter(|d| !d.is_null()) {
            Some(days) => parse_weekdays(&days)?,
            None => Vec::new(),
        };
        Ok(Self {
            start: raw.start,
            end: raw.end,
            days,
            timezone,
        })
    }

    fn to_json(&self) -> JsonValue {
        json!({
            "start": self.start,
            "end": self.end,
            "days": weekday_names(&self.days),
            "timezone": self.timezone,
        })
    }
}

// ============================================================================
// TimeRules
// ============================================================================

/// Constraints for timestamps
#[derive(Debug, Clone, Default)]
pub struct TimeRules {
    pub required: bool,
    pub min_date: Option<DateTime<FixedOffset>>,
    pub max_date: Option<DateTime<FixedOffset>>,
    /// Accepted string formats; empty means `rfc3339`
    pub formats: Vec<String>,
    /// Timezones tried when parsing; the first resolvable one is also the
    /// projection zone for time-of-day checks. Empty means `UTC`.
    pub timezones: Vec<String>,
    pub before_now: bool,
    pub after_now: bool,
    /// Symmetric window around now
    pub relative_range: Option<Duration>,
    /// Reject Saturdays and Sundays
    pub workday: bool,
    pub weekdays: Vec<Weekday>,
    pub holidays: Vec<NaiveDate>,
    pub min_time: Option<NaiveTime>,
    pub max_time: Option<NaiveTime>,
    pub business_hours: Option<BusinessHours>,
}

impl TimeRules {
    pub fn from_params(params: &Params<'_>) -> Result<Self, ConfigError> {
        params.check_known(PARAMS)?;

        let formats = params.strings("formats")?;
        for format in &formats {
            let named = format.eq_ignore_ascii_case(RFC3339) || format.eq_ignore_ascii_case(RFC2822);
            if !named && StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(params.invalid("formats", format!("invalid format '{}'", format)));
            }
        }

        let timezones = params.strings("timezones")?;
        for tz in &timezones {
            if tz.parse::<Tz>().is_err() {
                return Err(params.invalid("timezones", format!("unknown timezone '{}'", tz)));
            }
        }

        let instant = |key: &str| -> Result<Option<DateTime<FixedOffset>>, ConfigError> {
            match params.raw(key) {
                None => Ok(None),
                Some(JsonValue::String(s)) => parse_instant(s)
                    .map(Some)
                    .ok_or_else(|| params.invalid(key, "expected an RFC 3339 timestamp or YYYY-MM-DD")),
                Some(_) => params
                    .i64(key)?
                    .and_then(unix_seconds)
                    .map(Some)
                    .ok_or_else(|| params.invalid(key, "timestamp out of range")),
            }
        };

        let time_of_day = |key: &str| -> Result<Option<NaiveTime>, ConfigError> {
            match params.string(key)? {
                None => Ok(None),
                Some(s) => parse_time_of_day(&s)
                    .map(Some)
                    .ok_or_else(|| params.invalid(key, "expected HH:MM or HH:MM:SS")),
            }
        };

        let relative_range = match params.raw("relative_range") {
            None => None,
            Some(JsonValue::String(s)) => {
                Some(parse_duration(s).map_err(|reason| params.invalid("relative_range", reason))?)
            }
            Some(JsonValue::Number(n)) => Some(
                n.as_f64()
                    .and_then(seconds_to_duration)
                    .ok_or_else(|| params.invalid("relative_range", "expected a non-negative duration"))?,
            ),
            Some(_) => return Err(params.invalid("relative_range", "expected a duration")),
        };

        let weekdays = match params.raw("weekdays") {
            None => Vec::new(),
            Some(value) => parse_weekdays(value).map_err(|reason| params.invalid("weekdays", reason))?,
        };

        let holidays = params
            .strings("holidays")?
            .iter()
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.date_naive()))
                    .ok_or_else(|| params.invalid("holidays", format!("invalid date '{}'", s)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let business_hours = match params.raw("business_hours") {
            None => None,
            Some(value) => Some(
                BusinessHours::from_json(value)
                    .map_err(|reason| params.invalid("business_hours", reason))?,
            ),
        };

        Ok(Self {
            required: params.flag("required")?,
            min_date: instant("min_date")?,
            max_date: instant("max_date")?,
            formats,
            timezones,
            before_now: params.flag("before_now")?,
            after_now: params.flag("after_now")?,
            relative_range,
            workday: params.flag("workday")?,
            weekdays,
            holidays,
            min_time: time_of_day("min_time")?,
            max_time: time_of_day("max_time")?,
            business_hours,
        })
    }

    fn effective_formats(&self) -> JsonValue {
        if self.formats.is_empty() {
            json!([RFC3339])
        } else {
            json!(self.formats)
        }
    }

    fn check(&self, t: DateTime<FixedOffset>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let provided = rfc3339(&t);

        if let Some(min) = &self.min_date {
            if t < *min {
                errors.add_error("min_date", rfc3339(min), provided.as_str(), "date is before minimum allowed date");
            }
        }
        if let Some(max) = &self.max_date {
            if t > *max {
                errors.add_error("max_date", rfc3339(max), provided.as_str(), "date is after maximum allowed date");
            }
        }

        let now = Utc::now().fixed_offset();
        if self.before_now && t > now {
            errors.add_error("before_now", rfc3339(&now), provided.as_str(), "date must be before current time");
        }
        if self.after_now && t < now {
            errors.add_error("after_now", rfc3339(&now), provided.as_str(), "date must be after current time");
        }

        if let Some(range) = self.relative_range {
            let offset = t.signed_duration_since(now);
            if offset > range || offset < -range {
                errors.add_error(
                    "relative_range",
                    range.num_seconds(),
                    provided.as_str(),
                    "date is outside the allowed relative range",
                );
            }
        }

        let weekday = t.weekday();
        if self.workday && matches!(weekday, Weekday::Sat | Weekday::Sun) {
            errors.add_error("workday", true, provided.as_str(), "date must be a workday");
        }
        if !self.weekdays.is_empty() && !self.weekdays.contains(&weekday) {
            errors.add_error(
                "weekdays",
                weekday_names(&self.weekdays),
                provided.as_str(),
                "date must be on one of the allowed weekdays",
            );
        }
        if self.holidays.contains(&t.date_naive()) {
            let holidays: Vec<String> = self.holidays.iter().map(|d| d.to_string()).collect();
            errors.add_error("holidays", json!(holidays), provided.as_str(), "date cannot be a holiday");
        }

        // Projection zone for time-of-day checks
        let zone = if self.timezones.is_empty() {
            Some(Tz::UTC)
        } else {
            self.timezones.iter().find_map(|name| name.parse::<Tz>().ok())
        };
        let zone = match zone {
            Some(zone) => zone,
            None => {
                errors.add_error("timezones", json!(self.timezones), provided.as_str(), "no valid timezone found");
                return errors;
            }
        };

        let time_of_day = t.with_timezone(&zone).time();
        if let Some(min) = self.min_time {
            if time_of_day < min {
                errors.add_error("min_time", min.to_string(), provided.as_str(), "time is before minimum allowed time");
            }
        }
        if let Some(max) = self.max_time {
            if time_of_day > max {
                errors.add_error("max_time", max.to_string(), provided.as_str(), "time is after maximum allowed time");
            }
        }

        if let Some(hours) = &self.business_hours {
            self.check_business_hours(hours, &t, zone, &provided, &mut errors);
        }

        errors
    }

    fn check_business_hours(
        &self,
        hours: &BusinessHours,
        t: &DateTime<FixedOffset>,
        zone: Tz,
        provided: &str,
        errors: &mut ValidationErrors,
    ) {
        let zone = match &hours.timezone {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    errors.add_error("timezones", name.as_str(), provided, "invalid timezone for business hours");
                    return;
                }
            },
            None => zone,
        };
        let local = t.with_timezone(&zone);

        if !hours.days.is_empty() && !hours.days.contains(&local.weekday()) {
            errors.add_error("business_hours", hours.to_json(), provided, "time is not within business days");
            return;
        }

        let start = match parse_hm(&hours.start) {
            Some(start) => start,
            None => {
                errors.add_error(
                    "business_hours",
                    hours.start.as_str(),
                    provided,
                    "invalid business hours start time format",
                );
                return;
            }
        };
        let end = match parse_hm(&hours.end) {
            Some(end) => end,
            None => {
                errors.add_error(
                    "business_hours",
                    hours.end.as_str(),
                    provided,
                    "invalid business hours end time format",
                );
                return;
            }
        };

        let now = NaiveTime::from_hms_opt(local.hour(), local.minute(), 0).unwrap_or(start);
        if now < start || now > end {
            errors.add_error("business_hours", hours.to_json(), provided, "time is not within business hours");
        }
    }
}

impl RuleSet for TimeRules {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        let t = match value {
            Value::Null => return absent(self.required),
            Value::String(s) if s.is_empty() => return absent(self.required),
            Value::String(s) => match parse_time_string(s, &self.formats, &self.timezones) {
                Some(t) => t,
                None => {
                    let mut errors = ValidationErrors::new();
                    errors.add_error("formats", self.effective_formats(), s.as_str(), "invalid time format or timezone");
                    return Err(errors);
                }
            },
            Value::Int(secs) => match unix_seconds(*secs) {
                Some(t) => t,
                None => {
                    let mut errors = ValidationErrors::new();
                    errors.add_error("type", "unix seconds", *secs, "timestamp out of range");
                    return Err(errors);
                }
            },
            Value::Time(t) => *t,
            other => {
                return type_mismatch(
                    "time",
                    other,
                    "value must be a timestamp, a string or Unix seconds",
                )
            }
        };

        self.check(t).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleType;
    use serde_json::Map;

    fn rules(params: JsonValue) -> Result<TimeRules, ConfigError> {
        let map: Map<String, JsonValue> = match params {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        TimeRules::from_params(&Params::new(RuleType::Time, &map))
    }

    fn failed_rules(rules: &TimeRules, value: impl Into<Value>) -> Vec<String> {
        match rules.validate(&value.into()) {
            Ok(()) => vec![],
            Err(errors) => errors.into_iter().map(|e| e.rule).collect(),
        }
    }

    // Saturday
    const SATURDAY: &str = "2024-01-06T12:00:00Z";
    // Wednesday
    const WEDNESDAY: &str = "2024-01-10T10:30:00Z";

    #[test]
    fn test_workday() {
        let on = rules(json!({"workday": true})).unwrap();
        let off = rules(json!({"workday": false})).unwrap();
        assert_eq!(failed_rules(&on, SATURDAY), vec!["workday"]);
        assert!(failed_rules(&off, SATURDAY).is_empty());
        assert!(failed_rules(&on, WEDNESDAY).is_empty());
    }

    #[test]
    fn test_input_kinds() {
        let r = rules(json!({"required": true, "workday": true})).unwrap();
        let saturday = DateTime::parse_from_rfc3339(SATURDAY).unwrap();
        assert_eq!(failed_rules(&r, saturday), vec!["workday"]);
        assert_eq!(failed_rules(&r, saturday.timestamp()), vec!["workday"]);
        assert_eq!(failed_rules(&r, Value::Null), vec!["required"]);
        assert_eq!(failed_rules(&r, ""), vec!["required"]);
        assert_eq!(failed_rules(&r, 1.5), vec!["type"]);
        assert_eq!(failed_rules(&r, "yesterday"), vec!["formats"]);
    }

    #[test]
    fn test_custom_formats_and_timezones() {
        let r = rules(json!({
            "formats": ["%Y-%m-%d %H:%M", "%d/%m/%Y"],
            "timezones": ["Asia/Tokyo"],
            "min_time": "09:00",
            "max_time": "18:00",
        }))
        .unwrap();
        assert!(failed_rules(&r, "2024-01-10 10:00").is_empty());
        assert_eq!(failed_rules(&r, "2024-01-10 20:00"), vec!["max_time"]);
        // Date-only pattern means midnight
        assert_eq!(failed_rules(&r, "10/01/2024"), vec!["min_time"]);
        // Wall-clock patterns are read in the configured zone
        let t = parse_time_string("2024-01-10 09:30", &r.formats, &r.timezones).unwrap();
        assert_eq!(t.to_rfc3339(), "2024-01-10T09:30:00+09:00");
    }

    #[test]
    fn test_parse_time_string_defaults() {
        assert!(parse_time_string("2024-01-10T10:30:00+02:00", &[], &[]).is_some());
        assert!(parse_time_string("2024-01-10", &[], &[]).is_none());
        let rfc2822 = vec![RFC2822.to_string()];
        assert!(parse_time_string("Wed, 10 Jan 2024 10:30:00 +0000", &rfc2822, &[]).is_some());
        let bad_tz = vec!["Mars/Olympus".to_string()];
        assert!(parse_time_string("2024-01-10T10:30:00Z", &[], &bad_tz).is_none());
    }

    #[test]
    fn test_date_bounds() {
        let r = rules(json!({"min_date": "2024-01-01", "max_date": "2024-12-31T23:59:59Z"})).unwrap();
        assert!(failed_rules(&r, WEDNESDAY).is_empty());
        assert_eq!(failed_rules(&r, "2023-12-31T23:59:59Z"), vec!["min_date"]);
        assert_eq!(failed_rules(&r, "2025-01-01T00:00:00Z"), vec!["max_date"]);
    }

    #[test]
    fn test_relative_to_now() {
        let past = "2000-01-01T00:00:00Z";
        let future = "2999-01-01T00:00:00Z";
        let before = rules(json!({"before_now": true})).unwrap();
        let after = rules(json!({"after_now": true})).unwrap();
        assert!(failed_rules(&before, past).is_empty());
        assert_eq!(failed_rules(&before, future), vec!["before_now"]);
        assert!(failed_rules(&after, future).is_empty());
        assert_eq!(failed_rules(&after, past), vec!["after_now"]);

        let window = rules(json!({"relative_range": "24h"})).unwrap();
        assert_eq!(failed_rules(&window, past), vec!["relative_range"]);
        assert!(failed_rules(&window, Utc::now()).is_empty());

        let numeric = rules(json!({"relative_range": 60})).unwrap();
        assert_eq!(numeric.relative_range, Some(Duration::seconds(60)));
    }

    #[test]
    fn test_weekdays_and_holidays() {
        let r = rules(json!({"weekdays": ["mon", "Wednesday", 5]})).unwrap();
        assert_eq!(r.weekdays, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert!(failed_rules(&r, WEDNESDAY).is_empty());
        assert_eq!(failed_rules(&r, SATURDAY), vec!["weekdays"]);

        let h = rules(json!({"holidays": ["2024-01-10", "2024-12-25"]})).unwrap();
        assert_eq!(failed_rules(&h, WEDNESDAY), vec!["holidays"]);
        assert!(failed_rules(&h, SATURDAY).is_empty());
    }

    #[test]
    fn test_business_hours() {
        let r = rules(json!({
            "business_hours": {
                "start": "09:00",
                "end": "17:00",
                "days": ["mon", "tue", "wed", "thu", "fri"],
                "timezone": "Europe/Berlin",
            }
        }))
        .unwrap();
        // 10:30Z is 11:30 in Berlin
        assert!(failed_rules(&r, WEDNESDAY).is_empty());
        assert_eq!(failed_rules(&r, "2024-01-10T17:30:00Z"), vec!["business_hours"]);
        assert_eq!(failed_rules(&r, SATURDAY), vec!["business_hours"]);
    }

    #[test]
    fn test_business_hours_programmatic_errors() {
        let mut r = TimeRules {
            business_hours: Some(BusinessHours {
                start: "9am".to_string(),
                end: "17:00".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(failed_rules(&r, WEDNESDAY), vec!["business_hours"]);

        r.business_hours = Some(BusinessHours {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            timezone: Some("Nowhere/Land".to_string()),
            ..Default::default()
        });
        assert_eq!(failed_rules(&r, WEDNESDAY), vec!["timezones"]);
    }

    #[test]
    fn test_unresolvable_timezones_stop() {
        let r = TimeRules {
            timezones: vec!["Nowhere/Land".to_string()],
            min_time: NaiveTime::from_hms_opt(23, 0, 0),
            ..Default::default()
        };
        let t = DateTime::parse_from_rfc3339(WEDNESDAY).unwrap();
        assert_eq!(failed_rules(&r, t), vec!["timezones"]);
    }

    #[test]
    fn test_config_errors() {
        assert!(rules(json!({"timezones": ["Nowhere/Land"]})).is_err());
        assert!(rules(json!({"weekdays": ["funday"]})).is_err());
        assert!(rules(json!({"weekdays": [7]})).is_err());
        assert!(rules(json!({"min_time": "25:00"})).is_err());
        assert!(rules(json!({"holidays": ["not-a-date"]})).is_err());
        assert!(rules(json!({"relative_range": "soon"})).is_err());
        assert!(rules(json!({"formats": ["%Q"]})).is_err());
        assert!(rules(json!({"business_hours": {"start": "9", "end": "17:00"}})).is_err());
        assert!(rules(json!({"business_hours": {"start": "09:00", "end": "17:00", "tz": "UTC"}})).is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("2d").unwrap(), Duration::days(2));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::milliseconds(500));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::milliseconds(1500));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("5w").is_err());
        assert!(parse_duration("10").is_ok());
    }
}
