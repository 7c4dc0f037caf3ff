use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "todos-dev",
            Profile::Prod => "todos",
        }
    }
}

/// Get the configuration directory path
/// If profile is Dev, uses "todos-dev" instead of "todos"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "todos", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path
/// If profile is Dev, uses "todos-dev" instead of "todos"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "todos", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Current time at the precision timestamps are stored with (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for storage.
///
/// Always the same width (`2024-05-01T14:30:00.000000Z`), so comparing the
/// stored text orders rows chronologically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Whether `format_timestamp` writes `ts` as four-digit-year RFC 3339 text
pub fn is_storable(ts: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

/// Parse a timestamp written by `format_timestamp` (any RFC 3339 value works)
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a submitted due date.
///
/// Accepts ISO 8601 date-times with a `T` or space separator, optional
/// seconds and fraction, and an optional `Z` or numeric offset. Values without
/// an offset are read as UTC. Anything else, including a bare date or a
/// year outside 0..=9999 (after conversion to UTC), yields `None`.
pub fn parse_due_date(input: &str) -> Option<DateTime<Utc>> {
    parse_date_time(input).filter(is_storable)
}

fn parse_date_time(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(naive) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return parse_naive(naive);
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(6))
        .or_else(|| parse_naive(s))
}

fn parse_naive(s: &str) -> Option<DateTime<Utc>> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().trunc_subsecs(6))
}

/// Format a due date the way an HTML `datetime-local` input expects it
pub fn format_datetime_local(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M").to_string()
}
