pub mod chrono {
    //! Parsing of schedule times sent by admin clients.

    use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("unrecognized time `{0}`; expected RFC 3339 or YYYY-MM-DDTHH:MM[:SS]")]
    pub struct InvalidScheduleTime(pub String);

    const LOCAL_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    /// Parse an RFC 3339 timestamp, or a zone-less date-time (as produced by an HTML
    /// `datetime-local` input) interpreted in the local time zone.
    ///
    /// A local time that is ambiguous (DST fold) resolves to the earlier instant.
    pub fn parse_schedule_time(raw: &str) -> Result<DateTime<Utc>, InvalidScheduleTime> {
        let raw = raw.trim();
        if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
            return Ok(t.with_timezone(&Utc));
        }
        LOCAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| InvalidScheduleTime(raw.to_string()))
    }

    /// Like [`parse_schedule_time`], treating an absent or blank value as `None`.
    pub fn parse_optional_schedule_time(
        raw: Option<&str>,
    ) -> Result<Option<DateTime<Utc>>, InvalidScheduleTime> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_schedule_time(raw).map(Some),
        }
    }

}

pub mod month {
    //! Month-aware ordering of folder names, so that `January` sorts before `February`.

    use std::cmp::Ordering;

    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    /// Calendar month (1-12) named by a folder, if any.
    ///
    /// Recognizes full English names and three-letter abbreviations, in any case, optionally
    /// preceded by digits and a separator (`03-March`, `3_mar`) and followed by anything that is
    /// not a letter (`March 2025`).
    pub fn month_of(name: &str) -> Option<u32> {
        let rest = name
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start_matches(['-', '_', ' ', '.']);
        let word: String = rest
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if word.len() < 3 {
            return None;
        }
        MONTHS
            .iter()
            .position(|month| *month == word || (word.len() == 3 && month.starts_with(&word)))
            .map(|i| i as u32 + 1)
    }

    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
    enum SortKey {
        Month(u32),
        Number(u64),
        Other(String),
    }

    fn sort_key(name: &str) -> SortKey {
        if let Some(month) = month_of(name) {
            SortKey::Month(month)
        } else if let Some(n) = name
            .bytes()
            .all(|b| b.is_ascii_digit())
            .then(|| name.parse().ok())
            .flatten()
        {
            SortKey::Number(n)
        } else {
            SortKey::Other(name.to_lowercase())
        }
    }

    /// Months first in calendar order, then numeric names in numeric order, then the rest
    /// case-insensitively. Ties fall back to plain string order so the result is total.
    pub fn compare_folder_names(a: &str, b: &str) -> Ordering {
        sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
    }

}
