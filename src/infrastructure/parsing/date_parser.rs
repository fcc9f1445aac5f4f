//! Date normalization for grabbed date strings
//!
//! Turns whatever a cinema site prints ("25.12", "Fr, 4. Dez.", "Heute")
//! into a calendar value. Strict format parsing comes first; formats without
//! a year get the year closest to "now + 4 months", and unmatched strings fall
//! back to the relative day word lists.

use chrono::{Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::Value;
use tracing::debug;

use super::config::DateConfig;
use super::context::ParsingContext;
use super::date_format::{locale, DateFormat, Locale};
use super::date_words::{DAY_AFTER_TOMORROW_WORDS, TODAY_WORDS, TOMORROW_WORDS};
use super::{ParsingError, ParsingResult};

/// How far ahead of "now" events are assumed to cluster
const YEAR_INFERENCE_LOOKAHEAD_MONTHS: u32 = 4;

/// A parsed date, or the raw string that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedDate {
    Valid(NaiveDateTime),
    Invalid(String),
}

impl NormalizedDate {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn value(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Valid(value) => Some(*value),
            Self::Invalid(_) => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.value().map(|v| v.date())
    }
}

/// Heterogeneous input accepted by [`DateParser::map_dates`]
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Raw(String),
    Native(NaiveDateTime),
    Normalized(NormalizedDate),
}

impl From<&str> for DateInput {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        Self::Native(value)
    }
}

impl From<NormalizedDate> for DateInput {
    fn from(value: NormalizedDate) -> Self {
        Self::Normalized(value)
    }
}

pub struct DateParser {
    formats: Vec<DateFormat>,
    locale: &'static Locale,
    preserve_year: bool,
    now: Option<NaiveDateTime>,
}

impl DateParser {
    pub fn new(config: &DateConfig) -> Self {
        Self {
            formats: config.date_format.as_slice().iter().map(|f| DateFormat::compile(f)).collect(),
            locale: locale(&config.date_locale),
            preserve_year: config.preserve_year,
            now: None,
        }
    }

    /// Pin the reference time instead of reading the local clock
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    pub fn parse(&self, raw: &str) -> NormalizedDate {
        let now = self.now();

        let strict = self
            .formats
            .iter()
            .find_map(|format| format.parse(raw, self.locale, now).map(|value| (format, value)));

        if let Some((format, value)) = strict {
            if !format.has_year() && !self.preserve_year {
                let inferred = infer_year(value, now);
                debug!("Inferred year for '{}' ({}): {}", raw, format.as_str(), inferred);
                return NormalizedDate::Valid(inferred);
            }
            return NormalizedDate::Valid(value);
        }

        let start_of_today = now.date().and_time(NaiveTime::MIN);
        if DAY_AFTER_TOMORROW_WORDS.matches(raw) {
            return NormalizedDate::Valid(start_of_today + TimeDelta::days(2));
        }
        if TOMORROW_WORDS.matches(raw) {
            return NormalizedDate::Valid(start_of_today + TimeDelta::days(1));
        }
        if TODAY_WORDS.matches(raw) {
            return NormalizedDate::Valid(start_of_today);
        }

        debug!("Could not parse date '{}'", raw);
        NormalizedDate::Invalid(raw.to_string())
    }

    /// Normalize a sequence of raw strings, native dates or normalized dates.
    ///
    /// Empty strings fail with the offending index. Invalid parses are kept
    /// and recorded as an `INVALID_DATE` warning on the context.
    pub fn map_dates<I>(&self, dates: I, context: &ParsingContext) -> ParsingResult<Vec<NormalizedDate>>
    where
        I: IntoIterator,
        I::Item: Into<DateInput>,
    {
        dates
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                let input: DateInput = input.into();
                let normalized = match input {
                    DateInput::Raw(raw) if raw.trim().is_empty() => {
                        return Err(ParsingError::EmptyDateValue { index });
                    }
                    DateInput::Raw(raw) => self.parse(&raw),
                    DateInput::Native(value) => NormalizedDate::Valid(value),
                    DateInput::Normalized(value) => value,
                };
                if let NormalizedDate::Invalid(raw) = &normalized {
                    context.add_warning("INVALID_DATE", format!("Unparsable date '{raw}' at index {index}"));
                }
                Ok(normalized)
            })
            .collect()
    }

    /// Same as [`Self::map_dates`] for loosely typed JSON input.
    ///
    /// Only non-empty strings are accepted; anything else is a type error
    /// naming the index and the value.
    pub fn map_date_values(&self, values: &[Value], context: &ParsingContext) -> ParsingResult<Vec<NormalizedDate>> {
        let inputs = values
            .iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::String(raw) if !raw.trim().is_empty() => Ok(DateInput::Raw(raw.clone())),
                Value::String(_) | Value::Null | Value::Bool(false) => Err(ParsingError::EmptyDateValue { index }),
                other => Err(ParsingError::unsupported_date_value(index, other)),
            })
            .collect::<ParsingResult<Vec<_>>>()?;
        self.map_dates(inputs, context)
    }
}

/// Parse with a one-off parser built from `config`
pub fn parse_date(raw: &str, config: &DateConfig) -> NormalizedDate {
    DateParser::new(config).parse(raw)
}

/// Pick the year variant of `value` closest to now + 4 months
fn infer_year(value: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    let reference = now
        .checked_add_months(Months::new(YEAR_INFERENCE_LOOKAHEAD_MONTHS))
        .unwrap_or(now);
    let candidates = [
        value.checked_sub_months(Months::new(12)),
        Some(value),
        value.checked_add_months(Months::new(12)),
    ];
    candidates
        .into_iter()
        .flatten()
        .min_by_key(|candidate| (*candidate - reference).num_seconds().abs())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap()
    }

    #[test]
    fn test_infer_year_prefers_upcoming_dates() {
        let now = at(2026, 11, 15);
        assert_eq!(infer_year(at(2026, 12, 25), now), at(2026, 12, 25));
        assert_eq!(infer_year(at(2026, 1, 5), now), at(2027, 1, 5));
        // a few weeks back is still closer than next year
        assert_eq!(infer_year(at(2026, 10, 1), now), at(2026, 10, 1));
        assert_eq!(infer_year(at(2026, 9, 1), now), at(2027, 9, 1));
    }

    #[test]
    fn test_infer_year_handles_leap_day() {
        let now = at(2027, 11, 15);
        // 2028-02-29 shifted back a year clamps to 2027-02-28
        assert_eq!(infer_year(at(2028, 2, 29), now), at(2028, 2, 29));
    }

    #[test]
    fn test_normalized_date_accessors() {
        let valid = NormalizedDate::Valid(at(2026, 12, 25));
        assert!(valid.is_valid());
        assert_eq!(valid.date(), NaiveDate::from_ymd_opt(2026, 12, 25));

        let invalid = NormalizedDate::Invalid("soon".to_string());
        assert!(!invalid.is_valid());
        assert_eq!(invalid.value(), None);
    }
}
