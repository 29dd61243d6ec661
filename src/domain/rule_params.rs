//! Recurrence parameters and their storage encoding.
//!
//! [`RuleParams`] is the decoded, validated parameter map. It is turned into
//! bytes only by [`RuleParams::encode`] and read back only by
//! [`RuleParams::decode`]; nothing else ever holds the stored form, so a
//! value can never be encoded twice.
//!
//! # Encoding (version 1)
//!
//! A JSON object:
//!
//! ```json
//! {"version":1,"interval":2,"count":null,"until":"2024-06-30T00:00:00Z","by_weekday":["MO","WE"]}
//! ```
//!
//! Weekdays use the RFC 5545 two-letter codes. Unknown fields or versions
//! are rejected so that newer payloads are never misread by older code.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Current version written by [`RuleParams::encode`].
pub const PARAMS_ENCODING_VERSION: u32 = 1;

/// Validated auxiliary parameters of a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParams {
    interval: u32,
    count: Option<u32>,
    until: Option<DateTime<Utc>>,
    by_weekday: Vec<Weekday>,
}

impl RuleParams {
    /// Builds a parameter map, normalizing `by_weekday` to Monday-first
    /// order without duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidRuleParams`] if `interval` or `count`
    /// is zero.
    pub fn new(
        interval: u32,
        count: Option<u32>,
        until: Option<DateTime<Utc>>,
        by_weekday: impl IntoIterator<Item = Weekday>,
    ) -> Result<Self, CalendarError> {
        if interval == 0 {
            return Err(CalendarError::InvalidRuleParams(
                "interval must be at least 1".to_string(),
            ));
        }
        if count == Some(0) {
            return Err(CalendarError::InvalidRuleParams(
                "count must be at least 1".to_string(),
            ));
        }
        let mut by_weekday: Vec<Weekday> = by_weekday.into_iter().collect();
        by_weekday.sort_by_key(Weekday::num_days_from_monday);
        by_weekday.dedup();
        Ok(Self {
            interval,
            count,
            until,
            by_weekday,
        })
    }

    /// Step size in units of the rule's frequency.
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Total number of occurrences counted from the anchor, if bounded.
    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        self.count
    }

    /// Last instant an occurrence may fall on (inclusive), if bounded.
    #[must_use]
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    /// Selected weekdays, Monday first. Empty means no restriction.
    #[must_use]
    pub fn by_weekday(&self) -> &[Weekday] {
        &self.by_weekday
    }

    /// Returns `true` if neither `count` nor `until` terminates the rule.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.count.is_none() && self.until.is_none()
    }

    /// Serializes to the versioned storage form.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Internal`] if JSON serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, CalendarError> {
        let encoded = EncodedParams {
            version: PARAMS_ENCODING_VERSION,
            interval: self.interval,
            count: self.count,
            until: self.until,
            by_weekday: self.by_weekday.iter().copied().map(WeekdayCode::from).collect(),
        };
        serde_json::to_vec(&encoded)
            .map_err(|e| CalendarError::Internal(format!("encoding rule parameters: {e}")))
    }

    /// Parses the versioned storage form.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::CorruptParameterEncoding`] if the bytes are
    /// not a version 1 document or hold out-of-range values.
    pub fn decode(bytes: &[u8]) -> Result<Self, CalendarError> {
        let encoded: EncodedParams = serde_json::from_slice(bytes)
            .map_err(|e| CalendarError::CorruptParameterEncoding(e.to_string()))?;
        if encoded.version != PARAMS_ENCODING_VERSION {
            return Err(CalendarError::CorruptParameterEncoding(format!(
                "unsupported parameter encoding version {}",
                encoded.version
            )));
        }
        Self::new(
            encoded.interval,
            encoded.count,
            encoded.until,
            encoded.by_weekday.into_iter().map(Weekday::from),
        )
        .map_err(|e| CalendarError::CorruptParameterEncoding(e.to_string()))
    }
}

impl Default for RuleParams {
    fn default() -> Self {
        Self {
            interval: 1,
            count: None,
            until: None,
            by_weekday: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct EncodedParams {
    version: u32,
    interval: u32,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    until: Option<DateTime<Utc>>,
    #[serde(default)]
    by_weekday: Vec<WeekdayCode>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum WeekdayCode {
    Mo,
    Tu,
    We,
    Th,
    Fr,
    Sa,
    Su,
}

impl From<Weekday> for WeekdayCode {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::Mo,
            Weekday::Tue => Self::Tu,
            Weekday::Wed => Self::We,
            Weekday::Thu => Self::Th,
            Weekday::Fri => Self::Fr,
            Weekday::Sat => Self::Sa,
            Weekday::Sun => Self::Su,
        }
    }
}

impl From<WeekdayCode> for Weekday {
    fn from(code: WeekdayCode) -> Self {
        match code {
            WeekdayCode::Mo => Self::Mon,
            WeekdayCode::Tu => Self::Tue,
            WeekdayCode::We => Self::Wed,
            WeekdayCode::Th => Self::Thu,
            WeekdayCode::Fr => Self::Fri,
            WeekdayCode::Sa => Self::Sat,
            WeekdayCode::Su => Self::Sun,
        }
    }
}

/// RFC 5545 two-letter code for a weekday (`MO` through `SU`).
#[must_use]
pub const fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Parses a weekday from its two-letter code or an English name
/// (`"MO"`, `"mon"`, `"Monday"`), ignoring case.
#[must_use]
pub fn parse_weekday(text: &str) -> Option<Weekday> {
    let text = text.trim();
    match text.to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => text.parse().ok(),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params(
        interval: u32,
        count: Option<u32>,
        until: Option<DateTime<Utc>>,
        days: &[Weekday],
    ) -> RuleParams {
        let Ok(p) = RuleParams::new(interval, count, until, days.iter().copied()) else {
            panic!("valid params");
        };
        p
    }

    fn round_trip(p: &RuleParams) -> RuleParams {
        let Ok(bytes) = p.encode() else {
            panic!("encode failed");
        };
        let Ok(decoded) = RuleParams::decode(&bytes) else {
            panic!("decode failed");
        };
        decoded
    }

    #[test]
    fn rejects_zero_interval_and_count() {
        assert!(matches!(
            RuleParams::new(0, None, None, []),
            Err(CalendarError::InvalidRuleParams(_))
        ));
        assert!(matches!(
            RuleParams::new(1, Some(0), None, []),
            Err(CalendarError::InvalidRuleParams(_))
        ));
    }

    #[test]
    fn normalizes_weekdays() {
        let p = params(1, None, None, &[Weekday::Fri, Weekday::Mon, Weekday::Fri]);
        assert_eq!(p.by_weekday(), &[Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn bounded_by_count_or_until() {
        assert!(RuleParams::default().is_unbounded());
        assert!(!params(1, Some(3), None, &[]).is_unbounded());
        let until = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).single();
        assert!(!params(1, None, until, &[]).is_unbounded());
    }

    #[test]
    fn decode_inverts_encode() {
        let until = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).single();
        let cases = [
            RuleParams::default(),
            params(3, Some(10), None, &[]),
            params(1, None, until, &[Weekday::Tue, Weekday::Thu]),
            params(2, Some(5), until, &[Weekday::Sun]),
        ];
        for p in &cases {
            assert_eq!(&round_trip(p), p);
        }
    }

    #[test]
    fn encoding_is_versioned_json_with_rfc_codes() {
        let p = params(2, None, None, &[Weekday::Mon, Weekday::Wed]);
        let Ok(bytes) = p.encode() else {
            panic!("encode failed");
        };
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            panic!("not json");
        };
        assert_eq!(value["version"], 1);
        assert_eq!(value["interval"], 2);
        assert_eq!(value["by_weekday"], serde_json::json!(["MO", "WE"]));
    }

    #[test]
    fn double_encoded_bytes_are_corrupt() {
        let Ok(bytes) = RuleParams::default().encode() else {
            panic!("encode failed");
        };
        let Ok(text) = String::from_utf8(bytes) else {
            panic!("not utf-8");
        };
        let Ok(twice) = serde_json::to_vec(&text) else {
            panic!("encode failed");
        };
        assert!(matches!(
            RuleParams::decode(&twice),
            Err(CalendarError::CorruptParameterEncoding(_))
        ));
    }

    #[test]
    fn garbage_and_unknown_versions_are_corrupt() {
        assert!(matches!(
            RuleParams::decode(b"\x80\x04\x95"),
            Err(CalendarError::CorruptParameterEncoding(_))
        ));
        assert!(matches!(
            RuleParams::decode(br#"{"version":2,"interval":1}"#),
            Err(CalendarError::CorruptParameterEncoding(_))
        ));
        assert!(matches!(
            RuleParams::decode(br#"{"version":1,"interval":0}"#),
            Err(CalendarError::CorruptParameterEncoding(_))
        ));
        assert!(matches!(
            RuleParams::decode(br#"{"version":1,"interval":1,"byday":["MO"]}"#),
            Err(CalendarError::CorruptParameterEncoding(_))
        ));
    }

    #[test]
    fn empty_payload_is_corrupt_not_default() {
        assert!(matches!(
            RuleParams::decode(b""),
            Err(CalendarError::CorruptParameterEncoding(_))
        ));
    }

    #[test]
    fn weekday_codes_parse_both_ways() {
        for day in [Weekday::Mon, Weekday::Thu, Weekday::Sun] {
            assert_eq!(parse_weekday(weekday_code(day)), Some(day));
        }
        assert_eq!(parse_weekday("we"), Some(Weekday::Wed));
        assert_eq!(parse_weekday("Friday"), Some(Weekday::Fri));
        assert_eq!(parse_weekday("XX"), None);
    }
}
