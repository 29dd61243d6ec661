//! Named recurrence rules.

use super::{Frequency, RuleId, RuleParams};
use crate::error::CalendarError;

/// Maximum length of rule and event names.
pub const MAX_NAME_LEN: usize = 36;

/// A named repeating pattern: a frequency plus optional parameters.
///
/// Only the decoded [`RuleParams`] live here. The stored byte form is
/// produced on demand by [`RecurrenceRule::encoded_params`] and consumed
/// by [`RecurrenceRule::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// Rule identifier.
    pub id: RuleId,
    /// Display label.
    pub name: String,
    /// Repetition unit.
    pub frequency: Frequency,
    /// Decoded parameters; `None` if none were ever set.
    pub params: Option<RuleParams>,
}

impl RecurrenceRule {
    /// Creates a new rule with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidRequest`] if the name is empty or
    /// longer than [`MAX_NAME_LEN`] characters.
    pub fn new(
        name: impl Into<String>,
        frequency: Frequency,
        params: Option<RuleParams>,
    ) -> Result<Self, CalendarError> {
        let rule = Self {
            id: RuleId::new(),
            name: name.into(),
            frequency,
            params,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Rebuilds a rule from its stored columns, decoding the parameter
    /// bytes exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidRuleFrequency`] for an unknown
    /// frequency text and [`CalendarError::CorruptParameterEncoding`] if
    /// the parameter bytes do not decode.
    pub fn from_parts(
        id: RuleId,
        name: String,
        frequency: &str,
        params: Option<&[u8]>,
    ) -> Result<Self, CalendarError> {
        let frequency = frequency.parse()?;
        let params = params.map(RuleParams::decode).transpose()?;
        Ok(Self {
            id,
            name,
            frequency,
            params,
        })
    }

    /// Checks the name constraint.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidRequest`] on an empty or overlong name.
    pub fn validate(&self) -> Result<(), CalendarError> {
        validate_name("rule", &self.name)
    }

    /// Returns the decoded parameters, or `None` if none were set.
    #[must_use]
    pub fn get_params(&self) -> Option<&RuleParams> {
        self.params.as_ref()
    }

    /// Returns the parameters to expand with, falling back to the defaults
    /// (interval 1, unbounded) when none were set.
    #[must_use]
    pub fn effective_params(&self) -> RuleParams {
        self.params.clone().unwrap_or_default()
    }

    /// Produces the storage form of the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Internal`] if serialization fails.
    pub fn encoded_params(&self) -> Result<Option<Vec<u8>>, CalendarError> {
        self.params.as_ref().map(RuleParams::encode).transpose()
    }
}

/// Validates a display name against [`MAX_NAME_LEN`].
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<(), CalendarError> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(CalendarError::InvalidRequest(format!(
            "{kind} name must not be empty"
        )));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CalendarError::InvalidRequest(format!(
            "{kind} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn weekly_params() -> RuleParams {
        let Ok(p) = RuleParams::new(1, Some(4), None, [Weekday::Mon]) else {
            panic!("valid params");
        };
        p
    }

    #[test]
    fn rejects_bad_names() {
        assert!(RecurrenceRule::new("", Frequency::Daily, None).is_err());
        assert!(RecurrenceRule::new("x".repeat(37), Frequency::Daily, None).is_err());
        assert!(RecurrenceRule::new("x".repeat(36), Frequency::Daily, None).is_ok());
    }

    #[test]
    fn get_params_is_empty_when_unset() {
        let Ok(rule) = RecurrenceRule::new("Every day", Frequency::Daily, None) else {
            panic!("valid rule");
        };
        assert!(rule.get_params().is_none());
        assert_eq!(rule.effective_params(), RuleParams::default());
        assert!(matches!(rule.encoded_params(), Ok(None)));
    }

    #[test]
    fn stored_parts_round_trip() {
        let Ok(rule) = RecurrenceRule::new("Mondays", Frequency::Weekly, Some(weekly_params()))
        else {
            panic!("valid rule");
        };
        let Ok(bytes) = rule.encoded_params() else {
            panic!("encode failed");
        };
        let Ok(loaded) =
            RecurrenceRule::from_parts(rule.id, rule.name.clone(), "WEEKLY", bytes.as_deref())
        else {
            panic!("decode failed");
        };
        assert_eq!(loaded, rule);
    }

    #[test]
    fn repeated_saves_never_double_encode() {
        let Ok(rule) = RecurrenceRule::new("Mondays", Frequency::Weekly, Some(weekly_params()))
        else {
            panic!("valid rule");
        };
        let (Ok(first), Ok(second)) = (rule.encoded_params(), rule.encoded_params()) else {
            panic!("encode failed");
        };
        assert_eq!(first, second);
    }

    #[test]
    fn from_parts_rejects_unknown_frequency() {
        let result = RecurrenceRule::from_parts(RuleId::new(), "x".to_string(), "HOURLY", None);
        assert!(matches!(result, Err(CalendarError::InvalidRuleFrequency(_))));
    }

    #[test]
    fn from_parts_surfaces_corrupt_params() {
        let result =
            RecurrenceRule::from_parts(RuleId::new(), "x".to_string(), "DAILY", Some(b"\"{}\"".as_slice()));
        assert!(matches!(result, Err(CalendarError::CorruptParameterEncoding(_))));
    }
}
