//! # Version Ordinals
//!
//! Tags are ordered by an integer embedded in their name, e.g. `2.10-v3877`
//! has ordinal `3877`. The extraction is purely syntactic: the name is split
//! on its last `-v` separator and the trailing run must consist of ASCII
//! digits only. A bare `v<digits>` name without a label is accepted too.
//!
//! There are no semver precedence rules here; two tags compare by their
//! ordinals alone.
//!
//! What happens to a name that does not parse is decided by the caller
//! through an [`OrdinalPolicy`].

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::error::{Error, Result};

/// `<label>-v<digits>` with a greedy label, so the last `-v` wins.
static TAG_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(?P<label>.+)-)?v(?P<digits>[^-]*)$").unwrap());

/// How malformed tag names are treated during catalog construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrdinalPolicy {
    /// Log a warning and give the tag ordinal 0.
    #[default]
    Demote,
    /// Abort with the parse error.
    Strict,
}

/// Extract the ordinal from a tag name.
///
/// Fails with [`Error::Format`] when the name does not end in `-v<digits>`
/// (or is not `v<digits>`), or when the digits overflow `u64`.
pub fn parse(tag_name: &str) -> Result<u64> {
    let captures = TAG_ORDINAL.captures(tag_name).ok_or_else(|| Error::Format {
        tag: tag_name.to_string(),
        message: "expected a \"<label>-v<digits>\" name".to_string(),
    })?;

    let digits = &captures["digits"];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Format {
            tag: tag_name.to_string(),
            message: format!("version suffix {:?} is not a number", digits),
        });
    }

    digits.parse::<u64>().map_err(|e| Error::Format {
        tag: tag_name.to_string(),
        message: e.to_string(),
    })
}

/// Parse a tag name under the given policy.
///
/// Returns the ordinal and whether the tag was demoted. Under
/// [`OrdinalPolicy::Demote`] a parse failure is logged and yields `(0, true)`.
pub fn parse_with_policy(tag_name: &str, policy: OrdinalPolicy) -> Result<(u64, bool)> {
    match parse(tag_name) {
        Ok(ordinal) => Ok((ordinal, false)),
        Err(e) if policy == OrdinalPolicy::Demote => {
            warn!("{}; ordering tag {:?} first", e, tag_name);
            Ok((0, true))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_and_digits() {
        assert_eq!(parse("2.10-v3877").unwrap(), 3877);
        assert_eq!(parse("release-v1").unwrap(), 1);
    }

    #[test]
    fn test_parse_uses_last_separator() {
        assert_eq!(parse("pre-v2-final-v15").unwrap(), 15);
    }

    #[test]
    fn test_parse_bare_v_prefix() {
        assert_eq!(parse("v42").unwrap(), 42);
    }

    #[test]
    fn test_parse_leading_zeroes() {
        assert_eq!(parse("1.0-v007").unwrap(), 7);
    }

    #[test]
    fn test_parse_malformed_names() {
        for name in [
            "no-version-here",
            "1.0",
            "1.0-v",
            "1.0-v12a",
            "1.0-v+12",
            "1.0-v-12",
            "",
            "1.0-x12",
        ] {
            let err = parse(name).unwrap_err();
            assert!(
                matches!(err, Error::Format { ref tag, .. } if tag == name),
                "expected format error for {:?}, got {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_parse_overflow() {
        let err = parse("big-v99999999999999999999999").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_policy_demote() {
        assert_eq!(
            parse_with_policy("no-version-here", OrdinalPolicy::Demote).unwrap(),
            (0, true)
        );
        assert_eq!(
            parse_with_policy("1.0-v3", OrdinalPolicy::Demote).unwrap(),
            (3, false)
        );
    }

    #[test]
    fn test_policy_strict() {
        assert!(parse_with_policy("no-version-here", OrdinalPolicy::Strict).is_err());
    }

    #[test]
    fn test_demote_logs_warning() {
        testing_logger::setup();
        parse_with_policy("no-version-here", OrdinalPolicy::Demote).unwrap();
        testing_logger::validate(|captured_logs| {
            assert_eq!(captured_logs.len(), 1);
            assert_eq!(captured_logs[0].level, log::Level::Warn);
            assert!(captured_logs[0].body.contains("no-version-here"));
        });
    }
}
