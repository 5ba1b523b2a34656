//! Lenient integer parsing for ids that arrive as query strings or as
//! either JSON numbers or strings.

use serde::{Deserialize, Deserializer};

/// Parses a leading integer the way browsers' `parseInt` does: optional
/// surrounding whitespace, optional sign, then digits up to the first
/// non-digit. `"12abc"` is 12, `"abc"` is `None`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// An id in a JSON body; clients send both `3` and `"3"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseId {
    Number(i64),
    Text(String),
}

impl LooseId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LooseId::Number(n) => Some(*n),
            LooseId::Text(s) => parse_leading_int(s),
        }
    }

    /// Empty strings and zero count as absent.
    pub fn is_present(&self) -> bool {
        match self {
            LooseId::Number(n) => *n != 0,
            LooseId::Text(s) => !s.is_empty(),
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default)]`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  7"), Some(7));
        assert_eq!(parse_leading_int("12abc"), Some(12));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_loose_id_accepts_numbers_and_strings() {
        let n: LooseId = serde_json::from_str("5").unwrap();
        let s: LooseId = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(n.as_i64(), Some(5));
        assert_eq!(s.as_i64(), Some(5));
        assert!(!LooseId::Text(String::new()).is_present());
    }
}
