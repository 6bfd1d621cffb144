use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single cell as read from the source, before any coercion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Builds a cell from delimited text, where an empty field means no value.
    pub fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Integer(i) => i.to_string(),
            Cell::Float(f) => format_number(*f),
            Cell::Boolean(b) => b.to_string(),
            Cell::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Integer(i) => *i as f64,
            Cell::Float(f) => *f,
            Cell::Boolean(b) => f64::from(u8::from(*b)),
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::DateTime(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Text view of the cell; empty cells have none.
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.as_display())
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => parse_naive_date(s.trim()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Coerces a raw click count to a non-negative integer.
///
/// Anything without a finite numeric reading counts as zero; fractions
/// truncate toward zero.
pub fn coerce_clicks(cell: &Cell) -> u64 {
    match cell {
        Cell::Integer(i) => u64::try_from(*i).unwrap_or(0),
        other => other
            .as_f64()
            .filter(|value| *value > 0.0)
            .map(|value| value.trunc() as u64)
            .unwrap_or(0),
    }
}

/// Parses the calendar date out of the common textual representations.
///
/// Returns `None` rather than an error: unparsable dates are absent, never
/// defaulted.
pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%d.%m.%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%d %b %Y",
    ];
    if value.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    parse_naive_datetime(value).map(|dt| dt.date())
}

pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_local())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_naive_date_supports_multiple_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_naive_date("2024-05-06"), Some(expected));
        assert_eq!(parse_naive_date("05/06/2024"), Some(expected));
        assert_eq!(parse_naive_date("2024/05/06"), Some(expected));
        assert_eq!(parse_naive_date("May 6, 2024"), Some(expected));
        assert_eq!(parse_naive_date("2024-05-06 14:30:00"), Some(expected));
        assert_eq!(parse_naive_date("2024-05-06T14:30:00+02:00"), Some(expected));
    }

    #[test]
    fn parse_naive_date_falls_back_to_day_first() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 25).unwrap();
        assert_eq!(parse_naive_date("25/05/2024"), Some(expected));
    }

    #[test]
    fn unparsable_dates_are_absent() {
        assert_eq!(parse_naive_date(""), None);
        assert_eq!(parse_naive_date("yesterday"), None);
        assert_eq!(parse_naive_date("2024-13-45"), None);
        assert_eq!(Cell::Integer(45000).as_date(), None);
    }

    #[test]
    fn coerce_clicks_never_fails() {
        assert_eq!(coerce_clicks(&Cell::Integer(42)), 42);
        assert_eq!(coerce_clicks(&Cell::Float(12.9)), 12);
        assert_eq!(coerce_clicks(&Cell::Text(" 7 ".into())), 7);
        assert_eq!(coerce_clicks(&Cell::Text("7.8".into())), 7);
        assert_eq!(coerce_clicks(&Cell::Text("lots".into())), 0);
        assert_eq!(coerce_clicks(&Cell::Text("NaN".into())), 0);
        assert_eq!(coerce_clicks(&Cell::Text("inf".into())), 0);
        assert_eq!(coerce_clicks(&Cell::Integer(-5)), 0);
        assert_eq!(coerce_clicks(&Cell::Float(-0.5)), 0);
        assert_eq!(coerce_clicks(&Cell::Boolean(true)), 1);
        assert_eq!(coerce_clicks(&Cell::Empty), 0);
    }

    #[test]
    fn display_drops_trailing_zero_fraction() {
        assert_eq!(Cell::Float(34.0).as_display(), "34");
        assert_eq!(Cell::Float(34.5).as_display(), "34.5");
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Cell::DateTime(midnight).as_display(), "2024-01-05");
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(Cell::Text("   ".into()).is_empty());
        assert_eq!(Cell::Text("  ".into()).as_text(), None);
        assert_eq!(Cell::Integer(101).as_text(), Some("101".to_string()));
    }
}
