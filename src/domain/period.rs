//! Calendar quarters and the `(year, quarter)` period key.
//!
//! Period labels in the source datasets are strings like `"Q1"`. Comparing those
//! strings alongside the year only works while the label format stays fixed, so
//! labels are parsed into `Quarter` at ingest time and every comparison goes
//! through the derived `Ord` on `Period` (year first, then quarter ordinal).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar quarter. Declaration order is the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// 1-based quarter index.
    pub fn ordinal(self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    pub fn from_ordinal(n: u32) -> Option<Self> {
        match n {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }

    /// Quarter containing a 1-based calendar month.
    pub fn from_month(month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        Self::from_ordinal((month - 1) / 3 + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quarter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix('Q')
            .or_else(|| s.strip_prefix('q'))
            .ok_or_else(|| format!("Invalid quarter label '{s}'. Expected Q1, Q2, Q3 or Q4."))?;
        digits
            .parse::<u32>()
            .ok()
            .filter(|_| digits.len() == 1)
            .and_then(Quarter::from_ordinal)
            .ok_or_else(|| format!("Invalid quarter label '{s}'. Expected Q1, Q2, Q3 or Q4."))
    }
}

/// A `(year, quarter)` observation period.
///
/// Serialized as its display form (`"2020-Q1"`) so it stays a flat column in CSV
/// exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    pub year: i32,
    pub quarter: Quarter,
}

impl Period {
    pub fn new(year: i32, quarter: Quarter) -> Self {
        Self { year, quarter }
    }

    /// The quarter containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        // month() is always 1..=12, so from_month cannot fail here.
        let quarter = Quarter::from_month(date.month()).unwrap_or(Quarter::Q1);
        Self::new(date.year(), quarter)
    }

    /// First calendar day of the quarter.
    pub fn start_date(self) -> Option<NaiveDate> {
        let month = (self.quarter.ordinal() - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = String;

    /// Accepts `2020-Q1`, `2020Q1` and `2020 Q1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c == 'Q' || c == 'q')
            .ok_or_else(|| format!("Invalid period '{s}'. Expected YYYY-Qn (e.g. 2020-Q1)."))?;
        let (year_part, quarter_part) = s.split_at(split);
        let year_part = year_part.trim_end_matches(['-', ' ']);
        let year = year_part
            .parse::<i32>()
            .map_err(|_| format!("Invalid period '{s}'. Expected YYYY-Qn (e.g. 2020-Q1)."))?;
        let quarter = quarter_part.parse::<Quarter>()?;
        Ok(Self::new(year, quarter))
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_labels_parse_case_insensitively() {
        assert_eq!("Q3".parse::<Quarter>().unwrap(), Quarter::Q3);
        assert_eq!(" q1 ".parse::<Quarter>().unwrap(), Quarter::Q1);
        assert!("Q5".parse::<Quarter>().is_err());
        assert!("Q01".parse::<Quarter>().is_err());
        assert!("3".parse::<Quarter>().is_err());
    }

    #[test]
    fn period_order_crosses_year_boundaries() {
        let q4_2020 = Period::new(2020, Quarter::Q4);
        let q1_2021 = Period::new(2021, Quarter::Q1);
        assert!(q4_2020 < q1_2021);
        assert!(Period::new(2019, Quarter::Q4) < Period::new(2020, Quarter::Q1));
        assert!(Period::new(2024, Quarter::Q2) < Period::new(2024, Quarter::Q3));
    }

    #[test]
    fn period_parses_common_spellings() {
        let expected = Period::new(2020, Quarter::Q1);
        assert_eq!("2020-Q1".parse::<Period>().unwrap(), expected);
        assert_eq!("2020Q1".parse::<Period>().unwrap(), expected);
        assert_eq!("2020 q1".parse::<Period>().unwrap(), expected);
        assert!("Q1".parse::<Period>().is_err());
        assert!("2020-05".parse::<Period>().is_err());
        assert_eq!(expected.to_string(), "2020-Q1");
    }

    #[test]
    fn period_maps_dates_both_ways() {
        let d = NaiveDate::from_ymd_opt(2021, 8, 17).unwrap();
        let p = Period::from_date(d);
        assert_eq!(p, Period::new(2021, Quarter::Q3));
        assert_eq!(p.start_date(), NaiveDate::from_ymd_opt(2021, 7, 1));
    }

    #[test]
    fn period_serializes_as_label() {
        let p = Period::new(2024, Quarter::Q3);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"2024-Q3\"");
        let back: Period = serde_json::from_str("\"2024-Q3\"").unwrap();
        assert_eq!(back, p);
    }
}
