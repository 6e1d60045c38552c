//! A1-style addressing and formula reference rewriting
//!
//! Rows are 1-based (as displayed by spreadsheet applications), columns are
//! 0-based indices (`A` = 0), matching [`crate::sheet::Sheet`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::sheet::{ColNum, RowNum};

/// Largest column index addressable in XLSX (`XFD`)
pub const MAX_COL: ColNum = 16_383;

/// Convert a column index to letters (0 → A, 25 → Z, 26 → AA)
pub fn column_letter(col: ColNum) -> String {
    let mut n = u32::from(col);
    let mut s = String::new();
    loop {
        s.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    s
}

/// Convert column letters back to an index (case-insensitive)
pub fn column_index(letters: &str) -> Option<ColNum> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    let col = n - 1;
    (col <= u32::from(MAX_COL)).then_some(col as ColNum)
}

/// Relative address such as `F15`
pub fn cell_address(row: RowNum, col: ColNum) -> String {
    format!("{}{}", column_letter(col), row)
}

/// A single cell position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellAddress {
    pub row: RowNum,
    pub col: ColNum,
}

impl CellAddress {
    pub const fn new(row: RowNum, col: ColNum) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cell_address(self.row, self.col))
    }
}

impl FromStr for CellAddress {
    type Err = AddressError;

    /// Parses `A3`, `$A$3` or `a3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().replace('$', "");
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| AddressError(s.to_string()))?;
        let (letters, digits) = trimmed.split_at(split);
        let col = column_index(letters).ok_or_else(|| AddressError(s.to_string()))?;
        let row = digits
            .parse::<RowNum>()
            .ok()
            .filter(|r| *r >= 1)
            .ok_or_else(|| AddressError(s.to_string()))?;
        Ok(Self { row, col })
    }
}

impl TryFrom<String> for CellAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellAddress> for String {
    fn from(address: CellAddress) -> Self {
        address.to_string()
    }
}

/// Text that is not a valid A1 cell address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cell address '{0}'")]
pub struct AddressError(pub String);

/// Serde adapter writing a column index as its letters
pub(crate) mod column_letters {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::{column_index, column_letter};
    use crate::sheet::ColNum;

    pub fn serialize<S: Serializer>(col: &ColNum, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&column_letter(*col))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ColNum, D::Error> {
        let letters = String::deserialize(deserializer)?;
        column_index(letters.trim())
            .ok_or_else(|| D::Error::custom(format!("invalid column '{letters}'")))
    }
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\$?)([A-Za-z]{1,3})(\$?)([0-9]{1,7})").expect("hardcoded regex should be valid")
    })
}

/// Re-point every row reference at or below `at` by `count` rows.
///
/// Used after `count` rows were inserted before row `at`. References above
/// `at` are left alone, so a range straddling the insertion grows. Absolute
/// markers (`$`) are kept; text inside string literals is never touched;
/// function names such as `LOG10(` are not mistaken for references.
pub fn shift_row_references(formula: &str, at: RowNum, count: u32) -> String {
    if count == 0 {
        return formula.to_string();
    }

    let mut out = String::with_capacity(formula.len() + 4);
    // Excel escapes quotes inside literals as "", which toggles twice.
    for (i, segment) in formula.split('"').enumerate() {
        if i > 0 {
            out.push('"');
        }
        if i % 2 == 1 {
            out.push_str(segment);
        } else {
            out.push_str(&shift_segment(segment, at, count));
        }
    }
    out
}

fn shift_segment(segment: &str, at: RowNum, count: u32) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut last = 0;

    for caps in reference_pattern().captures_iter(segment) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let before = segment[..whole.start()].chars().next_back();
        let after = segment[whole.end()..].chars().next();

        let is_reference = !before.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
            && !after.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '(' || c == '.');
        if !is_reference || column_index(&caps[2]).is_none() {
            continue;
        }
        let Ok(row) = caps[4].parse::<RowNum>() else {
            continue;
        };
        if row < at {
            continue;
        }

        out.push_str(&segment[last..whole.start()]);
        out.push_str(&caps[1]);
        out.push_str(&caps[2]);
        out.push_str(&caps[3]);
        out.push_str(&(row + count).to_string());
        last = whole.end();
    }

    out.push_str(&segment[last..]);
    out
}
