//! A1-style cell references

use std::fmt;
use std::str::FromStr;

use crate::error::WorkbookError;

/// Largest column index a worksheet may address (XFD)
const MAX_COLUMN: u32 = 16_384;
const MAX_ROW: u32 = 1_048_576;

/// A cell position, both coordinates 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub column: u32,
}

impl CellRef {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// Convert column number to letters (1 -> "A", 26 -> "Z", 27 -> "AA")
pub fn column_to_letters(column: u32) -> String {
    let mut letters = String::new();
    let mut column = column;

    while column > 0 {
        column -= 1;
        let letter = ((column % 26) as u8 + b'A') as char;
        letters.insert(0, letter);
        column /= 26;
    }

    letters
}

/// Convert column letters to a number, `None` for anything but ASCII letters
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, ch| {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

impl FromStr for CellRef {
    type Err = WorkbookError;

    /// Parse "C12"; absolute markers ("$C$12") are accepted
    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let invalid = || WorkbookError::CellReference(reference.to_string());
        let cleaned: String = reference.chars().filter(|&ch| ch != '$').collect();
        let split = cleaned
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = cleaned.split_at(split);

        let column = letters_to_column(letters).ok_or_else(invalid)?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 || row > MAX_ROW || column > MAX_COLUMN {
            return Err(invalid());
        }

        Ok(CellRef { row, column })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.column), self.row)
    }
}
