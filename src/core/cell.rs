//! 1-based spreadsheet coordinates and A1 rendering

use std::fmt;

/// An absolute cell position, 1-based like the spreadsheet it is written into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// `C7`
    pub fn a1(&self) -> String {
        format!("{}{}", column_letter(self.col), self.row)
    }

    /// `C$7`: column follows the formula, row stays put
    pub fn row_absolute(&self) -> String {
        format!("{}${}", column_letter(self.col), self.row)
    }

    /// `$C$7`
    pub fn absolute(&self) -> String {
        format!("${}${}", column_letter(self.col), self.row)
    }

    /// Zero-based `(row, col)` as the workbook library addresses cells
    pub fn zero_based(&self) -> (u32, u16) {
        (self.row.saturating_sub(1), self.col.saturating_sub(1))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.a1())
    }
}

/// Convert a 1-based column number to its letter
///
/// Examples:
/// - 1 → A
/// - 26 → Z
/// - 27 → AA
pub fn column_letter(col: u16) -> String {
    let mut result = String::new();
    let mut idx = usize::from(col.max(1)) - 1;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(2), "B");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(28), "AB");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn test_cell_ref_forms() {
        let cell = CellRef::new(7, 3);
        assert_eq!(cell.a1(), "C7");
        assert_eq!(cell.row_absolute(), "C$7");
        assert_eq!(cell.absolute(), "$C$7");
        assert_eq!(cell.zero_based(), (6, 2));
    }
}
