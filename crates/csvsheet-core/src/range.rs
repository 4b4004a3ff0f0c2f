use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell coordinate in visual grid space (0-indexed)
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        CellCoord { row, col }
    }

    /// First row or first column of the grid
    pub fn is_on_edge(&self) -> (bool, bool) {
        (self.row == 0, self.col == 0)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_label(self.col), self.row + 1)
    }
}

/// Convert column index (0-indexed) to its positional label (A, B, ..., Z, AA, AB, ...)
pub fn col_to_label(col: usize) -> String {
    let mut label = Vec::new();
    let mut n = col + 1;

    while n > 0 {
        n -= 1;
        label.push(b'A' + (n % 26) as u8);
        n /= 26;
    }

    label.iter().rev().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_to_label() {
        assert_eq!(col_to_label(0), "A");
        assert_eq!(col_to_label(25), "Z");
        assert_eq!(col_to_label(26), "AA");
        assert_eq!(col_to_label(27), "AB");
        assert_eq!(col_to_label(701), "ZZ");
        assert_eq!(col_to_label(702), "AAA");
    }

    #[test]
    fn test_coord_display() {
        assert_eq!(CellCoord::new(0, 0).to_string(), "A1");
        assert_eq!(CellCoord::new(9, 27).to_string(), "AB10");
    }

    #[test]
    fn test_coord_edges() {
        assert_eq!(CellCoord::new(0, 3).is_on_edge(), (true, false));
        assert_eq!(CellCoord::new(2, 0).is_on_edge(), (false, true));
    }
}
