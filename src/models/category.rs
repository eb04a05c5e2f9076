use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal bin assigned to a continuous measurement for association testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::VeryLow,
        Category::Low,
        Category::Moderate,
        Category::High,
        Category::VeryHigh,
    ];

    /// Place `value` in one of five right-closed bins split at `breakpoints`:
    /// `(-inf, b0]`, `(b0, b1]`, `(b1, b2]`, `(b2, b3]`, `(b3, +inf)`.
    pub fn from_breakpoints(value: f64, breakpoints: &[f64; 4]) -> Self {
        let index = breakpoints.iter().take_while(|&&b| value > b).count();
        Self::ALL[index]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::VeryLow => "very low",
            Category::Low => "low",
            Category::Moderate => "moderate",
            Category::High => "high",
            Category::VeryHigh => "very high",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BREAKS: [f64; 4] = [1.0, 2.0, 3.0, 4.0];

    #[test]
    fn test_bins_are_right_closed() {
        assert_eq!(Category::from_breakpoints(1.0, &BREAKS), Category::VeryLow);
        assert_eq!(Category::from_breakpoints(1.0001, &BREAKS), Category::Low);
        assert_eq!(Category::from_breakpoints(3.0, &BREAKS), Category::Moderate);
        assert_eq!(Category::from_breakpoints(4.0, &BREAKS), Category::High);
    }

    #[test]
    fn test_bins_are_open_ended() {
        assert_eq!(Category::from_breakpoints(-1e9, &BREAKS), Category::VeryLow);
        assert_eq!(Category::from_breakpoints(1e9, &BREAKS), Category::VeryHigh);
    }

    #[test]
    fn test_ordering_follows_magnitude() {
        assert!(Category::VeryLow < Category::Low);
        assert!(Category::High < Category::VeryHigh);
        assert_eq!(Category::Moderate.index(), 2);
    }
}
