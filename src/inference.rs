use crate::table::ColumnKind;

/// Missing value tokens
pub const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NULL", "NaN", "None", "."];

/// Column kind inference for columns the results data model does not declare
#[derive(Debug, Clone)]
pub struct KindInferencer {
    values_seen: u64,
    all_integer: bool,
    all_numeric: bool,
}

impl KindInferencer {
    pub fn new() -> Self {
        Self {
            values_seen: 0,
            all_integer: true,
            all_numeric: true,
        }
    }

    /// Add a raw cell for inference
    pub fn observe(&mut self, value: &str) {
        // Skip missing values
        if is_missing(value) {
            return;
        }

        self.values_seen += 1;

        if self.all_integer && parse_integer(value).is_none() {
            self.all_integer = false;
        }
        if self.all_numeric && parse_numeric(value).is_none() {
            self.all_numeric = false;
        }
    }

    /// Get the inferred kind; an all-missing column stays text
    pub fn inferred_kind(&self) -> ColumnKind {
        if self.values_seen == 0 {
            ColumnKind::Text
        } else if self.all_integer {
            ColumnKind::Integer
        } else if self.all_numeric {
            ColumnKind::Float
        } else {
            ColumnKind::Text
        }
    }
}

impl Default for KindInferencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a value represents a missing value
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Parse an integer, accepting integral floats such as `12.0`
pub fn parse_integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }

    let f = trimmed.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}
