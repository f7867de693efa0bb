use serde::Serialize;
use tracing::info;

use crate::error::Error;
use crate::table::ResultTable;
use crate::types::Result;

pub const PERSONS_AT_RISK_PE: &str = "PERSONS_AT_RISK_PE";
pub const PERSONS_AT_RISK: &str = "PERSONS_AT_RISK";
pub const PERSON_OUTCOMES_PE: &str = "PERSON_OUTCOMES_PE";
pub const PERSON_OUTCOMES: &str = "PERSON_OUTCOMES";
pub const OUTCOMES_PE: &str = "OUTCOMES_PE";
pub const OUTCOMES: &str = "OUTCOMES";
pub const INCIDENCE_RATE_P100PY: &str = "INCIDENCE_RATE_P100PY";
pub const INCIDENCE_PROPORTION_P100P: &str = "INCIDENCE_PROPORTION_P100P";

/// Count fields subject to minimum-cell-count suppression, in application order
pub const COUNT_FIELDS: [&str; 6] = [
    PERSONS_AT_RISK_PE,
    PERSONS_AT_RISK,
    PERSON_OUTCOMES_PE,
    PERSON_OUTCOMES,
    OUTCOMES_PE,
    OUTCOMES,
];

/// Derived statistics and the count each one is computed from
const DERIVED_STATS: [(&str, &str); 2] = [
    (OUTCOMES, INCIDENCE_RATE_P100PY),
    (PERSON_OUTCOMES, INCIDENCE_PROPORTION_P100P),
];

/// Outcome of suppressing one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuppressionStats {
    pub field: String,
    pub suppressed: usize,
    pub rows: usize,
    pub percent: f64,
}

/// Replace every non-zero value below `min_value` with `-min_value`.
///
/// Missing cells, zeros and values at or above the threshold are kept.
pub fn suppress_field(
    table: &mut ResultTable,
    field_name: &str,
    min_value: u64,
) -> Result<SuppressionStats> {
    let threshold = i64::try_from(min_value).map_err(|_| Error::InvalidThreshold(min_value))?;
    let rows = table.row_count();
    let values = table.integers_mut(field_name)?;

    let mut suppressed = 0;
    for value in values.iter_mut() {
        if let Some(v) = value {
            if *v < threshold && *v != 0 {
                *v = -threshold;
                suppressed += 1;
            }
        }
    }

    let percent = percent_of(suppressed, rows);
    info!(
        "censoring {} values ({}%) from {} because value below minimum",
        suppressed, percent, field_name
    );

    Ok(SuppressionStats {
        field: field_name.to_string(),
        suppressed,
        rows,
        percent,
    })
}

/// Null out rates and proportions whose numerator was suppressed.
///
/// Reads the sign of the count columns, so it must run after `suppress_field`
/// has been applied to them.
pub fn suppress_derived_stats(table: &mut ResultTable) -> Result<()> {
    for (count_field, stat_field) in DERIVED_STATS {
        let suppressed_rows: Vec<bool> = table
            .integers(count_field)?
            .iter()
            .map(|v| matches!(v, Some(n) if *n < 0))
            .collect();

        let stats = table.floats_mut(stat_field)?;
        for (stat, suppressed) in stats.iter_mut().zip(suppressed_rows) {
            if suppressed {
                *stat = None;
            }
        }
    }

    Ok(())
}

/// Apply the minimum-cell-count policy to an incidence summary table.
///
/// A threshold of zero disables suppression and leaves the table untouched.
pub fn enforce_min_cell_count(
    table: &mut ResultTable,
    min_cell_count: u64,
) -> Result<Vec<SuppressionStats>> {
    if min_cell_count == 0 {
        return Ok(Vec::new());
    }

    let stats = COUNT_FIELDS
        .iter()
        .map(|field| suppress_field(table, field, min_cell_count))
        .collect::<Result<Vec<_>>>()?;

    suppress_derived_stats(table)?;

    Ok(stats)
}

/// Percentage rounded to one decimal; zero rows yields zero
fn percent_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (1000.0 * count as f64 / total as f64).round() / 10.0
}
