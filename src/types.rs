use serde::Serialize;

/// Module name reported in metadata and execution reports
pub const MODULE_NAME: &str = "CohortIncidenceModule";

/// Prefix prepended to every exported table name
pub const TABLE_PREFIX: &str = "ci_";

/// Reference id used when the execution settings do not provide one
pub const DEFAULT_REF_ID: i64 = 1;

/// Logical name of the target/outcome lookup table
pub const TARGET_OUTCOME_REF_TABLE: &str = "target_outcome_ref";

/// Engine table that carries the incidence counts
pub const INCIDENCE_SUMMARY_TABLE: &str = "incidence_summary";

/// File name of the exported results data model description
pub const DATA_MODEL_FILE_NAME: &str = "resultsDataModelSpecification.csv";

/// Module metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub table_prefix: &'static str,
}

impl ModuleInfo {
    pub fn current() -> Self {
        Self {
            name: MODULE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            table_prefix: TABLE_PREFIX,
        }
    }
}

/// Result type for the application
pub type Result<T> = std::result::Result<T, crate::error::Error>;
