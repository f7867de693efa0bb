use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::data_model::ResultsDataModel;
use crate::design::Design;
use crate::error::Error;
use crate::table::ResultTable;
use crate::types::{Result, INCIDENCE_SUMMARY_TABLE};

const REF_ID_COLUMN: &str = "REF_ID";

/// Tables the engine produces, in export order
pub const ENGINE_TABLES: [&str; 6] = [
    INCIDENCE_SUMMARY_TABLE,
    "target_def",
    "outcome_def",
    "tar_def",
    "age_group_def",
    "subgroup_def",
];

/// Where and how the engine should run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOptions {
    pub cohort_table: String,
    pub cdm_database_schema: String,
    pub results_database_schema: String,
    pub vocabulary_schema: String,
    pub source_name: String,
    pub use_temp_tables: bool,
    pub ref_id: i64,
}

/// Named engine output tables, in the order the engine returned them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResults {
    pub tables: Vec<(String, ResultTable)>,
}

impl EngineResults {
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ResultTable> {
        self.tables
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }
}

/// External incidence analysis engine
pub trait IncidenceEngine {
    fn execute_analysis(&mut self, design: &Design, options: &BuildOptions) -> Result<EngineResults>;
}

/// Engine adapter reading the tables of a completed engine run from a folder
/// of `<table>.csv` files.
pub struct CsvEngine {
    folder: PathBuf,
    data_model: ResultsDataModel,
}

impl CsvEngine {
    pub fn new(folder: &Path, data_model: ResultsDataModel) -> Self {
        Self {
            folder: folder.to_path_buf(),
            data_model,
        }
    }

    fn read_table(&self, table_name: &str, path: &Path) -> Result<ResultTable> {
        let reader = BufReader::new(File::open(path)?);
        ResultTable::read_csv(reader, |column| {
            self.data_model.column_kind(table_name, column)
        })
    }
}

impl IncidenceEngine for CsvEngine {
    fn execute_analysis(&mut self, design: &Design, options: &BuildOptions) -> Result<EngineResults> {
        info!(
            analyses = design.analysis_list.len(),
            source = %options.source_name,
            ref_id = options.ref_id,
            "Reading incidence results from {}",
            self.folder.display()
        );

        let mut results = EngineResults::default();
        for table_name in ENGINE_TABLES {
            let path = self.folder.join(format!("{}.csv", table_name));
            if !path.exists() {
                if table_name == INCIDENCE_SUMMARY_TABLE {
                    return Err(Error::MissingTable(path.display().to_string()));
                }
                debug!("No {} table in engine output", table_name);
                continue;
            }

            let table = self.read_table(table_name, &path)?;
            check_ref_id(table_name, &table, options.ref_id)?;
            debug!(rows = table.row_count(), "Read {}", table_name);
            results.tables.push((table_name.to_string(), table));
        }

        Ok(results)
    }
}

/// Every `REF_ID` cell must carry the job's ref_id so exported tables join
/// with the target/outcome reference.
fn check_ref_id(table_name: &str, table: &ResultTable, expected: i64) -> Result<()> {
    let Some(column) = table
        .column_names()
        .find(|name| name.eq_ignore_ascii_case(REF_ID_COLUMN))
    else {
        return Ok(());
    };

    match table.integers(column)?.iter().flatten().find(|id| **id != expected) {
        Some(found) => Err(Error::RefIdMismatch {
            table: table_name.to_string(),
            expected,
            found: *found,
        }),
        None => Ok(()),
    }
}
