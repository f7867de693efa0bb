//! Module entrypoints. Collaborators (engine, SQL executor, data model) are
//! passed in by the caller.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::data_model::{render_sql, ResultsDataModel};
use crate::database::SqlExecutor;
use crate::engine::{BuildOptions, IncidenceEngine};
use crate::error::Error;
use crate::export::{add_database_id, ExportedFile, Exporter};
use crate::job::JobContext;
use crate::privacy::{enforce_min_cell_count, SuppressionStats};
use crate::reference::{build_reference, reference_table};
use crate::types::{
    ModuleInfo, Result, INCIDENCE_SUMMARY_TABLE, TABLE_PREFIX, TARGET_OUTCOME_REF_TABLE,
};

/// Summary of one `execute` run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub module: ModuleInfo,
    pub database_id: String,
    pub ref_id: i64,
    pub min_cell_count: u64,
    pub executed_at: String,
    pub suppression: Vec<SuppressionStats>,
    pub target_outcome_pairs: usize,
    pub files: Vec<ExportedFile>,
}

/// Run the incidence analysis for a job and export its results.
///
/// Nothing is written until the engine results are suppressed and the
/// target/outcome reference has been built.
pub fn execute(
    job: &JobContext,
    engine: &mut dyn IncidenceEngine,
    data_model: &ResultsDataModel,
) -> Result<ExecutionReport> {
    info!("Validating inputs");
    job.validate_for_execution()?;

    let settings = &job.module_execution_settings;
    let database_id = required(&settings.database_id, "databaseId")?;
    let results_folder = required(&settings.results_sub_folder, "resultsSubFolder")?;
    let cdm_schema = required(&settings.cdm_database_schema, "cdmDatabaseSchema")?;
    let work_schema = required(&settings.work_database_schema, "workDatabaseSchema")?;
    let cohort_table = &required(&settings.cohort_table_names, "cohortTableNames")?.cohort_table;
    let ref_id = job.ref_id();
    let design = &job.settings.ir_design;

    let options = BuildOptions {
        cohort_table: format!("{}.{}", work_schema, cohort_table),
        cdm_database_schema: cdm_schema.clone(),
        results_database_schema: work_schema.clone(),
        vocabulary_schema: settings
            .vocabulary_database_schema
            .clone()
            .unwrap_or_else(|| cdm_schema.clone()),
        source_name: settings
            .source_name
            .clone()
            .unwrap_or_else(|| database_id.clone()),
        use_temp_tables: true,
        ref_id,
    };

    let mut results = engine.execute_analysis(design, &options)?;

    let summary = results
        .get_mut(INCIDENCE_SUMMARY_TABLE)
        .ok_or_else(|| Error::MissingTable(INCIDENCE_SUMMARY_TABLE.to_string()))?;
    let suppression = enforce_min_cell_count(summary, settings.min_cell_count)?;
    add_database_id(summary, database_id)?;

    let pairs = build_reference(design, ref_id)?;
    let reference = reference_table(&pairs)?;

    info!("Export data");
    let exporter = Exporter::new(results_folder, TABLE_PREFIX)?;
    let mut files = Vec::new();
    for (table_name, table) in &results.tables {
        files.push(exporter.write_table(table_name, table)?);
    }
    files.push(exporter.write_table(TARGET_OUTCOME_REF_TABLE, &reference)?);
    files.push(exporter.write_data_model(&data_model.with_table_prefix(TABLE_PREFIX))?);

    info!(files = files.len(), "Results written to {}", results_folder.display());

    Ok(ExecutionReport {
        module: ModuleInfo::current(),
        database_id: database_id.clone(),
        ref_id,
        min_cell_count: settings.min_cell_count,
        executed_at: Utc::now().to_rfc3339(),
        suppression,
        target_outcome_pairs: pairs.len(),
        files,
    })
}

/// Create the module's results tables; returns the SQL that was issued
pub fn create_data_model_schema(
    job: &JobContext,
    data_model: &ResultsDataModel,
    executor: &mut dyn SqlExecutor,
) -> Result<String> {
    job.validate_for_schema_creation()?;
    let schema = required(
        &job.module_execution_settings.results_database_schema,
        "resultsDatabaseSchema",
    )?;

    let sql = data_model.with_table_prefix(TABLE_PREFIX).generate_sql_schema();
    let sql = render_sql(&sql, schema);

    info!("Creating results tables in schema {}", schema);
    executor.execute_sql(&sql)?;
    Ok(sql)
}

fn required<'a, T>(value: &'a Option<T>, key: &str) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| Error::InvalidJobContext(vec![format!("{} is required", key)]))
}
