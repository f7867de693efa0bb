use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::design::Design;
use crate::error::Error;
use crate::types::{Result, DEFAULT_REF_ID};

static SQL_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Everything one module invocation needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobContext {
    pub settings: ModuleSettings,
    pub module_execution_settings: ExecutionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSettings {
    pub ir_design: Design,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSettings {
    #[serde(default)]
    pub connection_details: Option<ConnectionDetails>,
    #[serde(default)]
    pub cdm_database_schema: Option<String>,
    #[serde(default)]
    pub work_database_schema: Option<String>,
    #[serde(default)]
    pub vocabulary_database_schema: Option<String>,
    #[serde(default)]
    pub cohort_table_names: Option<CohortTableNames>,
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub work_sub_folder: Option<PathBuf>,
    #[serde(default)]
    pub results_sub_folder: Option<PathBuf>,
    /// Zero or absent disables suppression
    #[serde(default)]
    pub min_cell_count: u64,
    #[serde(default)]
    pub ref_id: Option<i64>,
    #[serde(default)]
    pub results_connection_details: Option<ConnectionDetails>,
    #[serde(default)]
    pub results_database_schema: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub dbms: String,
    /// For sqlite, the database file path
    pub server: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortTableNames {
    pub cohort_table: String,
}

impl JobContext {
    /// Read a job context from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn ref_id(&self) -> i64 {
        self.module_execution_settings.ref_id.unwrap_or(DEFAULT_REF_ID)
    }

    /// Check the settings `execute` depends on, reporting every problem at once
    pub fn validate_for_execution(&self) -> Result<()> {
        let s = &self.module_execution_settings;
        let mut problems = Vec::new();

        if s.connection_details.is_none() {
            problems.push("connectionDetails is required".to_string());
        }
        require_text(&mut problems, "cdmDatabaseSchema", &s.cdm_database_schema);
        require_text(&mut problems, "workDatabaseSchema", &s.work_database_schema);
        require_text(&mut problems, "databaseId", &s.database_id);
        match &s.cohort_table_names {
            Some(names) if !names.cohort_table.trim().is_empty() => {}
            _ => problems.push("cohortTableNames.cohortTable is required".to_string()),
        }
        match &s.results_sub_folder {
            Some(folder) if !folder.as_os_str().is_empty() => {}
            _ => problems.push("resultsSubFolder is required".to_string()),
        }

        finish(problems)
    }

    /// Check the settings `create_data_model_schema` depends on. The results
    /// connection is only needed when the SQL is run against a database; see
    /// `results_connection`.
    pub fn validate_for_schema_creation(&self) -> Result<()> {
        let s = &self.module_execution_settings;
        let mut problems = Vec::new();

        match &s.results_database_schema {
            Some(schema) if SQL_IDENTIFIER.is_match(schema) => {}
            Some(schema) => problems.push(format!(
                "resultsDatabaseSchema '{}' is not a plain SQL identifier",
                schema
            )),
            None => problems.push("resultsDatabaseSchema is required".to_string()),
        }

        finish(problems)
    }

    /// Connection for the results database
    pub fn results_connection(&self) -> Result<&ConnectionDetails> {
        self.module_execution_settings
            .results_connection_details
            .as_ref()
            .ok_or_else(|| {
                Error::InvalidJobContext(vec!["resultsConnectionDetails is required".to_string()])
            })
    }
}

fn require_text(problems: &mut Vec<String>, key: &str, value: &Option<String>) {
    match value {
        Some(v) if !v.trim().is_empty() => {}
        _ => problems.push(format!("{} is required", key)),
    }
}

fn finish(problems: Vec<String>) -> Result<()> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidJobContext(problems))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub(crate) const JOB_JSON: &str = r#"{
        "settings": {
            "irDesign": {
                "outcomeDefs": [{"id": 10, "cohortId": 100}],
                "analysisList": [{"targets": [1, 2], "outcomes": [10], "tars": [1]}]
            }
        },
        "moduleExecutionSettings": {
            "connectionDetails": {"dbms": "sqlite", "server": "cdm.sqlite"},
            "cdmDatabaseSchema": "main",
            "workDatabaseSchema": "main",
            "cohortTableNames": {"cohortTable": "cohort"},
            "databaseId": "synpuf",
            "resultsSubFolder": "results",
            "minCellCount": 5,
            "resultsConnectionDetails": {"dbms": "sqlite", "server": "results.sqlite"},
            "resultsDatabaseSchema": "main"
        }
    }"#;

    pub(crate) fn sample_job() -> JobContext {
        serde_json::from_str(JOB_JSON).unwrap()
    }

    #[test]
    fn test_load_job_context() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", JOB_JSON).unwrap();

        let job = JobContext::load(file.path()).unwrap();
        assert_eq!(job.module_execution_settings.min_cell_count, 5);
        assert_eq!(job.module_execution_settings.database_id.as_deref(), Some("synpuf"));
        assert_eq!(job.settings.ir_design.analysis_list.len(), 1);
    }

    #[test]
    fn test_ref_id_default() {
        let mut job = sample_job();
        assert_eq!(job.ref_id(), DEFAULT_REF_ID);

        job.module_execution_settings.ref_id = Some(7);
        assert_eq!(job.ref_id(), 7);
    }

    #[test]
    fn test_min_cell_count_absent_is_zero() {
        let json = r#"{"settings": {"irDesign": {}}, "moduleExecutionSettings": {}}"#;
        let job: JobContext = serde_json::from_str(json).unwrap();
        assert_eq!(job.module_execution_settings.min_cell_count, 0);
    }

    #[test]
    fn test_validate_for_execution_ok() {
        assert!(sample_job().validate_for_execution().is_ok());
    }

    #[test]
    fn test_validate_for_execution_collects_problems() {
        let mut job = sample_job();
        job.module_execution_settings.results_sub_folder = None;
        job.module_execution_settings.database_id = Some("  ".to_string());

        match job.validate_for_execution() {
            Err(Error::InvalidJobContext(problems)) => {
                assert_eq!(problems.len(), 2);
                assert!(problems.iter().any(|p| p.contains("resultsSubFolder")));
                assert!(problems.iter().any(|p| p.contains("databaseId")));
            }
            other => panic!("expected invalid job context, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_for_schema_creation() {
        let mut job = sample_job();
        assert!(job.validate_for_schema_creation().is_ok());

        job.module_execution_settings.results_database_schema =
            Some("main; DROP TABLE x".to_string());
        assert!(matches!(
            job.validate_for_schema_creation(),
            Err(Error::InvalidJobContext(_))
        ));
    }

    #[test]
    fn test_schema_creation_without_results_connection() {
        let mut job = sample_job();
        job.module_execution_settings.results_connection_details = None;

        assert!(job.validate_for_schema_creation().is_ok());
        assert!(matches!(
            job.results_connection(),
            Err(Error::InvalidJobContext(_))
        ));
    }
}
