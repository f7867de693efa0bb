//! Results data model: the tables and columns this module exports, as shipped
//! alongside the result files and used to materialize the results schema.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::table::ColumnKind;
use crate::types::Result;

const EMBEDDED_SPECIFICATION: &str = include_str!("../resources/resultsDataModelSpecification.csv");

/// Placeholder replaced with the target schema by `render_sql`
pub const SCHEMA_PLACEHOLDER: &str = "@database_schema";

/// One column of one results table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_required: String,
    pub primary_key: String,
    pub min_cell_count: String,
    pub description: String,
}

impl FieldSpec {
    pub fn required(&self) -> bool {
        is_yes(&self.is_required)
    }

    pub fn in_primary_key(&self) -> bool {
        is_yes(&self.primary_key)
    }

    /// Value kind used when reading engine output for this column
    pub fn kind(&self) -> ColumnKind {
        let base = self
            .data_type
            .split('(')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        match base.as_str() {
            "int" | "integer" | "bigint" | "smallint" => ColumnKind::Integer,
            "float" | "numeric" | "real" | "double" | "decimal" => ColumnKind::Float,
            _ => ColumnKind::Text,
        }
    }
}

fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsDataModel {
    fields: Vec<FieldSpec>,
}

impl ResultsDataModel {
    /// The specification compiled into the binary
    pub fn load_embedded() -> Result<Self> {
        Self::from_reader(EMBEDDED_SPECIFICATION.as_bytes())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let fields = csv_reader
            .deserialize()
            .collect::<std::result::Result<Vec<FieldSpec>, _>>()?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Copy of the model with `prefix` prepended to every table name
    pub fn with_table_prefix(&self, prefix: &str) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|f| FieldSpec {
                table_name: format!("{}{}", prefix, f.table_name),
                ..f.clone()
            })
            .collect();
        Self { fields }
    }

    /// Distinct table names, in specification order
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for field in &self.fields {
            if !names.contains(&field.table_name.as_str()) {
                names.push(&field.table_name);
            }
        }
        names
    }

    /// Declared kind of a column; column names match case-insensitively
    pub fn column_kind(&self, table: &str, column: &str) -> Option<ColumnKind> {
        self.fields
            .iter()
            .find(|f| f.table_name == table && f.column_name.eq_ignore_ascii_case(column))
            .map(FieldSpec::kind)
    }

    /// DDL for every table, qualified with the schema placeholder
    pub fn generate_sql_schema(&self) -> String {
        let mut sql = String::new();

        for table in self.table_names() {
            let fields: Vec<&FieldSpec> =
                self.fields.iter().filter(|f| f.table_name == table).collect();

            let mut lines: Vec<String> = fields
                .iter()
                .map(|f| {
                    let mut line = format!("    {} {}", f.column_name, f.data_type.to_uppercase());
                    if f.required() {
                        line.push_str(" NOT NULL");
                    }
                    line
                })
                .collect();

            let key: Vec<&str> = fields
                .iter()
                .filter(|f| f.in_primary_key())
                .map(|f| f.column_name.as_str())
                .collect();
            if !key.is_empty() {
                lines.push(format!("    PRIMARY KEY({})", key.join(", ")));
            }

            sql.push_str(&format!(
                "CREATE TABLE {}.{} (\n{}\n);\n",
                SCHEMA_PLACEHOLDER,
                table,
                lines.join(",\n")
            ));
        }

        sql
    }

    /// Write the specification as CSV
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for field in &self.fields {
            writer.serialize(field)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Substitute the target schema into generated SQL
pub fn render_sql(sql: &str, database_schema: &str) -> String {
    sql.replace(SCHEMA_PLACEHOLDER, database_schema)
}
