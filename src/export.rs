use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::data_model::ResultsDataModel;
use crate::table::{ColumnData, ResultTable};
use crate::types::{Result, DATA_MODEL_FILE_NAME};

pub const DATABASE_ID_COLUMN: &str = "DATABASE_ID";

/// A file written to the results folder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedFile {
    pub name: String,
    pub rows: usize,
    pub sha256: String,
}

/// Writes result tables as `<prefix><table>.csv` into one folder
pub struct Exporter {
    folder: PathBuf,
    table_prefix: String,
}

impl Exporter {
    /// Create the exporter, creating the results folder if needed
    pub fn new(folder: &Path, table_prefix: &str) -> Result<Self> {
        std::fs::create_dir_all(folder)?;
        Ok(Self {
            folder: folder.to_path_buf(),
            table_prefix: table_prefix.to_string(),
        })
    }

    pub fn file_name(&self, table_name: &str) -> String {
        format!("{}{}.csv", self.table_prefix, table_name)
    }

    /// Write a table; headers are lowercased and missing cells left empty
    pub fn write_table(&self, table_name: &str, table: &ResultTable) -> Result<ExportedFile> {
        let name = self.file_name(table_name);
        let path = self.folder.join(&name);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(table.column_names().map(str::to_lowercase))?;
        for row in 0..table.row_count() {
            writer.write_record(table.columns().iter().map(|c| c.data.format_cell(row)))?;
        }
        writer.flush()?;

        debug!(rows = table.row_count(), "Wrote {}", path.display());
        self.exported(name, table.row_count())
    }

    /// Write the results data model description next to the tables
    pub fn write_data_model(&self, model: &ResultsDataModel) -> Result<ExportedFile> {
        let path = self.folder.join(DATA_MODEL_FILE_NAME);
        model.write_csv(&path)?;
        self.exported(DATA_MODEL_FILE_NAME.to_string(), model.fields().len())
    }

    fn exported(&self, name: String, rows: usize) -> Result<ExportedFile> {
        let sha256 = compute_file_hash(&self.folder.join(&name))?;
        Ok(ExportedFile { name, rows, sha256 })
    }
}

/// Attach the database id to every row, replacing any existing column
pub fn add_database_id(table: &mut ResultTable, database_id: &str) -> Result<()> {
    let existing: Vec<String> = table
        .column_names()
        .filter(|c| c.eq_ignore_ascii_case(DATABASE_ID_COLUMN))
        .map(str::to_string)
        .collect();
    for column in existing {
        table.remove_column(&column);
    }

    let rows = table.row_count();
    table.push_column(
        DATABASE_ID_COLUMN,
        ColumnData::Text(vec![Some(database_id.to_string()); rows]),
    )
}

/// Compute SHA-256 hash of a file (streaming to handle large files)
fn compute_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
