use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::types::Result;

/// Write a report as pretty JSON to a file
pub fn write_json_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write a report to stdout
pub fn write_json_stdout<T: Serialize>(value: &T) -> Result<()> {
    let json = to_json_string(value)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModuleInfo;
    use tempfile::NamedTempFile;

    #[test]
    fn test_json_serialization() {
        let json = to_json_string(&ModuleInfo::current()).unwrap();
        assert!(json.contains("\"name\": \"CohortIncidenceModule\""));
        assert!(json.contains("\"table_prefix\": \"ci_\""));
    }

    #[test]
    fn test_write_json_file() {
        let file = NamedTempFile::with_suffix(".json").unwrap();
        write_json_file(&ModuleInfo::current(), file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["table_prefix"], "ci_");
    }
}
