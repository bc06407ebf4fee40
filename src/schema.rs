use std::fmt;
use std::path::Path;

use crate::errors::StartupError;

/// Text description of the graph vocabulary (labels, relationship types,
/// properties) shown to both the query generator and the answer generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    text: String,
}

impl Schema {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
        }
    }

    /// Read the schema file once at startup; a missing or empty file is fatal
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StartupError::SchemaNotFound(path.to_path_buf()),
            _ => StartupError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let schema = Self::new(content);
        if schema.text.is_empty() {
            return Err(StartupError::EmptySchema(path.to_path_buf()));
        }

        tracing::info!(
            "Loaded graph schema from {} ({} lines)",
            path.display(),
            schema.text.lines().count()
        );
        Ok(schema)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_trims_schema() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\n  Node properties:\nPlayer {{name: STRING}}\n\n").unwrap();

        let schema = Schema::load(file.path()).unwrap();
        assert_eq!(schema.as_str(), "Node properties:\nPlayer {name: STRING}");
    }

    #[test]
    fn test_missing_schema_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = Schema::load(dir.path().join("schema.txt"));
        assert!(matches!(result, Err(StartupError::SchemaNotFound(_))));
    }

    #[test]
    fn test_blank_schema_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "   \n\t").unwrap();

        let result = Schema::load(file.path());
        assert!(matches!(result, Err(StartupError::EmptySchema(_))));
    }
}
