//! Code generation
//!
//! This module turns introspected tables into Go struct definitions, one
//! source file per table.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::config::DbKind;
use crate::introspect::{SchemaReader, TableFilter};
use crate::prelude::{NameFormat, Table, TablegenError};

pub mod go;

pub use go::GoGenerator;

/// Masterminds/structable annotation mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnnotationMode {
    /// Only `db:"..."` tags
    #[default]
    Off,
    /// `db:"..."` tag followed by a `stbl:"..."` tag
    Combined,
    /// Only `stbl:"..."` tags
    Only,
}

impl AnnotationMode {
    /// Resolve from the two command line switches. `only` wins.
    pub fn from_flags(annotate: bool, annotate_only: bool) -> Self {
        match (annotate, annotate_only) {
            (_, true) => AnnotationMode::Only,
            (true, false) => AnnotationMode::Combined,
            (false, false) => AnnotationMode::Off,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != AnnotationMode::Off
    }
}

/// Configuration for code generation
#[derive(Debug, Clone)]
pub struct CodeGenConfig {
    /// Directory the generated files are written to
    pub output_dir: PathBuf,
    /// Go package clause of every generated file
    pub package: String,
    pub name_format: NameFormat,
    pub prefix: String,
    pub suffix: String,
    pub annotation: AnnotationMode,
    /// Embed `structable.Recorder`; needs an annotation mode
    pub recorder: bool,
    /// Database the tables come from; selects the nullable time wrapper
    pub dialect: DbKind,
}

impl CodeGenConfig {
    pub fn new(output_dir: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            package: package.into(),
            name_format: NameFormat::default(),
            prefix: String::new(),
            suffix: String::new(),
            annotation: AnnotationMode::default(),
            recorder: false,
            dialect: DbKind::Postgres,
        }
    }

    pub fn with_name_format(mut self, format: NameFormat) -> Self {
        self.name_format = format;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationMode) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn with_recorder(mut self, recorder: bool) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_dialect(mut self, dialect: DbKind) -> Self {
        self.dialect = dialect;
        self
    }

    /// Whether the `structable.Recorder` field is emitted
    pub fn embeds_recorder(&self) -> bool {
        self.recorder && self.annotation.is_enabled()
    }

    /// Check the package name and output directory, resolving the latter
    /// to an absolute path
    pub fn validated(mut self) -> Result<Self, TablegenError> {
        if self.package.trim().is_empty() {
            return Err(TablegenError::Config(
                "name of package can not be empty".to_string(),
            ));
        }

        self.output_dir = resolve_output_dir(&self.output_dir)?;
        Ok(self)
    }
}

fn resolve_output_dir(path: &Path) -> Result<PathBuf, TablegenError> {
    let metadata = fs::metadata(path).map_err(|_| {
        TablegenError::Config(format!(
            "output file path {:?} does not exist",
            path.display().to_string()
        ))
    })?;

    if !metadata.is_dir() {
        return Err(TablegenError::Config(format!(
            "output file path {:?} is not a directory",
            path.display().to_string()
        )));
    }

    path.canonicalize().map_err(|e| {
        TablegenError::Config(format!(
            "Failed to resolve output path {}: {}",
            path.display(),
            e
        ))
    })
}

/// Trait for language-specific code generators
pub trait CodeGenerator {
    /// Render the complete source file for one table
    fn render_table(&self, table: &Table, config: &CodeGenConfig) -> Result<String, TablegenError>;

    /// File name (without directory) the table is written to
    fn file_name(&self, table: &Table, config: &CodeGenConfig) -> String;

    /// Render a table and write it into the output directory, replacing any
    /// existing file
    fn write_table(&self, table: &Table, config: &CodeGenConfig) -> Result<PathBuf, TablegenError> {
        let code = self.render_table(table, config)?;
        let path = config.output_dir.join(self.file_name(table, config));

        fs::write(&path, code).map_err(|source| TablegenError::FileWrite {
            path: path.clone(),
            source,
        })?;

        debug!(table = ?table.name, path = ?path, "Generated table file");
        Ok(path)
    }
}

/// Generate one file per base table read through `reader`
///
/// Tables are processed one at a time in listing order. The first error
/// aborts the run; files already written are left in place.
pub fn generate<R, G>(
    reader: &mut R,
    generator: &G,
    filter: &TableFilter,
    config: &CodeGenConfig,
) -> Result<Vec<PathBuf>, TablegenError>
where
    R: SchemaReader,
    G: CodeGenerator,
{
    info!(dialect = %config.dialect, scope = ?reader.scope(), "Running code generation");

    let all_tables = reader.list_base_tables()?;
    debug!(count = ?all_tables.len(), "Found all tables");

    let tables: Vec<Table> = all_tables
        .into_iter()
        .filter(|table| filter.should_include(&table.name))
        .collect();
    if !filter.is_empty() {
        debug!(count = ?tables.len(), "Tables after filtering");
    }

    let column_query = reader.prepare_column_query()?;

    let mut written = Vec::with_capacity(tables.len());
    for mut table in tables {
        debug!(table = ?table.name, "Processing table");

        reader.load_columns(&column_query, &mut table)?;
        trace!(table = ?table.name, columns = ?table.columns.len(), "Loaded columns");

        written.push(generator.write_table(&table, config)?);
    }

    info!(files = written.len(), output = ?config.output_dir, "Done");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_mode_from_flags() {
        assert_eq!(AnnotationMode::from_flags(false, false), AnnotationMode::Off);
        assert_eq!(AnnotationMode::from_flags(true, false), AnnotationMode::Combined);
        assert_eq!(AnnotationMode::from_flags(false, true), AnnotationMode::Only);
        assert_eq!(AnnotationMode::from_flags(true, true), AnnotationMode::Only);
    }

    #[test]
    fn test_recorder_requires_annotation() {
        let config = CodeGenConfig::new("out", "dto").with_recorder(true);
        assert!(!config.embeds_recorder());

        let config = config.with_annotation(AnnotationMode::Only);
        assert!(config.embeds_recorder());
    }

    #[test]
    fn test_validated_rejects_empty_package() {
        let dir = tempfile::tempdir().unwrap();
        let err = CodeGenConfig::new(dir.path(), "").validated().unwrap_err();
        assert!(matches!(err, TablegenError::Config(_)));
        assert!(err.to_string().contains("package"));
    }

    #[test]
    fn test_validated_rejects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = CodeGenConfig::new(&missing, "dto").validated().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validated_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = CodeGenConfig::new(&file, "dto").validated().unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_validated_resolves_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = CodeGenConfig::new(dir.path(), "dto").validated().unwrap();
        assert!(config.output_dir.is_absolute());
    }
}
