//! Go code generator
//!
//! Generates one Go struct per table, with `db` tags and optional
//! Masterminds/structable annotations.

use std::collections::BTreeSet;

use minijinja::Environment;
use tracing::{debug, warn};

use crate::codegen::{AnnotationMode, CodeGenConfig, CodeGenerator};
use crate::error::TablegenError;
use crate::schema::{format_identifier, Column, Table};

pub mod format;
pub mod types;

use format::format_source;
use types::map_column_type;

const STRUCTABLE_IMPORT: &str = "github.com/Masterminds/structable";

/// Appended to the `stbl` tag of generated primary keys
const STRUCTABLE_KEY_FLAGS: &str = ",PRIMARY_KEY,SERIAL,AUTO_INCREMENT";

/// One struct field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoField {
    pub name: String,
    pub go_type: &'static str,
    pub tag: String,
}

/// Everything needed to render the file for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoFile {
    pub package: String,
    /// Deduplicated import paths
    pub imports: BTreeSet<&'static str>,
    pub struct_name: String,
    /// Fields in column ordinal order
    pub fields: Vec<GoField>,
    pub embeds_recorder: bool,
    pub has_nullable: bool,
    pub has_temporal: bool,
}

impl GoFile {
    /// Build the file model for `table`
    pub fn from_table(table: &Table, config: &CodeGenConfig) -> Self {
        let mut columns: Vec<&Column> = table.columns.iter().collect();
        columns.sort_by_key(|col| col.ordinal_position);

        let mut imports = BTreeSet::new();
        let mut has_nullable = false;
        let mut has_temporal = false;
        let mut fields = Vec::with_capacity(columns.len());

        for column in columns {
            let (go_type, is_temporal) = map_column_type(&column.data_type, column.is_nullable);
            has_nullable |= column.is_nullable;
            has_temporal |= is_temporal;

            if let Some(path) = go_type.import(config.dialect) {
                imports.insert(path);
            }

            fields.push(GoField {
                name: format_identifier(&column.name, config.name_format),
                go_type: go_type.name(config.dialect),
                tag: field_tag(column, config.annotation),
            });
        }

        let embeds_recorder = config.embeds_recorder();
        if embeds_recorder {
            imports.insert(STRUCTABLE_IMPORT);
        }

        Self {
            package: config.package.clone(),
            imports,
            struct_name: struct_name(table, config),
            fields,
            embeds_recorder,
            has_nullable,
            has_temporal,
        }
    }

    /// Standard library imports first, then third-party ones
    pub fn import_groups(&self) -> Vec<Vec<&'static str>> {
        let (standard, external): (Vec<_>, Vec<_>) = self
            .imports
            .iter()
            .copied()
            .partition(|path| !path.split('/').next().is_some_and(|p| p.contains('.')));

        [standard, external]
            .into_iter()
            .filter(|group| !group.is_empty())
            .collect()
    }
}

/// Struct (and file) name: the formatted prefix + table name + suffix
pub fn struct_name(table: &Table, config: &CodeGenConfig) -> String {
    format_identifier(
        &format!("{}{}{}", config.prefix, table.name, config.suffix),
        config.name_format,
    )
}

/// Build the struct tag for a column
fn field_tag(column: &Column, annotation: AnnotationMode) -> String {
    let db_tag = || format!("db:\"{}\"", column.name);
    let structable_tag = || {
        let key_flags = if column.is_auto_increment_key() {
            STRUCTABLE_KEY_FLAGS
        } else {
            ""
        };
        format!("stbl:\"{}{}\"", column.name, key_flags)
    };

    match annotation {
        AnnotationMode::Off => db_tag(),
        AnnotationMode::Combined => format!("{} {}", db_tag(), structable_tag()),
        AnnotationMode::Only => structable_tag(),
    }
}

/// Go code generator
pub struct GoGenerator {
    env: Environment<'static>,
}

impl GoGenerator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        // Register templates
        env.add_template("struct", include_str!("templates/struct.go.jinja"))
            .expect("Failed to load go struct template");

        Self { env }
    }

    /// Render the file model to normalized Go source.
    ///
    /// Normalization failure is not fatal: the raw rendering is returned.
    pub fn render(&self, file: &GoFile) -> Result<String, TablegenError> {
        let codegen_error = |message: String| TablegenError::CodeGen {
            table: file.struct_name.clone(),
            message,
        };

        let template = self
            .env
            .get_template("struct")
            .map_err(|e| codegen_error(format!("Template error: {}", e)))?;

        let ctx = minijinja::context! {
            package => &file.package,
            imports => file.import_groups(),
            struct_name => &file.struct_name,
            fields => file.fields.iter().map(|f| {
                minijinja::context! {
                    name => &f.name,
                    go_type => f.go_type,
                    tag => &f.tag,
                }
            }).collect::<Vec<_>>(),
            recorder => file.embeds_recorder,
        };

        let raw = template
            .render(ctx)
            .map_err(|e| codegen_error(format!("Render error: {}", e)))?;

        match format_source(&raw) {
            Ok(formatted) => Ok(formatted),
            Err(e) => {
                warn!(
                    struct_name = ?file.struct_name,
                    error = %e,
                    "Failed to format generated source, writing it unformatted"
                );
                Ok(raw)
            }
        }
    }
}

impl Default for GoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for GoGenerator {
    fn render_table(&self, table: &Table, config: &CodeGenConfig) -> Result<String, TablegenError> {
        let file = GoFile::from_table(table, config);
        debug!(
            table = ?table.name,
            struct_name = ?file.struct_name,
            fields = file.fields.len(),
            nullable = file.has_nullable,
            temporal = file.has_temporal,
            imports = ?file.imports,
            "Rendering struct"
        );

        self.render(&file)
    }

    fn file_name(&self, table: &Table, config: &CodeGenConfig) -> String {
        format!("{}.go", struct_name(table, config))
    }
}
