//! Database introspection
//!
//! This module provides functionality for reading table and column metadata
//! from information_schema. Each supported database has its own feature-gated
//! submodule implementing [`SchemaReader`].

use crate::prelude::{Table, TablegenError};

/// Filters to apply to the listed tables
#[derive(Debug, Default, Clone)]
pub struct TableFilter {
    /// Only include these tables (if Some)
    pub include: Option<Vec<String>>,
    /// Exclude these tables
    pub exclude: Option<Vec<String>>,
}

impl TableFilter {
    /// Check if a table should be included
    pub fn should_include(&self, table_name: &str) -> bool {
        // Check include list
        if let Some(include) = &self.include {
            if !include.iter().any(|t| t == table_name) {
                return false;
            }
        }

        // Check exclude list
        if let Some(exclude) = &self.exclude {
            if exclude.iter().any(|t| t == table_name) {
                return false;
            }
        }

        true
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}

/// Trait for reading schema metadata from a live database
///
/// Placeholder syntax, the scope column and the MySQL-only key/extra columns
/// stay behind this trait; callers only see normalized [`Table`] values.
pub trait SchemaReader {
    /// Handle to the compiled column metadata query
    type ColumnQuery;

    /// Schema (Postgres) or database (MySQL) the queries are scoped to
    fn scope(&self) -> &str;

    /// List base tables (no views) in the scope, ordered by name. The
    /// returned tables have no columns yet.
    fn list_base_tables(&mut self) -> Result<Vec<Table>, TablegenError>;

    /// Compile the column metadata query once for the run
    fn prepare_column_query(&mut self) -> Result<Self::ColumnQuery, TablegenError>;

    /// Fill `table.columns` in ordinal order
    fn load_columns(
        &mut self,
        query: &Self::ColumnQuery,
        table: &mut Table,
    ) -> Result<(), TablegenError>;
}

// Feature-gated database implementations
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub use self::mysql::MysqlReader;
#[cfg(feature = "postgres")]
pub use self::postgres::PostgresReader;
