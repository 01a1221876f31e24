//! # tablegen
//!
//! Generate Go struct definitions from database schemas
//!
//! This crate provides a CLI tool and library for reading table metadata from
//! PostgreSQL or MySQL and emitting one Go struct per table, optionally
//! annotated for Masterminds/structable.

pub mod codegen;
pub mod config;
pub mod error;
pub mod introspect;
pub mod schema;

pub mod prelude {
    pub use crate::codegen::{generate, AnnotationMode, CodeGenConfig, CodeGenerator, GoGenerator};
    pub use crate::config::{ConnectionOverrides, DbConfig, DbKind};
    pub use crate::error::TablegenError;
    pub use crate::introspect::{SchemaReader, TableFilter};
    pub use crate::schema::{format_identifier, Column, NameFormat, Table};
}

#[cfg(feature = "mysql")]
pub use introspect::MysqlReader;
#[cfg(feature = "postgres")]
pub use introspect::PostgresReader;
