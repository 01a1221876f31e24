//! Mapping of SQL column types to Go types

use crate::config::DbKind;

/// Go field type produced for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoType {
    Int,
    NullInt64,
    Float64,
    NullFloat64,
    String,
    NullString,
    Time,
    /// Nullable time wrapper; the package depends on the database driver
    NullTime,
    Bool,
    NullBool,
}

impl GoType {
    /// Go spelling of the type
    pub fn name(self, dialect: DbKind) -> &'static str {
        match self {
            GoType::Int => "int",
            GoType::NullInt64 => "sql.NullInt64",
            GoType::Float64 => "float64",
            GoType::NullFloat64 => "sql.NullFloat64",
            GoType::String => "string",
            GoType::NullString => "sql.NullString",
            GoType::Time => "time.Time",
            GoType::NullTime => match dialect {
                DbKind::Postgres => "pq.NullTime",
                DbKind::Mysql => "mysql.NullTime",
            },
            GoType::Bool => "bool",
            GoType::NullBool => "sql.NullBool",
        }
    }

    /// Import path the type needs, if any
    pub fn import(self, dialect: DbKind) -> Option<&'static str> {
        match self {
            GoType::Int | GoType::Float64 | GoType::String | GoType::Bool => None,
            GoType::NullInt64 | GoType::NullFloat64 | GoType::NullString | GoType::NullBool => {
                Some("database/sql")
            }
            GoType::Time => Some("time"),
            GoType::NullTime => match dialect {
                DbKind::Postgres => Some("github.com/lib/pq"),
                DbKind::Mysql => Some("github.com/go-sql-driver/mysql"),
            },
        }
    }
}

/// Map a lower-cased SQL type name to a Go type.
///
/// Returns the type and whether it belongs to the date/time family.
/// Unknown types fall back to `sql.NullString`.
pub fn map_column_type(data_type: &str, is_nullable: bool) -> (GoType, bool) {
    let pick = |plain: GoType, nullable: GoType| if is_nullable { nullable } else { plain };

    match data_type {
        // Postgres names first, then the MySQL-only ones
        "integer" | "bigint" | "bigserial" | "smallint" | "smallserial" | "serial" | "int"
        | "tinyint" | "mediumint" => (pick(GoType::Int, GoType::NullInt64), false),
        "double precision" | "numeric" | "decimal" | "real" | "float" | "double" => {
            (pick(GoType::Float64, GoType::NullFloat64), false)
        }
        "character varying" | "character" | "text" | "char" | "varchar" | "binary"
        | "varbinary" | "blob" => (pick(GoType::String, GoType::NullString), false),
        "time"
        | "timestamp"
        | "time with time zone"
        | "timestamp with time zone"
        | "time without time zone"
        | "timestamp without time zone"
        | "date"
        | "datetime"
        | "year" => (pick(GoType::Time, GoType::NullTime), true),
        "boolean" => (pick(GoType::Bool, GoType::NullBool), false),
        _ => (GoType::NullString, false),
    }
}
