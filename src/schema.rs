//! Schema data structures
//!
//! These types represent database schema information and form the contract
//! between introspection (produces) and code generation (consumes).

/// Marker found in the default of Postgres serial columns
const SEQUENCE_DEFAULT_MARKER: &str = "nextval";

/// Database base table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    /// Columns in ordinal order, filled in by a second introspection pass
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }
}

/// A table column, normalized across database kinds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    /// 1-based position in the table declaration
    pub ordinal_position: i32,
    pub name: String,
    /// Lower-cased SQL type name
    pub data_type: String,
    pub column_default: Option<String>,
    pub is_nullable: bool,
    pub character_maximum_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    /// MySQL only, e.g. "PRI"
    pub column_key: String,
    /// MySQL only, e.g. "auto_increment"
    pub extra: String,
}

impl Column {
    /// Check if the column is a generated primary key.
    ///
    /// Postgres serial columns default to `nextval(...)`; MySQL marks them
    /// with a `PRI` key and `auto_increment` extra.
    pub fn is_auto_increment_key(&self) -> bool {
        let has_sequence_default = self
            .column_default
            .as_deref()
            .is_some_and(|default| default.contains(SEQUENCE_DEFAULT_MARKER));

        has_sequence_default
            || (self.column_key.contains("PRI") && self.extra.contains("auto_increment"))
    }
}

/// One information_schema.columns row as the drivers decode it
#[derive(Debug, Clone, Default)]
pub struct ColumnRow {
    pub ordinal_position: i32,
    pub column_name: String,
    pub data_type: String,
    pub column_default: Option<String>,
    /// "YES" or "NO"
    pub is_nullable: String,
    pub character_maximum_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    /// Absent for Postgres
    pub column_key: Option<String>,
    /// Absent for Postgres
    pub extra: Option<String>,
}

impl From<ColumnRow> for Column {
    fn from(row: ColumnRow) -> Self {
        Self {
            ordinal_position: row.ordinal_position,
            name: row.column_name,
            data_type: row.data_type.to_lowercase(),
            column_default: row.column_default,
            is_nullable: is_nullable_flag(&row.is_nullable),
            character_maximum_length: row.character_maximum_length,
            numeric_precision: row.numeric_precision,
            column_key: row.column_key.unwrap_or_default(),
            extra: row.extra.unwrap_or_default(),
        }
    }
}

/// Convert an information_schema `is_nullable` value ("YES"/"NO")
pub fn is_nullable_flag(value: &str) -> bool {
    value == "YES"
}

/// How table and column names are turned into identifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameFormat {
    /// Split on underscores and capitalize every segment: `user_id` -> `UserId`
    #[default]
    Camel,
    /// Capitalize the first letter only: `user_id` -> `User_id`
    Original,
}

/// Format an identifier according to `format`
pub fn format_identifier(s: &str, format: NameFormat) -> String {
    match format {
        NameFormat::Original => capitalize(s),
        NameFormat::Camel => {
            if !s.contains('_') {
                return capitalize(s);
            }
            s.split('_')
                .map(|word| capitalize(&word.to_lowercase()))
                .collect()
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let first_upper = first.to_uppercase().to_string();
            first_upper + chars.as_str()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(default: Option<&str>, key: &str, extra: &str) -> Column {
        Column {
            ordinal_position: 1,
            name: "id".to_string(),
            data_type: "integer".to_string(),
            column_default: default.map(str::to_string),
            column_key: key.to_string(),
            extra: extra.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_camel() {
        assert_eq!(format_identifier("user_id", NameFormat::Camel), "UserId");
        assert_eq!(format_identifier("id", NameFormat::Camel), "Id");
        assert_eq!(
            format_identifier("order_line_items", NameFormat::Camel),
            "OrderLineItems"
        );
    }

    #[test]
    fn test_format_camel_lowercases_segments() {
        assert_eq!(format_identifier("USER_ID", NameFormat::Camel), "UserId");
        assert_eq!(format_identifier("a__b", NameFormat::Camel), "AB");
    }

    #[test]
    fn test_format_camel_single_segment_keeps_case() {
        assert_eq!(format_identifier("userId", NameFormat::Camel), "UserId");
        assert_eq!(format_identifier("userId", NameFormat::Original), "UserId");
    }

    #[test]
    fn test_format_original() {
        assert_eq!(format_identifier("user_id", NameFormat::Original), "User_id");
        assert_eq!(format_identifier("", NameFormat::Original), "");
    }

    #[test]
    fn test_format_idempotent_on_formatted_word() {
        for format in [NameFormat::Camel, NameFormat::Original] {
            let once = format_identifier("Users", format);
            assert_eq!(format_identifier(&once, format), once);
        }
    }

    #[test]
    fn test_is_nullable_flag() {
        assert!(is_nullable_flag("YES"));
        assert!(!is_nullable_flag("NO"));
    }

    #[test]
    fn test_column_from_postgres_row() {
        let col = Column::from(ColumnRow {
            ordinal_position: 2,
            column_name: "CreatedAt".to_string(),
            data_type: "TIMESTAMP WITH TIME ZONE".to_string(),
            column_default: Some("now()".to_string()),
            is_nullable: "YES".to_string(),
            ..Default::default()
        });

        assert_eq!(col.ordinal_position, 2);
        assert_eq!(col.name, "CreatedAt");
        assert_eq!(col.data_type, "timestamp with time zone");
        assert_eq!(col.column_default.as_deref(), Some("now()"));
        assert!(col.is_nullable);
        assert_eq!(col.column_key, "");
        assert_eq!(col.extra, "");
    }

    #[test]
    fn test_column_from_mysql_row() {
        let col = Column::from(ColumnRow {
            ordinal_position: 1,
            column_name: "id".to_string(),
            data_type: "int".to_string(),
            is_nullable: "NO".to_string(),
            numeric_precision: Some(10),
            column_key: Some("PRI".to_string()),
            extra: Some("auto_increment".to_string()),
            ..Default::default()
        });

        assert!(!col.is_nullable);
        assert_eq!(col.numeric_precision, Some(10));
        assert_eq!(col.character_maximum_length, None);
        assert!(col.is_auto_increment_key());
    }

    #[test]
    fn test_auto_increment_postgres_sequence() {
        let col = column(Some("nextval('users_id_seq'::regclass)"), "", "");
        assert!(col.is_auto_increment_key());
    }

    #[test]
    fn test_auto_increment_mysql_key() {
        assert!(column(None, "PRI", "auto_increment").is_auto_increment_key());
        assert!(!column(None, "PRI", "").is_auto_increment_key());
        assert!(!column(None, "UNI", "auto_increment").is_auto_increment_key());
    }

    #[test]
    fn test_plain_default_is_not_auto_increment() {
        assert!(!column(Some("'pending'"), "", "").is_auto_increment_key());
        assert!(!column(None, "", "").is_auto_increment_key());
    }
}
