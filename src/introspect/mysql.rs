use mysql::prelude::{FromValue, Queryable};
use mysql::{Conn, OptsBuilder, Row, Statement};
use tracing::{debug, error, info, trace};

use super::SchemaReader;
use crate::config::DbConfig;
use crate::prelude::TablegenError;
use crate::schema::{Column, ColumnRow, Table};

// information_schema columns come back with server-dependent collations and
// unsigned widths; cast to CHAR/SIGNED so decoding is uniform.
const LIST_TABLES_SQL: &str = r#"
    SELECT CAST(table_name AS CHAR(255)) AS table_name
    FROM information_schema.tables
    WHERE table_type = 'BASE TABLE'
        AND table_schema = ?
    ORDER BY table_name
"#;

const COLUMNS_SQL: &str = r#"
    SELECT
        CAST(ordinal_position AS SIGNED) AS ordinal_position,
        CAST(column_name AS CHAR(255)) AS column_name,
        CAST(data_type AS CHAR(255)) AS data_type,
        CAST(column_default AS CHAR) AS column_default,
        CAST(is_nullable AS CHAR(3)) AS is_nullable,
        CAST(character_maximum_length AS SIGNED) AS character_maximum_length,
        CAST(numeric_precision AS SIGNED) AS numeric_precision,
        CAST(column_key AS CHAR(3)) AS column_key,
        CAST(extra AS CHAR(255)) AS extra
    FROM information_schema.columns
    WHERE table_name = ?
        AND table_schema = ?
    ORDER BY ordinal_position
"#;

/// Open a blocking MySQL connection
pub fn connect(config: &DbConfig) -> Result<Conn, TablegenError> {
    info!(connection = ?config.redacted_connection_string(), "Connecting to MySQL");

    let password = (!config.password.is_empty()).then(|| config.password.clone());
    let opts = OptsBuilder::new()
        .ip_or_hostname(Some(config.host.clone()))
        .tcp_port(config.port)
        .user(Some(config.user.clone()))
        .pass(password)
        .db_name(Some(config.database.clone()));

    let conn = Conn::new(opts).map_err(|e| {
        error!(error = ?e, "Failed to connect to MySQL");
        config.connection_failure(e)
    })?;

    info!("Connected to database");
    Ok(conn)
}

/// MySQL schema reader. Queries are scoped to the database name.
pub struct MysqlReader<'a> {
    conn: &'a mut Conn,
    database: String,
}

impl<'a> MysqlReader<'a> {
    pub fn new(conn: &'a mut Conn, database: impl Into<String>) -> Self {
        Self {
            conn,
            database: database.into(),
        }
    }

    fn query_error(&self, message: String) -> TablegenError {
        TablegenError::Query {
            scope: self.database.clone(),
            message,
        }
    }
}

impl SchemaReader for MysqlReader<'_> {
    type ColumnQuery = Statement;

    fn scope(&self) -> &str {
        &self.database
    }

    fn list_base_tables(&mut self) -> Result<Vec<Table>, TablegenError> {
        trace!(database = ?self.database, "Querying tables");

        let rows: Vec<Row> = self
            .conn
            .exec(LIST_TABLES_SQL, (self.database.as_str(),))
            .map_err(|e| {
                error!(database = ?self.database, error = ?e, "Failed to query tables");
                self.query_error(format!("Failed to query tables: {}", e))
            })?;

        let tables = rows
            .iter()
            .map(|row| {
                value::<String>(row, "table_name")
                    .map(Table::new)
                    .map_err(|e| self.query_error(format!("Failed to read table name: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(database = ?self.database, count = ?tables.len(), "Found base tables");
        Ok(tables)
    }

    fn prepare_column_query(&mut self) -> Result<Statement, TablegenError> {
        trace!(database = ?self.database, "Preparing column query");

        self.conn.prep(COLUMNS_SQL).map_err(|e| {
            error!(database = ?self.database, error = ?e, "Failed to prepare column query");
            TablegenError::Prepare {
                scope: self.database.clone(),
                message: e.to_string(),
            }
        })
    }

    fn load_columns(&mut self, query: &Statement, table: &mut Table) -> Result<(), TablegenError> {
        trace!(database = ?self.database, table = ?table.name, "Querying columns");

        let rows: Vec<Row> = self
            .conn
            .exec(query, (table.name.as_str(), self.database.as_str()))
            .map_err(|e| {
                error!(
                    database = ?self.database,
                    table = ?table.name,
                    error = ?e,
                    "Failed to query columns"
                );
                self.query_error(format!(
                    "Failed to query columns for table '{}': {}",
                    table.name, e
                ))
            })?;

        table.columns = rows
            .iter()
            .map(column_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                self.query_error(format!(
                    "Failed to read columns for table '{}': {}",
                    table.name, e
                ))
            })?;

        trace!(table = ?table.name, columns = ?table.columns.len(), "Found columns");
        Ok(())
    }
}

/// Read a named column from a row without panicking on a bad conversion
fn value<T: FromValue>(row: &Row, name: &str) -> Result<T, String> {
    match row.get_opt::<T, _>(name) {
        Some(Ok(v)) => Ok(v),
        Some(Err(e)) => Err(format!("column '{}': {}", name, e)),
        None => Err(format!("column '{}' missing from result", name)),
    }
}

fn column_from_row(row: &Row) -> Result<Column, String> {
    let column = ColumnRow {
        ordinal_position: value(row, "ordinal_position")?,
        column_name: value(row, "column_name")?,
        data_type: value(row, "data_type")?,
        column_default: value(row, "column_default")?,
        is_nullable: value(row, "is_nullable")?,
        character_maximum_length: value(row, "character_maximum_length")?,
        numeric_precision: value(row, "numeric_precision")?,
        column_key: value(row, "column_key")?,
        extra: value(row, "extra")?,
    };

    Ok(column.into())
}
