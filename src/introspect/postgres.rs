use postgres::{Client, Config, NoTls, Row, Statement};
use tracing::{debug, error, info, trace};

use super::SchemaReader;
use crate::config::DbConfig;
use crate::prelude::TablegenError;
use crate::schema::{Column, ColumnRow, Table};

// information_schema exposes domain types (sql_identifier, cardinal_number,
// yes_or_no); cast them so the driver decodes plain text and int4.
const LIST_TABLES_SQL: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_type = 'BASE TABLE'
        AND table_schema = $1
    ORDER BY table_name
"#;

const COLUMNS_SQL: &str = r#"
    SELECT
        ordinal_position::int4 AS ordinal_position,
        column_name::text AS column_name,
        data_type::text AS data_type,
        column_default::text AS column_default,
        is_nullable::text AS is_nullable,
        character_maximum_length::int4 AS character_maximum_length,
        numeric_precision::int4 AS numeric_precision
    FROM information_schema.columns
    WHERE table_name = $1
        AND table_schema = $2
    ORDER BY ordinal_position
"#;

/// Open a blocking PostgreSQL connection
pub fn connect(config: &DbConfig) -> Result<Client, TablegenError> {
    info!(connection = ?config.redacted_connection_string(), "Connecting to PostgreSQL");

    let mut pg_config = Config::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .dbname(&config.database);
    if !config.password.is_empty() {
        pg_config.password(&config.password);
    }

    let client = pg_config.connect(NoTls).map_err(|e| {
        error!(error = ?e, "Failed to connect to PostgreSQL");
        config.connection_failure(e)
    })?;

    info!("Connected to database");
    Ok(client)
}

/// PostgreSQL schema reader
pub struct PostgresReader<'a> {
    client: &'a mut Client,
    schema: String,
}

impl<'a> PostgresReader<'a> {
    pub fn new(client: &'a mut Client, schema: impl Into<String>) -> Self {
        Self {
            client,
            schema: schema.into(),
        }
    }

    fn query_error(&self, message: String) -> TablegenError {
        TablegenError::Query {
            scope: self.schema.clone(),
            message,
        }
    }
}

impl SchemaReader for PostgresReader<'_> {
    type ColumnQuery = Statement;

    fn scope(&self) -> &str {
        &self.schema
    }

    fn list_base_tables(&mut self) -> Result<Vec<Table>, TablegenError> {
        trace!(schema = ?self.schema, "Querying tables");

        let rows = self
            .client
            .query(LIST_TABLES_SQL, &[&self.schema])
            .map_err(|e| {
                error!(schema = ?self.schema, error = ?e, "Failed to query tables");
                self.query_error(format!("Failed to query tables: {}", e))
            })?;

        let tables = rows
            .iter()
            .map(|row| {
                row.try_get::<_, String>("table_name")
                    .map(Table::new)
                    .map_err(|e| self.query_error(format!("Failed to read table name: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(schema = ?self.schema, count = ?tables.len(), "Found base tables");
        Ok(tables)
    }

    fn prepare_column_query(&mut self) -> Result<Statement, TablegenError> {
        trace!(schema = ?self.schema, "Preparing column query");

        self.client.prepare(COLUMNS_SQL).map_err(|e| {
            error!(schema = ?self.schema, error = ?e, "Failed to prepare column query");
            TablegenError::Prepare {
                scope: self.schema.clone(),
                message: e.to_string(),
            }
        })
    }

    fn load_columns(&mut self, query: &Statement, table: &mut Table) -> Result<(), TablegenError> {
        trace!(schema = ?self.schema, table = ?table.name, "Querying columns");

        let rows = self
            .client
            .query(query, &[&table.name, &self.schema])
            .map_err(|e| {
                error!(
                    schema = ?self.schema,
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

/// Decode one information_schema.columns row. Postgres has no key/extra
/// columns, so those stay empty.
fn column_from_row(row: &Row) -> Result<Column, postgres::Error> {
    let column = ColumnRow {
        ordinal_position: row.try_get("ordinal_position")?,
        column_name: row.try_get("column_name")?,
        data_type: row.try_get("data_type")?,
        column_default: row.try_get("column_default")?,
        is_nullable: row.try_get("is_nullable")?,
        character_maximum_length: row
            .try_get::<_, Option<i32>>("character_maximum_length")?
            .map(i64::from),
        numeric_precision: row
            .try_get::<_, Option<i32>>("numeric_precision")?
            .map(i64::from),
        column_key: None,
        extra: None,
    };

    Ok(column.into())
}
