use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use tablegen::codegen::{AnnotationMode, CodeGenConfig};
use tablegen::config::{ConnectionOverrides, DbConfig, DbKind};
use tablegen::introspect::TableFilter;
use tablegen::schema::NameFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Database {
    /// PostgreSQL
    Pg,
    /// MySQL / MariaDB
    Mysql,
}

impl From<Database> for DbKind {
    fn from(database: Database) -> Self {
        match database {
            Database::Pg => DbKind::Postgres,
            Database::Mysql => DbKind::Mysql,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum CliNameFormat {
    /// CamelCase struct and field names
    #[default]
    #[value(name = "c", alias = "camel")]
    Camel,
    /// Original names with the first letter capitalized
    #[value(name = "o", alias = "original")]
    Original,
}

impl From<CliNameFormat> for NameFormat {
    fn from(format: CliNameFormat) -> Self {
        match format {
            CliNameFormat::Camel => NameFormat::Camel,
            CliNameFormat::Original => NameFormat::Original,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tablegen")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Type of database
    #[arg(short = 't', long, value_enum, default_value_t = Database::Pg)]
    db_type: Database,

    /// User to connect to the database [env: DB_USER, default: postgres]
    #[arg(short, long)]
    user: Option<String>,

    /// Password of the user [env: DB_PASSWORD]
    #[arg(short, long)]
    password: Option<String>,

    /// Database name [env: DB_NAME, default: postgres]
    #[arg(short, long)]
    database: Option<String>,

    /// Schema name, Postgres only [env: DB_SCHEMA, default: public]
    #[arg(short, long)]
    schema: Option<String>,

    /// Host of the database [env: DB_HOST, default: 127.0.0.1]
    #[arg(long)]
    host: Option<String>,

    /// Port of the database [env: DB_PORT, default: standard port of the database]
    #[arg(long)]
    port: Option<u16>,

    /// Existing directory the Go files are written to
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Naming of structs and fields
    #[arg(short, long, value_enum, default_value_t = CliNameFormat::Camel)]
    format: CliNameFormat,

    /// Go package name
    #[arg(long, default_value = "dto")]
    package: String,

    /// Prefix for file and struct names
    #[arg(long, default_value = "")]
    prefix: String,

    /// Suffix for file and struct names
    #[arg(long, default_value = "")]
    suffix: String,

    /// Add Masterminds/structable annotations next to the db tags
    #[arg(long)]
    structable: bool,

    /// Use Masterminds/structable annotations only
    #[arg(long)]
    structable_only: bool,

    /// Embed a structable.Recorder (requires --structable or --structable-only)
    #[arg(long)]
    structable_recorder: bool,

    /// Comma-separated list of tables to include (default: all)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Comma-separated list of tables to exclude
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("tablegen v{}", env!("CARGO_PKG_VERSION"));

    let kind = DbKind::from(cli.db_type);
    let annotation = AnnotationMode::from_flags(cli.structable, cli.structable_only);
    if cli.structable_recorder && !annotation.is_enabled() {
        warn!("--structable-recorder has no effect without --structable or --structable-only");
    }

    let codegen_config = CodeGenConfig::new(cli.output, cli.package)
        .with_name_format(cli.format.into())
        .with_prefix(cli.prefix)
        .with_suffix(cli.suffix)
        .with_annotation(annotation)
        .with_recorder(cli.structable_recorder)
        .with_dialect(kind)
        .validated()
        .context("Invalid generation options")?;
    debug!(codegen_config = ?codegen_config, "Code generation config");

    // Load configuration
    let overrides = ConnectionOverrides {
        host: cli.host,
        port: cli.port,
        database: cli.database,
        schema: cli.schema,
        user: cli.user,
        password: cli.password,
    };
    let db_config = DbConfig::load(&cli.env_file, kind, overrides)
        .context("Failed to load database configuration")?;
    debug!(connection = ?db_config.redacted_connection_string(), "Loaded configuration");

    // Build table filter
    let filter = TableFilter {
        include: cli.tables,
        exclude: cli.exclude,
    };

    if !filter.is_empty() {
        debug!(filter = ?filter, "Table filter configured");
    }

    let written = match kind {
        DbKind::Postgres => generate_postgres(&db_config, &filter, &codegen_config)?,
        DbKind::Mysql => generate_mysql(&db_config, &filter, &codegen_config)?,
    };

    info!(files = written.len(), "Code generation complete");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[cfg(feature = "postgres")]
fn generate_postgres(
    db_config: &DbConfig,
    filter: &TableFilter,
    codegen_config: &CodeGenConfig,
) -> Result<Vec<PathBuf>> {
    use tablegen::codegen::{generate, GoGenerator};
    use tablegen::introspect::postgres::connect;
    use tablegen::PostgresReader;

    let mut client = connect(db_config)?;
    let mut reader = PostgresReader::new(&mut client, db_config.scope());

    let written = generate(&mut reader, &GoGenerator::new(), filter, codegen_config)
        .context("Failed to generate structs")?;
    Ok(written)
}

#[cfg(not(feature = "postgres"))]
fn generate_postgres(
    _db_config: &DbConfig,
    _filter: &TableFilter,
    _codegen_config: &CodeGenConfig,
) -> Result<Vec<PathBuf>> {
    anyhow::bail!("PostgreSQL support not enabled. Rebuild with --features postgres")
}

#[cfg(feature = "mysql")]
fn generate_mysql(
    db_config: &DbConfig,
    filter: &TableFilter,
    codegen_config: &CodeGenConfig,
) -> Result<Vec<PathBuf>> {
    use tablegen::codegen::{generate, GoGenerator};
    use tablegen::introspect::mysql::connect;
    use tablegen::MysqlReader;

    let mut conn = connect(db_config)?;
    let mut reader = MysqlReader::new(&mut conn, db_config.scope());

    let written = generate(&mut reader, &GoGenerator::new(), filter, codegen_config)
        .context("Failed to generate structs")?;
    Ok(written)
}

#[cfg(not(feature = "mysql"))]
fn generate_mysql(
    _db_config: &DbConfig,
    _filter: &TableFilter,
    _codegen_config: &CodeGenConfig,
) -> Result<Vec<PathBuf>> {
    anyhow::bail!("MySQL support not enabled. Rebuild with --features mysql")
}
