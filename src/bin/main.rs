//! hydrate CLI - run, explain and check hydration requests
//!
//! Usage:
//!   hydrate query <entity> --select <selection> [--filter <expr>] [--order <spec>]
//!   hydrate explain <entity> --select <selection> [--dialect <dialect>]
//!   hydrate check <filter> [--entity <entity>]
//!   hydrate schema
//!
//! Examples:
//!   hydrate query houses --select 'street user { email }' --filter "street == 'street42'"
//!   hydrate query houses --select 'street' --order 'street ASC' --page 2 --per-page 10 --count
//!   hydrate explain users --select 'email' --filter "houses.number > 3" --dialect postgres
//!   hydrate check "street == 'x' && (number > 3 || user.email != null)"

use clap::{Args, Parser, Subcommand, ValueEnum};
use hydrate::config::{LogFormat, LoggingSettings, Settings};
use hydrate::filter;
use hydrate::sql::Dialect;
use hydrate::{
    Caller, EngineError, QueryEngine, QueryRequest, RequestContext, SchemaGraph, Selection,
    SqliteStore,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hydrate")]
#[command(about = "hydrate - fetch nested, filtered, visibility-scoped records from a relational store")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to HYDRATE_CONFIG, ./hydrate.toml, ~/.config/hydrate/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a request and print the result as JSON
    Query {
        #[command(flatten)]
        request: RequestArgs,

        /// SQLite database file (overrides [database] path)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Wrap the result with total_count, page and per_page
        #[arg(long)]
        count: bool,
    },

    /// Print the root SQL a request would run
    Explain {
        #[command(flatten)]
        request: RequestArgs,

        /// SQL dialect to render (defaults to [engine] dialect)
        #[arg(short, long)]
        dialect: Option<DialectArg>,
    },

    /// Parse a filter expression and report errors
    Check {
        /// The filter expression
        filter: String,

        /// Also resolve the filter against this entity
        #[arg(short, long)]
        entity: Option<String>,
    },

    /// List entities, attributes, relations and what each entity reaches
    Schema,
}

#[derive(Args)]
struct RequestArgs {
    /// Root entity
    entity: String,

    /// Selection, e.g. 'id street user { email }'
    #[arg(short, long, default_value = "id")]
    select: String,

    /// Treat --select as JSON
    #[arg(long)]
    json: bool,

    /// Filter expression
    #[arg(short, long)]
    filter: Option<String>,

    /// Order specification, e.g. 'street ASC, user.email DESC'
    #[arg(short, long)]
    order: Option<String>,

    #[arg(long)]
    page: Option<u64>,

    #[arg(long)]
    per_page: Option<u64>,

    /// Fetch a single record by id
    #[arg(long)]
    id: Option<String>,

    /// Caller id
    #[arg(short, long)]
    user: Option<String>,

    /// Caller role (repeatable)
    #[arg(short, long)]
    role: Vec<String>,
}

impl RequestArgs {
    fn to_request(&self) -> Result<QueryRequest, String> {
        let selection = if self.json {
            Selection::from_json_str(&self.select)
        } else {
            Selection::parse(&self.select)
        }
        .map_err(|e| e.to_string())?;

        Ok(QueryRequest {
            entity: self.entity.clone(),
            selection,
            filter: self.filter.clone(),
            order: self.order.clone(),
            page: self.page,
            per_page: self.per_page,
            id: self.id.clone(),
        })
    }

    fn caller(&self) -> Caller {
        Caller {
            id: self.user.clone(),
            roles: self.role.clone(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Sqlite,
    Postgres,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Postgres => Dialect::Postgres,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings.logging);

    match cli.command {
        Commands::Query {
            request,
            database,
            count,
        } => cmd_query(&settings, request, database, count).await,
        Commands::Explain { request, dialect } => cmd_explain(&settings, request, dialect),
        Commands::Check { filter, entity } => cmd_check(&settings, &filter, entity.as_deref()),
        Commands::Schema => cmd_schema(&settings),
    }
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_env("HYDRATE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn build_engine(settings: &Settings) -> Result<QueryEngine, String> {
    let schema = Arc::new(settings.schema().map_err(|e| e.to_string())?);
    let visibility = Arc::new(settings.visibility(&schema).map_err(|e| e.to_string())?);
    let engine_settings = settings.engine.to_engine_settings().map_err(|e| e.to_string())?;
    Ok(QueryEngine::new(schema, visibility, engine_settings))
}

/// Print an engine error, with diagnostics for filter syntax errors.
fn report_error(err: &EngineError, request: &QueryRequest) {
    if let (EngineError::Parse(parse), Some(source)) = (err, &request.filter) {
        eprint!("{}", filter::render_diagnostics(source, &parse.diagnostics));
        return;
    }
    let user_error = err.to_user_error();
    match serde_json::to_string(&user_error) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("Error: {}", err),
    }
}

async fn cmd_query(
    settings: &Settings,
    args: RequestArgs,
    database: Option<PathBuf>,
    count: bool,
) -> ExitCode {
    let engine = match build_engine(settings) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let request = match args.to_request() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let path = match database.map(Ok).or_else(|| settings.database.resolved_path().transpose()) {
        Some(Ok(path)) => path,
        Some(Err(e)) => {
            eprintln!("Invalid database path: {}", e);
            return ExitCode::FAILURE;
        }
        None => {
            eprintln!("No database configured: pass --database or set [database] path");
            return ExitCode::FAILURE;
        }
    };
    let store = match SqliteStore::open(&path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Error opening '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let caller = args.caller();
    let timeout = engine.settings().query_timeout;
    let output = if count {
        let ctx = RequestContext::with_timeout(timeout);
        engine
            .fetch_page(store.as_ref(), &caller, &request, &ctx)
            .map(serde_json::to_value)
    } else {
        engine
            .clone()
            .execute_async(store, caller, request.clone(), timeout)
            .await
            .map(serde_json::to_value)
    };

    match output {
        Ok(Ok(json)) => {
            println!("{:#}", json);
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            eprintln!("Error serializing result: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            report_error(&e, &request);
            ExitCode::FAILURE
        }
    }
}

fn cmd_explain(settings: &Settings, args: RequestArgs, dialect: Option<DialectArg>) -> ExitCode {
    let engine = match build_engine(settings) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let request = match args.to_request() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let dialect = dialect.map(Dialect::from).unwrap_or(engine.settings().dialect);
    match engine.explain(&args.caller(), &request, dialect) {
        Ok(sql) => {
            println!("{}", sql);
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&e, &request);
            ExitCode::FAILURE
        }
    }
}

fn cmd_check(settings: &Settings, source: &str, entity: Option<&str>) -> ExitCode {
    let expr = match filter::parse(source) {
        Ok(Some(expr)) => expr,
        Ok(None) => {
            println!("Empty filter");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprint!("{}", filter::render_diagnostics(source, &e.diagnostics));
            return ExitCode::FAILURE;
        }
    };

    let Some(entity) = entity else {
        println!("✓ {}", expr);
        return ExitCode::SUCCESS;
    };

    let schema = match settings.schema() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let root = match schema.entity(entity) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match filter::compile(&expr, root, &schema, settings.engine.dialect) {
        Ok(compiled) => {
            println!("✓ {}", compiled.predicate.to_sql(settings.engine.dialect));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Filter error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_schema(settings: &Settings) -> ExitCode {
    let schema = match settings.schema() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    print_schema(&schema);
    ExitCode::SUCCESS
}

fn print_schema(schema: &SchemaGraph) {
    if schema.is_empty() {
        println!("No entities configured");
        return;
    }

    for entity in schema.entities() {
        println!(
            "{} (table: \"{}\", key: {} {:?})",
            entity.name, entity.table, entity.primary_key, entity.id_kind
        );
        for attribute in entity.attributes() {
            println!("  - {}: {}", attribute.name, attribute.field_type);
        }
        for relation in entity.relations() {
            println!(
                "  → {} ({:?} {}, {} = {}.{})",
                relation.name,
                relation.kind,
                relation.target,
                relation.keys.source_column,
                relation.target,
                relation.keys.target_column
            );
        }
        if let Ok(reached) = schema.reachable(&entity.name) {
            if !reached.is_empty() {
                println!("  reaches: {}", reached.join(", "));
            }
        }
        println!();
    }

    if schema.is_cyclic() {
        println!("Relations form cycles; selections are bounded by their own depth");
    }
}
