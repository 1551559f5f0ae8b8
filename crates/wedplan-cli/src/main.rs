mod config;
mod plan_cmds;
mod serve_cmd;
mod user_cmds;
mod vendor_cmds;

#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use wedplan_core::recommend::RecommendationEngine;
use wedplan_core::token::DEFAULT_TTL_HOURS;
use wedplan_db::pool;

use config::WedplanConfig;

#[derive(Parser)]
#[command(name = "wedplan", about = "Wedding plan composition and reservation service")]
struct Cli {
    /// Database URL (overrides WEDPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a wedplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/wedplan")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the wedplan database if needed and apply migrations
    DbInit,
    /// Serve the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Account management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Session tokens for the HTTP API
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Vendor catalog management
    Vendor {
        #[command(subcommand)]
        command: VendorCommands,
    },
    /// Inspect users' plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user account
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        gender: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Issue a bearer token for a user
    Issue {
        /// User ID the token authenticates as
        user_id: String,
        /// Token lifetime in hours
        #[arg(long, default_value_t = DEFAULT_TTL_HOURS)]
        ttl_hours: i64,
    },
}

#[derive(Subcommand)]
pub enum VendorCommands {
    /// Import vendors and service items from a catalog TOML file
    Import {
        /// Path to the catalog TOML file
        file: String,
    },
    /// List catalog vendors
    List {
        /// STUDIO, DRESS, MAKEUP or VENUE
        #[arg(long)]
        category: Option<String>,
        /// Exact region name
        #[arg(long)]
        region: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// List a user's profiles and plans; `*` marks the main plan
    List {
        /// User ID
        user_id: String,
    },
    /// Show one plan with its items
    Show {
        /// Plan ID
        plan_id: String,
        /// Owner's user ID
        #[arg(long = "user")]
        user_id: String,
    },
}

/// Execute the `wedplan init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_owned(),
        },
        auth: config::AuthSection {
            token_secret: token_secret.clone(),
        },
        recommend: config::RecommendSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  auth.token_secret = {}...", &token_secret[..8]);
    println!();
    println!("Next: run `wedplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `wedplan db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &WedplanConfig) -> anyhow::Result<()> {
    println!("Initializing wedplan database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("wedplan db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Init { db_url, force } = &cli.command {
        return cmd_init(db_url, *force);
    }

    let resolved = WedplanConfig::resolve(cli.database_url.as_deref())?;

    if let Commands::DbInit = cli.command {
        return cmd_db_init(&resolved).await;
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let result = match cli.command {
        Commands::Init { .. } | Commands::DbInit => Ok(()),
        Commands::Serve { bind, port } => match resolved.require_token() {
            Ok(tokens) => {
                let engine = RecommendationEngine::default().with_weights(resolved.weights);
                let state = serve_cmd::AppState::new(db_pool.clone(), engine, tokens.clone());
                serve_cmd::run_serve(state, &bind, port).await
            }
            Err(e) => Err(e),
        },
        Commands::User { command } => user_cmds::run_user_command(command, &db_pool).await,
        Commands::Token { command } => match resolved.require_token() {
            Ok(tokens) => user_cmds::run_token_command(command, &db_pool, tokens).await,
            Err(e) => Err(e),
        },
        Commands::Vendor { command } => vendor_cmds::run_vendor_command(command, &db_pool).await,
        Commands::Plan { command } => plan_cmds::run_plan_command(command, &db_pool).await,
    };

    db_pool.close().await;
    result
}
