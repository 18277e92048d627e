mod query;
mod run;

use std::process::ExitCode;

use anyhow::Context;
use brandscan_core::{AppConfig, Environment};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "brandscan")]
#[command(about = "Brand sentiment pipeline: discover, scrape, clean and analyze community discussion")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the pipeline for every prospect or a single brand
    Run {
        /// Process every known prospect
        #[arg(long, conflicts_with = "brand", required_unless_present = "brand")]
        all: bool,

        /// Process one brand, creating the prospect if needed
        #[arg(long)]
        brand: Option<String>,

        /// Industry category for the brand, used in the search query
        #[arg(long, requires = "brand")]
        category: Option<String>,

        /// Show what would run without calling any provider
        #[arg(long)]
        dry_run: bool,
    },
    /// Prospect management
    Prospects {
        #[command(subcommand)]
        command: ProspectsCommands,
    },
    /// Show the latest analysis results
    Results {
        /// Filter to one brand
        #[arg(long)]
        brand: Option<String>,

        /// Maximum number of results to show
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ProspectsCommands {
    /// List prospects with their status
    List,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Load prospects from the prospects file
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("nothing to do; see `brandscan --help`");
        return Ok(ExitCode::SUCCESS);
    };

    let config = brandscan_core::load_app_config().context("failed to load configuration")?;
    init_tracing(&config)?;

    let pool_config = brandscan_db::PoolConfig::from_app_config(&config);
    let pool = brandscan_db::connect_pool(&config.database_url, pool_config)
        .await
        .context("failed to connect to the database")?;

    match command {
        Commands::Run {
            all,
            brand,
            category,
            dry_run,
        } => {
            let scope = run::scope_from_args(all, brand, category)?;
            if dry_run {
                run::run_dry(&pool, &scope).await?;
                return Ok(ExitCode::SUCCESS);
            }
            let report = run::run_pipeline(&pool, &config, &scope).await?;
            if report.any_failed() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Prospects {
            command: ProspectsCommands::List,
        } => query::list_prospects(&pool).await?,
        Commands::Results { brand, limit } => {
            query::show_results(&pool, brand.as_deref(), limit).await?;
        }
        Commands::Db { command } => run_db_command(&pool, &config, &command).await?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Production logs go to collectors that do not render ANSI escapes.
fn colored_logs(env: &Environment) -> bool {
    !matches!(env, Environment::Production)
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(colored_logs(&config.env))
        .init();
    tracing::debug!(env = %config.env, "logging initialized");
    Ok(())
}

async fn run_db_command(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: &DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            brandscan_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = brandscan_db::run_migrations(pool).await?;
            println!("migrations applied: {applied}");
        }
        DbCommands::Seed => {
            let file = brandscan_core::load_prospects(&config.prospects_path)?;
            let seeded = brandscan_db::seed_prospects(pool, &file.prospects).await?;
            println!(
                "seeded {seeded} prospects from {}",
                config.prospects_path.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
