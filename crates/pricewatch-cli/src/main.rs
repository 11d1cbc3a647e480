mod report;
mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricewatch-cli")]
#[command(about = "Price watch command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one extraction pass over the configured products
    Scrape {
        /// Restrict the pass to one product (by name or slug)
        #[arg(long)]
        product: Option<String>,

        /// Print results without writing them to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// List the configured product descriptors
    Products,
    /// Show the recorded price history of a product
    History {
        /// Product name or slug
        name: String,

        /// Maximum number of observations to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("no command given; run with --help for usage");
        return Ok(());
    };

    let config = pricewatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.env.ansi_logs())
        .init();

    match command {
        Commands::Scrape { product, dry_run } => {
            let pool = if dry_run {
                None
            } else {
                Some(connect(&config).await?)
            };
            scrape::run_scrape(pool.as_ref(), &config, product.as_deref()).await
        }
        Commands::Products => report::run_products(&config),
        Commands::History { name, limit } => {
            let pool = connect(&config).await?;
            report::run_history(&pool, &config, &name, limit).await
        }
        Commands::Db { command } => {
            let pool_config = pricewatch_db::PoolConfig::from_app_config(&config);
            let pool =
                pricewatch_db::connect_pool(config.require_database_url()?, pool_config).await?;
            match command {
                DbCommands::Ping => {
                    pricewatch_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = pricewatch_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
            Ok(())
        }
    }
}

/// Connect and bring the schema up to date before any read or write.
///
/// `scrape --dry-run` and `products` never call this, so they run without
/// `DATABASE_URL`.
async fn connect(config: &pricewatch_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = pricewatch_db::PoolConfig::from_app_config(config);
    let pool = pricewatch_db::connect_pool(config.require_database_url()?, pool_config).await?;
    pricewatch_db::run_migrations(&pool).await?;
    Ok(pool)
}
