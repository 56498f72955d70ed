mod backfill;
mod recent;
mod subscribe;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ytmon-cli")]
#[command(about = "YouTube channel monitor command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import recent uploads for the configured channels
    Backfill {
        /// Maximum listing entries per channel (defaults to `YTMON_BACKFILL_LIMIT`)
        #[arg(long)]
        limit: Option<usize>,

        /// Restrict the run to one configured channel (by URL)
        #[arg(long)]
        channel: Option<String>,

        /// Ingest into an in-memory store and print the result instead of writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the most recently published stored videos
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Apply pending database migrations
    Migrate,
    /// Request hub push notifications for every configured channel
    Subscribe {
        /// Public URL of the server's `/webhook` endpoint
        #[arg(long)]
        callback_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ytmon_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Backfill {
            limit,
            channel,
            dry_run,
        } => {
            backfill::run_backfill(
                &config,
                channel.as_deref(),
                limit.unwrap_or(config.backfill_limit),
                dry_run,
            )
            .await
        }
        Commands::Recent { limit } => {
            let store = connect_store(&config).await?;
            recent::run_recent(&store, limit).await
        }
        Commands::Migrate => {
            let pool = connect(&config).await?;
            let applied = ytmon_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Commands::Subscribe { callback_url } => {
            subscribe::run_subscribe(&config, &callback_url).await
        }
    }
}

async fn connect(config: &ytmon_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = ytmon_db::PoolConfig::from_app_config(config);
    Ok(ytmon_db::connect_pool(config.database_url()?, pool_config).await?)
}

pub(crate) async fn connect_store(
    config: &ytmon_core::AppConfig,
) -> anyhow::Result<ytmon_db::PgVideoStore> {
    let pool = connect(config).await?;
    Ok(ytmon_db::PgVideoStore::new(
        pool,
        std::time::Duration::from_secs(config.db_statement_timeout_secs),
    ))
}
