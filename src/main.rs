use bountyd::application::ci::{BountyService, CiWalker};
use bountyd::application::engine::BountyEngine;
use bountyd::config::DefaultDestinations;
use bountyd::domain::issue::RepoRef;
use bountyd::domain::ports::{LedgerHandle, MarketHandle, TrackerHandle, WalletHandle};
use bountyd::infrastructure::donate_client::{DEFAULT_ENDPOINT, DonateClient};
use bountyd::infrastructure::github::{DEFAULT_API_URL, GitHubClient};
use bountyd::infrastructure::in_memory::InMemoryLedger;
use bountyd::infrastructure::market::HttpMarketData;
#[cfg(feature = "storage-rocksdb")]
use bountyd::infrastructure::rocksdb::RocksDbLedger;
use bountyd::infrastructure::wallet_rpc::WalletRpcClient;
use bountyd::interfaces::http;
use bountyd::logging::{LogFormat, init_logging};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter, overridden by RUST_LOG
    #[arg(long, env = "DONATE_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as newline-delimited JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the /query and /pay endpoints
    Serve(ServeArgs),
    /// Refresh donation comments and trigger payouts for one repository
    Ci(CiArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DONATE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Tracker API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    github_api: String,

    /// Wallet daemon JSON-RPC endpoint
    #[arg(long, env = "WALLET_RPC_URL")]
    wallet_rpc: String,

    /// Fallback bitcoin payout address
    #[arg(long, env = "DONATION_ADDRESS_BTC")]
    default_btc: String,

    /// Fallback ethereum payout address
    #[arg(long, env = "DONATION_ADDRESS_ETH")]
    default_eth: String,

    #[arg(long, env = "DONATE_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[derive(Args)]
struct CiArgs {
    /// Repository to walk, owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: String,

    /// Base URL of a running `serve` instance
    #[arg(long, env = "DONATE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Tracker API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    github_api: String,

    /// Log comment bodies instead of posting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogFormat::from_json_flag(cli.log_json), &cli.log_level);

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Ci(args) => ci(args).await,
    }
}

fn open_ledger(db_path: Option<PathBuf>) -> Result<LedgerHandle> {
    #[cfg(feature = "storage-rocksdb")]
    {
        if let Some(path) = db_path {
            let ledger = RocksDbLedger::open(&path).into_diagnostic()?;
            info!(path = %path.display(), "using RocksDB ledger");
            return Ok(Arc::new(ledger));
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    {
        if db_path.is_some() {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }

    tracing::warn!("using in-memory ledger, wallets are lost on restart");
    Ok(Arc::new(InMemoryLedger::new()))
}

async fn serve(args: ServeArgs) -> Result<()> {
    let ledger = open_ledger(args.db_path)?;
    let defaults = DefaultDestinations::new(args.default_btc, args.default_eth).into_diagnostic()?;
    let tracker: TrackerHandle =
        Arc::new(GitHubClient::new(args.github_api, &args.token).into_diagnostic()?);
    let wallets: WalletHandle = Arc::new(WalletRpcClient::new(args.wallet_rpc).into_diagnostic()?);

    let engine = Arc::new(BountyEngine::new(ledger, tracker, wallets, defaults));
    http::serve(&args.listen, engine).await.into_diagnostic()
}

async fn ci(args: CiArgs) -> Result<()> {
    let repo = RepoRef::parse(&args.repo).into_diagnostic()?;
    let tracker: TrackerHandle =
        Arc::new(GitHubClient::new(args.github_api, &args.token).into_diagnostic()?);
    let service: Arc<dyn BountyService> =
        Arc::new(DonateClient::new(args.endpoint).into_diagnostic()?);
    let market: MarketHandle = Arc::new(HttpMarketData::new().into_diagnostic()?);

    let walker = CiWalker::new(tracker, service, market, args.dry_run);
    let summary = walker.walk(&repo, Utc::now()).await.into_diagnostic()?;
    info!(
        commented = summary.commented,
        paid = summary.paid,
        skipped = summary.skipped,
        failed = summary.failed,
        "ci run complete"
    );
    Ok(())
}
