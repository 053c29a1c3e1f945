use clap::{Args, Parser, Subcommand};
use mangarec::{run_pipeline, EncoderConfig, MangaRecord, UserInteraction};
use mangarec_api::{RecommendationService, RestApi, ServiceConfig};
use mangarec_core::read_json_records;
use mangarec_similarity::ResolverConfig;
use mangarec_storage::ArtifactStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Content-based manga recommender
#[derive(Parser, Debug)]
#[command(name = "mangarec")]
#[command(about = "Build similarity artifacts and serve manga recommendations", long_about = None)]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info", env = "MANGAREC_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode records, compute similarity and store a new artifact version
    Build(BuildArgs),
    /// Serve recommendations from the latest stored artifacts
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Cleaned manga records (JSON array or JSON lines)
    #[arg(long, env = "MANGAREC_RECORDS")]
    records: PathBuf,

    /// User list entries, persisted as interaction features
    #[arg(long, env = "MANGAREC_INTERACTIONS")]
    interactions: Option<PathBuf>,

    /// Artifact store root
    #[arg(long, env = "MANGAREC_STORE", default_value = "./artifacts")]
    store: PathBuf,

    /// Positional tag weights, first tag first
    #[arg(long, value_delimiter = ',', default_values_t = [3.0f32, 2.0])]
    tag_weights: Vec<f32>,

    /// Plain 0/1 tag presence instead of positional weights
    #[arg(long, conflicts_with = "tag_weights")]
    unweighted: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Artifact store root
    #[arg(long, env = "MANGAREC_STORE", default_value = "./artifacts")]
    store: PathBuf,

    /// HTTP API port
    #[arg(long, env = "MANGAREC_HTTP_PORT", default_value_t = 8000)]
    http_port: u16,

    /// Minimum fuzzy title score (0-100)
    #[arg(long, default_value_t = 70.0)]
    fuzzy_threshold: f64,

    /// Neighbors returned when a request does not say
    #[arg(long, default_value_t = 5)]
    default_top_n: usize,

    /// Extra attempts when the artifact store cannot be read
    #[arg(long, default_value_t = 3)]
    load_retries: u32,

    /// Pause between load attempts, in milliseconds
    #[arg(long, default_value_t = 500)]
    retry_backoff_ms: u64,
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build(args: BuildArgs) -> anyhow::Result<()> {
    info!("Records: {:?}", args.records);
    info!("Artifact store: {:?}", args.store);

    let records: Vec<MangaRecord> = read_json_records(&args.records)?;
    let interactions: Vec<UserInteraction> = match &args.interactions {
        Some(path) => read_json_records(path)?,
        None => Vec::new(),
    };
    let config = if args.unweighted {
        EncoderConfig::unweighted()
    } else {
        EncoderConfig { tag_weights: Some(args.tag_weights) }
    };

    let store = ArtifactStore::new(&args.store)?;
    let report = run_pipeline(&records, &interactions, &store, &config)?;
    info!(
        version = %report.version,
        encoded = report.encoded,
        excluded = report.excluded,
        columns = report.feature_columns,
        "build finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Artifact store: {:?}", args.store);
    info!("HTTP API port: {}", args.http_port);

    let config = ServiceConfig {
        resolver: ResolverConfig { threshold: args.fuzzy_threshold },
        default_top_n: args.default_top_n,
        load_retries: args.load_retries,
        retry_backoff: Duration::from_millis(args.retry_backoff_ms),
    };
    let store = ArtifactStore::open(&args.store)?;
    let service = Arc::new(
        tokio::task::spawn_blocking(move || RecommendationService::load(store, config)).await??,
    );
    info!("Catalog loaded: {} items", service.catalog().len());

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(service, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("mangarec started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    info!("Starting mangarec v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Build(args) => tokio::task::spawn_blocking(move || build(args)).await?,
        Command::Serve(args) => serve(args).await,
    }
}
