use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use node_census::config::{ConfigLoader, ReporterConfig};
use node_census::{Reporter, RunSettings};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "reporter")]
#[command(version = "0.1.0")]
#[command(about = "Tracks an execution client's share of public Ethereum nodes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the census site, store the measurement and send the report
    Run(RunArgs),
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to the configuration file (JSON/YAML/TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Census website (ethernets, ethernodes)
    #[arg(short, long)]
    source: Option<String>,

    /// Client name (nethermind, geth, besu, erigon, reth)
    #[arg(short, long)]
    client: Option<String>,

    /// Only report on stored history, do not scrape
    #[arg(long)]
    skip_update: bool,

    /// Maximum number of retries per endpoint
    #[arg(long)]
    max_retries: Option<u32>,

    /// Initial delay between retry attempts, in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Logs format
    #[arg(short = 'f', long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Show a progress spinner (stderr)
    #[arg(short, long)]
    progress: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn build_logger(debug: bool, format: LogFormat) -> env_logger::Logger {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    if format == LogFormat::Json {
        builder.format(|buf, record| {
            let line = serde_json::json!({
                "time": chrono::Utc::now().to_rfc3339(),
                "level": record.level().to_string(),
                "target": record.target(),
                "msg": record.args().to_string(),
            });
            writeln!(buf, "{}", line)
        });
    }
    builder.build()
}

fn apply_overrides(config: &mut ReporterConfig, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(source) = &args.source {
        config.source = source.parse()?;
    }
    if let Some(client) = &args.client {
        config.client = client.parse()?;
    }
    if args.skip_update {
        config.skip_update = true;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(delay) = args.retry_delay_ms {
        config.retry_delay_ms = delay;
    }
    ConfigLoader::check(config)?;
    Ok(())
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let logger = build_logger(args.debug, args.log_format);
    let level = logger.filter();
    let multi = Arc::new(MultiProgress::new());

    if args.progress {
        indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger).try_init()?;
    } else {
        log::set_boxed_logger(Box::new(logger))?;
    }
    log::set_max_level(level);

    log::debug!("Loading config from {:?}", args.config);
    let mut config = ConfigLoader::load_or_default(args.config.as_deref())?;
    apply_overrides(&mut config, &args)?;
    log::info!("Reporting {} on {}", config.client, config.source);

    let source = ConfigLoader::source(&config)?;
    let store = ConfigLoader::create_store(&config.store).await?;
    let notifier = ConfigLoader::create_notifier(&config.notifier, args.progress.then(|| multi.clone()))?;
    let settings = RunSettings {
        client: config.client,
        skip_update: config.skip_update,
        concurrent_views: config.concurrent_views,
        history_limit: config.history_limit,
        chart_url: config.chart_url.clone(),
    };
    let mut reporter = Reporter::new(source, ConfigLoader::fetcher_options(&config), store, notifier, settings)?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutting down...");
            ctrl_c_token.cancel();
        }
    });
    if let Some(secs) = config.deadline_secs {
        let deadline_token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            log::warn!("Deadline of {}s reached, cancelling run", secs);
            deadline_token.cancel();
        });
    }

    let mut spinner: Option<ProgressBar> = None;
    let mut _spinner_task = None;
    if args.progress {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(120));

        let mut state_rx = reporter.watch_state();
        let pb_clone = pb.clone();
        spinner = Some(pb);
        _spinner_task = Some(tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                let state = *state_rx.borrow();
                pb_clone.set_message(format!("{:?}", state));
            }
        }));
    }

    let result = reporter.run(&cancel).await;

    if let Some(task) = _spinner_task {
        task.abort();
    }
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let metrics = reporter.get_metrics();
    println!("\n📊 Fetch Attempts:");
    println!("   Requests: {} ({:.1}% usable)", metrics.attempts_total, metrics.success_rate);
    println!("   Unusable Pages: {}", metrics.unusable_pages);
    println!("   Challenges: {}", metrics.challenges_detected);
    println!("   Network/HTTP Errors: {}/{}", metrics.network_errors, metrics.http_errors);
    println!("   Retries: {}", metrics.retries);
    println!("   Average Duration: {}ms", metrics.avg_response_time_ms);
    println!("   Total Time: {:.1}s", metrics.elapsed_seconds);

    let summary = result?;
    println!("\n✅ Report Completed:");
    if let Some(data) = &summary.measurement {
        println!(
            "   Measured: {} of {} nodes ({} of {} synced)",
            data.client_total(),
            data.total(),
            data.client_synced(),
            data.total_synced()
        );
    }
    println!("   History Entries: {}", summary.history_len);
    Ok(())
}

fn check(config: PathBuf) {
    match ConfigLoader::load(&config) {
        Ok(cfg) => {
            println!("✅ Config is valid:");
            println!("   Source: {}", cfg.source);
            println!("   Client: {}", cfg.client);
            println!("   Retries: {} (initial delay {}ms)", cfg.max_retries, cfg.retry_delay_ms);
            println!("   Store: {:?}", cfg.store);
        }
        Err(e) => {
            eprintln!("❌ Config error: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await?,
        Commands::Check { config } => check(config),
    }

    Ok(())
}
