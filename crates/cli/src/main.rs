use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackforge_core::{
    load_config, progress_channel, validate_config, ArtifactIngestor, CompletionPoller,
    GenerationClient, GenerationPipeline, GenerationRequest, HttpGenerationClient,
    HttpMediaSource, PinataStore, PollPolicy, ProgressEnvelope, ProgressLevel, SanitizedConfig,
};

/// Buffer size for the progress event channel
const PROGRESS_BUFFER_SIZE: usize = 256;

/// Generate music and pin the results to IPFS.
#[derive(Debug, Parser)]
#[command(name = "trackforge", version)]
struct Args {
    /// What the track should sound like
    #[arg(long)]
    prompt: String,

    /// Style / genre hint
    #[arg(long)]
    style: Option<String>,

    /// Track title
    #[arg(long)]
    title: Option<String>,

    /// Generate without vocals
    #[arg(long)]
    instrumental: bool,

    /// Model override
    #[arg(long)]
    model: Option<String>,

    /// Target duration in seconds
    #[arg(long)]
    duration: Option<u32>,

    /// Completion callback URL
    #[arg(long)]
    callback_url: Option<String>,

    /// Override poller.max_attempts
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Override poller.interval_ms
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Configuration file
    #[arg(long, env = "TRACKFORGE_CONFIG", default_value = "trackforge.toml")]
    config: PathBuf,
}

impl Args {
    fn request(&self) -> GenerationRequest {
        let mut request = GenerationRequest::new(&self.prompt).instrumental(self.instrumental);
        if let Some(style) = &self.style {
            request = request.with_style(style);
        }
        if let Some(title) = &self.title {
            request = request.with_title(title);
        }
        if let Some(model) = &self.model {
            request = request.with_model(model);
        }
        if let Some(duration) = self.duration {
            request = request.with_duration(duration);
        }
        if let Some(url) = &self.callback_url {
            request = request.with_callback_url(url);
        }
        request
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn log_progress(mut rx: mpsc::Receiver<ProgressEnvelope>) {
    while let Some(envelope) = rx.recv().await {
        let message = envelope.event.message();
        match envelope.event.level() {
            ProgressLevel::Info | ProgressLevel::Success => info!("{}", message),
            ProgressLevel::Warning => warn!("{}", message),
            ProgressLevel::Error => error!("{}", message),
        }
    }
}

/// Wait for the progress logger to drain. Returns false if it died.
async fn join_logger(logger: JoinHandle<()>) -> bool {
    match logger.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Progress logger task failed: {}", e);
            false
        }
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // Load configuration
    info!("Loading configuration from {:?}", args.config);
    let mut config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    if let Some(max_attempts) = args.max_attempts {
        config.poller.max_attempts = max_attempts;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.poller.interval_ms = interval_ms;
    }
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded (fingerprint {})", &config_hash[..16]);
    if !sanitized.storage.jwt_configured {
        warn!("storage.jwt is not set; tracks will be returned without IPFS addresses");
    }

    let client: Arc<dyn GenerationClient> = Arc::new(
        HttpGenerationClient::new(&config.generation)
            .context("Failed to create generation client")?,
    );
    let store = PinataStore::new(&config.storage).context("Failed to create storage client")?;
    let media = HttpMediaSource::new(Duration::from_secs(config.storage.timeout_secs))
        .context("Failed to create media client")?;

    let ingestor = ArtifactIngestor::new(Arc::new(store), Arc::new(media), config.ingest.clone());
    let policy: PollPolicy = config.poller.policy();

    let (progress, progress_rx) = progress_channel(PROGRESS_BUFFER_SIZE);
    let logger = tokio::spawn(log_progress(progress_rx));

    let pipeline = GenerationPipeline::new(
        Arc::clone(&client),
        CompletionPoller::new(Arc::clone(&client)),
        Arc::new(ingestor),
    )
    .with_policy(policy)
    .with_progress(progress);

    let request = args.request();
    info!("Request id: {}", request.request_id);

    let result = pipeline.run(&request).await;

    // Close the progress channel so the logger drains and exits.
    drop(pipeline);
    join_logger(logger).await;

    let tracks = match result {
        Ok(tracks) => tracks,
        Err(e) => {
            if let Some(task) = e.task().filter(|_| e.is_resumable()) {
                warn!("Task {} may still finish; poll it again later", task);
            }
            return Err(e).context("Generation pipeline failed");
        }
    };

    let output = serde_json::to_string_pretty(&tracks).context("Failed to serialize tracks")?;
    println!("{}", output);

    Ok(())
}
