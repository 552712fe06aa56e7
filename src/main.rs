use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vigil_console::client::{ConsoleBackend, HttpBackend};
use vigil_console::config::{self, Config};
use vigil_console::feed::{FeedRefresher, FeedService, FeedSnapshot};
use vigil_console::models::{
    AckFilter, DateRange, EventType, FeedEntry, FeedQuery, Severity,
};
use vigil_console::playback::correlator::candidate_count;
use vigil_console::playback::{
    PlaybackController, PlaybackRequest, PlaybackState, RecordingDirectory, TempFileMediaStore,
};
use vigil_console::utils::labels;

#[derive(Parser, Debug)]
#[command(name = "vigil-console")]
#[command(about = "Activity feed and moment playback for an edge video security service")]
struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the merged activity feed once
    Feed(FeedArgs),
    /// Keep printing the feed as it refreshes
    Watch(FeedArgs),
    /// Acknowledge an event
    Ack { id: i64 },
    /// List stored recordings
    Recordings,
    /// Fetch the recording containing an event or a moment
    Play(PlayArgs),
}

#[derive(Args, Debug)]
struct FeedArgs {
    /// last_24h, last_7_days or all
    #[arg(long)]
    range: Option<DateRange>,
    #[arg(long)]
    severity: Option<Severity>,
    #[arg(long)]
    event_type: Option<EventType>,
    /// all, unack or ack
    #[arg(long, default_value = "all")]
    ack: AckFilter,
    #[arg(long)]
    camera_id: Option<String>,
    /// Explain each event's type and severity, and who acknowledged it
    #[arg(long)]
    details: bool,
}

impl FeedArgs {
    fn query(&self, config: &Config) -> FeedQuery {
        FeedQuery {
            range: self.range.unwrap_or(config.feed.default_range),
            severity: self.severity,
            event_type: self.event_type.clone(),
            ack: self.ack,
            camera_id: self.camera_id.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Event to play
    #[arg(long, conflicts_with = "timestamp", required_unless_present = "timestamp")]
    event_id: Option<i64>,
    /// Moment to play, e.g. 2024-01-01T10:05:00Z
    #[arg(long)]
    timestamp: Option<String>,
    #[arg(long)]
    camera_id: Option<String>,
}

async fn run_app(cli: Cli) -> Result<()> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();
    info!("Using edge service at {}", config.api.base_url);

    let backend: Arc<dyn ConsoleBackend> =
        Arc::new(HttpBackend::new(&config.api).context("Failed to create API client")?);

    match cli.command {
        Command::Feed(args) => {
            let service = FeedService::new(backend, config.feed.clone());
            let snapshot = service.load(&args.query(&config)).await;
            print_feed(&snapshot, args.details);
        }
        Command::Watch(args) => {
            watch_feed(backend, &config, args.query(&config), args.details).await?
        }
        Command::Ack { id } => {
            let service = FeedService::new(backend, config.feed.clone());
            let query = FeedQuery {
                range: DateRange::All,
                ..FeedQuery::default()
            };
            let snapshot = service.load(&query).await;
            service
                .acknowledge_id(id, Some(&snapshot))
                .await
                .map_err(|e| anyhow!("{} {}", e, e.guidance()))?;
            println!("Event {} acknowledged", id);
        }
        Command::Recordings => {
            let catalog = backend.fetch_recording_catalog().await?;
            if catalog.forbidden {
                println!("{}", labels::SIGN_IN_REQUIRED);
            }
            let playable = candidate_count(&catalog.recordings);
            if playable < catalog.recordings.len() {
                warn!(
                    "{} of {} recordings have no start time in their name and cannot be matched to a moment",
                    catalog.recordings.len() - playable,
                    catalog.recordings.len()
                );
            }
            for recording in &catalog.recordings {
                let created = match recording.created_at() {
                    Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                    None => recording.created_utc.clone(),
                };
                println!(
                    "{:<32} {:>12} bytes  {}",
                    recording.name, recording.size_bytes, created
                );
            }
        }
        Command::Play(args) => play(backend, &config, args).await?,
    }

    Ok(())
}

async fn watch_feed(
    backend: Arc<dyn ConsoleBackend>,
    config: &Config,
    query: FeedQuery,
    details: bool,
) -> Result<()> {
    let service = Arc::new(FeedService::new(backend, config.feed.clone()));
    let refresher = Arc::new(FeedRefresher::new(service, query));
    let mut snapshots = refresher.subscribe();
    let task = refresher.clone().start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    print_feed(&snapshot, details);
                }
            }
        }
    }

    info!("Shutting down...");
    refresher.shutdown();
    task.await?;
    Ok(())
}

async fn play(backend: Arc<dyn ConsoleBackend>, config: &Config, args: PlayArgs) -> Result<()> {
    let request = match (args.event_id, args.timestamp) {
        (_, Some(timestamp)) => PlaybackRequest::at_moment(timestamp, args.camera_id),
        (Some(id), None) => {
            let service = FeedService::new(backend.clone(), config.feed.clone());
            let query = FeedQuery {
                range: DateRange::All,
                ..FeedQuery::default()
            };
            let snapshot = service.load(&query).await;
            let event = snapshot
                .find_event(id)
                .ok_or_else(|| anyhow!("Event {} is not among the most recent events", id))?;
            PlaybackRequest::for_event(event)
        }
        (None, None) => return Err(anyhow!("Either --event-id or --timestamp is required")),
    };

    let directory = Arc::new(RecordingDirectory::new(
        backend.clone(),
        Duration::from_secs(config.playback.catalog_max_age_secs),
    ));
    let store = Arc::new(
        TempFileMediaStore::new(config.playback.media_dir.as_deref())
            .context("Failed to prepare media directory")?,
    );
    let controller = PlaybackController::new(backend, directory, store, config.playback.clone());

    let mut states = controller.subscribe();
    controller.open(request);
    let state = loop {
        let state = states.borrow_and_update().clone();
        if state.is_settled() {
            break state;
        }
        states.changed().await?;
    };

    match &state {
        PlaybackState::Ready {
            matched, resource, ..
        } => {
            println!("Recording: {}", matched.recording.name);
            println!("Media:     {}", resource.path.display());
            println!("Offset:    {}s", matched.offset_seconds);
            if !resource.transcoded {
                warn!("Served in the archival container; some players may not open it");
            }
            println!("Press Ctrl-C to close the session and remove the media file.");
            tokio::signal::ctrl_c().await?;
        }
        other => {
            if let Some(message) = other.message() {
                println!("{}", message);
            }
            if let PlaybackState::Failed { detail, .. } = other {
                warn!("{}", detail);
            }
        }
    }

    controller.close();
    Ok(())
}

fn print_feed(snapshot: &FeedSnapshot, details: bool) {
    for failure in &snapshot.failures {
        println!(
            "! Could not load {}: {}",
            failure.source,
            failure.error.guidance()
        );
    }

    for item in &snapshot.items {
        match &item.entry {
            FeedEntry::Event(event) => {
                let flags: Vec<&str> = labels::event_flags(event)
                    .iter()
                    .map(|flag| flag.label)
                    .collect();
                println!(
                    "{:<20} {:<9} #{:<6} {:<14} {:<6} {:<10} {}",
                    item.timestamp,
                    item.kind(),
                    event.id,
                    labels::event_type_label(&event.event_type),
                    labels::severity_label(event.severity),
                    event.camera_id.as_deref().unwrap_or("-"),
                    flags.join(", ")
                );
                if details {
                    println!(
                        "{:<20}   {} {}",
                        "",
                        labels::event_type_description(&event.event_type),
                        labels::severity_description(event.severity)
                    );
                    if let Some(ack) = event.acknowledgment() {
                        println!("{:<20}   Acknowledged by {} at {}", "", ack.by, ack.at);
                    }
                }
            }
            FeedEntry::Detection(sample) => {
                let behavior = match sample.event.as_deref() {
                    Some(event) if sample.has_behavior() => labels::behavior_label(event),
                    _ => "-".to_string(),
                };
                println!(
                    "{:<20} {:<9} {:<22} {:<10} {}",
                    item.timestamp,
                    item.kind(),
                    sample.object.as_deref().unwrap_or("-"),
                    sample.camera_id.as_deref().unwrap_or("-"),
                    behavior
                );
            }
        }
    }

    let events_shown = snapshot
        .items
        .iter()
        .filter(|item| item.as_event().is_some())
        .count();
    println!(
        "{} items ({} of {} events, {} samples) at {}{}",
        snapshot.items.len(),
        events_shown,
        snapshot.event_count,
        snapshot.sample_count,
        snapshot.refreshed_at.format("%Y-%m-%d %H:%M:%S"),
        if snapshot.is_complete() { "" } else { " (partial)" }
    );
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_app(cli)) {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
