use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mesk_core::{CaptureMode, GeoPoint};
use mesk_detect::{DetectionModel, ModelStatus, TracingNotifier, Upload, UploadQueue};
use mesk_field::{BoundaryCaptureSession, FarmDraft};
use mesk_prime::config::Config;
use mesk_prime::points::PointsFile;
use mesk_prime::report;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "mesk-prime")]
#[command(about = "Mesk Prime: farm boundaries and crop pest detection")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "mesk-prime.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate the area enclosed by a boundary
    Area {
        /// TOML file with the boundary points
        #[arg(short, long)]
        points: PathBuf,
    },
    /// Register a farm from its location and boundary
    Farm {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Farm location as `lat,lng`
        #[arg(long, value_parser = parse_point)]
        location: Option<GeoPoint>,
        /// TOML file with the boundary points
        #[arg(short, long)]
        points: Option<PathBuf>,
    },
    /// Analyze crop images for pests
    Analyze {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    match cli.command {
        Command::Area { points } => {
            let file = PointsFile::load(&points)?;
            let mut session = BoundaryCaptureSession::new();
            session.set_mode(CaptureMode::Boundary);
            for point in file.boundary(&config.map) {
                session.record_point(point);
            }
            print!("{}", report::boundary(&session));
        }
        Command::Farm {
            name,
            description,
            location,
            points,
        } => {
            let mut draft = FarmDraft::new();
            draft.name = name;
            draft.description = description;

            let session = draft.session_mut();
            if let Some(location) = location {
                session.record_point(location);
            }
            if let Some(points) = points {
                session.set_mode(CaptureMode::Boundary);
                for point in PointsFile::load(&points)?.boundary(&config.map) {
                    session.record_point(point);
                }
            }
            print!("{}", report::boundary(draft.session()));

            let farm = draft.save()?;
            print!("{}", report::farm(&farm));
        }
        Command::Analyze { images } => {
            analyze(&config, images).await;
        }
    }

    Ok(())
}

async fn analyze(config: &Config, images: Vec<PathBuf>) {
    let notifier = Arc::new(TracingNotifier);
    let loader = Arc::new(config.backend.loader());
    let model = Arc::new(DetectionModel::new(loader, notifier.clone()));

    let mut status = model.subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            if *status.borrow_and_update() == ModelStatus::Initializing {
                info!("Loading AI model...");
            }
        }
    });

    let queue = UploadQueue::new(model, notifier, config.detection.settings());
    queue.upload(images.into_iter().map(Upload::from_path)).await;
    queue.wait_idle().await;

    for image in queue.images().await {
        print!("{}", report::image(&image, config.detection.display_limit));
    }
    print!("{}", report::summary(&queue.summary().await));
}

fn parse_point(s: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lng`, got `{s}`"))?;
    let lat = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude `{lat}`: {e}"))?;
    let lng = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude `{lng}`: {e}"))?;
    Ok(GeoPoint::new(lat, lng))
}
