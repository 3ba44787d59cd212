mod clock;
mod recording;
mod replay;
mod settings;
mod source;
mod storage;
mod tracking;
mod units;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::recording::{export_filename, to_csv};
use crate::replay::{read_samples, replay, ReplayOptions};
use crate::storage::{FileStore, KeyValueStore, MemoryStore, RecordingStore};
use crate::tracking::TrackingConfig;
use crate::units::UnitSystem;
use crate::web::Config;

#[derive(Parser)]
#[command(name = "speed-o-mat")]
#[command(about = "GPS speed tracking and session metrics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Feed a JSON-lines file of position samples through the engine
    Replay {
        samples: PathBuf,
        #[arg(long, value_enum, default_value = "imperial")]
        unit: UnitSystem,
        /// Record the whole replay as a session
        #[arg(long)]
        record: bool,
        /// Write the recorded session as CSV to this path
        #[arg(long)]
        export: Option<PathBuf>,
        /// Save the recorded session into this store folder
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        noise_threshold: Option<f64>,
        #[arg(long)]
        min_movement: Option<f64>,
    },
    /// Inspect saved recordings
    Recordings {
        #[arg(long)]
        store: PathBuf,
        #[command(subcommand)]
        action: RecordingsAction,
    },
}

#[derive(Subcommand)]
enum RecordingsAction {
    /// List recordings, newest first
    List,
    /// Export a recording as CSV
    Export {
        id: String,
        /// Defaults to the session's export file name
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete a recording
    Delete { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Replay {
            samples,
            unit,
            record,
            export,
            store,
            noise_threshold,
            min_movement,
        } => {
            let defaults = TrackingConfig::default();
            let tracking = TrackingConfig {
                noise_threshold_mps: noise_threshold.unwrap_or(defaults.noise_threshold_mps),
                min_movement_m: min_movement.unwrap_or(defaults.min_movement_m),
                ..defaults
            };
            let options = ReplayOptions {
                unit,
                record: record || export.is_some() || store.is_some(),
                save: store.is_some(),
                tracking,
            };
            run_replay(&samples, &options, export, store)
        }
        Commands::Recordings { store, action } => recordings(store, action),
    }
}

async fn serve(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_replay(
    path: &Path,
    options: &ReplayOptions,
    export: Option<PathBuf>,
    store: Option<PathBuf>,
) -> ExitCode {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (samples, skipped) = match read_samples(BufReader::new(file)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error reading samples: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let kv: Arc<dyn KeyValueStore> = match store {
        Some(folder) => Arc::new(FileStore::new(folder)),
        None => Arc::new(MemoryStore::new()),
    };
    let recordings = RecordingStore::new(kv, options.tracking.max_recordings);

    let report = match replay(&samples, options, recordings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Replay failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let m = &report.metrics;
    println!("Replayed {} samples ({} skipped)", report.samples, skipped);
    println!("  current  {:.2} {}", m.current_speed, m.speed_unit);
    println!("  max      {:.2} {}", m.max_speed, m.speed_unit);
    println!("  average  {:.2} {}", m.average_speed, m.speed_unit);
    println!("  distance {:.3} {}", m.total_distance, m.distance_unit);
    println!("  elapsed  {}", m.elapsed);

    if let Some(session) = &report.recording {
        println!(
            "Recorded session {} ({} samples)",
            session.id,
            session.samples.len()
        );
        if let Some(out) = export {
            if let Err(e) = fs::write(&out, to_csv(session)) {
                eprintln!("Error writing {}: {}", out.display(), e);
                return ExitCode::FAILURE;
            }
            println!("Exported to {}", out.display());
        }
    }

    ExitCode::SUCCESS
}

fn recordings(store: PathBuf, action: RecordingsAction) -> ExitCode {
    let recordings = RecordingStore::new(
        Arc::new(FileStore::new(store)),
        TrackingConfig::default().max_recordings,
    );

    match action {
        RecordingsAction::List => match recordings.list() {
            Ok(list) => {
                if list.is_empty() {
                    println!("No recordings");
                }
                for s in list {
                    println!(
                        "{}  {:>5} samples  {:>8.1}s  max {:.2} {}  avg {:.2} {}",
                        s.id,
                        s.sample_count,
                        s.duration_seconds,
                        s.max_speed,
                        s.speed_unit,
                        s.average_speed,
                        s.speed_unit
                    );
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error listing recordings: {}", e);
                ExitCode::FAILURE
            }
        },
        RecordingsAction::Export { id, out } => {
            let session = match recordings.get(&id) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error loading recording: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let out = out.unwrap_or_else(|| PathBuf::from(export_filename(&session)));
            match fs::write(&out, to_csv(&session)) {
                Ok(()) => {
                    println!("Exported {} to {}", id, out.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error writing {}: {}", out.display(), e);
                    ExitCode::FAILURE
                }
            }
        }
        RecordingsAction::Delete { id } => match recordings.delete(&id) {
            Ok(()) => {
                println!("Deleted {}", id);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error deleting recording: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
