mod renderer;
mod thumbs;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use campus_tour_core::ingest::parse_places;
use campus_tour_core::{LayeredConfig, Place, TourConfig, TourController};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Browse a campus street-view tour in the terminal.
#[derive(Parser, Debug)]
#[command(name = "campus-tour", version, about, long_about = None)]
struct Cli {
    /// TOML file overriding the built-in tour configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the panorama catalog interactively
    Browse {
        /// Place records exported from the spreadsheet (JSON)
        places: PathBuf,
        /// Log file; the terminal itself is taken by the browser
        #[arg(long, default_value = "campus-tour.log")]
        log_file: PathBuf,
    },
    /// Print the catalog in navigation order
    Catalog {
        places: PathBuf,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Generate card thumbnails under every image directory
    Thumbs {
        /// The `images/` directory of the map page
        images: PathBuf,
    },
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TourConfig> {
    let mut layered = LayeredConfig::with_defaults();
    if let Some(path) = path {
        layered = layered.load_from_file(path)?;
    }
    let layered = layered.load_from_env();
    tracing::debug!(
        embed_mode = ?layered.source("viewer.embed_mode"),
        assets = ?layered.source("assets"),
        "configuration sources"
    );
    Ok(layered.into_config())
}

fn read_places(path: &Path) -> Result<Vec<Place>> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_places(&data)?)
}

fn controller_for(places_file: &Path, config: Option<&Path>) -> Result<TourController> {
    let mut controller = TourController::new(load_config(config)?);
    let places = read_places(places_file)?;
    tracing::info!(count = places.len(), file = %places_file.display(), "loaded places");
    controller.load_places(places);
    Ok(controller)
}

fn print_catalog(controller: &TourController, json: bool, out: &mut impl Write) -> Result<()> {
    let classifier = controller.classifier();
    let rows = controller.catalog().ids().iter().filter_map(|&id| {
        let place = controller.place(id)?;
        Some((id, place, classifier.group_slug(place), classifier.resolve_panorama_path(place)))
    });

    if json {
        let entries: Vec<serde_json::Value> = rows
            .map(|(id, place, group, panorama)| {
                serde_json::json!({
                    "place": id,
                    "name": place.display_name(),
                    "group": group,
                    "panorama": panorama,
                })
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }

    for (pos, (id, place, group, panorama)) in rows.enumerate() {
        writeln!(
            out,
            "{:>3}  #{:<4} {:<12} {}  {}",
            pos + 1,
            id.index(),
            if group.is_empty() { "-" } else { group.as_str() },
            place.display_name(),
            panorama.unwrap_or_default()
        )?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Browse { places, log_file } => {
            init_tracing(Some(&log_file))?;
            let controller = controller_for(&places, cli.config.as_deref())?;
            let mut browser = renderer::Browser::new(controller, renderer::asset_dir_for(&places));
            renderer::run_browser(&mut browser)?;
            tracing::info!(last = ?browser.controller().current(), "browser closed");
        }
        Command::Catalog { places, json } => {
            init_tracing(None)?;
            let controller = controller_for(&places, cli.config.as_deref())?;
            print_catalog(&controller, json, &mut io::stdout().lock())?;
        }
        Command::Thumbs { images } => {
            init_tracing(None)?;
            let report = thumbs::generate_all(&images)?;
            writeln!(
                io::stdout().lock(),
                "Total: processed {} file(s), skipped {}",
                report.processed, report.skipped
            )?;
        }
    }
    Ok(())
}
