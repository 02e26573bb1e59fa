//! Command-line interface for the numerology planner.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::loaders::{load_overpass_json, load_scenarios_csv, OverpassResponse};
use crate::core::model::{Coordinate, Evaluation};
use crate::core::writers::{write_configs_csv, write_evaluation_json};
use crate::overpass::{fetch_around, OverpassClient};
use crate::processors::{classify_with, evaluate_responses, validate_inputs};
use crate::processors::extract::{convert_file, extract_area, ExtractTarget};
use crate::PlannerConfig;

#[derive(Parser)]
#[command(name = "numerology-planner")]
#[command(about = "Suggest 5G numerology settings from OpenStreetMap data", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExtractMode {
    /// Query a named OSM area
    Static,
    /// Query a circle around a coordinate
    Dynamic,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch map data around a coordinate and suggest a configuration
    Estimate {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Search radius in meters
        #[arg(short, long)]
        radius: Option<u32>,
        /// Write the evaluation as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Suggest a configuration from saved Overpass JSON files
    Evaluate {
        /// Overpass JSON with highway ways
        #[arg(long)]
        roads: Option<PathBuf>,
        /// Overpass JSON with building ways and relations
        #[arg(long)]
        buildings: Option<PathBuf>,
        /// Radius in meters the files were queried with
        #[arg(short, long)]
        radius: Option<f64>,
        /// Write the evaluation as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify pre-computed area statistics
    Classify {
        /// Average speed limit in km/h
        #[arg(long, required_unless_present = "input")]
        speed: Option<f64>,
        /// Population density in people/km²
        #[arg(long, required_unless_present = "input")]
        density: Option<f64>,
        /// Average floor count
        #[arg(long, default_value_t = 1.0)]
        floors: f64,
        /// CSV with avg_speed, population_density, avg_floors columns
        #[arg(short, long, conflicts_with_all = ["speed", "density"])]
        input: Option<PathBuf>,
        /// Output CSV for batch classification
        #[arg(short, long, requires = "input")]
        output: Option<PathBuf>,
    },

    /// Fetch OSM data and save it as JSON and GeoJSON
    Extract {
        /// Query mode
        #[arg(long, value_enum, default_value_t = ExtractMode::Static)]
        mode: ExtractMode,
        /// Area name for static mode
        #[arg(long)]
        area: Option<String>,
        /// Latitude for dynamic mode
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude for dynamic mode
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Search radius in meters for dynamic mode
        #[arg(short, long)]
        radius: Option<u32>,
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Convert a saved Overpass JSON file to GeoJSON
    Geojson {
        /// Overpass JSON file
        input: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn evaluation_items(evaluation: &Evaluation) -> Vec<(&'static str, String)> {
    let mut items = Vec::with_capacity(10);
    if let Some(coordinate) = evaluation.coordinate {
        items.push(("Coordinate", format!("{}, {}", coordinate.lat, coordinate.lon)));
    }
    items.extend([
        ("Radius", format!("{} m", evaluation.radius_m)),
        ("Roads", evaluation.features.road_count.to_string()),
        ("Avg speed", format!("{:.1} km/h", evaluation.features.avg_speed)),
        ("Buildings", evaluation.features.building_count.to_string()),
        ("Avg floors", format!("{:.2}", evaluation.features.avg_floors)),
        ("Density", format!("{:.1} people/km²", evaluation.population_density)),
        ("Area type", evaluation.config.area_type.to_string()),
        ("Frequency", evaluation.config.frequency.to_string()),
        (
            "Subcarrier",
            format!(
                "{} (mu={})",
                evaluation.config.subcarrier,
                evaluation.config.subcarrier.numerology()
            ),
        ),
        ("Cyclic prefix", evaluation.config.cyclic_prefix.to_string()),
    ]);
    items
}

fn load_config(path: Option<&Path>) -> PlannerConfig {
    match path {
        Some(path) => match PlannerConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PlannerConfig::default()
            }
        },
        None => PlannerConfig::default(),
    }
}

fn require_coordinate(lat: Option<f64>, lon: Option<f64>) -> Result<Coordinate> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)?),
        _ => bail!("Missing lat/lon: both --lat and --lon are required"),
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Estimate { lat, lon, radius, output } => {
            cmd_estimate(lat, lon, radius, output.as_deref(), &config)
        }
        Commands::Evaluate { roads, buildings, radius, output } => cmd_evaluate(
            roads.as_deref(),
            buildings.as_deref(),
            radius,
            output.as_deref(),
            &config,
        ),
        Commands::Classify { speed, density, floors, input, output } => {
            cmd_classify(speed, density, floors, input.as_deref(), output.as_deref(), &config)
        }
        Commands::Extract { mode, area, lat, lon, radius, output_dir } => {
            cmd_extract(mode, area, lat, lon, radius, output_dir, &config)
        }
        Commands::Geojson { input, output } => cmd_geojson(&input, &output),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn cmd_estimate(
    lat: Option<f64>,
    lon: Option<f64>,
    radius: Option<u32>,
    output: Option<&Path>,
    config: &PlannerConfig,
) -> Result<()> {
    let start = Instant::now();
    let center = require_coordinate(lat, lon)?;
    let radius = radius.unwrap_or(config.query.estimate_radius_m);

    // Density is spread over the same circle that was queried
    let mut config = config.clone();
    config.density.radius_m = f64::from(radius);

    let client = OverpassClient::from_config(&config.query);
    println!("Querying {} for {} m around {}, {}", client.url(), radius, center.lat, center.lon);

    let spinner = create_spinner("Fetching roads and buildings...");
    let fetched = fetch_around(&client, center, radius);
    spinner.finish_and_clear();

    let (roads, buildings) = fetched.into_available();
    let evaluation =
        evaluate_responses(roads.as_ref(), buildings.as_ref(), Some(center), &config)?;

    finish_evaluation("Estimate Complete", &evaluation, output, start)
}

fn cmd_evaluate(
    roads: Option<&Path>,
    buildings: Option<&Path>,
    radius: Option<f64>,
    output: Option<&Path>,
    config: &PlannerConfig,
) -> Result<()> {
    let start = Instant::now();

    if roads.is_none() && buildings.is_none() {
        bail!("Provide at least one of --roads or --buildings");
    }

    let load = |path: Option<&Path>| -> Result<Option<OverpassResponse>> {
        path.map(|p| {
            load_overpass_json(p)
                .with_context(|| format!("Failed to load Overpass JSON: {}", p.display()))
        })
        .transpose()
    };
    let road_data = load(roads)?;
    let building_data = load(buildings)?;
    for (path, data) in [(roads, &road_data), (buildings, &building_data)] {
        let remark = data.as_ref().and_then(OverpassResponse::runtime_error);
        if let (Some(path), Some(remark)) = (path, remark) {
            bail!("{} holds a truncated Overpass result: {}", path.display(), remark);
        }
    }

    let mut config = config.clone();
    if let Some(radius) = radius {
        config.density.radius_m = radius;
    }

    let evaluation =
        evaluate_responses(road_data.as_ref(), building_data.as_ref(), None, &config)?;

    finish_evaluation("Evaluation Complete", &evaluation, output, start)
}

fn finish_evaluation(
    title: &str,
    evaluation: &Evaluation,
    output: Option<&Path>,
    start: Instant,
) -> Result<()> {
    if let Some(path) = output {
        write_evaluation_json(path, evaluation)?;
        info!("Wrote evaluation to {}", path.display());
    }

    let mut items = evaluation_items(evaluation);
    if let Some(path) = output {
        items.push(("Output", path.display().to_string()));
    }
    items.push(("Duration", format!("{:.2?}", start.elapsed())));
    print_summary(title, &items);
    Ok(())
}

fn cmd_classify(
    speed: Option<f64>,
    density: Option<f64>,
    floors: f64,
    input: Option<&Path>,
    output: Option<&Path>,
    config: &PlannerConfig,
) -> Result<()> {
    let thresholds = &config.thresholds;

    let Some(input) = input else {
        let (Some(speed), Some(density)) = (speed, density) else {
            bail!("--speed and --density are required without --input");
        };
        validate_inputs(speed, density, floors)?;
        let radio = classify_with(speed, density, floors, thresholds);

        print_summary(
            "Classification",
            &[
                ("Avg speed", format!("{} km/h", speed)),
                ("Density", format!("{} people/km²", density)),
                ("Avg floors", floors.to_string()),
                ("Area type", radio.area_type.to_string()),
                ("Frequency", radio.frequency.to_string()),
                ("Subcarrier", radio.subcarrier.to_string()),
                ("Cyclic prefix", radio.cyclic_prefix.to_string()),
            ],
        );
        return Ok(());
    };

    let scenarios = load_scenarios_csv(input)
        .with_context(|| format!("Failed to load scenarios: {}", input.display()))?;

    let mut configs = Vec::with_capacity(scenarios.len());
    for (row, s) in scenarios.iter().enumerate() {
        validate_inputs(s.avg_speed, s.population_density, s.avg_floors)
            .with_context(|| format!("Row {} of {}", row + 1, input.display()))?;
        configs.push(classify_with(
            s.avg_speed,
            s.population_density,
            s.avg_floors,
            thresholds,
        ));
    }

    match output {
        Some(path) => {
            write_configs_csv(path, &scenarios, &configs)?;
            print_summary(
                "Batch Classification Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", path.display().to_string()),
                    ("Rows", configs.len().to_string()),
                ],
            );
        }
        None => {
            for (s, c) in scenarios.iter().zip(&configs) {
                println!(
                    "{:>8.1} km/h {:>10.1}/km² {:>5.1} fl -> {:<13} {:<7} {:<6} {}",
                    s.avg_speed,
                    s.population_density,
                    s.avg_floors,
                    c.area_type,
                    c.frequency,
                    c.subcarrier,
                    c.cyclic_prefix
                );
            }
        }
    }

    Ok(())
}

fn cmd_extract(
    mode: ExtractMode,
    area: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    radius: Option<u32>,
    output_dir: Option<PathBuf>,
    config: &PlannerConfig,
) -> Result<()> {
    let start = Instant::now();

    let target = match mode {
        ExtractMode::Static => {
            ExtractTarget::Named(area.unwrap_or_else(|| config.query.default_area.clone()))
        }
        ExtractMode::Dynamic => {
            if lat.is_none() || lon.is_none() {
                bail!("Dynamic mode requires --lat and --lon arguments.");
            }
            ExtractTarget::Around {
                center: require_coordinate(lat, lon)?,
                radius_m: radius.unwrap_or(config.query.extract_radius_m),
            }
        }
    };

    let output_dir =
        output_dir.unwrap_or_else(|| PathBuf::from(&config.output.directory));
    let client = OverpassClient::from_config(&config.query);

    let spinner = create_spinner("Fetching OSM data...");
    let files = extract_area(&client, &target, &output_dir);
    spinner.finish_and_clear();
    let files = files?;

    let mut items: Vec<(&str, String)> = vec![("Output directory", output_dir.display().to_string())];
    for file in &files {
        items.push((file.kind.file_stem(), format!("{} elements", file.elements)));
        items.push(("  GeoJSON", file.geojson_path.display().to_string()));
        items.push(("  Features", file.features.to_string()));
    }
    items.push(("Duration", format!("{:.2?}", start.elapsed())));
    print_summary("Extraction Complete", &items);
    Ok(())
}

fn cmd_geojson(input: &Path, output: &Path) -> Result<()> {
    let start = Instant::now();
    let features = convert_file(input, output)?;

    print_summary(
        "GeoJSON Conversion Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output file", output.display().to_string()),
            ("Features", features.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}
