//! EduSeg - education quality segmentation dashboard
//!
//! A CLI tool that presents pre-computed clustering results of the
//! regencies/cities of a province: summary counters, a map join against
//! the boundary document, the data table, cluster profiles and a radar
//! chart, written out as one report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable result table, bad config, write failure, etc.)
//!   2 - Regions failed to join to the map while --fail-on-mismatch is set

mod analysis;
mod cli;
mod config;
mod dashboard;
mod data;
mod error;
mod geo;
mod models;
mod report;
mod session;

use anyhow::{bail, Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use dashboard::Dashboard;
use models::DashboardReport;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("EduSeg v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .eduseg.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to point at your result table, boundary document and cluster colors.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(args.log_level().into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the dashboard. Returns exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let started = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // Step 1: Load the result table and boundary document
    let data_path = config.data.path.clone();
    println!("📥 Loading clustering results: {}", data_path);
    let dashboard = Dashboard::open(config, !args.no_map)
        .with_context(|| format!("Failed to load result table {}", data_path))?;

    if let Some(e) = dashboard.map_error() {
        if args.require_map {
            bail!("Boundary document unavailable: {}", e);
        }
        println!("⚠️  Map view unavailable: {}", e);
    }

    if args.interactive {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let shown = session::run_session(&dashboard, stdin.lock(), stdout.lock())?;
        info!("Session ended after {} selections", shown);
        return Ok(0);
    }

    // Step 2: Apply the selection
    let view = dashboard.on_filter_changed(args.cluster);
    println!("🔎 Selection: {}", view.selector);

    // Step 3: Build and save the report
    println!("📝 Generating report...");
    let report = dashboard.build_report(&view, started);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = dashboard.config().general.output.clone();
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path))?;

    // Step 4: Side outputs
    if let Some(ref path) = args.map_output {
        write_colored_map(&dashboard, &report, path)?;
    }

    if let Some(ref path) = args.radar_output {
        let svg = report::render_radar_svg(
            &report.profiles,
            &report.indicators,
            &dashboard.palette(),
            &format!("{}: {}", report.metadata.province, report.metadata.selector),
        );
        std::fs::write(path, svg)
            .with_context(|| format!("Failed to write radar chart to {}", path.display()))?;
        println!("📈 Radar chart saved to: {}", path.display());
    }

    print_summary(&report, dashboard.config().general.verbose);
    println!("\n✅ Report saved to: {}", output_path);

    // Check --fail-on-mismatch
    if args.fail_on_mismatch {
        if let Some(ref map) = report.map {
            if map.mismatch_count() > 0 {
                eprintln!(
                    "\n⛔ {} regions could not be joined to the map. Failing (exit code 2).",
                    map.mismatch_count()
                );
                return Ok(2);
            }
        }
    }

    Ok(0)
}

/// Write the boundary document with cluster fill colors.
fn write_colored_map(dashboard: &Dashboard, report: &DashboardReport, path: &Path) -> Result<()> {
    let Some(document) = report
        .map
        .as_ref()
        .and_then(|map| dashboard.colored_geojson(map))
    else {
        warn!("Map view unavailable, not writing {}", path.display());
        return Ok(());
    };

    let content = serde_json::to_string_pretty(&document)
        .context("Failed to serialize colored boundary document")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write colored map to {}", path.display()))?;

    println!("🗺️  Colored map saved to: {}", path.display());
    Ok(())
}

fn print_summary(report: &DashboardReport, verbose: bool) {
    let summary = &report.summary;

    println!("\n📊 Dashboard Summary:");
    println!(
        "   Regions selected: {} of {}",
        summary.selected_regions, summary.total_regions
    );
    println!("   Clusters: {}", summary.cluster_count);
    for profile in report.profiles.iter() {
        println!(
            "   - Cluster {}: {} regions",
            profile.cluster_id, profile.members
        );
    }

    if let Some(ref map) = report.map {
        if map.is_available() {
            println!(
                "   Map: {} of {} regions joined",
                map.matched,
                map.regions.len()
            );
            if verbose {
                for key in &map.unmatched_keys {
                    println!("     ⚠️  no boundary for {:?}", key);
                }
                for key in &map.duplicate_keys {
                    println!("     ⚠️  ambiguous key {:?}", key);
                }
            } else if map.mismatch_count() > 0 {
                println!("   Join mismatches: {}", map.mismatch_count());
            }
        }
    }

    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
