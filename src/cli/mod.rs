//! Command-line interface for the efficiency plotting pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::{self, PlotFamily};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "pump-plots")]
#[command(about = "Pump efficiency charts from test-bench measurements", version)]
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

#[derive(Subcommand)]
enum Commands {
    /// Render every configured chart family
    Plot {
        /// Measurement file (defaults to input.data_file from the config)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Convert the legacy text export to CSV
    Convert {
        /// Legacy text file (defaults to input.legacy_file)
        input: Option<PathBuf>,
        /// CSV file to write (defaults to input.data_file)
        output: Option<PathBuf>,
    },

    /// Print record and group counts without rendering
    Inspect {
        /// Measurement file (defaults to input.data_file from the config)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Write the default configuration as YAML
    InitConfig {
        /// Destination YAML file
        path: PathBuf,
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

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Plot { input } => {
            let input = input.unwrap_or_else(|| config.input.data_file.clone());
            cmd_plot(&input, &config);
        }
        Commands::Convert { input, output } => {
            let input = input.unwrap_or_else(|| config.input.legacy_file.clone());
            let output = output.unwrap_or_else(|| config.input.data_file.clone());
            cmd_convert(&input, &output, &config);
        }
        Commands::Inspect { input } => {
            let input = input.unwrap_or_else(|| config.input.data_file.clone());
            cmd_inspect(&input, &config);
        }
        Commands::InitConfig { path } => {
            cmd_init_config(&path, &config);
        }
    }
}

fn cmd_plot(input: &Path, config: &PipelineConfig) {
    let start = Instant::now();

    println!("Plotting efficiency charts...");
    println!("Input: {}", input.display());
    println!("Output root: {}", config.output.root.display());

    let spinner = create_spinner("Loading measurements...");

    let records = match pipeline::load_records(input, config) {
        Ok(records) => records,
        Err(e) => {
            spinner.finish_and_clear();
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    spinner.set_message("Grouping and building charts...");
    let plan = pipeline::plan_charts(&records, config);

    spinner.set_message(format!("Rendering {} charts...", plan.len()));
    match pipeline::render_plan(&plan, config) {
        Ok(report) => {
            spinner.finish_and_clear();

            let mut items = vec![
                ("Input file", input.display().to_string()),
                ("Records", records.len().to_string()),
            ];
            for family in PlotFamily::ALL {
                if config.render.families.contains(&family) {
                    items.push((family_label(family), plan.count(family).to_string()));
                }
            }
            items.push(("Charts written", report.written.len().to_string()));
            items.push(("Failures", report.failed.len().to_string()));
            items.push(("Duration", format!("{:.2?}", start.elapsed())));

            print_summary("Plotting Complete", &items);

            if !report.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Rendering failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn family_label(family: PlotFamily) -> &'static str {
    match family {
        PlotFamily::PressureCurves => "Pressure curves",
        PlotFamily::DisplacementCurves => "Displacement curves",
        PlotFamily::Contours => "Contours",
        PlotFamily::EfficiencyFields => "Efficiency maps",
    }
}

fn cmd_convert(input: &Path, output: &Path, config: &PipelineConfig) {
    use crate::core::writers;

    let start = Instant::now();

    println!("Converting legacy text export...");
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());

    match writers::convert_legacy_text(input, output, config.input.legacy_delimiter_byte()) {
        Ok(rows) => {
            print_summary(
                "Conversion Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", output.display().to_string()),
                    ("Rows written", rows.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Conversion failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_inspect(input: &Path, config: &PipelineConfig) {
    use crate::processors::{distinct_deltaps, group_by_displacement};

    let records = match pipeline::load_records(input, config) {
        Ok(records) => records,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let groups = group_by_displacement(&records);
    let labels: Vec<String> = groups.keys().map(|disp| format!("{} cc/rev", disp)).collect();
    let mut items = vec![("Records", records.len().to_string())];

    for ((_, members), label) in groups.iter().zip(&labels) {
        let dps = distinct_deltaps(members);
        let span = match (dps.first(), dps.last()) {
            (Some(lo), Some(hi)) => format!("{} rows, Δp {}-{} MPa", members.len(), lo, hi),
            _ => format!("{} rows", members.len()),
        };
        items.push((label.as_str(), span));
    }

    print_summary(&format!("Measurements in {}", input.display()), &items);
}

fn cmd_init_config(path: &Path, config: &PipelineConfig) {
    match config.to_yaml(path) {
        Ok(()) => println!("Wrote configuration to {}", path.display()),
        Err(e) => {
            error!("Failed to write config to {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
