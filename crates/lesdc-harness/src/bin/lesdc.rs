//! CLI entrypoint for the LES data center simulation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};

use lesdc_harness::fixture::{self, load_fixture, write_fixture};
use lesdc_harness::structured_log::validate_log_file;
use lesdc_harness::{Driver, DriverOptions, LogEmitter, OutputFormat, RunReport};
use lesdc_sim::{CompressionSource, SimConfig};

/// LES/CEML energy simulation over a synthetic data center workload.
#[derive(Debug, Parser)]
#[command(name = "lesdc")]
#[command(about = "Compare basic and LES/CEML-optimized energy policies")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the simulation and print the final report.
    Run {
        /// Requests per tick (overrides LESDC_BATCH_SIZE).
        #[arg(long)]
        batch_size: Option<usize>,
        /// Compression entropy source: `faithful` or `per-text` (overrides LESDC_MODE).
        #[arg(long)]
        mode: Option<String>,
        /// Delay between ticks in milliseconds.
        #[arg(long, default_value_t = 0)]
        tick_ms: u64,
        /// Pause after this many ticks.
        #[arg(long)]
        max_ticks: Option<usize>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Also log one debug event per request.
        #[arg(long)]
        trace_requests: bool,
        /// Report format: `plain` (default) or `json`.
        #[arg(long, default_value = "plain")]
        format: String,
        /// Report output path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Suppress the live feed on stderr.
        #[arg(long)]
        quiet: bool,
    },
    /// Capture a deterministic full-run fixture.
    Snapshot {
        /// Output path for fixture JSON.
        #[arg(long)]
        output: PathBuf,
        /// Requests per tick (overrides LESDC_BATCH_SIZE).
        #[arg(long)]
        batch_size: Option<usize>,
        /// Compression entropy source (overrides LESDC_MODE).
        #[arg(long)]
        mode: Option<String>,
        /// Record every Nth step.
        #[arg(long, default_value_t = 10)]
        stride: usize,
    },
    /// Diff two run fixtures (golden vs current).
    DiffSnapshot {
        /// Golden fixture path.
        #[arg(long)]
        golden: PathBuf,
        /// Current fixture path (if omitted, one is built in-memory with the golden scenario).
        #[arg(long)]
        current: Option<PathBuf>,
        /// Exit non-zero when any field drifts past its alert threshold.
        #[arg(long)]
        fail_on_alert: bool,
    },
    /// Validate a structured JSONL log.
    ValidateLog {
        /// JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn resolve_config(
    batch_size: Option<usize>,
    mode: Option<&str>,
) -> Result<SimConfig, Box<dyn std::error::Error>> {
    let mut config = SimConfig::from_env_strict()?;
    if let Some(size) = batch_size {
        if size == 0 {
            return Err("--batch-size must be a positive integer".into());
        }
        config.batch_size = size;
    }
    if let Some(raw) = mode {
        config.compression_source = CompressionSource::parse(raw)
            .ok_or_else(|| format!("unsupported --mode '{raw}', expected faithful|per-text"))?;
    }
    Ok(config)
}

fn write_output(path: Option<&Path>, body: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, body)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

fn run_id(config: &SimConfig) -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!(
        "lesdc-{}-b{}-{secs}",
        config.compression_source.as_str(),
        config.batch_size
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            batch_size,
            mode,
            tick_ms,
            max_ticks,
            log,
            trace_requests,
            format,
            output,
            quiet,
        } => {
            let format = OutputFormat::parse(&format)?;
            let config = resolve_config(batch_size, mode.as_deref())?;
            let options = DriverOptions {
                tick: Duration::from_millis(tick_ms),
                max_ticks,
                trace_requests,
            };
            let mut driver = Driver::new(config, options);
            if let Some(path) = &log {
                let emitter = LogEmitter::to_file(path, &run_id(&config))?;
                eprintln!("Logging to {}", path.display());
                driver = driver.with_emitter(emitter);
            }

            eprintln!(
                "Running {} requests, batch size {}, {} mode",
                driver.simulation().sequence().len(),
                config.batch_size,
                config.compression_source.as_str()
            );
            let outcome = driver.run(|snap, _| {
                if !quiet {
                    eprintln!(
                        "[{:>3.0}%] {}  ({})",
                        snap.progress() * 100.0,
                        snap.description(),
                        snap.details()
                    );
                }
            })?;
            if !quiet {
                eprintln!();
                eprint!("{}", driver.trail().render());
            }
            if outcome.paused {
                eprintln!(
                    "Paused after {} ticks at cursor {}",
                    outcome.ticks, outcome.summary.cursor
                );
            }

            let sim = driver.simulation();
            let report = RunReport::new(
                sim.config(),
                outcome.summary,
                sim.sequence().len(),
                driver.total_ticks(),
            );
            write_output(output.as_deref(), &report.render(format)?)?;
        }
        Command::Snapshot {
            output,
            batch_size,
            mode,
            stride,
        } => {
            let config = resolve_config(batch_size, mode.as_deref())?;
            let fixture = fixture::build_run_fixture(&config, stride)?;
            let digest = write_fixture(&output, &fixture)?;
            eprintln!(
                "Captured {} steps ({} calls) to {}",
                fixture.step_lines.len(),
                fixture.scenario.calls,
                output.display()
            );
            println!("sha256 {digest}");
        }
        Command::DiffSnapshot {
            golden,
            current,
            fail_on_alert,
        } => {
            let golden_fixture = load_fixture(&golden)?;
            let current_fixture = match &current {
                Some(path) => load_fixture(path)?,
                None => {
                    let mode = CompressionSource::parse(&golden_fixture.scenario.mode)
                        .ok_or_else(|| {
                            format!("golden fixture has unknown mode '{}'", golden_fixture.scenario.mode)
                        })?;
                    let config = SimConfig::with_batch_size(golden_fixture.scenario.batch_size)
                        .with_compression_source(mode);
                    fixture::build_run_fixture(&config, golden_fixture.scenario.stride)?
                }
            };
            let report = fixture::diff_fixtures(&golden_fixture, &current_fixture);
            print!("{}", fixture::render_plain(&report));
            println!(
                "golden sha256  {}\ncurrent sha256 {}",
                fixture::fixture_digest(&golden_fixture)?,
                fixture::fixture_digest(&current_fixture)?
            );
            if fail_on_alert && report.alerts() > 0 {
                return Err(format!("{} field(s) drifted past alert thresholds", report.alerts()).into());
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            if errors.is_empty() {
                println!("{}: {lines} lines OK", log.display());
            } else {
                for err in &errors {
                    eprintln!("{err}");
                }
                return Err(format!(
                    "{}: {} error(s) across {lines} lines",
                    log.display(),
                    errors.len()
                )
                .into());
            }
        }
    }

    Ok(())
}
