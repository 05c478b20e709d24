use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hipprobe::hip::{
    self, ArrayExtent, ArrayRuntime, DummyConfig, DummyRuntime, MemInfo, Platform,
};
use hipprobe::logging::{self, LogLevel, LoggingConfig};
use hipprobe::probe::{self, ProbeReport, SuiteReport};
use hipprobe::{ProbeConfig, ProbeError};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "hipprobe", version)]
#[command(about = "Check hipMallocArray against its documented contract", long_about = None)]
struct Cli {
    /// Runtime to probe
    #[arg(long, value_enum, default_value_t = Backend::Hip)]
    backend: Backend,

    /// Number of devices exposed by the dummy backend
    #[arg(long, default_value_t = 1)]
    dummy_devices: i32,

    /// Arrays allocated per geometry in the size sweep
    #[arg(long)]
    count: Option<usize>,

    /// Override the platform used for conditional expectations
    #[arg(long)]
    platform: Option<Platform>,

    /// Print reports as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// libamdhip64 (requires the `rocm` feature)
    Hip,
    /// Host-only accounting runtime
    Dummy,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List visible devices and their memory
    Devices,
    /// Allocate/free many arrays per geometry on one device
    Sweep {
        #[arg(long, default_value_t = 0)]
        device: i32,
        /// Extra geometry as WIDTHxHEIGHT (repeatable); replaces the defaults
        #[arg(long = "geometry", value_parser = parse_extent)]
        geometries: Vec<ArrayExtent>,
    },
    /// Invalid-input expectations
    Negative,
    /// Allocate and free a small array per element type
    Basic,
    /// Size sweep on every device concurrently
    MultiDevice,
    /// All probes
    All,
}

#[derive(Debug, Serialize)]
struct DeviceInfo {
    device: i32,
    #[serde(flatten)]
    memory: MemInfo,
}

fn parse_extent(s: &str) -> Result<ArrayExtent, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w.trim().parse().map_err(|e| format!("bad width '{}': {}", w, e))?;
    let height = h.trim().parse().map_err(|e| format!("bad height '{}': {}", h, e))?;
    Ok(ArrayExtent::new(width, height))
}

fn open_runtime(cli: &Cli) -> anyhow::Result<Box<dyn ArrayRuntime>> {
    match cli.backend {
        Backend::Hip => hip::open_hip_runtime().context("failed to open HIP runtime"),
        Backend::Dummy => Ok(Box::new(DummyRuntime::with_config(DummyConfig {
            device_count: cli.dummy_devices,
            ..DummyConfig::default()
        }))),
    }
}

fn probe_config(cli: &Cli) -> anyhow::Result<ProbeConfig> {
    let mut config = ProbeConfig::from_env().context("invalid HIPPROBE_* environment")?;
    if let Some(count) = cli.count {
        config = config.with_array_count(count);
    }
    if let Some(platform) = cli.platform {
        config = config.with_platform(platform);
    }
    if let Commands::Sweep { geometries, .. } = &cli.command {
        if !geometries.is_empty() {
            config = config.with_geometries(geometries.clone());
        }
    }
    config.validate()?;
    Ok(config)
}

fn emit<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", value);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let runtime = open_runtime(&cli)?;
    let runtime = runtime.as_ref();
    let config = probe_config(&cli)?;

    let report: ProbeReport = match &cli.command {
        Commands::Devices => {
            let mut infos = Vec::new();
            for device in hip::devices(runtime)? {
                runtime.set_device(device)?;
                infos.push(DeviceInfo {
                    device,
                    memory: runtime.mem_get_info()?,
                });
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else {
                for info in &infos {
                    println!(
                        "device {}: {} / {} MB available",
                        info.device,
                        info.memory.available_mb(),
                        info.memory.total_mb()
                    );
                }
            }
            return Ok(true);
        }
        Commands::Sweep { device, .. } => probe::run_size_sweep(runtime, *device, &config)?,
        Commands::Negative => probe::run_negative(runtime, &config)?,
        Commands::Basic => probe::run_basic(runtime, &config)?,
        Commands::MultiDevice => probe::run_multi_device(runtime, &config)?,
        Commands::All => {
            let suite: SuiteReport = probe::run_suite(runtime, &config)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&suite)?);
            } else {
                for report in &suite.reports {
                    emit(report, false)?;
                }
                println!("{} failure(s)", suite.failure_count());
            }
            return Ok(suite.passed());
        }
    };

    emit(&report, cli.json)?;
    Ok(report.passed())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut log_config = LoggingConfig::from_env().unwrap_or_default();
    if cli.verbose > 0 {
        log_config = log_config.with_level(LogLevel::from_verbosity(cli.verbose));
    }
    if let Err(e) = logging::init_with_config(&log_config) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            match e.downcast_ref::<ProbeError>() {
                Some(probe_error) => eprintln!("error ({}): {:#}", probe_error.category(), e),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::from(2)
        }
    }
}
