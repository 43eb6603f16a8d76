mod output;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use output::{FrameRow, Summary};
use plume_core::{
    DiffusionSolver, SimulationConfig, SimulationState, SweepDomain, calibrate, sample,
};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about = "Point-source pollutant diffusion, explicit scheme")]
struct Args {
    /// JSON config file; missing fields take the reference defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid size N (NxN)
    #[arg(long)]
    size: Option<usize>,

    /// Number of time steps
    #[arg(long)]
    iterations: Option<usize>,

    /// Dirichlet value on the border
    #[arg(long, allow_negative_numbers = true)]
    boundary: Option<f64>,

    /// Emission rate Q added at the source every step
    #[arg(long, allow_negative_numbers = true)]
    emission: Option<f64>,

    /// Source column
    #[arg(long)]
    source_x: Option<usize>,

    /// Source row
    #[arg(long)]
    source_y: Option<usize>,

    /// Cells updated by each sweep
    #[arg(long, value_enum)]
    sweep_domain: Option<DomainArg>,

    /// Output directory for field.bin / summary.json (nothing is written without it)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also dump every k-th layer to frames.bin + frames.jsonl (0 = off)
    #[arg(long, default_value_t = 0)]
    snapshot_every: usize,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DomainArg {
    Interior,
    Truncated,
}

impl From<DomainArg> for SweepDomain {
    fn from(d: DomainArg) -> Self {
        match d {
            DomainArg::Interior => SweepDomain::Interior,
            DomainArg::Truncated => SweepDomain::Truncated,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(args.log_level))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cfg = load_config(&args)?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let calibration = calibrate(&cfg.physics, &cfg.calibration)?;
    let mut state = SimulationState::initialize(&cfg)?;
    let solver = DiffusionSolver::new(&cfg, &calibration)?;
    sample(state.latest(), &cfg.source, cfg.probe_offsets)?;

    let mut frames = match (&args.out, args.snapshot_every) {
        (Some(dir), k) if k > 0 => {
            fs::create_dir_all(dir)?;
            Some(output::FrameWriter::create(dir)?)
        }
        (None, k) if k > 0 => {
            warn!("--snapshot-every has no effect without --out");
            None
        }
        _ => None,
    };

    for step in 1..=cfg.iterations {
        solver.sweep(&mut state)?;

        if let Some(frames) = frames.as_mut() {
            if step % args.snapshot_every == 0 {
                let grid = state.latest();
                let row = FrameRow {
                    step,
                    time: step as f64 * cfg.physics.time_step,
                    source_value: grid[(cfg.source.y, cfg.source.x)],
                    readings: sample(grid, &cfg.source, cfg.probe_offsets)?,
                };
                frames.push(grid, &row)?;
            }
        }
    }

    if let Some(frames) = frames {
        let written = frames.finish()?;
        info!(frames = written, "snapshots written");
    }

    let grid = state.latest();
    let readings = sample(grid, &cfg.source, cfg.probe_offsets)?;
    info!(steps = state.step_count(), "simulation finished");

    for (i, r) in readings.iter().enumerate() {
        println!(
            "Concentration at point {} ({}, {}): {}",
            i + 1,
            r.row,
            r.col,
            r.concentration
        );
    }
    println!("Stability bound: {}", calibration.stability);
    println!("lambda: {}", cfg.physics.diffusivity);
    println!("rho: {}", cfg.physics.density);
    println!("c: {}", cfg.physics.specific_heat);
    println!("tau: {}", cfg.physics.time_step);
    println!("h: {}", calibration.h);

    if let Some(dir) = &args.out {
        fs::create_dir_all(dir)?;

        let mut field = BufWriter::new(File::create(dir.join("field.bin"))?);
        output::write_f64_vec(&mut field, grid.cells())?;
        field.flush()?;

        let summary = Summary {
            n: grid.n(),
            steps: state.step_count(),
            h: calibration.h,
            stability: calibration.stability,
            coefficient: solver.coefficient(),
            readings,
            config: &cfg,
        };
        let mut f = BufWriter::new(File::create(dir.join("summary.json"))?);
        serde_json::to_writer_pretty(&mut f, &summary)?;
        f.write_all(b"\n")?;
        f.flush()?;

        println!("Wrote results to: {}", dir.display());
    }

    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<SimulationConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if let Some(n) = args.size {
        cfg.grid_size = n;
    }
    if let Some(it) = args.iterations {
        cfg.iterations = it;
    }
    if let Some(t) = args.boundary {
        cfg.boundary_value = t;
    }
    if let Some(q) = args.emission {
        cfg.source.emission_rate = q;
    }
    if let Some(x) = args.source_x {
        cfg.source.x = x;
    }
    if let Some(y) = args.source_y {
        cfg.source.y = y;
    }
    if let Some(d) = args.sweep_domain {
        cfg.sweep_domain = d.into();
    }

    cfg.validate()?;
    Ok(cfg)
}
