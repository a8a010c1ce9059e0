use std::{
    io::{BufWriter, Write as _},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "flycart", version)]
struct Cli {
    /// Log orchestrator internals to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay trigger presses from a JSON config and print host events as JSON lines.
    Simulate(SimulateArgs),
    /// Print sampled (x, y) pairs of an easing curve.
    Ease(EaseArgs),
    /// List named easing presets.
    Presets,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Simulation config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Override the display refresh rate from the config.
    #[arg(long)]
    fps: Option<u32>,

    /// Include per-run flight frames in the output.
    #[arg(long)]
    frames: bool,
}

#[derive(Parser, Debug)]
struct EaseArgs {
    /// Preset name or `x1,y1,x2,y2`.
    #[arg(long)]
    curve: String,

    /// Number of intervals between 0 and 1.
    #[arg(long, default_value_t = 10)]
    steps: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "flycart=debug" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Ease(args) => cmd_ease(args),
        Command::Presets => cmd_presets(),
    }
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let mut cfg = flycart::SimulationConfig::load(&args.config)
        .with_context(|| format!("load simulation '{}'", args.config.display()))?;
    if let Some(fps) = args.fps {
        cfg.fps = fps;
    }

    let report = flycart::simulate(&cfg, args.frames)?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for event in &report.events {
        serde_json::to_writer(&mut out, event).context("serialize event")?;
        writeln!(out)?;
    }
    out.flush()?;

    eprintln!(
        "settled at {:.1} ms ({} batches)",
        report.finished_ms,
        report.batches.len()
    );
    Ok(())
}

fn parse_curve(s: &str) -> anyhow::Result<flycart::CubicBezier> {
    if let Some(curve) = flycart::CubicBezier::preset(s) {
        return Ok(curve);
    }
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parse curve '{s}'"))?;
    let &[x1, y1, x2, y2] = parts.as_slice() else {
        anyhow::bail!("curve '{s}' is neither a preset nor four comma-separated numbers");
    };
    Ok(flycart::CubicBezier::new(x1, y1, x2, y2)?)
}

fn cmd_ease(args: EaseArgs) -> anyhow::Result<()> {
    let curve = parse_curve(&args.curve)?;
    let steps = args.steps.max(1);
    println!("# {curve}");
    for i in 0..=steps {
        let x = f64::from(i) / f64::from(steps);
        println!("{x:.4}\t{:.4}", curve.sample(x));
    }
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    for (name, curve) in flycart::CubicBezier::presets() {
        println!("{name:<18} {curve}");
    }
    Ok(())
}
