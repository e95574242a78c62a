use anyhow::{Context, Result};
use channoise_core::{init_logging, AppConfig, WriterSink};
use channoise_lib::model::{Simulation, SimulationSnapshot, VoltageProtocol};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of steps to run (overrides config)
    #[arg(short, long)]
    steps: Option<u64>,

    /// Random seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Advance nodes on all cores
    #[arg(long)]
    parallel: bool,

    /// Write one JSON step report per line
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write human-readable per-step state dumps
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Resume from a snapshot file
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Write a snapshot at the end of the run
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(steps) = args.steps {
        config.simulation.steps = steps;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if args.parallel {
        config.simulation.parallel = true;
    }
    config.validate()?;

    let protocol = VoltageProtocol::from(&config.protocol);
    let steps = config.simulation.steps;

    let mut sim = match &args.resume {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let snapshot: SimulationSnapshot = serde_json::from_reader(std::io::BufReader::new(file))
                .with_context(|| format!("parsing snapshot {}", path.display()))?;
            Simulation::from_snapshot(config, snapshot)?
        }
        None => Simulation::new(config)?,
    };
    if let Some(path) = &args.dump {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        sim = sim.with_diagnostics(Box::new(WriterSink::new(BufWriter::new(file))));
    }

    let mut output = match &args.output {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let summary = sim.run(&protocol, steps, |report| {
        if let Some(out) = output.as_mut() {
            serde_json::to_writer(&mut *out, report)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    })?;
    if let Some(out) = output.as_mut() {
        out.flush()?;
    }

    if let Some(path) = &args.snapshot {
        std::fs::write(path, sim.snapshot_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
