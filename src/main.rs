use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use episim::json::load_model;
use episim::report::{
    chart_artifact, csv_artifact, write_artifacts, ChartOptions, ImageFormat, RunSummary,
};
use episim::{Model, ModelLibrary, SimulationConfig, Validator, DEFAULT_STEP_SIZE};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Extra directory of model descriptions, searched after the built-ins
    #[arg(long, global = true)]
    library: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a model and save the chart
    Run(RunArgs),
    /// Check a model description without simulating it
    Validate {
        /// Model description file or library model ID
        model: String,

        /// Require an initial value and a derivative for every compartment
        #[arg(long)]
        strict: bool,
    },
    /// List the models in the library
    List,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Model description file or library model ID
    model: String,

    /// Simulation horizon; asked for on stdin when omitted
    #[arg(short = 'T', long)]
    horizon: Option<String>,

    /// Fixed integration step size
    #[arg(long, env = "EPISIM_STEP_SIZE", default_value_t = DEFAULT_STEP_SIZE)]
    dt: f64,

    /// Directory the chart (and CSV) are written to
    #[arg(short, long, env = "EPISIM_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Chart format: svg or png
    #[arg(short, long, default_value_t = ImageFormat::Svg)]
    format: ImageFormat,

    /// Also write the trajectory as CSV
    #[arg(long)]
    csv: bool,

    /// Print final and peak values of every compartment
    #[arg(long)]
    summary: bool,

    /// Require an initial value and a derivative for every compartment
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut library = ModelLibrary::builtin();
    if let Some(dir) = &cli.library {
        library
            .load_dir(dir)
            .with_context(|| format!("loading models from {}", dir.display()))?;
    }

    match cli.command {
        Command::Run(args) => run(args, &library),
        Command::Validate { model, strict } => validate(&model, strict, &library),
        Command::List => {
            list(&library);
            Ok(())
        }
    }
}

fn validator(strict: bool) -> Validator {
    if strict {
        Validator::strict()
    } else {
        Validator::new()
    }
}

fn run(args: RunArgs, library: &ModelLibrary) -> Result<()> {
    let validated = load_model(&args.model, library, &validator(args.strict))
        .with_context(|| format!("loading model '{}'", args.model))?;

    let horizon = match &args.horizon {
        Some(input) => SimulationConfig::parse_horizon(input)?,
        None => prompt_horizon()?,
    };
    let config = SimulationConfig::new(horizon, args.dt)?;

    let model = Model::new(&validated);
    let trajectory = episim::simulate(&model, config)?;

    // Everything is rendered before anything is written
    let options = ChartOptions::default().with_format(args.format);
    let mut artifacts = vec![chart_artifact(&trajectory, &options)?];
    if args.csv {
        artifacts.push(csv_artifact(&trajectory)?);
    }
    let written = write_artifacts(&args.output_dir, &artifacts)?;
    info!(files = written.len(), dir = %args.output_dir.display(), "output written");

    if let Some(csv) = written.get(1) {
        println!("Trajectory saved as '{}'", csv.display());
    }
    if args.summary {
        println!("{}", RunSummary::from_trajectory(&trajectory));
    }

    if let Some(chart) = written.first() {
        println!("Simulation complete! Graph saved as '{}'", chart.display());
    }
    Ok(())
}

fn prompt_horizon() -> Result<f64> {
    print!("Enter simulation time (e.g., 10 for 10 years): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading the simulation time")?;
    Ok(SimulationConfig::parse_horizon(&line)?)
}

fn validate(source: &str, strict: bool, library: &ModelLibrary) -> Result<()> {
    let validated = load_model(source, library, &validator(strict))
        .with_context(|| format!("validating '{}'", source))?;

    println!(
        "Model '{}' is valid: {} compartments, {} parameters",
        validated.inner().display_name(),
        validated.compartments().len(),
        validated.parameters().len()
    );
    if !validated.defaulted().is_empty() {
        println!(
            "Defaulted initial value or derivative for: {}",
            validated.defaulted().join(", ")
        );
    }
    Ok(())
}

fn list(library: &ModelLibrary) {
    for id in library.list() {
        let Some(model) = library.get(id) else {
            continue;
        };
        let summary = model
            .display
            .as_ref()
            .and_then(|d| d.summary.as_deref())
            .unwrap_or("");
        println!("{:<18} {:>3} compartments  {}", id, model.num_states(), summary);
    }
}
