use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use wr_graph::DotSettings;
use wr_project::{
    ExchangeDef, Overrides, Scenario, StrategyDef, build_orchestrator, load_scenario, run_sweep, sweep_csv,
};
use wr_relax::SweepOrder;
use wr_results::{RunManifest, RunStore, compute_run_id, timeseries_records};

const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "wr-cli")]
#[command(about = "Partitioned transient simulation by waveform relaxation", long_about = None)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario syntax and structure
    Validate {
        /// Path to the scenario file (.yaml, .yml or .json)
        scenario_path: PathBuf,
    },
    /// Print the coupling graph in DOT format
    Graph {
        /// Path to the scenario file
        scenario_path: PathBuf,
    },
    /// Relax a scenario over its whole horizon
    Run {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Override the scenario's update strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Override the scenario's waveform exchange
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,
        /// Solve Jacobi iterations in parallel
        #[arg(long)]
        parallel: bool,
        /// Run store directory (defaults to .waverelax/runs next to the scenario)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// Sweep first-partition step ratios against window counts
    Sweep {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Steps of the first partition per step of the others
        #[arg(long, value_delimiter = ',', default_values_t = [1, 2, 4, 8, 16, 32, 64, 128])]
        ratios: Vec<usize>,
        /// Window counts to split the horizon into
        #[arg(long, value_delimiter = ',', default_values_t = [1, 5])]
        windows: Vec<usize>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List stored runs of a scenario
    Runs {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Run store directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Jacobi,
    GaussSeidel,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Homogeneous,
    Heterogeneous,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Graph { scenario_path } => cmd_graph(&scenario_path),
        Commands::Run {
            scenario_path,
            strategy,
            variant,
            parallel,
            out,
            no_cache,
        } => cmd_run(
            &scenario_path,
            strategy,
            variant,
            parallel,
            out.as_deref(),
            !no_cache,
        ),
        Commands::Sweep {
            scenario_path,
            ratios,
            windows,
            output,
        } => cmd_sweep(&scenario_path, &ratios, &windows, output.as_deref()),
        Commands::Runs { scenario_path, out } => cmd_runs(&scenario_path, out.as_deref()),
    }
}

fn open_store(scenario_path: &Path, out: Option<&Path>) -> CliResult<RunStore> {
    Ok(match out {
        Some(dir) => RunStore::new(dir.to_path_buf())?,
        None => RunStore::for_scenario(scenario_path)?,
    })
}

fn cmd_validate(scenario_path: &Path) -> CliResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = load_scenario(scenario_path)?;
    // building also checks the interface maps against the models
    let orchestrator = build_orchestrator(&scenario)?;
    println!(
        "✓ Scenario '{}' is valid ({} partitions, {} coupling edges, {} windows)",
        scenario.name,
        orchestrator.registry().len(),
        orchestrator.graph().edge_count(),
        orchestrator.windows().len()
    );
    Ok(())
}

fn cmd_graph(scenario_path: &Path) -> CliResult<()> {
    let scenario = load_scenario(scenario_path)?;
    let orchestrator = build_orchestrator(&scenario)?;
    let dot = orchestrator.graph().to_dot_with(
        DotSettings::default(),
        |v| v.data.name.clone(),
        |e| {
            let dofs: Vec<String> = e.data.interface.iter().map(ToString::to_string).collect();
            format!("{} (p={})", dofs.join(", "), e.data.penalty)
        },
    );
    print!("{dot}");
    Ok(())
}

fn overrides(scenario: &Scenario, strategy: Option<StrategyArg>, variant: Option<VariantArg>, parallel: bool) -> Overrides {
    let strategy = strategy.map(|s| match (s, scenario.strategy) {
        (StrategyArg::Jacobi, _) => StrategyDef::Jacobi,
        (StrategyArg::GaussSeidel, StrategyDef::GaussSeidel { sweep }) => StrategyDef::GaussSeidel { sweep },
        (StrategyArg::GaussSeidel, StrategyDef::Jacobi) => StrategyDef::GaussSeidel {
            sweep: SweepOrder::Declared,
        },
    });
    let exchange = variant.map(|v| match v {
        VariantArg::Homogeneous => ExchangeDef::Homogeneous,
        VariantArg::Heterogeneous => ExchangeDef::Heterogeneous,
    });
    Overrides {
        strategy,
        exchange,
        parallel: parallel.then_some(true),
    }
}

fn cmd_run(
    scenario_path: &Path,
    strategy: Option<StrategyArg>,
    variant: Option<VariantArg>,
    parallel: bool,
    out: Option<&Path>,
    use_cache: bool,
) -> CliResult<()> {
    let loaded = load_scenario(scenario_path)?;
    let scenario = overrides(&loaded, strategy, variant, parallel).apply(&loaded);
    let store = open_store(scenario_path, out)?;
    let run_id = compute_run_id(&scenario, SOLVER_VERSION);

    if use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        println!("✓ Loaded from cache: {run_id}");
        print_summary(&manifest);
        return Ok(());
    }

    println!("Running scenario: {}", scenario.name);
    let started = Instant::now();
    let mut orchestrator = build_orchestrator(&scenario)?;
    let report = orchestrator.run()?;
    let elapsed = started.elapsed();

    let names = wr_project::partition_names(&scenario);
    let manifest = RunManifest::from_report(
        run_id.clone(),
        &scenario.name,
        SOLVER_VERSION,
        orchestrator.engine().partitioner().name(),
        orchestrator.engine().exchange().name(),
        names.values().cloned().collect(),
        &report,
    );
    store.save_run(&manifest, &timeseries_records(&report, &names))?;
    tracing::debug!(run_id = %run_id, dir = %store.root_dir().display(), "saved run");

    println!("✓ Simulation completed: {run_id}");
    println!("  Wall time: {:.3} s", elapsed.as_secs_f64());
    print_summary(&manifest);
    Ok(())
}

fn print_summary(manifest: &RunManifest) {
    println!(
        "  Strategy: {} / {}  partitions: {}",
        manifest.strategy,
        manifest.exchange,
        manifest.partitions.join(", ")
    );
    for window in &manifest.windows {
        println!(
            "  window {:>3}  [{:.4}, {:.4}]  iterations {:>4}  residual {:.3e}{}",
            window.index,
            window.start,
            window.end,
            window.iterations,
            window.residual,
            if window.converged { "" } else { "  (not converged)" }
        );
    }
    println!(
        "  Total iterations: {}  cache hits/misses: {}/{}",
        manifest.total_iterations(),
        manifest.cache_hits,
        manifest.cache_misses
    );
}

fn cmd_sweep(scenario_path: &Path, ratios: &[usize], windows: &[usize], output: Option<&Path>) -> CliResult<()> {
    let scenario = load_scenario(scenario_path)?;
    tracing::info!(
        scenario = %scenario.name,
        points = ratios.len() * windows.len(),
        "starting multirate sweep"
    );
    let rows = run_sweep(&scenario, ratios, windows)?;
    let csv = sweep_csv(&rows);

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Wrote {} sweep points to {}", rows.len(), path.display());
    } else {
        print!("{csv}");
    }
    Ok(())
}

fn cmd_runs(scenario_path: &Path, out: Option<&Path>) -> CliResult<()> {
    let scenario = load_scenario(scenario_path)?;
    let store = open_store(scenario_path, out)?;
    let runs = store.list_runs(&scenario.name)?;

    if runs.is_empty() {
        println!("No stored runs for scenario '{}'", scenario.name);
        return Ok(());
    }
    println!("Runs of '{}':", scenario.name);
    for run in runs {
        println!(
            "  {}  {}  {} / {}  {}",
            &run.run_id[..12.min(run.run_id.len())],
            run.timestamp,
            run.strategy,
            run.exchange,
            if run.converged { "converged" } else { "not converged" }
        );
    }
    Ok(())
}
