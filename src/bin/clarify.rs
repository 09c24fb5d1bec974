//! clarify CLI - plan and run a question-asking delivery episode.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clarify::external::worlds_from_output;
use clarify::{
    ClarifyError, ConsoleAnswerSource, Planner, PlannerConfig, Policy, PolicyShape, PomdpSolve,
    RewardParams, XsbReasoner,
};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "clarify")]
#[command(version)]
#[command(about = "Ask clarifying questions until a delivery request is unambiguous")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Show the solver's own output
    #[arg(long, global = true)]
    verbose_solver: bool,

    /// Reasoner executable
    #[arg(long, global = true)]
    xsb: Option<String>,

    /// Solver executable
    #[arg(long, global = true)]
    pomdp: Option<String>,

    /// Variable domain file
    #[arg(long, global = true)]
    dom: Option<PathBuf>,

    /// Initial facts file
    #[arg(long, global = true)]
    facts: Option<PathBuf>,

    /// Solver convergence parameter
    #[arg(long, global = true)]
    epsilon: Option<u32>,

    /// Rewards as which,polar,correct,incorrect (e.g. -10,-1,50,-100)
    #[arg(short, long, global = true, allow_hyphen_values = true)]
    rewards: Option<RewardParams>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan, then ask questions until a delivery is made (default)
    Run,

    /// Synthesize and write the model file without solving it
    Model {
        /// Read reasoner output from this file instead of running the reasoner
        #[arg(long)]
        worlds: Option<PathBuf>,

        /// Also print the structured model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load existing solver output and show the policy graph
    Inspect {
        /// Policy-graph file
        #[arg(long)]
        graph: PathBuf,

        /// Alpha-vector file
        #[arg(long)]
        alpha: PathBuf,

        /// Number of question actions
        #[arg(long)]
        questions: usize,

        /// Total number of actions
        #[arg(long)]
        actions: usize,

        /// Number of observations
        #[arg(long)]
        observations: usize,

        /// Initial belief, comma-separated, one entry per state
        #[arg(long, value_delimiter = ',')]
        belief: Vec<f64>,
    },
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_config(cli: &Cli) -> Result<PlannerConfig> {
    let mut config = match &cli.config {
        Some(path) => PlannerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PlannerConfig::default(),
    };

    if cli.verbose_solver {
        config.solver.verbose = true;
    }
    if let Some(xsb) = &cli.xsb {
        config.reasoner.binary.clone_from(xsb);
    }
    if let Some(pomdp) = &cli.pomdp {
        config.solver.binary.clone_from(pomdp);
    }
    if let Some(dom) = &cli.dom {
        config.domain_file.clone_from(dom);
    }
    if let Some(facts) = &cli.facts {
        config.facts_file.clone_from(facts);
    }
    if let Some(epsilon) = cli.epsilon {
        config.solver.epsilon = epsilon;
    }
    if let Some(rewards) = cli.rewards {
        config.rewards = rewards;
    }
    Ok(config.validate()?)
}

fn console() -> ConsoleAnswerSource<io::StdinLock<'static>, io::Stdout> {
    ConsoleAnswerSource::new(io::stdin().lock(), io::stdout())
}

fn run(planner: &Planner<XsbReasoner, PomdpSolve>) -> Result<()> {
    let mut console = console();
    let plan = planner.plan(&mut console)?;

    console.say("\nHello user!");
    let config = planner.config();
    let delivery = plan
        .execution()
        .max_answer_attempts(config.max_answer_attempts)
        .max_steps(config.max_steps)
        .run(&mut console)?;
    console.say(&format!("Made delivery! ({})", delivery.action_name));
    Ok(())
}

fn model(
    planner: &Planner<XsbReasoner, PomdpSolve>,
    worlds_file: Option<&Path>,
    json: bool,
) -> Result<()> {
    let domain = planner.load_domain().context("Failed to load domain")?;
    let worlds = match worlds_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            worlds_from_output(&text)?
        }
        None => {
            let facts = planner.gather_facts(&domain, &mut console())?;
            planner.enumerate_worlds(&facts)?
        }
    };

    let synthesis = planner.synthesize(&domain, &worlds)?;
    println!("{}", synthesis.path.display());
    if json {
        let text = serde_json::to_string_pretty(&synthesis.model)
            .context("Failed to serialize model")?;
        println!("{text}");
    }
    Ok(())
}

fn inspect(
    graph: &Path,
    alpha: &Path,
    shape: PolicyShape,
    belief: &[f64],
) -> Result<()> {
    if belief.is_empty() {
        bail!("--belief needs one probability per state");
    }
    let policy = Policy::load(graph, alpha, belief, shape)?;

    let mut out = io::stdout().lock();
    for (index, node) in policy.nodes().iter().enumerate() {
        let successors: Vec<String> = node
            .transitions
            .iter()
            .map(|s| s.node().map_or_else(|| "-".to_string(), |n| n.to_string()))
            .collect();
        let marker = if index == policy.start() { '*' } else { ' ' };
        let kind = if policy.is_terminal(index) { "deliver" } else { "ask" };
        writeln!(
            out,
            "{marker}{index:>4}  action {:>3} ({kind})  {}",
            node.action,
            successors.join(" ")
        )?;
    }
    writeln!(out, "start node: {}", policy.start())?;
    Ok(())
}

fn execute(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    info!(
        domain = %config.domain_file.display(),
        facts = %config.facts_file.display(),
        "configuration loaded"
    );
    let planner = Planner::new(config.clone(), config.reasoner(), config.solver());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&planner),
        Commands::Model { worlds, json } => model(&planner, worlds.as_deref(), json),
        Commands::Inspect {
            graph,
            alpha,
            questions,
            actions,
            observations,
            belief,
        } => inspect(
            &graph,
            &alpha,
            PolicyShape {
                question_count: questions,
                action_count: actions,
                observation_count: observations,
            },
            &belief,
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = setup_logging(cli.verbose) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let unusable = err
                .downcast_ref::<ClarifyError>()
                .is_some_and(ClarifyError::is_unusable_input);
            if unusable {
                // Nothing to plan with; not a failure of clarify itself.
                eprintln!("Nothing to do: {err:#}");
                ExitCode::SUCCESS
            } else {
                error!("{err:#}");
                ExitCode::FAILURE
            }
        }
    }
}
