//! MH-C2C command line support
//!
//! Argument definitions, configuration merging and output rendering for the
//! `mh-c2c` binary. Flags override values from a `--config` TOML file, which
//! override built-in defaults.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mhc2c_core::{
    FailurePolicy, Orchestrator, PeerVisibility, ProposalOracle, RunConfig, RunParameters,
    RunResult, ScoringOracle, StopHandle, Termination, TraceEvent, TraceSink,
};
use mhc2c_oracle::{domain_roles, Brevity, Composite, Readability};
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Scoring heuristic selectable from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScorerKind {
    #[default]
    Brevity,
    Readability,
    Composite,
}

impl ScorerKind {
    pub const NAMES: [&'static str; 3] = ["brevity", "readability", "composite"];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "brevity" => Some(Self::Brevity),
            "readability" => Some(Self::Readability),
            "composite" => Some(Self::Composite),
            _ => None,
        }
    }

    #[must_use]
    pub fn build(self) -> Arc<dyn ScoringOracle> {
        match self {
            Self::Brevity => Arc::new(Brevity),
            Self::Readability => Arc::new(Readability),
            Self::Composite => Arc::new(Composite::new()),
        }
    }
}

/// Command definition for `mh-c2c`
#[must_use]
pub fn build_cli() -> Command {
    Command::new("mh-c2c")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Metropolis-Hastings critique-to-consensus")
        .subcommand(
            Command::new("run")
                .about("Refine answers to a task with parallel critique chains")
                .arg(
                    Arg::new("task")
                        .long("task")
                        .required(true)
                        .help("Problem statement"),
                )
                .arg(
                    Arg::new("m")
                        .long("m")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true)
                        .help("Number of chains (agents) [default: 3]"),
                )
                .arg(
                    Arg::new("rounds")
                        .long("rounds")
                        .alias("T")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true)
                        .help("Maximum refinement rounds [default: 3]"),
                )
                .arg(
                    Arg::new("beta")
                        .long("beta")
                        .value_parser(value_parser!(f64))
                        .help("Inverse temperature [default: 1.0]"),
                )
                .arg(
                    Arg::new("eps")
                        .long("eps")
                        .value_parser(value_parser!(f64))
                        .help("Convergence threshold [default: 0.001]"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility [default: 42]"),
                )
                .arg(
                    Arg::new("domain")
                        .long("domain")
                        .help("Derive chain roles from a problem domain"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML file with run parameters"),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .action(ArgAction::SetTrue)
                        .help("Step chains in order; later chains see earlier updates"),
                )
                .arg(
                    Arg::new("isolate")
                        .long("isolate")
                        .action(ArgAction::SetTrue)
                        .help("Keep running when a chain's oracle call fails"),
                )
                .arg(
                    Arg::new("scorer")
                        .long("scorer")
                        .default_value("brevity")
                        .value_parser(ScorerKind::NAMES)
                        .help("Scoring heuristic"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the result as JSON"),
                )
                .arg(
                    Arg::new("trace")
                        .long("trace")
                        .action(ArgAction::SetTrue)
                        .help("Write trace events to stderr as JSON lines"),
                ),
        )
        .subcommand(
            Command::new("roles")
                .about("Show the role labels for a domain")
                .arg(
                    Arg::new("domain")
                        .long("domain")
                        .required(true)
                        .help("Problem domain"),
                )
                .arg(
                    Arg::new("m")
                        .long("m")
                        .default_value("3")
                        .value_parser(value_parser!(usize))
                        .help("Number of roles"),
                ),
        )
}

/// Parsed `run` arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    pub task: String,
    pub num_chains: Option<i64>,
    pub max_rounds: Option<i64>,
    pub beta: Option<f64>,
    pub epsilon: Option<f64>,
    pub seed: Option<u64>,
    pub domain: Option<String>,
    pub config: Option<PathBuf>,
    pub sequential: bool,
    pub isolate: bool,
    pub scorer: ScorerKind,
    pub json: bool,
    pub trace: bool,
}

impl RunArgs {
    /// Extract from the `run` subcommand's matches
    ///
    /// # Errors
    /// Missing task or unknown scorer name.
    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        let task = args
            .get_one::<String>("task")
            .cloned()
            .context("--task is required")?;
        let scorer_name = args
            .get_one::<String>("scorer")
            .map_or("brevity", String::as_str);
        let scorer = ScorerKind::from_name(scorer_name)
            .with_context(|| format!("unknown scorer {scorer_name:?}"))?;

        Ok(Self {
            task,
            num_chains: args.get_one::<i64>("m").copied(),
            max_rounds: args.get_one::<i64>("rounds").copied(),
            beta: args.get_one::<f64>("beta").copied(),
            epsilon: args.get_one::<f64>("eps").copied(),
            seed: args.get_one::<u64>("seed").copied(),
            domain: args.get_one::<String>("domain").cloned(),
            config: args.get_one::<PathBuf>("config").cloned(),
            sequential: args.get_flag("sequential"),
            isolate: args.get_flag("isolate"),
            scorer,
            json: args.get_flag("json"),
            trace: args.get_flag("trace"),
        })
    }
}

/// Read a TOML run configuration
///
/// # Errors
/// Unreadable file or invalid TOML.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// Merge defaults, config file and flags into validated parameters
///
/// # Errors
/// Config loading failures and parameter validation errors.
pub fn resolve_parameters(args: &RunArgs) -> Result<RunParameters> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RunConfig::default(),
    };

    if let Some(m) = args.num_chains {
        config.num_chains = m;
    }
    if let Some(rounds) = args.max_rounds {
        config.max_rounds = rounds;
    }
    if let Some(beta) = args.beta {
        config.beta = beta;
    }
    if let Some(eps) = args.epsilon {
        config.epsilon = eps;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(domain) = &args.domain {
        let n = usize::try_from(config.num_chains).unwrap_or(0);
        config.roles = Some(domain_roles(domain, n));
    }
    if args.sequential {
        config.peer_visibility = PeerVisibility::Sequential;
    }
    if args.isolate {
        config.failure_policy = FailurePolicy::IsolateChain;
    }

    config
        .into_parameters()
        .context("invalid run parameters")
}

/// Trace sink writing one JSON object per line
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> TraceSink for JsonLinesSink<W> {
    fn record(&self, event: &TraceEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                if let Err(err) = writeln!(self.out.lock(), "{line}") {
                    tracing::warn!(error = %err, "Failed to write trace event");
                }
            }
            Err(err) => tracing::warn!(error = %err, "Failed to serialize trace event"),
        }
    }
}

/// Run the loop with optional JSON-lines tracing to stderr
///
/// # Errors
/// Any [`mhc2c_core::RunError`], wrapped.
pub async fn execute<P, S>(
    params: RunParameters,
    proposer: P,
    scorer: S,
    trace: bool,
    stop: StopHandle,
) -> Result<RunResult>
where
    P: ProposalOracle,
    S: ScoringOracle,
{
    let mut orchestrator = Orchestrator::new(params, proposer, scorer).with_stop_handle(stop);
    if trace {
        orchestrator = orchestrator.with_trace_sink(Arc::new(JsonLinesSink::new(std::io::stderr())));
    }
    orchestrator.run().await.context("run failed")
}

fn termination_label(termination: Termination) -> &'static str {
    match termination {
        Termination::Converged => "converged",
        Termination::Exhausted => "round budget exhausted",
        Termination::Cancelled => "cancelled",
    }
}

/// Human-readable summary
#[must_use]
pub fn render_text(result: &RunResult) -> String {
    format!(
        "Best answer (chain {}, {}):\n{}\n\nscore: {:.4}\nrounds: {} ({})\n",
        result.best_index,
        result.best_role,
        result.best_text,
        result.best_score,
        result.rounds_executed,
        termination_label(result.termination),
    )
}

/// JSON document for `--json`
///
/// # Errors
/// Serialization failure.
pub fn render_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize result")
}
