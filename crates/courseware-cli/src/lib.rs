// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `courseware-nav`: resolve and navigate course routes against a JSON world
//! fixture using the sandbox host.
#![allow(clippy::print_stdout)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use courseware_app_core::config::{ConfigService, ConfigStore};
use courseware_app_core::config_port::PrefsPort;
use courseware_app_core::prefs::PlayerPrefs;
use courseware_config_fs::FsConfigStore;
use courseware_core::{
    rules, CoursewareEngine, CoursewareRef, Effect, HistoryEntry, NavAction, ProgressLog, Sandbox,
    Settled, WorldFixture,
};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "courseware-nav")]
#[command(about = "Resolve courseware routes to canonical course/sequence/unit positions")]
pub struct Cli {
    /// Player prefs JSON file (takes precedence over the config store)
    #[arg(long, global = true)]
    pub prefs: Option<PathBuf>,
    /// Directory holding player-prefs.json (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
    /// Print a JSON report instead of text
    #[arg(long, global = true)]
    pub json: bool,
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Settle a route and print where it lands
    Resolve {
        /// World fixture (hierarchy snapshot + resume points)
        fixture: PathBuf,
        /// Starting route, e.g. /course/C
        path: String,
    },
    /// Settle a route, run a navigation action, settle again
    Navigate {
        /// World fixture (hierarchy snapshot + resume points)
        fixture: PathBuf,
        /// Starting route
        path: String,
        /// next | previous | next-sequence | previous-sequence | unit=ID
        action: NavAction,
    },
    /// List the normalization rules in precedence order
    Rules,
    /// Print the effective player prefs as JSON
    Prefs {
        /// Also persist them to the config store
        #[arg(long)]
        save: bool,
    },
}

/// What a run produced.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Final route.
    pub route: String,
    /// How the last settle ended.
    pub outcome: Settled,
    /// History calls in order.
    pub history: Vec<HistoryEntry>,
    /// Every effect the engine dispatched.
    pub effects: Vec<Effect>,
    /// Progress calls.
    pub progress: ProgressLog,
}

/// Parse arguments, run, print.
pub fn entrypoint() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    match &cli.command {
        Commands::Rules => {
            print!("{}", render_rules());
            Ok(())
        }
        Commands::Prefs { save } => {
            let prefs = load_prefs(cli.prefs.as_deref(), cli.config_dir.as_deref())?;
            if *save {
                let service = ConfigService::new(open_store(cli.config_dir.as_deref())?);
                persist_prefs(&service, &prefs)?;
            }
            println!("{}", serde_json::to_string_pretty(&prefs)?);
            Ok(())
        }
        Commands::Resolve { fixture, path } => {
            let report = run(&cli, fixture, path, None)?;
            emit(&cli, &report)
        }
        Commands::Navigate {
            fixture,
            path,
            action,
        } => {
            let report = run(&cli, fixture, path, Some(action))?;
            emit(&cli, &report)
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("warn".parse()?);
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

/// Resolve prefs: explicit file, then config store, then defaults.
pub fn load_prefs(prefs: Option<&Path>, config_dir: Option<&Path>) -> Result<PlayerPrefs> {
    if let Some(path) = prefs {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read prefs {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("invalid prefs JSON in {}", path.display()));
    }
    let store = match open_store(config_dir) {
        Ok(store) => store,
        Err(err) => {
            warn!(?err, "config store unavailable; using default prefs");
            return Ok(PlayerPrefs::default());
        }
    };
    debug!(dir = %store.base_dir().display(), "loading player prefs");
    stored_prefs(&ConfigService::new(store))
}

/// Prefs saved in a config store; defaults when nothing was saved.
pub fn stored_prefs<S: ConfigStore>(service: &ConfigService<S>) -> Result<PlayerPrefs> {
    service
        .load_player_prefs()
        .context("failed to load saved player prefs")
}

/// Save `prefs` through the prefs port, failing loudly when nothing was written.
pub fn persist_prefs(port: &dyn PrefsPort, prefs: &PlayerPrefs) -> Result<()> {
    port.save_prefs(prefs).context("failed to save player prefs")
}

fn open_store(config_dir: Option<&Path>) -> Result<FsConfigStore> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    };
    store.context("failed to open config directory")
}

/// Read a world fixture from disk.
pub fn load_world(path: &Path) -> Result<WorldFixture> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid fixture JSON in {}", path.display()))
}

/// Settle `path`, optionally run `action` and settle again.
pub fn simulate(
    prefs: PlayerPrefs,
    world: WorldFixture,
    path: &str,
    action: Option<&NavAction>,
) -> Result<Report> {
    let route = CoursewareRef::parse(path).with_context(|| format!("bad route {path:?}"))?;
    let mut sandbox = Sandbox::new(CoursewareEngine::new(prefs), world, route)
        .context("fixture violates the hierarchy invariants")?;
    let mut outcome = sandbox.settle();
    if let Some(action) = action {
        if matches!(outcome, Settled::FixedPoint { .. }) {
            sandbox.navigate(action);
            outcome = sandbox.settle();
        } else {
            warn!(%action, "route never settled; skipping navigation");
        }
    }
    if let Settled::Exhausted { passes } = outcome {
        bail!(
            "{path} did not settle within {passes} passes (last route {})",
            sandbox.route()
        );
    }
    Ok(Report {
        route: sandbox.route().to_string(),
        outcome,
        history: sandbox.history().to_vec(),
        effects: sandbox.effects().to_vec(),
        progress: sandbox.progress().clone(),
    })
}

fn run(cli: &Cli, fixture: &Path, path: &str, action: Option<&NavAction>) -> Result<Report> {
    let prefs = load_prefs(cli.prefs.as_deref(), cli.config_dir.as_deref())?;
    let world = load_world(fixture)?;
    simulate(prefs, world, path, action)
}

fn emit(cli: &Cli, report: &Report) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_text(report));
    }
    Ok(())
}

/// Human-readable report.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "route: {}", report.route);
    let _ = match &report.outcome {
        Settled::FixedPoint { passes } => writeln!(out, "outcome: settled after {passes} passes"),
        Settled::Exited { target } => writeln!(out, "outcome: left the player for {target}"),
        Settled::Exhausted { passes } => writeln!(out, "outcome: unsettled after {passes} passes"),
    };
    if !report.history.is_empty() {
        out.push_str("history:\n");
        for entry in &report.history {
            let _ = match entry {
                HistoryEntry::Replace(path) => writeln!(out, "  replace {path}"),
                HistoryEntry::Push(path) => writeln!(out, "  push {path}"),
                HistoryEntry::Assign(url) => writeln!(out, "  assign {url}"),
            };
        }
    }
    let progress = &report.progress;
    if !(progress.completed.is_empty()
        && progress.saved.is_empty()
        && progress.celebrations.is_empty())
    {
        out.push_str("progress:\n");
        for (seq, unit) in &progress.completed {
            let _ = writeln!(out, "  completed {seq}/{unit}");
        }
        for (seq, index) in &progress.saved {
            let _ = writeln!(out, "  saved {seq}@{index}");
        }
        for (from, to) in &progress.celebrations {
            let _ = writeln!(out, "  celebrate {from} -> {to}");
        }
    }
    out
}

/// The rule table, one per line.
pub fn render_rules() -> String {
    rules()
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}\n", i + 1, rule.name))
        .collect()
}
