//! repoutils: a repository orchestration tool for multi-component software
//! projects. Entry point, tracing setup, and top-level exit-code mapping
//! (spec §6).

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod cli;
mod paths;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, FetchArgs};
use prompt::StdinOverwritePrompt;
use repoutils_config::{find_project_file, Loader, ProjectConfig, ResolvedConfig};
use repoutils_core::{CancellationToken, Kind, VariableStore};
use repoutils_mirror::{MirrorRegistry, MirrorResolver};
use repoutils_scheduler::{Dispatcher, FetchOptions, Scheduler};
use repoutils_workflow::{workflows_from_hooks, StepRegistry, WorkflowContext};

/// The hook name run after a `fetch` command completes, if the project
/// declares one. Exact-match lookup against `ProjectConfig.hooks`, per
/// spec §4.7.
const POST_FETCH_HOOK: &str = "post-fetch";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    runtime.block_on(run(&cli))
}

fn init_tracing(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: &Cli) -> ExitCode {
    match &cli.command {
        Commands::Fetch(args) => run_fetch(cli, args).await,
        Commands::Init(_) | Commands::Info(_) | Commands::Dist(_) | Commands::Distpkg(_) | Commands::Build(_) => {
            run_stub(&cli.command)
        }
    }
}

fn stub_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init(_) => "init",
        Commands::Info(_) => "info",
        Commands::Dist(_) => "dist",
        Commands::Distpkg(_) => "distpkg",
        Commands::Build(_) => "build",
        Commands::Fetch(_) => "fetch",
    }
}

fn run_stub(command: &Commands) -> ExitCode {
    tracing::error!(command = stub_name(command), "not yet implemented");
    ExitCode::FAILURE
}

async fn run_fetch(cli: &Cli, args: &FetchArgs) -> ExitCode {
    let project_path = match resolve_project_path(cli.project.clone()) {
        Ok(path) => path,
        Err(message) => {
            tracing::error!(%message, "could not locate a project file");
            return ExitCode::FAILURE;
        }
    };

    let variables = VariableStore::with_builtins(env!("CARGO_PKG_VERSION"), "repoutils");
    let loader = Loader::new(variables.clone());

    let afm = match loader.load(&project_path) {
        Ok(afm) => afm,
        Err(err) => {
            tracing::error!(error = %err, "failed to load project file");
            return ExitCode::FAILURE;
        }
    };

    let project = match ProjectConfig::from_afm(afm, &project_path) {
        Ok(project) => project,
        Err(err) => {
            tracing::error!(error = %err, "invalid project configuration");
            return ExitCode::FAILURE;
        }
    };

    let resolved_config = ResolvedConfig::from_afm(&project.raw);
    let mirror_registry = MirrorRegistry::from_files(&paths::mirrorlist_paths(&project.root_dir), variables.clone());
    let resolver = Arc::new(MirrorResolver::new(mirror_registry).with_resolved_config(&resolved_config));

    let dispatcher = match Dispatcher::new(Some(resolver)) {
        Ok(d) => d.with_overwrite_policy(Arc::new(StdinOverwritePrompt)),
        Err(err) => {
            tracing::error!(error = %err, "failed to build fetch dispatcher");
            return ExitCode::FAILURE;
        }
    };

    let options = FetchOptions {
        shallow: !args.no_shallow,
        strict: args.strict,
        use_mirror: args.use_mirror(),
        protocol: args.protocol.as_str().to_string(),
    };

    let cancellation = CancellationToken::new();
    let ctrl_c_cancellation = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping in-flight fetches");
            ctrl_c_cancellation.cancel();
        }
    });

    let scheduler = Scheduler::new(dispatcher);
    let (outcomes, aggregates) = match scheduler.run(&project, &options, variables, &cancellation).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "failed to parse subpackage list");
            return ExitCode::FAILURE;
        }
    };

    for (identity, outcome) in &outcomes {
        tracing::debug!(%identity, ?outcome, "subpackage outcome");
    }
    tracing::info!(
        fetched = aggregates.fetched,
        already_present = aggregates.already_present,
        duplicates = aggregates.duplicates,
        failed = aggregates.failed,
        "fetch complete"
    );

    if aggregates.failed == 0 {
        run_post_fetch_hook(&project).await;
        return ExitCode::SUCCESS;
    }

    let interrupted = outcomes.values().any(|outcome| {
        matches!(
            outcome,
            repoutils_scheduler::FetchOutcome::Failed { kind: Kind::UserInterrupt, .. }
        )
    });
    if interrupted {
        ExitCode::from(130)
    } else {
        ExitCode::FAILURE
    }
}

async fn run_post_fetch_hook(project: &ProjectConfig) {
    let registry = StepRegistry::new();
    registry.register("log", || Box::<repoutils_workflow::LogStep>::default());

    let workflows = match workflows_from_hooks(&project.hooks, &registry) {
        Ok(workflows) => workflows,
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse project hooks");
            return;
        }
    };
    let Some(workflow) = workflows.get(POST_FETCH_HOOK) else {
        return;
    };

    tracing::info!(hook = POST_FETCH_HOOK, "running hook");
    if let Err(err) = workflow.run(&WorkflowContext::default()).await {
        tracing::error!(hook = POST_FETCH_HOOK, error = %err, "hook failed");
    }
}

fn resolve_project_path(explicit: Option<PathBuf>) -> Result<PathBuf, String> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path)
        } else {
            Err(format!("{} is not a file", path.display()))
        };
    }
    let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
    find_project_file(&cwd).ok_or_else(|| format!("no project file found in {}", cwd.display()))
}
