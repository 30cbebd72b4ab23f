//! Command line surface: global flags plus the `fetch` subcommand (spec
//! §6) and stub subcommands for the domain surface described but left out
//! of scope.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// A repository orchestration tool for multi-component software projects.
#[derive(Debug, Parser)]
#[command(name = "repoutils", version, about)]
pub struct Cli {
    /// Increase log verbosity; may be repeated (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all but error-level output.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Project file to operate on; defaults to searching the current
    /// directory for a recognized `repo.*` file.
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve and fetch all subpackages recursively.
    Fetch(FetchArgs),
    /// Scaffold a new project file in the current directory.
    Init(StubArgs),
    /// Print project and subpackage information.
    Info(StubArgs),
    /// Build a source distribution archive.
    Dist(StubArgs),
    /// Build a binary distribution package.
    Distpkg(StubArgs),
    /// Run the project's build workflow.
    Build(StubArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct FetchArgs {
    /// Mirror protocol preference.
    #[arg(long, value_enum, default_value_t = Protocol::Http)]
    pub protocol: Protocol,

    /// Disable shallow clones (fetch full history).
    #[arg(long)]
    pub no_shallow: bool,

    /// Enable mirror speedtest resolution (default).
    #[arg(short = 'm', conflicts_with = "disable_mirror")]
    pub enable_mirror: bool,

    /// Disable mirror speedtest resolution; fetch from the declared URL
    /// directly.
    #[arg(short = 'M')]
    pub disable_mirror: bool,

    /// Abort instead of updating a subpackage whose destination already
    /// has a checkout.
    #[arg(long)]
    pub strict: bool,
}

impl FetchArgs {
    #[must_use]
    pub fn use_mirror(&self) -> bool {
        !self.disable_mirror
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Protocol {
    Http,
    Ssh,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Ssh => "ssh",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder args for subcommands described by the external interface
/// but not implemented here.
#[derive(Debug, Clone, clap::Args)]
pub struct StubArgs {
    #[arg(trailing_var_arg = true)]
    pub rest: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_defaults_to_http_and_mirror_enabled() {
        let cli = Cli::parse_from(["repoutils", "fetch"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        assert_eq!(args.protocol, Protocol::Http);
        assert!(args.use_mirror());
        assert!(!args.no_shallow);
    }

    #[test]
    fn disable_mirror_flag_is_honored() {
        let cli = Cli::parse_from(["repoutils", "fetch", "-M", "--protocol", "ssh"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        assert!(!args.use_mirror());
        assert_eq!(args.protocol, Protocol::Ssh);
    }

    #[test]
    fn verbosity_counts_repeats() {
        let cli = Cli::parse_from(["repoutils", "-vv", "fetch"]);
        assert_eq!(cli.verbose, 2);
    }
}
