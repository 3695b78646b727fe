use std::path::PathBuf;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueHint};
use regsync_operations::SyncOptions;
use regsync_registry::EntryKind;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EntryFilter {
    /// Only modules
    #[arg(long, conflicts_with = "providers_only")]
    pub modules_only: bool,

    /// Only providers
    #[arg(long)]
    pub providers_only: bool,

    /// Only entries whose namespace starts with this prefix
    #[arg(short = 'n', long)]
    pub namespace_prefix: Option<String>,
}

impl From<EntryFilter> for SyncOptions {
    fn from(filter: EntryFilter) -> Self {
        Self {
            modules: !filter.providers_only,
            providers: !filter.modules_only,
            namespace_prefix: filter.namespace_prefix,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AddCommand {
    /// Add a provider from its owner/terraform-provider-<name> repository
    Provider {
        /// The provider repository
        repository: String,

        /// Write the result as JSON to this file
        #[arg(required = false, short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Add a module from its owner/terraform-<target>-<name> repository
    Module {
        /// The module repository
        repository: String,

        /// Write the result as JSON to this file
        #[arg(required = false, short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}

impl AddCommand {
    pub fn into_parts(self) -> (EntryKind, String, Option<PathBuf>) {
        match self {
            AddCommand::Provider { repository, output } => {
                (EntryKind::Provider, repository, output)
            }
            AddCommand::Module { repository, output } => (EntryKind::Module, repository, output),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective configuration
    Config,

    /// Register a new catalog entry and fetch its versions
    #[command(arg_required_else_help = true)]
    Add {
        #[clap(subcommand)]
        command: AddCommand,
    },

    /// Add new upstream versions to every catalog entry
    #[clap(name = "sync", visible_alias = "bump")]
    Sync {
        #[command(flatten)]
        filter: EntryFilter,
    },

    /// Check that a GPG key signed at least one published provider release
    #[command(arg_required_else_help = true)]
    #[clap(name = "verify-key")]
    VerifyKey {
        /// Namespace the key is submitted for
        #[arg(required = true, long)]
        namespace: String,

        /// Limit the scan to one provider of the namespace
        #[arg(required = false, long)]
        provider: Option<String>,

        /// Key files to verify. Defaults to the namespace's keys in the keys directory
        #[arg(required = false, short, long = "key-file", value_hint = ValueHint::FilePath)]
        key_files: Vec<PathBuf>,

        /// GitHub user who must be a public member of the namespace organization
        #[arg(required = false, short, long)]
        username: Option<String>,

        /// Write the result as JSON to this file
        #[arg(required = false, short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Check persisted documents against the catalog invariants
    Validate {
        #[command(flatten)]
        filter: EntryFilter,
    },
}
