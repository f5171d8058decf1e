use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::ProviderBlock;

#[derive(Parser)]
#[command(name = "wikijs-sync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative configuration of Wiki.js groups and authentication", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// GraphQL endpoint, e.g. https://wiki.example.com/graphql
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// API token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Desired-state file (default: ./wikijs.toml, then ~/.config/wikijs-sync/config.toml)
    #[arg(short, long, global = true, env = "WIKIJS_CONFIG")]
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Connection settings given on the command line
    pub fn provider_flags(&self) -> ProviderBlock {
        ProviderBlock {
            host: self.host.clone(),
            token: self.token.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the site settings (also checks connectivity)
    Site,

    /// List the authentication strategy modules Wiki.js offers
    Strategies {
        /// Show property descriptors for one module
        key: Option<String>,
    },

    /// Inspect and remove groups directly
    #[command(subcommand)]
    Group(GroupCommand),

    /// Show what apply would change
    Plan(TargetArgs),

    /// Make Wiki.js match the desired state
    Apply(ApplyArgs),

    /// Remove the resources declared in the desired state
    Destroy(DestroyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Group Commands
// ============================================================================

#[derive(Subcommand)]
pub enum GroupCommand {
    /// List all groups
    List,

    /// Show one group with its permissions and page rules
    Get {
        /// Group id
        id: i32,
    },

    /// Delete a group
    Delete {
        /// Group id
        id: i32,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

// ============================================================================
// Declarative Commands
// ============================================================================

#[derive(Args)]
pub struct TargetArgs {
    /// Limit to a resource type or one resource: "group", "group.editors", "authentication.corp"
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Limit to a resource type or one resource
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show what would change without changing it
    #[arg(long)]
    pub dry_run: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Limit to a resource type or one resource
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}
