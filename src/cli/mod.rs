// src/cli/mod.rs
//! CLI definitions for respin
//!
//! The actual command implementations are in the `commands` module.
//!
//! - `init` - Create the database
//! - `run` - Process pending builds and the newest repo snapshot once
//! - `daemon` - Keep doing `run` periodically
//! - `request-repo` - Queue a repo snapshot for resolution
//! - `add-package` / `add-build` - Track packages and record builds
//! - `ignore` - Exclude a package from resolution
//! - `status` - Show the resolution state of a package

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "respin")]
#[command(author = "Respin Contributors")]
#[command(version)]
#[command(about = "Tracks build dependency changes of distribution packages", long_about = None)]
pub struct Cli {
    /// Configuration file (default: /etc/respin/respin.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the respin database
    Init,

    /// Process pending builds and repo generation requests once
    Run,

    /// Run periodically until interrupted
    Daemon,

    /// Request resolution of a repo snapshot
    RequestRepo {
        /// Repo snapshot ID
        repo_id: i64,
    },

    /// Start tracking a package
    AddPackage {
        /// Source package name
        name: String,

        /// Static priority
        #[arg(long, default_value = "0")]
        priority: i32,
    },

    /// Record a finished build of a tracked package
    AddBuild {
        /// Source package name
        name: String,

        /// Repo snapshot the build ran against
        #[arg(long)]
        repo_id: i64,

        /// Version of the built source package
        #[arg(long)]
        version: Option<String>,

        /// Release of the built source package
        #[arg(long)]
        release: Option<String>,

        #[arg(long)]
        epoch: Option<i64>,

        /// Build failed
        #[arg(long)]
        failed: bool,
    },

    /// Exclude a package from resolution
    Ignore {
        /// Source package name
        name: String,

        /// Include the package again
        #[arg(long)]
        undo: bool,
    },

    /// Show resolution state, problems and pending dependency changes
    Status {
        /// Source package name
        name: String,
    },
}
