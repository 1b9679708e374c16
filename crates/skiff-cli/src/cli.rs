//! CLI argument definitions for skiff.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// skiff — a multi-backend connection tool.
#[derive(Parser)]
#[command(
    name = "skiff",
    version,
    about = "skiff — multi-backend connection tool",
    long_about = "Manages named remotes describing how to reach storage backends, \
                  with optional password-based encryption of the config store."
)]
pub struct Cli {
    /// Path to the config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Never prompt for the configuration password; rely on SKIFF_CONFIG_PASS.
    #[arg(long, global = true)]
    pub no_ask_password: bool,

    /// Answer yes to confirmation prompts automatically.
    #[arg(long, global = true)]
    pub auto_confirm: bool,

    /// Subcommand; the interactive editor runs when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enter the interactive configuration editor.
    Edit,

    /// Print the location of the config file in use.
    File,

    /// Print the decrypted config store, or a single remote.
    Show {
        /// Remote to show; the whole store when omitted.
        remote: Option<String>,
    },

    /// Dump the whole store as JSON.
    Dump,

    /// List the names of configured remotes.
    ListRemotes {
        /// Also show each remote's type.
        #[arg(long)]
        long: bool,
    },

    /// List available backend types and their options as JSON.
    Providers,

    /// Create a new remote without prompting.
    Create {
        /// Name for the new remote.
        name: String,
        /// Backend type of the new remote.
        backend_type: String,
        /// Alternating key value pairs.
        key_values: Vec<String>,
    },

    /// Update an existing remote without prompting.
    Update {
        /// Remote to update.
        name: String,
        /// Alternating key value pairs.
        key_values: Vec<String>,
    },

    /// Delete a remote.
    Delete {
        /// Remote to delete.
        name: String,
    },

    /// Store an obscured password value in a remote.
    Password {
        /// Remote to update.
        name: String,
        /// Option key to set.
        key: String,
        /// Cleartext password value; obscured before storage.
        value: String,
    },
}
