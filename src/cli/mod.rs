pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "freshet")]
#[command(about = "A feed synchronization and caching engine", long_about = None)]
pub struct Cli {
    /// Directory for persisted state (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new feed source
    Add {
        /// Display name for the source
        name: String,
        /// URL of the feed
        url: String,
    },
    /// Remove a feed source
    Remove {
        /// URL of the source to remove
        url: String,
    },
    /// Rename a source or point it at a new URL
    Edit {
        /// URL of the source to edit
        url: String,
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// New feed URL
        #[arg(long, value_name = "URL")]
        new_url: Option<String>,
    },
    /// List sources, marking those with unread items
    List,
    /// Show the items of one source
    Items {
        /// URL of the source to show
        url: String,
    },
    /// Force-refresh every source now
    Refresh,
    /// Mark one item read
    Read {
        /// Link of the item
        link: String,
    },
    /// Mark one item unread
    Unread {
        /// Link of the item
        link: String,
    },
    /// Mark every cached item of every source read
    ReadAll,
    /// Stay running and print state changes as refreshes land
    Watch,
}
