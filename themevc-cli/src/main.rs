// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `themevc` - version control for theme directories
//!
//! History lives in a single JSON file (the engine's export format). Every
//! command loads it, runs against the engine and, when it mutates history,
//! writes the export back.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::Session;
use config::{CliConfig, LoggingSettings};
use std::path::PathBuf;
use themevc_core::MAIN_BRANCH;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true, env = "THEMEVC_CONFIG")]
    config: Option<PathBuf>,

    /// History file
    #[arg(long, global = true, env = "THEMEVC_HISTORY", default_value = "theme-history.json")]
    history: PathBuf,

    /// Branch to operate on
    #[arg(short, long, global = true, default_value = MAIN_BRANCH)]
    branch: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a history file whose root commit holds a theme directory
    Init {
        dir: PathBuf,
        /// Overwrite an existing history file
        #[arg(long)]
        force: bool,
    },
    /// List differences between a theme directory and HEAD
    Status { dir: PathBuf },
    /// Unified diff of a theme directory against HEAD
    Diff {
        dir: PathBuf,
        /// Only this file
        #[arg(long)]
        path: Option<String>,
    },
    /// Unified diff of two files
    DiffFiles { old: PathBuf, new: PathBuf },
    /// Commit a theme directory
    Commit {
        dir: PathBuf,
        #[arg(short, long)]
        message: String,
        /// Defaults to `cli.default_author`
        #[arg(long)]
        author: Option<String>,
    },
    /// Show history, newest first
    Log {
        #[arg(short = 'n', long)]
        max_count: Option<usize>,
    },
    /// Show one commit and its diff
    Show { commit: String },
    /// Append a commit restoring an earlier tree
    Rollback { commit: String },
    /// List, create or delete branches
    Branch {
        name: Option<String>,
        #[arg(short, long)]
        delete: bool,
    },
    /// Print or write the history document
    Export {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Replace history with a document
    Import { file: PathBuf },
    /// Repository statistics
    Stats,
}

fn init_logging(settings: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let json = settings.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text = (!settings.json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

fn run(args: Args, config: &CliConfig) -> Result<String> {
    let history = args.history.as_path();
    let open = || Session::open(history, &args.branch, config);

    match args.command {
        Command::Init { dir, force } => commands::init(history, &dir, force, config),
        Command::Status { dir } => commands::status(&open()?, &dir),
        Command::Diff { dir, path } => commands::diff(&open()?, &dir, path.as_deref()),
        Command::DiffFiles { old, new } => commands::diff_files(&old, &new, config),
        Command::Commit {
            dir,
            message,
            author,
        } => {
            let author = author.unwrap_or_else(|| config.cli.default_author.clone());
            commands::commit(&open()?, &dir, &message, &author)
        }
        Command::Log { max_count } => commands::log(&open()?, max_count),
        Command::Show { commit } => commands::show(&open()?, &commit),
        Command::Rollback { commit } => commands::rollback(&open()?, &commit),
        Command::Branch { name, delete } => commands::branch(&open()?, name.as_deref(), delete),
        Command::Export { out } => commands::export(&open()?, out.as_deref()),
        Command::Import { file } => commands::import(history, &file, config),
        Command::Stats => commands::stats(&open()?),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = CliConfig::load(args.config.as_deref())?;
    init_logging(&config.logging);

    tracing::debug!(history = ?args.history, branch = %args.branch, "Starting themevc");

    let output = run(args, &config)?;
    print!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_commit() {
        let args = Args::parse_from([
            "themevc", "--history", "h.json", "commit", "theme", "-m", "tweak", "--branch", "dev",
        ]);
        assert_eq!(args.history, PathBuf::from("h.json"));
        assert_eq!(args.branch, "dev");
        match args.command {
            Command::Commit {
                dir,
                message,
                author,
            } => {
                assert_eq!(dir, PathBuf::from("theme"));
                assert_eq!(message, "tweak");
                assert_eq!(author, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::parse_from(["themevc", "log", "-n", "5"]);
        assert_eq!(args.branch, "main");
        assert!(matches!(args.command, Command::Log { max_count: Some(5) }));
    }
}
