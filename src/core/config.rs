use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};

use crate::core::errors::{Error, Result};
use crate::services::fs::{json, FileSystemTree, SerializeOptions};

/// Which remote command produced the captured text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// `ls -lR <root>`
    LsLr,
    /// `find <root> -type d`
    Find,
    /// `stat -c "%i|%A|%Z|%Y|%X|%U|%G|%s|%N"` per entry
    Stat,
}

#[derive(Debug, Parser)]
#[command(
    name = "remotefs-tree",
    about = "Build a directory tree from captured remote shell output and print it as JSON"
)]
pub struct Cli {
    /// Format of the captured output.
    #[arg(long, value_enum)]
    pub format: InputFormat,
    /// Remote directory the output was taken under.
    #[arg(long, default_value = "/")]
    pub root: String,
    /// File holding the output; stdin when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Serialize only the directory at this path.
    #[arg(long)]
    pub subtree: Option<String>,
    /// Stop descending below this many levels.
    #[arg(long)]
    pub max_depth: Option<usize>,
    /// Leave files out of the output.
    #[arg(long)]
    pub dirs_only: bool,
    #[arg(long)]
    pub pretty: bool,
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub root: String,
    pub format: InputFormat,
    pub input: Option<PathBuf>,
    pub subtree: Option<String>,
    pub serialize: SerializeOptions,
    pub pretty: bool,
    pub verbosity: u8,
}

impl ExplorerConfig {
    pub fn new(root: impl Into<String>, format: InputFormat) -> Self {
        Self {
            root: root.into(),
            format,
            input: None,
            subtree: None,
            serialize: SerializeOptions::default(),
            pretty: false,
            verbosity: 0,
        }
    }

    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "remotefs=info",
            2 => "remotefs=debug",
            _ => "remotefs=trace",
        }
    }

    /// Reads the captured output from the input file, or stdin.
    pub fn read_input(&self) -> anyhow::Result<String> {
        match &self.input {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {}", path.display())),
            None => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read input from stdin")?;
                Ok(text)
            }
        }
    }

    pub fn build_tree(&self, text: &str) -> Result<FileSystemTree> {
        match self.format {
            InputFormat::LsLr => FileSystemTree::from_ls_lr(&self.root, text),
            InputFormat::Find => FileSystemTree::from_find_type_d(&self.root, text),
            InputFormat::Stat => FileSystemTree::from_stat_output(&self.root, text),
        }
    }

    pub fn render(&self, tree: &FileSystemTree) -> Result<String> {
        let value = match &self.subtree {
            Some(path) => tree
                .subtree_json(path, &self.serialize)
                .ok_or_else(|| Error::NotFound(path.clone()))?,
            None => json::to_json_value_with(tree.root(), &self.serialize),
        };
        if self.pretty {
            Ok(serde_json::to_string_pretty(&value)?)
        } else {
            Ok(value.to_string())
        }
    }
}

impl From<Cli> for ExplorerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            root: cli.root,
            format: cli.format,
            input: cli.input,
            subtree: cli.subtree,
            serialize: SerializeOptions {
                max_depth: cli.max_depth,
                directories_only: cli.dirs_only,
            },
            pretty: cli.pretty,
            verbosity: cli.verbose,
        }
    }
}
