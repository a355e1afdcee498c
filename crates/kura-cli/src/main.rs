//! kura: command-line client for a store rooted in a host directory.
//!
//! Usage:
//!   kura --root ./data ls / -r --flat
//!   kura --root ./data put /notes/today.txt --data "hello" -p
//!   kura --root ./data mv -d /notes /archive/notes
//!   kura --config kura.ron stat /archive/notes/today.txt
//!
//! Logs go to stderr; `RUST_LOG` is honored and `--verbose` raises the level
//! to debug.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use kura_vfs::{ListOptions, LocalStoreConfig, MimeCategory, Store, TreeItem, human_size};

/// Command-line client for kura stores.
#[derive(Parser, Debug)]
#[command(name = "kura")]
#[command(about = "File and directory operations on a kura store")]
struct Args {
    /// Host directory backing the store root (overrides the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// RON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Refuse every mutation
    #[arg(long, global = true)]
    read_only: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// With --recursive, print one flat sequence instead of a tree
        #[arg(long)]
        flat: bool,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a file's contents
    Cat { path: String },
    /// Create a file, optionally with contents
    Put {
        path: String,
        /// Contents to write
        #[arg(long, conflicts_with = "from")]
        data: Option<String>,
        /// Host file to copy contents from
        #[arg(long)]
        from: Option<PathBuf>,
        /// Create missing parent directories
        #[arg(short, long)]
        parents: bool,
    },
    /// Append text to an existing file
    Append { path: String, text: String },
    /// Replace the contents of an existing file
    Write { path: String, text: String },
    /// Delete a file, or a directory with -d
    Rm {
        path: String,
        #[arg(short, long)]
        dir: bool,
    },
    /// Move a file, or a directory with -d
    Mv {
        from: String,
        to: String,
        #[arg(short, long)]
        dir: bool,
        /// Create missing parent directories (files only; directory moves always do)
        #[arg(short, long)]
        parents: bool,
    },
    /// Rename an entry within its directory
    Rename {
        path: String,
        name: String,
        #[arg(short, long)]
        dir: bool,
    },
    /// Create a directory
    Mkdir {
        path: String,
        /// Create missing parent directories
        #[arg(short, long)]
        parents: bool,
    },
    /// Show file information
    Stat { path: String },
    /// Exit successfully if a file (or directory with -d) exists
    Exists {
        path: String,
        #[arg(short, long)]
        dir: bool,
    },
    /// Remove everything inside a directory
    Empty {
        #[arg(default_value = "/")]
        path: String,
    },
}

impl Args {
    /// Resolve the store configuration: file values first, then flags.
    fn store_config(&self) -> Result<LocalStoreConfig> {
        let mut config = match &self.config {
            Some(path) => LocalStoreConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => LocalStoreConfig::default(),
        };
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        config.read_only |= self.read_only;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = args.store_config()?;
    tracing::debug!(root = %config.root.display(), read_only = config.read_only, "opening store");
    let store = config.open();

    run(&store, args.command).await
}

async fn run(store: &Store, command: Command) -> Result<ExitCode> {
    match command {
        Command::Ls {
            path,
            recursive,
            flat,
            json,
        } => {
            let opts = ListOptions { recursive, flat };
            let items = store
                .dir()
                .try_list(path.as_str(), opts)
                .await
                .with_context(|| format!("cannot list {path}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if recursive && flat {
                for item in &items {
                    println!("{}", entry_line(item, &item.full_path));
                }
            } else {
                print_tree(&items, 0);
            }
        }
        Command::Cat { path } => {
            let text = store
                .file()
                .try_read_text(path.as_str())
                .await
                .with_context(|| format!("cannot read {path}"))?;
            print!("{text}");
        }
        Command::Put {
            path,
            data,
            from,
            parents,
        } => {
            let contents = match (data, from) {
                (Some(data), _) => Some(data.into_bytes()),
                (None, Some(host)) => Some(
                    tokio::fs::read(&host)
                        .await
                        .with_context(|| format!("reading {}", host.display()))?,
                ),
                (None, None) => None,
            };
            store
                .file()
                .try_create(path.as_str(), parents, contents.as_deref())
                .await
                .with_context(|| format!("cannot create {path}"))?;
        }
        Command::Append { path, text } => {
            store
                .file()
                .try_append(path.as_str(), text.as_bytes())
                .await
                .with_context(|| format!("cannot append to {path}"))?;
        }
        Command::Write { path, text } => {
            store
                .file()
                .try_write(path.as_str(), text.as_bytes(), false)
                .await
                .with_context(|| format!("cannot write {path}"))?;
        }
        Command::Rm { path, dir } => {
            let result = if dir {
                store.dir().try_delete(path.as_str()).await
            } else {
                store.file().try_delete(path.as_str()).await
            };
            result.with_context(|| format!("cannot remove {path}"))?;
        }
        Command::Mv {
            from,
            to,
            dir,
            parents,
        } => {
            if dir {
                store
                    .dir()
                    .try_move(from.as_str(), to.as_str())
                    .await
                    .with_context(|| format!("cannot move {from} to {to}"))?;
            } else {
                let report = store
                    .file()
                    .try_move(from.as_str(), to.as_str(), parents)
                    .await
                    .with_context(|| format!("cannot move {from} to {to}"))?;
                if !report.source_removed {
                    eprintln!("warning: copied to {to} but {from} could not be removed");
                }
            }
        }
        Command::Rename { path, name, dir } => {
            let result = if dir {
                store.dir().try_rename(path.as_str(), &name).await
            } else {
                store.file().try_rename(path.as_str(), &name).await.map(drop)
            };
            result.with_context(|| format!("cannot rename {path} to {name}"))?;
        }
        Command::Mkdir { path, parents } => {
            store
                .dir()
                .try_create(path.as_str(), parents)
                .await
                .with_context(|| format!("cannot create directory {path}"))?;
        }
        Command::Stat { path } => {
            let stat = store
                .file()
                .try_stat(path.as_str())
                .await
                .with_context(|| format!("cannot stat {path}"))?;
            let modified = stat
                .modified_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            let category = MimeCategory::from_mime(stat.mime.as_deref());

            println!("name:      {}", stat.name);
            println!("directory: {}", stat.directory_path);
            println!("size:      {} ({} bytes)", human_size(stat.size), stat.size);
            println!("modified:  {modified}");
            println!(
                "mime:      {} [{}]",
                stat.mime.as_deref().unwrap_or("unknown"),
                category.label()
            );
        }
        Command::Exists { path, dir } => {
            let found = if dir {
                store.dir().exists(path.as_str()).await
            } else {
                store.file().exists(path.as_str()).await
            };
            println!("{found}");
            if !found {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Empty { path } => {
            store
                .dir()
                .try_empty(path.as_str())
                .await
                .with_context(|| format!("cannot empty {path}"))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// One line of listing output: directories end in `/`, files show their size.
fn entry_line(item: &TreeItem, label: &str) -> String {
    match item.size {
        Some(size) if !item.is_dir() => format!("{label}  {}", human_size(size)),
        _ => format!("{label}/"),
    }
}

fn print_tree(items: &[TreeItem], depth: usize) {
    for item in items {
        println!("{}{}", "  ".repeat(depth), entry_line(item, &item.name));
        if let Some(children) = &item.children {
            print_tree(children, depth + 1);
        }
    }
}
