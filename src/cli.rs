//! CLI module - Command-line interface definitions and handlers

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use canopy::core::model::{CanopyError, Meta, ResultItem, ResultSet};
use canopy::core::paths;
use canopy::core::render::{OutputFormat, RenderConfig, Renderer};
use canopy::{NodeId, NodeKind, TreeError, Workspace, WorkspaceConfig};

/// canopy - a live, filesystem-backed project tree on the command line.
#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(
    author,
    version,
    about,
    long_about = r#"canopy mirrors a project directory as a tree and emits it in a
machine-readable result model.

Each command prints a ResultSet in the selected format (default: jsonl).

Output formats:
- jsonl: one JSON object per line (best for piping into tools)
- json: a single JSON array
- md: human-friendly Markdown
- tree: indented tree view

Hidden entries (dot-names, OS hidden attribute) and the .canopy service
directory are never part of the tree.

Examples:
    canopy tree
    canopy find "readme"
    canopy new src/util.rs
    canopy mv src/old.rs archive
    canopy watch --timeout 30
"#
)]
pub struct Cli {
    /// Root directory for all operations.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "ROOT",
        long_help = "Root directory for all operations (defaults to the current directory).\n\n\
All paths emitted in results are relative to this root, and positional paths\n\
are interpreted relative to it."
    )]
    pub root: PathBuf,

    /// Output format (jsonl/json/md/tree).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for ResultSet.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)\n\
- tree (indented tree view)\n\n\
Tip: Prefer jsonl when you want stable, line-oriented output for piping."
    )]
    pub format: String,

    /// Disable colored output (when applicable).
    #[arg(
        long,
        global = true,
        long_help = "Disable colored output. This is useful when piping to files or when your\n\
terminal does not support ANSI colors."
    )]
    pub no_color: bool,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable more detailed diagnostics on stderr. Equivalent to RUST_LOG=debug."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON and JSONL output with indentation for human readability.\n\n\
This is useful when manually inspecting results. Has no effect on md/tree formats."
    )]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the project tree and emit one entry per node.
    #[command(
        long_about = "Build the tree under ROOT and emit one ResultItem per node in traversal\n\
order (parents before children, directories before files).\n\n\
Hidden entries and the .canopy service directory are skipped. Unreadable\n\
directories are logged to stderr and skipped.\n\n\
Examples:\n\
  canopy tree\n\
  canopy tree --filter alpha\n\
  canopy tree --format tree\n"
    )]
    Tree {
        /// Apply a search filter and mark non-matching entries.
        #[arg(
            long,
            value_name = "QUERY",
            long_help = "Apply a case-insensitive substring filter against paths and text-file\n\
content. Non-matching entries are emitted with enabled=false; folders with a\n\
matching descendant stay enabled so matches remain reachable."
        )]
        filter: Option<String>,
    },

    /// Find entries by substring match against paths and content.
    #[command(
        long_about = r#"Find entries under ROOT whose path or text content contains PATTERN
(case-insensitive substring match) and emit only the matches.

Folders enabled purely because a descendant matches are included, so the
output always forms a connected subtree.

Examples:
    canopy find cargo
    canopy find "fn main"
"#
    )]
    Find {
        /// Substring pattern to match.
        #[arg(value_name = "PATTERN")]
        pattern: String,
    },

    /// Create a file or folder.
    #[command(
        long_about = "Create an empty file (default) or folder at PATH, relative to ROOT.\n\n\
The parent directory must already be part of the tree; creating over an\n\
existing entry is rejected without touching the filesystem.\n\n\
Examples:\n\
  canopy new src/util.rs\n\
  canopy new docs --kind folder\n"
    )]
    New {
        /// Path of the entry to create (relative to ROOT).
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Entry kind to create.
        #[arg(
            long,
            default_value = "file",
            value_parser = ["file", "folder"],
            value_name = "KIND"
        )]
        kind: String,
    },

    /// Delete a file or folder (folders recursively).
    #[command(
        long_about = "Delete the entry at PATH from disk. Folders are removed recursively.\n\n\
Example:\n\
  canopy rm src/old.rs\n"
    )]
    Rm {
        /// Path of the entry to delete (relative to ROOT).
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Rename an entry in place.
    #[command(
        long_about = "Rename the entry at PATH to NAME within its current directory.\n\n\
Renaming to the current name is a no-op success; renaming onto an existing\n\
entry is rejected.\n\n\
Example:\n\
  canopy ren src/old.rs new.rs\n"
    )]
    Ren {
        /// Path of the entry to rename (relative to ROOT).
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// New base name (no path separators).
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Move an entry under another folder.
    #[command(
        long_about = "Move the entry at SRC into the folder DEST, keeping its name.\n\n\
Rejected when DEST is not a folder, already contains an entry with the same\n\
name, or is SRC itself or one of its descendants. Moving an entry onto its\n\
current parent is a no-op success.\n\n\
Example:\n\
  canopy mv src/old.rs archive\n"
    )]
    Mv {
        /// Path of the entry to move (relative to ROOT).
        #[arg(value_name = "SRC")]
        src: PathBuf,

        /// Destination folder (relative to ROOT).
        #[arg(value_name = "DEST")]
        dest: PathBuf,
    },

    /// Watch ROOT and re-emit the tree on structural changes.
    #[command(
        long_about = "Watch ROOT recursively and re-emit the tree whenever entries are created,\n\
deleted or renamed. Notification bursts are debounced and coalesced into a\n\
single rebuild; changes arriving mid-rebuild trigger at most one trailing\n\
pass.\n\n\
Runs until --timeout elapses with no changes (or indefinitely without it).\n\n\
Examples:\n\
  canopy watch\n\
  canopy watch --timeout 30 --format tree\n"
    )]
    Watch {
        /// Stop after this many seconds without changes.
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let root = cli.root.canonicalize().unwrap_or(cli.root);
    if !root.is_dir() {
        return Err(anyhow!("root is not a directory: {}", root.display()));
    }

    let mut workspace = Workspace::new(WorkspaceConfig::new(&root));
    workspace
        .load(&root)
        .with_context(|| format!("failed to load {}", root.display()))?;

    match cli.command {
        Commands::Tree { filter } => {
            if let Some(query) = filter {
                workspace.apply_filter(&query);
            }
            emit(&workspace, &root, render_config, false);
            Ok(())
        }

        Commands::Find { pattern } => {
            workspace.apply_filter(&pattern);
            emit(&workspace, &root, render_config, true);
            Ok(())
        }

        Commands::New { path, kind } => {
            let kind = match kind.as_str() {
                "folder" => NodeKind::Folder,
                _ => NodeKind::File,
            };
            let (parent, name) = split_target(&workspace, &root, &path)?;
            report(
                &root,
                render_config,
                workspace.create(Some(parent), &name, kind),
            )
        }

        Commands::Rm { path } => {
            let id = resolve(&workspace, &root, &path)?;
            report(&root, render_config, workspace.delete(id))
        }

        Commands::Ren { path, name } => {
            let id = resolve(&workspace, &root, &path)?;
            report(&root, render_config, workspace.rename(id, &name))
        }

        Commands::Mv { src, dest } => {
            let id = resolve(&workspace, &root, &src)?;
            let dest = resolve(&workspace, &root, &dest)?;
            let outcome = workspace
                .move_node(id, dest)
                .map(|outcome| match outcome {
                    canopy::MoveOutcome::Moved(path) => path,
                    canopy::MoveOutcome::AlreadyInPlace => {
                        workspace.tree().node(id).full_path.clone()
                    }
                });
            report(&root, render_config, outcome)
        }

        Commands::Watch { timeout } => {
            emit(&workspace, &root, render_config, false);
            match timeout {
                Some(secs) => {
                    let wait = Duration::from_secs(secs);
                    while workspace.pump(wait)? {
                        emit(&workspace, &root, render_config, false);
                    }
                    Ok(())
                }
                None => loop {
                    if workspace.pump(Duration::from_secs(3600))? {
                        emit(&workspace, &root, render_config, false);
                    }
                },
            }
        }
    }
}

/// Map the current tree to the unified result model and print it
fn emit(workspace: &Workspace, root: &Path, config: RenderConfig, matches_only: bool) {
    let tree = workspace.tree();
    let mut set = ResultSet::new();
    for id in tree.walk() {
        let node = tree.node(id);
        if matches_only && !node.enabled {
            continue;
        }
        let path = paths::make_relative(&node.full_path, root)
            .unwrap_or_else(|| paths::normalize_path(&node.full_path));
        let mut item = match node.kind {
            NodeKind::Folder => ResultItem::folder(path),
            NodeKind::File => ResultItem::file(path),
        };
        let size = match node.kind {
            NodeKind::File => node.full_path.metadata().ok().map(|m| m.len()),
            NodeKind::Folder => None,
        };
        item = item
            .with_selected(node.selected)
            .with_enabled(node.enabled)
            .with_meta(Meta {
                size,
                depth: Some(tree.depth(id)),
            });
        set.push(item);
    }
    println!("{}", Renderer::with_config(config).render(&set));
}

/// Print a mutation result as a single result item; failures become error
/// items with the taxonomy code and a non-zero exit
fn report(root: &Path, config: RenderConfig, result: canopy::Result<PathBuf>) -> Result<()> {
    let mut set = ResultSet::new();
    match result {
        Ok(path) => {
            let rel = paths::make_relative(&path, root)
                .unwrap_or_else(|| paths::normalize_path(&path));
            let item = if path.is_dir() {
                ResultItem::folder(rel)
            } else {
                ResultItem::file(rel)
            };
            set.push(item);
            println!("{}", Renderer::with_config(config).render(&set));
            Ok(())
        }
        Err(error) => {
            set.push(ResultItem::error(CanopyError::new(
                error.code(),
                error.to_string(),
            )));
            println!("{}", Renderer::with_config(config).render(&set));
            Err(error.into())
        }
    }
}

/// Resolve a ROOT-relative path to a node in the loaded tree. Paths that
/// traverse out of ROOT never resolve.
fn resolve(workspace: &Workspace, root: &Path, path: &Path) -> Result<NodeId> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    if !paths::is_within_root(&absolute, root) {
        return Err(TreeError::NotFound { path: absolute }.into());
    }
    workspace
        .node_at(&absolute)
        .ok_or_else(|| TreeError::NotFound { path: absolute }.into())
}

/// Split a creation target into its parent node and base name
fn split_target(workspace: &Workspace, root: &Path, path: &Path) -> Result<(NodeId, String)> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let name = absolute
        .file_name()
        .ok_or_else(|| anyhow!("path has no file name: {}", absolute.display()))?
        .to_string_lossy()
        .into_owned();
    let parent_path = absolute
        .parent()
        .ok_or_else(|| anyhow!("path has no parent: {}", absolute.display()))?;
    if !paths::is_within_root(parent_path, root) {
        return Err(anyhow!("path escapes the root: {}", absolute.display()));
    }
    let parent = workspace.node_at(parent_path).ok_or_else(|| TreeError::NotFound {
        path: parent_path.to_path_buf(),
    })?;
    Ok((parent, name))
}
