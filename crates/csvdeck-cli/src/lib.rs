//! Shared CLI definitions for csvdeck.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{Command as ClapCommand, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Chart type names accepted by `chart --type`.
pub const CHART_TYPE_NAMES: [&str; 4] = ["bar", "line", "pie", "scatter"];

/// Command-line arguments for csvdeck
#[derive(Clone, Parser, Debug)]
#[command(
    name = "csvdeck",
    version,
    about = "Upload, page through, summarize and chart tabular data files",
    long_about = "Upload CSV (and optionally spreadsheet) files into a local data store, browse \
                  them page by page, compute per-column summaries and validate chart selections."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug mode (writes tracing output; browse logs to the cache directory)
    #[arg(long = "debug", global = true, action)]
    pub debug: bool,

    /// Directory holding uploaded files and their catalog (overrides config [store] data_dir)
    #[arg(long = "data-dir", global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Generate default configuration file at ~/.config/csvdeck/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,

    /// Clear all cache data (log files) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,
}

#[derive(Clone, Subcommand, Debug)]
pub enum Command {
    /// Upload a data file into the store
    Upload {
        /// Path of the file to upload
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// List uploaded files, newest first
    List,
    /// Print one page of a file
    Show {
        /// File id or display name
        #[arg(value_name = "FILE")]
        file: String,

        /// Page number (1-based)
        #[arg(long = "page", default_value_t = 1)]
        page: usize,

        /// Rows per page (must be one of the configured page sizes)
        #[arg(long = "page-size", value_name = "N")]
        page_size: Option<usize>,
    },
    /// Print per-column summary statistics for a file
    Summary {
        /// File id or display name
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Validate a chart selection for a file and print its title
    Chart {
        /// File id or display name
        #[arg(value_name = "FILE")]
        file: String,

        /// Chart type
        #[arg(long = "type", value_name = "TYPE", value_parser = CHART_TYPE_NAMES)]
        chart_type: Option<String>,

        /// X-axis column
        #[arg(long = "x", value_name = "COLUMN")]
        x: Option<String>,

        /// Y-axis column
        #[arg(long = "y", value_name = "COLUMN")]
        y: Option<String>,
    },
    /// Delete a file from the store
    Delete {
        /// File id or display name
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Browse files interactively in the terminal
    Browse {
        /// File to open first (id or display name); defaults to the newest file
        #[arg(value_name = "FILE")]
        file: Option<String>,
    },
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn option_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

fn render_arguments(cmd: &ClapCommand, out: &mut String) {
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = option_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                option_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }
}

/// Render command-line options as markdown, one table for the global options
/// and one per subcommand.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Global Options\n\n");
    render_arguments(&cmd, &mut out);

    for sub in cmd.get_subcommands() {
        if sub.get_name() == "help" {
            continue;
        }
        out.push_str(&format!("\n## `{}`\n\n", sub.get_name()));
        if let Some(about) = sub.get_about() {
            out.push_str(&format!("{}\n\n", about));
        }
        render_arguments(sub, &mut out);
    }

    out
}
