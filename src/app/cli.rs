use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Combine code files from a project into a single Markdown file for LLM context",
    after_help = "Configuration is loaded from built-in defaults, then ~/.codetomdrc.{toml,yaml}, \
then <project>/.codetomdrc.{toml,yaml}, and finally command-line arguments. \
List-valued keys replace earlier values. Use --show-config to see the result."
)]
pub struct Cli {
    /// Path to the project folder or a single code file
    pub input_path: PathBuf,

    /// Name/path of the output Markdown file (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Copy the final Markdown content to the clipboard
    #[arg(long)]
    pub clipboard: bool,

    /// Patterns to ignore; replaces patterns from config files and defaults
    #[arg(long, num_args = 0.., value_name = "PATTERN")]
    pub ignore: Option<Vec<String>>,

    /// Extensions (e.g. .py .js) to include exclusively
    #[arg(long, num_args = 0.., value_name = "EXTENSION")]
    pub include_ext: Option<Vec<String>>,

    /// Maximum file size in bytes, 0 means no limit (overrides config)
    #[arg(long, value_name = "BYTES")]
    pub max_size: Option<u64>,

    /// Do not include the directory tree (overrides config)
    #[arg(long)]
    pub no_tree: bool,

    /// Also exclude paths matched by the root's .gitignore
    #[arg(long)]
    pub respect_gitignore: bool,

    /// Display the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Increase verbosity (-v lists skipped items, -vv traces every decision)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
