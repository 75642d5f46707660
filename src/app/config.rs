use crate::app::cli::Cli;
use crate::app::models::RuntimeConfig;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in order; the first existing name in a directory wins.
pub const CONFIG_FILENAMES: &[&str] = &[".codetomdrc.toml", ".codetomdrc.yaml", ".codetomdrc.yml"];

pub const DEFAULT_CODE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".c", ".cpp", ".h", ".hpp", ".cs", ".go", ".rs",
    ".php", ".rb", ".swift", ".kt", ".kts", ".scala", ".html", ".htm", ".css", ".scss", ".less",
    ".vue", ".svelte", ".json", ".yaml", ".yml", ".toml", ".ini", ".cfg", ".conf", ".sh", ".bash",
    ".zsh", ".ps1", ".bat", ".cmd", ".sql", ".md", ".markdown", ".rst", ".gradle", ".xml",
    ".dockerfile", "Dockerfile", ".r", ".m", ".ipynb", ".lua",
];

pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    // VCS
    ".git", ".svn", ".hg",
    // Python
    "__pycache__", "*.pyc", "*.pyo", "*.pyd", ".env", "venv", ".venv", "env", "ENV", "*activate*",
    ".pytest_cache", ".mypy_cache", ".ruff_cache",
    // Node
    "node_modules", ".npm", "yarn.lock", "package-lock.json", "pnpm-lock.yaml", ".yarn", ".next",
    // Build outputs
    "build", "dist", "target", "out", "bin", "obj",
    // IDE / OS
    ".vscode", ".idea", ".DS_Store", "Thumbs.db",
    // Logs and temp files
    "*.log", "*.tmp", "*.temp", "*.swp", "*.swo", "*.swn",
    // Assets and data
    "*.min.js", "*.min.css", "*.svg", "*.png", "*.jpg", "*.jpeg", "*.gif", "*.bmp", "*.ico",
    "*.webp", "*.pdf", "*.doc", "*.docx", "*.xls", "*.xlsx", "*.ppt", "*.pptx", "*.zip", "*.tar",
    "*.gz", "*.bz2", "*.rar", "*.7z", "*.mp3", "*.wav", "*.ogg", "*.mp4", "*.avi", "*.mov",
    "*.webm", "*.db", "*.sqlite", "*.sqlite3",
    // Lock files
    "poetry.lock", "Pipfile.lock",
];

pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
pub const DEFAULT_OUTPUT_FILENAME: &str = "project_context.md";

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            code_extensions: DEFAULT_CODE_EXTENSIONS
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
            include_extensions: None,
            ignore_patterns: DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
            output_filename: PathBuf::from(DEFAULT_OUTPUT_FILENAME),
            include_tree: true,
            respect_gitignore: false,
        }
    }
}

/// One config file's worth of settings. Absent keys leave earlier values alone.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ConfigLayer {
    code_extensions: Option<Vec<String>>,
    ignore_patterns: Option<Vec<String>>,
    max_file_size: Option<u64>,
    output_filename: Option<String>,
    include_tree: Option<bool>,
    respect_gitignore: Option<bool>,
}

/// Command-line values that take final precedence when supplied.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub output: Option<PathBuf>,
    pub ignore: Option<Vec<String>>,
    pub include_ext: Option<Vec<String>>,
    pub max_size: Option<u64>,
    pub no_tree: bool,
    pub respect_gitignore: bool,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            output: cli.output.clone(),
            ignore: cli.ignore.clone(),
            include_ext: cli.include_ext.clone(),
            max_size: cli.max_size,
            no_tree: cli.no_tree,
            respect_gitignore: cli.respect_gitignore,
        }
    }
}

#[derive(Debug)]
pub struct ResolvedConfig {
    pub config: RuntimeConfig,
    /// Config files that were read and merged, in merge order.
    pub loaded_files: Vec<PathBuf>,
}

impl RuntimeConfig {
    fn apply_layer(&mut self, layer: ConfigLayer) {
        if let Some(exts) = layer.code_extensions {
            self.code_extensions = exts.iter().map(|e| normalize_extension(e)).collect();
        }
        if let Some(patterns) = layer.ignore_patterns {
            self.ignore_patterns = patterns.into_iter().collect();
        }
        if let Some(size) = layer.max_file_size {
            self.max_file_size = (size > 0).then_some(size);
        }
        if let Some(name) = layer.output_filename {
            self.output_filename = PathBuf::from(name);
        }
        if let Some(include_tree) = layer.include_tree {
            self.include_tree = include_tree;
        }
        if let Some(respect) = layer.respect_gitignore {
            self.respect_gitignore = respect;
        }
    }

    fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(output) = &cli.output {
            self.output_filename = output.clone();
        }
        if let Some(patterns) = &cli.ignore {
            log::info!("Overriding ignore patterns with command line arguments.");
            self.ignore_patterns = patterns.iter().cloned().collect();
        }
        if let Some(exts) = &cli.include_ext {
            let exts: BTreeSet<String> = exts
                .iter()
                .map(|e| {
                    if e.starts_with('.') {
                        e.to_lowercase()
                    } else {
                        format!(".{}", e.to_lowercase())
                    }
                })
                .collect();
            log::info!(
                "Overriding included extensions with command line arguments: {}",
                join_or_none(&exts)
            );
            self.include_extensions = Some(exts);
        }
        if let Some(size) = cli.max_size {
            log::info!("Overriding max file size with command line argument.");
            self.max_file_size = (size > 0).then_some(size);
        }
        if cli.no_tree {
            self.include_tree = false;
        }
        if cli.respect_gitignore {
            self.respect_gitignore = true;
        }
    }

    /// Human readable dump used by `--show-config`.
    pub fn describe(&self, input: &Path, root: &Path, output: &Path) -> String {
        let max_size = match self.max_file_size {
            Some(size) => format!("{} bytes", size),
            None => "No limit".to_string(),
        };
        let extensions = match &self.include_extensions {
            Some(exts) => format!("Included Extensions (Cmd-line Override): {}", join_or_none(exts)),
            None => format!(
                "Considered Code Extensions (Config/Default): {}",
                join_or_none(&self.code_extensions)
            ),
        };

        let mut lines = vec![
            "--- Effective Configuration ---".to_string(),
            format!("Input Path: {}", input.display()),
            format!("Project Root: {}", root.display()),
            format!("Output File: {}", output.display()),
            format!("Include Tree: {}", self.include_tree),
            format!("Respect .gitignore: {}", self.respect_gitignore),
            format!("Max File Size: {}", max_size),
            extensions,
            "Ignore Patterns (Config/Cmd-line):".to_string(),
        ];
        lines.extend(self.ignore_patterns.iter().map(|p| format!("  - {}", p)));
        lines.push("-----------------------------".to_string());

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Lowercases dotted extensions; bare file names such as `Dockerfile` keep their case.
fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_lowercase()
    } else {
        ext.to_string()
    }
}

fn join_or_none(items: &BTreeSet<String>) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Finds the config file in `dir`, if any.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn load_layer(path: &Path) -> Result<ConfigLayer> {
    let content =
        fs::read_to_string(path).context(format!("Failed to read config at {:?}", path))?;
    // An empty file is a valid "no overrides" document in both formats.
    if content.trim().is_empty() {
        return Ok(ConfigLayer::default());
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)
            .context(format!("Failed to parse config file {:?}", path)),
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .context(format!("Failed to parse config file {:?}", path)),
        _ => bail!("Unsupported config file format: {:?}", path),
    }
}

/// Merges defaults, home-scope file, project-scope file and CLI overrides.
///
/// Never fails: unreadable or malformed config files are reported and skipped.
pub fn resolve_config(
    cli: &CliOverrides,
    project_dir: &Path,
    home_dir: Option<&Path>,
) -> ResolvedConfig {
    let mut config = RuntimeConfig::default();
    let mut loaded_files = Vec::new();

    let candidates = home_dir
        .and_then(find_config_file)
        .into_iter()
        .chain(find_config_file(project_dir));

    for path in candidates {
        log::info!("Loading config: {}", path.display());
        match load_layer(&path) {
            Ok(layer) => {
                config.apply_layer(layer);
                loaded_files.push(path);
            }
            Err(err) => log::warn!("Skipping config file: {:#}", err),
        }
    }

    if loaded_files.is_empty() {
        log::info!("Using default configuration (no .codetomdrc file found or loaded).");
    } else {
        let names: Vec<String> = loaded_files.iter().map(|p| p.display().to_string()).collect();
        log::info!("Successfully merged config from: {}", names.join(", "));
    }

    config.apply_cli(cli);
    ResolvedConfig {
        config,
        loaded_files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn defaults_when_no_files_exist() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let resolved = resolve_config(&CliOverrides::default(), project.path(), Some(home.path()));

        assert!(resolved.loaded_files.is_empty());
        assert_eq!(resolved.config, RuntimeConfig::default());
        assert!(resolved.config.ignore_patterns.contains(".git"));
        assert!(resolved.config.code_extensions.contains("Dockerfile"));
        assert_eq!(resolved.config.max_file_size, Some(DEFAULT_MAX_FILE_SIZE));
    }

    #[test]
    fn project_file_overrides_home_file() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            home.path(),
            ".codetomdrc.yaml",
            "output_filename: home.md\nmax_file_size: 10\ninclude_tree: false\n",
        );
        write(
            project.path(),
            ".codetomdrc.toml",
            "output_filename = \"project.md\"\n",
        );

        let resolved = resolve_config(&CliOverrides::default(), project.path(), Some(home.path()));
        let config = resolved.config;

        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(config.output_filename, PathBuf::from("project.md"));
        // Keys the project file does not mention survive from the home file.
        assert_eq!(config.max_file_size, Some(10));
        assert!(!config.include_tree);
        // Keys neither file mentions keep their defaults.
        assert_eq!(config.code_extensions, RuntimeConfig::default().code_extensions);
    }

    #[test]
    fn list_keys_replace_instead_of_union() {
        let project = TempDir::new().unwrap();
        write(project.path(), ".codetomdrc.yaml", "ignore_patterns: ['*.log']\n");

        let resolved = resolve_config(&CliOverrides::default(), project.path(), None);
        let patterns: Vec<&str> = resolved
            .config
            .ignore_patterns
            .iter()
            .map(String::as_str)
            .collect();

        assert_eq!(patterns, vec!["*.log"]);
    }

    #[test]
    fn malformed_file_is_skipped() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(home.path(), ".codetomdrc.toml", "max_file_size = 42\n");
        write(project.path(), ".codetomdrc.yaml", "ignore_patterns: [unclosed\n");

        let resolved = resolve_config(&CliOverrides::default(), project.path(), Some(home.path()));

        assert_eq!(resolved.loaded_files.len(), 1);
        assert_eq!(resolved.config.max_file_size, Some(42));
        assert_eq!(
            resolved.config.ignore_patterns,
            RuntimeConfig::default().ignore_patterns
        );
    }

    #[test]
    fn wrongly_typed_key_drops_the_whole_file() {
        let project = TempDir::new().unwrap();
        write(
            project.path(),
            ".codetomdrc.yaml",
            "include_tree: false\nmax_file_size: big\n",
        );

        let resolved = resolve_config(&CliOverrides::default(), project.path(), None);
        assert!(resolved.loaded_files.is_empty());
        assert!(resolved.config.include_tree);
    }

    #[test]
    fn toml_is_preferred_over_yaml_in_the_same_directory() {
        let project = TempDir::new().unwrap();
        write(project.path(), ".codetomdrc.toml", "include_tree = false\n");
        write(project.path(), ".codetomdrc.yaml", "include_tree: true\n");

        let found = find_config_file(project.path()).unwrap();
        assert!(found.ends_with(".codetomdrc.toml"));
    }

    #[test]
    fn zero_size_means_unlimited() {
        let project = TempDir::new().unwrap();
        write(project.path(), ".codetomdrc.yaml", "max_file_size: 0\ncomment: hi\n");

        let resolved = resolve_config(&CliOverrides::default(), project.path(), None);
        assert_eq!(resolved.config.max_file_size, None);
    }

    #[test]
    fn cli_overrides_take_final_precedence() {
        let project = TempDir::new().unwrap();
        write(
            project.path(),
            ".codetomdrc.yaml",
            "ignore_patterns: ['*.log']\nmax_file_size: 5\noutput_filename: cfg.md\n",
        );
        let cli = CliOverrides {
            output: Some(PathBuf::from("cli.md")),
            ignore: Some(vec![]),
            include_ext: Some(vec!["PY".into(), ".rs".into()]),
            max_size: Some(0),
            no_tree: true,
            respect_gitignore: true,
        };

        let config = resolve_config(&cli, project.path(), None).config;

        assert_eq!(config.output_filename, PathBuf::from("cli.md"));
        assert!(config.ignore_patterns.is_empty());
        assert_eq!(
            config.include_extensions,
            Some(BTreeSet::from([".py".to_string(), ".rs".to_string()]))
        );
        assert_eq!(config.max_file_size, None);
        assert!(!config.include_tree);
        assert!(config.respect_gitignore);
    }

    #[test]
    fn describe_lists_effective_values() {
        let mut config = RuntimeConfig {
            ignore_patterns: BTreeSet::from(["b".to_string(), "a".to_string()]),
            max_file_size: None,
            ..RuntimeConfig::default()
        };
        let text = config.describe(Path::new("/in"), Path::new("/root"), Path::new("/out.md"));
        assert!(text.contains("Max File Size: No limit"));
        assert!(text.contains("Considered Code Extensions"));
        assert!(text.contains("  - a\n  - b\n"));

        config.include_extensions = Some(BTreeSet::new());
        let text = config.describe(Path::new("/in"), Path::new("/root"), Path::new("/out.md"));
        assert!(text.contains("Included Extensions (Cmd-line Override): None"));
    }

    #[test]
    fn describe_output_is_line_per_setting() {
        let config = RuntimeConfig {
            ignore_patterns: BTreeSet::from(["*.lock".to_string()]),
            code_extensions: BTreeSet::from([".rs".to_string()]),
            include_tree: false,
            max_file_size: Some(10),
            ..RuntimeConfig::default()
        };
        let text = config.describe(Path::new("/in"), Path::new("/root"), Path::new("/out.md"));
        let expected = [
            "--- Effective Configuration ---".to_string(),
            format!("Input Path: {}", Path::new("/in").display()),
            format!("Project Root: {}", Path::new("/root").display()),
            format!("Output File: {}", Path::new("/out.md").display()),
            "Include Tree: false".to_string(),
            "Respect .gitignore: false".to_string(),
            "Max File Size: 10 bytes".to_string(),
            "Considered Code Extensions (Config/Default): .rs".to_string(),
            "Ignore Patterns (Config/Cmd-line):".to_string(),
            "  - *.lock".to_string(),
            "-----------------------------".to_string(),
        ]
        .join("\n")
            + "\n";
        assert_eq!(text, expected);
    }
}
