use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Represents the final configuration after merging defaults, config files and CLI args.
///
/// Built once per run by `config::resolve_config` and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Extensions (`.py`) or bare file names (`Dockerfile`) treated as source.
    pub code_extensions: BTreeSet<String>,
    /// Exclusive extension list from `--include-ext`; wins over `code_extensions`.
    pub include_extensions: Option<BTreeSet<String>>,
    pub ignore_patterns: BTreeSet<String>,
    /// `None` means unlimited.
    pub max_file_size: Option<u64>,
    pub output_filename: PathBuf,
    pub include_tree: bool,
    pub respect_gitignore: bool,
}

/// The path the tool was invoked against.
#[derive(Debug, Clone)]
pub struct Target {
    /// Canonical form of the input path.
    pub input: PathBuf,
    /// The input itself for a directory, its parent for a single file.
    pub root: PathBuf,
    pub is_single_file: bool,
}

impl Target {
    pub fn resolve(input: &Path) -> Result<Self> {
        if !input.exists() {
            bail!("Input path '{}' does not exist.", input.display());
        }
        let input = input
            .canonicalize()
            .with_context(|| format!("Failed to resolve input path {:?}", input))?;

        if input.is_dir() {
            return Ok(Self {
                root: input.clone(),
                input,
                is_single_file: false,
            });
        }

        let root = input
            .parent()
            .map(Path::to_path_buf)
            .context("Input file has no parent directory")?;
        Ok(Self {
            input,
            root,
            is_single_file: true,
        })
    }

    /// Directory holding the project-scope config file.
    pub fn project_dir(&self) -> &Path {
        &self.root
    }

    pub fn root_name(&self) -> String {
        display_name(&self.root)
    }

    /// The input as shown in the document header: relative to the root's parent.
    pub fn display_input(&self) -> String {
        let base = self.root.parent().unwrap_or(&self.root);
        match pathdiff::diff_paths(&self.input, base) {
            Some(rel) if !rel.as_os_str().is_empty() => to_slash(&rel),
            _ => self.input.display().to_string(),
        }
    }
}

/// Outcome of running a single path through the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Include,
    Exclude(String),
}

impl FilterDecision {
    pub fn is_included(&self) -> bool {
        matches!(self, FilterDecision::Include)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            FilterDecision::Include => None,
            FilterDecision::Exclude(reason) => Some(reason),
        }
    }
}

/// Represents a single file selected for the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Root-relative, always `/`-separated.
    pub relative_path: String,
}

/// Result of a collection pass. A path is in exactly one of the two.
#[derive(Debug, Default)]
pub struct CollectedFiles {
    pub included: Vec<FileEntry>,
    /// Root-relative path -> human readable reason.
    pub skipped: BTreeMap<String, String>,
}

impl CollectedFiles {
    pub fn skip(&mut self, relative_path: String, reason: String) {
        log::trace!("{}", reason);
        self.skipped.insert(relative_path, reason);
    }

    /// Moves an included file into the skip map.
    pub fn demote(&mut self, relative_path: &str, reason: String) {
        self.included.retain(|entry| entry.relative_path != relative_path);
        self.skip(relative_path.to_string(), reason);
    }
}

/// Joins path components with `/` regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
