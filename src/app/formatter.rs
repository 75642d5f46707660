use crate::app::filter::extension_key;
use crate::app::models::{CollectedFiles, RuntimeConfig, Target};
use std::fs;
use std::path::Path;

const SEPARATOR: &str = "---\n\n";

/// What goes between the header and the file contents.
#[derive(Debug, PartialEq)]
pub enum TreeSection {
    Rendered { label: String, body: String },
    SingleFile,
    Disabled,
}

#[derive(Debug)]
pub struct FileSection {
    pub relative_path: String,
    pub language: &'static str,
    pub content: String,
}

/// The assembled document, before rendering to text.
#[derive(Debug)]
pub struct Document {
    pub title: String,
    pub source: String,
    pub tree: TreeSection,
    pub files: Vec<FileSection>,
}

impl Document {
    pub fn render(&self) -> String {
        let mut out = format!(
            "# Project Context: {}\n\nGenerated from: `{}`\n\n",
            self.title, self.source
        );

        match &self.tree {
            TreeSection::Rendered { label, body } => {
                out.push_str(&format!("Project Tree (`{}`):\n```\n{}```\n\n", label, body));
            }
            TreeSection::SingleFile => {
                out.push_str("Input is a single file (no tree generated).\n\n");
            }
            TreeSection::Disabled => out.push_str("Project tree generation skipped by user.\n\n"),
        }
        out.push_str(SEPARATOR);

        out.push_str("## File Contents\n\n");
        if self.files.is_empty() {
            out.push_str("No code files were included based on the specified criteria.\n");
            return out;
        }

        for file in &self.files {
            let body = file.content.trim_end().trim_start_matches(['\n', '\r']);
            let fence = fence_for(body);
            out.push_str(&format!("### File: `{}`\n\n", file.relative_path));
            out.push_str(&format!("{}{}\n{}\n{}\n\n", fence, file.language, body, fence));
            if !body.is_empty() {
                out.push_str(SEPARATOR);
            }
        }
        out
    }

    /// Bytes of file content carried by the document.
    pub fn content_size(&self) -> usize {
        self.files.iter().map(|f| f.content.len()).sum()
    }
}

pub struct OutputGenerator;

impl OutputGenerator {
    /// Picks the tree section; `render` only runs when a tree is wanted.
    pub fn tree_section(
        target: &Target,
        config: &RuntimeConfig,
        render: impl FnOnce() -> String,
    ) -> TreeSection {
        if !config.include_tree {
            TreeSection::Disabled
        } else if target.is_single_file {
            TreeSection::SingleFile
        } else {
            TreeSection::Rendered {
                label: target.display_input(),
                body: render(),
            }
        }
    }

    /// Reads every included file. Files that turn out unreadable as UTF-8 are
    /// moved into the skip map instead of the document.
    pub fn build_document(
        target: &Target,
        tree: TreeSection,
        collected: &mut CollectedFiles,
    ) -> Document {
        let mut files = Vec::with_capacity(collected.included.len());
        let mut failures = Vec::new();

        let total = collected.included.len();
        for (i, entry) in collected.included.iter().enumerate() {
            log::debug!("Processing ({}/{}): {}", i + 1, total, entry.relative_path);
            match read_text(&entry.path) {
                Ok(content) => files.push(FileSection {
                    relative_path: entry.relative_path.clone(),
                    language: language_tag(&entry.path),
                    content,
                }),
                Err(reason) => {
                    log::warn!("Skipping file {}: {}", entry.relative_path, reason);
                    failures.push((entry.relative_path.clone(), reason));
                }
            }
        }

        for (relative_path, reason) in failures {
            let message = format!("Skipping '{}' ({})", relative_path, reason);
            collected.demote(&relative_path, message);
        }

        if files.is_empty() {
            log::warn!("No files matched the criteria for inclusion in the output.");
        }

        Document {
            title: target.root_name(),
            source: target.display_input(),
            tree,
            files,
        }
    }
}

fn read_text(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| format!("OS error reading: {}", e))?;
    String::from_utf8(bytes).map_err(|_| "UTF-8 decoding error".to_string())
}

/// A fence longer than any backtick run inside the content.
fn fence_for(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Best-effort fence language from the extension; empty when unknown.
pub fn language_tag(path: &Path) -> &'static str {
    match extension_key(path).as_str() {
        ".py" => "python",
        ".js" | ".jsx" => "javascript",
        ".ts" | ".tsx" => "typescript",
        ".java" => "java",
        ".c" | ".h" => "c",
        ".cpp" | ".hpp" | ".cc" | ".cxx" => "cpp",
        ".cs" => "csharp",
        ".go" => "go",
        ".rs" => "rust",
        ".php" => "php",
        ".rb" => "ruby",
        ".swift" => "swift",
        ".kt" | ".kts" => "kotlin",
        ".scala" => "scala",
        ".html" | ".htm" => "html",
        ".css" => "css",
        ".scss" => "scss",
        ".less" => "less",
        ".vue" => "vue",
        ".svelte" => "svelte",
        ".json" | ".ipynb" => "json",
        ".yaml" | ".yml" => "yaml",
        ".toml" => "toml",
        ".ini" | ".cfg" | ".conf" => "ini",
        ".sh" | ".bash" | ".zsh" => "bash",
        ".ps1" => "powershell",
        ".bat" | ".cmd" => "batch",
        ".sql" => "sql",
        ".md" | ".markdown" => "markdown",
        ".rst" => "rst",
        ".gradle" => "groovy",
        ".xml" => "xml",
        ".dockerfile" | "Dockerfile" => "dockerfile",
        ".r" => "r",
        ".m" => "objectivec",
        ".lua" => "lua",
        _ => "",
    }
}
