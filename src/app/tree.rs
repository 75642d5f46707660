use crate::app::filter::PathFilter;
use crate::app::models::display_name;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_INDENT: &str = "│   ";
const SPACE_INDENT: &str = "    ";

struct TreeEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Renders the directory tree, omitting everything the filter rejects.
pub struct TreeRenderer<'a> {
    filter: &'a PathFilter<'a>,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(filter: &'a PathFilter<'a>) -> Self {
        Self { filter }
    }

    /// First line is the directory's own name; every line ends with `\n`.
    pub fn render(&self, dir: &Path) -> String {
        let mut output = format!("{}\n", display_name(dir));
        self.render_children(dir, "", &mut output);
        output
    }

    fn render_children(&self, dir: &Path, prefix: &str, output: &mut String) {
        let entries = match read_sorted(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("Could not list items in {}: {}", dir.display(), err);
                return;
            }
        };

        let visible: Vec<TreeEntry> = entries
            .into_iter()
            .filter(|entry| {
                let decision = self.filter.check_entry(&entry.path, entry.is_dir);
                if let Some(reason) = decision.reason() {
                    log::trace!("Tree: {}", reason);
                }
                decision.is_included()
            })
            .collect();

        let count = visible.len();
        for (i, entry) in visible.iter().enumerate() {
            let is_last = i + 1 == count;
            let connector = if is_last { LAST_BRANCH } else { BRANCH };
            output.push_str(prefix);
            output.push_str(connector);
            output.push_str(&entry.name);
            output.push('\n');

            if entry.is_dir {
                let indent = if is_last { SPACE_INDENT } else { PIPE_INDENT };
                self.render_children(&entry.path, &format!("{}{}", prefix, indent), output);
            }
        }
    }
}

/// Directories first, then case-insensitive by name. Symlinks are leaves.
fn read_sorted(dir: &Path) -> io::Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push(TreeEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            is_dir,
        });
    }

    entries.sort_by(|a, b| {
        (!a.is_dir, a.name.to_lowercase(), &a.name).cmp(&(!b.is_dir, b.name.to_lowercase(), &b.name))
    });
    Ok(entries)
}
