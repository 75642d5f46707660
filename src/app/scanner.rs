use crate::app::filter::PathFilter;
use crate::app::models::{CollectedFiles, FileEntry, FilterDecision, Target};
use std::path::Path;
use walkdir::WalkDir;

/// Walks the target and partitions every file into included or skipped.
pub struct Scanner<'a> {
    target: &'a Target,
    filter: &'a PathFilter<'a>,
}

impl<'a> Scanner<'a> {
    pub fn new(target: &'a Target, filter: &'a PathFilter<'a>) -> Self {
        Self { target, filter }
    }

    pub fn scan(&self) -> CollectedFiles {
        let mut collected = if self.target.is_single_file {
            self.scan_single_file(&self.target.input)
        } else {
            self.scan_directory(&self.target.root)
        };

        // Sorted by full path so output is reproducible across runs and platforms
        collected.included.sort_by(|a, b| a.path.cmp(&b.path));
        collected
    }

    fn scan_single_file(&self, path: &Path) -> CollectedFiles {
        let mut collected = CollectedFiles::default();
        self.classify_file(path, &mut collected);
        collected
    }

    /// Top-down walk; excluded directories are pruned before descending.
    fn scan_directory(&self, root: &Path) -> CollectedFiles {
        let mut collected = CollectedFiles::default();
        let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();

        while let Some(result) = walker.next() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Error walking entry: {}", err);
                    if let Some(path) = err.path() {
                        let rel = self.filter.relative_path(path);
                        let reason = format!("Skipping '{}' (could not read: {})", rel, err);
                        collected.skip(rel, reason);
                    }
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if let FilterDecision::Exclude(reason) = self.filter.check_entry(path, true) {
                    collected.skip(self.filter.relative_path(path), reason);
                    walker.skip_current_dir();
                }
                continue;
            }

            // Symlinks are not followed; one that resolves to a regular file is read like one.
            if file_type.is_symlink() && (path.is_dir() || !path.exists()) {
                let rel = self.filter.relative_path(path);
                let reason = if path.is_dir() {
                    format!("Skipping '{}' (symbolic link to a directory not followed)", rel)
                } else {
                    format!("Skipping '{}' (broken symbolic link)", rel)
                };
                collected.skip(rel, reason);
                continue;
            }

            // FIFOs, sockets and device nodes are never opened.
            if !path.is_file() {
                let rel = self.filter.relative_path(path);
                let reason = format!("Skipping '{}' (not a regular file)", rel);
                collected.skip(rel, reason);
                continue;
            }

            self.classify_file(path, &mut collected);
        }

        collected
    }

    fn classify_file(&self, path: &Path, collected: &mut CollectedFiles) {
        let relative_path = self.filter.relative_path(path);
        match self.filter.check_file(path) {
            FilterDecision::Include => collected.included.push(FileEntry {
                path: path.to_path_buf(),
                relative_path,
            }),
            FilterDecision::Exclude(reason) => collected.skip(relative_path, reason),
        }
    }
}
