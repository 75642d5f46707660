use crate::app::models::{display_name, to_slash, FilterDecision, RuntimeConfig, Target};
use globset::{GlobBuilder, GlobMatcher};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Number of leading bytes inspected by the binary-content heuristic.
pub const BINARY_SAMPLE_LEN: usize = 1024;

const WILDCARD_CHARS: &[char] = &['*', '?', '[', '{'];

/// A compiled exclusion pattern.
///
/// Glob syntax is globset's with `literal_separator` on: `*`, `?` and classes stop
/// at `/`, `**` crosses directories. A trailing `/` restricts the pattern to
/// directories.
#[derive(Debug)]
struct ExcludePattern {
    source: String,
    matcher: Option<GlobMatcher>,
    /// Set when the pattern has no wildcards; then it also names path segments.
    literal: Option<String>,
    dir_only: bool,
}

impl ExcludePattern {
    fn compile(source: &str) -> Self {
        let (body, dir_only) = match source.strip_suffix('/') {
            Some(body) if !body.is_empty() => (body, true),
            _ => (source, false),
        };

        let matcher = match GlobBuilder::new(body).literal_separator(true).build() {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(err) => {
                log::warn!("Invalid ignore pattern '{}': {}", source, err);
                None
            }
        };

        Self {
            source: source.to_string(),
            matcher,
            literal: (!body.contains(WILDCARD_CHARS)).then(|| body.to_string()),
            dir_only,
        }
    }
}

/// Decides, for one path at a time, whether it belongs in the document.
///
/// `check_entry` runs the structural checks shared with the tree renderer
/// (patterns, directory names, `.gitignore`, size). `check_file` adds the
/// collector-only checks (extension, binary content).
pub struct PathFilter<'a> {
    root: &'a Path,
    config: &'a RuntimeConfig,
    patterns: Vec<ExcludePattern>,
    gitignore: Option<Gitignore>,
    single_file: bool,
    sample_len: usize,
    output_path: Option<PathBuf>,
}

impl<'a> PathFilter<'a> {
    pub fn new(target: &'a Target, config: &'a RuntimeConfig) -> Self {
        let root = target.root.as_path();
        Self {
            root,
            config,
            patterns: config
                .ignore_patterns
                .iter()
                .map(|p| ExcludePattern::compile(p))
                .collect(),
            gitignore: config
                .respect_gitignore
                .then(|| load_gitignore(root))
                .flatten(),
            single_file: target.is_single_file,
            sample_len: BINARY_SAMPLE_LEN,
            output_path: None,
        }
    }

    #[cfg(test)]
    pub fn with_sample_len(mut self, sample_len: usize) -> Self {
        self.sample_len = sample_len;
        self
    }

    /// Keeps the generated document out of its own input.
    pub fn excluding_output(mut self, output: &Path) -> Self {
        self.output_path = Some(output.canonicalize().unwrap_or_else(|_| output.to_path_buf()));
        self
    }

    /// Root-relative, `/`-separated form of `path`; the bare name if outside the root.
    pub fn relative_path(&self, path: &Path) -> String {
        match pathdiff::diff_paths(path, self.root) {
            Some(rel) if !rel.starts_with("..") && !rel.as_os_str().is_empty() => to_slash(&rel),
            _ => display_name(path),
        }
    }

    /// Structural checks: pattern, directory name, `.gitignore`, size.
    pub fn check_entry(&self, path: &Path, is_dir: bool) -> FilterDecision {
        let rel = self.relative_path(path);
        match self.structural_reason(path, &rel, is_dir) {
            Some(reason) => FilterDecision::Exclude(format!("Ignoring '{}' ({})", rel, reason)),
            None => FilterDecision::Include,
        }
    }

    /// Full check for a regular file: pattern, size, extension, binary content.
    ///
    /// FIFOs, sockets and devices are rejected before any read, since opening
    /// a FIFO without a writer never returns.
    pub fn check_file(&self, path: &Path) -> FilterDecision {
        let rel = self.relative_path(path);
        if matches!(fs::metadata(path), Ok(meta) if !meta.is_file()) {
            return FilterDecision::Exclude(format!("Skipping '{}' (not a regular file)", rel));
        }
        if let Some(reason) = self.structural_reason(path, &rel, false) {
            return FilterDecision::Exclude(format!("Ignoring '{}' ({})", rel, reason));
        }

        let reason = self
            .extension_reason(path)
            .or_else(|| self.binary_reason(path));
        match reason {
            Some(reason) => FilterDecision::Exclude(format!("Skipping '{}' ({})", rel, reason)),
            None => FilterDecision::Include,
        }
    }

    fn structural_reason(&self, path: &Path, rel: &str, is_dir: bool) -> Option<String> {
        if self.is_output(path) {
            return Some("generated output document".to_string());
        }

        let name = display_name(path);
        self.pattern_reason(rel, &name, is_dir)
            .or_else(|| self.segment_reason(rel, is_dir))
            .or_else(|| self.gitignore_reason(path, is_dir))
            .or_else(|| if is_dir { None } else { self.size_reason(path) })
    }

    fn is_output(&self, path: &Path) -> bool {
        self.output_path.as_deref() == Some(path)
    }

    fn pattern_reason(&self, rel: &str, name: &str, is_dir: bool) -> Option<String> {
        for pattern in &self.patterns {
            if pattern.dir_only && !is_dir {
                continue;
            }
            let Some(matcher) = &pattern.matcher else {
                continue;
            };
            if matcher.is_match(rel) {
                return Some(format!("matches pattern '{}'", pattern.source));
            }
            if matcher.is_match(name) {
                return Some(format!("name matches pattern '{}'", pattern.source));
            }
        }
        None
    }

    /// Literal patterns exclude any path with a segment of that name.
    fn segment_reason(&self, rel: &str, is_dir: bool) -> Option<String> {
        if self.single_file {
            return None;
        }

        let segments: Vec<&str> = rel.split('/').collect();
        let dir_segments = if is_dir {
            &segments[..]
        } else {
            &segments[..segments.len().saturating_sub(1)]
        };

        self.patterns.iter().find_map(|pattern| {
            let literal = pattern.literal.as_deref()?;
            let pool = if pattern.dir_only { dir_segments } else { &segments[..] };
            pool.contains(&literal)
                .then(|| format!("path part matches pattern '{}'", pattern.source))
        })
    }

    fn gitignore_reason(&self, path: &Path, is_dir: bool) -> Option<String> {
        let gitignore = self.gitignore.as_ref()?;
        gitignore
            .matched(path, is_dir)
            .is_ignore()
            .then(|| "matched by .gitignore".to_string())
    }

    fn size_reason(&self, path: &Path) -> Option<String> {
        let max = self.config.max_file_size?;
        match fs::metadata(path) {
            Ok(meta) if meta.len() > max => {
                Some(format!("size {} > max {} bytes", meta.len(), max))
            }
            Ok(_) => None,
            Err(err) => Some(format!("could not get size: {}", err)),
        }
    }

    fn extension_reason(&self, path: &Path) -> Option<String> {
        let key = extension_key(path);
        match &self.config.include_extensions {
            Some(only) if !only.contains(&key) => {
                Some(format!("extension '{}' not in --include-ext list", key))
            }
            None if !self.config.code_extensions.contains(&key) => {
                Some(format!("extension '{}' not included", key))
            }
            _ => None,
        }
    }

    fn binary_reason(&self, path: &Path) -> Option<String> {
        match read_prefix(path, self.sample_len) {
            Ok(chunk) if looks_binary(&chunk, self.sample_len) => Some("likely binary".to_string()),
            Ok(_) => None,
            Err(err) => {
                log::warn!(
                    "Could not read start of file {} for binary check: {}",
                    path.display(),
                    err
                );
                Some(format!("likely binary, unreadable: {}", err))
            }
        }
    }
}

/// `.py` style lowercase extension, or the whole file name when there is none.
pub fn extension_key(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => display_name(path),
    }
}

fn read_prefix(path: &Path, len: usize) -> io::Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(len);
    File::open(path)?.take(len as u64).read_to_end(&mut chunk)?;
    Ok(chunk)
}

/// Null bytes or invalid UTF-8 mean binary. A multibyte character cut off by
/// the sample boundary is not held against the file.
fn looks_binary(chunk: &[u8], sample_len: usize) -> bool {
    if chunk.contains(&0) {
        return true;
    }
    match std::str::from_utf8(chunk) {
        Ok(_) => false,
        Err(err) => !(err.error_len().is_none() && chunk.len() == sample_len),
    }
}

fn load_gitignore(root: &Path) -> Option<Gitignore> {
    let path = root.join(".gitignore");
    if !path.is_file() {
        return None;
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&path) {
        log::warn!("Problem reading {}: {}", path.display(), err);
    }
    match builder.build() {
        Ok(gitignore) => Some(gitignore),
        Err(err) => {
            log::warn!("Ignoring {}: {}", path.display(), err);
            None
        }
    }
}
