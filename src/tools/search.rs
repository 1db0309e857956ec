//! Code search tools: file globbing and regex search.
//!
//! Both walk the filesystem synchronously, so they run on the blocking pool.
//! Dropping the calling future raises a cancel flag that stops the walk at
//! the next entry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use glob::MatchOptions;
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use super::{resolve, Param, ParamKind, Tool, ToolArgs, ToolError, MAX_GREP_MATCHES, NO_MATCHES};

/// Shell-style matching: `*` stays inside one path component and hidden
/// entries are only matched by an explicit leading dot.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Find files by glob pattern, newest first.
pub struct GlobFiles;

#[async_trait]
impl Tool for GlobFiles {
    fn name(&self) -> &str {
        "glob"
    }

    fn description(&self) -> &str {
        "Find files by pattern, sorted by mtime"
    }

    fn parameters(&self) -> &[Param] {
        const PARAMS: &[Param] = &[
            Param::required("pat", ParamKind::String),
            Param::optional("path", ParamKind::String),
        ];
        PARAMS
    }

    async fn execute(&self, args: &ToolArgs, workspace: &Path) -> Result<String, ToolError> {
        let pattern = format!("{}/{}", args.opt_str("path").unwrap_or("."), args.str("pat")?)
            .replace("//", "/");
        let workspace = workspace.to_path_buf();

        let guard = CancelOnDrop::default();
        let cancel = guard.flag();
        tokio::task::spawn_blocking(move || glob_files(&pattern, &workspace, &cancel)).await?
    }
}

fn glob_files(pattern: &str, workspace: &Path, cancel: &AtomicBool) -> Result<String, ToolError> {
    let full_pattern = resolve(workspace, pattern);
    let entries = glob::glob_with(&full_pattern.to_string_lossy(), GLOB_OPTIONS)
        .map_err(|e| ToolError::InvalidPattern(e.to_string()))?;

    let mut files: Vec<(PathBuf, SystemTime)> = entries
        .take_while(|_| !cancel.load(Ordering::Relaxed))
        .filter_map(Result::ok)
        .map(|path| {
            let mtime = modified_time(&path);
            (path, mtime)
        })
        .collect();

    // Stable sort keeps glob order among equal timestamps.
    files.sort_by(|a, b| b.1.cmp(&a.1));

    if files.is_empty() {
        return Ok(NO_MATCHES.to_string());
    }

    Ok(files
        .iter()
        .map(|(path, _)| display_path(path, workspace))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Modification time of a regular file; directories and unreadable entries sort as oldest.
fn modified_time(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .and_then(|m| m.modified().ok())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Search file contents with a regex.
pub struct GrepFiles;

#[async_trait]
impl Tool for GrepFiles {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search files for regex pattern"
    }

    fn parameters(&self) -> &[Param] {
        const PARAMS: &[Param] = &[
            Param::required("pat", ParamKind::String),
            Param::optional("path", ParamKind::String),
        ];
        PARAMS
    }

    async fn execute(&self, args: &ToolArgs, workspace: &Path) -> Result<String, ToolError> {
        let pattern = Regex::new(args.str("pat")?)
            .map_err(|e| ToolError::InvalidPattern(e.to_string()))?;
        let root = resolve(workspace, args.opt_str("path").unwrap_or("."));
        let workspace = workspace.to_path_buf();

        let guard = CancelOnDrop::default();
        let cancel = guard.flag();
        let hits =
            tokio::task::spawn_blocking(move || grep_files(&pattern, &root, &workspace, &cancel))
                .await?;

        if hits.is_empty() {
            Ok(NO_MATCHES.to_string())
        } else {
            Ok(hits.join("\n"))
        }
    }
}

/// Up to [`MAX_GREP_MATCHES`] `path:line:content` hits under `root`, in file name order.
fn grep_files(
    pattern: &Regex,
    root: &Path,
    workspace: &Path,
    cancel: &AtomicBool,
) -> Vec<String> {
    let mut hits = Vec::new();
    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file());

    'files: for entry in files {
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!("grep under {} cancelled", root.display());
            break;
        }
        // Binary or unreadable files are not searchable; skip them.
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        let shown = display_path(entry.path(), workspace);
        for (idx, line) in content.lines().enumerate() {
            if pattern.is_match(line) {
                hits.push(format!("{}:{}:{}", shown, idx + 1, line.trim_end()));
                if hits.len() >= MAX_GREP_MATCHES {
                    break 'files;
                }
            }
        }
    }

    tracing::debug!("grep {:?} under {}: {} hits", pattern.as_str(), root.display(), hits.len());
    hits
}

/// Raises its flag when dropped, telling a blocking search to stop early.
#[derive(Default)]
struct CancelOnDrop(Arc<AtomicBool>);

impl CancelOnDrop {
    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Show paths under the workspace relative to it, everything else as-is.
fn display_path(path: &Path, workspace: &Path) -> String {
    path.strip_prefix(workspace)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs::{self, File};
    use std::time::Duration;

    fn args(value: Value) -> ToolArgs {
        match value {
            Value::Object(map) => ToolArgs::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    fn set_mtime(path: &Path, secs_after_epoch: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
            .unwrap();
    }

    #[tokio::test]
    async fn glob_orders_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        for (name, mtime) in [("old.rs", 1_000), ("new.rs", 3_000), ("mid.rs", 2_000)] {
            let path = dir.path().join("src").join(name);
            fs::write(&path, "").unwrap();
            set_mtime(&path, mtime);
        }

        let out = GlobFiles
            .execute(&args(json!({ "pat": "**/*.rs" })), dir.path())
            .await
            .unwrap();
        let names: Vec<&str> = out
            .lines()
            .map(|l| l.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["new.rs", "mid.rs", "old.rs"]);
    }

    #[tokio::test]
    async fn glob_puts_directories_last() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("adir")).unwrap();
        fs::write(dir.path().join("afile"), "x").unwrap();

        let out = GlobFiles
            .execute(&args(json!({ "pat": "a*" })), dir.path())
            .await
            .unwrap();
        let names: Vec<&str> = out
            .lines()
            .map(|l| l.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["afile", "adir"]);
    }

    #[tokio::test]
    async fn glob_without_matches_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let out = GlobFiles
            .execute(
                &args(json!({ "pat": "*.zig", "path": "does/not/exist" })),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(out, "none");
    }

    #[tokio::test]
    async fn grep_reports_path_line_and_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one\ntwo needle   \nthree\n").unwrap();

        let out = GrepFiles
            .execute(&args(json!({ "pat": "need.e" })), dir.path())
            .await
            .unwrap();
        assert_eq!(out, "a.txt:2:two needle");
    }

    #[tokio::test]
    async fn grep_caps_output_at_fifty_matches() {
        let dir = tempfile::tempdir().unwrap();
        let body: String = (0..40).map(|i| format!("match {i}\n")).collect();
        fs::write(dir.path().join("a.txt"), &body).unwrap();
        fs::write(dir.path().join("b.txt"), &body).unwrap();

        let out = GrepFiles
            .execute(&args(json!({ "pat": "match" })), dir.path())
            .await
            .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), MAX_GREP_MATCHES);
        assert!(lines[0].starts_with("a.txt:1:"));
        assert!(lines[49].starts_with("b.txt:10:"));
    }

    #[tokio::test]
    async fn grep_skips_binary_and_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, b'x', b'\n']).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("config"), "x\n").unwrap();

        let out = GrepFiles
            .execute(&args(json!({ "pat": "x" })), dir.path())
            .await
            .unwrap();
        assert_eq!(out, "none");
    }

    #[test]
    fn cancelled_grep_stops_before_reading_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "needle\n").unwrap();
        let pattern = Regex::new("needle").unwrap();

        let live = AtomicBool::new(false);
        assert_eq!(
            grep_files(&pattern, dir.path(), dir.path(), &live),
            vec!["a.txt:1:needle"]
        );

        let cancelled = AtomicBool::new(true);
        assert!(grep_files(&pattern, dir.path(), dir.path(), &cancelled).is_empty());
    }

    #[test]
    fn cancelled_glob_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        let cancelled = AtomicBool::new(true);
        assert_eq!(glob_files("./*.rs", dir.path(), &cancelled).unwrap(), "none");
    }

    #[test]
    fn dropping_the_guard_raises_the_flag() {
        let guard = CancelOnDrop::default();
        let flag = guard.flag();
        assert!(!flag.load(Ordering::Relaxed));
        drop(guard);
        assert!(flag.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn grep_rejects_invalid_regex() {
        let dir = tempfile::tempdir().unwrap();
        let err = GrepFiles
            .execute(&args(json!({ "pat": "(unclosed" })), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidPattern(_)));
    }
}
