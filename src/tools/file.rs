//! Single-file tools: read, write and edit.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use super::{resolve, Param, ParamKind, Tool, ToolArgs, ToolError, OK};

/// Read a file with line numbers.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read file with line numbers (file path, not directory)"
    }

    fn parameters(&self) -> &[Param] {
        const PARAMS: &[Param] = &[
            Param::required("path", ParamKind::String),
            Param::optional("offset", ParamKind::Number),
            Param::optional("limit", ParamKind::Number),
        ];
        PARAMS
    }

    async fn execute(&self, args: &ToolArgs, workspace: &Path) -> Result<String, ToolError> {
        let path = args.str("path")?;
        let offset = args.opt_int("offset")?.unwrap_or(0);
        let limit = args.opt_int("limit")?;

        let content = fs::read_to_string(resolve(workspace, path))
            .await
            .map_err(|e| ToolError::io(path, e))?;

        Ok(number_lines(&content, offset, limit))
    }
}

/// Render lines `offset..offset + limit` as `"<nnnn>| <line>"`.
///
/// Bounds follow slice rules: a negative bound counts back from the end of
/// the file, and both are clamped to it. Without a limit the range runs to
/// the end. Line numbers are always the real 1-based position. Each line
/// keeps its own terminator, so the output concatenates cleanly.
fn number_lines(content: &str, offset: i64, limit: Option<i64>) -> String {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let len = lines.len() as i64;
    let clamp = |i: i64| if i < 0 { (len + i).max(0) } else { i.min(len) };

    let start = clamp(offset);
    let stop = match limit {
        Some(limit) => clamp(offset.saturating_add(limit)),
        None => len,
    };
    if stop <= start {
        return String::new();
    }

    lines[start as usize..stop as usize]
        .iter()
        .enumerate()
        .map(|(idx, line)| format!("{:>4}| {}", start as usize + idx + 1, line))
        .collect()
}

/// Overwrite a file.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write content to file"
    }

    fn parameters(&self) -> &[Param] {
        const PARAMS: &[Param] = &[
            Param::required("path", ParamKind::String),
            Param::required("content", ParamKind::String),
        ];
        PARAMS
    }

    async fn execute(&self, args: &ToolArgs, workspace: &Path) -> Result<String, ToolError> {
        let path = args.str("path")?;
        let content = args.str("content")?;

        fs::write(resolve(workspace, path), content)
            .await
            .map_err(|e| ToolError::io(path, e))?;

        tracing::debug!("Wrote {} bytes to {}", content.len(), path);
        Ok(OK.to_string())
    }
}

/// Replace text in a file.
///
/// `old` must occur exactly once unless `all` is set, so a stale or too-short
/// snippet cannot silently rewrite several places at once.
pub struct EditFile;

#[async_trait]
impl Tool for EditFile {
    fn name(&self) -> &str {
        "edit"
    }

    fn description(&self) -> &str {
        "Replace old with new in file (old must be unique unless all=true)"
    }

    fn parameters(&self) -> &[Param] {
        const PARAMS: &[Param] = &[
            Param::required("path", ParamKind::String),
            Param::required("old", ParamKind::String),
            Param::required("new", ParamKind::String),
            Param::optional("all", ParamKind::Boolean),
        ];
        PARAMS
    }

    async fn execute(&self, args: &ToolArgs, workspace: &Path) -> Result<String, ToolError> {
        let path = args.str("path")?;
        let old = args.str("old")?;
        let new = args.str("new")?;
        let all = args.flag("all");

        let full_path = resolve(workspace, path);
        let text = fs::read_to_string(&full_path)
            .await
            .map_err(|e| ToolError::io(path, e))?;

        let replaced = replace_text(&text, old, new, all)?;

        fs::write(&full_path, replaced)
            .await
            .map_err(|e| ToolError::io(path, e))?;

        Ok(OK.to_string())
    }
}

fn replace_text(text: &str, old: &str, new: &str, all: bool) -> Result<String, ToolError> {
    if !text.contains(old) {
        return Err(ToolError::NotFoundInFile);
    }

    let count = text.matches(old).count();
    if !all && count > 1 {
        return Err(ToolError::AmbiguousEdit { count });
    }

    Ok(if all {
        text.replace(old, new)
    } else {
        text.replacen(old, new, 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn args(value: Value) -> ToolArgs {
        match value {
            Value::Object(map) => ToolArgs::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    fn fixture(name: &str, content: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(name), content).unwrap();
        dir
    }

    #[tokio::test]
    async fn read_numbers_every_line() {
        let dir = fixture("file.txt", "alpha\nbeta\ngamma\n");
        let out = ReadFile
            .execute(&args(json!({ "path": "file.txt" })), dir.path())
            .await
            .unwrap();
        assert_eq!(out, "   1| alpha\n   2| beta\n   3| gamma\n");
    }

    #[tokio::test]
    async fn read_honours_offset_and_limit() {
        let dir = fixture("file.txt", "a\nb\nc\nd\n");
        let out = ReadFile
            .execute(
                &args(json!({ "path": "file.txt", "offset": 1, "limit": 2 })),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(out, "   2| b\n   3| c\n");
    }

    #[tokio::test]
    async fn read_past_end_is_empty() {
        let dir = fixture("file.txt", "a\nb\n");
        let out = ReadFile
            .execute(&args(json!({ "path": "file.txt", "offset": 10 })), dir.path())
            .await
            .unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReadFile
            .execute(&args(json!({ "path": "nope.txt" })), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
        assert!(err.to_string().starts_with("nope.txt: "));
    }

    #[tokio::test]
    async fn write_truncates_existing_content() {
        let dir = fixture("out.txt", "a much longer previous body\n");
        let out = WriteFile
            .execute(
                &args(json!({ "path": "out.txt", "content": "short" })),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(out, "ok");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.txt")).unwrap(),
            "short"
        );
    }

    #[tokio::test]
    async fn edit_replaces_unique_occurrence() {
        let dir = fixture("src.rs", "fn main() {\n    let x = 1;\n}\n");
        let out = EditFile
            .execute(
                &args(json!({ "path": "src.rs", "old": "x = 1", "new": "x = 2" })),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(out, "ok");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src.rs")).unwrap(),
            "fn main() {\n    let x = 2;\n}\n"
        );
    }

    #[tokio::test]
    async fn edit_refuses_ambiguous_match_and_leaves_file_alone() {
        let original = "foo\nfoo\nbar\nfoo\n";
        let dir = fixture("f.txt", original);
        let err = EditFile
            .execute(
                &args(json!({ "path": "f.txt", "old": "foo", "new": "baz" })),
                dir.path(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::AmbiguousEdit { count: 3 }));
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains("all=true"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            original
        );
    }

    #[tokio::test]
    async fn edit_all_replaces_every_occurrence() {
        let dir = fixture("f.txt", "foo\nfoo\nbar\nfoo\n");
        EditFile
            .execute(
                &args(json!({ "path": "f.txt", "old": "foo", "new": "baz", "all": true })),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "baz\nbaz\nbar\nbaz\n"
        );
    }

    #[tokio::test]
    async fn edit_missing_text_mutates_nothing() {
        let dir = fixture("f.txt", "hello\n");
        let err = EditFile
            .execute(
                &args(json!({ "path": "f.txt", "old": "absent", "new": "x" })),
                dir.path(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFoundInFile));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "hello\n"
        );
    }

    #[test]
    fn replace_text_single_uses_first_match_only_when_unique() {
        assert_eq!(replace_text("a-b-c", "b", "X", false).unwrap(), "a-X-c");
        assert_eq!(replace_text("b b", "b", "X", true).unwrap(), "X X");
    }

    #[test]
    fn number_lines_handles_missing_trailing_newline() {
        assert_eq!(number_lines("one\ntwo", 0, None), "   1| one\n   2| two");
    }

    #[test]
    fn negative_offset_counts_from_the_end() {
        let text = "a\nb\nc\nd\n";
        assert_eq!(number_lines(text, -2, None), "   3| c\n   4| d\n");
        assert_eq!(number_lines(text, -2, Some(1)), "   3| c\n");
        assert_eq!(number_lines(text, -10, Some(8)), "   1| a\n   2| b\n");
    }

    #[test]
    fn negative_limit_drops_lines_from_the_end() {
        let text = "a\nb\nc\nd\n";
        assert_eq!(number_lines(text, 0, Some(-1)), "   1| a\n   2| b\n   3| c\n");
        assert_eq!(number_lines(text, 3, Some(-2)), "");
    }

    #[tokio::test]
    async fn read_accepts_negative_offset() {
        let dir = fixture("file.txt", "a\nb\nc\n");
        let out = ReadFile
            .execute(
                &args(json!({ "path": "file.txt", "offset": -1 })),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(out, "   3| c\n");
    }
}
