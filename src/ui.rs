//! Terminal presentation helpers for the REPL.

use std::io::Write;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";

const MAX_WIDTH: usize = 80;
const ARG_PREVIEW_CHARS: usize = 50;
const RESULT_PREVIEW_CHARS: usize = 60;

/// Dim horizontal rule, as wide as the terminal up to 80 columns.
pub fn separator() -> String {
    format!("{DIM}{}{RESET}", "─".repeat(terminal_width().min(MAX_WIDTH)))
}

/// Terminal columns, or 80 when stdout is not a terminal.
fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => cols as usize,
        _ => MAX_WIDTH,
    }
}

/// Turn `**bold**` spans into ANSI bold.
pub fn render_markdown(text: &str) -> String {
    static BOLD_SPAN: OnceLock<Regex> = OnceLock::new();
    let re = BOLD_SPAN.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("static regex"));
    re.replace_all(text, format!("{BOLD}$1{RESET}").as_str())
        .into_owned()
}

/// Echo one line of live command output.
pub fn stream_line(line: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "  {DIM}│ {line}{RESET}");
    let _ = stdout.flush();
}

/// Header shown when the model calls a tool, e.g. `⏺ Read(src/main.rs)`.
pub fn tool_header(name: &str, preview: &str) -> String {
    format!("{GREEN}⏺ {}{RESET}({DIM}{preview}{RESET})", capitalize(name))
}

/// Short description of raw call arguments: the first value of a mapping,
/// otherwise the raw value itself, cut to 50 characters.
pub fn arg_preview(raw: Option<&Value>) -> String {
    let text = match raw {
        Some(Value::Object(map)) => match map.values().next() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    truncate_chars(&text, ARG_PREVIEW_CHARS).to_string()
}

/// One-line summary of a tool result: the first line cut to 60 characters,
/// followed by a count of the remaining lines.
pub fn result_preview(result: &str) -> String {
    let mut lines = result.split('\n');
    let first = lines.next().unwrap_or("");
    let rest = lines.count();

    let mut preview = truncate_chars(first, RESULT_PREVIEW_CHARS).to_string();
    if rest > 0 {
        preview.push_str(&format!(" ... +{} lines", rest));
    } else if first.chars().count() > RESULT_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
