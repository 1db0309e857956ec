//! Tool registry and the tools the model may call.
//!
//! Every tool is a fixed, named operation with a declared parameter list.
//! The registry advertises those declarations to the model and dispatches
//! calls by name. Tool failures never escape [`ToolRegistry::dispatch`]:
//! they come back as result strings prefixed with `error: `.

mod file;
mod search;
mod terminal;

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::Config;

pub use file::{EditFile, ReadFile, WriteFile};
pub use search::{GlobFiles, GrepFiles};
pub use terminal::Bash;

/// Maximum number of matches `grep` reports.
pub const MAX_GREP_MATCHES: usize = 50;

/// Marker returned by search tools when nothing matched.
pub const NO_MATCHES: &str = "none";

/// Marker returned by mutating tools on success.
pub const OK: &str = "ok";

/// Failure inside a tool. Rendered into the tool's result, never raised past dispatch.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("argument '{name}' must be {expected}")]
    InvalidArgument { name: String, expected: &'static str },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("old_string not found")]
    NotFoundInFile,

    #[error("old_string appears {count} times, must be unique (use all=true)")]
    AmbiguousEdit { count: usize },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("failed to run command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("search task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ToolError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        ToolError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

impl ParamKind {
    /// JSON-schema type advertised to the model.
    pub fn wire_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ParamKind::String => "a string",
            ParamKind::Number => "a number",
            ParamKind::Boolean => "a boolean",
        }
    }
}

/// One entry of a tool's parameter list.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub optional: bool,
}

impl Param {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            optional: true,
        }
    }
}

/// Normalized arguments for a single call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        match self.get(name) {
            Some(v) => v.as_str().ok_or_else(|| ToolError::InvalidArgument {
                name: name.to_string(),
                expected: "a string",
            }),
            None => Err(ToolError::MissingArgument(name.to_string())),
        }
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Integer argument, possibly negative. Whole-valued floats such as `10.0` are accepted.
    pub fn opt_int(&self, name: &str) -> Result<Option<i64>, ToolError> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        value
            .as_i64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArgument {
                name: name.to_string(),
                expected: "an integer",
            })
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// A local operation the model may request.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> &[Param];

    /// Run the tool. Relative paths are resolved against `workspace`.
    async fn execute(&self, args: &ToolArgs, workspace: &Path) -> Result<String, ToolError>;
}

/// Fixed, ordered catalog of tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    workspace: PathBuf,
}

impl ToolRegistry {
    /// Build the standard tool set: read, write, edit, glob, grep, bash.
    pub fn new(config: &Config) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(ReadFile),
            Box::new(WriteFile),
            Box::new(EditFile),
            Box::new(GlobFiles),
            Box::new(GrepFiles),
            Box::new(Bash::new(config.bash_timeout)),
        ];
        Self {
            tools,
            workspace: config.workspace_path.clone(),
        }
    }

    /// Function declarations sent to the model with every request.
    pub fn get_tool_schemas(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for param in tool.parameters() {
                    properties.insert(
                        param.name.to_string(),
                        json!({ "type": param.kind.wire_type() }),
                    );
                    if !param.optional {
                        required.push(Value::String(param.name.to_string()));
                    }
                }

                let mut parameters = json!({
                    "type": "object",
                    "properties": properties,
                });
                if !required.is_empty() {
                    parameters["required"] = Value::Array(required);
                }

                json!({
                    "type": "function",
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": parameters,
                })
            })
            .collect()
    }

    /// Run a tool by name and return its result string.
    ///
    /// Any failure, including an unknown name, is returned as `error: <message>`.
    pub async fn dispatch(&self, name: &str, args: &ToolArgs) -> String {
        let start = Instant::now();
        tracing::info!("Executing tool {}", name);
        let result = match self.execute(name, args).await {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("Tool {} failed: {}", name, e);
                format!("error: {}", e)
            }
        };
        tracing::info!("Finished {} in {:?}", name, start.elapsed());
        result
    }

    /// Validate arguments against the tool's declaration and run it.
    pub async fn execute(&self, name: &str, args: &ToolArgs) -> Result<String, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        for param in tool.parameters() {
            match args.get(param.name) {
                None if !param.optional => {
                    return Err(ToolError::MissingArgument(param.name.to_string()))
                }
                Some(value) if !param.kind.accepts(value) => {
                    return Err(ToolError::InvalidArgument {
                        name: param.name.to_string(),
                        expected: param.kind.describe(),
                    })
                }
                _ => {}
            }
        }

        tool.execute(args, &self.workspace).await
    }
}

/// Resolve a tool-supplied path against the workspace.
pub(crate) fn resolve(workspace: &Path, path: &str) -> PathBuf {
    workspace.join(path)
}
