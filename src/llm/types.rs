//! Wire types for the interactions API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One request/response exchange with the model.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionRequest {
    pub model: String,
    pub input: InteractionInput,
    pub tools: Vec<Value>,
    pub system_instruction: String,
    pub generation_config: GenerationConfig,
    /// Continuation token of the previous exchange, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_interaction_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
}

/// Request payload: either fresh user text or the results of the previous step's calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InteractionInput {
    Text(String),
    Items(Vec<InputItem>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    FunctionResult(ToolResult),
}

/// Outcome of one tool call, always a string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub name: String,
    pub call_id: String,
    pub result: String,
}

/// A response from the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Interaction {
    /// New continuation token.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    Text {
        #[serde(default)]
        text: String,
    },
    FunctionCall(ToolCall),
    /// Output kinds this client does not act on (thoughts, etc).
    #[serde(other)]
    Other,
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Untyped arguments: usually an object, sometimes a JSON-encoded string, sometimes absent.
    #[serde(default)]
    pub arguments: Option<Value>,
}
