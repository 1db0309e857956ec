//! Core agent loop implementation.

use std::sync::Arc;

use crate::config::Config;
use crate::llm::{
    GeminiClient, GenerationConfig, InputItem, Interaction, InteractionInput, InteractionRequest,
    LlmClient, LlmError, Output, ToolCall, ToolResult,
};
use crate::tools::ToolRegistry;
use crate::ui;

use super::arguments::RawArguments;
use super::prompt::build_system_prompt;

/// Something the operator should see while a turn runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Text produced by the model.
    Text(String),
    /// The model asked for a tool; `preview` is a short rendering of its arguments.
    ToolCall { name: String, preview: String },
    /// A tool finished. Errors arrive here too, as `error: ...` strings.
    ToolResult { name: String, result: String },
}

/// Conversation context kept between turns.
#[derive(Debug, Clone)]
struct ConversationState {
    continuation_token: Option<String>,
    system_prompt: String,
}

/// The coding agent.
///
/// A turn moves from awaiting a response to executing the requested tools and
/// back, until the model answers without tool calls. Tool calls run one at a
/// time in the order received, and their results go out together in the next
/// request.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    state: ConversationState,
}

impl Agent {
    /// Create a new agent talking to the Gemini API.
    pub fn new(config: Config) -> Self {
        let llm = Arc::new(GeminiClient::new(&config));
        Self::with_client(config, llm)
    }

    /// Create an agent with a specific model client.
    pub fn with_client(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        let tools = ToolRegistry::new(&config);
        let system_prompt = build_system_prompt(&config.workspace_path.to_string_lossy());

        Self {
            config,
            llm,
            tools,
            state: ConversationState {
                continuation_token: None,
                system_prompt,
            },
        }
    }

    pub fn continuation_token(&self) -> Option<&str> {
        self.state.continuation_token.as_deref()
    }

    /// Forget the server-side conversation. The next turn starts fresh.
    pub fn reset(&mut self) {
        self.state.continuation_token = None;
    }

    /// Run one turn for `input`, reporting progress through `on_event`.
    ///
    /// # Errors
    ///
    /// Returns the transport error that aborted the turn. Tool failures are
    /// not errors; they are sent back to the model as results.
    pub async fn run_turn<F>(&mut self, input: &str, mut on_event: F) -> Result<(), LlmError>
    where
        F: FnMut(AgentEvent),
    {
        let mut payload = InteractionInput::Text(input.to_string());

        for step in 1.. {
            tracing::debug!("Agent step {}", step);

            let interaction = self.send(payload).await?;

            let mut calls = Vec::new();
            for output in interaction.outputs {
                match output {
                    Output::Text { text } => on_event(AgentEvent::Text(text)),
                    Output::FunctionCall(call) => calls.push(call),
                    Output::Other => {}
                }
            }

            if calls.is_empty() {
                break;
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                on_event(AgentEvent::ToolCall {
                    name: call.name.clone(),
                    preview: ui::arg_preview(call.arguments.as_ref()),
                });
                let result = self.execute_tool_call(call).await;
                on_event(AgentEvent::ToolResult {
                    name: result.name.clone(),
                    result: result.result.clone(),
                });
                results.push(InputItem::FunctionResult(result));
            }

            payload = InteractionInput::Items(results);
        }

        Ok(())
    }

    /// Send one request and remember the continuation token it returns.
    async fn send(&mut self, input: InteractionInput) -> Result<Interaction, LlmError> {
        let request = InteractionRequest {
            model: self.config.model.clone(),
            input,
            tools: self.tools.get_tool_schemas(),
            system_instruction: self.state.system_prompt.clone(),
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
            },
            previous_interaction_id: self.state.continuation_token.clone(),
        };

        let interaction = self.llm.create_interaction(&request).await?;
        if let Some(id) = interaction.id.as_ref().filter(|id| !id.is_empty()) {
            self.state.continuation_token = Some(id.clone());
        }
        Ok(interaction)
    }

    /// Execute a single tool call. Always yields a result for the call's id.
    async fn execute_tool_call(&self, call: ToolCall) -> ToolResult {
        let result = match RawArguments::from(call.arguments).normalize() {
            Ok(args) => self.tools.dispatch(&call.name, &args).await,
            Err(e) => {
                tracing::debug!("Rejected arguments for {}: {}", call.name, e);
                format!("error: {}", e)
            }
        };

        ToolResult {
            name: call.name,
            call_id: call.id,
            result,
        }
    }
}
