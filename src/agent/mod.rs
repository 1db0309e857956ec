//! Agent module - the conversation state machine.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Send the user's text, the system prompt and the tool schemas to the model
//! 2. Surface any text the model returns
//! 3. If the model requested tool calls, execute them in order and send the results back
//! 4. Repeat until a response arrives without tool calls

mod agent_loop;
mod arguments;
mod prompt;

pub use agent_loop::{Agent, AgentEvent};
pub use arguments::{ArgumentError, RawArguments};
pub use prompt::build_system_prompt;
