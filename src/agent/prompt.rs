//! System prompt for the agent.

/// Build the system prompt. It is fixed for the life of the process.
pub fn build_system_prompt(workspace_path: &str) -> String {
    format!("Concise coding assistant. cwd: {}", workspace_path)
}
