//! nanocode - interactive entry point.
//!
//! Reads requests at a prompt and runs each one as an agent turn.

use std::io::{BufRead, Write};

use nanocode::agent::{Agent, AgentEvent};
use nanocode::config::{self, Config};
use nanocode::ui::{self, BLUE, BOLD, CYAN, DIM, GREEN, RED, RESET};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stderr keeps it apart from the conversation on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nanocode=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    config::load_env_files();
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.model);

    println!(
        "{BOLD}nanocode{RESET} | {DIM}{} (Gemini) | {}{RESET}\n",
        config.model,
        config.workspace_path.display()
    );

    let mut agent = Agent::new(config);
    let mut input = spawn_input_reader();

    loop {
        println!("{}", ui::separator());
        print!("{BOLD}{BLUE}❯{RESET} ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = input.recv() => line,
            _ = tokio::signal::ctrl_c() => None,
        };
        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(e.into()),
            None => break,
        };
        println!("{}", ui::separator());

        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        if request == "/q" || request == "exit" {
            break;
        }
        if request == "/c" {
            agent.reset();
            println!("{GREEN}⏺ Cleared conversation{RESET}");
            continue;
        }

        let outcome = tokio::select! {
            result = agent.run_turn(request, print_event) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        match outcome {
            Some(Ok(())) => println!(),
            Some(Err(e)) => {
                tracing::debug!("Turn aborted: {:?}", e);
                println!("{RED}⏺ Error: {e}{RESET}");
            }
            None => break,
        }
    }

    info!("Session ended");
    Ok(())
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_event(event: AgentEvent) {
    match event {
        AgentEvent::Text(text) => println!("\n{CYAN}⏺{RESET} {}", ui::render_markdown(&text)),
        AgentEvent::ToolCall { name, preview } => println!("\n{}", ui::tool_header(&name, &preview)),
        AgentEvent::ToolResult { result, .. } => {
            println!("  {DIM}⎿  {}{RESET}", ui::result_preview(&result))
        }
    }
}
