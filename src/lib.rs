//! # nanocode
//!
//! A minimal terminal coding assistant.
//!
//! This library provides:
//! - A tool registry with file, search and shell tools
//! - A tool-calling agent loop driven by the Gemini interactions API
//! - Terminal helpers for the interactive prompt
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a request from the operator
//! 2. Send it with the system prompt and tool schemas to the model
//! 3. Execute any tool calls the model makes, in order
//! 4. Feed the results back, repeat until the model stops calling tools
//!
//! ## Example
//!
//! ```rust,ignore
//! use nanocode::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let mut agent = Agent::new(config);
//! agent.run_turn("list the rust files here", |event| println!("{event:?}")).await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod tools;
pub mod ui;

pub use config::Config;
