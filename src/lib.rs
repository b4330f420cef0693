//! bankchat is a terminal chat client for a simulated multi-agent banking
//! assistant served by the Gemini API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation store, persona detection, the turn
//!   lifecycle and the streaming transport.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the Gemini request and response payloads.
//! - [`utils`] holds the transcript log, diagnostics setup and URL helpers.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`core::session`] for
//! one-shot prompts and [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
