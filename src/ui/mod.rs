//! Terminal UI for interactive chat sessions.
//!
//! - [`chat_loop`]: the event loop, key handling and terminal lifecycle.
//! - [`renderer`]: frame layout and transcript lines.
//! - [`markdown`] and [`badge`]: how model replies and their persona look.
//!
//! This layer only presents and captures interaction state. Turn handling
//! lives in [`crate::core::session`].

pub mod badge;
pub mod chat_loop;
pub mod markdown;
pub mod renderer;
