//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::core::chat_stream::GeminiTransport;
use crate::core::credentials::CredentialError;
use crate::core::message::Message;
use crate::core::session::ChatSession;
use crate::ui::badge::badge_for;

/// Text appended to `content` since `printed` was written, or `None` when the
/// content no longer extends what was printed.
fn stream_delta<'a>(printed: &str, content: &'a str) -> Option<&'a str> {
    content.strip_prefix(printed)
}

pub async fn run_say(
    prompt: Vec<String>,
    transport: GeminiTransport,
    credential_error: Option<CredentialError>,
    mut session: ChatSession,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: bankchat say <prompt>");
        std::process::exit(1);
    }

    let mut printed = String::new();
    let mut write_error: Option<io::Error> = None;
    let mut stdout = io::stdout();

    let observer = |message: &Message| {
        if message.is_error() || write_error.is_some() {
            return;
        }
        if let Some(delta) = stream_delta(&printed, &message.content) {
            if delta.is_empty() {
                return;
            }
            if let Err(e) = stdout.write_all(delta.as_bytes()).and_then(|_| stdout.flush()) {
                write_error = Some(e);
                return;
            }
            printed.push_str(delta);
        }
    };

    let Some(id) = session.send(&transport, &prompt, observer).await else {
        return Ok(());
    };

    if let Some(e) = write_error {
        return Err(e.into());
    }

    let Some(reply) = session.store().get(id) else {
        return Ok(());
    };

    if !printed.is_empty() {
        println!();
    }

    if reply.is_error() {
        eprintln!("❌ {}", reply.content);
        if let Some(err) = credential_error {
            eprintln!();
            eprintln!("💡 Quick fixes:");
            for fix in err.quick_fixes() {
                eprintln!("  • {fix}");
            }
        }
        std::process::exit(1);
    }

    if let Some(persona) = reply.active_persona {
        eprintln!("{}", badge_for(persona).plain());
    }

    Ok(())
}
